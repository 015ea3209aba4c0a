//! 异步删除管道
//!
//! 调用方把 `(owner_id, short_ids)` 放入有界队列后立即返回（“已受理”），
//! 单个后台 worker 按提交顺序逐条调用 [`Storage::delete_urls`]。
//! 读者在短时间内仍可能看到未删除的映射。
//!
//! [`Storage::delete_urls`]: crate::storage::Storage::delete_urls

mod queue;
mod worker;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::storage::Storage;

pub use queue::{DEFAULT_QUEUE_CAPACITY, DeletionQueue};
pub use worker::{DeletionStats, DeletionWorker};

/// 一次删除请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteIntent {
    pub owner_id: String,
    pub short_ids: Vec<String>,
}

impl DeleteIntent {
    pub fn new<O: Into<String>>(owner_id: O, short_ids: Vec<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            short_ids,
        }
    }
}

pub struct DeletionPipeline;

impl DeletionPipeline {
    /// 创建队列与 worker 两端
    pub fn new(
        storage: Arc<dyn Storage>,
        capacity: usize,
    ) -> (DeletionQueue, DeletionWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (DeletionQueue::new(tx), DeletionWorker::new(storage, rx))
    }

    /// 创建并在 tokio 上启动 worker
    ///
    /// worker 在 `cancel` 触发或所有队列句柄被丢弃且队列清空后退出。
    pub fn spawn(
        storage: Arc<dyn Storage>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (DeletionQueue, Arc<DeletionStats>, JoinHandle<()>) {
        let (queue, worker) = Self::new(storage, capacity);
        let stats = worker.stats();
        let handle = tokio::spawn(worker.run(cancel));
        (queue, stats, handle)
    }
}
