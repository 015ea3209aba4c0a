use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use super::DeleteIntent;
use crate::errors::{Result, ShortenerError};

/// 默认队列容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// 删除队列的生产者句柄，可自由克隆
///
/// 队列满时 [`submit`](Self::submit) 等待空位，[`try_submit`](Self::try_submit)
/// 立即返回 `QueueFull`；不会静默丢弃请求。
#[derive(Debug, Clone)]
pub struct DeletionQueue {
    tx: mpsc::Sender<DeleteIntent>,
}

impl DeletionQueue {
    pub(super) fn new(tx: mpsc::Sender<DeleteIntent>) -> Self {
        Self { tx }
    }

    pub async fn submit(&self, intent: DeleteIntent) -> Result<()> {
        debug!(
            "Queueing delete of {} id(s) for {}",
            intent.short_ids.len(),
            intent.owner_id
        );
        self.tx
            .send(intent)
            .await
            .map_err(|_| ShortenerError::queue_closed("deletion worker has stopped"))
    }

    pub fn try_submit(&self, intent: DeleteIntent) -> Result<()> {
        self.tx.try_send(intent).map_err(|e| match e {
            TrySendError::Full(intent) => ShortenerError::queue_full(format!(
                "deletion queue is full, rejected intent for {}",
                intent.owner_id
            )),
            TrySendError::Closed(_) => ShortenerError::queue_closed("deletion worker has stopped"),
        })
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// 当前排队中的请求数
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
