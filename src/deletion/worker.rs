use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::DeleteIntent;
use crate::storage::Storage;

/// worker 运行计数
#[derive(Debug, Default)]
pub struct DeletionStats {
    processed: AtomicU64,
    failed: AtomicU64,
    noop: AtomicU64,
}

impl DeletionStats {
    /// 成功应用的请求数（含空操作）
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// 没有匹配到任何可删除映射的请求数
    pub fn noop(&self) -> u64 {
        self.noop.load(Ordering::Relaxed)
    }
}

pub struct DeletionWorker {
    storage: Arc<dyn Storage>,
    rx: mpsc::Receiver<DeleteIntent>,
    stats: Arc<DeletionStats>,
}

impl DeletionWorker {
    pub(super) fn new(storage: Arc<dyn Storage>, rx: mpsc::Receiver<DeleteIntent>) -> Self {
        Self {
            storage,
            rx,
            stats: Arc::new(DeletionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<DeletionStats> {
        Arc::clone(&self.stats)
    }

    /// 逐条处理队列中的请求
    ///
    /// 取消只在两条请求之间生效，正在执行的删除会完成。
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Deletion worker started on {} storage",
            self.storage.backend_name()
        );

        loop {
            let intent = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Deletion worker cancelled, {} intent(s) left in queue", self.rx.len());
                    break;
                }
                intent = self.rx.recv() => match intent {
                    Some(intent) => intent,
                    None => {
                        info!("Deletion queue closed and drained");
                        break;
                    }
                },
            };

            self.process(intent).await;
        }

        self.rx.close();
        info!(
            "Deletion worker stopped: {} processed, {} no-op, {} failed",
            self.stats.processed(),
            self.stats.noop(),
            self.stats.failed()
        );
    }

    async fn process(&self, intent: DeleteIntent) {
        if intent.short_ids.is_empty() {
            debug!("Empty delete intent for {}, skipped", intent.owner_id);
            self.stats.noop.fetch_add(1, Ordering::Relaxed);
            self.stats.processed.fetch_add(1, Ordering::Relaxed);
            return;
        }

        match self
            .storage
            .delete_urls(&intent.owner_id, &intent.short_ids)
            .await
        {
            Ok(()) => {
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_nothing_to_do() => {
                debug!(
                    "Delete for {} matched nothing: {}",
                    intent.owner_id,
                    e.message()
                );
                self.stats.noop.fetch_add(1, Ordering::Relaxed);
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // 不重试，至多应用一次
                error!(
                    "Failed to delete {} id(s) for {}: {}",
                    intent.short_ids.len(),
                    intent.owner_id,
                    e
                );
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
