//! 内存存储后端
//!
//! 进程生命周期内有效，重启即丢失，适合作为测试替身或临时部署。
//! 所有写操作持有写锁，读操作持有读锁，锁覆盖整个索引。

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::Storage;
use super::index::{InsertCheck, LinkIndex};
use super::models::{LinkLookup, UserUrl};
use crate::errors::{Result, ShortenerError};

#[derive(Default)]
pub struct MemoryStorage {
    index: RwLock<LinkIndex>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        info!("MEMORY Storage initialized.");
        Self::default()
    }

    /// 当前映射总数（含已删除）
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, short_id: &str, original_url: &str, owner_id: &str) -> Result<()> {
        let mut index = self.index.write();
        match index.check_insert(short_id, original_url) {
            InsertCheck::Fresh => {
                index.insert(short_id, original_url, owner_id);
                Ok(())
            }
            InsertCheck::Duplicate(existing) => {
                debug!("URL already shortened as {}, skip {}", existing, short_id);
                Ok(())
            }
            InsertCheck::Collision => Err(ShortenerError::short_id_collision(format!(
                "short id already in use: {}",
                short_id
            ))),
        }
    }

    async fn get(&self, short_id: &str) -> Result<LinkLookup> {
        Ok(self.index.read().lookup(short_id))
    }

    async fn find_by_original(&self, original_url: &str) -> Result<Option<String>> {
        Ok(self.index.read().find_by_original(original_url))
    }

    async fn save_batch(&self, pairs: &[(String, String)], owner_id: &str) -> Result<()> {
        let mut index = self.index.write();
        let plan = index.plan_batch(pairs);

        for (short_id, original_url) in &plan.fresh {
            index.insert(short_id, original_url, owner_id);
        }
        debug!(
            "Batch saved {} links for {} ({} deduplicated)",
            plan.fresh.len(),
            owner_id,
            plan.duplicates
        );

        if plan.collisions.is_empty() {
            Ok(())
        } else {
            Err(ShortenerError::short_id_collision(format!(
                "short ids already in use: {}",
                plan.collisions.join(", ")
            )))
        }
    }

    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UserUrl>> {
        Ok(self.index.read().user_urls(owner_id))
    }

    async fn delete_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        let mut index = self.index.write();
        let targets = index.deletable(owner_id, short_ids);
        for mapping in &targets {
            index.mark_deleted(&mapping.short_id);
        }
        debug!(
            "Marked {} of {} requested links deleted for {}",
            targets.len(),
            short_ids.len(),
            owner_id
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
