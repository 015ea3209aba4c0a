//! 存储层
//!
//! 三种后端实现同一个 [`Storage`] trait，进程内只启用一个：
//! - 关系型数据库（SQLite / PostgreSQL，经 SeaORM）
//! - 追加日志文件（JSON Lines）
//! - 内存

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::Result;

pub mod backend;
pub mod file;
mod index;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use models::{LinkLookup, ShortMapping, UserUrl};

#[async_trait]
pub trait Storage: Send + Sync {
    /// 写入一条映射
    ///
    /// 原始 URL 已有存活映射时为空操作；`short_id` 已被占用时返回
    /// `ShortIdCollision`，不覆盖任何数据。
    async fn save(&self, short_id: &str, original_url: &str, owner_id: &str) -> Result<()>;

    /// 按 ID 查询，已删除的映射仍返回原始 URL
    async fn get(&self, short_id: &str) -> Result<LinkLookup>;

    /// 按原始 URL 反查存活映射的 ID
    async fn find_by_original(&self, original_url: &str) -> Result<Option<String>>;

    /// 批量写入 `(short_id, original_url)`，每条遵循与 [`save`](Self::save) 相同的规则
    async fn save_batch(&self, pairs: &[(String, String)], owner_id: &str) -> Result<()>;

    /// 用户名下的存活映射；从未创建过映射的用户返回空列表
    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UserUrl>>;

    /// 软删除 owner 名下、尚未删除的映射，其余 ID 静默忽略
    async fn delete_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置选择后端：`database_url` → 关系型，`file_storage_path` → 文件，否则内存
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = if !config.database_url.is_empty() {
            Arc::new(SeaOrmStorage::new(config).await?)
        } else if !config.file_storage_path.is_empty() {
            Arc::new(FileStorage::open(&config.file_storage_path, config.sync_writes)?)
        } else {
            Arc::new(MemoryStorage::new())
        };

        info!("Using {} storage backend", storage.backend_name());
        Ok(storage)
    }
}
