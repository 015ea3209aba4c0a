//! SeaORM storage backend
//!
//! 单表 `short_urls`，支持 SQLite 和 PostgreSQL。建表由 `migration` crate
//! 在构造时完成（幂等）。

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use super::Storage;
use super::models::{LinkLookup, UserUrl};
use crate::config::StorageConfig;
use crate::errors::{Result, ShortenerError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{UniqueViolation, classify_unique_violation, model_to_lookup, new_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortenerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let database_url = config.database_url.as_str();
        if database_url.is_empty() {
            return Err(ShortenerError::database_config("DATABASE_URL 未设置"));
        }

        let backend_name = infer_backend_from_url(database_url)?;
        let retry_config = retry::RetryConfig {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config.pool_size).await?
        } else {
            connect_generic(database_url, &backend_name, config.pool_size).await?
        };

        // 建表（幂等）
        run_migrations(&db).await?;

        info!("{} Storage initialized.", backend_name.to_uppercase());
        Ok(SeaOrmStorage {
            db,
            backend_name,
            retry_config,
        })
    }

    pub fn backend_kind(&self) -> &str {
        &self.backend_name
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn save(&self, short_id: &str, original_url: &str, owner_id: &str) -> Result<()> {
        self.insert_link(short_id, original_url, owner_id).await
    }

    async fn get(&self, short_id: &str) -> Result<LinkLookup> {
        self.fetch(short_id).await
    }

    async fn find_by_original(&self, original_url: &str) -> Result<Option<String>> {
        self.fetch_live_by_original(original_url).await
    }

    async fn save_batch(&self, pairs: &[(String, String)], owner_id: &str) -> Result<()> {
        self.insert_links(pairs, owner_id).await
    }

    async fn get_user_urls(&self, owner_id: &str) -> Result<Vec<UserUrl>> {
        self.fetch_live_by_owner(owner_id).await
    }

    async fn delete_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        self.mark_deleted(owner_id, short_ids).await
    }

    fn backend_name(&self) -> &'static str {
        "database"
    }
}
