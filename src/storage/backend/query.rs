//! 只读查询

use std::collections::HashSet;
use std::time::Duration;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::converters::model_to_lookup;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortenerError};
use crate::storage::models::{LinkLookup, UserUrl};

use migration::entities::short_url;

impl SeaOrmStorage {
    pub async fn fetch(&self, short_id: &str) -> Result<LinkLookup> {
        let db = &self.db;

        let model = retry::with_retry(&format!("get({})", short_id), self.retry_config, || async {
            short_url::Entity::find_by_id(short_id).one(db).await
        })
        .await
        .map_err(|e| ShortenerError::database_operation(format!("查询短链接失败: {}", e)))?;

        Ok(model_to_lookup(model))
    }

    /// 只在存活行中查找，已删除的 URL 视为未缩短
    pub async fn fetch_live_by_original(&self, original_url: &str) -> Result<Option<String>> {
        let db = &self.db;

        retry::with_retry("find_by_original", self.retry_config, || async {
            short_url::Entity::find()
                .select_only()
                .column(short_url::Column::ShortId)
                .filter(short_url::Column::OriginalUrl.eq(original_url))
                .filter(short_url::Column::Deleted.eq(false))
                .into_tuple::<String>()
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShortenerError::database_operation(format!("按原始 URL 查询失败: {}", e)))
    }

    pub async fn fetch_live_by_owner(&self, owner_id: &str) -> Result<Vec<UserUrl>> {
        let db = &self.db;

        let models = retry::with_retry(
            &format!("get_user_urls({})", owner_id),
            self.retry_config,
            || async {
                short_url::Entity::find()
                    .filter(short_url::Column::OwnerId.eq(owner_id))
                    .filter(short_url::Column::Deleted.eq(false))
                    .order_by_asc(short_url::Column::ShortId)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| ShortenerError::database_operation(format!("查询用户链接失败: {}", e)))?;

        Ok(models.into_iter().map(UserUrl::from).collect())
    }

    /// 批量按 ID 取行，用于批量写入后的核对
    pub(super) async fn fetch_many(&self, short_ids: &[String]) -> Result<Vec<short_url::Model>> {
        if short_ids.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;

        retry::with_retry("fetch_many", self.retry_config, || async {
            short_url::Entity::find()
                .filter(short_url::Column::ShortId.is_in(short_ids.iter().cloned()))
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShortenerError::database_operation(format!("批量查询失败: {}", e)))
    }

    /// 这批 URL 中已有存活行的那些
    pub(super) async fn fetch_live_originals(&self, original_urls: &[String]) -> Result<HashSet<String>> {
        if original_urls.is_empty() {
            return Ok(HashSet::new());
        }
        let db = &self.db;

        let urls = retry::with_retry("fetch_live_originals", self.retry_config, || async {
            short_url::Entity::find()
                .select_only()
                .column(short_url::Column::OriginalUrl)
                .filter(short_url::Column::OriginalUrl.is_in(original_urls.iter().cloned()))
                .filter(short_url::Column::Deleted.eq(false))
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShortenerError::database_operation(format!("批量查询失败: {}", e)))?;

        Ok(urls.into_iter().collect())
    }

    /// 存储健康检查
    pub async fn ping(&self) -> Result<()> {
        let db = &self.db;

        retry::with_retry_timeout("ping", self.retry_config, Duration::from_secs(3), || {
            db.ping()
        })
        .await
        .map_err(|e| ShortenerError::database_connection(format!("数据库不可达: {}", e)))
    }
}
