//! 写操作

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, sea_query::Expr, sea_query::OnConflict};
use tracing::{debug, info};

use super::converters::{UniqueViolation, classify_unique_violation, new_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortenerError};

use migration::entities::short_url;

impl SeaOrmStorage {
    /// 单条写入
    ///
    /// 原始 URL 已有存活行时命中部分唯一索引，视为去重成功；主键冲突则是 ID 碰撞。
    pub async fn insert_link(&self, short_id: &str, original_url: &str, owner_id: &str) -> Result<()> {
        let db = &self.db;

        let result = retry::with_retry(&format!("save({})", short_id), self.retry_config, || async {
            short_url::Entity::insert(new_active_model(short_id, original_url, owner_id))
                .exec(db)
                .await
                .map(|_| ())
        })
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match classify_unique_violation(&e) {
                Some(UniqueViolation::OriginalUrl) => {
                    debug!("URL already shortened, skip {}", short_id);
                    Ok(())
                }
                Some(UniqueViolation::ShortId) => Err(ShortenerError::short_id_collision(
                    format!("short id already in use: {}", short_id),
                )),
                None => Err(ShortenerError::database_operation(format!(
                    "保存短链接失败: {}",
                    e
                ))),
            },
        }
    }

    /// 批量写入，一条语句完成
    ///
    /// 先按写入前的状态规划：URL 已有存活行的去重，ID 已被占用（包括已删除的行）
    /// 或批内重复的算碰撞。剩下的用 `ON CONFLICT DO NOTHING` 一次写入，
    /// 再回读核对，被并发写入抢先占用的 ID 同样报告为碰撞。
    pub async fn insert_links(&self, pairs: &[(String, String)], owner_id: &str) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let db = &self.db;

        let ids: Vec<String> = pairs.iter().map(|(id, _)| id.clone()).collect();
        let urls: Vec<String> = pairs.iter().map(|(_, url)| url.clone()).collect();
        let taken: HashSet<String> = self
            .fetch_many(&ids)
            .await?
            .into_iter()
            .map(|m| m.short_id)
            .collect();
        let live_urls = self.fetch_live_originals(&urls).await?;

        let mut batch_urls: HashSet<&str> = HashSet::with_capacity(pairs.len());
        let mut batch_ids: HashSet<&str> = HashSet::with_capacity(pairs.len());
        let mut fresh: Vec<(&str, &str)> = Vec::with_capacity(pairs.len());
        let mut collisions = Vec::new();
        let mut duplicates = 0usize;

        for (id, url) in pairs {
            if batch_urls.contains(url.as_str()) || live_urls.contains(url) {
                duplicates += 1;
                continue;
            }
            if taken.contains(id) || batch_ids.contains(id.as_str()) {
                collisions.push(id.clone());
                continue;
            }
            batch_urls.insert(url.as_str());
            batch_ids.insert(id.as_str());
            fresh.push((id.as_str(), url.as_str()));
        }

        if !fresh.is_empty() {
            retry::with_retry("save_batch", self.retry_config, || async {
                let models = fresh
                    .iter()
                    .map(|(id, url)| new_active_model(id, url, owner_id));
                match short_url::Entity::insert_many(models)
                    .on_conflict(OnConflict::new().do_nothing().to_owned())
                    .exec(db)
                    .await
                {
                    // 整批都被跳过
                    Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(|e| ShortenerError::database_operation(format!("批量保存失败: {}", e)))?;

            let fresh_ids: Vec<String> = fresh.iter().map(|(id, _)| id.to_string()).collect();
            let stored: HashMap<String, short_url::Model> = self
                .fetch_many(&fresh_ids)
                .await?
                .into_iter()
                .map(|m| (m.short_id.clone(), m))
                .collect();

            for (id, url) in &fresh {
                match stored.get(*id) {
                    Some(m) if m.original_url == *url && m.owner_id == owner_id && !m.deleted => {}
                    Some(_) => collisions.push(id.to_string()),
                    // 并发写入抢先缩短了同一个 URL
                    None => duplicates += 1,
                }
            }
        }

        debug!(
            "Batch of {} links for {}: {} deduplicated, {} collisions",
            pairs.len(),
            owner_id,
            duplicates,
            collisions.len()
        );

        if collisions.is_empty() {
            Ok(())
        } else {
            Err(ShortenerError::short_id_collision(format!(
                "short ids already in use: {}",
                collisions.join(", ")
            )))
        }
    }

    /// 软删除，只作用于 owner 名下且未删除的行
    pub async fn mark_deleted(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        if short_ids.is_empty() {
            return Ok(());
        }
        let db = &self.db;

        let result = retry::with_retry(
            &format!("delete_urls({})", owner_id),
            self.retry_config,
            || async {
                short_url::Entity::update_many()
                    .col_expr(short_url::Column::Deleted, Expr::value(true))
                    .filter(short_url::Column::OwnerId.eq(owner_id))
                    .filter(short_url::Column::ShortId.is_in(short_ids.iter().cloned()))
                    .filter(short_url::Column::Deleted.eq(false))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| ShortenerError::database_operation(format!("删除短链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(ShortenerError::no_rows_affected(format!(
                "no deletable links for {} among {} ids",
                owner_id,
                short_ids.len()
            )));
        }

        info!(
            "Marked {} links deleted for {}",
            result.rows_affected, owner_id
        );
        Ok(())
    }
}
