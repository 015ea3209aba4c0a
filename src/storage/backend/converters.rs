use sea_orm::{DbErr, SqlErr};

use crate::storage::models::{LinkLookup, UserUrl};
use migration::entities::short_url;

/// 将查询到的行转换为正向查询结果
pub fn model_to_lookup(model: Option<short_url::Model>) -> LinkLookup {
    match model {
        None => LinkLookup::NotFound,
        Some(m) if m.deleted => LinkLookup::Deleted(m.original_url),
        Some(m) => LinkLookup::Live(m.original_url),
    }
}

impl From<short_url::Model> for UserUrl {
    fn from(model: short_url::Model) -> Self {
        UserUrl {
            short_id: model.short_id,
            original_url: model.original_url,
        }
    }
}

/// 构造一条新行的 ActiveModel
pub fn new_active_model(short_id: &str, original_url: &str, owner_id: &str) -> short_url::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_url::ActiveModel {
        short_id: Set(short_id.to_string()),
        original_url: Set(original_url.to_string()),
        owner_id: Set(owner_id.to_string()),
        deleted: Set(false),
    }
}

/// 唯一约束冲突的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueViolation {
    /// original_url 在存活行中已存在（去重命中）
    OriginalUrl,
    /// 主键 short_id 已存在
    ShortId,
}

/// 判断错误是否为唯一约束冲突，以及冲突发生在哪一列
///
/// SQLite 报 `UNIQUE constraint failed: short_urls.original_url`，
/// PostgreSQL 报索引名 `idx_short_urls_original_url_live`，两者都带 `original_url`。
pub fn classify_unique_violation(err: &DbErr) -> Option<UniqueViolation> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(classify_message(&msg)),
        _ => None,
    }
}

fn classify_message(msg: &str) -> UniqueViolation {
    if msg.contains("original_url") || msg.contains(migration::LIVE_ORIGINAL_INDEX) {
        UniqueViolation::OriginalUrl
    } else {
        UniqueViolation::ShortId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(deleted: bool) -> short_url::Model {
        short_url::Model {
            short_id: "AbCdEfGh".to_string(),
            original_url: "https://example.com".to_string(),
            owner_id: "user-1".to_string(),
            deleted,
        }
    }

    #[test]
    fn test_model_to_lookup() {
        assert_eq!(model_to_lookup(None), LinkLookup::NotFound);
        assert_eq!(
            model_to_lookup(Some(model(false))),
            LinkLookup::Live("https://example.com".into())
        );
        assert_eq!(
            model_to_lookup(Some(model(true))),
            LinkLookup::Deleted("https://example.com".into())
        );
    }

    #[test]
    fn test_model_to_user_url() {
        let url: UserUrl = model(false).into();
        assert_eq!(url.short_id, "AbCdEfGh");
        assert_eq!(url.original_url, "https://example.com");
    }

    #[test]
    fn test_new_active_model_defaults_to_live() {
        let am = new_active_model("id", "https://a.com", "u1");
        assert_eq!(am.deleted, sea_orm::ActiveValue::Set(false));
        assert_eq!(am.owner_id, sea_orm::ActiveValue::Set("u1".to_string()));
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            classify_message("UNIQUE constraint failed: short_urls.original_url"),
            UniqueViolation::OriginalUrl
        );
        assert_eq!(
            classify_message(
                "duplicate key value violates unique constraint \"idx_short_urls_original_url_live\""
            ),
            UniqueViolation::OriginalUrl
        );
        assert_eq!(
            classify_message("UNIQUE constraint failed: short_urls.short_id"),
            UniqueViolation::ShortId
        );
        assert_eq!(
            classify_message("duplicate key value violates unique constraint \"short_urls_pkey\""),
            UniqueViolation::ShortId
        );
    }

    #[test]
    fn test_non_unique_errors_are_not_classified() {
        let err = DbErr::Custom("boom".to_string());
        assert_eq!(classify_unique_violation(&err), None);
    }
}
