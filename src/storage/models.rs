use serde::{Deserialize, Serialize};

/// 一条短链接映射
///
/// `short_id` 在后端生命周期内唯一且永不复用；`deleted` 只会从 false 变为 true。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortMapping {
    pub short_id: String,
    pub original_url: String,
    pub owner_id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// 正向查询结果
///
/// 区分“从未存在”“已删除”“存活”三种情况，已删除的映射仍返回原始 URL。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkLookup {
    NotFound,
    Live(String),
    Deleted(String),
}

impl LinkLookup {
    pub fn exists(&self) -> bool {
        !matches!(self, LinkLookup::NotFound)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, LinkLookup::Deleted(_))
    }

    pub fn original_url(&self) -> Option<&str> {
        match self {
            LinkLookup::NotFound => None,
            LinkLookup::Live(url) | LinkLookup::Deleted(url) => Some(url),
        }
    }

    /// 拆成 `(original_url, deleted, exists)`，不存在时 URL 为空串
    pub fn into_parts(self) -> (String, bool, bool) {
        match self {
            LinkLookup::NotFound => (String::new(), false, false),
            LinkLookup::Live(url) => (url, false, true),
            LinkLookup::Deleted(url) => (url, true, true),
        }
    }
}

/// 用户名下的一条存活链接
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_id: String,
    pub original_url: String,
}
