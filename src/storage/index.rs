//! 内存索引
//!
//! 内存后端与追加日志后端共用同一份索引结构：
//! - `links`: short_id → 映射（含原始 URL、所有者、删除标记）
//! - `by_original`: 原始 URL → short_id，只收录未删除的映射，用于去重
//! - `by_owner`: owner_id → 按创建顺序排列的 short_id 列表
//!
//! 索引本身不加锁，由持有它的后端用一把读写锁整体保护。

use std::collections::{HashMap, HashSet};

use super::models::{LinkLookup, ShortMapping, UserUrl};

#[derive(Debug, Clone)]
struct LinkEntry {
    original_url: String,
    owner_id: String,
    deleted: bool,
}

/// 单条写入的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InsertCheck {
    /// 可以写入
    Fresh,
    /// 原始 URL 已有存活映射，写入变为空操作
    Duplicate(String),
    /// short_id 已被占用（无论是否已删除）
    Collision,
}

/// 批量写入计划
#[derive(Debug, Default)]
pub(crate) struct BatchPlan {
    /// 需要真正写入的 (short_id, original_url)
    pub fresh: Vec<(String, String)>,
    /// 因去重跳过的条数
    pub duplicates: usize,
    /// 碰撞的 short_id
    pub collisions: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct LinkIndex {
    links: HashMap<String, LinkEntry>,
    by_original: HashMap<String, String>,
    by_owner: HashMap<String, Vec<String>>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn contains(&self, short_id: &str) -> bool {
        self.links.contains_key(short_id)
    }

    pub fn check_insert(&self, short_id: &str, original_url: &str) -> InsertCheck {
        if let Some(existing) = self.by_original.get(original_url) {
            return InsertCheck::Duplicate(existing.clone());
        }
        if self.links.contains_key(short_id) {
            return InsertCheck::Collision;
        }
        InsertCheck::Fresh
    }

    /// 按单条写入规则规划整批，批内重复的 URL 或 ID 也会被识别
    pub fn plan_batch(&self, pairs: &[(String, String)]) -> BatchPlan {
        let mut plan = BatchPlan::default();
        let mut batch_urls: HashSet<&str> = HashSet::with_capacity(pairs.len());
        let mut batch_ids: HashSet<&str> = HashSet::with_capacity(pairs.len());

        for (short_id, original_url) in pairs {
            if batch_urls.contains(original_url.as_str()) {
                plan.duplicates += 1;
                continue;
            }
            match self.check_insert(short_id, original_url) {
                InsertCheck::Duplicate(_) => plan.duplicates += 1,
                InsertCheck::Collision => plan.collisions.push(short_id.clone()),
                InsertCheck::Fresh if batch_ids.contains(short_id.as_str()) => {
                    plan.collisions.push(short_id.clone())
                }
                InsertCheck::Fresh => {
                    batch_urls.insert(original_url);
                    batch_ids.insert(short_id);
                    plan.fresh.push((short_id.clone(), original_url.clone()));
                }
            }
        }

        plan
    }

    /// 写入一条新映射，调用前必须已经通过 [`check_insert`](Self::check_insert)
    pub fn insert(&mut self, short_id: &str, original_url: &str, owner_id: &str) {
        debug_assert_eq!(self.check_insert(short_id, original_url), InsertCheck::Fresh);

        self.links.insert(
            short_id.to_string(),
            LinkEntry {
                original_url: original_url.to_string(),
                owner_id: owner_id.to_string(),
                deleted: false,
            },
        );
        self.by_original
            .insert(original_url.to_string(), short_id.to_string());
        self.by_owner
            .entry(owner_id.to_string())
            .or_default()
            .push(short_id.to_string());
    }

    /// 标记删除；返回是否发生了状态变化
    pub fn mark_deleted(&mut self, short_id: &str) -> bool {
        let Some(entry) = self.links.get_mut(short_id) else {
            return false;
        };
        if entry.deleted {
            return false;
        }
        entry.deleted = true;

        if self
            .by_original
            .get(&entry.original_url)
            .is_some_and(|id| id == short_id)
        {
            self.by_original.remove(&entry.original_url);
        }
        true
    }

    /// 返回 `short_ids` 中存在、归属 `owner_id` 且尚未删除的子集（去重，保持请求顺序）
    pub fn deletable(&self, owner_id: &str, short_ids: &[String]) -> Vec<ShortMapping> {
        let mut seen = HashSet::with_capacity(short_ids.len());
        short_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| {
                let entry = self.links.get(id)?;
                (entry.owner_id == owner_id && !entry.deleted).then(|| ShortMapping {
                    short_id: id.clone(),
                    original_url: entry.original_url.clone(),
                    owner_id: entry.owner_id.clone(),
                    deleted: true,
                })
            })
            .collect()
    }

    pub fn lookup(&self, short_id: &str) -> LinkLookup {
        match self.links.get(short_id) {
            None => LinkLookup::NotFound,
            Some(entry) if entry.deleted => LinkLookup::Deleted(entry.original_url.clone()),
            Some(entry) => LinkLookup::Live(entry.original_url.clone()),
        }
    }

    pub fn find_by_original(&self, original_url: &str) -> Option<String> {
        self.by_original.get(original_url).cloned()
    }

    /// 未知用户返回空列表
    pub fn user_urls(&self, owner_id: &str) -> Vec<UserUrl> {
        let Some(ids) = self.by_owner.get(owner_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                let entry = self.links.get(id)?;
                (!entry.deleted).then(|| UserUrl {
                    short_id: id.clone(),
                    original_url: entry.original_url.clone(),
                })
            })
            .collect()
    }

    /// 与已有映射比较：同 ID 同 URL 同所有者
    pub fn same_mapping(&self, short_id: &str, original_url: &str, owner_id: &str) -> bool {
        self.links
            .get(short_id)
            .is_some_and(|e| e.original_url == original_url && e.owner_id == owner_id)
    }
}
