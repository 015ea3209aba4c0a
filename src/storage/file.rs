//! 追加日志文件存储后端
//!
//! 单个 UTF-8 文件，每行一个 JSON 记录：
//! `{"recordID", "shortID", "originalURL", "ownerID", "deletedFlag"}`。
//! 删除不改写旧行，而是追加一条 `deletedFlag = true` 的新记录。
//!
//! 启动时按文件顺序重放全部记录重建内存索引（与内存后端结构相同），
//! 之后所有读操作只查索引，文件只追加。
//!
//! 写入顺序：先追加到文件，成功后再更新索引。追加失败时文件截回原长度，
//! 索引保持不变，调用方收到错误；文件是唯一的事实来源，索引可随时由重放重建。

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::Storage;
use super::index::{InsertCheck, LinkIndex};
use super::models::{LinkLookup, UserUrl};
use crate::errors::{Result, ShortenerError};

/// 日志中的一行
///
/// 兼容旧格式的 snake_case 字段名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "recordID", alias = "uuid")]
    pub record_id: String,
    #[serde(rename = "shortID", alias = "short_url")]
    pub short_id: String,
    #[serde(rename = "originalURL", alias = "original_url")]
    pub original_url: String,
    #[serde(rename = "ownerID", alias = "user_id")]
    pub owner_id: String,
    #[serde(rename = "deletedFlag", alias = "deleted_flag", default)]
    pub deleted: bool,
}

impl LogRecord {
    fn new(short_id: &str, original_url: &str, owner_id: &str, deleted: bool) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            short_id: short_id.to_string(),
            original_url: original_url.to_string(),
            owner_id: owner_id.to_string(),
            deleted,
        }
    }

    fn is_well_formed(&self) -> bool {
        !self.short_id.is_empty() && !self.original_url.is_empty()
    }
}

/// 重放统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// 成功应用的记录数
    pub applied: usize,
    /// 无法解析或与已有状态冲突而跳过的行
    pub skipped: usize,
    /// 指向从未保存过的 ID 的删除记录
    pub orphan_deletes: usize,
}

/// 日志文件的写入端
///
/// 追加失败时需要把文件截回写入前的长度。
trait LogSink: Write {
    fn end_offset(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogSink for File {
    fn end_offset(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        // 以 append 方式打开，截断后的下一次写入仍落在文件末尾
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

struct FileState<S = File> {
    index: LinkIndex,
    file: S,
    /// 文件末尾是否可能是一行残缺记录（崩溃或回滚失败）
    torn_tail: bool,
}

impl<S: LogSink> FileState<S> {
    /// 追加一批记录；失败时不触碰索引，并把文件截回原长度
    ///
    /// 返回错误时文件内容与调用前相同，除非截断本身也失败。
    fn append(&mut self, records: &[LogRecord], sync: bool) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(records.len() * 128);
        if self.torn_tail {
            // 另起一行，残缺的旧行在重放时会被跳过
            buf.push(b'\n');
        }
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let prev_len = self.file.end_offset().map_err(|e| {
            ShortenerError::file_operation(format!("无法读取存储文件长度: {}", e))
        })?;

        let written = self
            .file
            .write_all(&buf)
            .and_then(|_| self.file.flush())
            .and_then(|_| if sync { self.file.sync() } else { Ok(()) });

        match written {
            Ok(()) => {
                self.torn_tail = false;
                Ok(())
            }
            Err(e) => {
                error!("Failed to append {} record(s): {}", records.len(), e);
                if let Err(te) = self.file.truncate_to(prev_len) {
                    // 回滚失败，残留内容只能交给重放时跳过
                    error!("Failed to roll back log to {} bytes: {}", prev_len, te);
                    self.torn_tail = true;
                }
                Err(ShortenerError::file_operation(format!("追加记录失败: {}", e)))
            }
        }
    }
}

pub struct FileStorage {
    path: PathBuf,
    sync_writes: bool,
    replay: ReplayStats,
    state: RwLock<FileState>,
}

impl FileStorage {
    /// 打开（或创建）日志文件并重放
    ///
    /// 父目录不存在时自动创建。单行损坏不会中断启动，只计入
    /// [`ReplayStats::skipped`]。
    pub fn open<P: AsRef<Path>>(path: P, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| {
                ShortenerError::file_operation(format!(
                    "无法创建存储目录 {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ShortenerError::file_operation(format!(
                    "无法打开存储文件 {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let mut index = LinkIndex::new();
        let (replay, torn_tail) = replay_into(&mut index, &file)?;

        if replay.skipped > 0 {
            warn!(
                "Skipped {} malformed or conflicting record(s) while replaying {}",
                replay.skipped,
                path.display()
            );
        }
        info!(
            "FILE Storage initialized: {} record(s) replayed, {} link(s) loaded from {}",
            replay.applied,
            index.len(),
            path.display()
        );

        Ok(Self {
            path,
            sync_writes,
            replay,
            state: RwLock::new(FileState {
                index,
                file,
                torn_tail,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn replay_stats(&self) -> ReplayStats {
        self.replay
    }

    /// 启动重放时跳过的行数
    pub fn skipped_records(&self) -> usize {
        self.replay.skipped
    }
}

/// 从头读取日志，按顺序应用到索引
///
/// 返回统计信息以及文件末尾是否缺少换行。
fn replay_into(index: &mut LinkIndex, file: &File) -> Result<(ReplayStats, bool)> {
    let mut stats = ReplayStats::default();
    let mut reader = BufReader::new(file);
    let mut line = Vec::with_capacity(256);
    let mut line_no = 0usize;
    let mut torn_tail = false;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        torn_tail = line.last() != Some(&b'\n');

        let content = line.trim_ascii();
        if content.is_empty() {
            continue;
        }

        let record = match serde_json::from_slice::<LogRecord>(content) {
            Ok(record) if record.is_well_formed() => record,
            Ok(_) => {
                debug!("Line {}: record missing shortID or originalURL", line_no);
                stats.skipped += 1;
                continue;
            }
            Err(e) => {
                debug!("Line {}: unparsable record: {}", line_no, e);
                stats.skipped += 1;
                continue;
            }
        };

        match apply_record(index, &record) {
            Applied::Yes => stats.applied += 1,
            Applied::Orphan => stats.orphan_deletes += 1,
            Applied::Conflict => {
                debug!(
                    "Line {}: record for {} conflicts with earlier state",
                    line_no, record.short_id
                );
                stats.skipped += 1;
            }
        }
    }

    Ok((stats, torn_tail))
}

enum Applied {
    Yes,
    Orphan,
    Conflict,
}

/// 单条记录应用规则：同一 short_id 后写覆盖先写，删除标记单调
fn apply_record(index: &mut LinkIndex, record: &LogRecord) -> Applied {
    if record.deleted {
        if !index.contains(&record.short_id) {
            return Applied::Orphan;
        }
        index.mark_deleted(&record.short_id);
        return Applied::Yes;
    }

    match index.check_insert(&record.short_id, &record.original_url) {
        InsertCheck::Fresh => {
            index.insert(&record.short_id, &record.original_url, &record.owner_id);
            Applied::Yes
        }
        // 同一条映射重复出现
        _ if index.same_mapping(&record.short_id, &record.original_url, &record.owner_id) => {
            Applied::Yes
        }
        _ => Applied::Conflict,
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save(&self, short_id: &str, original_url: &str, owner_id: &str) -> Result<()> {
        let mut state = self.state.write();
        match state.index.check_insert(short_id, original_url) {
            InsertCheck::Fresh => {
                let record = LogRecord::new(short_id, original_url, owner_id, false);
                state.append(std::slice::from_ref(&record), self.sync_writes)?;
                state.index.insert(short_id, original_url, owner_id);
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
        Ok(self.state.read().index.lookup(short_id))
    }

    async fn find_by_original(&self, original_url: &str) -> Result<Option<String>> {
        Ok(self.state.read().index.find_by_original(original_url))
    }

    async fn save_batch(&self, pairs: &[(String, String)], owner_id: &str) -> Result<()> {
        let mut state = self.state.write();
        let plan = state.index.plan_batch(pairs);

        let records: Vec<LogRecord> = plan
            .fresh
            .iter()
            .map(|(short_id, original_url)| LogRecord::new(short_id, original_url, owner_id, false))
            .collect();
        state.append(&records, self.sync_writes)?;

        for (short_id, original_url) in &plan.fresh {
            state.index.insert(short_id, original_url, owner_id);
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
        Ok(self.state.read().index.user_urls(owner_id))
    }

    async fn delete_urls(&self, owner_id: &str, short_ids: &[String]) -> Result<()> {
        let mut state = self.state.write();
        let targets = state.index.deletable(owner_id, short_ids);
        if targets.is_empty() {
            return Ok(());
        }

        let records: Vec<LogRecord> = targets
            .iter()
            .map(|m| LogRecord::new(&m.short_id, &m.original_url, &m.owner_id, true))
            .collect();
        state.append(&records, self.sync_writes)?;

        for mapping in &targets {
            state.index.mark_deleted(&mapping.short_id);
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
        "file"
    }
}
