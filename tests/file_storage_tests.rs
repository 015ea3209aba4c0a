//! Append-log file backend tests
//!
//! 重放、容错以及重启前后状态一致性。

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use shortener::storage::file::LogRecord;
use shortener::storage::{FileStorage, LinkLookup, Storage, UserUrl};
use tempfile::TempDir;

fn read_records(path: &Path) -> Vec<LogRecord> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn sorted(mut urls: Vec<UserUrl>) -> Vec<UserUrl> {
    urls.sort_by(|a, b| a.short_id.cmp(&b.short_id));
    urls
}

async fn snapshot(
    storage: &FileStorage,
    ids: &[String],
    owners: &[&str],
) -> (Vec<LinkLookup>, Vec<Vec<UserUrl>>) {
    let mut lookups = Vec::new();
    for id in ids {
        lookups.push(storage.get(id).await.unwrap());
    }
    let mut listings = Vec::new();
    for owner in owners {
        listings.push(sorted(storage.get_user_urls(owner).await.unwrap()));
    }
    (lookups, listings)
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let owners = ["u1", "u2", "u3"];
    let ids: Vec<String> = (0..30).map(|i| format!("id{:06}", i)).collect();

    let before = {
        let storage = FileStorage::open(&path, false).unwrap();
        for (i, id) in ids.iter().enumerate() {
            storage
                .save(id, &format!("https://site{}.com/page", i), owners[i % 3])
                .await
                .unwrap();
        }
        for (n, owner) in owners.iter().enumerate() {
            let victims: Vec<String> = ids.iter().skip(n).step_by(6).cloned().collect();
            storage.delete_urls(owner, &victims).await.unwrap();
        }
        snapshot(&storage, &ids, &owners).await
    };

    let reopened = FileStorage::open(&path, false).unwrap();
    let after = snapshot(&reopened, &ids, &owners).await;

    assert_eq!(before, after);
    assert_eq!(reopened.skipped_records(), 0);
    assert_eq!(before.0.iter().filter(|l| l.is_deleted()).count(), 15);
}

#[tokio::test]
async fn test_delete_appends_new_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let storage = FileStorage::open(&path, true).unwrap();

    storage.save("a", "https://a.com", "u1").await.unwrap();
    storage.delete_urls("u1", &["a".to_string()]).await.unwrap();
    // 不属于自己或已删除的 ID 不追加记录
    storage.delete_urls("u2", &["a".to_string()]).await.unwrap();
    storage.delete_urls("u1", &["a".to_string()]).await.unwrap();

    let records = read_records(&path);
    assert_eq!(records.len(), 2);
    assert!(!records[0].deleted);
    assert!(records[1].deleted);
    assert_eq!(records[1].short_id, "a");
    assert_ne!(records[0].record_id, records[1].record_id);
}

#[tokio::test]
async fn test_dedup_and_collision_write_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let storage = FileStorage::open(&path, false).unwrap();

    storage.save("a", "https://a.com", "u1").await.unwrap();
    storage.save("b", "https://a.com", "u2").await.unwrap();
    assert!(storage.save("a", "https://z.com", "u1").await.is_err());

    assert_eq!(read_records(&path).len(), 1);
}

#[tokio::test]
async fn test_malformed_lines_are_skipped_and_counted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    fs::write(
        &path,
        concat!(
            r#"{"recordID":"1","shortID":"a","originalURL":"https://a.com","ownerID":"u1","deletedFlag":false}"#,
            "\n",
            "this is not json\n",
            "\n",
            r#"{"recordID":"2","shortID":"","originalURL":"https://empty.com","ownerID":"u1"}"#,
            "\n",
            r#"{"recordID":"3","shortID":"b","originalURL":"https://b.com","ownerID":"u1","deletedFlag":false}"#,
            "\n",
        ),
    )
    .unwrap();

    let storage = FileStorage::open(&path, false).unwrap();
    assert_eq!(storage.skipped_records(), 2);
    assert_eq!(storage.replay_stats().applied, 2);
    assert_eq!(
        storage.get("b").await.unwrap(),
        LinkLookup::Live("https://b.com".into())
    );
}

#[tokio::test]
async fn test_legacy_field_names_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short-url-db.json");
    fs::write(
        &path,
        concat!(
            r#"{"uuid":"1","short_url":"legacy01","original_url":"https://old.com","user_id":"u9","deleted_flag":false}"#,
            "\n",
            r#"{"uuid":"2","short_url":"legacy02","original_url":"https://older.com","user_id":"u9"}"#,
            "\n",
            r#"{"uuid":"3","short_url":"legacy02","original_url":"https://older.com","user_id":"u9","deleted_flag":true}"#,
            "\n",
        ),
    )
    .unwrap();

    let storage = FileStorage::open(&path, false).unwrap();
    assert_eq!(
        storage.get("legacy01").await.unwrap(),
        LinkLookup::Live("https://old.com".into())
    );
    assert!(storage.get("legacy02").await.unwrap().is_deleted());
    assert_eq!(storage.get_user_urls("u9").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_orphan_delete_establishes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    fs::write(
        &path,
        concat!(
            r#"{"recordID":"1","shortID":"ghost","originalURL":"https://g.com","ownerID":"u1","deletedFlag":true}"#,
            "\n",
        ),
    )
    .unwrap();

    let storage = FileStorage::open(&path, false).unwrap();
    assert_eq!(storage.get("ghost").await.unwrap(), LinkLookup::NotFound);
    assert_eq!(storage.replay_stats().orphan_deletes, 1);

    // 随后仍可正常创建
    storage.save("ghost", "https://g.com", "u1").await.unwrap();
    assert!(storage.get("ghost").await.unwrap().exists());
}

#[tokio::test]
async fn test_torn_tail_is_isolated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    {
        let storage = FileStorage::open(&path, false).unwrap();
        storage.save("a", "https://a.com", "u1").await.unwrap();
    }
    // 模拟写入一半时崩溃
    OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap()
        .write_all(br#"{"recordID":"x","shortID":"b","origin"#)
        .unwrap();

    {
        let storage = FileStorage::open(&path, false).unwrap();
        assert_eq!(storage.skipped_records(), 1);
        storage.save("c", "https://c.com", "u1").await.unwrap();
    }

    let storage = FileStorage::open(&path, false).unwrap();
    assert_eq!(storage.skipped_records(), 1);
    assert!(storage.get("a").await.unwrap().exists());
    assert!(!storage.get("b").await.unwrap().exists());
    assert_eq!(
        storage.get("c").await.unwrap(),
        LinkLookup::Live("https://c.com".into())
    );
}

#[tokio::test]
async fn test_open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/links.json");

    let storage = FileStorage::open(&path, false).unwrap();
    storage.save("a", "https://a.com", "u1").await.unwrap();

    assert!(path.exists());
    assert_eq!(storage.path(), path.as_path());
}
