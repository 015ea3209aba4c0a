//! Storage contract tests
//!
//! 同一组行为在内存、文件、SQLite 三种后端上逐一验证。

use std::sync::Arc;

use shortener::config::StorageConfig;
use shortener::errors::Result;
use shortener::storage::{LinkLookup, Storage, StorageFactory, UserUrl};
use tempfile::TempDir;

struct Backend {
    storage: Arc<dyn Storage>,
    _dir: Option<TempDir>,
}

async fn backends() -> Vec<Backend> {
    let memory = StorageFactory::create(&StorageConfig::memory())
        .await
        .expect("memory storage");

    let file_dir = TempDir::new().expect("temp dir");
    let file_path = file_dir.path().join("links.json");
    let file = StorageFactory::create(&StorageConfig::file(file_path.to_str().unwrap()))
        .await
        .expect("file storage");

    let db_dir = TempDir::new().expect("temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", db_dir.path().join("links.db").display());
    let database = StorageFactory::create(&StorageConfig::database(db_url))
        .await
        .expect("sqlite storage");

    vec![
        Backend {
            storage: memory,
            _dir: None,
        },
        Backend {
            storage: file,
            _dir: Some(file_dir),
        },
        Backend {
            storage: database,
            _dir: Some(db_dir),
        },
    ]
}

/// 关系型后端在没有匹配行时返回 NoRowsAffected，其余后端静默成功
fn delete_accepted(result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_nothing_to_do() => {}
        Err(e) => panic!("unexpected delete failure: {}", e),
    }
}

fn sorted(mut urls: Vec<UserUrl>) -> Vec<UserUrl> {
    urls.sort_by(|a, b| a.short_id.cmp(&b.short_id));
    urls
}

#[tokio::test]
async fn test_backend_names() {
    let names: Vec<&str> = backends()
        .await
        .iter()
        .map(|b| b.storage.backend_name())
        .collect();
    assert_eq!(names, vec!["memory", "file", "database"]);
}

#[tokio::test]
async fn test_save_get_delete_scenario() {
    for backend in backends().await {
        let s = &backend.storage;
        let name = s.backend_name();

        s.save("AbCdEfGh", "https://example.com", "user-1").await.unwrap();
        assert_eq!(
            s.get("AbCdEfGh").await.unwrap().into_parts(),
            ("https://example.com".to_string(), false, true),
            "{}",
            name
        );

        s.delete_urls("user-1", &["AbCdEfGh".to_string()])
            .await
            .unwrap();
        assert_eq!(
            s.get("AbCdEfGh").await.unwrap().into_parts(),
            ("https://example.com".to_string(), true, true),
            "{}",
            name
        );
        assert!(s.get_user_urls("user-1").await.unwrap().is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_same_url_different_owner_keeps_first_mapping() {
    for backend in backends().await {
        let s = &backend.storage;
        let name = s.backend_name();

        s.save("id1", "https://a.com", "u1").await.unwrap();
        s.save("id2", "https://a.com", "u2").await.unwrap();

        assert_eq!(
            s.find_by_original("https://a.com").await.unwrap().as_deref(),
            Some("id1"),
            "{}",
            name
        );
        assert_eq!(s.get("id2").await.unwrap(), LinkLookup::NotFound, "{}", name);
        assert!(s.get_user_urls("u2").await.unwrap().is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    for backend in backends().await {
        let lookup = backend.storage.get("nothing1").await.unwrap();
        assert!(!lookup.exists());
        assert_eq!(lookup.into_parts(), (String::new(), false, false));
    }
}

#[tokio::test]
async fn test_save_with_taken_id_is_collision() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save("taken", "https://first.com", "u1").await.unwrap();

        let err = s.save("taken", "https://second.com", "u1").await.unwrap_err();
        assert_eq!(err.code(), "E008", "{}", s.backend_name());
        assert_eq!(
            s.get("taken").await.unwrap(),
            LinkLookup::Live("https://first.com".into())
        );
        assert_eq!(s.find_by_original("https://second.com").await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_non_owner_delete_has_no_effect() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save("mine", "https://mine.com", "owner").await.unwrap();

        delete_accepted(s.delete_urls("intruder", &["mine".to_string()]).await);

        assert_eq!(
            s.get("mine").await.unwrap(),
            LinkLookup::Live("https://mine.com".into()),
            "{}",
            s.backend_name()
        );
        assert_eq!(s.get_user_urls("owner").await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_delete_ignores_unknown_and_foreign_ids() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save("a", "https://a.com", "u1").await.unwrap();
        s.save("b", "https://b.com", "u2").await.unwrap();

        let ids = vec!["a".to_string(), "b".to_string(), "zzz".to_string()];
        s.delete_urls("u1", &ids).await.unwrap();

        assert!(s.get("a").await.unwrap().is_deleted());
        assert!(!s.get("b").await.unwrap().is_deleted());
        assert!(!s.get("zzz").await.unwrap().exists());

        // 再删一次是空操作
        delete_accepted(s.delete_urls("u1", &ids[..1]).await);
        assert!(s.get("a").await.unwrap().is_deleted());
    }
}

#[tokio::test]
async fn test_user_urls_only_lists_live_links() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save("a", "https://a.com", "u1").await.unwrap();
        s.save("b", "https://b.com", "u1").await.unwrap();
        s.save("c", "https://c.com", "u1").await.unwrap();
        s.delete_urls("u1", &["b".to_string()]).await.unwrap();

        let urls = sorted(s.get_user_urls("u1").await.unwrap());
        assert_eq!(
            urls,
            vec![
                UserUrl {
                    short_id: "a".into(),
                    original_url: "https://a.com".into()
                },
                UserUrl {
                    short_id: "c".into(),
                    original_url: "https://c.com".into()
                },
            ],
            "{}",
            s.backend_name()
        );
        assert!(s.get_user_urls("never-seen").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_deleted_url_can_be_saved_again() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save("old", "https://again.com", "u1").await.unwrap();
        s.delete_urls("u1", &["old".to_string()]).await.unwrap();
        assert_eq!(s.find_by_original("https://again.com").await.unwrap(), None);

        s.save("new", "https://again.com", "u1").await.unwrap();
        assert_eq!(
            s.find_by_original("https://again.com").await.unwrap().as_deref(),
            Some("new"),
            "{}",
            s.backend_name()
        );
        assert!(s.get("old").await.unwrap().is_deleted());
        // 已删除的 ID 不会被复用
        assert_eq!(
            s.save("old", "https://other.com", "u1").await.unwrap_err().code(),
            "E008"
        );
    }
}

#[tokio::test]
async fn test_save_batch_never_reuses_deleted_id() {
    for backend in backends().await {
        let s = &backend.storage;
        let name = s.backend_name();
        s.save("old", "https://again.com", "u1").await.unwrap();
        s.save("keep", "https://keep.com", "u1").await.unwrap();
        s.delete_urls("u1", &["old".to_string()]).await.unwrap();

        // 同一 ID、同一 URL 也不能复活已删除的映射
        let pairs = vec![
            ("old".to_string(), "https://again.com".to_string()),
            ("keep".to_string(), "https://keep.com".to_string()),
        ];
        let err = s.save_batch(&pairs, "u1").await.unwrap_err();
        assert_eq!(err.code(), "E008", "{}", name);
        assert!(err.message().contains("old"), "{}", name);
        assert!(!err.message().contains("keep"), "{}", name);

        assert!(s.get("old").await.unwrap().is_deleted(), "{}", name);
        assert_eq!(s.find_by_original("https://again.com").await.unwrap(), None);
        assert_eq!(
            s.get_user_urls("u1").await.unwrap().len(),
            1,
            "{}",
            name
        );
    }
}

#[tokio::test]
async fn test_save_batch_dedups_and_persists_valid_items() {
    for backend in backends().await {
        let s = &backend.storage;
        let name = s.backend_name();
        s.save("exists", "https://exists.com", "u1").await.unwrap();

        let pairs = vec![
            ("b1".to_string(), "https://one.com".to_string()),
            ("b2".to_string(), "https://exists.com".to_string()),
            ("exists".to_string(), "https://clash.com".to_string()),
            ("b3".to_string(), "https://three.com".to_string()),
        ];
        let err = s.save_batch(&pairs, "u2").await.unwrap_err();
        assert_eq!(err.code(), "E008", "{}", name);

        assert_eq!(
            s.get("b1").await.unwrap(),
            LinkLookup::Live("https://one.com".into()),
            "{}",
            name
        );
        assert_eq!(
            s.get("b3").await.unwrap(),
            LinkLookup::Live("https://three.com".into()),
            "{}",
            name
        );
        assert_eq!(s.get("b2").await.unwrap(), LinkLookup::NotFound, "{}", name);
        assert_eq!(
            s.get("exists").await.unwrap(),
            LinkLookup::Live("https://exists.com".into())
        );
        assert_eq!(s.get_user_urls("u2").await.unwrap().len(), 2, "{}", name);
    }
}

#[tokio::test]
async fn test_save_batch_happy_path_and_empty_batch() {
    for backend in backends().await {
        let s = &backend.storage;
        s.save_batch(&[], "u1").await.unwrap();

        let pairs: Vec<(String, String)> = (0..20)
            .map(|i| (format!("id{:02}", i), format!("https://site{}.com", i)))
            .collect();
        s.save_batch(&pairs, "u1").await.unwrap();

        assert_eq!(s.get_user_urls("u1").await.unwrap().len(), 20);
        assert_eq!(
            s.find_by_original("https://site7.com").await.unwrap().as_deref(),
            Some("id07")
        );
    }
}

#[tokio::test]
async fn test_factory_prefers_database_then_file() {
    let dir = TempDir::new().unwrap();
    let mut config = StorageConfig::file(dir.path().join("f.json").to_str().unwrap());
    assert_eq!(
        StorageFactory::create(&config).await.unwrap().backend_name(),
        "file"
    );

    config.database_url = format!("sqlite://{}?mode=rwc", dir.path().join("d.db").display());
    assert_eq!(
        StorageFactory::create(&config).await.unwrap().backend_name(),
        "database"
    );

    assert_eq!(
        StorageFactory::create(&StorageConfig::memory())
            .await
            .unwrap()
            .backend_name(),
        "memory"
    );
}

#[tokio::test]
async fn test_factory_rejects_unknown_database_url() {
    let err = StorageFactory::create(&StorageConfig::database("mysql://root@localhost/db"))
        .await
        .err()
        .expect("mysql is not supported");
    assert_eq!(err.code(), "E001");
}
