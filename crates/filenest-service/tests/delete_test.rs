//! Integration tests for file deletion and recursive folder deletion.

mod helpers;

use std::sync::Arc;

use bytes::Bytes;

use filenest_core::ErrorKind;
use filenest_core::traits::{BlobStore, MetadataStore};
use filenest_service::{HierarchicalStorageManager, ManagerConfig, SessionContext};
use filenest_storage::MemoryMetadataStore;

use helpers::{FlakyBlobStore, ScriptedMetadataStore, TestApp, upload};

fn manager_over(
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    config: ManagerConfig,
) -> HierarchicalStorageManager {
    HierarchicalStorageManager::new(SessionContext::new("u1").unwrap(), metadata, blobs, config)
}

#[tokio::test]
async fn test_cascade_removes_whole_subtree() {
    let app = TestApp::new("u1");
    let m = &app.manager;

    let root = m.create_folder(None, "Projects").await.unwrap();
    let child = m.create_folder(Some(&root.id), "2024").await.unwrap();
    let grandchild = m.create_folder(Some(&child.id), "Q1").await.unwrap();
    let sibling = m.create_folder(None, "Keep").await.unwrap();

    upload(m, Some(&root.id), "a.txt").await;
    upload(m, Some(&child.id), "b.txt").await;
    upload(m, Some(&grandchild.id), "c.txt").await;
    let kept = upload(m, Some(&sibling.id), "d.txt").await;

    let outcome = m.delete_folder_recursive(&root.id).await.unwrap();
    assert_eq!(outcome.folders_deleted, 3);
    assert_eq!(outcome.files_deleted, 3);
    assert!(outcome.is_clean());

    assert_eq!(app.metadata.count("folders").await, 1);
    assert_eq!(app.metadata.count("files").await, 1);
    assert_eq!(app.blobs.paths().await, vec![kept.blob_path.clone()]);
    assert!(m.get_folder(&grandchild.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_cascade_sweeps_stray_blobs_under_subtree_prefixes() {
    let app = TestApp::new("u1");
    let m = &app.manager;

    let root = m.create_folder(None, "Root").await.unwrap();
    let child = m.create_folder(Some(&root.id), "Child").await.unwrap();

    let stray = format!("u1/{}/orphan.bin", child.id);
    app.blobs
        .upload(&stray, Bytes::from("x"), &|_| {})
        .await
        .unwrap();

    let outcome = m.delete_folder_recursive(&root.id).await.unwrap();
    assert_eq!(outcome.blob_paths_deleted, 1);
    assert!(!app.blobs.contains(&stray).await);
}

#[tokio::test]
async fn test_empty_folder_is_one_deletion() {
    let metadata = Arc::new(ScriptedMetadataStore::new(500));
    let blobs = Arc::new(FlakyBlobStore::new());
    let m = manager_over(metadata.clone(), blobs.clone(), ManagerConfig::default());

    let folder = m.create_folder(None, "Empty").await.unwrap();
    let outcome = m.delete_folder_recursive(&folder.id).await.unwrap();

    assert_eq!(outcome.folders_deleted, 1);
    assert_eq!(outcome.files_deleted, 0);
    assert_eq!(metadata.batch_sizes(), vec![1]);
    assert!(blobs.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_commit_leaves_everything_in_place() {
    let metadata = Arc::new(ScriptedMetadataStore::new(500));
    let blobs = Arc::new(FlakyBlobStore::new());
    let m = manager_over(metadata.clone(), blobs.clone(), ManagerConfig::default());

    let root = m.create_folder(None, "Root").await.unwrap();
    let child = m.create_folder(Some(&root.id), "Child").await.unwrap();
    let file = upload(&m, Some(&child.id), "a.txt").await;

    metadata.fail_commit_number(1);
    let err = m.delete_folder_recursive(&root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::BulkDelete);
    assert!(err.message.contains("after 0 of 3"));

    assert_eq!(metadata.inner.count("folders").await, 2);
    assert_eq!(metadata.inner.count("files").await, 1);
    assert!(blobs.inner.contains(&file.blob_path).await);
    assert!(blobs.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_large_cascade_is_chunked_children_first() {
    let metadata = Arc::new(ScriptedMetadataStore::new(3));
    let blobs = Arc::new(FlakyBlobStore::new());
    let m = manager_over(metadata.clone(), blobs.clone(), ManagerConfig::default());

    let root = m.create_folder(None, "Root").await.unwrap();
    let child = m.create_folder(Some(&root.id), "Child").await.unwrap();
    for name in ["a", "b", "c", "d"] {
        upload(&m, Some(&child.id), name).await;
    }
    upload(&m, Some(&root.id), "e").await;

    // Fail the second chunk: only the first three staged records go.
    metadata.fail_commit_number(2);
    let err = m.delete_folder_recursive(&root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::BulkDelete);
    assert!(err.message.contains("after 3 of 7"));
    assert_eq!(metadata.batch_sizes(), vec![3, 3]);

    // The child folder and both parents survive; no orphaned child record.
    assert!(m.get_folder(&child.id).await.is_ok());
    assert!(m.get_folder(&root.id).await.is_ok());
    assert_eq!(metadata.inner.count("files").await, 2);

    metadata.fail_commit_number(0);
    let outcome = m.delete_folder_recursive(&root.id).await.unwrap();
    assert_eq!(outcome.folders_deleted, 2);
    assert_eq!(metadata.inner.count("files").await, 0);
    assert!(metadata.batch_sizes().iter().all(|&n| n <= 3));
    assert!(blobs.inner.paths().await.is_empty());
}

#[tokio::test]
async fn test_manager_limit_caps_batches() {
    let metadata = Arc::new(ScriptedMetadataStore::new(500));
    let blobs = Arc::new(FlakyBlobStore::new());
    let config = ManagerConfig {
        max_batch_operations: 2,
        ..ManagerConfig::default()
    };
    let m = manager_over(metadata.clone(), blobs, config);

    let root = m.create_folder(None, "Root").await.unwrap();
    for name in ["a", "b", "c"] {
        upload(&m, Some(&root.id), name).await;
    }
    m.delete_folder_recursive(&root.id).await.unwrap();
    assert_eq!(metadata.batch_sizes(), vec![2, 2]);
}

#[tokio::test]
async fn test_missing_folder_is_noop() {
    let app = TestApp::new("u1");
    let outcome = app
        .manager
        .delete_folder_recursive(&"gone".into())
        .await
        .unwrap();
    assert_eq!(outcome.folders_deleted, 0);
    assert!(outcome.is_clean());
}

#[tokio::test]
async fn test_foreign_folder_is_rejected() {
    let app = TestApp::new("u1");
    let other = app.session("u2");
    let folder = other.create_folder(None, "Theirs").await.unwrap();

    let err = app
        .manager
        .delete_folder_recursive(&folder.id)
        .await
        .unwrap_err();
    assert!(err.is_authorization());
    assert!(other.get_folder(&folder.id).await.is_ok());
}

#[tokio::test]
async fn test_denied_query_surfaces_authorization() {
    let inner = ScriptedMetadataStore::new(500);
    let folder_id = inner
        .inner
        .insert(
            "folders",
            serde_json::json!({
                "name": "Root",
                "ownerId": "u1",
                "parentFolderId": null,
                "createdAt": "2024-01-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();
    let metadata = Arc::new(ScriptedMetadataStore {
        deny_queries: true,
        ..inner
    });
    let m = manager_over(metadata.clone(), Arc::new(FlakyBlobStore::new()), ManagerConfig::default());

    let err = m
        .delete_folder_recursive(&folder_id.into())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.resource.unwrap().target, "files");
    assert!(metadata.batch_sizes().is_empty());
}

#[tokio::test]
async fn test_delete_file_is_idempotent() {
    let app = TestApp::new("u1");
    let file = upload(&app.manager, None, "a.txt").await;

    let first = app.manager.delete_file(&file).await.unwrap();
    assert!(first.is_clean());
    assert_eq!(first.files_deleted, 1);
    let second = app.manager.delete_file(&file).await.unwrap();
    assert!(second.is_clean());
    assert_eq!(second.files_deleted, 0);

    assert_eq!(app.metadata.count("files").await, 0);
    assert!(app.blobs.paths().await.is_empty());
}

#[tokio::test]
async fn test_delete_file_removes_distinct_thumbnail() {
    let app = TestApp::new("u1");
    let mut file = upload(&app.manager, None, "a.png").await;
    let thumb = "u1/thumbs/a.png".to_string();
    app.blobs
        .upload(&thumb, Bytes::from("t"), &|_| {})
        .await
        .unwrap();
    file.thumbnail_path = Some(thumb.clone());

    let outcome = app.manager.delete_file(&file).await.unwrap();
    assert_eq!(outcome.blob_paths_deleted, 2);
    assert!(!app.blobs.contains(&thumb).await);
}

#[tokio::test]
async fn test_delete_foreign_file_is_rejected() {
    let app = TestApp::new("u1");
    let theirs = upload(&app.session("u2"), None, "x.txt").await;

    let err = app.manager.delete_file(&theirs).await.unwrap_err();
    assert!(err.is_authorization());
    assert_eq!(app.metadata.count("files").await, 1);
}

#[tokio::test]
async fn test_bulk_delete_commits_despite_blob_failures() {
    let metadata = Arc::new(MemoryMetadataStore::new(500));
    let blobs = Arc::new(FlakyBlobStore {
        fail_deletes_matching: vec!["bad".into()],
        ..FlakyBlobStore::new()
    });
    let m = manager_over(metadata.clone(), blobs.clone(), ManagerConfig::default());

    let good = upload(&m, None, "good.txt").await;
    let bad = upload(&m, None, "bad.txt").await;

    let outcome = m
        .delete_files(&[good.clone(), bad.clone(), good.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.files_deleted, 2);
    assert_eq!(outcome.blob_paths_deleted, 1);
    assert_eq!(outcome.blob_failures.len(), 1);
    assert_eq!(outcome.blob_failures[0].path, bad.blob_path);
    assert_eq!(outcome.blob_failures[0].error.kind, ErrorKind::Storage);

    assert_eq!(metadata.count("files").await, 0);
    assert!(!blobs.inner.contains(&good.blob_path).await);
    assert!(blobs.inner.contains(&bad.blob_path).await);
}

#[tokio::test]
async fn test_bulk_delete_checks_ownership_first() {
    let app = TestApp::new("u1");
    let mine = upload(&app.manager, None, "mine.txt").await;
    let theirs = upload(&app.session("u2"), None, "theirs.txt").await;

    let err = app.manager.delete_files(&[mine, theirs]).await.unwrap_err();
    assert!(err.is_authorization());
    assert_eq!(app.metadata.count("files").await, 2);
}

#[tokio::test]
async fn test_blob_cleanup_order_does_not_matter() {
    for concurrency in [1, 2, 16] {
        let config = ManagerConfig {
            blob_delete_concurrency: concurrency,
            ..ManagerConfig::default()
        };
        let app = TestApp::with_config("u1", config);
        let m = &app.manager;

        let root = m.create_folder(None, "Root").await.unwrap();
        let child = m.create_folder(Some(&root.id), "Child").await.unwrap();
        for i in 0..5 {
            upload(m, Some(&root.id), &format!("r{i}")).await;
            upload(m, Some(&child.id), &format!("c{i}")).await;
        }

        let outcome = m.delete_folder_recursive(&root.id).await.unwrap();
        assert_eq!(outcome.blob_paths_deleted, 10);
        assert!(app.blobs.paths().await.is_empty());
    }
}

#[tokio::test]
async fn test_owner_nested_under_another_owners_folder_is_rejected() {
    let app = TestApp::new("u1");
    let folder = app.manager.create_folder(None, "Shared").await.unwrap();
    upload(&app.manager, Some(&folder.id), "mine.txt").await;

    let nested = format!("u1/{}", folder.id);
    let err = SessionContext::new(nested.as_str()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let neighbour = app.session("u1x");
    let theirs = upload(&neighbour, None, "theirs.txt").await;

    let outcome = app.manager.delete_folder_recursive(&folder.id).await.unwrap();
    assert_eq!(outcome.files_deleted, 1);
    assert!(app.blobs.contains(&theirs.blob_path).await);
    assert!(neighbour.get_file(&theirs.id).await.is_ok());
}

#[tokio::test]
async fn test_same_name_uploads_delete_independently() {
    let app = TestApp::new("u1");
    for _ in 0..50 {
        let a = upload(&app.manager, None, "dup.txt").await;
        let b = upload(&app.manager, None, "dup.txt").await;
        assert_ne!(a.blob_path, b.blob_path);

        app.manager.delete_file(&a).await.unwrap();
        assert!(app.blobs.contains(&b.blob_path).await);
        app.manager.delete_file(&b).await.unwrap();
    }
    assert!(app.blobs.paths().await.is_empty());
}

#[tokio::test]
async fn test_bulk_delete_counts_only_removed_records() {
    let app = TestApp::new("u1");
    let a = upload(&app.manager, None, "a.txt").await;
    let b = upload(&app.manager, None, "b.txt").await;

    app.manager.delete_file(&a).await.unwrap();
    let outcome = app.manager.delete_files(&[a, b]).await.unwrap();
    assert_eq!(outcome.files_deleted, 1);
    assert_eq!(app.metadata.count("files").await, 0);
}
