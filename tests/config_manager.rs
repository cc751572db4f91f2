//! Configuration manager workflows: apply, snapshot, backup, restore.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use media_console::document::{self, Element, Node};
use media_console::manager::{ConfigManager, ManagerError, MemoryFs, ValidationError};
use media_console::remote::MediaServerClient;
use media_console::snapshots::{MemorySnapshotStore, SnapshotId, SnapshotStore, SqliteSnapshotStore};

mod common;

use common::{server_xml_named, start_mock_media_server, MockOptions, NO_BIND_XML, SERVER_XML, UNREACHABLE_URL};

const LIVE: &str = "/etc/ome/Server.xml";

struct Fixture {
    fs: Arc<MemoryFs>,
    store: Arc<MemorySnapshotStore>,
    manager: ConfigManager,
}

fn fixture(live: Option<&str>) -> Fixture {
    let fs = Arc::new(MemoryFs::new());
    if let Some(text) = live {
        fs.insert(LIVE, text);
    }
    let store = Arc::new(MemorySnapshotStore::new());
    let manager = ConfigManager::new(LIVE, store.clone()).with_fs(fs.clone());
    Fixture { fs, store, manager }
}

fn doc(text: &str) -> document::Document {
    document::parse(text).unwrap()
}

fn live_name(fx: &Fixture) -> String {
    fx.manager.read().unwrap().root.child_text("Name").unwrap()
}

#[tokio::test]
async fn test_apply_assigns_sequential_versions() {
    let fx = fixture(Some(SERVER_XML));

    for i in 1..=5 {
        let outcome = fx
            .manager
            .apply(&doc(&server_xml_named(&format!("rev{i}"))), &format!("change {i}"), "alice")
            .await
            .unwrap();
        let snapshot = outcome.snapshot.unwrap();
        assert_eq!(snapshot.version, i);
        assert_eq!(snapshot.user_id, "alice");
        assert!(!snapshot.is_active);
    }

    let versions: Vec<i64> = fx
        .manager
        .list_snapshots(50)
        .unwrap()
        .iter()
        .map(|s| s.version)
        .collect();
    assert_eq!(versions, vec![5, 4, 3, 2, 1]);
    assert_eq!(live_name(&fx), "rev5");
}

#[tokio::test]
async fn test_apply_snapshots_previous_content() {
    let fx = fixture(Some(SERVER_XML));

    let outcome = fx
        .manager
        .apply(&doc(&server_xml_named("next")), "rename", "alice")
        .await
        .unwrap();

    let snapshot = fx.store.get(outcome.snapshot.unwrap().id).unwrap().unwrap();
    assert_eq!(snapshot.configuration_data, SERVER_XML);

    let backup = outcome.backup_path.unwrap();
    assert!(backup.to_string_lossy().starts_with("/etc/ome/Server.xml.backup."));
    assert_eq!(fx.fs.contents(&backup).as_deref(), Some(SERVER_XML));
}

#[tokio::test]
async fn test_concurrent_applies_never_share_a_version() {
    let fx = fixture(Some(SERVER_XML));
    let manager = Arc::new(fx.manager);

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .apply(&doc(&server_xml_named(&format!("task{i}"))), "parallel", "bot")
                    .await
                    .unwrap()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let mut versions: Vec<i64> = fx.store.list(100).unwrap().iter().map(|s| s.version).collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_invalid_apply_writes_nothing() {
    let fx = fixture(Some(SERVER_XML));

    let err = fx
        .manager
        .apply(&doc(NO_BIND_XML), "broken", "alice")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ManagerError::InvalidConfiguration(ValidationError::MissingBind)
    ));
    assert_eq!(fx.fs.write_count(), 0);
    assert_eq!(fx.store.latest_version().unwrap(), 0);
    assert_eq!(fx.fs.contents(Path::new(LIVE)).as_deref(), Some(SERVER_XML));
}

#[tokio::test]
async fn test_apply_text_rejects_malformed_markup() {
    let fx = fixture(Some(SERVER_XML));

    let err = fx
        .manager
        .apply_text("<Server version=\"8\">", "truncated", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Parse(_)));
    assert_eq!(fx.fs.write_count(), 0);
}

#[tokio::test]
async fn test_apply_without_live_file() {
    let fx = fixture(None);

    let outcome = fx
        .manager
        .apply(&doc(SERVER_XML), "initial", "alice")
        .await
        .unwrap();

    assert!(outcome.snapshot.is_none());
    assert!(outcome.backup_path.is_none());
    assert_eq!(live_name(&fx), "OvenMediaEngine");
}

#[tokio::test]
async fn test_failed_write_keeps_snapshot() {
    let fx = fixture(Some(SERVER_XML));
    fx.fs.fail_writes(true);

    let err = fx
        .manager
        .apply(&doc(&server_xml_named("never")), "doomed", "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, ManagerError::Io { .. }));
    assert_eq!(fx.store.latest_version().unwrap(), 1);
    assert_eq!(fx.fs.contents(Path::new(LIVE)).as_deref(), Some(SERVER_XML));
}

#[tokio::test]
async fn test_restore_activates_exactly_one() {
    let fx = fixture(Some(&server_xml_named("v0")));

    let mut ids = Vec::new();
    for name in ["v1", "v2", "v3"] {
        let outcome = fx
            .manager
            .apply(&doc(&server_xml_named(name)), name, "alice")
            .await
            .unwrap();
        ids.push(outcome.snapshot.unwrap().id);
    }

    // ids[1] holds the content that was live before "v2" was applied.
    let restored = fx.manager.restore(ids[1]).await.unwrap();
    assert!(restored.is_active);
    assert_eq!(live_name(&fx), "v1");

    let active: Vec<SnapshotId> = fx
        .store
        .list(50)
        .unwrap()
        .iter()
        .filter(|s| s.is_active)
        .map(|s| s.id)
        .collect();
    assert_eq!(active, vec![ids[1]]);

    fx.manager.restore(ids[0]).await.unwrap();
    assert_eq!(fx.manager.active_snapshot().unwrap().unwrap().id, ids[0]);
    assert_eq!(live_name(&fx), "v0");

    // Restoring does not add snapshots.
    assert_eq!(fx.store.latest_version().unwrap(), 3);
}

#[tokio::test]
async fn test_restore_invalid_snapshot_never_writes() {
    let fx = fixture(Some(SERVER_XML));
    let snapshot = fx
        .manager
        .create_snapshot_record(&doc(NO_BIND_XML), "imported", "alice")
        .await
        .unwrap();
    assert_eq!(snapshot.version, 1);

    let err = fx.manager.restore(snapshot.id).await.unwrap_err();

    assert!(matches!(
        err,
        ManagerError::InvalidConfiguration(ValidationError::MissingBind)
    ));
    assert_eq!(fx.fs.write_count(), 0);
    assert!(fx.manager.active_snapshot().unwrap().is_none());
}

#[tokio::test]
async fn test_restore_unknown_snapshot() {
    let fx = fixture(Some(SERVER_XML));
    let err = fx.manager.restore(SnapshotId(42)).await.unwrap_err();
    assert!(matches!(err, ManagerError::SnapshotNotFound(SnapshotId(42))));
}

#[tokio::test]
async fn test_read_errors() {
    let missing = fixture(None);
    assert!(matches!(missing.manager.read(), Err(ManagerError::NotFound(_))));

    let malformed = fixture(Some("<Server><Bind></Server>"));
    assert!(matches!(malformed.manager.read(), Err(ManagerError::Parse(_))));
    assert_eq!(
        malformed.manager.read_raw().unwrap(),
        "<Server><Bind></Server>"
    );
}

#[tokio::test]
async fn test_single_virtual_host_stays_single() {
    let fx = fixture(Some(SERVER_XML));

    let vhosts = fx.manager.get_virtual_hosts().unwrap();
    assert_eq!(vhosts.len(), 1);

    let mut updated = vhosts[0].clone();
    updated
        .ensure_child("Applications")
        .children
        .push(Node::Element(
            Element::new("Application").with_child(Element::new("Name").with_text("app")),
        ));

    assert!(fx
        .manager
        .update_virtual_host("default", updated.clone(), "alice")
        .await
        .unwrap());

    let vhosts = fx.manager.get_virtual_hosts().unwrap();
    assert_eq!(vhosts, vec![updated]);
    assert_eq!(fx.manager.get_server_info().unwrap().virtual_host_count, 1);
}

#[tokio::test]
async fn test_virtual_host_update_snapshots_previous_file() {
    let fx = fixture(Some(SERVER_XML));
    let vhost = Element::new("VirtualHost").with_child(Element::new("Name").with_text("default"));

    assert!(fx.manager.update_virtual_host("default", vhost, "bob").await.unwrap());

    assert_eq!(fx.store.latest_version().unwrap(), 1);
    let snapshot = fx.manager.list_snapshots(1).unwrap().remove(0);
    assert_eq!(snapshot.user_id, "bob");
    let stored = fx.store.get(snapshot.id).unwrap().unwrap();
    assert_eq!(stored.configuration_data, SERVER_XML);

    // The pre-edit state is reachable through restore.
    fx.manager.restore(snapshot.id).await.unwrap();
    assert_eq!(fx.manager.read().unwrap(), doc(SERVER_XML));
}

#[tokio::test]
async fn test_update_unknown_virtual_host() {
    let fx = fixture(Some(SERVER_XML));

    let updated = fx
        .manager
        .update_virtual_host("nope", Element::new("VirtualHost"), "alice")
        .await
        .unwrap();

    assert!(!updated);
    assert_eq!(fx.fs.write_count(), 0);
    assert_eq!(fx.store.latest_version().unwrap(), 0);
}

#[tokio::test]
async fn test_write_backs_up_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("Server.xml");
    let a = server_xml_named("A");
    std::fs::write(&live, &a).unwrap();

    let store = Arc::new(SqliteSnapshotStore::open(&dir.path().join("console.db")).unwrap());
    let manager = ConfigManager::new(&live, store);

    let outcome = manager.write(&doc(&server_xml_named("B")), true).await.unwrap();
    let backup = outcome.backup_path.unwrap();

    assert_eq!(std::fs::read_to_string(&backup).unwrap(), a);
    assert_eq!(manager.read().unwrap().root.child_text("Name").as_deref(), Some("B"));

    let no_backup = manager.write(&doc(&server_xml_named("C")), false).await.unwrap();
    assert!(no_backup.backup_path.is_none());
}

#[tokio::test]
async fn test_sqlite_backed_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("Server.xml");
    std::fs::write(&live, SERVER_XML).unwrap();

    let store = Arc::new(SqliteSnapshotStore::open(&dir.path().join("console.db")).unwrap());
    let manager = ConfigManager::new(&live, store);

    let first = manager
        .apply_text(&server_xml_named("edited"), "edit", "alice")
        .await
        .unwrap()
        .snapshot
        .unwrap();
    manager.restore(first.id).await.unwrap();

    let restored = manager.read().unwrap();
    assert_eq!(restored, document::parse(SERVER_XML).unwrap());
    assert_eq!(manager.active_snapshot().unwrap().unwrap().version, 1);
}

#[tokio::test]
async fn test_status_without_client() {
    let fx = fixture(Some(SERVER_XML));

    let connection = fx.manager.test_remote_connection().await;
    assert!(!connection.connected);
    assert!(connection.error.is_some());

    let status = fx.manager.status().await;
    assert!(!status.api_connected);
    assert!(status.api_url.is_none());
}

#[tokio::test]
async fn test_status_reports_unreachable_server() {
    let client = MediaServerClient::new(UNREACHABLE_URL, "", Duration::from_secs(2)).unwrap();
    let fx = fixture(Some(SERVER_XML));
    let manager = fx.manager.with_client(client);

    let status = manager.status().await;
    assert!(!status.api_connected);
    assert!(status.error.is_some());
    assert!(status.stats.is_none());
}

#[tokio::test]
async fn test_status_with_and_without_stats() {
    let old = start_mock_media_server(MockOptions::default()).await;
    let client = MediaServerClient::new(&old.url(), "", Duration::from_secs(5)).unwrap();
    let status = fixture(None).manager.with_client(client).status().await;
    assert!(status.api_connected);
    assert!(status.error.as_deref().unwrap().starts_with("Stats unavailable"));
    assert!(status.stats.is_none());

    let current = start_mock_media_server(MockOptions {
        stats_available: true,
        ..Default::default()
    })
    .await;
    let client = MediaServerClient::new(&current.url(), "", Duration::from_secs(5)).unwrap();
    let status = fixture(None).manager.with_client(client).status().await;
    assert!(status.api_connected);
    assert!(status.error.is_none());
    assert_eq!(status.stats.unwrap()["totalConnections"], 3);
}
