//! Scenario tests for the reconciliation engine
//!
//! A scripted in-memory transport stands in for the remote root so every
//! scenario runs against a real temporary local root.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tempfile::TempDir;
use url::Url;

use super::*;
use crate::app::client::{save_stream, DownloadStats, Transport};
use crate::app::dataset::{HashDataset, ManifestDataset};
use crate::app::hash::Md5Hash;
use crate::app::models::{FileAction, FileDescriptor, RemoteHashes, SyncRoots};
use crate::app::signals::{create_shutdown_channel, ShutdownListener};
use crate::errors::{DownloadError, DownloadResult, SyncError};

#[derive(Debug, Clone)]
enum Reply {
    Body(Vec<u8>),
    Fail,
    Hang,
}

/// Serves queued replies per path; the last reply of a queue repeats
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn serve(self, path: &str, replies: Vec<Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self, path: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Fail),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Fail),
            None => Reply::Fail,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn download(
        &self,
        url: &Url,
        destination: &Path,
        _show_progress: bool,
    ) -> DownloadResult<DownloadStats> {
        let path = url.path().trim_start_matches('/').to_string();
        self.calls.lock().unwrap().push(path.clone());

        match self.next_reply(&path) {
            Reply::Body(body) => {
                let declared = Some(body.len() as u64);
                let chunks: Vec<Result<Vec<u8>, DownloadError>> =
                    body.chunks(64).map(|chunk| Ok(chunk.to_vec())).collect();
                save_stream(stream::iter(chunks), destination, declared, None).await
            }
            Reply::Fail => Err(DownloadError::ServerError { status: 404 }),
            Reply::Hang => std::future::pending::<DownloadResult<DownloadStats>>().await,
        }
    }
}

struct Fixture {
    temp_dir: TempDir,
    roots: SyncRoots,
    manifest: ManifestDataset,
    hashes: HashDataset,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let roots = SyncRoots::new("patch.example.com", Some(8080), temp_dir.path()).unwrap();
        Self {
            temp_dir,
            roots,
            manifest: ManifestDataset::new(),
            hashes: HashDataset::new(),
        }
    }

    /// Track `raw` in the manifest and publish `content` as its only release
    fn publish(&mut self, raw: &str, content: &[u8]) -> &mut Self {
        self.publish_sized(raw, content, Some(content.len() as u64))
    }

    fn publish_sized(&mut self, raw: &str, content: &[u8], size: Option<u64>) -> &mut Self {
        let file = FileDescriptor::parse(raw);
        let hex = Md5Hash::of(content).to_hex();
        self.hashes
            .insert_remote(file.clone(), RemoteHashes::new(&hex, &hex), size);
        self.manifest.insert(file);
        self
    }

    async fn write_local(&self, id: &str, content: &[u8]) {
        let path = FileDescriptor::parse(id).local_path(&self.roots);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    async fn read_local(&self, id: &str) -> Option<Vec<u8>> {
        let path = FileDescriptor::parse(id).local_path(&self.roots);
        tokio::fs::read(path).await.ok()
    }

    async fn hash_local(&mut self) {
        self.hashes
            .build_local_hashes(&self.manifest, &self.roots)
            .await;
    }

    async fn run(&mut self, transport: &ScriptedTransport) -> Result<SyncReport, SyncError> {
        let mut engine = SyncEngine::new(&self.roots, transport, EngineConfig::default());
        engine.run(&self.manifest, &mut self.hashes).await
    }
}

fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_missing_files_are_fetched_then_idempotent() {
    let mut fixture = Fixture::new();
    fixture
        .publish("art.mul", b"art")
        .publish("data\\map0.mul", b"map data");
    fixture.hash_local().await;

    let transport = ScriptedTransport::default()
        .serve("art.mul", vec![Reply::Body(b"art".to_vec())])
        .serve("data/map0.mul", vec![Reply::Body(b"map data".to_vec())]);

    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.bytes_transferred, 11);
    assert_eq!(report.created, 2);
    assert_eq!(transport.calls(), vec!["art.mul", "data/map0.mul"]);
    assert_eq!(fixture.read_local("data/map0.mul").await.unwrap(), b"map data");

    // Second run on the in-memory state
    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.bytes_transferred, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(transport.calls().len(), 2);

    // And on freshly hashed disk state
    fixture.hash_local().await;
    let planned = plan(&fixture.manifest, &fixture.hashes);
    assert!(planned.iter().all(|p| p.action == FileAction::None));
}

#[tokio::test]
async fn test_stale_copy_replaced_but_create_once_kept() {
    let mut fixture = Fixture::new();
    fixture
        .publish("client.exe", b"new build")
        .publish("+settings.cfg", b"default settings");
    fixture.write_local("client.exe", b"old build").await;
    fixture.write_local("settings.cfg", b"user edited").await;
    fixture.hash_local().await;

    let transport =
        ScriptedTransport::default().serve("client.exe", vec![Reply::Body(b"new build".to_vec())]);

    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(transport.calls(), vec!["client.exe"]);
    assert_eq!(fixture.read_local("client.exe").await.unwrap(), b"new build");
    assert_eq!(fixture.read_local("settings.cfg").await.unwrap(), b"user edited");
    assert_eq!(
        fixture.hashes.local_hash("client.exe"),
        Some(&Md5Hash::of(b"new build"))
    );
}

#[tokio::test]
async fn test_create_hint_fetches_missing_file() {
    let mut fixture = Fixture::new();
    fixture.publish("+settings.cfg", b"defaults");
    fixture.hash_local().await;

    let transport = ScriptedTransport::default()
        .serve("settings.cfg", vec![Reply::Body(b"defaults".to_vec())]);

    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(fixture.read_local("settings.cfg").await.unwrap(), b"defaults");
}

#[tokio::test]
async fn test_delete_hint_removes_and_purges() {
    let mut fixture = Fixture::new();
    fixture
        .publish("music/-old.mp3", b"old music")
        .publish("-never-installed.bin", b"x");
    fixture.write_local("music/old.mp3", b"old music").await;
    fixture.hash_local().await;

    let transport = ScriptedTransport::default();
    let report = fixture.run(&transport).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.bytes_transferred, 0);
    assert!(transport.calls().is_empty());
    assert!(fixture.read_local("music/old.mp3").await.is_none());
    assert_eq!(fixture.hashes.local_hash("music/old.mp3"), None);
    assert_eq!(fixture.hashes.local_size("music/old.mp3"), None);
    assert_eq!(fixture.hashes.remote_size("music/old.mp3"), None);
}

#[tokio::test]
async fn test_delete_of_vanished_file_is_counted_and_purged() {
    let mut fixture = Fixture::new();
    fixture.publish("-gone.bin", b"gone").publish("kept.bin", b"kept");
    fixture.write_local("kept.bin", b"kept").await;
    fixture.hash_local().await;
    // Recorded earlier, removed from disk before the run
    fixture
        .hashes
        .record_local("gone.bin", Md5Hash::of(b"gone"), 4);

    let transport = ScriptedTransport::default();
    let report = fixture.run(&transport).await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);
    assert!(transport.calls().is_empty());
    assert_eq!(fixture.hashes.local_hash("gone.bin"), None);
    assert_eq!(fixture.hashes.local_size("gone.bin"), None);
    assert_eq!(fixture.hashes.remote_size("gone.bin"), None);
    assert_eq!(fixture.read_local("kept.bin").await.unwrap(), b"kept");
}

#[tokio::test]
async fn test_truncated_transfer_retried_once() {
    let full = body(1000);
    let mut fixture = Fixture::new();
    fixture.publish("big.bin", &full);
    fixture.hash_local().await;

    let transport = ScriptedTransport::default().serve(
        "big.bin",
        vec![Reply::Body(full[..400].to_vec()), Reply::Body(full.clone())],
    );

    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.bytes_transferred, 1000);
    assert_eq!(report.retried, 1);
    assert_eq!(report.created, 1);
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(fixture.read_local("big.bin").await.unwrap(), full);
    assert_eq!(fixture.hashes.local_hash("big.bin"), Some(&Md5Hash::of(&full)));
    assert_eq!(fixture.hashes.local_size("big.bin"), Some(1000));
}

#[tokio::test]
async fn test_second_truncation_is_final() {
    let full = body(1000);
    let mut fixture = Fixture::new();
    fixture.publish("big.bin", &full);
    fixture.hash_local().await;

    let transport =
        ScriptedTransport::default().serve("big.bin", vec![Reply::Body(full[..400].to_vec())]);

    let report = fixture.run(&transport).await.unwrap();
    assert_eq!(report.bytes_transferred, 400);
    assert_eq!(report.retried, 1);
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(fixture.read_local("big.bin").await.unwrap().len(), 400);
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    let mut fixture = Fixture::new();
    fixture.publish("gone.bin", b"0123456789");
    fixture.hash_local().await;

    let transport = ScriptedTransport::default().serve("gone.bin", vec![Reply::Fail]);
    let report = fixture.run(&transport).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.bytes_transferred, 0);
    assert_eq!(report.retried, 0);
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(fixture.hashes.local_hash("gone.bin"), None);
}

#[tokio::test]
async fn test_unknown_size_never_retries() {
    let mut fixture = Fixture::new();
    fixture.publish_sized("log.txt", b"whatever", None);
    fixture.hash_local().await;

    let transport =
        ScriptedTransport::default().serve("log.txt", vec![Reply::Body(b"short".to_vec())]);
    let report = fixture.run(&transport).await.unwrap();

    assert_eq!(report.retried, 0);
    assert_eq!(report.bytes_transferred, 5);
}

#[tokio::test]
async fn test_size_mismatch_forces_refetch() {
    let mut fixture = Fixture::new();
    // Matching hash, but the published size disagrees with the local copy
    fixture.publish_sized("tile.bin", b"abc", Some(5));
    fixture.write_local("tile.bin", b"abc").await;
    fixture.hash_local().await;

    let transport =
        ScriptedTransport::default().serve("tile.bin", vec![Reply::Body(b"abcde".to_vec())]);
    let report = fixture.run(&transport).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.bytes_transferred, 5);
    assert_eq!(fixture.hashes.local_size("tile.bin"), Some(5));
}

#[tokio::test]
async fn test_interrupt_during_transfer() {
    let mut fixture = Fixture::new();
    fixture.publish("a.bin", b"a").publish("b.bin", b"b");
    fixture.hash_local().await;

    let transport = ScriptedTransport::default().serve("a.bin", vec![Reply::Hang]);
    let (tx, rx) = create_shutdown_channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(());
    });

    let mut engine = SyncEngine::new(&fixture.roots, &transport, EngineConfig::default())
        .with_shutdown(ShutdownListener::new(rx));
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        engine.run(&fixture.manifest, &mut fixture.hashes),
    )
    .await
    .expect("engine should stop on shutdown");

    assert!(matches!(result, Err(SyncError::Interrupted)));
    assert_eq!(transport.calls(), vec!["a.bin"]);
    assert_eq!(fixture.hashes.local_len(), 0);
}

#[tokio::test]
async fn test_interrupt_before_first_file() {
    let mut fixture = Fixture::new();
    fixture.publish("a.bin", b"a");
    fixture.hash_local().await;

    let transport = ScriptedTransport::default().serve("a.bin", vec![Reply::Body(b"a".to_vec())]);
    let (tx, rx) = create_shutdown_channel();
    tx.send(()).unwrap();

    let mut engine = SyncEngine::new(&fixture.roots, &transport, EngineConfig::default())
        .with_shutdown(ShutdownListener::new(rx));
    let result = engine.run(&fixture.manifest, &mut fixture.hashes).await;

    assert!(matches!(result, Err(SyncError::Interrupted)));
    assert!(transport.calls().is_empty());
    assert!(fixture.temp_dir.path().read_dir().unwrap().next().is_none());
}

#[tokio::test]
async fn test_plan_does_not_touch_disk() {
    let mut fixture = Fixture::new();
    fixture
        .publish("a.bin", b"a")
        .publish("-b.bin", b"b")
        .publish("+c.bin", b"c");
    fixture.write_local("b.bin", b"b").await;
    fixture.write_local("c.bin", b"stale").await;
    fixture.hash_local().await;

    let transport = ScriptedTransport::default();
    let engine = SyncEngine::new(&fixture.roots, &transport, EngineConfig::default());
    let planned = engine.plan(&fixture.manifest, &fixture.hashes);

    let actions: Vec<(&str, FileAction)> = planned
        .iter()
        .map(|p| (p.id.as_str(), p.action))
        .collect();
    assert_eq!(
        actions,
        vec![
            ("a.bin", FileAction::Create),
            ("b.bin", FileAction::Delete),
            ("c.bin", FileAction::None),
        ]
    );
    assert!(transport.calls().is_empty());
    assert!(fixture.read_local("b.bin").await.is_some());
}
