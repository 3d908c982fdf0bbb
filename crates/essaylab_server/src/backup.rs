//! Background delivery of essay backups.
//!
//! The submission pipeline calls [`EssayBackupSink::put_text`] synchronously
//! right after its commit. [`QueuedBackupSink`] only enqueues the copy; a
//! tokio task drains the queue into an [`ObjectStore`], so the HTTP response
//! never waits on remote storage. Failed uploads are logged and dropped.

use essaylab_core::backup::BackupResult;
use essaylab_core::{BackupError, DirectoryBackupSink, EssayBackupSink};
use log::{info, warn};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Asynchronous destination for queued essay copies.
pub trait ObjectStore: Send + Sync + 'static {
    /// Writes `body` under `key`; returns the key actually stored.
    fn put_object(
        &self,
        key: &str,
        body: String,
    ) -> impl Future<Output = BackupResult<String>> + Send;
}

impl ObjectStore for DirectoryBackupSink {
    async fn put_object(&self, key: &str, body: String) -> BackupResult<String> {
        let sink = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || sink.put_text(&key, &body))
            .await
            .map_err(|err| BackupError::Unavailable(format!("directory writer failed: {err}")))?
    }
}

#[derive(Debug)]
struct BackupJob {
    key: String,
    text: String,
}

/// Sink that hands essay copies to a background worker.
#[derive(Debug, Clone)]
pub struct QueuedBackupSink {
    jobs: mpsc::Sender<BackupJob>,
}

impl QueuedBackupSink {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// The worker exits once every sink clone is dropped and the queue is
    /// drained; await the handle to flush pending copies on shutdown.
    pub fn spawn<S: ObjectStore>(store: S, capacity: usize) -> (Self, JoinHandle<()>) {
        let (jobs, queue) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(drain_queue(store, queue));
        (Self { jobs }, worker)
    }
}

impl EssayBackupSink for QueuedBackupSink {
    fn put_text(&self, key: &str, text: &str) -> BackupResult<String> {
        let job = BackupJob {
            key: key.to_string(),
            text: text.to_string(),
        };
        match self.jobs.try_send(job) {
            Ok(()) => Ok(key.to_string()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(BackupError::Unavailable("backup queue is full".to_string()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(BackupError::Unavailable("backup worker stopped".to_string()))
            }
        }
    }
}

async fn drain_queue<S: ObjectStore>(store: S, mut queue: mpsc::Receiver<BackupJob>) {
    info!("event=backup_worker module=backup status=start");
    while let Some(job) = queue.recv().await {
        match store.put_object(&job.key, job.text).await {
            Ok(stored_key) => info!(
                "event=essay_backup_upload module=backup status=ok key={}",
                stored_key
            ),
            Err(err) => warn!(
                "event=essay_backup_upload module=backup status=error key={} error={}",
                job.key, err
            ),
        }
    }
    info!("event=backup_worker module=backup status=stopped");
}

#[cfg(test)]
mod tests {
    use super::{ObjectStore, QueuedBackupSink};
    use essaylab_core::backup::BackupResult;
    use essaylab_core::{BackupError, DirectoryBackupSink, EssayBackupSink};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingStore {
        writes: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ObjectStore for RecordingStore {
        async fn put_object(&self, key: &str, body: String) -> BackupResult<String> {
            if body == "reject me" {
                return Err(BackupError::Remote("access denied".to_string()));
            }
            self.writes.lock().unwrap().push((key.to_string(), body));
            Ok(key.to_string())
        }
    }

    #[tokio::test]
    async fn queued_copies_reach_the_store_in_order() {
        let store = RecordingStore::default();
        let (sink, worker) = QueuedBackupSink::spawn(store.clone(), 8);

        sink.put_text("essays/a.txt", "first").unwrap();
        sink.put_text("essays/b.txt", "reject me").unwrap();
        sink.put_text("essays/c.txt", "third").unwrap();
        drop(sink);
        worker.await.unwrap();

        let writes = store.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![
                ("essays/a.txt".to_string(), "first".to_string()),
                ("essays/c.txt".to_string(), "third".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn full_queue_is_reported_as_unavailable() {
        let (sink, _worker) = QueuedBackupSink::spawn(RecordingStore::default(), 1);

        // The worker cannot run before this task yields.
        sink.put_text("essays/a.txt", "first").unwrap();
        let err = sink.put_text("essays/b.txt", "second").unwrap_err();
        assert!(matches!(err, BackupError::Unavailable(_)));
    }

    #[tokio::test]
    async fn directory_store_writes_through_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryBackupSink::new(dir.path(), "copies");
        let stored = store
            .put_object("essays/2025/09/11/jdoe/s1.txt", "hello".to_string())
            .await
            .unwrap();
        assert_eq!(stored, "copies/essays/2025/09/11/jdoe/s1.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join(stored)).unwrap(),
            "hello"
        );
    }
}
