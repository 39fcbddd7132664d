//! Player record persistence.
//!
//! Records are loaded on the caller's thread before a session reaches the
//! game loop, and saved by a background [`SaveWorker`] so the tick never
//! waits on disk. A record handed to the worker stays visible through
//! [`SaveWorker::pending`] until the store holds it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use arena_core::records::PlayerRecord;

use crate::error::{ServerError, StoreError};

/// Key-value storage for player records.
pub trait PlayerStore: Send + Sync {
    /// `Ok(None)` when the player has never been saved.
    fn load(&self, username: &str) -> Result<Option<PlayerRecord>, StoreError>;
    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError>;
}

/// One pretty-printed JSON file per player.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(username)))
    }
}

/// Filesystem-safe stem: ASCII alphanumerics, `-` and `_` pass through,
/// every other byte is percent-encoded.
fn file_stem(username: &str) -> String {
    let mut stem = String::with_capacity(username.len());
    for byte in username.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

impl PlayerStore for JsonFileStore {
    fn load(&self, username: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let path = self.record_path(username);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        // Write then rename so a crash never leaves a truncated record.
        let path = self.record_path(&record.username);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, PlayerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self, username: &str) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .ok()
            .and_then(|records| records.get(username).cloned()))
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        if let Ok(mut records) = self.records.lock() {
            records.insert(record.username.clone(), record.clone());
        }
        Ok(())
    }
}

/// Requests handled by the save worker thread.
#[derive(Debug)]
enum SaveRequest {
    Save(PlayerRecord),
    RetryFailed,
    Shutdown,
}

/// Records handed to the worker and not yet written, keyed by username.
type Pending = Arc<Mutex<BTreeMap<String, PlayerRecord>>>;

/// Background thread that writes records to a [`PlayerStore`].
///
/// Saves are fire-and-forget. A failed save is kept and written again on
/// the next [`SaveWorker::retry_failed`] unless a newer record for the same
/// player supersedes it.
pub struct SaveWorker {
    tx: mpsc::Sender<SaveRequest>,
    pending: Pending,
    handle: Option<JoinHandle<()>>,
}

impl SaveWorker {
    pub fn spawn(store: Arc<dyn PlayerStore>) -> Result<Self, ServerError> {
        let (tx, rx) = mpsc::channel::<SaveRequest>();
        let pending = Pending::default();
        let worker_pending = pending.clone();
        let handle = std::thread::Builder::new()
            .name("arena-save-worker".into())
            .spawn(move || run_save_worker(store.as_ref(), rx, &worker_pending))
            .map_err(ServerError::Spawn)?;
        Ok(Self {
            tx,
            pending,
            handle: Some(handle),
        })
    }

    pub fn save(&self, record: PlayerRecord) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(record.username.clone(), record.clone());
        }
        if self.tx.send(SaveRequest::Save(record)).is_err() {
            warn!("save worker stopped, record dropped");
        }
    }

    /// The newest record for `username` that the store does not hold yet.
    ///
    /// Takes precedence over a load from the store, which may predate it.
    pub fn pending(&self, username: &str) -> Option<PlayerRecord> {
        self.pending
            .lock()
            .ok()
            .and_then(|pending| pending.get(username).cloned())
    }

    pub fn retry_failed(&self) {
        let _ = self.tx.send(SaveRequest::RetryFailed);
    }

    /// Finish every queued save, then stop the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(SaveRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("save worker panicked");
            }
        }
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_save_worker(store: &dyn PlayerStore, rx: mpsc::Receiver<SaveRequest>, pending: &Pending) {
    let mut failed: BTreeMap<String, PlayerRecord> = BTreeMap::new();

    let write = |record: PlayerRecord, failed: &mut BTreeMap<String, PlayerRecord>| {
        match store.save(&record) {
            Ok(()) => {
                debug!(player = %record.username, "record saved");
                failed.remove(&record.username);
                // A newer record queued meanwhile stays pending.
                if let Ok(mut pending) = pending.lock() {
                    if pending.get(&record.username) == Some(&record) {
                        pending.remove(&record.username);
                    }
                }
            }
            Err(e) => {
                warn!(player = %record.username, error = %e, "save failed, will retry");
                failed.insert(record.username.clone(), record);
            }
        }
    };

    // A closed channel ends the worker like an explicit shutdown.
    while let Ok(request) = rx.recv() {
        match request {
            SaveRequest::Save(record) => write(record, &mut failed),
            SaveRequest::RetryFailed => {
                let retry = std::mem::take(&mut failed);
                for record in retry.into_values() {
                    write(record, &mut failed);
                }
            }
            SaveRequest::Shutdown => break,
        }
    }

    if !failed.is_empty() {
        warn!(count = failed.len(), "records left unsaved at shutdown");
    }
}
