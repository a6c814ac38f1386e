use crate::errors::TrackerError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs,
    sync::{Mutex, mpsc, oneshot},
};
use tracing::error;

pub const STEPS_SESSIONS_KEY: &str = "steps.sessions";
pub const STEPS_GOAL_KEY: &str = "steps.goal";
pub const WATER_INTAKES_KEY: &str = "water.intakes";
pub const WATER_GOAL_KEY: &str = "water.goal";
pub const WEIGHT_ENTRIES_KEY: &str = "weight.entries";

/// Opaque text store addressed by fixed string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackerError>;
    async fn set(&self, key: &str, value: String) -> Result<(), TrackerError>;
    async fn delete(&self, key: &str) -> Result<(), TrackerError>;
}

/// All keys live in one JSON object on disk, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_document(&path).await;
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    async fn write_document(&self, values: &BTreeMap<String, String>) -> Result<(), TrackerError> {
        let payload = serde_json::to_vec_pretty(values)
            .map_err(|err| TrackerError::StorageWrite(err.to_string()))?;
        fs::write(&self.path, payload)
            .await
            .map_err(|err| TrackerError::StorageWrite(err.to_string()))
    }
}

async fn read_document(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(values) => values,
            Err(err) => {
                error!("failed to parse data file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read data file: {err}");
            BTreeMap::new()
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TrackerError> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.write_document(&values).await
    }

    async fn delete(&self, key: &str) -> Result<(), TrackerError> {
        let mut values = self.values.lock().await;
        if values.remove(key).is_some() {
            self.write_document(&values).await?;
        }
        Ok(())
    }
}

/// In-process store. Writes can be switched to fail.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), TrackerError> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(TrackerError::StorageWrite("store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TrackerError> {
        self.check_writable()?;
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TrackerError> {
        self.check_writable()?;
        self.values.lock().await.remove(key);
        Ok(())
    }
}

/// Reads and decodes a JSON value. Any failure is logged and reads as absent.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let text = match store.get(key).await {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            error!(key = %key, "{err}");
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            error!(key = %key, "{}", TrackerError::from(err));
            None
        }
    }
}

enum StoreOp {
    Set(String, String),
    Delete(String),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer. Operations are applied in the order they were
/// issued by a single background task; failures are logged and dropped.
#[derive(Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<StoreOp>,
}

impl Persister {
    pub fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    StoreOp::Set(key, value) => {
                        if let Err(err) = store.set(&key, value).await {
                            error!(key = %key, "{err}");
                        }
                    }
                    StoreOp::Delete(key) => {
                        if let Err(err) = store.delete(&key).await {
                            error!(key = %key, "{err}");
                        }
                    }
                    StoreOp::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => self.send(StoreOp::Set(key.to_string(), text)),
            Err(err) => error!(key = %key, "{}", TrackerError::StorageWrite(err.to_string())),
        }
    }

    pub fn delete(&self, key: &str) {
        self.send(StoreOp::Delete(key.to_string()));
    }

    /// Resolves once every operation issued before it has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(StoreOp::Flush(done));
        let _ = wait.await;
    }

    fn send(&self, op: StoreOp) {
        if self.tx.send(op).is_err() {
            error!("persistence writer has stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("wellth_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let path = temp_path("reopen");
        let store = FileStore::open(&path).await;
        store.set(STEPS_GOAL_KEY, "12000".into()).await.unwrap();
        store.set(WATER_GOAL_KEY, "2500".into()).await.unwrap();
        store.delete(WATER_GOAL_KEY).await.unwrap();

        let reopened = FileStore::open(&path).await;
        assert_eq!(reopened.get(STEPS_GOAL_KEY).await.unwrap().as_deref(), Some("12000"));
        assert_eq!(reopened.get(WATER_GOAL_KEY).await.unwrap(), None);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileStore::open(&path).await;
        assert_eq!(store.get(STEPS_SESSIONS_KEY).await.unwrap(), None);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn load_json_treats_garbage_as_absent() {
        let store = MemoryStore::new();
        store.set(STEPS_GOAL_KEY, "{oops".into()).await.unwrap();
        let goal: Option<u64> = load_json(&store, STEPS_GOAL_KEY).await;
        assert_eq!(goal, None);
    }

    #[tokio::test]
    async fn persister_applies_operations_in_order() {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(store.clone());
        persister.set_json(STEPS_GOAL_KEY, &5000u64);
        persister.set_json(STEPS_GOAL_KEY, &7000u64);
        persister.delete(WATER_GOAL_KEY);
        persister.flush().await;

        let goal: Option<u64> = load_json(store.as_ref(), STEPS_GOAL_KEY).await;
        assert_eq!(goal, Some(7000));
    }

    #[tokio::test]
    async fn persister_swallows_write_failures() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let persister = Persister::spawn(store.clone());
        persister.set_json(STEPS_GOAL_KEY, &5000u64);
        persister.flush().await;

        store.fail_writes(false);
        persister.set_json(STEPS_GOAL_KEY, &6000u64);
        persister.flush().await;
        let goal: Option<u64> = load_json(store.as_ref(), STEPS_GOAL_KEY).await;
        assert_eq!(goal, Some(6000));
    }
}
