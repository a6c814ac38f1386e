//! In-memory entry logs mirrored to the key-value store.
//!
//! The log owns its entries. Every mutation is applied in memory first and
//! then handed to the [`Persister`] without waiting for the write; a failed
//! write is logged and the in-memory list stays authoritative.

use chrono::{DateTime, Local};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::error;

use crate::errors::TrackerError;
use crate::store::{KeyValueStore, Persister, load_json};

/// A timestamped record that can be summed per day.
pub trait LogEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn amount(&self) -> u64;
    fn occurred_at(&self) -> DateTime<Local>;
    fn label(&self) -> Option<&str>;
    fn set_label(&mut self, label: Option<String>);
}

/// Issues entry ids from the wall clock in milliseconds, bumped past the last
/// issued or observed value when the clock has not moved or runs behind.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the floor to an id already persisted, so later ids sort after it.
    /// Non-numeric ids are ignored.
    pub fn observe(&self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last.fetch_max(value, Ordering::SeqCst);
        }
    }

    pub fn next_id(&self) -> String {
        self.next_at(Local::now().timestamp_millis())
    }

    fn next_at(&self, millis: i64) -> String {
        let mut previous = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = if millis > previous { millis } else { previous + 1 };
            match self.last.compare_exchange(previous, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => previous = actual,
            }
        }
    }
}

pub struct EntryLog<T> {
    key: &'static str,
    entries: Vec<T>,
    persister: Persister,
}

impl<T: LogEntry> EntryLog<T> {
    /// Reads the persisted copy once. A missing or unreadable value starts an
    /// empty log.
    pub async fn load(key: &'static str, store: &dyn KeyValueStore, persister: Persister) -> Self {
        let entries = load_json::<Vec<T>>(store, key).await.unwrap_or_default();
        Self {
            key,
            entries,
            persister,
        }
    }

    /// Newest first by insertion.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Puts the entry at the front regardless of its timestamp. An id that is
    /// already in the log is rejected and the log is left unchanged.
    pub fn append(&mut self, entry: T) -> Result<&[T], TrackerError> {
        if self.get(entry.id()).is_some() {
            error!(key = %self.key, id = %entry.id(), "refusing to append duplicate entry id");
            return Err(TrackerError::DuplicateId(entry.id().to_string()));
        }
        self.entries.insert(0, entry);
        self.persist();
        Ok(&self.entries)
    }

    /// A label that is blank after trimming clears the name.
    pub fn rename(&mut self, id: &str, label: &str) -> &[T] {
        let label = normalize_label(label);
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id() == id) {
            entry.set_label(label);
        }
        self.persist();
        &self.entries
    }

    /// Unknown ids leave the log unchanged.
    pub fn remove(&mut self, id: &str) -> &[T] {
        self.entries.retain(|entry| entry.id() != id);
        self.persist();
        &self.entries
    }

    /// Drops the persisted key instead of writing an empty list.
    pub fn clear(&mut self) -> &[T] {
        self.entries.clear();
        self.persister.delete(self.key);
        &self.entries
    }

    fn persist(&self) {
        self.persister.set_json(self.key, &self.entries);
    }
}

/// Trims a user-supplied label; blank means no label.
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// At most one entry is edited at a time. Starting a new edit silently
/// discards the previous draft.
#[derive(Debug, Default)]
pub struct LabelEditor {
    editing: Option<(String, String)>,
}

impl LabelEditor {
    pub fn begin(&mut self, id: &str, current: Option<&str>) {
        self.editing = Some((id.to_string(), current.unwrap_or_default().to_string()));
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|(id, _)| id.as_str())
    }

    #[cfg(test)]
    pub fn draft(&self) -> Option<&str> {
        self.editing.as_ref().map(|(_, draft)| draft.as_str())
    }

    pub fn set_draft(&mut self, draft: &str) {
        if let Some((_, current)) = self.editing.as_mut() {
            *current = draft.to_string();
        }
    }

    /// Commits the draft and returns to viewing. Returns the id that was saved.
    pub fn save<T: LogEntry>(&mut self, log: &mut EntryLog<T>) -> Option<String> {
        let (id, draft) = self.editing.take()?;
        log.rename(&id, &draft);
        Some(id)
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepSession;
    use crate::store::{MemoryStore, STEPS_SESSIONS_KEY};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn session(id: &str, steps: u64) -> StepSession {
        let start = Local.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap();
        StepSession {
            id: id.into(),
            steps,
            duration: 900,
            start_time: start,
            end_time: start + chrono::Duration::seconds(900),
            name: None,
        }
    }

    async fn empty_log() -> (Arc<MemoryStore>, Persister, EntryLog<StepSession>) {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(store.clone());
        let log = EntryLog::load(STEPS_SESSIONS_KEY, store.as_ref(), persister.clone()).await;
        (store, persister, log)
    }

    #[test]
    fn ids_are_unique_when_clock_stalls() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_at(1_000), "1000");
        assert_eq!(ids.next_at(1_000), "1001");
        assert_eq!(ids.next_at(900), "1002");
        assert_eq!(ids.next_at(5_000), "5000");
    }

    #[test]
    fn observed_ids_raise_the_floor() {
        let ids = IdGenerator::new();
        ids.observe("60000");
        ids.observe("1000");
        ids.observe("walk");
        assert_eq!(ids.next_at(1_000), "60001");
        assert_eq!(ids.next_at(70_000), "70000");
    }

    #[tokio::test]
    async fn append_rejects_an_id_already_in_the_log() {
        let (store, persister, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();
        persister.flush().await;

        let err = log.append(session("1", 999)).unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateId(ref id) if id == "1"));
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.get("1").unwrap().steps, 100);

        persister.flush().await;
        let reloaded: EntryLog<StepSession> =
            EntryLog::load(STEPS_SESSIONS_KEY, store.as_ref(), persister).await;
        assert_eq!(reloaded.entries().len(), 1);
    }

    #[tokio::test]
    async fn append_prepends_regardless_of_time() {
        let (_, _, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();
        let mut older = session("2", 50);
        older.start_time = older.start_time - chrono::Duration::days(3);
        log.append(older).unwrap();

        let ids: Vec<&str> = log.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn rename_trims_and_clears() {
        let (_, _, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();

        log.rename("1", "  Morning Walk  ");
        assert_eq!(log.get("1").unwrap().name.as_deref(), Some("Morning Walk"));

        log.rename("1", "");
        assert_eq!(log.get("1").unwrap().name, None);

        log.rename("1", "   ");
        assert_eq!(log.get("1").unwrap().name, None);
    }

    #[tokio::test]
    async fn remove_unknown_id_is_a_no_op() {
        let (_, _, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();
        assert_eq!(log.remove("missing").len(), 1);
        assert!(log.remove("1").is_empty());
    }

    #[tokio::test]
    async fn clear_then_reload_matches_fresh_store() {
        let (store, persister, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();
        log.append(session("2", 200)).unwrap();
        persister.flush().await;
        assert!(store.get(STEPS_SESSIONS_KEY).await.unwrap().is_some());

        log.clear();
        persister.flush().await;
        assert_eq!(store.get(STEPS_SESSIONS_KEY).await.unwrap(), None);

        let reloaded: EntryLog<StepSession> =
            EntryLog::load(STEPS_SESSIONS_KEY, store.as_ref(), persister).await;
        assert!(reloaded.entries().is_empty());
    }

    #[tokio::test]
    async fn appended_entry_round_trips_through_store() {
        let (store, persister, mut log) = empty_log().await;
        let entry = session("1700000000000", 4321);
        log.append(entry.clone()).unwrap();
        persister.flush().await;

        let reloaded: EntryLog<StepSession> =
            EntryLog::load(STEPS_SESSIONS_KEY, store.as_ref(), persister).await;
        let restored = reloaded.get("1700000000000").unwrap();
        assert_eq!(restored.steps, 4321);
        assert_eq!(restored.start_time.timestamp(), entry.start_time.timestamp());
        assert_eq!(restored.end_time.timestamp(), entry.end_time.timestamp());
    }

    #[tokio::test]
    async fn memory_stays_authoritative_when_writes_fail() {
        let (store, persister, mut log) = empty_log().await;
        store.fail_writes(true);
        log.append(session("1", 100)).unwrap();
        persister.flush().await;
        assert_eq!(log.entries().len(), 1);
        assert_eq!(store.get(STEPS_SESSIONS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn editor_keeps_a_single_draft() {
        let (_, _, mut log) = empty_log().await;
        log.append(session("1", 100)).unwrap();
        log.append(session("2", 200)).unwrap();

        let mut editor = LabelEditor::default();
        editor.begin("1", None);
        editor.set_draft("abandoned");
        editor.begin("2", Some("old"));
        assert_eq!(editor.draft(), Some("old"));
        editor.set_draft("  Evening  ");

        assert_eq!(editor.save(&mut log), Some("2".to_string()));
        assert_eq!(editor.editing_id(), None);
        assert_eq!(log.get("1").unwrap().name, None);
        assert_eq!(log.get("2").unwrap().name.as_deref(), Some("Evening"));

        assert_eq!(editor.save(&mut log), None);
        editor.begin("1", None);
        editor.cancel();
        assert_eq!(editor.editing_id(), None);
    }
}
