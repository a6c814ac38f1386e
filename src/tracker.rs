//! Shared screen logic for the goal-based trackers (steps and water).

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::entry_log::{EntryLog, LabelEditor, LogEntry};
use crate::errors::TrackerError;
use crate::goal::GoalTracker;
use crate::models::{CelebrationEvent, Domain, NumericInput, StatsResponse};
use crate::state::AppState;
use crate::stats::bucket_by_day;
use crate::store::{KeyValueStore, Persister};

/// Entry log, daily goal and label editor of one domain.
pub struct Tracker<T> {
    pub log: EntryLog<T>,
    pub goal: GoalTracker,
    pub editor: LabelEditor,
    domain: Domain,
    celebration: Option<CelebrationEvent>,
}

impl<T: LogEntry> Tracker<T> {
    pub async fn load(
        domain: Domain,
        log_key: &'static str,
        store: &dyn KeyValueStore,
        persister: Persister,
    ) -> Self {
        Self {
            log: EntryLog::load(log_key, store, persister.clone()).await,
            goal: GoalTracker::load(domain, store, persister).await,
            editor: LabelEditor::default(),
            domain,
            celebration: None,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Runs the edge detector; a celebration is held until the next summary.
    pub fn evaluate(&mut self, total: u64) {
        if let Some(event) = self.goal.on_update(total) {
            self.celebration = Some(event);
        }
    }

    pub fn take_celebration(&mut self) -> Option<CelebrationEvent> {
        self.celebration.take()
    }

    /// Returns false when the id is not in the log.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(entry) = self.log.get(id) else {
            return false;
        };
        let current = entry.label().map(str::to_string);
        self.editor.begin(id, current.as_deref());
        true
    }

    pub fn save_edit(&mut self, draft: &str) -> Option<String> {
        self.editor.set_draft(draft);
        self.editor.save(&mut self.log)
    }
}

/// A screen built around a [`Tracker`]. The provided methods are the
/// operations both screens share; each mutation re-runs the goal check.
pub trait TrackerScreen: Send + Sized + 'static {
    type Entry: LogEntry;
    type Summary: Serialize + Send + 'static;

    fn select(state: &AppState) -> &Arc<Mutex<Self>>;
    fn tracker(&mut self) -> &mut Tracker<Self::Entry>;
    /// The total the daily goal is measured against, when known.
    fn goal_total(&self) -> Option<u64>;
    fn summary(&mut self) -> Self::Summary;

    fn recompute(&mut self) {
        if let Some(total) = self.goal_total() {
            self.tracker().evaluate(total);
        }
    }

    fn rename(&mut self, id: &str, label: &str) -> Self::Summary {
        self.tracker().log.rename(id, label);
        self.recompute();
        self.summary()
    }

    fn remove(&mut self, id: &str) -> Self::Summary {
        self.tracker().log.remove(id);
        if self.tracker().editor.editing_id() == Some(id) {
            self.tracker().editor.cancel();
        }
        self.recompute();
        self.summary()
    }

    fn clear(&mut self) -> Self::Summary {
        self.tracker().log.clear();
        self.tracker().editor.cancel();
        self.recompute();
        self.summary()
    }

    fn set_goal(&mut self, input: &NumericInput) -> Result<Self::Summary, TrackerError> {
        self.tracker().goal.set_goal(input)?;
        self.recompute();
        Ok(self.summary())
    }

    fn stats(&mut self, days: usize, suppress_labels: bool) -> Result<StatsResponse, TrackerError> {
        let tracker = self.tracker();
        let buckets = bucket_by_day(tracker.log.entries(), days, suppress_labels)?;
        Ok(StatsResponse {
            domain: tracker.domain(),
            days,
            buckets,
        })
    }
}
