use chrono::NaiveDate;
use tracing::info;

use crate::errors::TrackerError;
use crate::models::{NumericInput, WeightEntry, WeightSummary};
use crate::stats::{last_seven_days, weekly_change};
use crate::store::{KeyValueStore, Persister, WEIGHT_ENTRIES_KEY, load_json};

/// One reading per day, kept in date order.
pub struct WeightLog {
    entries: Vec<WeightEntry>,
    persister: Persister,
}

impl WeightLog {
    pub async fn load(store: &dyn KeyValueStore, persister: Persister) -> Self {
        let mut entries = load_json::<Vec<WeightEntry>>(store, WEIGHT_ENTRIES_KEY)
            .await
            .unwrap_or_default();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Self { entries, persister }
    }

    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&WeightEntry> {
        self.entries.last()
    }

    /// Replaces any reading already taken on `day`.
    pub fn record(&mut self, input: &NumericInput, day: NaiveDate) -> Result<&[WeightEntry], TrackerError> {
        let weight = input
            .as_f64()
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .ok_or_else(|| {
                TrackerError::InvalidAmount("please enter a valid weight in pounds".into())
            })?;

        self.entries.retain(|entry| entry.date != day);
        self.entries.push(WeightEntry { date: day, weight });
        self.entries.sort_by(|a, b| a.date.cmp(&b.date));
        self.persist();
        info!(%day, weight, "weight recorded");
        Ok(&self.entries)
    }

    /// Persists an empty list rather than dropping the key.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn summary(&self, today: NaiveDate) -> WeightSummary {
        WeightSummary {
            entries: self.entries.clone(),
            last_7_days: last_seven_days(&self.entries, today),
            weekly_change: weekly_change(&self.entries, today),
        }
    }

    fn persist(&self) {
        self.persister.set_json(WEIGHT_ENTRIES_KEY, &self.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn same_day_reading_replaces_the_previous_one() {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(store.clone());
        let mut log = WeightLog::load(store.as_ref(), persister.clone()).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        log.record(&NumericInput::Float(165.2), today).unwrap();
        log.record(&NumericInput::Float(166.0), today - Duration::days(3)).unwrap();
        log.record(&NumericInput::Text("164.8".into()), today).unwrap();

        let dates: Vec<NaiveDate> = log.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![today - Duration::days(3), today]);
        assert_eq!(log.latest().map(|e| e.weight), Some(164.8));

        let summary = log.summary(today);
        assert_eq!(summary.last_7_days.len(), 2);
        let change = summary.weekly_change.unwrap();
        assert!((change - (-1.2)).abs() < 1e-9);

        persister.flush().await;
        let reloaded = WeightLog::load(store.as_ref(), persister).await;
        assert_eq!(reloaded.entries(), log.entries());
    }

    #[tokio::test]
    async fn rejects_non_positive_weights() {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(store.clone());
        let mut log = WeightLog::load(store.as_ref(), persister).await;
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        for bad in [
            NumericInput::Integer(0),
            NumericInput::Float(-3.0),
            NumericInput::Text("heavy".into()),
        ] {
            assert!(matches!(log.record(&bad, today), Err(TrackerError::InvalidAmount(_))));
        }
        assert!(log.entries().is_empty());

        log.record(&NumericInput::Integer(170), today).unwrap();
        log.clear();
        assert!(log.summary(today).entries.is_empty());
    }
}
