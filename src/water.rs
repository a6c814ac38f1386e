use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::entry_log::{IdGenerator, normalize_label};
use crate::errors::TrackerError;
use crate::models::{Domain, NumericInput, WaterIntake, WaterSummary};
use crate::state::AppState;
use crate::stats::{date_key, today, total_for_today};
use crate::store::{KeyValueStore, Persister, WATER_INTAKES_KEY};
use crate::tracker::{Tracker, TrackerScreen};

pub const MAX_INTAKE_ML: u64 = 10_000;

pub struct WaterState {
    pub tracker: Tracker<WaterIntake>,
}

impl WaterState {
    pub async fn load(store: &dyn KeyValueStore, persister: Persister) -> Self {
        let mut state = Self {
            tracker: Tracker::load(Domain::Water, WATER_INTAKES_KEY, store, persister).await,
        };
        state.recompute();
        state
    }

    pub fn total_today(&self) -> u64 {
        total_for_today(self.tracker.log.entries())
    }

    pub fn add_intake(
        &mut self,
        amount: &NumericInput,
        name: Option<&str>,
        ids: &IdGenerator,
    ) -> Result<WaterSummary, TrackerError> {
        let amount = validate_amount(amount)?;
        let intake = WaterIntake {
            id: ids.next_id(),
            amount,
            timestamp: Local::now(),
            name: name.and_then(normalize_label),
        };
        self.tracker.log.append(intake)?;
        self.recompute();
        Ok(self.summary())
    }
}

fn validate_amount(input: &NumericInput) -> Result<u64, TrackerError> {
    match input.as_i64() {
        Some(amount) if amount > 0 && amount as u64 <= MAX_INTAKE_ML => Ok(amount as u64),
        Some(amount) if amount > 0 => Err(TrackerError::InvalidAmount(format!(
            "a single intake must be at most {MAX_INTAKE_ML} ml"
        ))),
        _ => Err(TrackerError::InvalidAmount(
            "please enter a whole number of millilitres greater than 0".into(),
        )),
    }
}

impl TrackerScreen for WaterState {
    type Entry = WaterIntake;
    type Summary = WaterSummary;

    fn select(state: &AppState) -> &Arc<Mutex<Self>> {
        &state.water
    }

    fn tracker(&mut self) -> &mut Tracker<WaterIntake> {
        &mut self.tracker
    }

    fn goal_total(&self) -> Option<u64> {
        Some(self.total_today())
    }

    fn summary(&mut self) -> WaterSummary {
        let total = self.total_today();
        WaterSummary {
            date: date_key(today()),
            total_ml: total,
            goal: self.tracker.goal.status(total),
            editing: self.tracker.editor.editing_id().map(str::to_string),
            intakes: self.tracker.log.entries().to_vec(),
            celebration: self.tracker.take_celebration(),
        }
    }
}
