use chrono::{DateTime, Local, TimeZone};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::entry_log::IdGenerator;
use crate::errors::TrackerError;
use crate::models::{Domain, LiveSessionStatus, StepSession, StepsSummary};
use crate::pedometer::StepSensor;
use crate::session::{LiveSession, Poller};
use crate::state::AppState;
use crate::stats::{date_key, format_duration, today};
use crate::store::{KeyValueStore, Persister, STEPS_SESSIONS_KEY};
use crate::tracker::{Tracker, TrackerScreen};

pub const UNAVAILABLE_STATUS: &str = "Pedometer unavailable";

pub struct StepsState {
    pub tracker: Tracker<StepSession>,
    /// Steps counted by the sensor today; absent when it could not be read.
    pub total_today: Option<u64>,
    pub sensor_available: bool,
    live: Option<LiveSession>,
}

impl StepsState {
    pub async fn load(
        store: &dyn KeyValueStore,
        persister: Persister,
        sensor: &dyn StepSensor,
    ) -> Self {
        let tracker = Tracker::load(Domain::Steps, STEPS_SESSIONS_KEY, store, persister).await;
        let sensor_available = sensor.is_available().await;
        let mut state = Self {
            tracker,
            total_today: None,
            sensor_available,
            live: None,
        };
        if sensor_available {
            state.set_total(read_total_today(sensor).await);
        } else {
            info!("{UNAVAILABLE_STATUS}");
        }
        state
    }

    pub fn is_recording(&self) -> bool {
        self.live.is_some()
    }

    pub fn set_total(&mut self, total: Option<u64>) {
        self.total_today = total;
        self.recompute();
    }

    pub fn add_steps(&mut self, delta: u64) {
        let total = self.total_today.unwrap_or(0).saturating_add(delta);
        self.set_total(Some(total));
    }

    pub fn status_text(&self) -> String {
        if !self.sensor_available {
            return UNAVAILABLE_STATUS.to_string();
        }
        match (&self.live, self.total_today) {
            (Some(live), _) => format!("{} steps this session", live.steps()),
            (None, Some(total)) => format!("{total} steps today"),
            (None, None) => "Step count unavailable".to_string(),
        }
    }
}

impl TrackerScreen for StepsState {
    type Entry = StepSession;
    type Summary = StepsSummary;

    fn select(state: &AppState) -> &Arc<Mutex<Self>> {
        &state.steps
    }

    fn tracker(&mut self) -> &mut Tracker<StepSession> {
        &mut self.tracker
    }

    fn goal_total(&self) -> Option<u64> {
        self.total_today
    }

    fn summary(&mut self) -> StepsSummary {
        let total = self.total_today.unwrap_or(0);
        StepsSummary {
            date: date_key(today()),
            total_steps: self.total_today,
            status: self.status_text(),
            goal: self.tracker.goal.status(total),
            session: self.live.as_ref().map(|live| LiveSessionStatus {
                start_time: live.start_time(),
                steps: live.steps(),
                duration: live.duration(),
                elapsed: format_duration(live.duration()),
            }),
            editing: self.tracker.editor.editing_id().map(str::to_string),
            sessions: self.tracker.log.entries().to_vec(),
            celebration: self.tracker.take_celebration(),
        }
    }
}

/// Begins recording. Already recording is a no-op.
pub async fn start_session(
    steps: &Arc<Mutex<StepsState>>,
    sensor: &Arc<dyn StepSensor>,
) -> Result<StepsSummary, TrackerError> {
    let mut state = steps.lock().await;
    if !state.sensor_available {
        return Err(TrackerError::SensorUnavailable);
    }
    if state.is_recording() {
        return Ok(state.summary());
    }

    let start_time = Local::now();
    let increments = sensor.watch();
    let baseline = read_total_today(sensor.as_ref())
        .await
        .ok_or(TrackerError::SensorUnavailable)?;
    state.set_total(Some(baseline));

    let weak: Weak<Mutex<StepsState>> = Arc::downgrade(steps);
    state.live = Some(LiveSession::start(start_time, increments, move |delta| {
        let weak = weak.clone();
        async move {
            if let Some(steps) = weak.upgrade() {
                steps.lock().await.add_steps(delta);
            }
        }
    }));
    info!(baseline, "step session started");

    Ok(state.summary())
}

/// Ends recording and logs the session. Returns `None` when nothing was
/// being recorded.
pub async fn stop_session(
    steps: &Mutex<StepsState>,
    sensor: &dyn StepSensor,
    ids: &IdGenerator,
) -> Result<Option<StepSession>, TrackerError> {
    let mut state = steps.lock().await;
    let Some(live) = state.live.take() else {
        return Ok(None);
    };
    let done = live.stop(Local::now());

    let session = StepSession {
        id: ids.next_id(),
        steps: done.steps,
        duration: done.duration,
        start_time: done.start_time,
        end_time: done.end_time,
        name: None,
    };
    let total = read_total_today(sensor).await;
    state.set_total(total);

    state.tracker.log.append(session.clone())?;
    info!(steps = session.steps, duration = session.duration, "step session logged");
    Ok(Some(session))
}

/// Refreshes the live counter on a fixed period while nothing is recording.
pub fn spawn_total_poller(
    steps: &Arc<Mutex<StepsState>>,
    sensor: &Arc<dyn StepSensor>,
    period: std::time::Duration,
) -> Poller {
    let weak = Arc::downgrade(steps);
    let sensor = Arc::clone(sensor);
    Poller::spawn(period, move || {
        let weak = weak.clone();
        let sensor = Arc::clone(&sensor);
        async move {
            let Some(steps) = weak.upgrade() else {
                return;
            };
            let mut state = steps.lock().await;
            if state.is_recording() || !state.sensor_available {
                return;
            }
            let total = read_total_today(sensor.as_ref()).await;
            state.set_total(total);
        }
    })
}

pub async fn read_total_today(sensor: &dyn StepSensor) -> Option<u64> {
    let end = Local::now();
    match sensor.count_since(start_of_day(end), end).await {
        Ok(total) => Some(total),
        Err(err) => {
            error!("failed to read steps today: {err}");
            None
        }
    }
}

fn start_of_day(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .unwrap_or(now)
}
