use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::entry_log::IdGenerator;
use crate::pedometer::{ManualPedometer, StepSensor};
use crate::session::Poller;
use crate::steps::{StepsState, spawn_total_poller};
use crate::store::{KeyValueStore, Persister};
use crate::water::WaterState;
use crate::weight::WeightLog;

/// Long-lived context of one running service.
///
/// Everything here is rebuilt from the store on start. Goal achievement flags
/// live inside the screens and are therefore reset on every restart.
#[derive(Clone)]
pub struct AppState {
    pub steps: Arc<Mutex<StepsState>>,
    pub water: Arc<Mutex<WaterState>>,
    pub weight: Arc<Mutex<WeightLog>>,
    pub sensor: Arc<dyn StepSensor>,
    pub pedometer: Arc<ManualPedometer>,
    pub ids: Arc<IdGenerator>,
    pub persister: Persister,
    _poller: Arc<Poller>,
}

impl AppState {
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        pedometer: Arc<ManualPedometer>,
        poll_interval: Duration,
    ) -> Self {
        let persister = Persister::spawn(Arc::clone(&store));
        let sensor: Arc<dyn StepSensor> = pedometer.clone();

        let steps = StepsState::load(store.as_ref(), persister.clone(), sensor.as_ref()).await;
        let water = WaterState::load(store.as_ref(), persister.clone()).await;
        let weight = WeightLog::load(store.as_ref(), persister.clone()).await;

        let ids = IdGenerator::new();
        for entry in steps.tracker.log.entries() {
            ids.observe(&entry.id);
        }
        for entry in water.tracker.log.entries() {
            ids.observe(&entry.id);
        }

        let steps = Arc::new(Mutex::new(steps));
        let poller = spawn_total_poller(&steps, &sensor, poll_interval);

        Self {
            steps,
            water: Arc::new(Mutex::new(water)),
            weight: Arc::new(Mutex::new(weight)),
            sensor,
            pedometer,
            ids: Arc::new(ids),
            persister,
            _poller: Arc::new(poller),
        }
    }
}
