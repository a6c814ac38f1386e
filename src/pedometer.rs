use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::errors::TrackerError;

/// Step-counting sensor. Increments pushed through [`StepSensor::watch`] are
/// deltas, not running totals.
#[async_trait]
pub trait StepSensor: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn count_since(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<u64, TrackerError>;
    fn watch(&self) -> broadcast::Receiver<u64>;
}

/// A pedometer fed by hand over the API.
pub struct ManualPedometer {
    available: bool,
    readings: Mutex<Vec<(DateTime<Local>, u64)>>,
    tx: broadcast::Sender<u64>,
}

impl ManualPedometer {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            available: true,
            readings: Mutex::new(Vec::new()),
            tx,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub async fn record(&self, steps: u64) -> Result<(), TrackerError> {
        self.record_at(Local::now(), steps).await
    }

    pub async fn record_at(&self, at: DateTime<Local>, steps: u64) -> Result<(), TrackerError> {
        if !self.available {
            return Err(TrackerError::SensorUnavailable);
        }
        self.readings.lock().await.push((at, steps));
        if self.tx.send(steps).is_err() {
            debug!(steps, "no active watcher for pedometer reading");
        }
        Ok(())
    }
}

impl Default for ManualPedometer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepSensor for ManualPedometer {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn count_since(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<u64, TrackerError> {
        if !self.available {
            return Err(TrackerError::SensorUnavailable);
        }
        let readings = self.readings.lock().await;
        Ok(readings
            .iter()
            .filter(|(at, _)| *at >= start && *at <= end)
            .fold(0u64, |sum, (_, steps)| sum.saturating_add(*steps)))
    }

    fn watch(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }
}
