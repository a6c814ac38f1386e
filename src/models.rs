use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entry_log::LogEntry;
use crate::stats::DayBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Steps,
    Water,
}

impl Domain {
    pub fn unit(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Water => "ml",
        }
    }
}

/// One recorded walking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSession {
    pub id: String,
    pub steps: u64,
    /// Whole seconds between start and end.
    pub duration: u64,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LogEntry for StepSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn amount(&self) -> u64 {
        self.steps
    }

    fn occurred_at(&self) -> DateTime<Local> {
        self.start_time
    }

    fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_label(&mut self, label: Option<String>) {
        self.name = label;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterIntake {
    pub id: String,
    /// Millilitres.
    pub amount: u64,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LogEntry for WaterIntake {
    fn id(&self) -> &str {
        &self.id
    }

    fn amount(&self) -> u64 {
        self.amount
    }

    fn occurred_at(&self) -> DateTime<Local> {
        self.timestamp
    }

    fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_label(&mut self, label: Option<String>) {
        self.name = label;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    /// Pounds.
    pub weight: f64,
}

/// Emitted once when a daily goal is first reached in a running session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CelebrationEvent {
    pub domain: Domain,
    pub goal: u64,
    pub total: u64,
}

/// Numbers typed by a user may arrive as JSON numbers or as raw text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumericInput {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => Some(*value as i64),
            Self::Float(_) => None,
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub goal: NumericInput,
}

#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IntakeRequest {
    pub amount: NumericInput,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeightRequest {
    pub weight: NumericInput,
}

#[derive(Debug, Deserialize)]
pub struct PedometerRequest {
    pub steps: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_window")]
    pub days: usize,
    #[serde(default)]
    pub suppress_labels: bool,
}

fn default_window() -> usize {
    7
}

#[derive(Debug, Serialize)]
pub struct GoalStatus {
    pub goal: u64,
    pub progress: f64,
    pub achieved: bool,
}

#[derive(Debug, Serialize)]
pub struct LiveSessionStatus {
    pub start_time: DateTime<Local>,
    pub steps: u64,
    pub duration: u64,
    pub elapsed: String,
}

#[derive(Debug, Serialize)]
pub struct StepsSummary {
    pub date: String,
    /// Live counter, absent when the sensor could not be read.
    pub total_steps: Option<u64>,
    pub status: String,
    pub goal: GoalStatus,
    pub session: Option<LiveSessionStatus>,
    pub editing: Option<String>,
    pub sessions: Vec<StepSession>,
    pub celebration: Option<CelebrationEvent>,
}

#[derive(Debug, Serialize)]
pub struct WaterSummary {
    pub date: String,
    pub total_ml: u64,
    pub goal: GoalStatus,
    pub editing: Option<String>,
    pub intakes: Vec<WaterIntake>,
    pub celebration: Option<CelebrationEvent>,
}

#[derive(Debug, Serialize)]
pub struct WeightSummary {
    pub entries: Vec<WeightEntry>,
    pub last_7_days: Vec<WeightEntry>,
    pub weekly_change: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub domain: Domain,
    pub days: usize,
    pub buckets: Vec<DayBucket>,
}

#[derive(Debug, Serialize)]
pub struct HomeSummary {
    pub date: String,
    pub steps_today: Option<u64>,
    pub steps_goal: u64,
    pub water_today_ml: u64,
    pub water_goal_ml: u64,
    pub latest_weight: Option<WeightEntry>,
    pub weekly_weight_change: Option<f64>,
}
