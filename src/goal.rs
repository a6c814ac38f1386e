use crate::errors::TrackerError;
use crate::models::{CelebrationEvent, Domain, GoalStatus, NumericInput};
use crate::store::{KeyValueStore, Persister, STEPS_GOAL_KEY, WATER_GOAL_KEY, load_json};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalBounds {
    pub default: u64,
    pub max: u64,
}

impl Domain {
    pub fn goal_bounds(self) -> GoalBounds {
        match self {
            Self::Steps => GoalBounds {
                default: 10_000,
                max: 100_000,
            },
            Self::Water => GoalBounds {
                default: 2_000,
                max: 10_000,
            },
        }
    }

    fn goal_key(self) -> &'static str {
        match self {
            Self::Steps => STEPS_GOAL_KEY,
            Self::Water => WATER_GOAL_KEY,
        }
    }
}

/// Percentage of `goal` reached, clamped to `[0, 100]`.
pub fn progress_percent(total: u64, goal: u64) -> f64 {
    if total == 0 || goal == 0 {
        return 0.0;
    }
    (total as f64 / goal as f64 * 100.0).min(100.0)
}

pub fn is_achieved(total: u64, goal: u64) -> bool {
    total >= goal
}

/// Daily goal plus the achievement state of the running session.
///
/// The achieved flag is never persisted. The first evaluation after start
/// only records a baseline, so a goal that is already met is not celebrated.
/// After that, the first observed not-achieved to achieved transition fires
/// one [`CelebrationEvent`] and nothing fires again until restart, even if
/// the total dips and crosses the goal a second time.
pub struct GoalTracker {
    domain: Domain,
    goal: u64,
    last_achieved: Option<bool>,
    celebrated: bool,
    persister: Persister,
}

impl GoalTracker {
    pub async fn load(domain: Domain, store: &dyn KeyValueStore, persister: Persister) -> Self {
        let bounds = domain.goal_bounds();
        let goal = match load_json::<u64>(store, domain.goal_key()).await {
            Some(goal) if goal > 0 && goal <= bounds.max => goal,
            Some(goal) => {
                warn!(?domain, goal, "ignoring stored goal outside bounds");
                bounds.default
            }
            None => bounds.default,
        };

        Self {
            domain,
            goal,
            last_achieved: None,
            celebrated: false,
            persister,
        }
    }

    pub fn goal(&self) -> u64 {
        self.goal
    }

    /// Validates, stores and persists a new goal. Invalid input leaves the
    /// current goal untouched.
    pub fn set_goal(&mut self, input: &NumericInput) -> Result<u64, TrackerError> {
        let goal = validate_goal(self.domain, input)?;
        self.goal = goal;
        self.persister.set_json(self.domain.goal_key(), &goal);
        info!(domain = ?self.domain, goal, "daily goal updated");
        Ok(goal)
    }

    pub fn progress(&self, total: u64) -> f64 {
        progress_percent(total, self.goal)
    }

    pub fn status(&self, total: u64) -> GoalStatus {
        GoalStatus {
            goal: self.goal,
            progress: self.progress(total),
            achieved: is_achieved(total, self.goal),
        }
    }

    pub fn on_update(&mut self, total: u64) -> Option<CelebrationEvent> {
        let achieved = is_achieved(total, self.goal);
        let rising = self.last_achieved == Some(false) && achieved;
        self.last_achieved = Some(achieved);

        if !rising || self.celebrated {
            return None;
        }
        self.celebrated = true;
        info!(
            domain = ?self.domain,
            goal = self.goal,
            total,
            "daily goal of {} {} reached",
            self.goal,
            self.domain.unit()
        );
        Some(CelebrationEvent {
            domain: self.domain,
            goal: self.goal,
            total,
        })
    }
}

fn validate_goal(domain: Domain, input: &NumericInput) -> Result<u64, TrackerError> {
    let bounds = domain.goal_bounds();
    let value = input.as_i64().ok_or_else(|| {
        TrackerError::InvalidGoal("please enter a valid number greater than 0".into())
    })?;
    if value <= 0 {
        return Err(TrackerError::InvalidGoal(
            "please enter a valid number greater than 0".into(),
        ));
    }
    if value as u64 > bounds.max {
        return Err(TrackerError::InvalidGoal(format!(
            "please enter a goal no higher than {} {}",
            bounds.max,
            domain.unit()
        )));
    }
    Ok(value as u64)
}
