use crate::errors::AppError;
use crate::models::{
    GoalRequest, HomeSummary, IntakeRequest, LabelRequest, PedometerRequest, StatsQuery,
    StatsResponse, StepSession, StepsSummary, WaterSummary, WeightRequest, WeightSummary,
};
use crate::state::AppState;
use crate::stats::{date_key, today, weekly_change};
use crate::steps;
use crate::tracker::TrackerScreen;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&home_summary(&state).await))
}

pub async fn get_home(State(state): State<AppState>) -> Json<HomeSummary> {
    Json(home_summary(&state).await)
}

async fn home_summary(state: &AppState) -> HomeSummary {
    let date = today();
    let (steps_today, steps_goal) = {
        let steps = state.steps.lock().await;
        (steps.total_today, steps.tracker.goal.goal())
    };
    let (water_today_ml, water_goal_ml) = {
        let water = state.water.lock().await;
        (water.total_today(), water.tracker.goal.goal())
    };
    let weight = state.weight.lock().await;

    HomeSummary {
        date: date_key(date),
        steps_today,
        steps_goal,
        water_today_ml,
        water_goal_ml,
        latest_weight: weight.latest().cloned(),
        weekly_weight_change: weekly_change(weight.entries(), date),
    }
}

pub async fn get_steps(State(state): State<AppState>) -> Json<StepsSummary> {
    Json(state.steps.lock().await.summary())
}

pub async fn start_session(State(state): State<AppState>) -> Result<Json<StepsSummary>, AppError> {
    let summary = steps::start_session(&state.steps, &state.sensor).await?;
    Ok(Json(summary))
}

pub async fn stop_session(
    State(state): State<AppState>,
) -> Result<Json<Option<StepSession>>, AppError> {
    let logged = steps::stop_session(&state.steps, state.sensor.as_ref(), &state.ids).await?;
    Ok(Json(logged))
}

pub async fn feed_pedometer(
    State(state): State<AppState>,
    Json(payload): Json<PedometerRequest>,
) -> Result<StatusCode, AppError> {
    if payload.steps == 0 {
        return Err(AppError::bad_request("steps must be greater than 0"));
    }
    state.pedometer.record(payload.steps).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn get_water(State(state): State<AppState>) -> Json<WaterSummary> {
    Json(state.water.lock().await.summary())
}

pub async fn add_intake(
    State(state): State<AppState>,
    Json(payload): Json<IntakeRequest>,
) -> Result<Json<WaterSummary>, AppError> {
    let mut water = state.water.lock().await;
    let summary = water.add_intake(&payload.amount, payload.name.as_deref(), &state.ids)?;
    Ok(Json(summary))
}

pub async fn get_weight(State(state): State<AppState>) -> Json<WeightSummary> {
    Json(state.weight.lock().await.summary(today()))
}

pub async fn record_weight(
    State(state): State<AppState>,
    Json(payload): Json<WeightRequest>,
) -> Result<Json<WeightSummary>, AppError> {
    let date = today();
    let mut weight = state.weight.lock().await;
    weight.record(&payload.weight, date)?;
    Ok(Json(weight.summary(date)))
}

pub async fn clear_weight(State(state): State<AppState>) -> Json<WeightSummary> {
    let mut weight = state.weight.lock().await;
    weight.clear();
    Json(weight.summary(today()))
}

pub async fn get_stats<S: TrackerScreen>(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let mut screen = S::select(&state).lock().await;
    Ok(Json(screen.stats(query.days, query.suppress_labels)?))
}

pub async fn set_goal<S: TrackerScreen>(
    State(state): State<AppState>,
    Json(payload): Json<GoalRequest>,
) -> Result<Json<S::Summary>, AppError> {
    let mut screen = S::select(&state).lock().await;
    Ok(Json(screen.set_goal(&payload.goal)?))
}

pub async fn rename_entry<S: TrackerScreen>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LabelRequest>,
) -> Json<S::Summary> {
    let mut screen = S::select(&state).lock().await;
    Json(screen.rename(&id, &payload.name))
}

pub async fn remove_entry<S: TrackerScreen>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<S::Summary> {
    let mut screen = S::select(&state).lock().await;
    Json(screen.remove(&id))
}

pub async fn clear_entries<S: TrackerScreen>(State(state): State<AppState>) -> Json<S::Summary> {
    let mut screen = S::select(&state).lock().await;
    Json(screen.clear())
}

pub async fn begin_edit<S: TrackerScreen>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<S::Summary>, AppError> {
    let mut screen = S::select(&state).lock().await;
    if !screen.tracker().begin_edit(&id) {
        return Err(AppError::not_found(format!("no entry with id {id}")));
    }
    Ok(Json(screen.summary()))
}

pub async fn save_edit<S: TrackerScreen>(
    State(state): State<AppState>,
    Json(payload): Json<LabelRequest>,
) -> Json<S::Summary> {
    let mut screen = S::select(&state).lock().await;
    screen.tracker().save_edit(&payload.name);
    Json(screen.summary())
}

pub async fn cancel_edit<S: TrackerScreen>(State(state): State<AppState>) -> Json<S::Summary> {
    let mut screen = S::select(&state).lock().await;
    screen.tracker().editor.cancel();
    Json(screen.summary())
}
