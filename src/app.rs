use crate::handlers;
use crate::state::AppState;
use crate::steps::StepsState;
use crate::tracker::TrackerScreen;
use crate::water::WaterState;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/home", get(handlers::get_home))
        .route("/api/steps", get(handlers::get_steps))
        .route("/api/steps/session/start", post(handlers::start_session))
        .route("/api/steps/session/stop", post(handlers::stop_session))
        .route("/api/pedometer", post(handlers::feed_pedometer))
        .nest("/api/steps", tracker_routes::<StepsState>())
        .route("/api/water", get(handlers::get_water))
        .nest(
            "/api/water",
            tracker_routes::<WaterState>().route("/entries", post(handlers::add_intake)),
        )
        .route(
            "/api/weight",
            get(handlers::get_weight)
                .post(handlers::record_weight)
                .delete(handlers::clear_weight),
        )
        .with_state(state)
}

/// Routes shared by every goal-based screen, mounted under its prefix.
fn tracker_routes<S: TrackerScreen>() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::get_stats::<S>))
        .route("/goal", put(handlers::set_goal::<S>))
        .route("/entries", delete(handlers::clear_entries::<S>))
        .route(
            "/entries/:id",
            patch(handlers::rename_entry::<S>).delete(handlers::remove_entry::<S>),
        )
        .route("/entries/:id/edit", post(handlers::begin_edit::<S>))
        .route(
            "/edit",
            post(handlers::save_edit::<S>).delete(handlers::cancel_edit::<S>),
        )
}
