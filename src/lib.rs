pub mod app;
pub mod config;
pub mod entry_log;
pub mod errors;
pub mod goal;
pub mod handlers;
pub mod models;
pub mod pedometer;
pub mod session;
pub mod state;
pub mod stats;
pub mod steps;
pub mod store;
pub mod tracker;
pub mod ui;
pub mod water;
pub mod weight;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::{FileStore, KeyValueStore, MemoryStore};
