use std::{env, path::PathBuf, time::Duration};

const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POLL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_path: resolve_data_path(),
            port: parse_var("PORT").unwrap_or(DEFAULT_PORT),
            poll_interval: Duration::from_secs(
                parse_var::<u64>("WELLTH_POLL_SECS")
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_POLL_SECS),
            ),
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_DATA_PATH)
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}
