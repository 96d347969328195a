use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// The maximum time in milliseconds that a single scheduling attempt
    /// waits for an executor slot to become available.
    /// Zero means the attempt returns immediately when no slot is free.
    pub schedule_timeout_ms: u64,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .merge(Env::prefixed("SKIFF_").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}

/// Environment variables for scheduler configuration.
pub struct SchedulerConfigEnv;

macro_rules! define_scheduler_config_env {
    ($($name:ident),* $(,)?) => {
        $(pub const $name: &'static str = concat!("SKIFF_SCHEDULER__", stringify!($name));)*
    };
}

impl SchedulerConfigEnv {
    define_scheduler_config_env! {
        SCHEDULE_TIMEOUT_MS,
    }
}
