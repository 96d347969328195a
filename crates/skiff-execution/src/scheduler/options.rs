//! A dedicated module for scheduling policy options to ensure readonly access.
use std::time::Duration;

use skiff_common::config::AppConfig;

use crate::error::ExecutionError;

#[readonly::make]
pub struct SchedulingPolicyOptions {
    /// The maximum time a single scheduling attempt waits for a free slot.
    pub schedule_timeout: Duration,
}

impl SchedulingPolicyOptions {
    pub fn new(schedule_timeout: Duration) -> Self {
        Self { schedule_timeout }
    }
}

impl TryFrom<&AppConfig> for SchedulingPolicyOptions {
    type Error = ExecutionError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            schedule_timeout: Duration::from_millis(config.scheduler.schedule_timeout_ms),
        })
    }
}
