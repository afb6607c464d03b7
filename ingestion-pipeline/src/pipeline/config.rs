use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct IngestionTuning {
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub dropped_id_sample: usize,
}

impl Default for IngestionTuning {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            dropped_id_sample: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub tuning: IngestionTuning,
}

impl IngestionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: IngestionTuning {
                poll_timeout: Duration::from_secs(config.poll_timeout_secs),
                poll_interval: Duration::from_secs(config.poll_interval_secs),
                ..IngestionTuning::default()
            },
        }
    }
}
