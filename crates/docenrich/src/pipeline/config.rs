use std::time::Duration;

use crate::config::Config;

pub struct PipelineConfig {
    /// Language every document is translated into.
    pub target_language: String,
    /// Deadline applied to each collaborator call.
    pub stage_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_language: config.pipeline.target_language.clone(),
            stage_timeout: Duration::from_secs(config.pipeline.stage_timeout_secs),
        }
    }
}
