use std::time::Duration;

use crate::config::Config;
use crate::surface::ResponseFilter;

use super::poll::PollPolicy;

/// Runtime form of the mapping section of [`Config`].
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub path_delimiter: String,
    pub settle_delay: Duration,
    pub search_settle: Duration,
    pub save_settle: Duration,
    pub settings_open: PollPolicy,
    pub response_timeout: Duration,
    pub completion_poll: PollPolicy,
    pub response_filter: ResponseFilter,
}

impl ProcessorSettings {
    pub fn from_config(config: &Config) -> Self {
        let mapping = &config.mapping;
        Self {
            path_delimiter: config.catalog.path_delimiter.clone(),
            settle_delay: Duration::from_millis(mapping.settle_delay_ms),
            search_settle: Duration::from_millis(mapping.search_settle_ms),
            save_settle: Duration::from_millis(mapping.save_settle_ms),
            settings_open: PollPolicy::from_config(&mapping.settings_open),
            response_timeout: Duration::from_millis(mapping.response_timeout_ms),
            completion_poll: PollPolicy::from_config(&mapping.completion_poll),
            response_filter: ResponseFilter::from_config(&mapping.response_filter),
        }
    }
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
