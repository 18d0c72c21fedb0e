mod settings;

pub use settings::{
    ApiConfig, AssistantConfig, DEFAULT_BASE_URL, DEFAULT_NETWORK_SCAN_LIMIT,
    DEFAULT_TIMEOUT_SECS, HealthCheckConfig,
};
