//! Client configuration
//!
//! Defaults suit a local development server. `from_env` loads `.env` first,
//! then reads `SCHEDULE_*` variables; the CLI applies its flags on top.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/";
pub const DEFAULT_EVENTS_URL: &str = "ws://localhost:5000/ws";
pub const DEFAULT_LOGIN_URL: &str = "http://localhost:3000/login";

/// Defaults applied by the payload pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub days_of_week: Vec<String>,
    /// (theory, practice) hours for subjects typed as theory
    pub theory_subject_hours: (u32, u32),
    /// (theory, practice) hours for subjects typed as practice
    pub practice_subject_hours: (u32, u32),
    /// (theory, practice) hours for untyped or mixed subjects
    pub mixed_subject_hours: (u32, u32),
    pub default_duration_weeks: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            days_of_week: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
                .iter()
                .map(|day| day.to_string())
                .collect(),
            theory_subject_hours: (45, 0),
            practice_subject_hours: (0, 45),
            mixed_subject_hours: (30, 15),
            default_duration_weeks: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, always ending with `/`
    pub api_url: Url,
    pub events_url: Url,
    pub login_url: Url,
    /// Transport timeout of the generate request
    pub generate_timeout: Duration,
    /// Default timeout of every other request
    pub request_timeout: Duration,
    /// Delay before reconnecting the event channel; `None` disables reconnects
    pub reconnect_interval: Option<Duration>,
    pub progress_log_capacity: usize,
    pub diagnostic_log_capacity: usize,
    pub pipeline: PipelineConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            events_url: Url::parse(DEFAULT_EVENTS_URL).expect("default events URL is valid"),
            login_url: Url::parse(DEFAULT_LOGIN_URL).expect("default login URL is valid"),
            generate_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            reconnect_interval: Some(Duration::from_secs(5)),
            progress_log_capacity: 100,
            diagnostic_log_capacity: 200,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build configuration from `.env` and the process environment
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(value) = env::var("SCHEDULE_API_URL") {
            config = config.with_api_url(&value)?;
        }
        if let Ok(value) = env::var("SCHEDULE_EVENTS_URL") {
            config = config.with_events_url(&value)?;
        }
        if let Ok(value) = env::var("SCHEDULE_LOGIN_URL") {
            config = config.with_login_url(&value)?;
        }
        if let Ok(value) = env::var("SCHEDULE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("SCHEDULE_REQUEST_TIMEOUT_SECS", &value)?);
        }
        if let Ok(value) = env::var("SCHEDULE_RECONNECT_SECS") {
            let secs = parse_number("SCHEDULE_RECONNECT_SECS", &value)?;
            config.reconnect_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_api_url(mut self, value: &str) -> ClientResult<Self> {
        self.api_url = normalize_base(Url::parse(value)?);
        Ok(self)
    }

    pub fn with_events_url(mut self, value: &str) -> ClientResult<Self> {
        let url = Url::parse(value)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ClientError::config(format!("Event channel URL must use ws or wss: {value}")));
        }
        self.events_url = url;
        Ok(self)
    }

    pub fn with_login_url(mut self, value: &str) -> ClientResult<Self> {
        self.login_url = Url::parse(value)?;
        Ok(self)
    }
}

fn parse_number(field: &str, value: &str) -> ClientResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ClientError::Shared(shared::SharedError::InvalidConfig {
            field: field.to_string(),
            value: value.to_string(),
        }))
}

/// Relative joins drop the last path segment unless the base ends with `/`
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
