use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifier attached to this viewer's telemetry. Defaults to the hostname.
    pub viewer_id: Option<String>,
    pub event: EventConfig,
    pub telemetry: TelemetryConfig,
    pub identity: IdentityConfig,
    pub player: PlayerConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub stub: StubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log ingestion endpoint; records are POSTed as a JSON array
    pub endpoint: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_batch_size() -> usize {
    30
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,
    #[serde(default = "default_max_queued_batches")]
    pub max_queued_batches: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff: default_initial_backoff(),
            max_queued_batches: default_max_queued_batches(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_secs(1)
}

fn default_max_queued_batches() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    /// Hosted-provider settings (required when mode is `hosted`)
    pub authority: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// User authenticated immediately when mode is `dev`
    pub dev_user: Option<DevUserConfig>,
    /// Profile sync endpoint; fired once per authenticated session start
    pub profile_endpoint: Option<String>,
}

fn default_scopes() -> String {
    "phone openid email".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    Dev,
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevUserConfig {
    pub sub: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Newline-delimited JSON feed of player events
    pub events_path: PathBuf,
    #[serde(default)]
    pub follow: bool,
    /// Whether the player engine exposes quality-level selection
    #[serde(default)]
    pub quality_levels: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_unit_price")]
    pub unit_price: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            currency: default_currency(),
        }
    }
}

fn default_unit_price() -> u32 {
    50
}

fn default_currency() -> String {
    "₹".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Resolve an unanswered permission prompt as granted
    #[serde(default)]
    pub assume_granted: bool,
    /// Local development: also emit a synchronous alert line for every notification
    #[serde(default)]
    pub local_dev: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assume_granted: false,
            local_dev: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_tick_interval", with = "humantime_serde")]
    pub tick_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
        }
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubConfig {
    #[serde(default = "default_stub_listen")]
    pub listen: String,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            listen: default_stub_listen(),
        }
    }
}

fn default_stub_listen() -> String {
    "127.0.0.1:3000".to_string()
}
