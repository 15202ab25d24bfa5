pub mod record;
pub mod retry;
pub mod runner;
pub mod session;
pub mod sink;

pub use record::{LogLevel, LogRecord};
pub use runner::{spawn_telemetry, DeliveryConfig};
pub use session::{SessionConfig, TelemetrySession};
pub use sink::{HttpSink, LogSink, SinkError};
