pub mod binder;
pub mod events;
pub mod source;

pub use binder::{run_binder, PlayerTelemetryBinder};
pub use events::{NetworkInfo, PlayerEvent, QualityLevel};
pub use source::PlayerEventSource;
