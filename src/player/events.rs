use serde::{Deserialize, Serialize};

/// The full media-event surface this system observes. A closed enum rather
/// than ad hoc callback registration so the instrumented surface is
/// auditable and testable without a concrete player engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    Dispose,
    /// Player error with whatever the engine exposed; all fields absent
    /// means the engine reported no error object
    Error {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        status: Option<u16>,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
    Abort,
    Stalled,
    Suspend,
    Emptied,
    Waiting,
    Playing,
    CanPlay,
    CanPlayThrough,
    Seeking,
    QualityChange {
        #[serde(default)]
        level: Option<QualityLevel>,
    },
    Play,
    Pause,
    VolumeChange {
        volume: f64,
        muted: bool,
    },
    FullscreenChange {
        fullscreen: bool,
    },
    RateChange {
        rate: f64,
    },
    ConnectionChange {
        effective_type: String,
    },
}

/// Selected adaptive-bitrate rendition, as reported by the player's
/// quality-levels capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityLevel {
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Optional connection-information capability of the host environment.
/// Branch on presence, not duck-typing.
pub trait NetworkInfo: Send + Sync {
    /// Effective connection type, e.g. "4g", "3g", "slow-2g"
    fn effective_type(&self) -> String;
}

/// Effective types treated as poor connectivity.
pub fn is_poor_connection(effective_type: &str) -> bool {
    matches!(effective_type, "2g" | "3g" | "slow-2g")
}
