use crate::player::events::{is_poor_connection, NetworkInfo, PlayerEvent, QualityLevel};
use crate::telemetry::record::LogLevel;
use crate::telemetry::session::TelemetrySession;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Tracks the single open rebuffer interval and the running total.
///
/// An interval opens on a wait-for-data stall and closes when playback
/// resumes or becomes playable; at most one interval is open at a time.
#[derive(Debug, Default)]
pub struct RebufferTracker {
    rebuffering_start: Option<Instant>,
    total_rebuffering: Duration,
}

impl RebufferTracker {
    /// Open an interval unless one is already open.
    pub fn open(&mut self) {
        if self.rebuffering_start.is_none() {
            self.rebuffering_start = Some(Instant::now());
        }
    }

    /// Close the open interval, fold it into the total, and return it.
    /// None when no interval was open.
    pub fn close(&mut self) -> Option<Duration> {
        let start = self.rebuffering_start.take()?;
        let elapsed = start.elapsed();
        self.total_rebuffering += elapsed;
        Some(elapsed)
    }

    pub fn total(&self) -> Duration {
        self.total_rebuffering
    }
}

/// Translates the player's event stream into telemetry records, keeping the
/// batch cardinality low: high-frequency play/pause events become counters,
/// canplaythrough is suppressed entirely.
///
/// Writes only through the telemetry session; owns no delivery logic.
pub struct PlayerTelemetryBinder {
    session: Arc<TelemetrySession>,
    network: Option<Arc<dyn NetworkInfo>>,
    rebuffer: RebufferTracker,
    effective_type: Option<String>,
}

impl PlayerTelemetryBinder {
    /// Bind to a player surface. Emits the setup records once: the
    /// missing-quality-capability warning and, when a connection capability
    /// is present, the connectivity baseline.
    pub fn new(
        session: Arc<TelemetrySession>,
        network: Option<Arc<dyn NetworkInfo>>,
        supports_quality_levels: bool,
    ) -> Self {
        let mut binder = Self {
            session,
            network,
            rebuffer: RebufferTracker::default(),
            effective_type: None,
        };

        if !supports_quality_levels {
            binder
                .session
                .record(LogLevel::Warning, "[QUAL] not supported", None);
        }

        if let Some(net) = binder.network.clone() {
            let effective_type = net.effective_type();
            binder.effective_type = Some(effective_type.clone());
            binder.log_connection(&effective_type);
        }

        binder
    }

    pub fn handle(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Dispose => {
                self.session.record(LogLevel::Info, "player dispose", None);
            }
            PlayerEvent::Error {
                code,
                message,
                status,
                metadata,
            } => {
                let details = if code.is_none()
                    && message.is_none()
                    && status.is_none()
                    && metadata.is_none()
                {
                    json!("Unknown error")
                } else {
                    json!({
                        "code": code,
                        "message": message,
                        "status": status,
                        "metadata": metadata,
                    })
                };
                self.session.record(LogLevel::Error, "[ERR]", Some(details));
            }
            PlayerEvent::Abort => {
                self.session
                    .record(LogLevel::Error, "[ERR] Media load aborted", None);
            }
            PlayerEvent::Stalled => {
                self.session.record(LogLevel::Error, "[ERR] stalled", None);
                self.log_network_on_buffer("stalled");
            }
            PlayerEvent::Suspend => {
                self.session.record(LogLevel::Error, "[ERR] suspend", None);
            }
            PlayerEvent::Emptied => {
                self.session.record(LogLevel::Error, "[ERR] emptied", None);
            }
            PlayerEvent::Waiting => {
                self.session.record(LogLevel::Info, "[BUF] waiting", None);
                self.rebuffer.open();
                self.log_network_on_buffer("waiting");
            }
            PlayerEvent::Playing => {
                self.log_rebuffer_end();
            }
            PlayerEvent::CanPlay => {
                self.log_rebuffer_end();
                self.session.record(LogLevel::Info, "[BUF] canplay", None);
            }
            // Intentionally not logged: fires too often to be useful
            PlayerEvent::CanPlayThrough => {}
            PlayerEvent::Seeking => {
                self.session.record(LogLevel::Info, "[BUF] seeking", None);
            }
            PlayerEvent::QualityChange { level } => match level {
                Some(QualityLevel { height, bitrate, id }) => {
                    let height = height.map_or_else(|| "?".to_string(), |h| h.to_string());
                    let bitrate = bitrate.map_or_else(|| "?".to_string(), |b| b.to_string());
                    let id = id.unwrap_or_else(|| "?".to_string());
                    self.session.record(
                        LogLevel::Warning,
                        format!("[QUAL] {}p, {}bps, id:{}", height, bitrate, id),
                        None,
                    );
                }
                None => {
                    self.session
                        .record(LogLevel::Warning, "[QUAL] changed, no level", None);
                }
            },
            PlayerEvent::Play => self.session.note_play(),
            PlayerEvent::Pause => self.session.note_pause(),
            PlayerEvent::VolumeChange { volume, muted } => {
                self.session.record(
                    LogLevel::Info,
                    "[UI] volume",
                    Some(json!({"volume": volume, "muted": muted})),
                );
            }
            PlayerEvent::FullscreenChange { fullscreen } => {
                self.session.record(
                    LogLevel::Info,
                    "[UI] fullscreen",
                    Some(json!({"isFullscreen": fullscreen})),
                );
            }
            PlayerEvent::RateChange { rate } => {
                self.session.record(
                    LogLevel::Info,
                    "[UI] rate",
                    Some(json!({"playbackRate": rate})),
                );
            }
            PlayerEvent::ConnectionChange { effective_type } => {
                self.effective_type = Some(effective_type.clone());
                self.log_connection(&effective_type);
            }
        }
    }

    pub fn total_rebuffering(&self) -> Duration {
        self.rebuffer.total()
    }

    fn log_rebuffer_end(&mut self) {
        if let Some(elapsed) = self.rebuffer.close() {
            self.session.record(
                LogLevel::Info,
                format!(
                    "[BUF] rebuffer {:.2}s, total {:.2}s",
                    elapsed.as_secs_f64(),
                    self.rebuffer.total().as_secs_f64()
                ),
                None,
            );
        }
    }

    fn log_connection(&self, effective_type: &str) {
        self.session.record(
            LogLevel::Info,
            format!("[NET] type: {}", effective_type),
            None,
        );
        if is_poor_connection(effective_type) {
            self.session.record(
                LogLevel::Warning,
                format!("[NET] poor ({})", effective_type),
                None,
            );
        }
    }

    fn log_network_on_buffer(&self, event_name: &str) {
        let network_type = self
            .network
            .as_ref()
            .map(|net| net.effective_type())
            .or_else(|| self.effective_type.clone())
            .unwrap_or_else(|| "unknown".to_string());

        self.session.record(
            LogLevel::Warning,
            format!("[NET/BUF] {} net: {}", event_name, network_type),
            None,
        );
    }
}

/// Drive a binder from a player event stream until the player goes away.
pub async fn run_binder(mut rx: mpsc::Receiver<PlayerEvent>, mut binder: PlayerTelemetryBinder) {
    while let Some(event) = rx.recv().await {
        binder.handle(event);
    }
}
