use crate::access::profile::sync_profile;
use crate::access::{gate_view, DevIdentity, GateView, HostedIdentity, IdentityError, IdentityProvider, UserProfile};
use crate::config::types::IdentityMode;
use crate::config::version::fingerprint_str;
use crate::config::{load_config_with_yaml, ConfigError};
use crate::lifecycle::countdown::{format_remaining, run_end_countdown};
use crate::lifecycle::runner::spawn_lifecycle;
use crate::lifecycle::status::{EventStatus, EventWindow, WindowError};
use crate::notify::NotificationGate;
use crate::player::binder::{run_binder, PlayerTelemetryBinder};
use crate::player::source::PlayerEventSource;
use crate::telemetry::runner::{spawn_telemetry, DeliveryConfig};
use crate::telemetry::session::SessionConfig;
use crate::telemetry::sink::{HttpSink, SinkError};
use chrono::Utc;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("event window error: {0}")]
    Window(#[from] WindowError),

    #[error("telemetry sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/streamgate/config.yml");
            eprintln!("  /etc/streamgate/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'streamgate config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_session(&config_path).await.map_err(|e| e.into())
}

async fn run_session(config_path: &Path) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");

    let (config, yaml) = load_config_with_yaml(config_path)?;
    let fingerprint = fingerprint_str(&yaml);

    let viewer_id = config.viewer_id.clone().unwrap_or_else(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "viewer".to_string())
    });

    info!(
        viewer_id = %viewer_id,
        config_fingerprint = %fingerprint,
        "Starting viewer session"
    );

    let window = EventWindow::new(config.event.start_time, config.event.end_time)?;

    // ===== Access gate =====

    let identity: Arc<dyn IdentityProvider> = match config.identity.mode {
        IdentityMode::Dev => {
            let dev_user = config
                .identity
                .dev_user
                .as_ref()
                .ok_or_else(|| RunError::Auth("identity.dev_user is not configured".to_string()))?;
            Arc::new(DevIdentity::new(UserProfile::from(dev_user)))
        }
        IdentityMode::Hosted => Arc::new(HostedIdentity::new(&config.identity)?),
    };

    let user = wait_for_access(identity.as_ref()).await?;
    let display_name = user.username.clone().unwrap_or_else(|| user.sub.clone());
    println!("Signed in as {}", style(&display_name).bold());

    // Fire-and-forget profile sync; failure never blocks the stream
    if let Some(endpoint) = config.identity.profile_endpoint.clone() {
        tokio::spawn(sync_profile(endpoint, user.clone()));
    }

    // ===== Telemetry pipeline =====

    let sink = Arc::new(HttpSink::new(
        config.telemetry.endpoint.clone(),
        config.telemetry.request_timeout,
    )?);
    let (session, delivery_handle) = spawn_telemetry(
        SessionConfig {
            batch_size: config.telemetry.batch_size,
            flush_interval: config.telemetry.flush_interval,
        },
        DeliveryConfig {
            max_attempts: config.telemetry.retry.max_attempts,
            initial_backoff: config.telemetry.retry.initial_backoff,
            max_queued_batches: config.telemetry.retry.max_queued_batches,
        },
        sink,
    );

    // ===== Event lifecycle =====

    let (mut status_rx, lifecycle) = spawn_lifecycle(window, config.lifecycle.tick_interval);

    let mut render_interval = tokio::time::interval(config.lifecycle.tick_interval);
    let mut live_tasks: Vec<JoinHandle<()>> = Vec::new();
    let mut live_announced = false;
    let mut register_hint_shown = false;

    loop {
        tokio::select! {
            _ = render_interval.tick() => {}
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }

        let status = *status_rx.borrow();
        match status {
            EventStatus::Pending => {
                let remaining = window.start_time - Utc::now();
                println!("Event starts in: {}", format_remaining(remaining));
                if !register_hint_shown {
                    register_hint_shown = true;
                    println!(
                        "{}",
                        style("Run `streamgate register` to book a viewing slot.").dim()
                    );
                }
            }
            EventStatus::Live => {
                if !live_announced {
                    live_announced = true;
                    println!("{}", style("Event is live.").bold().green());

                    // Mount the player feed and bind telemetry to it
                    let (event_tx, event_rx) = mpsc::channel(256);
                    let source = PlayerEventSource::new(
                        config.player.events_path.clone(),
                        config.player.follow,
                    );
                    live_tasks.push(tokio::spawn(async move {
                        if let Err(e) = source.run(event_tx).await {
                            error!(error = %e, "Player event source failed");
                        }
                    }));

                    let binder = PlayerTelemetryBinder::new(
                        session.clone(),
                        None,
                        config.player.quality_levels,
                    );
                    live_tasks.push(tokio::spawn(run_binder(event_rx, binder)));

                    // End countdown with notification thresholds
                    let gate = NotificationGate::new(&config.notifications);
                    live_tasks.push(tokio::spawn(run_end_countdown(
                        window,
                        config.lifecycle.tick_interval,
                        gate,
                        lifecycle.conclude_sender(),
                    )));
                } else {
                    let remaining = window.end_time - Utc::now();
                    println!("Event ends in: {}", format_remaining(remaining));
                }
            }
            EventStatus::Concluded => {
                println!("{}", style("Event Concluded").bold().red());
                println!(
                    "The live streaming event that you are trying to access has been concluded."
                );
                println!("Event ended on: {}", window.end_time.format("%c"));
                break;
            }
        }
    }

    // ===== Teardown =====

    lifecycle.abort();
    for task in &live_tasks {
        task.abort();
    }
    for task in live_tasks {
        let _ = task.await;
    }

    session.shutdown();
    drop(session);

    match tokio::time::timeout(Duration::from_secs(5), delivery_handle).await {
        Ok(Ok(())) => info!("Delivery task completed"),
        Ok(Err(e)) => error!(error = %e, "Delivery task join error"),
        Err(_) => warn!("Delivery task did not drain in time, abandoning"),
    }

    info!("Viewer session finished");

    Ok(())
}

/// Block on the access gate until the identity capability grants access.
async fn wait_for_access(identity: &dyn IdentityProvider) -> Result<UserProfile, RunError> {
    let mut state_rx = identity.state();
    let mut sign_in_requested = false;

    loop {
        let view = gate_view(&state_rx.borrow().clone());
        match view {
            GateView::Granted(user) => return Ok(user),
            GateView::Failed(message) => return Err(RunError::Auth(message)),
            GateView::SignInRequired => {
                if !sign_in_requested {
                    sign_in_requested = true;
                    println!("Login required. Please sign in to continue.");
                    identity.sign_in().await?;
                    // Re-check: a dev provider pushes the new state synchronously
                    continue;
                }
            }
            GateView::Loading => {
                println!("Loading...");
            }
        }

        if state_rx.changed().await.is_err() {
            return Err(RunError::Auth("identity provider went away".to_string()));
        }
    }
}
