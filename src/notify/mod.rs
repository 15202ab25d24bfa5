use crate::config::types::NotificationConfig;
use console::{style, Term};
use std::sync::Arc;
use tracing::debug;

/// Platform notification permission, mirroring the browser model: the
/// prompt starts unanswered and resolves to granted or denied exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

/// Something that can surface a native notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Notifies on the controlling terminal: a styled line plus the bell.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        let term = Term::stderr();
        let line = format!("\x07{} {}", style(title).bold().cyan(), body);
        let _ = term.write_line(&line);
    }
}

/// Wraps the platform notification permission model for the end countdown.
///
/// Permission is requested once per countdown mount. In local-development
/// sessions an alert-style line is emitted for every notification whether
/// or not permission was granted, so thresholds stay visible without a
/// notification surface.
pub struct NotificationGate {
    permission: Permission,
    requested: bool,
    enabled: bool,
    assume_granted: bool,
    local_dev: bool,
    notifier: Arc<dyn Notifier>,
}

impl NotificationGate {
    pub fn new(config: &NotificationConfig) -> Self {
        Self::with_notifier(config, Arc::new(TerminalNotifier))
    }

    pub fn with_notifier(config: &NotificationConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            permission: if config.enabled {
                Permission::Default
            } else {
                Permission::Denied
            },
            requested: false,
            enabled: config.enabled,
            assume_granted: config.assume_granted,
            local_dev: config.local_dev,
            notifier,
        }
    }

    /// Resolve the permission prompt. Subsequent calls return the first
    /// answer unchanged.
    pub fn request_permission(&mut self) -> Permission {
        if !self.requested {
            self.requested = true;
            if self.enabled && self.permission == Permission::Default {
                self.permission = if self.assume_granted {
                    Permission::Granted
                } else {
                    Permission::Denied
                };
            }
        }
        self.permission
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn send(&self, title: &str, body: &str) {
        if self.permission == Permission::Granted {
            self.notifier.notify(title, body);
        } else {
            debug!(permission = ?self.permission, title, "Notification suppressed");
        }

        // Alert fallback for local development, granted or not
        if self.local_dev {
            let term = Term::stderr();
            let _ = term.write_line(&format!("[alert] {}: {}", title, body));
        }
    }
}
