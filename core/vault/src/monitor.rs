//! Auto-lock monitor.
//!
//! A background task that wakes on a fixed poll interval and locks the
//! vault once the session has been idle for the configured timeout. It does
//! nothing while the vault is locked or auto-lock is disabled.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::VaultHandle;

/// Default monitor poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often the monitor checks for inactivity.
    ///
    /// The vault locks at most one interval after the timeout expires.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Spawns the monitor task.
///
/// The task is not torn down when the vault locks. It keeps ticking and
/// skips its check while locked, so one monitor covers every unlock in a
/// long-lived session. Stop it through its [`MonitorHandle`].
pub struct AutoLockMonitor;

impl AutoLockMonitor {
    /// Start monitoring `vault` on the current tokio runtime.
    ///
    /// The task runs until the returned handle is shut down or dropped.
    pub fn spawn(vault: VaultHandle, config: MonitorConfig) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(Self::run(vault, config, shutdown_rx));

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(vault: VaultHandle, config: MonitorConfig, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        info!(poll_secs = config.poll_interval.as_secs(), "Auto-lock monitor started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Auto-lock monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let mut controller = vault.lock().await;
                    if controller.check_auto_lock(Instant::now()) {
                        info!("Vault auto-locked after inactivity");
                    } else {
                        debug!(state = %controller.state(), "Auto-lock check");
                    }
                }
            }
        }
    }
}

/// Handle to a running monitor. Dropping it cancels the task.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the monitor and wait for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
