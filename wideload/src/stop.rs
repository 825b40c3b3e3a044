use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, warn, Instrument};
use wideload_core::StopReason;

/// Level-triggered, broadcast stop signal.
///
/// Once raised it stays raised; every clone (and every child) observes it. Raising it again is
/// a no-op, and the first [`StopReason`] wins.
#[derive(Clone, Debug)]
pub struct StopHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<StopReason>>,
    parent: Option<Arc<StopHandle>>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
            parent: None,
        }
    }

    /// A handle that is stopped whenever `self` is, but can also be stopped on its own without
    /// affecting `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            reason: Arc::new(OnceLock::new()),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn stop(&self, reason: StopReason) {
        if self.token.is_cancelled() {
            return;
        }

        if self.reason.set(reason).is_ok() {
            debug!("Stop requested: {reason}");
        }
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the handle is stopped. Resolves immediately if it already is.
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    pub fn reason(&self) -> Option<StopReason> {
        self.reason
            .get()
            .copied()
            .or_else(|| self.parent.as_ref().and_then(|p| p.reason()))
    }
}

/// Stops `stop` after `duration`, or exits early if it is stopped some other way.
pub(crate) fn spawn_watchdog(stop: StopHandle, duration: Duration) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    info!("Run duration of {} elapsed, stopping.", humantime::format_duration(duration));
                    stop.stop(StopReason::DurationElapsed);
                }
                _ = stop.stopped() => {}
            }
        }
        .in_current_span(),
    )
}

/// Stops `stop` on Ctrl-C.
pub(crate) fn spawn_interrupt_watcher(stop: StopHandle) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => {
                        warn!("Interrupt received, stopping.");
                        stop.stop(StopReason::Interrupted);
                    }
                    Err(err) => error!("Unable to listen for interrupts: {err}"),
                },
                _ = stop.stopped() => {}
            }
        }
        .in_current_span(),
    )
}
