//! Run control for external stop requests.
//!
//! A `RunControl` is shared between whoever drives a check run and the
//! sources of stop requests (Ctrl-C, the control socket). Requesting a stop
//! cancels the token; the driver observes it and calls `stop_run`.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Shared stop signal for the active check run.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    token: CancellationToken,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the active run to stop. Idempotent.
    pub fn request_stop(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("stop requested");
        }
        self.token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a stop has been requested.
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }
}

/// Default path for the control socket (same XDG state dir as the DB).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("sourcecheck")?.get_state_home();
    Ok(dir.join("control.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_stop_wakes_waiters() {
        let control = RunControl::new();
        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.stopped().await })
        };
        assert!(!control.is_stop_requested());
        control.request_stop();
        control.request_stop();
        waiter.await.unwrap();
        assert!(control.is_stop_requested());
    }
}
