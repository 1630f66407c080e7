//! Shutdown Signal - Cooperative Cancellation
//!
//! A `watch::channel(false)` flips to `true` once SIGINT or SIGTERM
//! arrives. Long waits in the orchestrator and monitor go through
//! [`sleep_or_shutdown`] so they return as soon as the flag flips.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

/// Create the shutdown channel, initially not stopping.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
  watch::channel(false)
}

/// Wait for SIGINT or SIGTERM, then flip the channel.
pub async fn listen_for_signals(tx: watch::Sender<bool>) {
  #[cfg(unix)]
  {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        tokio::select! {
          _ = tokio::signal::ctrl_c() => info!("SIGINT received, initiating graceful shutdown"),
          _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown"),
        }
      }
      Err(e) => {
        warn!(error = %e, "Could not install SIGTERM handler, listening for SIGINT only");
        let _ = tokio::signal::ctrl_c().await;
        info!("SIGINT received, initiating graceful shutdown");
      }
    }
  }

  #[cfg(not(unix))]
  {
    let _ = tokio::signal::ctrl_c().await;
    info!("SIGINT received, initiating graceful shutdown");
  }

  let _ = tx.send(true);
}

/// Sleep for `duration` unless shutdown is requested first.
///
/// Returns `true` when shutdown was requested. A dropped sender counts
/// as "never stopping" and the full duration is slept.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
  if *shutdown.borrow() {
    return true;
  }

  let deadline = Instant::now() + duration;
  tokio::select! {
    () = sleep_until(deadline) => false,
    stopped = async { shutdown.wait_for(|stop| *stop).await.is_ok() } => {
      if !stopped {
        sleep_until(deadline).await;
      }
      stopped
    }
  }
}
