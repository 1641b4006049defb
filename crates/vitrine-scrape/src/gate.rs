//! [`RateGate`]: a single-slot throttle on outbound lookups.

use std::time::Duration;

use tokio::{
  sync::Mutex,
  time::{Instant, sleep},
};
use tracing::debug;

/// Enforces a minimum spacing between consecutive acquisitions.
///
/// The gate throttles the aggregate call rate, not individual keys. The lock
/// is held across the wait, so acquisitions are strictly serialized; the
/// order among concurrent waiters is whatever the scheduler decides.
#[derive(Debug)]
pub struct RateGate {
  spacing:   Duration,
  last_call: Mutex<Option<Instant>>,
}

impl RateGate {
  pub fn new(spacing: Duration) -> Self {
    Self { spacing, last_call: Mutex::new(None) }
  }

  pub fn spacing(&self) -> Duration { self.spacing }

  /// Wait until at least `spacing` has elapsed since the previous
  /// acquisition, then record and return the moment of release.
  pub async fn acquire(&self) -> Instant {
    let mut last_call = self.last_call.lock().await;
    if let Some(previous) = *last_call {
      let elapsed = previous.elapsed();
      if elapsed < self.spacing {
        let wait = self.spacing - elapsed;
        debug!(wait_ms = wait.as_millis() as u64, "waiting for rate gate");
        sleep(wait).await;
      }
    }
    let now = Instant::now();
    *last_call = Some(now);
    now
  }
}
