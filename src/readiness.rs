// Bounded readiness polling

use crate::context::Context;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Something that can be asked "are you ready yet?".
#[async_trait]
pub trait ReadinessProbe: Send {
    async fn is_ready(&mut self, ctx: &Context) -> Result<bool>;

    /// Label used in logs and timeout errors.
    fn label(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessPoller {
    interval: Duration,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
        }
    }
}

impl ReadinessPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of probes that fit in `timeout` (at least one).
    pub fn attempts_for(&self, timeout: Duration) -> u32 {
        let step = self.interval.as_millis().max(1);
        (timeout.as_millis() / step).clamp(1, u32::MAX as u128) as u32
    }

    /// Probes once per interval, at most `attempts` times.
    ///
    /// Probe errors count as "not ready" except on the last attempt, where they are
    /// returned. Cancellation or the context deadline interrupts the wait between probes.
    pub async fn wait_until_ready<P>(&self, ctx: &Context, probe: &mut P, attempts: u32) -> Result<()>
    where
        P: ReadinessProbe + ?Sized,
    {
        let started = Instant::now();
        for attempt in 1..=attempts {
            match probe.is_ready(ctx).await {
                Ok(true) => {
                    debug!(container = %probe.label(), attempt, "ready");
                    return Ok(());
                }
                Ok(false) => debug!(container = %probe.label(), attempt, "not ready yet"),
                Err(e @ (Error::Cancelled | Error::DeadlineExceeded)) => return Err(e),
                Err(e) if attempt == attempts => return Err(e),
                Err(e) => warn!(
                    container = %probe.label(),
                    attempt,
                    error = %e,
                    operation = "readiness_probe",
                    "probe failed; retrying"
                ),
            }
            ctx.sleep(self.interval).await?;
        }
        Err(Error::Timeout {
            container: probe.label(),
            waited: started.elapsed(),
        })
    }
}
