use std::future::Future;
use std::time::Duration;

/// Polling schedule for condition waits: starts at `initial` and multiplies
/// by `factor` up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub factor: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(1_000),
            factor: 2,
        }
    }
}

impl Backoff {
    fn next(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.factor.max(1))
            .min(self.max.max(self.initial))
    }
}

/// Re-runs `probe` until it yields a value or `bound` elapses.
///
/// The probe always runs at least once, even with a zero bound.
pub async fn poll_until<T, F, Fut>(bound: Duration, backoff: &Backoff, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let schedule = *backoff;
    tokio::time::timeout(bound, async move {
        let mut delay = schedule.initial;
        loop {
            if let Some(value) = probe().await {
                return value;
            }
            tokio::time::sleep(delay).await;
            delay = schedule.next(delay);
        }
    })
    .await
    .ok()
}
