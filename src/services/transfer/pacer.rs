use std::time::Duration;

/// Fixed pause between file transfers, keeping the destination's ingestion
/// rate limits happy. Deliberately not adaptive: the interval is the same
/// whether the previous file succeeded, was skipped, or exhausted its
/// retries.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Suspend until the interval has elapsed. Zero interval is a no-op.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_the_full_interval() {
        let pacer = Pacer::from_millis(1000);
        assert_eq!(pacer.interval(), Duration::from_millis(1000));
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_returns_immediately() {
        let pacer = Pacer::from_millis(0);
        let start = Instant::now();
        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
