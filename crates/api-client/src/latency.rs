use std::time::Duration;

/// Delay applied before every mock response resolves.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(800);

/// Fixed artificial delay standing in for network I/O.
///
/// No jitter and no failure injection: `wait` always resolves after exactly
/// the configured delay, which keeps it deterministic under a paused tokio
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySimulator {
    delay: Duration,
}

impl LatencySimulator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Resolve immediately; for tests and embedded callers.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for LatencySimulator {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn waits_exactly_the_configured_delay() {
        let start = Instant::now();
        LatencySimulator::default().wait().await;
        assert_eq!(start.elapsed(), DEFAULT_LATENCY);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn none_does_not_sleep() {
        let start = Instant::now();
        LatencySimulator::none().wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
