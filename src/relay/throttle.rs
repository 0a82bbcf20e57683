//! Backpressure throttle
//!
//! Paces WebSocket sends by the number of chunks the session has already
//! forwarded, since the socket's send queue depth is not observable.

use std::time::Duration;

/// `(minimum chunk count, delay in ms)`, highest tier first
const TIERS: [(u64, u64); 3] = [(500, 50), (120, 20), (20, 10)];

/// Per-session pacing state for the outbound-to-client direction
#[derive(Debug, Clone)]
pub struct BackpressureThrottle {
    chunks: u64,
    enabled: bool,
}

impl Default for BackpressureThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl BackpressureThrottle {
    /// A throttle that applies the tier table
    pub fn new() -> Self {
        BackpressureThrottle {
            chunks: 0,
            enabled: true,
        }
    }

    /// A throttle that only counts chunks
    pub fn disabled() -> Self {
        BackpressureThrottle {
            chunks: 0,
            enabled: false,
        }
    }

    /// Delay for the chunk whose cumulative count is `count` (1-based)
    ///
    /// | count    | delay |
    /// |----------|-------|
    /// | < 20     | 0     |
    /// | 20..120  | 10 ms |
    /// | 120..500 | 20 ms |
    /// | >= 500   | 50 ms |
    pub fn delay_for(count: u64) -> Duration {
        TIERS
            .iter()
            .find(|(min, _)| count >= *min)
            .map(|(_, ms)| Duration::from_millis(*ms))
            .unwrap_or(Duration::ZERO)
    }

    /// Count one chunk and return the delay to apply before sending it
    pub fn next_delay(&mut self) -> Duration {
        self.chunks += 1;
        if !self.enabled {
            return Duration::ZERO;
        }
        Self::delay_for(self.chunks)
    }

    /// Count one chunk and sleep for its delay
    pub async fn pace(&mut self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Chunks counted so far
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Whether delays are applied
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
