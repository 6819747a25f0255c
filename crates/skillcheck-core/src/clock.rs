//! Elapsed-time formatting and the one-second display ticker.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Format milliseconds as `mm:ss` (minutes keep growing past 59).
pub fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Republishes elapsed time once per second.
///
/// Holds only a copy of the start instant, so it can never affect the
/// session it is displaying.
pub struct ElapsedTicker {
    started: Instant,
    interval: Interval,
}

impl ElapsedTicker {
    pub fn new(started: Instant) -> Self {
        let period = Duration::from_secs(1);
        let mut interval = interval_at(started + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { started, interval }
    }

    /// Wait for the next tick and return the formatted elapsed time.
    pub async fn tick(&mut self) -> String {
        let now = self.interval.tick().await;
        format_elapsed(now.duration_since(self.started).as_millis() as u64)
    }

    /// Formatted elapsed time right now, without waiting.
    pub fn now(&self) -> String {
        format_elapsed(self.started.elapsed().as_millis() as u64)
    }
}
