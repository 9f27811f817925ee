use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Instant;

/// Wall-clock timestamps that advance with the tokio clock, so a paused
/// runtime drives incident timing in tests.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    anchor_utc: DateTime<Utc>,
    anchor: Instant,
}

impl RuntimeClock {
    pub fn start() -> Self {
        Self {
            anchor_utc: Utc::now(),
            anchor: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = ChronoDuration::from_std(self.anchor.elapsed())
            .unwrap_or_else(|_| ChronoDuration::zero());
        self.anchor_utc + elapsed
    }
}
