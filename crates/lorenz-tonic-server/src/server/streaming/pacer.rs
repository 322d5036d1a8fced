use core::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};

/// Capacity-1 rate limiter governing point emission.
///
/// Built on a tokio [`Interval`] with [`MissedTickBehavior::Delay`],
/// which gives the same observable behavior as a token bucket with
/// burst size 1: the first permit is granted immediately, and after a
/// stall (a slow client backpressuring the send) at most one permit is
/// granted at once before the schedule resets to a full period. The
/// emission rate therefore never exceeds the configured target, at the
/// cost of up to one period of jitter after a stall.
///
/// Each await on [`pace`](Self::pace) blocks for at most one period, so
/// callers that `select!` it against a cancellation signal observe
/// cancellation within one period.
pub struct Pacer {
    interval: Interval,
}

impl Pacer {
    /// Creates a pacer granting permits at `rate_hz` per second.
    pub fn new(rate_hz: u32) -> Self {
        debug_assert!(rate_hz > 0);
        let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Waits until the next send is allowed.
    pub async fn pace(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, advance};

    #[tokio::test(start_paused = true)]
    async fn first_permit_is_immediate() {
        let mut pacer = Pacer::new(100);
        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_matches_the_target_period() {
        let mut pacer = Pacer::new(100);
        pacer.pace().await;

        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(Instant::now() - before, Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn stall_grants_at_most_one_immediate_permit() {
        let mut pacer = Pacer::new(100);
        pacer.pace().await;

        // Simulate a long send stall: several periods elapse without
        // the pacer being polled.
        advance(Duration::from_millis(55)).await;

        // One catch-up permit, then the schedule resets to a full
        // period. No burst of backlogged permits.
        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(Instant::now(), before);

        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(Instant::now() - before, Duration::from_millis(10));
    }
}
