//! The single tick source driving the engine
//!
//! A timer exists only while the game is active. Pausing, losing or resetting
//! drops it on the spot, and a speed change swaps it for one with the new period,
//! so there is never more than one live timer.

use log::debug;
use std::future;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::game::{Phase, Speed};

#[derive(Debug, Default)]
pub struct TickScheduler {
    timer: Option<Interval>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self { timer: None }
    }

    /// Whether a timer is currently armed
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Period of the armed timer, if any
    pub fn period(&self) -> Option<Duration> {
        self.timer.as_ref().map(Interval::period)
    }

    /// Bring the timer in line with the engine's phase and speed.
    ///
    /// Must be called after every command and tick. Needs a Tokio runtime when
    /// arming a timer.
    pub fn sync(&mut self, phase: Phase, speed: Speed) {
        if phase != Phase::Active {
            if self.timer.take().is_some() {
                debug!("tick source stopped ({:?})", phase);
            }
            return;
        }

        let period = speed.tick_interval();
        if self.period() == Some(period) {
            return;
        }

        // Drop the old timer before arming the new one
        self.timer = None;

        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        debug!("tick source armed at {:?}", period);
    }

    /// Wait for the next tick. Never resolves while no timer is armed.
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_idle_scheduler_never_ticks() {
        let mut scheduler = TickScheduler::new();
        scheduler.sync(Phase::Idle, Speed::Normal);

        assert!(!scheduler.is_active());
        assert!(timeout(Duration::from_secs(60), scheduler.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_speed_period() {
        let mut scheduler = TickScheduler::new();
        scheduler.sync(Phase::Active, Speed::Hard);
        assert_eq!(scheduler.period(), Some(Duration::from_millis(80)));

        let start = Instant::now();
        scheduler.tick().await;
        let first = start.elapsed();
        scheduler.tick().await;
        let second = start.elapsed();

        assert!(first >= Duration::from_millis(80) && first < Duration::from_millis(160));
        assert!(second >= Duration::from_millis(160) && second < Duration::from_millis(240));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_immediate_tick_on_start() {
        let mut scheduler = TickScheduler::new();
        scheduler.sync(Phase::Active, Speed::Easy);

        assert!(
            timeout(Duration::from_millis(100), scheduler.tick())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_active_stops_timer() {
        let mut scheduler = TickScheduler::new();

        for phase in [Phase::Idle, Phase::Over] {
            scheduler.sync(Phase::Active, Speed::Normal);
            assert!(scheduler.is_active());

            scheduler.sync(phase, Speed::Normal);
            assert!(!scheduler.is_active());
            assert!(timeout(Duration::from_secs(5), scheduler.tick()).await.is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_change_replaces_timer() {
        let mut scheduler = TickScheduler::new();
        scheduler.sync(Phase::Active, Speed::Normal);
        scheduler.sync(Phase::Active, Speed::Easy);

        assert_eq!(scheduler.period(), Some(Duration::from_millis(160)));

        // The replaced 120ms timer must not fire
        assert!(
            timeout(Duration::from_millis(150), scheduler.tick())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_same_speed_keeps_schedule() {
        let mut scheduler = TickScheduler::new();
        let start = Instant::now();
        scheduler.sync(Phase::Active, Speed::Normal);

        tokio::time::advance(Duration::from_millis(100)).await;
        scheduler.sync(Phase::Active, Speed::Normal);
        scheduler.tick().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(120) && elapsed < Duration::from_millis(220));
    }
}
