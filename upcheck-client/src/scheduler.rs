//! Periodic check scheduling.
//!
//! The scheduler fires "period elapsed" notifications anchored to the last
//! successful check. It knows nothing about payloads; the request runner
//! registers as its observer and treats a tick exactly like a manual call.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use upcheck_core::CheckPeriod;

/// Single-method capability notified when a check period elapses.
///
/// The scheduler holds its observer weakly: it never extends the
/// observer's lifetime, and once the observer is gone the timer loop ends
/// on its own.
pub trait PeriodObserver: Send + Sync {
    /// Called once per elapsed period.
    fn period_elapsed(&self);
}

/// Fires periodic "check now" notifications.
///
/// The first fire respects the time already elapsed since the last
/// successful check; every re-arm after that waits the full period from
/// the fire instant, so drift does not compound and elapsed time is never
/// double-counted.
pub struct Scheduler {
    period: CheckPeriod,
    observer: Mutex<Option<Weak<dyn PeriodObserver>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

impl Scheduler {
    /// Creates a scheduler for the given period.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; the scheduler captures
    /// the current handle to run its timer loop on.
    pub fn new(period: CheckPeriod) -> Self {
        Self {
            period,
            observer: Mutex::new(None),
            task: Mutex::new(None),
            runtime: Handle::current(),
        }
    }

    /// Returns the configured period.
    pub fn period(&self) -> CheckPeriod {
        self.period
    }

    /// Registers the observer to notify on each elapsed period.
    pub fn set_observer(&self, observer: Weak<dyn PeriodObserver>) {
        *lock(&self.observer) = Some(observer);
    }

    /// Starts (or restarts) the periodic schedule.
    ///
    /// The first notification fires after
    /// `max(0, period - (now - last_check))`; a client that has never
    /// checked fires immediately. A `Manual` period never arms anything.
    /// Any previously pending wait is cancelled first.
    pub fn start_scheduling(&self, last_check: Option<DateTime<Utc>>) {
        self.cancel();

        let Some(period) = self.period.as_duration() else {
            debug!("Manual period, scheduler stays idle");
            return;
        };

        let Some(observer) = lock(&self.observer).clone() else {
            warn!("No observer registered, scheduler not started");
            return;
        };

        let initial = initial_delay(period, last_check, Utc::now());
        debug!(period = %self.period, ?initial, "Arming scheduler");

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(initial).await;
            loop {
                let Some(observer) = observer.upgrade() else {
                    debug!("Observer gone, stopping scheduler loop");
                    break;
                };
                observer.period_elapsed();
                drop(observer);

                tokio::time::sleep(period).await;
            }
        });

        *lock(&self.task) = Some(task);
    }

    /// Cancels any pending wait; no notification fires afterward.
    pub fn cancel(&self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn initial_delay(
    period: Duration,
    last_check: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    let Some(last) = last_check else {
        return Duration::ZERO;
    };
    // A last check in the future (clock adjustment) counts as zero elapsed.
    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    period.saturating_sub(elapsed)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        fired: AtomicUsize,
    }

    impl CountingObserver {
        fn fired(&self) -> usize {
            self.fired.load(Ordering::SeqCst)
        }
    }

    impl PeriodObserver for CountingObserver {
        fn period_elapsed(&self) {
            self.fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn observed_scheduler(period: CheckPeriod) -> (Scheduler, Arc<CountingObserver>) {
        let observer = Arc::new(CountingObserver::default());
        let scheduler = Scheduler::new(period);
        let weak: Weak<dyn PeriodObserver> =
            Arc::downgrade(&(Arc::clone(&observer) as Arc<dyn PeriodObserver>));
        scheduler.set_observer(weak);
        (scheduler, observer)
    }

    #[test]
    fn initial_delay_subtracts_elapsed_time() {
        let period = Duration::from_secs(3600);
        let now = Utc::now();

        let half_hour_ago = now - chrono::Duration::minutes(30);
        assert_eq!(
            initial_delay(period, Some(half_hour_ago), now),
            Duration::from_secs(1800)
        );
    }

    #[test]
    fn initial_delay_clamps_overdue_checks_to_zero() {
        let period = Duration::from_secs(3600);
        let now = Utc::now();

        let two_hours_ago = now - chrono::Duration::hours(2);
        assert_eq!(initial_delay(period, Some(two_hours_ago), now), Duration::ZERO);
    }

    #[test]
    fn initial_delay_without_last_check_is_zero() {
        assert_eq!(
            initial_delay(Duration::from_secs(3600), None, Utc::now()),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_fire_respects_elapsed_time() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Hourly);
        scheduler.start_scheduling(Some(Utc::now() - chrono::Duration::minutes(30)));
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 0);

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearms_with_full_period_and_no_drift() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Hourly);
        scheduler.start_scheduling(Some(Utc::now() - chrono::Duration::minutes(30)));
        tokio::task::yield_now().await;

        // First fire after the remaining 30 minutes.
        tokio::time::advance(Duration::from_secs(31 * 60)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 1);

        // Then once per full hour, anchored to the fire instant.
        for expected in 2..=4 {
            tokio::time::advance(Duration::from_secs(3600)).await;
            tokio::task::yield_now().await;
            assert_eq!(observer.fired(), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_checked_fires_immediately() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Daily);
        scheduler.start_scheduling(None);

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_period_never_fires() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Manual);
        scheduler.start_scheduling(None);

        tokio::time::advance(Duration::from_secs(90 * 24 * 3600)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_wait() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Hourly);
        scheduler.start_scheduling(Some(Utc::now()));
        drop(scheduler);

        tokio::time::advance(Duration::from_secs(2 * 3600)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_observer_ends_the_loop() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Hourly);
        scheduler.start_scheduling(None);

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 1);

        drop(observer);
        // Nothing to assert against once the observer is gone; the loop
        // must simply not panic or leak fires into freed state.
        tokio::time::advance(Duration::from_secs(2 * 3600)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_pending_wait() {
        let (scheduler, observer) = observed_scheduler(CheckPeriod::Hourly);
        scheduler.start_scheduling(Some(Utc::now()));
        tokio::task::yield_now().await;

        // Restart with a fresh anchor before the first wait expires.
        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        scheduler.start_scheduling(Some(Utc::now()));
        tokio::task::yield_now().await;

        // The original wait would have fired here; the restarted one must not.
        tokio::time::advance(Duration::from_secs(31 * 60)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 0);

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        tokio::task::yield_now().await;
        assert_eq!(observer.fired(), 1);
    }
}
