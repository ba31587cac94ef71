use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_CHECK_INTERVAL_SECS;
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::notify::Notifier;
use crate::tracker::{CycleReport, PriceTracker};

/// Time source for timestamps and the sleep between checks.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
    async fn sleep(&self, dur: Duration);
}

/// Local wall-clock time and real tokio sleeps.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Checking,
    Sleeping(Duration),
}

/// Drives the tracker: one immediate check, then sleep/check until cancelled.
pub struct Scheduler<S, N, C> {
    tracker: PriceTracker<S, N>,
    clock: C,
    shutdown: CancellationToken,
}

impl<S: PageSource, N: Notifier, C: Clock> Scheduler<S, N, C> {
    pub fn new(tracker: PriceTracker<S, N>, clock: C, shutdown: CancellationToken) -> Self {
        Self {
            tracker,
            clock,
            shutdown,
        }
    }

    /// Exactly one check, no sleeping.
    pub async fn run_once(&self) -> Result<CycleReport> {
        self.tracker.run_cycle(self.clock.now()).await
    }

    /// Loop until the shutdown token fires. Cancellation is only observed
    /// between cycles and while sleeping. Returns the number of checks run.
    pub async fn run_loop(&self) -> u64 {
        let mut state = SchedulerState::Idle;
        let mut interval = Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS);
        let mut cycles = 0u64;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            debug!(?state, "scheduler step");

            state = match state {
                SchedulerState::Idle => SchedulerState::Checking,
                SchedulerState::Checking => {
                    cycles += 1;
                    match self.tracker.run_cycle(self.clock.now()).await {
                        Ok(report) => interval = effective_interval(report.check_interval),
                        Err(e) => error!("Unexpected error during price check: {e}"),
                    }
                    SchedulerState::Sleeping(interval)
                }
                SchedulerState::Sleeping(dur) => {
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break,
                        _ = self.clock.sleep(dur) => SchedulerState::Checking,
                    }
                }
            };
        }

        info!("Price tracker stopped after {cycles} checks");
        cycles
    }
}

/// A zero interval would spin; fall back to the default instead.
fn effective_interval(secs: u64) -> Duration {
    if secs == 0 {
        warn!("check_interval is 0; using default of {DEFAULT_CHECK_INTERVAL_SECS}s");
        Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS)
    } else {
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use crate::config::ScrapeConfig;
    use crate::fetcher::{HttpPageSource, PriceFetcher};
    use crate::state::ConfigStore;
    use crate::test_support::{product_page, serve, RecordingNotifier};
    use crate::types::TrackerConfig;

    /// Records requested sleeps and returns immediately. Cancels `shutdown`
    /// once `stop_after` sleeps have been requested.
    struct FakeClock {
        sleeps: Arc<Mutex<Vec<Duration>>>,
        stop_after: usize,
        shutdown: CancellationToken,
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
        }

        async fn sleep(&self, dur: Duration) {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(dur);
            if sleeps.len() >= self.stop_after {
                self.shutdown.cancel();
            }
        }
    }

    async fn tracker(
        dir: &tempfile::TempDir,
        interval: u64,
    ) -> (PriceTracker<HttpPageSource, Arc<RecordingNotifier>>, Arc<RecordingNotifier>) {
        let store = ConfigStore::new(dir.path().join("price_config.json"));
        let mut cfg = TrackerConfig::default();
        cfg.check_interval = interval;
        store.save(&cfg).await.unwrap();

        let base = serve(product_page(r#"<span class="price">$1,500.00</span>"#)).await;
        let scrape = ScrapeConfig {
            urls: vec![format!("{base}/product")],
            ..ScrapeConfig::default()
        };
        let source = HttpPageSource::new(&scrape).unwrap();
        let fetcher = PriceFetcher::new(scrape, source).unwrap();
        let notifier = Arc::new(RecordingNotifier::new(true));
        (PriceTracker::new(store, fetcher, Arc::clone(&notifier)), notifier)
    }

    /// The returned handle sees every sleep the clock records.
    fn fake_clock(
        stop_after: usize,
        shutdown: &CancellationToken,
    ) -> (FakeClock, Arc<Mutex<Vec<Duration>>>) {
        let sleeps = Arc::new(Mutex::new(Vec::new()));
        let clock = FakeClock {
            sleeps: Arc::clone(&sleeps),
            stop_after,
            shutdown: shutdown.clone(),
        };
        (clock, sleeps)
    }

    #[tokio::test]
    async fn one_shot_runs_a_single_cycle_without_sleeping() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker, _) = tracker(&dir, 60).await;
        let shutdown = CancellationToken::new();
        let (clock, sleeps) = fake_clock(usize::MAX, &shutdown);
        let scheduler = Scheduler::new(tracker, clock, shutdown);

        let report = scheduler.run_once().await.unwrap();
        assert!(report.decision.is_some());
        assert!(sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn loop_sleeps_configured_interval_between_checks() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker, _) = tracker(&dir, 90).await;
        let shutdown = CancellationToken::new();
        let (clock, sleeps) = fake_clock(3, &shutdown);
        let scheduler = Scheduler::new(tracker, clock, shutdown);

        let cycles = scheduler.run_loop().await;
        assert_eq!(cycles, 3);
        assert_eq!(
            *sleeps.lock().unwrap(),
            vec![Duration::from_secs(90); 3]
        );
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker, notifier) = tracker(&dir, 60).await;
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (clock, sleeps) = fake_clock(usize::MAX, &shutdown);
        let scheduler = Scheduler::new(tracker, clock, shutdown);

        assert_eq!(scheduler.run_loop().await, 0);
        assert_eq!(notifier.count(), 0);
        assert!(sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_cycle_does_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("gone").join("price_config.json"));
        let base = serve(product_page(r#"<span class="price">$1,500.00</span>"#)).await;
        let scrape = ScrapeConfig {
            urls: vec![format!("{base}/product")],
            ..ScrapeConfig::default()
        };
        let source = HttpPageSource::new(&scrape).unwrap();
        let fetcher = PriceFetcher::new(scrape, source).unwrap();
        let tracker = PriceTracker::new(store, fetcher, RecordingNotifier::new(true));

        let shutdown = CancellationToken::new();
        let (clock, sleeps) = fake_clock(2, &shutdown);
        let scheduler = Scheduler::new(tracker, clock, shutdown);

        assert_eq!(scheduler.run_loop().await, 2);
        assert_eq!(
            *sleeps.lock().unwrap(),
            vec![Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS); 2]
        );
    }

    #[test]
    fn zero_interval_uses_default() {
        assert_eq!(
            effective_interval(0),
            Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS)
        );
        assert_eq!(effective_interval(45), Duration::from_secs(45));
    }
}
