//! Daily trigger scheduler.
//!
//! The scheduler is either idle or running a job. It checks the trigger at a
//! fixed poll interval and runs the job when the wall clock has passed the
//! next due time, then reschedules for the following day. A
//! [`CancellationToken`] stops the loop; a job already in progress is allowed
//! to finish first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Work the scheduler triggers. Implementations handle their own errors.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    async fn run(&self);
}

/// Fires once a day at a fixed local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    at: NaiveTime,
}

impl DailyTrigger {
    pub const fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub const fn at(&self) -> NaiveTime {
        self.at
    }

    /// First trigger instant strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + chrono::Duration::days(1)
        }
    }
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Runs a job every day at the trigger time.
pub struct Scheduler<J> {
    job: J,
    trigger: DailyTrigger,
    poll_interval: Duration,
    next_run: Option<NaiveDateTime>,
    state: SchedulerState,
    clock: Clock,
}

impl<J: ScheduledJob> Scheduler<J> {
    /// Create a scheduler reading local wall-clock time.
    pub fn new(job: J, trigger: DailyTrigger, poll_interval: Duration) -> Self {
        Self {
            job,
            trigger,
            poll_interval,
            next_run: None,
            state: SchedulerState::Idle,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Next due instant, once the first tick has happened.
    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.next_run
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    /// Check the trigger at `now` and run the job if it is due.
    ///
    /// The first call only arms the trigger. Returns whether the job ran.
    pub async fn tick(&mut self, now: NaiveDateTime) -> bool {
        let next = *self
            .next_run
            .get_or_insert_with(|| self.trigger.next_after(now));
        if now < next {
            return false;
        }

        tracing::info!(job = self.job.name(), due = %next, "Trigger fired");
        self.state = SchedulerState::Running;
        self.job.run().await;
        self.state = SchedulerState::Idle;

        let next = self.trigger.next_after(now);
        self.next_run = Some(next);
        tracing::info!(job = self.job.name(), next = %next, "Job finished");
        true
    }

    /// Poll until `cancel` is triggered.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            job = self.job.name(),
            at = %self.trigger.at(),
            poll_interval_secs = self.poll_interval.as_secs_f64(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(job = self.job.name(), "Scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    let now = (self.clock)();
                    self.tick(now).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
        cancel_on_run: Option<CancellationToken>,
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = &self.cancel_on_run {
                token.cancel();
            }
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_time(at(h, m))
    }

    #[test]
    fn test_next_after() {
        let trigger = DailyTrigger::new(at(8, 0));
        assert_eq!(trigger.next_after(day(1, 7, 59)), day(1, 8, 0));
        assert_eq!(trigger.next_after(day(1, 8, 0)), day(2, 8, 0));
        assert_eq!(trigger.next_after(day(1, 23, 0)), day(2, 8, 0));
    }

    #[tokio::test]
    async fn test_tick_fires_once_per_day() {
        let mut scheduler = Scheduler::new(
            CountingJob::default(),
            DailyTrigger::new(at(8, 0)),
            Duration::from_secs(60),
        );

        assert!(!scheduler.tick(day(1, 7, 58)).await);
        assert_eq!(scheduler.next_run(), Some(day(1, 8, 0)));
        assert!(!scheduler.tick(day(1, 7, 59)).await);
        assert!(scheduler.tick(day(1, 8, 0)).await);
        assert!(!scheduler.tick(day(1, 8, 1)).await);
        assert!(!scheduler.tick(day(1, 20, 0)).await);
        assert_eq!(scheduler.next_run(), Some(day(2, 8, 0)));
        assert!(scheduler.tick(day(2, 8, 1)).await);

        assert_eq!(scheduler.job().runs.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_starting_after_trigger_waits_for_next_day() {
        let mut scheduler = Scheduler::new(
            CountingJob::default(),
            DailyTrigger::new(at(8, 0)),
            Duration::from_secs(60),
        );

        assert!(!scheduler.tick(day(1, 9, 0)).await);
        assert_eq!(scheduler.next_run(), Some(day(2, 8, 0)));
        assert_eq!(scheduler.job().runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut scheduler = Scheduler::new(
            CountingJob::default(),
            DailyTrigger::new(at(8, 0)),
            Duration::from_millis(5),
        );
        scheduler.run(cancel).await;

        assert_eq!(scheduler.job().runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_fires_job_from_clock() {
        let cancel = CancellationToken::new();
        let job = CountingJob {
            cancel_on_run: Some(cancel.clone()),
            ..Default::default()
        };

        // Each poll advances the clock by one minute, starting 07:57.
        let minutes = Arc::new(AtomicI64::new(0));
        let clock_minutes = minutes.clone();
        let mut scheduler = Scheduler::new(job, DailyTrigger::new(at(8, 0)), Duration::from_millis(5))
            .with_clock(move || {
                let n = clock_minutes.fetch_add(1, Ordering::SeqCst);
                day(1, 7, 57) + chrono::Duration::minutes(n)
            });

        tokio::time::timeout(Duration::from_secs(5), scheduler.run(cancel))
            .await
            .expect("scheduler did not stop");

        assert_eq!(scheduler.job().runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.next_run(), Some(day(2, 8, 0)));
        assert_eq!(minutes.load(Ordering::SeqCst), 4);
    }
}
