//! Repeating timers that tick playback drivers.
//!
//! The playback core only needs one thing from a timer: call a task over
//! and over at a fixed period until the task answers
//! [`ControlFlow::Break`]. Three implementations are provided:
//!
//! - [`ManualTimer`] runs due tasks whenever the host calls
//!   [`ManualTimer::run_pending`], for hosts that own a single event loop.
//! - [`ThreadTimer`] gives every task its own background thread.
//! - `TokioTimer` (feature `tokio`) spawns every task on a tokio runtime.
//!
//! Every implementation invokes a given task serially, never from two
//! threads at once.

use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::TimerError;

/// Smallest period a timer will tick at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Work invoked once per timer tick.
pub trait RepeatingTask: Send {
    /// Run one tick. `Break` asks the timer to never run this task again.
    fn run(&mut self) -> ControlFlow<()>;
}

impl<F> RepeatingTask for F
where
    F: FnMut() -> ControlFlow<()> + Send,
{
    fn run(&mut self) -> ControlFlow<()> {
        self()
    }
}

/// A service that runs [`RepeatingTask`]s periodically.
pub trait RepeatingTimer {
    /// Handle returned for every scheduled task.
    type Handle;
    /// Scheduling failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `task` first after `initial_delay`, then every `period` until it
    /// breaks or the handle is cancelled.
    fn schedule(
        &self,
        task: Box<dyn RepeatingTask>,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<Self::Handle, Self::Error>;
}

/// Stop flag a timer waits on between ticks.
///
/// Waiting wakes up early as soon as [`stop`](Self::stop) is called.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        // wait_timeout_while loops over spurious wakeups for us
        let (stopped, _) = cvar
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

/// Cancellation and completion state shared between a timer and a handle.
#[derive(Clone, Debug, Default)]
struct TaskStatus {
    stop: StopSignal,
    finished: Arc<AtomicBool>,
}

impl TaskStatus {
    fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Marks a task finished when dropped, including while unwinding.
struct FinishOnDrop(TaskStatus);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

struct ManualEntry {
    task: Box<dyn RepeatingTask>,
    next_due: Instant,
    period: Duration,
    status: TaskStatus,
}

/// Timer driven by the host's own loop.
///
/// Nothing runs until the host calls [`run_pending`](Self::run_pending);
/// each call runs every task whose next tick is due, in scheduling order.
/// A task that breaks, panics, or whose handle was cancelled, is dropped;
/// the other tasks keep their schedule.
#[derive(Default)]
pub struct ManualTimer {
    tasks: Mutex<Vec<ManualEntry>>,
}

impl std::fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTimer")
            .field("tasks", &self.len())
            .finish()
    }
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every due task once. Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        self.run_pending_at(Instant::now())
    }

    /// Same as [`run_pending`](Self::run_pending) with an explicit clock reading.
    pub fn run_pending_at(&self, now: Instant) -> usize {
        // Tasks run outside the lock so they may schedule more work.
        let mut tasks = std::mem::take(&mut *self.lock());
        let mut ran = 0;

        tasks.retain_mut(|entry| {
            if entry.status.stop.is_stopped() {
                entry.status.finish();
                return false;
            }
            if now < entry.next_due {
                return true;
            }

            ran += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| entry.task.run())) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => {
                    entry.status.finish();
                    return false;
                }
                Err(_) => {
                    tracing::error!("repeating task panicked, dropping it");
                    entry.status.finish();
                    return false;
                }
            }

            entry.next_due += entry.period;
            if entry.next_due <= now {
                entry.next_due = now + entry.period;
            }
            true
        });

        let mut guard = self.lock();
        tasks.append(&mut guard);
        *guard = tasks;
        ran
    }

    /// Number of tasks still scheduled.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ManualEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RepeatingTimer for ManualTimer {
    type Handle = ManualHandle;
    type Error = std::convert::Infallible;

    fn schedule(
        &self,
        task: Box<dyn RepeatingTask>,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<ManualHandle, Self::Error> {
        let status = TaskStatus::default();
        self.lock().push(ManualEntry {
            task,
            next_due: Instant::now() + initial_delay,
            period,
            status: status.clone(),
        });
        Ok(ManualHandle { status })
    }
}

/// Handle to a task scheduled on a [`ManualTimer`].
#[derive(Clone, Debug)]
pub struct ManualHandle {
    status: TaskStatus,
}

impl ManualHandle {
    /// Drop the task on the next [`ManualTimer::run_pending`].
    pub fn cancel(&self) {
        self.status.stop.stop();
    }

    /// Whether the timer has let go of the task.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }
}

/// Timer that runs each task on its own background thread.
#[derive(Clone, Debug)]
pub struct ThreadTimer {
    thread_name: String,
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::named("keyframe-timer")
    }

    /// Name given to spawned threads.
    pub fn named(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
        }
    }
}

impl RepeatingTimer for ThreadTimer {
    type Handle = ThreadHandle;
    type Error = TimerError;

    fn schedule(
        &self,
        mut task: Box<dyn RepeatingTask>,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<ThreadHandle, TimerError> {
        let period = period.max(MIN_PERIOD);
        let status = TaskStatus::default();
        let thread_status = status.clone();

        let thread = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                let _finished = FinishOnDrop(thread_status.clone());
                let stop = &thread_status.stop;
                if !stop.wait_timeout(initial_delay) {
                    let mut ticks: u64 = 0;
                    loop {
                        ticks += 1;
                        if task.run().is_break() {
                            tracing::trace!(ticks, "repeating task finished");
                            break;
                        }
                        if stop.wait_timeout(period) {
                            tracing::trace!(ticks, "repeating task cancelled");
                            break;
                        }
                    }
                }
            })
            .map_err(TimerError::Spawn)?;

        Ok(ThreadHandle {
            status,
            thread: Some(thread),
        })
    }
}

/// Handle to a task running on a [`ThreadTimer`].
///
/// Dropping the handle detaches the thread; the task keeps running until
/// it breaks.
#[derive(Debug)]
pub struct ThreadHandle {
    status: TaskStatus,
    thread: Option<thread::JoinHandle<()>>,
}

impl ThreadHandle {
    /// Stop the task before its next tick.
    pub fn cancel(&self) {
        self.status.stop.stop();
    }

    /// Check if the thread has let go of the task.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Block until the task stops.
    pub fn join(mut self) -> Result<(), TimerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| TimerError::TaskPanicked),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "tokio")]
pub use self::runtime::{TokioHandle, TokioTimer};

#[cfg(feature = "tokio")]
mod runtime {
    use std::time::Duration;

    use tokio::runtime::{Handle, TryCurrentError};
    use tokio::task::{JoinError, JoinHandle};
    use tokio::time::MissedTickBehavior;
    use tokio_util::sync::CancellationToken;

    use super::{RepeatingTask, RepeatingTimer, MIN_PERIOD};

    /// Timer that spawns each task on a tokio runtime.
    #[derive(Clone, Debug)]
    pub struct TokioTimer {
        runtime: Handle,
    }

    impl TokioTimer {
        /// Use the runtime the caller is running on.
        pub fn current() -> Result<Self, TryCurrentError> {
            Handle::try_current().map(Self::with_handle)
        }

        pub fn with_handle(runtime: Handle) -> Self {
            Self { runtime }
        }
    }

    impl RepeatingTimer for TokioTimer {
        type Handle = TokioHandle;
        type Error = std::convert::Infallible;

        fn schedule(
            &self,
            mut task: Box<dyn RepeatingTask>,
            initial_delay: Duration,
            period: Duration,
        ) -> Result<TokioHandle, Self::Error> {
            let token = CancellationToken::new();
            let cancelled = token.clone();
            let start = tokio::time::Instant::now() + initial_delay;

            let join = self.runtime.spawn(async move {
                let mut interval = tokio::time::interval_at(start, period.max(MIN_PERIOD));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    let Some(_tick) = cancelled.run_until_cancelled(interval.tick()).await else {
                        tracing::trace!("repeating task cancelled");
                        break;
                    };

                    if task.run().is_break() {
                        tracing::trace!("repeating task finished");
                        break;
                    }
                }
            });

            Ok(TokioHandle { token, join })
        }
    }

    /// Handle to a task spawned by a [`TokioTimer`].
    #[derive(Debug)]
    pub struct TokioHandle {
        token: CancellationToken,
        join: JoinHandle<()>,
    }

    impl TokioHandle {
        pub fn cancel(&self) {
            self.token.cancel();
        }

        pub fn is_finished(&self) -> bool {
            self.join.is_finished()
        }

        /// Wait until the task stops.
        pub async fn join(self) -> Result<(), JoinError> {
            self.join.await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(limit: usize) -> (Arc<AtomicUsize>, Box<dyn RepeatingTask>) {
        let count = Arc::new(AtomicUsize::new(0));
        let task_count = count.clone();
        let task = move || {
            let seen = task_count.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        (count, Box::new(task))
    }

    #[test]
    fn test_stop_signal_wait_returns_true_when_stopped() {
        let signal = StopSignal::new();
        assert!(!signal.is_stopped());
        signal.stop();
        assert!(signal.is_stopped());
        assert!(signal.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_stop_signal_wait_returns_false_on_timeout() {
        let signal = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_manual_timer_respects_period() {
        let timer = ManualTimer::new();
        let (count, task) = counting_task(usize::MAX);
        timer
            .schedule(task, Duration::ZERO, Duration::from_millis(50))
            .unwrap();

        let t0 = Instant::now();
        assert_eq!(timer.run_pending_at(t0), 1);
        assert_eq!(timer.run_pending_at(t0 + Duration::from_millis(10)), 0);
        assert_eq!(timer.run_pending_at(t0 + Duration::from_millis(60)), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_manual_timer_drops_finished_tasks() {
        let timer = ManualTimer::new();
        let (count, task) = counting_task(2);
        let handle = timer.schedule(task, Duration::ZERO, Duration::ZERO).unwrap();

        let far = Instant::now() + Duration::from_secs(1);
        timer.run_pending_at(far);
        assert!(!handle.is_finished());
        timer.run_pending_at(far + Duration::from_secs(1));

        assert!(handle.is_finished());
        assert!(timer.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_manual_timer_survives_panicking_task() {
        let timer = ManualTimer::new();
        let (count, healthy) = counting_task(usize::MAX);
        let healthy = timer.schedule(healthy, Duration::ZERO, Duration::ZERO).unwrap();
        let faulty = timer
            .schedule(
                Box::new(|| -> ControlFlow<()> { panic!("renderer bug") }),
                Duration::ZERO,
                Duration::ZERO,
            )
            .unwrap();

        let far = Instant::now() + Duration::from_secs(1);
        assert_eq!(timer.run_pending_at(far), 2);
        assert!(faulty.is_finished());
        assert!(!healthy.is_finished());
        assert_eq!(timer.len(), 1);

        timer.run_pending_at(far + Duration::from_secs(1));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_manual_timer_cancel() {
        let timer = ManualTimer::new();
        let (count, task) = counting_task(usize::MAX);
        let handle = timer.schedule(task, Duration::ZERO, Duration::ZERO).unwrap();
        handle.cancel();

        assert_eq!(timer.run_pending_at(Instant::now() + Duration::from_secs(1)), 0);
        assert!(handle.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(timer.len(), 0);
    }

    #[test]
    fn test_thread_timer_runs_until_break() {
        let timer = ThreadTimer::new();
        let (count, task) = counting_task(3);
        let handle = timer
            .schedule(task, Duration::ZERO, Duration::from_millis(1))
            .unwrap();

        handle.join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_thread_timer_cancel_stops_task() {
        let timer = ThreadTimer::named("cancel-test");
        let (count, task) = counting_task(usize::MAX);
        let handle = timer
            .schedule(task, Duration::from_secs(60), Duration::from_millis(1))
            .unwrap();

        handle.cancel();
        handle.join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_thread_timer_reports_panics() {
        let timer = ThreadTimer::new();
        let task = || -> ControlFlow<()> { panic!("render blew up") };
        let handle = timer
            .schedule(Box::new(task), Duration::ZERO, Duration::from_millis(1))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.is_finished());
        assert!(matches!(handle.join(), Err(TimerError::TaskPanicked)));
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_tokio_timer_runs_until_break() {
        let timer = TokioTimer::current().unwrap();
        let (count, task) = counting_task(3);
        let handle = timer
            .schedule(task, Duration::ZERO, Duration::from_millis(1))
            .unwrap();

        handle.join().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_tokio_timer_cancel() {
        let timer = TokioTimer::current().unwrap();
        let (count, task) = counting_task(usize::MAX);
        let handle = timer
            .schedule(task, Duration::from_secs(60), Duration::from_millis(1))
            .unwrap();

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
