//! Pacing of a [Search]: run it back to back, one iteration per time interval, or one
//! iteration per external step signal. The schedule only decides *when* the next
//! iteration may run; every mode executes the same [Search::step].

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::grid::Grid;
use crate::search::{PathResult, Search, SearchStep};
use crate::solver::GridSolver;

/// Longest a manual schedule blocks before rechecking for cancellation.
const MANUAL_POLL: Duration = Duration::from_millis(50);

/// How a search is paced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepMode {
    #[default]
    Immediate,
    /// One iteration, then wait this long before the next.
    FixedDelay(Duration),
    /// One iteration per [StepSignal::signal].
    Manual,
}

impl StepMode {
    /// The schedule for this mode. `signal` is only used by [StepMode::Manual].
    pub fn schedule(self, signal: &StepSignal) -> Box<dyn StepSchedule + Send> {
        match self {
            StepMode::Immediate => Box::new(Immediate),
            StepMode::FixedDelay(delay) => Box::new(FixedDelay::new(delay)),
            StepMode::Manual => Box::new(Manual::new(signal.clone())),
        }
    }
}

/// Decides how many search iterations may run at a given moment.
pub trait StepSchedule {
    /// Iterations allowed at `now`. Calling this consumes the allowance.
    fn permits(&mut self, now: Instant) -> usize;

    /// Blocks until another iteration might be allowed, or briefly if that cannot be known.
    fn wait(&self, now: Instant);
}

/// Runs every iteration as soon as possible.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl StepSchedule for Immediate {
    fn permits(&mut self, _: Instant) -> usize {
        usize::MAX
    }
    fn wait(&self, _: Instant) {}
}

/// Runs one iteration, then holds off for `delay`.
#[derive(Clone, Copy, Debug)]
pub struct FixedDelay {
    delay: Duration,
    next_due: Option<Instant>,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> FixedDelay {
        FixedDelay {
            delay,
            next_due: None,
        }
    }
}

impl StepSchedule for FixedDelay {
    fn permits(&mut self, now: Instant) -> usize {
        match self.next_due {
            Some(due) if now < due => 0,
            _ => {
                self.next_due = Some(now + self.delay);
                1
            }
        }
    }
    fn wait(&self, now: Instant) {
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
    }
}

/// A cloneable "advance one step" button. Presses are counted, so two presses
/// before the controller gets to run allow two iterations.
#[derive(Clone, Debug, Default)]
pub struct StepSignal {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

impl StepSignal {
    pub fn new() -> StepSignal {
        StepSignal::default()
    }

    pub fn signal(&self) {
        let (pending, ready) = &*self.inner;
        if let Ok(mut pending) = pending.lock() {
            *pending += 1;
            ready.notify_all();
        }
    }

    /// Presses not yet consumed.
    pub fn pending(&self) -> usize {
        self.inner.0.lock().map(|p| *p).unwrap_or(0)
    }

    /// Consumes and returns every pending press.
    pub(crate) fn take(&self) -> usize {
        self.inner
            .0
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or(0)
    }

    fn wait_timeout(&self, timeout: Duration) {
        let (pending, ready) = &*self.inner;
        if let Ok(guard) = pending.lock() {
            let _ = ready.wait_timeout_while(guard, timeout, |p| *p == 0);
        }
    }
}

/// One iteration per external signal.
#[derive(Clone, Debug)]
pub struct Manual {
    signal: StepSignal,
}

impl Manual {
    pub fn new(signal: StepSignal) -> Manual {
        Manual { signal }
    }
}

impl StepSchedule for Manual {
    fn permits(&mut self, _: Instant) -> usize {
        self.signal.take()
    }
    fn wait(&self, _: Instant) {
        self.signal.wait_timeout(MANUAL_POLL);
    }
}

/// Shared cancellation flag of a running search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Where a paced search stands after [SteppingController::advance].
#[derive(Clone, Debug, PartialEq)]
pub enum SearchProgress {
    /// Waiting for the schedule to allow more iterations.
    Pending,
    Complete(PathResult),
    /// Aborted through [SteppingController::cancel]; no path is produced.
    Cancelled,
}

/// Drives a [Search] according to a [StepSchedule].
pub struct SteppingController<S> {
    search: Search<S>,
    schedule: Box<dyn StepSchedule + Send>,
    cancel: CancelToken,
    finished: Option<SearchProgress>,
}

impl<S: GridSolver> SteppingController<S> {
    pub fn new(search: Search<S>, schedule: Box<dyn StepSchedule + Send>) -> Self {
        SteppingController {
            search,
            schedule,
            cancel: CancelToken::new(),
            finished: None,
        }
    }

    pub fn search(&self) -> &Search<S> {
        &self.search
    }

    /// True until the search completes or is cancelled.
    pub fn is_running(&self) -> bool {
        self.finished.is_none() && !self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this search from elsewhere, e.g. another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs as many iterations as the schedule allows at `now`.
    pub fn advance<H>(&mut self, grid: &Grid<H>, now: Instant) -> SearchProgress {
        if let Some(finished) = &self.finished {
            return finished.clone();
        }
        let mut allowed = self.schedule.permits(now);
        while allowed > 0 {
            if self.cancel.is_cancelled() {
                info!(
                    "Search cancelled after {} iterations",
                    self.search.iterations()
                );
                self.finished = Some(SearchProgress::Cancelled);
                return SearchProgress::Cancelled;
            }
            if let SearchStep::Complete(result) = self.search.step(grid) {
                let progress = SearchProgress::Complete(result);
                self.finished = Some(progress.clone());
                return progress;
            }
            allowed -= 1;
        }
        if self.cancel.is_cancelled() {
            self.finished = Some(SearchProgress::Cancelled);
            return SearchProgress::Cancelled;
        }
        SearchProgress::Pending
    }

    /// Blocks the calling thread until the search completes or is cancelled. Manual
    /// schedules need another thread pressing the [StepSignal].
    pub fn run_blocking<H>(&mut self, grid: &Grid<H>) -> SearchProgress {
        loop {
            let progress = self.advance(grid, Instant::now());
            if progress != SearchProgress::Pending {
                return progress;
            }
            debug!("Waiting for next step");
            self.schedule.wait(Instant::now());
        }
    }
}
