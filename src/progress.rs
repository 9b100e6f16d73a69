//! Batch progress shared between workers and the reporting loop.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub extracting: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
    closed: bool,
}

impl Counters {
    pub fn finished(&self) -> usize {
        self.done + self.failed + self.skipped
    }
}

/// Aggregate counters for one batch, updated by workers under a single lock.
#[derive(Debug, Default)]
pub struct Progress {
    counters: Mutex<Counters>,
}

/// How a unit of work ended, from the counters' point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Done,
    Failed,
    Skipped,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        let counters = Counters { total, pending: total, ..Counters::default() };
        Self { counters: Mutex::new(counters) }
    }

    /// Move one unit from pending to active.
    pub fn start(&self) -> Unit<'_> {
        self.update(|c| {
            c.pending = c.pending.saturating_sub(1);
            c.active += 1;
        });
        Unit { progress: self, extracting: false }
    }

    /// Record a unit that ended before `start` was called.
    pub fn finish_pending(&self, finish: Finish) {
        self.update(|c| {
            c.pending = c.pending.saturating_sub(1);
            Self::tally(c, finish);
        });
    }

    pub fn close(&self) {
        self.update(|c| c.closed = true);
    }

    pub fn snapshot(&self) -> Counters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tally(c: &mut Counters, finish: Finish) {
        match finish {
            Finish::Done => c.done += 1,
            Finish::Failed => c.failed += 1,
            Finish::Skipped => c.skipped += 1,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Counters)) {
        let mut guard = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

/// A unit of work that has left the pending state.
pub struct Unit<'a> {
    progress: &'a Progress,
    extracting: bool,
}

impl Unit<'_> {
    pub fn begin_extract(&mut self) {
        if !self.extracting {
            self.extracting = true;
            self.progress.update(|c| {
                c.active = c.active.saturating_sub(1);
                c.extracting += 1;
            });
        }
    }

    pub fn finish(self, finish: Finish) {
        let extracting = self.extracting;
        self.progress.update(|c| {
            if extracting {
                c.extracting = c.extracting.saturating_sub(1);
            } else {
                c.active = c.active.saturating_sub(1);
            }
            Progress::tally(c, finish);
        });
    }
}

/// Run `job` while a separate thread renders `progress` as a progress bar.
pub fn run_with_bar<T>(label: &str, progress: &Progress, job: impl FnOnce() -> T) -> T {
    thread::scope(|scope| {
        let reporter = scope.spawn(|| report_loop(label, progress));
        let output = job();
        progress.close();
        let _ = reporter.join();
        output
    })
}

fn report_loop(label: &str, progress: &Progress) {
    let total = progress.snapshot().total as u64;
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{prefix}: {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_prefix(label.to_string());

    loop {
        let counters = progress.snapshot();
        bar.set_position(counters.finished() as u64);
        bar.set_message(describe(&counters));
        if counters.closed {
            break;
        }
        thread::sleep(REFRESH_INTERVAL);
    }
    bar.finish_and_clear();
}

fn describe(c: &Counters) -> String {
    let mut parts = vec![format!("⋯{}", c.pending), format!("↓{}", c.active)];
    if c.extracting > 0 {
        parts.push(format!("⚙{}", c.extracting));
    }
    parts.push(format!("✓{}", c.done));
    parts.push(format!("✗{}", c.failed));
    parts.join(" ")
}
