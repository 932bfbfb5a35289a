use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::data::grouping::{group, GroupingError};
use crate::data::model::{Group, Record};
use crate::data::tolerance::ToleranceSet;

// ---------------------------------------------------------------------------
// Background grouping
// ---------------------------------------------------------------------------

/// Result of one finished grouping pass.
#[derive(Debug)]
pub struct GroupingOutcome {
    pub generation: u64,
    pub tolerances: ToleranceSet,
    pub result: Result<Vec<Group>, GroupingError>,
}

/// A queued pass.
struct Job {
    generation: u64,
    records: Arc<[Record]>,
    tolerances: ToleranceSet,
}

/// Runs grouping passes on one long-lived thread off the UI thread.
///
/// Each submission gets a new generation number. The thread only ever runs
/// the newest queued job; anything queued behind it is skipped. A pass that
/// has started always runs to completion; if a newer submission arrived
/// meanwhile, its result is silently dropped by [`GroupingWorker::poll`].
pub struct GroupingWorker {
    jobs: Sender<Job>,
    rx: Receiver<GroupingOutcome>,
    latest: Arc<AtomicU64>,
    busy: bool,
}

impl Default for GroupingWorker {
    fn default() -> Self {
        let (jobs, job_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(0));

        let current = Arc::clone(&latest);
        // Exits once `jobs` is dropped together with the worker.
        thread::spawn(move || worker_loop(job_rx, tx, current));

        Self {
            jobs,
            rx,
            latest,
            busy: false,
        }
    }
}

/// Collapse everything already queued behind `job` down to the newest one.
fn newest_job(mut job: Job, queue: &Receiver<Job>) -> Job {
    while let Ok(next) = queue.try_recv() {
        log::debug!("Skipping queued grouping pass #{}", job.generation);
        job = next;
    }
    job
}

fn worker_loop(queue: Receiver<Job>, tx: Sender<GroupingOutcome>, latest: Arc<AtomicU64>) {
    while let Ok(job) = queue.recv() {
        let job = newest_job(job, &queue);
        if job.generation != latest.load(Ordering::Acquire) {
            log::debug!("Skipping abandoned grouping pass #{}", job.generation);
            continue;
        }
        let result = group(&job.records, &job.tolerances);
        let outcome = GroupingOutcome {
            generation: job.generation,
            tolerances: job.tolerances,
            result,
        };
        if tx.send(outcome).is_err() {
            break;
        }
    }
}

impl GroupingWorker {
    /// Queue a pass over `records`. Returns its generation.
    pub fn submit(&mut self, records: Arc<[Record]>, tolerances: ToleranceSet) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let job = Job {
            generation,
            records,
            tolerances,
        };
        if self.jobs.send(job).is_err() {
            log::error!("Grouping thread is gone; pass #{generation} was not queued");
            return generation;
        }
        self.busy = true;
        log::debug!("Submitted grouping pass #{generation}");
        generation
    }

    /// Take the latest finished pass, if any. Stale passes are discarded.
    pub fn poll(&mut self) -> Option<GroupingOutcome> {
        let latest = self.latest.load(Ordering::Acquire);
        let mut current = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation == latest {
                current = Some(outcome);
            } else {
                log::debug!("Dropping stale grouping pass #{}", outcome.generation);
            }
        }
        if current.is_some() {
            self.busy = false;
        }
        current
    }

    /// Forget any outstanding pass, e.g. when the data is cleared.
    pub fn abandon(&mut self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}
