//! In-memory job registry
//!
//! The registry is the single source of truth for download progress. Each job
//! lives in a `tokio::sync::watch` channel keyed by media id: the download
//! pipeline mutates it through its [`JobWriter`], observers clone receivers.
//! The registry itself only hands out reads, so the writer returned by
//! [`JobRegistry::create`] is the one way to change a job.
//!
//! Rules enforced here:
//! - `create` is an atomic check-and-insert, so one id never has two live jobs
//! - status only moves `downloading -> completed | failed`
//! - terminal jobs never change again; late updates are silently ignored
//! - `downloaded` never decreases and never exceeds a known `total_size`

use crate::types::{JobSnapshot, JobStatus, MediaId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, watch};

type JobCell = Arc<watch::Sender<JobSnapshot>>;

/// Outcome of [`JobRegistry::create`]
#[derive(Debug)]
pub enum Registration {
    /// A new job was registered; the caller owns its only writer
    Created(JobWriter),
    /// A live or completed job already holds this id
    Existing(JobSnapshot),
}

/// Concurrency-safe table of download jobs
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<MediaId, JobCell>>,
    registered: Notify,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MediaId, JobCell>> {
        // A panic while holding the lock cannot leave a half-written entry:
        // every mutation is a single insert or a send_modify on the cell.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cell(&self, id: &MediaId) -> Option<JobCell> {
        self.lock().get(id).cloned()
    }

    /// Register a job for `id` unless one already holds it
    ///
    /// A `downloading` or `completed` entry wins and its snapshot is returned.
    /// A `failed` entry is replaced so the media can be retried.
    pub fn create(&self, id: MediaId, file_path: impl Into<String>) -> Registration {
        let mut jobs = self.lock();

        if let Some(cell) = jobs.get(&id) {
            let current = cell.borrow().clone();
            if current.status != JobStatus::Failed {
                return Registration::Existing(current);
            }
            tracing::debug!(media_id = %id, "Replacing failed job with a new attempt");
        }

        let (tx, _rx) = watch::channel(JobSnapshot::new(id.clone(), file_path));
        let cell = Arc::new(tx);
        jobs.insert(id.clone(), cell.clone());
        drop(jobs);

        self.registered.notify_waiters();
        tracing::debug!(media_id = %id, "Job registered");
        Registration::Created(JobWriter { id, cell })
    }

    /// Current snapshot of a job
    pub fn get(&self, id: &MediaId) -> Option<JobSnapshot> {
        self.cell(id).map(|cell| cell.borrow().clone())
    }

    /// Snapshots of every registered job
    pub fn list(&self) -> Vec<JobSnapshot> {
        self.lock()
            .values()
            .map(|cell| cell.borrow().clone())
            .collect()
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no job was ever registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Observe a job's changes
    pub fn watch(&self, id: &MediaId) -> Option<watch::Receiver<JobSnapshot>> {
        self.cell(id).map(|cell| cell.subscribe())
    }

    /// Observe a job, waiting until it is registered
    pub async fn wait_for(&self, id: &MediaId) -> watch::Receiver<JobSnapshot> {
        loop {
            let notified = self.registered.notified();
            tokio::pin!(notified);
            // register interest before checking, so a concurrent create is never missed
            notified.as_mut().enable();

            if let Some(rx) = self.watch(id) {
                return rx;
            }
            notified.await;
        }
    }

    /// Number of live observers of a job
    pub fn observer_count(&self, id: &MediaId) -> usize {
        self.cell(id).map_or(0, |cell| cell.receiver_count())
    }
}

/// Exclusive write handle to one job, owned by its download pipeline
///
/// The handle stays bound to the job it was issued for: if that job fails and
/// is later replaced by a retry, writes through a stale handle reach nobody.
#[derive(Debug)]
pub struct JobWriter {
    id: MediaId,
    cell: JobCell,
}

impl JobWriter {
    /// Id of the job this writer owns
    pub fn id(&self) -> &MediaId {
        &self.id
    }

    /// Current snapshot of the owned job
    pub fn snapshot(&self) -> JobSnapshot {
        self.cell.borrow().clone()
    }

    /// Record the size advertised by the provider
    pub fn set_total_size(&self, total_size: u64) -> bool {
        let downloaded = self.cell.borrow().downloaded;
        self.update_progress(downloaded, total_size)
    }

    /// Record cumulative bytes written (and the total, when known)
    pub fn update_progress(&self, downloaded: u64, total_size: u64) -> bool {
        self.cell
            .send_if_modified(|job| apply_progress(job, downloaded, total_size))
    }

    /// Move the job to a terminal state
    pub fn mark_terminal(&self, status: JobStatus) -> bool {
        self.cell.send_if_modified(|job| apply_terminal(job, status))
    }
}

fn apply_progress(job: &mut JobSnapshot, downloaded: u64, total_size: u64) -> bool {
    if job.is_terminal() {
        return false;
    }

    let before = (job.downloaded, job.total_size);

    if total_size > 0 {
        // a total below what is already on disk would invert the invariant
        job.total_size = total_size.max(job.downloaded);
    }

    let mut next = downloaded.max(job.downloaded);
    if job.total_size > 0 {
        next = next.min(job.total_size);
    }
    job.downloaded = next;
    job.refresh_progress();

    before != (job.downloaded, job.total_size)
}

fn apply_terminal(job: &mut JobSnapshot, status: JobStatus) -> bool {
    if job.is_terminal() || !status.is_terminal() {
        return false;
    }

    job.status = status;
    job.finished_at = Some(Utc::now());
    if status == JobStatus::Completed {
        if job.total_size == 0 {
            job.total_size = job.downloaded;
        }
        job.progress = 100.0;
    }
    true
}
