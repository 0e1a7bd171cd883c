//! Named background queue that runs jobs one at a time, in enqueue order.
//!
//! Each queue owns a single worker thread fed through an unbounded channel.
//! Closing stops intake, lets the worker drain everything already accepted
//! and then joins it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::{FileHandlerError, Result, TaskPriority};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of an [`ExecutionQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Open,
    Closing,
    Closed,
}

impl QueueState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Serializes work items onto one background thread.
///
/// # Example
/// ```no_run
/// # use file_handler_core::{ExecutionQueue, TaskPriority};
/// let queue = ExecutionQueue::new("BankExecutionQueue", TaskPriority::BackgroundNormal)?;
/// queue.enqueue(|| println!("loading bank"))?;
/// queue.close();
/// # Ok::<(), file_handler_core::FileHandlerError>(())
/// ```
pub struct ExecutionQueue {
    name: String,
    priority: TaskPriority,
    state: AtomicU8,
    // Taken on close; holding the lock while sending keeps close and enqueue
    // strictly ordered.
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
    pending: Arc<AtomicUsize>,
}

impl ExecutionQueue {
    /// Creates the queue and starts its worker thread.
    pub fn new(name: impl Into<String>, priority: TaskPriority) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker_name = name.clone();
        let worker_pending = Arc::clone(&pending);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&worker_name, priority, receiver, &worker_pending))
            .map_err(|source| FileHandlerError::WorkerSpawn {
                queue: name.clone(),
                source,
            })?;

        debug!(queue = %name, ?priority, "execution queue started");

        Ok(Self {
            name,
            priority,
            state: AtomicU8::new(QueueState::Open as u8),
            sender: Mutex::new(Some(sender)),
            worker_id: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
            pending,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn state(&self) -> QueueState {
        QueueState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.state() != QueueState::Open
    }

    /// Number of accepted jobs that have not finished running yet.
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Returns `true` when called from this queue's worker thread.
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Appends a job to the tail of the queue.
    ///
    /// Jobs run in the order they were accepted. Once the queue has started
    /// closing every call is rejected with [`FileHandlerError::QueueClosed`].
    pub fn enqueue<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            warn!(queue = %self.name, "rejecting job enqueued after close");
            return Err(self.closed_error());
        };

        self.pending.fetch_add(1, Ordering::AcqRel);
        if sender.send(Box::new(job)).is_err() {
            // Only reachable if the worker died without draining.
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(self.closed_error());
        }
        Ok(())
    }

    /// Enqueues a job and blocks until it has run.
    ///
    /// From the worker thread itself the job runs inline, since waiting on
    /// our own backlog would never return.
    pub fn enqueue_and_wait<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_worker_thread() {
            job();
            return Ok(());
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        self.enqueue(move || {
            job();
            let _ = done_tx.send(());
        })?;

        done_rx.recv().map_err(|_| FileHandlerError::JobAbandoned {
            queue: self.name.clone(),
        })
    }

    /// Stops intake, drains every accepted job and joins the worker.
    ///
    /// Safe to call more than once and from several threads: every caller
    /// returns only after the backlog has drained. Called from the worker
    /// itself it only stops intake, leaving the queue `Closing` until the
    /// next close from another thread joins it.
    pub fn close(&self) {
        if self.is_worker_thread() {
            if self.stop_intake() {
                warn!(
                    queue = %self.name,
                    "execution queue closed from its own worker; not joining"
                );
            }
            return;
        }

        // Held across the join so concurrent closers wait for the drain.
        let mut worker = self.worker.lock();
        self.stop_intake();

        let Some(handle) = worker.take() else {
            trace!(queue = %self.name, "execution queue already closed");
            return;
        };
        if handle.join().is_err() {
            error!(queue = %self.name, "execution queue worker terminated abnormally");
        }

        self.state.store(QueueState::Closed as u8, Ordering::Release);
        debug!(queue = %self.name, "execution queue closed");
    }

    /// Closes the queue and releases this handle.
    pub fn close_and_delete(self: Arc<Self>) {
        self.close();
    }

    /// Drops the sender so the worker exits once the backlog is empty.
    /// Returns `false` if intake was already stopped.
    fn stop_intake(&self) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        self.state
            .store(QueueState::Closing as u8, Ordering::Release);
        debug!(
            queue = %self.name,
            pending = self.pending_jobs(),
            "closing execution queue"
        );
        drop(sender);
        true
    }

    fn closed_error(&self) -> FileHandlerError {
        FileHandlerError::QueueClosed {
            queue: self.name.clone(),
        }
    }
}

impl Drop for ExecutionQueue {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ExecutionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionQueue")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("state", &self.state())
            .field("pending", &self.pending_jobs())
            .finish()
    }
}

fn run_worker(name: &str, priority: TaskPriority, receiver: Receiver<Job>, pending: &AtomicUsize) {
    trace!(queue = name, ?priority, "worker started");

    // `iter` keeps yielding buffered jobs after the sender is gone and stops
    // once the channel is both disconnected and empty.
    for job in receiver.iter() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(queue = name, "job panicked; continuing with the next one");
        }
        pending.fetch_sub(1, Ordering::AcqRel);
    }

    trace!(queue = name, "worker drained");
}
