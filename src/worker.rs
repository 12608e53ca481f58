// Expansion worker - a dedicated thread that runs expansions one at a time
//
// Jobs arrive from the input listener over an unbounded channel and are
// handled strictly in arrival order. Errors and panics are logged and the
// loop keeps going; the Shutdown job ends it after everything queued before.

use crate::input::TriggerEvent;
use crate::macros::ResolveError;
use crate::output::OutputError;
use crate::phrase::Phrase;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// One triggered phrase waiting to be expanded
#[derive(Debug, Clone)]
pub struct ExpansionJob {
    pub phrase: Phrase,
    pub event: TriggerEvent,
}

/// Commands sent to the worker thread
#[derive(Debug)]
pub enum Job {
    Expand(ExpansionJob),
    /// Stop after every job queued before this one
    Shutdown,
}

/// Failure while expanding a job
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors from worker handle operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkerError {
    #[error("Expansion worker has stopped")]
    Disconnected,
}

/// Processes jobs on the worker thread
pub trait JobHandler: Send + 'static {
    fn handle(&mut self, job: ExpansionJob) -> Result<(), ExpansionError>;
}

impl<F> JobHandler for F
where
    F: FnMut(ExpansionJob) -> Result<(), ExpansionError> + Send + 'static,
{
    fn handle(&mut self, job: ExpansionJob) -> Result<(), ExpansionError> {
        self(job)
    }
}

/// Cloneable producer side of the job queue; never blocks
#[derive(Debug, Clone)]
pub struct JobSender {
    sender: Sender<Job>,
}

impl JobSender {
    pub fn enqueue(&self, job: ExpansionJob) -> Result<(), WorkerError> {
        self.sender
            .send(Job::Expand(job))
            .map_err(|_| WorkerError::Disconnected)
    }
}

/// Handle to the expansion thread
///
/// When dropped, queued jobs are flushed and the thread is joined.
pub struct ExpansionWorker {
    sender: Sender<Job>,
    thread: Option<JoinHandle<()>>,
}

impl ExpansionWorker {
    /// Spawn the worker thread around `handler`
    pub fn spawn<H: JobHandler>(handler: H) -> Self {
        let (sender, receiver) = mpsc::channel();

        let thread = thread::spawn(move || {
            worker_main(receiver, handler);
        });

        Self {
            sender,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    pub fn enqueue(&self, job: ExpansionJob) -> Result<(), WorkerError> {
        self.sender
            .send(Job::Expand(job))
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Finish every queued job, then stop the thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Ignore errors if the thread already exited
        let _ = self.sender.send(Job::Shutdown);

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                crate::error!("Expansion worker thread panicked");
            }
        }
    }
}

impl Drop for ExpansionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main loop for the worker thread
fn worker_main<H: JobHandler>(receiver: Receiver<Job>, mut handler: H) {
    crate::info!("Expansion worker started");

    while let Ok(job) = receiver.recv() {
        let job = match job {
            Job::Expand(job) => job,
            Job::Shutdown => {
                crate::debug!("Expansion worker received shutdown");
                break;
            }
        };

        let name = job.phrase.name.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(job))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => crate::error!("Expansion of '{}' failed: {}", name, e),
            Err(_) => crate::error!("Expansion of '{}' panicked; worker continues", name),
        }
    }

    crate::info!("Expansion worker exiting");
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
