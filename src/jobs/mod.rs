//! Background jobs
//!
//! This module provides:
//! - [`channel`]: the ordered progress channel
//! - [`worker`]: the job bodies run inside the worker task
//! - [`JobRunner`]: the controller side, one job at a time
//!
//! Each job runs in its own tokio task with its own connection. The
//! controller never blocks on a job: it polls the channel with
//! non-blocking reads on a fixed interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::error::{JobError, Result};
use crate::source::Connector;

pub mod channel;
pub mod worker;

pub use channel::{ProgressMessage, ProgressReceiver, ProgressSender, percent, progress_channel};
pub use worker::{JobKind, JobSpec, SchemaScanJob, run_job};

struct ActiveJob {
    id: Uuid,
    kind: JobKind,
    handle: JoinHandle<()>,
    rx: ProgressReceiver,
}

/// Starts jobs and relays their progress
pub struct JobRunner {
    connector: Arc<dyn Connector>,
    capacity: usize,
    poll_interval: Duration,
    active: Option<ActiveJob>,
}

impl JobRunner {
    /// Create a runner opening job connections through `connector`
    pub fn new(connector: Arc<dyn Connector>, config: &JobsConfig) -> Self {
        Self {
            connector,
            capacity: config.channel_capacity,
            poll_interval: config.poll_interval(),
            active: None,
        }
    }

    /// Whether a job is running
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start a job
    ///
    /// # Returns
    /// * `Result<Uuid>` - Job id, or a busy error while another job runs
    pub fn start(&mut self, spec: JobSpec) -> Result<Uuid> {
        let connector = Arc::clone(&self.connector);
        self.launch(spec.kind(), move |progress| run_job(spec, connector, progress))
    }

    fn launch<F, Fut>(&mut self, kind: JobKind, body: F) -> Result<Uuid>
    where
        F: FnOnce(ProgressSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_busy() {
            return Err(JobError::Busy.into());
        }

        let (tx, rx) = progress_channel(self.capacity);
        let handle = tokio::spawn(body(tx));
        let id = Uuid::new_v4();
        info!("Started {} job {}", kind, id);

        self.active = Some(ActiveJob {
            id,
            kind,
            handle,
            rx,
        });
        Ok(id)
    }

    /// Drain the messages available now without waiting
    ///
    /// A terminal message releases the job and ends the batch. A worker
    /// that went away without one gets a synthesized `error`.
    pub fn poll(&mut self) -> Vec<ProgressMessage> {
        let mut messages = Vec::new();
        let Some(job) = self.active.as_mut() else {
            return messages;
        };

        loop {
            let next = match job.rx.try_recv() {
                Err(TryRecvError::Empty) => {
                    if !job.handle.is_finished() {
                        break;
                    }
                    // The worker may have sent its last message after the
                    // first read; an exited worker sends nothing more.
                    job.rx.try_recv()
                }
                other => other,
            };

            match next {
                Ok(msg) => {
                    let terminal = msg.is_terminal();
                    messages.push(msg);
                    if terminal {
                        self.release("finished");
                        break;
                    }
                }
                Err(_) => {
                    messages.push(self.lost_worker());
                    break;
                }
            }
        }
        messages
    }

    fn lost_worker(&mut self) -> ProgressMessage {
        let kind = self
            .active
            .as_ref()
            .map(|job| job.kind.to_string())
            .unwrap_or_default();
        warn!("The {} worker exited without a final message", kind);
        self.release("lost");
        let err = JobError::WorkerLost(format!("{kind} job ended without reporting a result"));
        ProgressMessage::Error(err.to_string())
    }

    fn release(&mut self, reason: &str) {
        if let Some(job) = self.active.take() {
            info!("Released {} job {} ({})", job.kind, job.id, reason);
        }
    }

    /// Forcibly stop the running job
    ///
    /// Files already written stay on disk.
    ///
    /// # Returns
    /// * `bool` - Whether a job was running
    pub fn abort(&mut self) -> bool {
        match self.active.take() {
            Some(job) => {
                job.handle.abort();
                warn!("Aborted {} job {}", job.kind, job.id);
                true
            }
            None => false,
        }
    }

    /// Poll on the fixed interval until the job reports a terminal message
    ///
    /// Every message is passed to `on_message` in order; the terminal one
    /// is also returned.
    pub async fn run_to_completion<F>(&mut self, mut on_message: F) -> Result<ProgressMessage>
    where
        F: FnMut(&ProgressMessage),
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            for msg in self.poll() {
                on_message(&msg);
                if msg.is_terminal() {
                    return Ok(msg);
                }
            }
            if !self.is_busy() {
                return Err(JobError::WorkerLost("no job is running".to_string()).into());
            }
        }
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.abort();
    }
}
