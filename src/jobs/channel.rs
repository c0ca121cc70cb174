//! Progress channel between a job and its controller
//!
//! A bounded tokio mpsc channel carries [`ProgressMessage`]s in emission
//! order. The job owns the [`ProgressSender`]; the controller polls the
//! receiving end without blocking.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::schema::SchemaMap;

/// Message emitted by a running job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload", rename_all = "snake_case")]
pub enum ProgressMessage {
    /// Coarse progress before an item starts
    Progress { description: String, percent: u8 },

    /// Informational or per-item failure line
    Log(String),

    /// Terminal: the job completed
    Finished(String),

    /// Terminal: the job failed as a whole
    Error(String),

    /// Result of a schema scan
    SchemaResult(SchemaMap),
}

impl ProgressMessage {
    /// Whether the controller stops reading after this message
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressMessage::Finished(_) | ProgressMessage::Error(_))
    }
}

/// Receiving end held by the controller
pub type ProgressReceiver = mpsc::Receiver<ProgressMessage>;

/// Create a progress channel holding at most `capacity` pending messages
pub fn progress_channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressSender { tx }, rx)
}

/// Sending end held by a job
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<ProgressMessage>,
}

impl ProgressSender {
    /// Send a message, waiting for room in the channel
    ///
    /// A controller that went away is not an error for the job; the
    /// message is dropped.
    pub async fn send(&self, message: ProgressMessage) {
        if let Err(e) = self.tx.send(message).await {
            debug!("Progress receiver dropped, discarding {:?}", e.0);
        }
    }

    pub async fn progress(&self, description: impl Into<String>, percent: u8) {
        self.send(ProgressMessage::Progress {
            description: description.into(),
            percent,
        })
        .await;
    }

    pub async fn log(&self, text: impl Into<String>) {
        self.send(ProgressMessage::Log(text.into())).await;
    }

    pub async fn finished(&self, summary: impl Into<String>) {
        self.send(ProgressMessage::Finished(summary.into())).await;
    }

    pub async fn error(&self, text: impl Into<String>) {
        self.send(ProgressMessage::Error(text.into())).await;
    }

    pub async fn schema_result(&self, schema: SchemaMap) {
        self.send(ProgressMessage::SchemaResult(schema)).await;
    }
}

/// Percentage of `total` items done before item `index` starts
pub fn percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((index.min(total) * 100) / total) as u8
}
