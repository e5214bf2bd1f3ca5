// src/server/reload.rs

//! Reload signals pushed to connected browsers.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::engine::TaskOutcome;
use crate::orchestrator::TaskCompletion;
use crate::types::ReloadKind;

const HUB_CAPACITY: usize = 32;

/// Wire format of the reload channel (JSON text frames).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Re-fetch the listed stylesheets (URL paths); empty means all of them.
    Css { paths: Vec<String> },
}

impl ReloadMessage {
    /// Message for a finished task, if clients should hear about it.
    pub fn for_completion(completion: &TaskCompletion) -> Option<Self> {
        if completion.outcome != TaskOutcome::Success {
            return None;
        }
        match completion.reload {
            ReloadKind::None => None,
            ReloadKind::Full => Some(ReloadMessage::Reload),
            ReloadKind::Styles => {
                let paths = completion
                    .outputs
                    .iter()
                    .filter(|p| p.extension().is_some_and(|e| e == "css"))
                    .map(|p| format!("/{}", p.to_string_lossy().replace('\\', "/")))
                    .collect();
                Some(ReloadMessage::Css { paths })
            }
        }
    }
}

/// Fan-out of reload messages to every connected client.
#[derive(Debug)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::with_capacity(HUB_CAPACITY)
    }

    /// Hub whose clients lag once `capacity` messages are unread.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Push `message` to all clients; returns how many were reached.
    pub fn notify_reload(&self, message: ReloadMessage) -> usize {
        match self.tx.send(message) {
            Ok(n) => n,
            Err(_) => {
                debug!("no reload clients connected");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
