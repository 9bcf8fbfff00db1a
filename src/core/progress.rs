// src/core/progress.rs

use chrono::{DateTime, Utc};
use std::sync::mpsc::{channel, Receiver, Sender};

/// A single caller-visible progress milestone.
///
/// Distinct from `log` output: `log` is for operational tracing a developer
/// reads in a terminal, this is the structured stream `Session::progress_events`
/// exposes to callers per the external-interfaces contract.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl ProgressEvent {
    fn now(message: impl Into<String>) -> Self {
        ProgressEvent {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// Producer handle held by the driver; cloned freely across sieve workers.
#[derive(Clone)]
pub struct ProgressEmitter {
    sender: Sender<ProgressEvent>,
}

impl ProgressEmitter {
    pub fn emit(&self, message: impl Into<String>) {
        // Progress events are best-effort: if the receiver was dropped (the
        // caller isn't listening) there's nothing useful to do with the error.
        let _ = self.sender.send(ProgressEvent::now(message));
    }
}

pub fn progress_channel() -> (ProgressEmitter, Receiver<ProgressEvent>) {
    let (sender, receiver) = channel();
    (ProgressEmitter { sender }, receiver)
}
