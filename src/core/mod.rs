// src/core/mod.rs

pub mod cancellation;
pub mod error;
pub mod progress;

pub use cancellation::CancellationToken;
pub use error::{MpqsError, MpqsResult};
pub use progress::{progress_channel, ProgressEmitter, ProgressEvent};
