//! Session-level error taxonomy.
//!
//! A [`SourceError`] ends the session (crash notification, then release);
//! a [`NotifierError`] is logged and the session keeps running.

use std::path::PathBuf;
use thiserror::Error;

/// Failure opening or reading the journal stream. Terminal for the session.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no journal files in {}", dir.display())]
    NoJournalFiles { dir: PathBuf },

    #[error("unreadable journal line: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("journal watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

/// Failure delivering a single notification. Never fatal to the session.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("pushover request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pushover rejected the message: HTTP {status}")]
    Rejected { status: reqwest::StatusCode },
}
