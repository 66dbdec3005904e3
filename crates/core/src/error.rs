use crate::state::{CpuId, Status};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type used across the entire check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("cannot read counter source '{}': {source}", .path.display())]
    SourceUnavailable {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("malformed counter source line: {line:?}")]
    MalformedSource { line: String },

    #[error("counter source has no aggregate cpu row")]
    MissingAggregate,

    #[error("{cpu} appeared between samples; CPU set changed mid-check")]
    InconsistentSnapshot { cpu: CpuId },

    #[error("cannot read history file '{}': {source}", .path.display())]
    HistoryUnreadable {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt history file '{}': {reason}", .path.display())]
    CorruptHistory { path: PathBuf, reason: String },

    #[error("cannot persist history to '{}': {source}", .path.display())]
    PersistFailure {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("no samples to average")]
    EmptyHistory,

    #[error("config error: {0}")]
    Config(String),
}

impl CheckError {
    /// Exit status the check reports when it fails with this error.
    ///
    /// A check that cannot persist its trend fails loudly as CRITICAL, as does
    /// a rejected configuration; everything else is UNKNOWN.
    pub fn status(&self) -> Status {
        match self {
            Self::PersistFailure { .. } | Self::Config(_) => Status::Critical,
            _ => Status::Unknown,
        }
    }

    /// The single status line printed for this failure.
    pub fn status_line(&self) -> String {
        format!("{} - {self}", self.status())
    }
}

pub type Result<T, E = CheckError> = std::result::Result<T, E>;
