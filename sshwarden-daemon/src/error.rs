//! Daemon error type and exit code mapping.

use sshwarden_core::error::{PipelineError, SshwardenError};
use sshwarden_log_pipeline::LogPipelineError;

/// Daemon-level error.
///
/// Each variant maps to a distinct process exit code so that supervisors
/// can tell a bad configuration from a missing log or a broken allowlist.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// The authentication log could not be opened at startup.
    #[error("log source unavailable: {0}")]
    SourceUnavailable(String),

    /// Recording an address into the allowlist failed.
    #[error("allowlist recording failed: {0}")]
    Sink(String),

    /// Any other runtime failure.
    #[error("{0}")]
    Runtime(String),
}

impl DaemonError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | Other runtime failure          |
    /// | 2    | Configuration error            |
    /// | 3    | Log file unavailable at start  |
    /// | 4    | Allowlist recording failed     |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::SourceUnavailable(_) => 3,
            Self::Sink(_) => 4,
            Self::Runtime(_) => 1,
        }
    }
}

impl From<SshwardenError> for DaemonError {
    fn from(err: SshwardenError) -> Self {
        match err {
            SshwardenError::Config(e) => Self::Config(e.to_string()),
            SshwardenError::Pipeline(PipelineError::SourceUnavailable(msg)) => {
                Self::SourceUnavailable(msg)
            }
            SshwardenError::Sink(e) => Self::Sink(e.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

impl From<LogPipelineError> for DaemonError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            // keep the address and user in the message
            LogPipelineError::Sink { .. } => Self::Sink(err.to_string()),
            other => SshwardenError::from(other).into(),
        }
    }
}

impl From<anyhow::Error> for DaemonError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{err:#}"))
    }
}
