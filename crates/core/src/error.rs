use serde::{Deserialize, Serialize};
use sysgate_executor::ExitInfo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unknown command: {name}. Available: {available}")]
    UnknownCatalogName { name: String, available: String },
    #[error("No command provided")]
    EmptyCommand,
    #[error("Command timed out after {timeout_ms}ms: {command}")]
    ExecutionTimedOut { command: String, timeout_ms: u64 },
    #[error("Command failed ({exit_info}): {command}")]
    ExecutionFailed {
        command: String,
        stderr: String,
        exit_info: ExitInfo,
    },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::UnknownCatalogName { .. } => ErrorKind::UnknownCatalogName,
            GatewayError::EmptyCommand => ErrorKind::EmptyCommand,
            GatewayError::ExecutionTimedOut { .. } => ErrorKind::ExecutionTimedOut,
            GatewayError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
        }
    }

    /// Captured stderr, when the failure produced any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GatewayError::ExecutionFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Stable label attached to every failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationDenied,
    UnknownCatalogName,
    EmptyCommand,
    MalformedRequest,
    ExecutionTimedOut,
    ExecutionFailed,
}

impl ErrorKind {
    /// Client-side mistakes, as opposed to denials or host failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnknownCatalogName | ErrorKind::EmptyCommand | ErrorKind::MalformedRequest
        )
    }
}
