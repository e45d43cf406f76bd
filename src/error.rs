//! Error types for the console

use thiserror::Error;

/// Main error type for the console
///
/// Probe and backend failures never escape their modules (the monitor
/// absorbs attempt failures into its state, and handlers map
/// [`BackendError`] straight to a failure response), so only the concerns
/// that actually propagate to the top level appear here.
#[derive(Error, Debug)]
pub enum Error {
    /// Monitor error
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single failed probe attempt
///
/// All variants count identically as one failed attempt; they differ only in
/// the diagnostic attached to the attempt log line.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Network, DNS, or connection failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Attempt exceeded the probe deadline
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Successful response whose status field is not the healthy sentinel
    #[error("Unhealthy payload status: {0:?}")]
    UnhealthyPayload(String),
}

/// Monitor lifecycle errors
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Start was called while the monitor was already running
    #[error("Monitor is already running")]
    AlreadyRunning,
}

/// Backend request errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Request failed in transit
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status
    #[error("Backend returned status {0}")]
    Status(u16),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_error_converts_into_crate_error() {
        let err: Error = MonitorError::AlreadyRunning.into();
        assert!(matches!(err, Error::Monitor(MonitorError::AlreadyRunning)));
        assert_eq!(
            err.to_string(),
            "Monitor error: Monitor is already running"
        );
    }

    #[test]
    fn test_io_error_converts_into_crate_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
