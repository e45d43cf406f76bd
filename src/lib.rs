//! Trade Console
//!
//! Library behind the trading backend's admin console. It provides:
//!
//! - **monitor**: the backend liveness monitor (probe, retry, hysteresis,
//!   tri-state badge value)
//! - **backend**: typed REST client for the backend endpoints the console
//!   renders (cookies, operation logs, profit summary)
//! - **types**: shared data model for those views
//!
//! The `console` binary mounts the monitor and serves the console API over
//! HTTP.

pub mod backend;
pub mod error;
pub mod monitor;
pub mod types;

pub use error::{BackendError, Error, MonitorError, ProbeError, Result};
pub use monitor::{LivenessMonitor, LivenessStatus, MonitorConfig};
