//! Liveness Monitoring Module
//!
//! Tracks whether the trading backend is reachable and healthy:
//!
//! - **HealthProbe**: single-attempt probe abstraction (HTTP in production)
//! - **LivenessMonitor**: retry, hysteresis, and the tri-state badge value
//!
//! The monitor owns its own timer task; it is created when the console
//! starts, polls on a fixed cadence, and is stopped on shutdown.

pub mod liveness;
pub mod probe;

pub use liveness::{CycleOutcome, LivenessMonitor, LivenessStatus, MonitorConfig};
pub use probe::{HealthProbe, HttpHealthProbe, ProbeConfig};
