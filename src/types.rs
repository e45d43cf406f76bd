//! Core data types used throughout the console

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single backend operation log entry
///
/// Rendered, never mutated, by the log view. Entries arrive ordered from the
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLog {
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Category tag used for presentation dispatch
    pub category: LogCategory,
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Automated or human-initiated
    pub origin: LogOrigin,
}

/// Origin of a logged operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOrigin {
    /// Emitted by the trading engine itself
    Automated,
    /// Triggered by an operator action
    Manual,
}

/// Closed set of log categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// Executed trades
    Trade,
    /// Order placement and cancellation
    Order,
    /// Risk limit events
    Risk,
    /// Deposits, withdrawals, transfers
    Funding,
    /// Everything else the backend reports
    System,
}

/// Presentation descriptor for a log category
///
/// The badge rendering dispatches on this record rather than branching on the
/// category at render time; adding a category is a data change here, not a
/// code change in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    /// Display label
    pub label: &'static str,
    /// Badge color (CSS hex)
    pub color: &'static str,
    /// Icon identifier
    pub icon: &'static str,
}

impl LogCategory {
    /// Presentation descriptor for this category
    pub const fn style(&self) -> CategoryStyle {
        match self {
            LogCategory::Trade => CategoryStyle {
                label: "Trade",
                color: "#00b894",
                icon: "exchange",
            },
            LogCategory::Order => CategoryStyle {
                label: "Order",
                color: "#0984e3",
                icon: "list",
            },
            LogCategory::Risk => CategoryStyle {
                label: "Risk",
                color: "#d63031",
                icon: "shield",
            },
            LogCategory::Funding => CategoryStyle {
                label: "Funding",
                color: "#fdcb6e",
                icon: "bank",
            },
            LogCategory::System => CategoryStyle {
                label: "System",
                color: "#636e72",
                icon: "gear",
            },
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style().label)
    }
}

/// Active filter selection for the log view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LogFilter {
    /// Restrict to a single category
    pub category: Option<LogCategory>,
    /// Restrict to a single origin
    pub origin: Option<LogOrigin>,
    /// Show only failed operations
    #[serde(default)]
    pub failures_only: bool,
}

impl LogFilter {
    /// Check whether an entry passes this filter
    pub fn matches(&self, entry: &OperationLog) -> bool {
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if let Some(origin) = self.origin {
            if entry.origin != origin {
                return false;
            }
        }
        if self.failures_only && entry.success {
            return false;
        }
        true
    }
}

/// A stored session cookie row in the management table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    /// Backend-assigned identifier
    pub id: u64,
    /// Account the cookie belongs to
    pub account: String,
    /// Cookie value
    pub value: String,
    /// Unix timestamp in milliseconds
    pub created_at_ms: i64,
}

/// Payload for creating a cookie record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCookie {
    /// Account the cookie belongs to
    pub account: String,
    /// Cookie value
    pub value: String,
}

/// Aggregate profit figures for the summary view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitSummary {
    /// Realized profit and loss
    pub realized: f64,
    /// Unrealized profit and loss on open positions
    pub unrealized: f64,
    /// Number of closed trades in the period
    pub trade_count: u64,
    /// Fraction of closed trades that were profitable
    pub win_rate: f64,
}
