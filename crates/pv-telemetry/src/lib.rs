//! # PV Telemetry
//!
//! Logging bootstrap for the provenance ledger and its domain adapters.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pv_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_logging(&TelemetryConfig::from_env()).expect("Failed to init logging");
//!     // Ledger logs (`[pv-ledger]`, `[pv-delegation]`, `[pv-rollup]`) now reach stdout.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PV_SERVICE_NAME` | `provenance-ledger` | Service name in log lines |
//! | `PV_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honored) |
//! | `PV_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `PV_JSON_LOGS` | `false` | JSON lines instead of human output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Convenience macro for a span tagged with the ledger component.
///
/// ```rust,ignore
/// let _span = ledger_span!("undelegate", batch = %short_id(&batch_id)).entered();
/// ```
#[macro_export]
macro_rules! ledger_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name, component = "pv-ledger" $(, $($field)*)?)
    };
}
