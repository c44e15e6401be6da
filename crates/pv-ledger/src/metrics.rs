//! # Ledger Metrics
//!
//! Prometheus metrics for the provenance ledger.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! pv-ledger = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ledger_batches_registered_total` - Counter of registered batches
//! - `ledger_events_created_total` - Counter of base-domain events
//! - `ledger_delegations_total` - Counter of completed delegations
//! - `ledger_rollup_updates_total` - Counter of accepted rollup updates
//! - `ledger_undelegations_total` - Counter of merged undelegations
//! - `ledger_rejections_total` - Counter of rejected calls (by reason)
//! - `ledger_units_delegated` - Gauge of units currently outside the base domain

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_gauge, register_int_counter, CounterVec, Gauge, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total batches registered
    pub static ref BATCHES_REGISTERED: IntCounter = register_int_counter!(
        "ledger_batches_registered_total",
        "Total number of batches registered"
    )
    .expect("Failed to create BATCHES_REGISTERED metric");

    /// Total events created on the base domain
    pub static ref EVENTS_CREATED: IntCounter = register_int_counter!(
        "ledger_events_created_total",
        "Total number of events created on the base domain"
    )
    .expect("Failed to create EVENTS_CREATED metric");

    /// Total delegations acknowledged by a rollup domain
    pub static ref DELEGATIONS: IntCounter = register_int_counter!(
        "ledger_delegations_total",
        "Total number of delegations acknowledged"
    )
    .expect("Failed to create DELEGATIONS metric");

    /// Total rollup updates accepted
    pub static ref ROLLUP_UPDATES: IntCounter = register_int_counter!(
        "ledger_rollup_updates_total",
        "Total number of rollup updates accepted"
    )
    .expect("Failed to create ROLLUP_UPDATES metric");

    /// Total undelegations merged
    pub static ref UNDELEGATIONS: IntCounter = register_int_counter!(
        "ledger_undelegations_total",
        "Total number of undelegations merged"
    )
    .expect("Failed to create UNDELEGATIONS metric");

    /// Total rejected calls, labeled by reason
    pub static ref REJECTIONS: CounterVec = register_counter_vec!(
        "ledger_rejections_total",
        "Total number of rejected calls",
        &["reason"]
    )
    .expect("Failed to create REJECTIONS metric");

    /// Units currently delegated or mid-handoff
    pub static ref UNITS_DELEGATED: Gauge = register_gauge!(
        "ledger_units_delegated",
        "Number of units not resident on the base domain"
    )
    .expect("Failed to create UNITS_DELEGATED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_batch_registered() {
    BATCHES_REGISTERED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_created() {
    EVENTS_CREATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_delegation() {
    DELEGATIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_rollup_update() {
    ROLLUP_UPDATES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_undelegation() {
    UNDELEGATIONS.inc();
}

/// Record a rejected call with its error label
#[cfg(feature = "metrics")]
pub fn record_rejection(reason: &str) {
    REJECTIONS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_units_delegated(count: usize) {
    UNITS_DELEGATED.set(count as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_batch_registered() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_delegation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rollup_update() {}

#[cfg(not(feature = "metrics"))]
pub fn record_undelegation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_units_delegated(_count: usize) {}
