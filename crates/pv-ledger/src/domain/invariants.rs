//! # Domain Invariants
//!
//! Business rules checked before any ledger record is created or mutated.

use crate::error::{LedgerError, LedgerResult};

/// Upper bound for company names.
pub const MAX_COMPANY_NAME_LEN: usize = 32;

/// Upper bound for certification strings.
pub const MAX_CERTIFICATIONS_LEN: usize = 32;

/// Upper bound for metadata references (content-addressed pointers).
pub const MAX_METADATA_REF_LEN: usize = 32;

/// Largest batch size a config may allow (stored as a byte on the base domain).
pub const MAX_BATCH_SIZE_LIMIT: u32 = u8::MAX as u32;

/// Invariant: batch size within 1..=max.
pub fn invariant_batch_size(size: u32, max: u32) -> LedgerResult<()> {
    if size == 0 || size > max {
        return Err(LedgerError::BatchSizeInvalid { size, max });
    }
    Ok(())
}

/// Invariant: bounded, optionally non-empty text field.
pub fn invariant_text_field(
    field: &'static str,
    value: &str,
    max_len: usize,
    allow_empty: bool,
) -> LedgerResult<()> {
    if !allow_empty && value.trim().is_empty() {
        return Err(LedgerError::InvalidMetadata {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.len() > max_len {
        return Err(LedgerError::InvalidMetadata {
            field,
            reason: format!("{} bytes exceeds limit of {}", value.len(), max_len),
        });
    }
    Ok(())
}

/// Invariant: metadata reference present and within bounds.
pub fn invariant_metadata_ref(value: &str) -> LedgerResult<()> {
    invariant_text_field("metadata_ref", value, MAX_METADATA_REF_LEN, false)
}

/// Invariant: a batch may not hold more events than the config allows.
pub fn invariant_event_capacity(total_events: u32, max_events: u32) -> LedgerResult<()> {
    if total_events >= max_events {
        return Err(LedgerError::CapacityExceeded {
            what: "events per batch",
            limit: max_events,
        });
    }
    Ok(())
}

/// Invariant: a counted resource is below its cap.
pub fn invariant_below_cap(count: u32, cap: u32, what: &'static str) -> LedgerResult<()> {
    if count >= cap {
        return Err(LedgerError::CapacityExceeded { what, limit: cap });
    }
    Ok(())
}
