//! # Policy Store
//!
//! System-wide configuration, one live config per authority. Every mutating
//! entry point passes through [`PolicyStore::gate`] before touching state.

use super::invariants::MAX_BATCH_SIZE_LIMIT;
use super::rate_limit::MinIntervalGate;
use super::value_objects::Operation;
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{Identity, Timestamp};
use std::collections::HashMap;

/// Default registration fee (smallest currency unit).
pub const DEFAULT_REGISTRATION_FEE: u64 = 1_000_000;
/// Default cap on events per batch.
pub const DEFAULT_MAX_EVENTS_PER_BATCH: u32 = 100;
/// Default cap on participants, and on batches per manufacturer.
pub const DEFAULT_MAX_PARTICIPANTS_OR_BATCHES: u32 = 1_000;
/// Default minimum spacing between successive batch updates.
pub const DEFAULT_MIN_EVENT_INTERVAL_SECS: u64 = 5;
/// Default maximum batch size.
pub const DEFAULT_MAX_BATCH_SIZE: u32 = 50;

/// Live ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub authority: Identity,
    pub registration_fee: u64,
    /// Receives registration fees. Defaults to the authority.
    pub fee_treasury: Identity,
    pub max_events_per_batch: u32,
    pub max_participants_or_batches: u32,
    pub min_event_interval_secs: u64,
    pub max_batch_size: u32,
    pub is_paused: bool,
    pub initialized_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LedgerConfig {
    /// Build a config from validated initialization parameters.
    pub fn from_params(
        authority: Identity,
        params: ConfigParams,
        now: Timestamp,
    ) -> LedgerResult<Self> {
        validate_max_events(params.max_events_per_batch)?;
        validate_max_participants(params.max_participants_or_batches)?;
        validate_min_interval(params.min_event_interval_secs)?;
        validate_max_batch_size(params.max_batch_size)?;

        Ok(Self {
            authority,
            registration_fee: params.registration_fee,
            fee_treasury: params.fee_treasury.unwrap_or(authority),
            max_events_per_batch: params.max_events_per_batch,
            max_participants_or_batches: params.max_participants_or_batches,
            min_event_interval_secs: params.min_event_interval_secs,
            max_batch_size: params.max_batch_size,
            is_paused: false,
            initialized_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Either every field is applied or none.
    pub fn apply(&mut self, update: &ConfigUpdate, now: Timestamp) -> LedgerResult<()> {
        if let Some(v) = update.max_events_per_batch {
            validate_max_events(v)?;
        }
        if let Some(v) = update.max_participants_or_batches {
            validate_max_participants(v)?;
        }
        if let Some(v) = update.min_event_interval_secs {
            validate_min_interval(v)?;
        }
        if let Some(v) = update.max_batch_size {
            validate_max_batch_size(v)?;
        }

        if let Some(v) = update.registration_fee {
            self.registration_fee = v;
        }
        if let Some(v) = update.fee_treasury {
            self.fee_treasury = v;
        }
        if let Some(v) = update.max_events_per_batch {
            self.max_events_per_batch = v;
        }
        if let Some(v) = update.max_participants_or_batches {
            self.max_participants_or_batches = v;
        }
        if let Some(v) = update.min_event_interval_secs {
            self.min_event_interval_secs = v;
        }
        if let Some(v) = update.max_batch_size {
            self.max_batch_size = v;
        }
        if let Some(v) = update.is_paused {
            self.is_paused = v;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Min-interval gate derived from this config.
    pub fn rate_gate(&self) -> MinIntervalGate {
        MinIntervalGate::new(self.min_event_interval_secs)
    }
}

fn validate_max_events(v: u32) -> LedgerResult<()> {
    if v == 0 {
        return Err(LedgerError::InvalidConfig {
            field: "max_events_per_batch",
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

fn validate_max_participants(v: u32) -> LedgerResult<()> {
    if v == 0 {
        return Err(LedgerError::InvalidConfig {
            field: "max_participants_or_batches",
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

fn validate_min_interval(v: u64) -> LedgerResult<()> {
    if v == 0 || v > i64::MAX as u64 {
        return Err(LedgerError::InvalidConfig {
            field: "min_event_interval_secs",
            reason: format!("must be within 1..={}", i64::MAX),
        });
    }
    Ok(())
}

fn validate_max_batch_size(v: u32) -> LedgerResult<()> {
    if v == 0 || v > MAX_BATCH_SIZE_LIMIT {
        return Err(LedgerError::InvalidConfig {
            field: "max_batch_size",
            reason: format!("must be within 1..={}", MAX_BATCH_SIZE_LIMIT),
        });
    }
    Ok(())
}

/// Parameters for [`PolicyStore::initialize`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParams {
    pub registration_fee: u64,
    /// `None` routes fees to the authority.
    pub fee_treasury: Option<Identity>,
    pub max_events_per_batch: u32,
    pub max_participants_or_batches: u32,
    pub min_event_interval_secs: u64,
    pub max_batch_size: u32,
}

impl Default for ConfigParams {
    fn default() -> Self {
        Self {
            registration_fee: DEFAULT_REGISTRATION_FEE,
            fee_treasury: None,
            max_events_per_batch: DEFAULT_MAX_EVENTS_PER_BATCH,
            max_participants_or_batches: DEFAULT_MAX_PARTICIPANTS_OR_BATCHES,
            min_event_interval_secs: DEFAULT_MIN_EVENT_INTERVAL_SECS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Partial config update. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub registration_fee: Option<u64>,
    pub fee_treasury: Option<Identity>,
    pub max_events_per_batch: Option<u32>,
    pub max_participants_or_batches: Option<u32>,
    pub min_event_interval_secs: Option<u64>,
    pub max_batch_size: Option<u32>,
    pub is_paused: Option<bool>,
}

impl ConfigUpdate {
    /// Update that only toggles the pause flag.
    pub fn pause(paused: bool) -> Self {
        Self {
            is_paused: Some(paused),
            ..Default::default()
        }
    }
}

/// Configs keyed by authority.
#[derive(Debug, Default)]
pub struct PolicyStore {
    configs: HashMap<Identity, LedgerConfig>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the singleton config for `authority`.
    pub fn initialize(
        &mut self,
        authority: Identity,
        params: ConfigParams,
        now: Timestamp,
    ) -> LedgerResult<&LedgerConfig> {
        if self.configs.contains_key(&authority) {
            return Err(LedgerError::AlreadyInitialized);
        }
        let config = LedgerConfig::from_params(authority, params, now)?;
        Ok(&*self.configs.entry(authority).or_insert(config))
    }

    /// Live config for `authority`.
    pub fn config(&self, authority: &Identity) -> LedgerResult<&LedgerConfig> {
        self.configs
            .get(authority)
            .ok_or_else(|| LedgerError::not_found("config", authority))
    }

    /// Authority-only partial update.
    pub fn update_config(
        &mut self,
        authority: &Identity,
        caller: &Identity,
        update: &ConfigUpdate,
        now: Timestamp,
    ) -> LedgerResult<&LedgerConfig> {
        let config = self
            .configs
            .get_mut(authority)
            .ok_or_else(|| LedgerError::not_found("config", authority))?;
        if caller != &config.authority {
            return Err(LedgerError::unauthorized(
                "only the authority may update the config",
            ));
        }
        config.apply(update, now)?;
        Ok(&*config)
    }

    /// Allowed/denied decision for one operation.
    pub fn is_operation_allowed(&self, authority: &Identity, op: Operation) -> bool {
        self.gate(authority, op).is_ok()
    }

    /// Pause gate. Returns the config the operation should run against.
    ///
    /// Reads are always allowed once a config exists.
    pub fn gate(&self, authority: &Identity, op: Operation) -> LedgerResult<&LedgerConfig> {
        let config = self.config(authority)?;
        if config.is_paused && op.is_mutating() && !op.is_pause_exempt() {
            return Err(LedgerError::Paused);
        }
        Ok(config)
    }
}
