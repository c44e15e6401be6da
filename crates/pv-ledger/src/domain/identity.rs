//! # Identity Registry
//!
//! Participant profiles keyed by owner identity. A profile is created once
//! and its metadata is mutable only by its owner.

use super::invariants::{
    invariant_below_cap, invariant_text_field, MAX_CERTIFICATIONS_LEN, MAX_COMPANY_NAME_LEN,
};
use super::value_objects::BusinessType;
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{Identity, Timestamp};
use std::collections::HashMap;

/// Verified business metadata for one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerProfile {
    pub owner: Identity,
    pub company_name: String,
    pub business_type: BusinessType,
    pub certifications: String,
    pub is_verified: bool,
    /// Monotonic; bounded by `max_participants_or_batches`.
    pub registered_batch_count: u32,
    pub registered_at: Timestamp,
}

impl ManufacturerProfile {
    /// Verified quality inspectors may rule on events.
    pub fn is_verified_inspector(&self) -> bool {
        self.is_verified && self.business_type == BusinessType::QualityInspector
    }
}

/// Owner-only metadata edit. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub company_name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub certifications: Option<String>,
}

fn validate_company_name(name: &str) -> LedgerResult<()> {
    invariant_text_field("company_name", name, MAX_COMPANY_NAME_LEN, false)
}

fn validate_certifications(certs: &str) -> LedgerResult<()> {
    invariant_text_field("certifications", certs, MAX_CERTIFICATIONS_LEN, true)
}

/// Profile store.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    profiles: HashMap<Identity, ManufacturerProfile>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Register a participant. `verify` decides the initial verification flag.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        owner: Identity,
        company_name: String,
        business_type: BusinessType,
        certifications: String,
        max_participants: u32,
        now: Timestamp,
        verify: impl FnOnce(&ManufacturerProfile) -> bool,
    ) -> LedgerResult<&ManufacturerProfile> {
        if self.profiles.contains_key(&owner) {
            return Err(LedgerError::AlreadyRegistered);
        }
        let count = u32::try_from(self.profiles.len()).unwrap_or(u32::MAX);
        invariant_below_cap(count, max_participants, "participants")?;
        validate_company_name(&company_name)?;
        validate_certifications(&certifications)?;

        let mut profile = ManufacturerProfile {
            owner,
            company_name,
            business_type,
            certifications,
            is_verified: false,
            registered_batch_count: 0,
            registered_at: now,
        };
        profile.is_verified = verify(&profile);

        Ok(&*self.profiles.entry(owner).or_insert(profile))
    }

    pub fn get(&self, owner: &Identity) -> LedgerResult<&ManufacturerProfile> {
        self.profiles
            .get(owner)
            .ok_or_else(|| LedgerError::not_found("profile", owner))
    }

    /// Profile lookup that does not fail.
    pub fn find(&self, owner: &Identity) -> Option<&ManufacturerProfile> {
        self.profiles.get(owner)
    }

    /// Owner-only metadata update.
    pub fn update(
        &mut self,
        owner: &Identity,
        update: &ProfileUpdate,
    ) -> LedgerResult<&ManufacturerProfile> {
        if let Some(name) = &update.company_name {
            validate_company_name(name)?;
        }
        if let Some(certs) = &update.certifications {
            validate_certifications(certs)?;
        }
        let profile = self
            .profiles
            .get_mut(owner)
            .ok_or_else(|| LedgerError::not_found("profile", owner))?;

        if let Some(name) = &update.company_name {
            profile.company_name = name.clone();
        }
        if let Some(business_type) = update.business_type {
            profile.business_type = business_type;
        }
        if let Some(certs) = &update.certifications {
            profile.certifications = certs.clone();
        }
        Ok(&*profile)
    }

    /// Mark a profile verified. Re-approving is a no-op.
    pub fn approve(&mut self, owner: &Identity) -> LedgerResult<&ManufacturerProfile> {
        let profile = self
            .profiles
            .get_mut(owner)
            .ok_or_else(|| LedgerError::not_found("profile", owner))?;
        profile.is_verified = true;
        Ok(&*profile)
    }

    /// Profile that exists and is verified.
    pub fn require_verified(&self, owner: &Identity) -> LedgerResult<&ManufacturerProfile> {
        let profile = self.get(owner)?;
        if !profile.is_verified {
            return Err(LedgerError::Unverified);
        }
        Ok(profile)
    }

    pub fn increment_batch_count(&mut self, owner: &Identity) -> LedgerResult<u32> {
        let profile = self
            .profiles
            .get_mut(owner)
            .ok_or_else(|| LedgerError::not_found("profile", owner))?;
        profile.registered_batch_count = profile.registered_batch_count.saturating_add(1);
        Ok(profile.registered_batch_count)
    }
}
