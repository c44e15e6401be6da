//! Verification Policy Adapters

use crate::domain::ManufacturerProfile;
use crate::ports::outbound::VerificationPolicy;

/// Every new profile starts verified.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoVerifyPolicy;

impl VerificationPolicy for AutoVerifyPolicy {
    fn should_verify(&self, _profile: &ManufacturerProfile) -> bool {
        true
    }
}

/// Every new profile waits for `approve_manufacturer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualReviewPolicy;

impl VerificationPolicy for ManualReviewPolicy {
    fn should_verify(&self, _profile: &ManufacturerProfile) -> bool {
        false
    }
}
