//! Clinic and flow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Clinic identity and flow tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicConfig {
    /// Doctor named on prescriptions created by the chat flow
    #[serde(default)]
    pub doctor_name: String,

    /// Doctor registration (CRM) on prescriptions created by the chat flow
    #[serde(default)]
    pub doctor_crm: String,

    /// Compare-and-swap attempts per inbound message
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Seconds between reconciliation sweeps
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,

    /// Minimum age in seconds before a committed state is reconciled
    #[serde(default = "default_reconcile_grace")]
    pub reconcile_grace_secs: u64,

    /// Max states examined per sweep
    #[serde(default = "default_reconcile_batch_size")]
    pub reconcile_batch_size: u32,

    /// How long a duplicate delivery waits for the first one's reply
    #[serde(default = "default_duplicate_wait")]
    pub duplicate_wait_millis: u64,

    /// Age in seconds after which an unanswered message claim is abandoned
    #[serde(default = "default_stale_claim")]
    pub stale_claim_secs: u64,
}

impl ClinicConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn reconcile_grace(&self) -> Duration {
        Duration::from_secs(self.reconcile_grace_secs)
    }

    pub fn duplicate_wait(&self) -> Duration {
        Duration::from_millis(self.duplicate_wait_millis)
    }

    pub fn stale_claim(&self) -> Duration {
        Duration::from_secs(self.stale_claim_secs)
    }

    /// Validate clinic configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_conflict_retries == 0 || self.max_conflict_retries > 50 {
            return Err(ValidationError::InvalidConflictRetries);
        }

        if self.reconcile_interval_secs == 0
            || self.reconcile_grace_secs == 0
            || self.reconcile_batch_size == 0
        {
            return Err(ValidationError::InvalidReconcileSettings);
        }

        if self.stale_claim() <= self.duplicate_wait() {
            return Err(ValidationError::InvalidDuplicateSettings);
        }

        Ok(())
    }

    /// Doctor identification must be present before prescriptions go out.
    pub fn validate_for_production(&self) -> Result<(), ValidationError> {
        if self.doctor_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CLINIC__DOCTOR_NAME"));
        }
        if self.doctor_crm.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CLINIC__DOCTOR_CRM"));
        }
        Ok(())
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            doctor_name: String::new(),
            doctor_crm: String::new(),
            max_conflict_retries: default_max_conflict_retries(),
            reconcile_interval_secs: default_reconcile_interval(),
            reconcile_grace_secs: default_reconcile_grace(),
            reconcile_batch_size: default_reconcile_batch_size(),
            duplicate_wait_millis: default_duplicate_wait(),
            stale_claim_secs: default_stale_claim(),
        }
    }
}

fn default_max_conflict_retries() -> u32 {
    5
}

fn default_reconcile_interval() -> u64 {
    60
}

fn default_reconcile_grace() -> u64 {
    30
}

fn default_reconcile_batch_size() -> u32 {
    50
}

fn default_duplicate_wait() -> u64 {
    5000
}

fn default_stale_claim() -> u64 {
    60
}
