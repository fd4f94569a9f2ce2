//! Service configuration, loaded from `BLOODBANK_*` environment variables.

use serde::{Deserialize, Serialize};

use bloodbank_core::BloodGroup;
use bloodbank_donors::EligibilityRules;
use bloodbank_requests::DEFAULT_REQUIRED_BY_HOURS;

/// Hard upper bound on one page of transaction history.
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// A blood group created when the service starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedGroup {
    pub blood_group: BloodGroup,
    #[serde(default)]
    pub quantity: i64,
    pub min_threshold: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BloodBankConfig {
    pub seed_groups: Vec<SeedGroup>,
    /// Threshold used when a group is initialized without one.
    pub default_min_threshold: i64,
    /// History page size when the caller gives no limit.
    pub history_limit: usize,
    pub eligibility: EligibilityRules,
    pub default_required_by_hours: i64,
}

impl Default for BloodBankConfig {
    fn default() -> Self {
        Self {
            seed_groups: Vec::new(),
            default_min_threshold: 10,
            history_limit: 50,
            eligibility: EligibilityRules::default(),
            default_required_by_hours: DEFAULT_REQUIRED_BY_HOURS,
        }
    }
}

impl BloodBankConfig {
    /// Read configuration from the process environment.
    ///
    /// Unset variables keep their defaults; malformed ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parsed(&lookup, "BLOODBANK_DEFAULT_MIN_THRESHOLD") {
            if v >= 0 {
                config.default_min_threshold = v;
            } else {
                tracing::warn!(value = v, "BLOODBANK_DEFAULT_MIN_THRESHOLD must be non-negative; using default");
            }
        }
        if let Some(v) = parsed::<usize, _>(&lookup, "BLOODBANK_HISTORY_LIMIT") {
            config.history_limit = v.clamp(1, MAX_HISTORY_LIMIT);
        }
        if let Some(v) = parsed(&lookup, "BLOODBANK_DONATION_COOLDOWN_MONTHS") {
            config.eligibility.cooldown_months = v;
        }
        if let Some(v) = parsed(&lookup, "BLOODBANK_MIN_DONOR_AGE") {
            config.eligibility.min_age = v;
        }
        if let Some(v) = parsed(&lookup, "BLOODBANK_MAX_DONOR_AGE") {
            config.eligibility.max_age = v;
        }
        if let Some(v) = parsed(&lookup, "BLOODBANK_REQUIRED_BY_HOURS") {
            config.default_required_by_hours = v;
        }
        if let Some(raw) = lookup("BLOODBANK_SEED") {
            match serde_json::from_str::<Vec<SeedGroup>>(&raw) {
                Ok(seed) => config.seed_groups = seed,
                Err(err) => tracing::warn!(error = %err, "BLOODBANK_SEED is not a valid seed list; ignoring"),
            }
        }

        config
    }

    /// Clamp a caller-supplied history limit to `[1, MAX_HISTORY_LIMIT]`.
    pub fn effective_history_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.history_limit)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "malformed configuration value; using default");
            None
        }
    }
}
