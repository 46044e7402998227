use foundation::{Chamber, pad_fips};

use crate::residency::Tier;

/// Identifies one dataset: the region scope a boundary/profile document covers.
///
/// Ordered so registries keyed by scope traverse deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetScope {
    /// National state boundaries.
    States,
    /// National county boundaries; the county layer filters by state prefix.
    Counties,
    /// One chamber's district boundaries for a state.
    Districts { state_fips: String, chamber: Chamber },
    /// District profile metadata for a state.
    Profiles { state_fips: String },
}

impl DatasetScope {
    pub fn districts(state_fips: &str, chamber: Chamber) -> Self {
        DatasetScope::Districts {
            state_fips: pad_fips(state_fips, 2),
            chamber,
        }
    }

    pub fn profiles(state_fips: &str) -> Self {
        DatasetScope::Profiles {
            state_fips: pad_fips(state_fips, 2),
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            DatasetScope::States | DatasetScope::Counties => Tier::Required,
            DatasetScope::Districts { .. } | DatasetScope::Profiles { .. } => Tier::Optional,
        }
    }

    /// Stable string form, used in logs and diagnostics.
    pub fn key(&self) -> String {
        match self {
            DatasetScope::States => "states".to_string(),
            DatasetScope::Counties => "counties".to_string(),
            DatasetScope::Districts {
                state_fips,
                chamber,
            } => format!("districts/{state_fips}/{}", chamber.as_str()),
            DatasetScope::Profiles { state_fips } => format!("profiles/{state_fips}"),
        }
    }
}

impl std::fmt::Display for DatasetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}
