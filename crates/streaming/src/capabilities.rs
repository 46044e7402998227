use std::collections::BTreeMap;

use foundation::{Chamber, StateCode, pad_fips};
use serde::{Deserialize, Serialize};

use crate::request::DatasetScope;

pub const DEFAULT_STATES_URL: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json";
pub const DEFAULT_COUNTIES_URL: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/counties-10m.json";

/// Where a dataset lives and, for topologies, which object to extract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetEndpoint {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl DatasetEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            object: None,
        }
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }
}

/// District-level datasets declared for one state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistrictSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<DatasetEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senate: Option<DatasetEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<String>,
}

impl DistrictSources {
    pub fn chamber(&self, chamber: Chamber) -> Option<&DatasetEndpoint> {
        match chamber {
            Chamber::House => self.house.as_ref(),
            Chamber::Senate => self.senate.as_ref(),
        }
    }
}

/// Capability descriptor: every dataset the session may fetch.
///
/// District layers and profiles exist only for the states listed in
/// `districts` (keyed by state name, abbreviation, or FIPS code); anything
/// not declared here resolves to unavailable without a fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetCatalog {
    pub states: DatasetEndpoint,
    pub counties: DatasetEndpoint,
    #[serde(default)]
    pub districts: BTreeMap<String, DistrictSources>,
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self {
            states: DatasetEndpoint::new(DEFAULT_STATES_URL).with_object("states"),
            counties: DatasetEndpoint::new(DEFAULT_COUNTIES_URL).with_object("counties"),
            districts: BTreeMap::new(),
        }
    }
}

impl DatasetCatalog {
    pub fn district_sources(&self, state_fips: &str) -> Option<&DistrictSources> {
        let fips = pad_fips(state_fips, 2);
        self.districts.iter().find_map(|(key, sources)| {
            StateCode::resolve(key)
                .filter(|s| s.fips == fips)
                .map(|_| sources)
        })
    }

    pub fn supports_districts(&self, state_fips: &str) -> bool {
        self.district_sources(state_fips)
            .is_some_and(|s| s.house.is_some() || s.senate.is_some())
    }

    /// Resolves the endpoint for a scope, or `None` if it is not declared.
    pub fn endpoint(&self, scope: &DatasetScope) -> Option<DatasetEndpoint> {
        match scope {
            DatasetScope::States => Some(self.states.clone()),
            DatasetScope::Counties => Some(self.counties.clone()),
            DatasetScope::Districts {
                state_fips,
                chamber,
            } => self
                .district_sources(state_fips)
                .and_then(|s| s.chamber(*chamber))
                .cloned(),
            DatasetScope::Profiles { state_fips } => self
                .district_sources(state_fips)
                .and_then(|s| s.profiles.clone())
                .map(DatasetEndpoint::new),
        }
    }

    /// Keys in `districts` that do not name a known state.
    pub fn unknown_district_keys(&self) -> Vec<&str> {
        self.districts
            .keys()
            .filter(|k| StateCode::resolve(k).is_none())
            .map(String::as_str)
            .collect()
    }
}
