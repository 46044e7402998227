use std::collections::BTreeMap;

use foundation::Chamber;
use serde::{Deserialize, Serialize};

/// Metadata about one legislative district, shown next to the district layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistrictProfile {
    pub district_id: String,
    #[serde(with = "chamber_serde")]
    pub chamber: Chamber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The optional per-state district profile document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub districts: Vec<DistrictProfile>,
}

impl ProfileDocument {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Profile of one district. Ids compare as numbers when both parse, so
    /// "07" finds district "7".
    pub fn get(&self, chamber: Chamber, district_id: &str) -> Option<&DistrictProfile> {
        self.districts
            .iter()
            .find(|d| d.chamber == chamber && same_district(&d.district_id, district_id))
    }

    /// Profiles of one chamber, keyed by district id.
    pub fn by_chamber(&self, chamber: Chamber) -> BTreeMap<&str, &DistrictProfile> {
        self.districts
            .iter()
            .filter(|d| d.chamber == chamber)
            .map(|d| (d.district_id.as_str(), d))
            .collect()
    }
}

fn same_district(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || matches!((a.parse::<u32>(), b.parse::<u32>()), (Ok(x), Ok(y)) if x == y)
}

mod chamber_serde {
    use foundation::Chamber;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(c: &Chamber, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(c.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Chamber, D::Error> {
        let raw = String::deserialize(d)?;
        Chamber::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown chamber: {raw}")))
    }
}
