use foundation::{Chamber, StateCode, pad_fips};
use serde::{Deserialize, Serialize};

use crate::overlay::chamber_label;

pub const NATIONAL_ID: &str = "US";
pub const NATIONAL_NAME: &str = "United States";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    National,
    State,
    County,
    District,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::National => "national",
            RegionKind::State => "state",
            RegionKind::County => "county",
            RegionKind::District => "district",
        }
    }
}

/// A selectable node of the nation → state → county | district hierarchy.
///
/// Counties and districts always carry their state's FIPS code as `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Region {
    pub fn national() -> Self {
        Self {
            kind: RegionKind::National,
            id: NATIONAL_ID.to_string(),
            display_name: NATIONAL_NAME.to_string(),
            parent_id: None,
        }
    }

    pub fn state(code: StateCode) -> Self {
        Self {
            kind: RegionKind::State,
            id: code.fips.to_string(),
            display_name: code.name.to_string(),
            parent_id: Some(NATIONAL_ID.to_string()),
        }
    }

    /// A county of `state`. The id is always the padded five-digit FIPS code.
    pub fn county(state: StateCode, county_id: &str, name: Option<&str>) -> Self {
        let id = pad_fips(county_id, 5);
        Self {
            kind: RegionKind::County,
            display_name: county_display_name(name, &id),
            id,
            parent_id: Some(state.fips.to_string()),
        }
    }

    /// A legislative district of `state`.
    ///
    /// District numbers repeat across states and chambers, so the region id is
    /// qualified: `district_region_id`.
    pub fn district(
        state: StateCode,
        chamber: Chamber,
        district_id: &str,
        name: Option<&str>,
    ) -> Self {
        let display_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("{} District {}", chamber_label(chamber), district_id.trim()),
        };
        Self {
            kind: RegionKind::District,
            id: district_region_id(state.fips, chamber, district_id),
            display_name,
            parent_id: Some(state.fips.to_string()),
        }
    }
}

pub fn district_region_id(state_fips: &str, chamber: Chamber, district_id: &str) -> String {
    format!(
        "{}-{}-{}",
        pad_fips(state_fips, 2),
        chamber.as_str(),
        district_id.trim()
    )
}

/// Display name for a county.
///
/// Uses the dataset's own name with a " County" suffix; without a usable name
/// the label is synthesized from the padded FIPS code. The synthesized label is
/// for display only and never used as an identifier.
pub fn county_display_name(name: Option<&str>, padded_id: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if n.ends_with(" County") => n.to_string(),
        Some(n) => format!("{n} County"),
        None => format!("County {padded_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Region, RegionKind, county_display_name};
    use foundation::{Chamber, StateCode};

    fn az() -> StateCode {
        StateCode::resolve("AZ").expect("arizona")
    }

    #[test]
    fn county_names_prefer_dataset_name() {
        assert_eq!(county_display_name(Some("Maricopa"), "04013"), "Maricopa County");
        assert_eq!(county_display_name(Some("Pima County"), "04019"), "Pima County");
        assert_eq!(county_display_name(Some("  "), "04013"), "County 04013");
        assert_eq!(county_display_name(None, "04013"), "County 04013");
    }

    #[test]
    fn counties_are_keyed_by_padded_fips() {
        let al = StateCode::resolve("Alabama").expect("alabama");
        let county = Region::county(al, "1001", None);
        assert_eq!(county.id, "01001");
        assert_eq!(county.display_name, "County 01001");
        assert_eq!(county.parent_id.as_deref(), Some("01"));
    }

    #[test]
    fn districts_have_state_parent_and_qualified_id() {
        let d = Region::district(az(), Chamber::Senate, "12", None);
        assert_eq!(d.kind, RegionKind::District);
        assert_eq!(d.id, "04-senate-12");
        assert_eq!(d.display_name, "Senate District 12");
        assert_eq!(d.parent_id.as_deref(), Some("04"));
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Region::state(az())).expect("serialize");
        assert_eq!(json["type"], "state");
        assert_eq!(json["displayName"], "Arizona");
        assert_eq!(json["parentId"], "US");
    }
}
