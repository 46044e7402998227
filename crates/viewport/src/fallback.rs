use std::collections::BTreeMap;

use foundation::StateCode;
use serde::{Deserialize, Serialize};

use crate::controller::ViewportState;

pub const NATION_NAME: &str = "United States";

/// Curated center (lon, lat) and zoom per region name, used when a fit fails.
const BUILT_IN: &[(&str, f64, f64, f64)] = &[
    (NATION_NAME, -98.58, 39.83, 1.0),
    ("Alabama", -86.8, 32.8, 5.5),
    ("Alaska", -152.0, 64.0, 3.0),
    ("Arizona", -111.7, 34.3, 5.5),
    ("Arkansas", -92.4, 34.9, 6.0),
    ("California", -119.5, 37.2, 4.5),
    ("Colorado", -105.5, 39.0, 5.5),
    ("Connecticut", -72.7, 41.6, 7.5),
    ("Delaware", -75.5, 39.0, 8.0),
    ("District of Columbia", -77.03, 38.9, 8.0),
    ("Florida", -82.5, 28.6, 5.0),
    ("Georgia", -83.4, 32.7, 5.5),
    ("Hawaii", -157.5, 20.3, 5.5),
    ("Idaho", -114.6, 44.4, 5.0),
    ("Illinois", -89.2, 40.0, 5.5),
    ("Indiana", -86.3, 39.9, 6.0),
    ("Iowa", -93.5, 42.1, 6.0),
    ("Kansas", -98.4, 38.5, 6.0),
    ("Kentucky", -85.3, 37.5, 6.0),
    ("Louisiana", -92.0, 31.0, 6.0),
    ("Maine", -69.2, 45.4, 6.0),
    ("Maryland", -76.8, 39.0, 7.0),
    ("Massachusetts", -71.8, 42.3, 7.0),
    ("Michigan", -85.4, 44.3, 5.0),
    ("Minnesota", -94.3, 46.3, 5.0),
    ("Mississippi", -89.7, 32.7, 5.5),
    ("Missouri", -92.5, 38.4, 5.5),
    ("Montana", -109.6, 47.0, 5.0),
    ("Nebraska", -99.8, 41.5, 5.5),
    ("Nevada", -116.6, 39.3, 5.0),
    ("New Hampshire", -71.6, 43.7, 7.0),
    ("New Jersey", -74.7, 40.2, 7.0),
    ("New Mexico", -106.1, 34.4, 5.5),
    ("New York", -75.5, 42.9, 5.5),
    ("North Carolina", -79.4, 35.5, 5.5),
    ("North Dakota", -100.5, 47.5, 6.0),
    ("Ohio", -82.8, 40.3, 6.0),
    ("Oklahoma", -97.5, 35.6, 5.5),
    ("Oregon", -120.5, 44.0, 5.5),
    ("Pennsylvania", -77.6, 40.9, 6.0),
    ("Rhode Island", -71.5, 41.7, 8.0),
    ("South Carolina", -80.9, 33.9, 6.5),
    ("South Dakota", -100.2, 44.4, 6.0),
    ("Tennessee", -86.3, 35.9, 6.0),
    ("Texas", -99.3, 31.5, 4.5),
    ("Utah", -111.7, 39.3, 5.5),
    ("Vermont", -72.7, 44.1, 7.0),
    ("Virginia", -78.8, 37.5, 6.0),
    ("Washington", -120.5, 47.4, 5.5),
    ("West Virginia", -80.6, 38.6, 6.5),
    ("Wisconsin", -89.8, 44.6, 5.5),
    ("Wyoming", -107.5, 43.0, 5.5),
];

/// Static lookup of fallback views keyed by region name.
///
/// Keys match case-insensitively; state abbreviations and FIPS codes resolve to
/// the state's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ViewportState>",
    into = "BTreeMap<String, ViewportState>"
)]
pub struct FallbackTable {
    entries: BTreeMap<String, ViewportState>,
}

impl From<BTreeMap<String, ViewportState>> for FallbackTable {
    fn from(map: BTreeMap<String, ViewportState>) -> Self {
        let mut table = Self::empty();
        table.extend(map);
        table
    }
}

impl From<FallbackTable> for BTreeMap<String, ViewportState> {
    fn from(table: FallbackTable) -> Self {
        table.entries
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, lon, lat, zoom) in BUILT_IN {
            table.insert(name, ViewportState::new([*lon, *lat], *zoom));
        }
        table
    }
}

impl FallbackTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, name: &str, view: ViewportState) {
        self.entries.insert(normalize(name), view.clamped());
    }

    /// Adds or replaces entries.
    pub fn extend(&mut self, overrides: impl IntoIterator<Item = (String, ViewportState)>) {
        for (name, view) in overrides {
            self.insert(&name, view);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ViewportState> {
        if let Some(v) = self.entries.get(&normalize(name)) {
            return Some(*v);
        }
        StateCode::resolve(name).and_then(|s| self.entries.get(&normalize(s.name)).copied())
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::FallbackTable;
    use crate::controller::ViewportState;
    use foundation::STATES;

    #[test]
    fn covers_every_state() {
        let table = FallbackTable::default();
        for state in STATES {
            assert!(table.lookup(state.name).is_some(), "{}", state.name);
        }
        assert_eq!(table.len(), STATES.len() + 1);
    }

    #[test]
    fn lookup_accepts_case_and_codes() {
        let table = FallbackTable::default();
        let az = table.lookup("arizona").expect("by name");
        assert_eq!(table.lookup("AZ"), Some(az));
        assert_eq!(table.lookup("04"), Some(az));
        assert_eq!(table.lookup("Atlantis"), None);
    }

    #[test]
    fn overrides_replace_and_clamp() {
        let mut table = FallbackTable::default();
        table.extend([
            ("Arizona".to_string(), ViewportState::new([-112.0, 34.0], 12.0)),
            ("Maricopa County".to_string(), ViewportState::new([-112.5, 33.3], 7.0)),
        ]);
        assert_eq!(table.lookup("Arizona").map(|v| v.zoom), Some(8.0));
        assert!(table.lookup("maricopa county").is_some());
    }

    #[test]
    fn deserializes_as_a_plain_map() {
        let table: FallbackTable =
            serde_json::from_str(r#"{ "Guam": { "center": [144.8, 13.4], "zoom": 7 } }"#)
                .expect("parse");
        assert_eq!(table.lookup("guam").map(|v| v.center), Some([144.8, 13.4]));
    }
}
