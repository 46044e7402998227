use foundation::{Chamber, StateCode, county_in_state, pad_fips};

use crate::overlay::chamber_label;
use crate::region::{Region, RegionKind};

/// Current position in the region hierarchy.
///
/// Counties and districts are siblings under a state: a district selection
/// skips the county level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    National,
    State {
        state: StateCode,
    },
    County {
        state: StateCode,
        county: Region,
    },
    District {
        state: StateCode,
        chamber: Chamber,
        district_id: String,
        district: Region,
    },
}

impl Selection {
    pub fn kind(&self) -> RegionKind {
        match self {
            Selection::National => RegionKind::National,
            Selection::State { .. } => RegionKind::State,
            Selection::County { .. } => RegionKind::County,
            Selection::District { .. } => RegionKind::District,
        }
    }

    pub fn state(&self) -> Option<StateCode> {
        match self {
            Selection::National => None,
            Selection::State { state }
            | Selection::County { state, .. }
            | Selection::District { state, .. } => Some(*state),
        }
    }

    /// The deepest selected region.
    pub fn current(&self) -> Region {
        match self {
            Selection::National => Region::national(),
            Selection::State { state } => Region::state(*state),
            Selection::County { county, .. } => county.clone(),
            Selection::District { district, .. } => district.clone(),
        }
    }

    /// Root-to-leaf chain of selected regions.
    pub fn breadcrumb(&self) -> Vec<Region> {
        let mut chain = vec![Region::national()];
        if let Some(state) = self.state() {
            chain.push(Region::state(state));
        }
        match self {
            Selection::County { county, .. } => chain.push(county.clone()),
            Selection::District { district, .. } => chain.push(district.clone()),
            _ => {}
        }
        chain
    }

    /// The selection truncated to the ancestor at `level`, if it is on the chain.
    pub fn ancestor(&self, level: RegionKind) -> Option<Selection> {
        match (level, self.state()) {
            (RegionKind::National, _) => Some(Selection::National),
            (RegionKind::State, Some(state)) => Some(Selection::State { state }),
            (kind, _) if kind == self.kind() => Some(self.clone()),
            _ => None,
        }
    }
}

/// Load status of a state's district layer, as seen by the hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DistrictAvailability {
    Ready,
    Loading,
    NotRequested,
    Unavailable,
}

/// Read access to the district layers, used to guard district selection.
pub trait DistrictCatalog {
    fn availability(&self, state_fips: &str, chamber: Chamber) -> DistrictAvailability;

    /// Dataset name of a district in a loaded layer; `None` when the layer
    /// has no such district, `Some(None)` when it exists without a name.
    fn district_name(
        &self,
        state_fips: &str,
        chamber: Chamber,
        district_id: &str,
    ) -> Option<Option<String>>;
}

/// Catalog for contexts with no district layers at all.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoDistricts;

impl DistrictCatalog for NoDistricts {
    fn availability(&self, _state_fips: &str, _chamber: Chamber) -> DistrictAvailability {
        DistrictAvailability::NotRequested
    }

    fn district_name(&self, _: &str, _: Chamber, _: &str) -> Option<Option<String>> {
        None
    }
}

/// Why a hierarchy action was refused. The view state is left unchanged
/// apart from the placeholder notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownState(String),
    NoStateSelected,
    InvalidCounty(String),
    CountyOutsideState { county: String, state: String },
    DistrictsUnavailable {
        state: String,
        chamber: Chamber,
        availability: DistrictAvailability,
    },
    UnknownDistrict { state: String, chamber: Chamber, district_id: String },
    NotAnAncestor(RegionKind),
    CompareModeOff,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnknownState(key) => write!(f, "unknown state: {key}"),
            Rejection::NoStateSelected => write!(f, "no state is selected"),
            Rejection::InvalidCounty(id) => write!(f, "invalid county identifier: {id:?}"),
            Rejection::CountyOutsideState { county, state } => {
                write!(f, "county {county} is not in {state}")
            }
            Rejection::DistrictsUnavailable {
                state,
                chamber,
                availability,
            } => {
                let why = match availability {
                    DistrictAvailability::Loading => "are still loading",
                    DistrictAvailability::Ready => "are loaded",
                    DistrictAvailability::NotRequested | DistrictAvailability::Unavailable => {
                        "are not available"
                    }
                };
                write!(f, "{} district boundaries for {state} {why}", chamber_label(*chamber))
            }
            Rejection::UnknownDistrict {
                state,
                chamber,
                district_id,
            } => write!(
                f,
                "{state} has no {} district {district_id}",
                chamber_label(*chamber)
            ),
            Rejection::NotAnAncestor(kind) => {
                write!(f, "{} is not on the current breadcrumb", kind.as_str())
            }
            Rejection::CompareModeOff => write!(f, "compare mode is off"),
        }
    }
}

impl std::error::Error for Rejection {}

pub(crate) fn resolve_state(key: &str) -> Result<StateCode, Rejection> {
    StateCode::resolve(key).ok_or_else(|| Rejection::UnknownState(key.trim().to_string()))
}

/// Validates a county id against the selected state and returns its padded form.
pub(crate) fn check_county(state: StateCode, county_id: &str) -> Result<String, Rejection> {
    let trimmed = county_id.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) || trimmed.len() > 5 {
        return Err(Rejection::InvalidCounty(county_id.to_string()));
    }
    let padded = pad_fips(trimmed, 5);
    if !county_in_state(&padded, state.fips) {
        return Err(Rejection::CountyOutsideState {
            county: padded,
            state: state.name.to_string(),
        });
    }
    Ok(padded)
}
