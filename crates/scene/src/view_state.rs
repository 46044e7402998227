use foundation::Chamber;

use crate::compare::{CompareSession, MetricSnapshot};
use crate::hierarchy::{
    DistrictAvailability, DistrictCatalog, Rejection, Selection, check_county, resolve_state,
};
use crate::overlay::{OverlayMetric, Theme};
use crate::region::{Region, RegionKind};

/// Everything the heat-map view shows, in one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub selection: Selection,
    pub overlay: OverlayMetric,
    pub theme: Theme,
    pub chamber: Chamber,
    pub compare_mode: bool,
    pub compare: CompareSession,
    /// Placeholder shown instead of a control that cannot be used.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// State name, postal abbreviation, or FIPS code.
    SelectState(String),
    SelectCounty { id: String, name: Option<String> },
    SelectDistrict(String),
    ClearSelection,
    NavigateTo(RegionKind),
    SetOverlay(OverlayMetric),
    SetTheme(Theme),
    SetChamber(Chamber),
    SetCompareMode(bool),
    AddCompare { region: Region, snapshot: MetricSnapshot },
    RemoveCompare(String),
    DismissNotice,
}

/// Work requested by a transition. Executed by the owner of the loader and viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestCounties { state_fips: String },
    /// Both chambers' district layers and the profile document of a state.
    RequestDistricts { state_fips: String },
    Refit(Selection),
    ResetViewport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
    pub rejection: Option<Rejection>,
}

impl Transition {
    fn unchanged(state: &ViewState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
            rejection: None,
        }
    }

    fn to(state: ViewState, effects: Vec<Effect>) -> Self {
        Self {
            state,
            effects,
            rejection: None,
        }
    }

    fn rejected(state: ViewState, rejection: Rejection) -> Self {
        Self {
            state,
            effects: Vec::new(),
            rejection: Some(rejection),
        }
    }
}

/// Applies one action to the view state.
pub fn reduce(state: &ViewState, action: &Action, districts: &dyn DistrictCatalog) -> Transition {
    match action {
        Action::SelectState(key) => select_state(state, key),
        Action::SelectCounty { id, name } => select_county(state, id, name.as_deref()),
        Action::SelectDistrict(id) => select_district(state, id, districts),
        Action::ClearSelection => {
            let mut next = state.clone();
            next.selection = Selection::National;
            next.notice = None;
            Transition::to(next, vec![Effect::ResetViewport])
        }
        Action::NavigateTo(level) => navigate_to(state, *level),
        Action::SetOverlay(metric) => {
            let mut next = state.clone();
            next.overlay = *metric;
            Transition::to(next, Vec::new())
        }
        Action::SetTheme(theme) => {
            let mut next = state.clone();
            next.theme = *theme;
            Transition::to(next, Vec::new())
        }
        Action::SetChamber(chamber) => set_chamber(state, *chamber),
        Action::SetCompareMode(on) => {
            let mut next = state.clone();
            next.compare_mode = *on;
            if !on {
                next.compare.clear();
            }
            Transition::to(next, Vec::new())
        }
        Action::AddCompare { region, snapshot } => {
            if !state.compare_mode {
                return Transition::rejected(state.clone(), Rejection::CompareModeOff);
            }
            let mut next = state.clone();
            next.compare.add_region(region.clone(), snapshot.clone());
            Transition::to(next, Vec::new())
        }
        Action::RemoveCompare(id) => {
            let mut next = state.clone();
            next.compare.remove_region(id);
            Transition::to(next, Vec::new())
        }
        Action::DismissNotice => {
            let mut next = state.clone();
            next.notice = None;
            Transition::to(next, Vec::new())
        }
    }
}

fn select_state(state: &ViewState, key: &str) -> Transition {
    let code = match resolve_state(key) {
        Ok(code) => code,
        Err(rejection) => return Transition::rejected(state.clone(), rejection),
    };
    if state.selection == (Selection::State { state: code }) {
        return Transition::unchanged(state);
    }
    let mut next = state.clone();
    next.selection = Selection::State { state: code };
    next.notice = None;
    let fips = code.fips.to_string();
    let effects = vec![
        Effect::RequestCounties {
            state_fips: fips.clone(),
        },
        Effect::RequestDistricts { state_fips: fips },
        Effect::Refit(next.selection.clone()),
    ];
    Transition::to(next, effects)
}

fn select_county(state: &ViewState, id: &str, name: Option<&str>) -> Transition {
    let Some(code) = state.selection.state() else {
        return Transition::rejected(state.clone(), Rejection::NoStateSelected);
    };
    let padded = match check_county(code, id) {
        Ok(padded) => padded,
        Err(rejection) => return Transition::rejected(state.clone(), rejection),
    };
    if let Selection::County { county, .. } = &state.selection {
        if county.id == padded {
            return Transition::unchanged(state);
        }
    }
    let mut next = state.clone();
    next.selection = Selection::County {
        state: code,
        county: Region::county(code, &padded, name),
    };
    next.notice = None;
    let effects = vec![Effect::Refit(next.selection.clone())];
    Transition::to(next, effects)
}

fn select_district(state: &ViewState, id: &str, districts: &dyn DistrictCatalog) -> Transition {
    let Some(code) = state.selection.state() else {
        return Transition::rejected(state.clone(), Rejection::NoStateSelected);
    };
    let chamber = state.chamber;
    let availability = districts.availability(code.fips, chamber);
    if availability != DistrictAvailability::Ready {
        let rejection = Rejection::DistrictsUnavailable {
            state: code.name.to_string(),
            chamber,
            availability,
        };
        let mut next = state.clone();
        next.notice = Some(rejection.to_string());
        return Transition::rejected(next, rejection);
    }

    let district_id = id.trim();
    let Some(name) = districts.district_name(code.fips, chamber, district_id) else {
        return Transition::rejected(
            state.clone(),
            Rejection::UnknownDistrict {
                state: code.name.to_string(),
                chamber,
                district_id: district_id.to_string(),
            },
        );
    };
    if let Selection::District {
        district_id: current,
        chamber: current_chamber,
        ..
    } = &state.selection
    {
        if current == district_id && *current_chamber == chamber {
            return Transition::unchanged(state);
        }
    }

    let mut next = state.clone();
    next.selection = Selection::District {
        state: code,
        chamber,
        district_id: district_id.to_string(),
        district: Region::district(code, chamber, district_id, name.as_deref()),
    };
    next.notice = None;
    let effects = vec![Effect::Refit(next.selection.clone())];
    Transition::to(next, effects)
}

fn navigate_to(state: &ViewState, level: RegionKind) -> Transition {
    let Some(target) = state.selection.ancestor(level) else {
        return Transition::rejected(state.clone(), Rejection::NotAnAncestor(level));
    };
    if target == state.selection {
        return Transition::unchanged(state);
    }
    let mut next = state.clone();
    next.notice = None;
    let effects = match &target {
        Selection::National => vec![Effect::ResetViewport],
        other => vec![Effect::Refit(other.clone())],
    };
    next.selection = target;
    Transition::to(next, effects)
}

fn set_chamber(state: &ViewState, chamber: Chamber) -> Transition {
    if state.chamber == chamber {
        return Transition::unchanged(state);
    }
    let mut next = state.clone();
    next.chamber = chamber;
    next.notice = None;
    let mut effects = Vec::new();
    // District ids are per chamber; a selected district does not survive the switch.
    if let Selection::District { state: code, .. } = &state.selection {
        next.selection = Selection::State { state: *code };
        effects.push(Effect::Refit(next.selection.clone()));
    }
    Transition::to(next, effects)
}

#[cfg(test)]
mod tests {
    use super::{Action, Effect, ViewState, reduce};
    use crate::compare::MetricSnapshot;
    use crate::hierarchy::{
        DistrictAvailability, DistrictCatalog, NoDistricts, Rejection, Selection,
    };
    use crate::overlay::{OverlayMetric, Theme};
    use crate::region::{Region, RegionKind};
    use foundation::{Chamber, StateCode};

    struct HouseOnly;

    impl DistrictCatalog for HouseOnly {
        fn availability(&self, state_fips: &str, chamber: Chamber) -> DistrictAvailability {
            match (state_fips, chamber) {
                ("04", Chamber::House) => DistrictAvailability::Ready,
                ("04", Chamber::Senate) => DistrictAvailability::Unavailable,
                _ => DistrictAvailability::NotRequested,
            }
        }

        fn district_name(&self, _: &str, _: Chamber, id: &str) -> Option<Option<String>> {
            (id == "7").then_some(None)
        }
    }

    fn apply(state: &ViewState, action: Action) -> ViewState {
        let t = reduce(state, &action, &HouseOnly);
        assert_eq!(t.rejection, None, "{action:?}");
        t.state
    }

    fn arizona() -> ViewState {
        apply(&ViewState::default(), Action::SelectState("Arizona".into()))
    }

    #[test]
    fn select_state_requests_next_level_and_refit() {
        let t = reduce(&ViewState::default(), &Action::SelectState("az".into()), &NoDistricts);
        let az = StateCode::resolve("AZ").expect("az");
        assert_eq!(
            t.effects,
            vec![
                Effect::RequestCounties {
                    state_fips: "04".into()
                },
                Effect::RequestDistricts {
                    state_fips: "04".into()
                },
                Effect::Refit(Selection::State { state: az }),
            ]
        );

        let again = reduce(&t.state, &Action::SelectState("04".into()), &NoDistricts);
        assert!(again.effects.is_empty());
        assert_eq!(again.state, t.state);
    }

    #[test]
    fn unknown_states_are_rejected() {
        let t = reduce(
            &ViewState::default(),
            &Action::SelectState("Atlantis".into()),
            &NoDistricts,
        );
        assert_eq!(t.rejection, Some(Rejection::UnknownState("Atlantis".into())));
        assert_eq!(t.state, ViewState::default());
    }

    #[test]
    fn county_requires_a_state() {
        let t = reduce(
            &ViewState::default(),
            &Action::SelectCounty {
                id: "04013".into(),
                name: None,
            },
            &NoDistricts,
        );
        assert_eq!(t.rejection, Some(Rejection::NoStateSelected));
    }

    #[test]
    fn district_selection_is_guarded_by_availability() {
        let state = apply(&arizona(), Action::SetChamber(Chamber::Senate));
        let t = reduce(&state, &Action::SelectDistrict("7".into()), &HouseOnly);
        assert!(matches!(
            t.rejection,
            Some(Rejection::DistrictsUnavailable {
                availability: DistrictAvailability::Unavailable,
                ..
            })
        ));
        assert_eq!(t.state.selection, state.selection);
        assert_eq!(
            t.state.notice.as_deref(),
            Some("Senate district boundaries for Arizona are not available")
        );

        let house = apply(&t.state, Action::SetChamber(Chamber::House));
        assert_eq!(house.notice, None);
        let selected = apply(&house, Action::SelectDistrict("7".into()));
        assert_eq!(selected.selection.kind(), RegionKind::District);
        assert_eq!(selected.selection.current().display_name, "House District 7");

        let missing = reduce(&house, &Action::SelectDistrict("99".into()), &HouseOnly);
        assert!(matches!(missing.rejection, Some(Rejection::UnknownDistrict { .. })));
    }

    #[test]
    fn switching_chamber_leaves_the_district() {
        let district = apply(&arizona(), Action::SelectDistrict("7".into()));
        let t = reduce(&district, &Action::SetChamber(Chamber::Senate), &HouseOnly);
        assert_eq!(t.state.selection.kind(), RegionKind::State);
        assert_eq!(t.effects.len(), 1);
    }

    #[test]
    fn navigate_to_ancestor_discards_deeper_levels() {
        let county = apply(
            &arizona(),
            Action::SelectCounty {
                id: "4013".into(),
                name: Some("Maricopa".into()),
            },
        );
        let t = reduce(&county, &Action::NavigateTo(RegionKind::State), &NoDistricts);
        assert_eq!(t.state.selection, arizona().selection);
        assert!(matches!(t.effects.as_slice(), [Effect::Refit(_)]));

        let t = reduce(&county, &Action::NavigateTo(RegionKind::District), &NoDistricts);
        assert_eq!(t.rejection, Some(Rejection::NotAnAncestor(RegionKind::District)));

        let t = reduce(&county, &Action::NavigateTo(RegionKind::National), &NoDistricts);
        assert_eq!(t.effects, vec![Effect::ResetViewport]);
    }

    #[test]
    fn compare_requires_compare_mode_and_clears_on_exit() {
        let region = Region::state(StateCode::resolve("AZ").expect("az"));
        let add = Action::AddCompare {
            region,
            snapshot: MetricSnapshot::default(),
        };
        let t = reduce(&ViewState::default(), &add, &NoDistricts);
        assert_eq!(t.rejection, Some(Rejection::CompareModeOff));

        let on = apply(&ViewState::default(), Action::SetCompareMode(true));
        let with_one = apply(&on, add);
        assert_eq!(with_one.compare.len(), 1);
        let off = apply(&with_one, Action::SetCompareMode(false));
        assert!(off.compare.is_empty());
    }

    #[test]
    fn overlay_and_theme_do_not_touch_selection() {
        let state = apply(&arizona(), Action::SetOverlay(OverlayMetric::Momentum));
        let state = apply(&state, Action::SetTheme(Theme::Dark));
        assert_eq!(state.selection, arizona().selection);
        assert_eq!(state.overlay, OverlayMetric::Momentum);
        assert_eq!(state.theme, Theme::Dark);
    }
}
