use foundation::Chamber;
use runtime::{EventBus, Envelope, SubscriptionId};
use serde::Serialize;
use tracing::{debug, info};

use crate::hierarchy::{DistrictCatalog, NoDistricts, Rejection, Selection};
use crate::overlay::{OverlayMetric, Theme};
use crate::region::{Region, RegionKind};
use crate::view_state::{Action, Effect, ViewState, reduce};

/// Outbound selection event: the scope now in focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeEvent {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub id: String,
}

impl ScopeEvent {
    fn of(selection: &Selection) -> Self {
        let region = selection.current();
        Self {
            kind: region.kind,
            id: region.id,
        }
    }
}

/// Owns the view state and applies actions through `reduce`.
///
/// Every selection change is published to observers as a `ScopeEvent`.
#[derive(Debug, Default)]
pub struct RegionHierarchyController {
    state: ViewState,
    events: EventBus<ScopeEvent>,
}

impl RegionHierarchyController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at the national level with the given display settings.
    pub fn with_settings(overlay: OverlayMetric, theme: Theme, chamber: Chamber) -> Self {
        Self {
            state: ViewState {
                overlay,
                theme,
                chamber,
                ..ViewState::default()
            },
            events: EventBus::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn breadcrumb(&self) -> Vec<Region> {
        self.state.selection.breadcrumb()
    }

    pub fn notice(&self) -> Option<&str> {
        self.state.notice.as_deref()
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&Envelope<ScopeEvent>) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Number of scope events published so far.
    pub fn events_emitted(&self) -> u64 {
        self.events.emitted()
    }

    /// Applies `action` and returns the effects to execute.
    ///
    /// A rejected action still commits its placeholder notice.
    pub fn dispatch(
        &mut self,
        action: Action,
        districts: &dyn DistrictCatalog,
    ) -> Result<Vec<Effect>, Rejection> {
        let transition = reduce(&self.state, &action, districts);
        let previous = std::mem::replace(&mut self.state, transition.state);

        if let Some(rejection) = transition.rejection {
            debug!(?action, %rejection, "action rejected");
            return Err(rejection);
        }

        if previous.selection != self.state.selection {
            let event = ScopeEvent::of(&self.state.selection);
            info!(kind = event.kind.as_str(), id = %event.id, "selection changed");
            self.events.emit(event);
        }
        Ok(transition.effects)
    }

    pub fn select_state(&mut self, state: &str) -> Result<Vec<Effect>, Rejection> {
        self.dispatch(Action::SelectState(state.to_string()), &NoDistricts)
    }

    pub fn select_county(
        &mut self,
        county_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<Effect>, Rejection> {
        self.dispatch(
            Action::SelectCounty {
                id: county_id.to_string(),
                name: name.map(str::to_string),
            },
            &NoDistricts,
        )
    }

    pub fn select_district(
        &mut self,
        district_id: &str,
        districts: &dyn DistrictCatalog,
    ) -> Result<Vec<Effect>, Rejection> {
        self.dispatch(Action::SelectDistrict(district_id.to_string()), districts)
    }

    /// Returns to the national view from any depth. Never rejected.
    pub fn clear_selection(&mut self) -> Vec<Effect> {
        self.dispatch(Action::ClearSelection, &NoDistricts)
            .unwrap_or_else(|_| vec![Effect::ResetViewport])
    }

    pub fn navigate_to(&mut self, level: RegionKind) -> Result<Vec<Effect>, Rejection> {
        self.dispatch(Action::NavigateTo(level), &NoDistricts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{RegionHierarchyController, ScopeEvent};
    use crate::overlay::{OverlayMetric, Theme};
    use foundation::Chamber;
    use crate::hierarchy::{
        DistrictAvailability, DistrictCatalog, NoDistricts, Rejection, Selection,
    };
    use crate::region::RegionKind;
    use crate::view_state::Effect;
    use pretty_assertions::assert_eq;

    struct Ready;

    impl DistrictCatalog for Ready {
        fn availability(&self, _: &str, _: Chamber) -> DistrictAvailability {
            DistrictAvailability::Ready
        }

        fn district_name(&self, _: &str, _: Chamber, _: &str) -> Option<Option<String>> {
            Some(Some("Legislative District 12".to_string()))
        }
    }

    fn crumbs(c: &RegionHierarchyController) -> Vec<String> {
        c.breadcrumb().into_iter().map(|r| r.display_name).collect()
    }

    #[test]
    fn county_after_state_yields_three_level_breadcrumb() {
        let mut c = RegionHierarchyController::new();
        c.select_state("Arizona").expect("state");
        c.select_county("04013", Some("Maricopa")).expect("county");
        assert_eq!(
            crumbs(&c),
            vec!["United States", "Arizona", "Maricopa County"]
        );
    }

    #[test]
    fn clear_selection_returns_to_national_from_any_depth() {
        let mut c = RegionHierarchyController::new();
        assert_eq!(c.clear_selection(), vec![Effect::ResetViewport]);

        c.select_state("AZ").expect("state");
        assert_eq!(c.clear_selection(), vec![Effect::ResetViewport]);
        assert_eq!(c.selection(), &Selection::National);

        c.select_state("AZ").expect("state");
        c.select_county("4019", None).expect("county");
        c.clear_selection();
        assert_eq!(c.selection(), &Selection::National);
        assert_eq!(crumbs(&c), vec!["United States"]);

        c.select_state("AZ").expect("state");
        c.select_district("12", &Ready).expect("district");
        assert_eq!(c.selection().kind(), RegionKind::District);
        assert_eq!(
            crumbs(&c),
            vec!["United States", "Arizona", "Legislative District 12"]
        );
        assert_eq!(c.clear_selection(), vec![Effect::ResetViewport]);
        assert_eq!(c.selection(), &Selection::National);
    }

    #[test]
    fn settings_apply_without_events() {
        let c = RegionHierarchyController::with_settings(
            OverlayMetric::Momentum,
            Theme::Dark,
            Chamber::Senate,
        );
        assert_eq!(c.state().chamber, Chamber::Senate);
        assert_eq!(c.state().overlay, OverlayMetric::Momentum);
        assert_eq!(c.selection(), &Selection::National);
        assert_eq!(c.events_emitted(), 0);
    }

    #[test]
    fn district_without_dataset_is_rejected_with_placeholder() {
        let mut c = RegionHierarchyController::new();
        c.select_state("Arizona").expect("state");
        let err = c.select_district("3", &NoDistricts).unwrap_err();
        assert!(matches!(err, Rejection::DistrictsUnavailable { .. }));
        assert_eq!(c.selection().kind(), RegionKind::State);
        assert!(c.notice().is_some_and(|n| n.contains("not available")));
    }

    #[test]
    fn observers_receive_scope_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut c = RegionHierarchyController::new();
        let sink = Arc::clone(&seen);
        c.subscribe(move |env| sink.lock().expect("lock").push(env.event.clone()));

        c.select_state("AZ").expect("state");
        c.select_state("AZ").expect("same state");
        c.select_county("04013", None).expect("county");
        assert!(c.select_county("06037", None).is_err());
        c.navigate_to(RegionKind::State).expect("back to state");

        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![
                ScopeEvent {
                    kind: RegionKind::State,
                    id: "04".into()
                },
                ScopeEvent {
                    kind: RegionKind::County,
                    id: "04013".into()
                },
                ScopeEvent {
                    kind: RegionKind::State,
                    id: "04".into()
                },
            ]
        );
        assert_eq!(c.events_emitted(), 3);
    }
}
