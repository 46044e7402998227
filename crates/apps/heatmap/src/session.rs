//! Drill-down session: wires the hierarchy controller to the dataset loader,
//! the projection engine, and the viewport.

use std::sync::Arc;

use foundation::{pad_fips, Chamber, StateCode};
use formats::{BoundaryCollection, BoundaryFeature, DistrictProfile};
use layers::{legend, Legend, RegionLayer, RegionLayerSnapshot, ScoreProvider, ScoreTable};
use scene::{
    Action, DistrictAvailability, DistrictCatalog, Effect, OverlayMetric, Region,
    RegionHierarchyController, Rejection, Selection, Theme, ViewState,
};
use serde::Serialize;
use streaming::{DatasetLoader, DatasetScope, DocumentSource, LoadOutcome, LoadState};
use tracing::{debug, info};
use viewport::{FitOutcome, ProjectionEngine, ViewportController, ViewportState};

use crate::config::{ConfigError, HeatmapConfig};

/// District availability as seen through the loader.
struct LoaderDistricts<'a> {
    loader: &'a DatasetLoader,
}

impl DistrictCatalog for LoaderDistricts<'_> {
    fn availability(&self, state_fips: &str, chamber: Chamber) -> DistrictAvailability {
        match self
            .loader
            .load_state(&DatasetScope::districts(state_fips, chamber))
        {
            LoadState::Loaded => DistrictAvailability::Ready,
            LoadState::Loading => DistrictAvailability::Loading,
            LoadState::Unloaded => DistrictAvailability::NotRequested,
            LoadState::Unavailable => DistrictAvailability::Unavailable,
        }
    }

    fn district_name(
        &self,
        state_fips: &str,
        chamber: Chamber,
        district_id: &str,
    ) -> Option<Option<String>> {
        let layer = self
            .loader
            .boundaries(&DatasetScope::districts(state_fips, chamber))?;
        find_district(&layer, district_id).map(|f| f.name().map(str::to_string))
    }
}

/// District ids match exactly or as numbers ("07" is district 7).
fn same_district(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || matches!((a.parse::<u32>(), b.parse::<u32>()), (Ok(x), Ok(y)) if x == y)
}

fn find_district<'a>(
    layer: &'a BoundaryCollection,
    district_id: &str,
) -> Option<&'a BoundaryFeature> {
    layer.features.iter().find(|f| {
        f.identifier()
            .is_some_and(|id| same_district(&id, district_id))
    })
}

fn find_county<'a>(
    counties: &'a BoundaryCollection,
    county_id: &str,
) -> Option<&'a BoundaryFeature> {
    let wanted = pad_fips(county_id, 5);
    counties
        .features
        .iter()
        .find(|f| f.identifier().is_some_and(|id| pad_fips(&id, 5) == wanted))
}

fn find_state<'a>(states: &'a BoundaryCollection, state: StateCode) -> Option<&'a BoundaryFeature> {
    states
        .features
        .iter()
        .find(|f| f.identifier().is_some_and(|id| pad_fips(&id, 2) == state.fips))
        .or_else(|| states.find_by_name(state.name))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub id: String,
    pub name: String,
    pub score: Option<f64>,
    pub color: String,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<DistrictProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareSummary {
    pub region: Region,
    pub scores: std::collections::BTreeMap<OverlayMetric, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub scope: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSummary {
    pub scope: String,
    pub url: Option<String>,
    pub reason: String,
}

/// Serializable picture of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub breadcrumb: Vec<Region>,
    pub overlay: OverlayMetric,
    pub theme: Theme,
    pub chamber: &'static str,
    pub viewport: ViewportState,
    pub notice: Option<String>,
    pub regions: Vec<RegionSummary>,
    pub districts: Vec<RegionSummary>,
    pub compare: Vec<CompareSummary>,
    pub legend: Legend,
    pub datasets: Vec<DatasetSummary>,
    pub diagnostics: Vec<DiagnosticSummary>,
}

pub struct DrilldownSession {
    loader: DatasetLoader,
    controller: RegionHierarchyController,
    engine: ProjectionEngine,
    viewport: ViewportController,
    layer: RegionLayer,
    scores: ScoreTable,
}

impl DrilldownSession {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        config: &HeatmapConfig,
        scores: ScoreTable,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = ProjectionEngine::new(
            config.projection,
            config.container,
            config.fallback_table(),
        )
        .with_padding(config.padding);

        let controller =
            RegionHierarchyController::with_settings(config.overlay, config.theme, config.chamber);

        Ok(Self {
            loader: DatasetLoader::new(source, config.catalog.clone()),
            controller,
            engine,
            viewport: ViewportController::default(),
            layer: RegionLayer::new(),
            scores,
        })
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn controller(&self) -> &RegionHierarchyController {
        &self.controller
    }

    pub fn state(&self) -> &ViewState {
        self.controller.state()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    pub fn scores_mut(&mut self) -> &mut ScoreTable {
        &mut self.scores
    }

    /// Loads the national base map and fits the whole-nation view.
    pub async fn start(&mut self) -> Vec<(DatasetScope, LoadOutcome)> {
        let outcomes = self
            .loader
            .load_many(&[DatasetScope::States, DatasetScope::Counties])
            .await;
        self.refit(&Selection::National, true);
        outcomes
    }

    /// Applies a user action and executes its effects.
    pub async fn dispatch(&mut self, action: Action) -> Result<(), Rejection> {
        let effects = {
            let districts = LoaderDistricts {
                loader: &self.loader,
            };
            self.controller.dispatch(action, &districts)?
        };
        self.execute(effects).await;
        Ok(())
    }

    pub async fn select_state(&mut self, state: &str) -> Result<(), Rejection> {
        self.dispatch(Action::SelectState(state.to_string())).await
    }

    /// Selects a county, taking its display name from the counties dataset.
    pub async fn select_county(&mut self, county_id: &str) -> Result<(), Rejection> {
        let name = self
            .loader
            .boundaries(&DatasetScope::Counties)
            .and_then(|c| find_county(&c, county_id).and_then(|f| f.name().map(str::to_string)));
        self.dispatch(Action::SelectCounty {
            id: county_id.to_string(),
            name,
        })
        .await
    }

    /// Selects a district of the active chamber. The id is canonicalized to the
    /// boundary feature's own identifier so "07" and "7" select the same region.
    pub async fn select_district(&mut self, district_id: &str) -> Result<(), Rejection> {
        let view = self.controller.state();
        let canonical = view.selection.state().and_then(|state| {
            let layer = self
                .loader
                .boundaries(&DatasetScope::districts(state.fips, view.chamber))?;
            find_district(&layer, district_id).and_then(BoundaryFeature::identifier)
        });
        let id = canonical.unwrap_or_else(|| district_id.to_string());
        self.dispatch(Action::SelectDistrict(id)).await
    }

    pub async fn clear_selection(&mut self) {
        let effects = self.controller.clear_selection();
        self.execute(effects).await;
    }

    pub async fn navigate_to(&mut self, level: scene::RegionKind) -> Result<(), Rejection> {
        self.dispatch(Action::NavigateTo(level)).await
    }

    /// Adds a region to the compare set with its current metric snapshot.
    pub async fn add_to_compare(&mut self, region: Region) -> Result<(), Rejection> {
        let snapshot = self.scores.snapshot(&region.id);
        self.dispatch(Action::AddCompare { region, snapshot }).await
    }

    pub async fn add_current_to_compare(&mut self) -> Result<(), Rejection> {
        let region = self.controller.selection().current();
        self.add_to_compare(region).await
    }

    /// Advances viewport animation.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.viewport.update(dt)
    }

    pub async fn set_overlay(&mut self, overlay: OverlayMetric) -> Result<(), Rejection> {
        self.dispatch(Action::SetOverlay(overlay)).await
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), Rejection> {
        self.dispatch(Action::SetTheme(theme)).await
    }

    pub async fn set_chamber(&mut self, chamber: Chamber) -> Result<(), Rejection> {
        self.dispatch(Action::SetChamber(chamber)).await
    }

    pub async fn set_compare_mode(&mut self, on: bool) -> Result<(), Rejection> {
        self.dispatch(Action::SetCompareMode(on)).await
    }

    /// Runs the viewport animation to rest.
    pub fn settle(&mut self) {
        // Smoothing converges well within this many 100ms steps.
        for _ in 0..200 {
            if !self.tick(0.1) {
                break;
            }
        }
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        let mut scopes = Vec::new();
        let mut refits = Vec::new();
        for effect in effects {
            match effect {
                Effect::RequestCounties { .. } => scopes.push(DatasetScope::Counties),
                Effect::RequestDistricts { state_fips } => {
                    for chamber in Chamber::ALL {
                        scopes.push(DatasetScope::districts(&state_fips, chamber));
                    }
                    scopes.push(DatasetScope::profiles(&state_fips));
                }
                Effect::Refit(selection) => refits.push(Some(selection)),
                Effect::ResetViewport => refits.push(None),
            }
        }

        if !scopes.is_empty() {
            for (scope, outcome) in self.loader.load_many(&scopes).await {
                debug!(scope = %scope, ?outcome, "dataset request settled");
            }
        }

        for refit in refits {
            match refit {
                Some(selection) => self.refit(&selection, false),
                None => {
                    self.viewport.reset_view();
                }
            }
        }
    }

    fn refit(&mut self, selection: &Selection, jump: bool) {
        let outcome = match selection {
            Selection::National => match self.loader.boundaries(&DatasetScope::States) {
                Some(states) => self.engine.fit_nation(&states),
                None => self.engine.fit_region(viewport::NATION_NAME, None),
            },
            Selection::State { state } => {
                let states = self.loader.boundaries(&DatasetScope::States);
                let geometry = states.as_deref().and_then(|s| find_state(s, *state));
                self.engine
                    .fit_region(state.name, geometry.map(|f| &f.geometry))
            }
            Selection::County { county, .. } => {
                let counties = self.loader.boundaries(&DatasetScope::Counties);
                let geometry = counties.as_deref().and_then(|c| find_county(c, &county.id));
                self.engine
                    .fit_region(&county.display_name, geometry.map(|f| &f.geometry))
            }
            Selection::District {
                state,
                chamber,
                district_id,
                district,
            } => {
                let layer = self
                    .loader
                    .boundaries(&DatasetScope::districts(state.fips, *chamber));
                let geometry = layer.as_deref().and_then(|l| find_district(l, district_id));
                self.engine
                    .fit_region(&district.display_name, geometry.map(|f| &f.geometry))
            }
        };

        if let Selection::National = selection {
            if let Some(view) = outcome.view() {
                self.viewport.set_home(view);
            }
        }
        match outcome {
            FitOutcome::Unchanged { .. } => {
                info!(region = %selection.current().display_name, "viewport left unchanged");
            }
            fitted => {
                if let Some(view) = fitted.view() {
                    let view = match selection {
                        Selection::National => self.viewport.home(),
                        _ => view,
                    };
                    if jump {
                        self.viewport.jump_to(view);
                    } else {
                        self.viewport.fly_to(view);
                    }
                }
            }
        }
    }

    /// Regions to draw for the current view, projected with the national base projection.
    pub fn layer_snapshot(&self) -> RegionLayerSnapshot {
        let projection = self.engine.base_projection().ok();
        self.layer.extract(
            self.controller.state(),
            self.loader.registry(),
            &self.scores,
            projection.as_ref(),
        )
    }

    pub fn report(&self) -> SessionReport {
        let view = self.controller.state();
        let snapshot = self.layer_snapshot();
        let summarize = |regions: &[layers::RenderedRegion]| {
            regions
                .iter()
                .map(|r| RegionSummary {
                    id: r.region.id.clone(),
                    name: r.region.display_name.clone(),
                    score: r.score,
                    color: r.color.hex(),
                    selected: r.selected,
                    profile: r.profile.clone(),
                })
                .collect::<Vec<_>>()
        };

        SessionReport {
            breadcrumb: self.controller.breadcrumb(),
            overlay: view.overlay,
            theme: view.theme,
            chamber: view.chamber.as_str(),
            viewport: self.viewport.view(),
            notice: snapshot.placeholder.clone(),
            regions: summarize(&snapshot.regions),
            districts: summarize(&snapshot.districts),
            compare: view
                .compare
                .entries()
                .iter()
                .map(|e| CompareSummary {
                    region: e.region.clone(),
                    scores: e.metric_snapshot.scores.clone(),
                })
                .collect(),
            legend: legend(view.theme),
            datasets: self
                .loader
                .registry()
                .iter()
                .map(|d| DatasetSummary {
                    scope: d.scope.key(),
                    state: d.load_state.as_str(),
                    version: d.version.clone(),
                })
                .collect(),
            diagnostics: self
                .loader
                .diagnostics()
                .iter()
                .map(|d| DiagnosticSummary {
                    scope: d.scope.key(),
                    url: d.url.clone(),
                    reason: d.reason.clone(),
                })
                .collect(),
        }
    }
}
