use earcutr::earcut;
use foundation::math::{Projection, Vec2};
use foundation::{StateCode, county_in_state};
use formats::{BoundaryFeature, BoundaryGeometry, DistrictProfile};
use scene::{Region, ViewState, chamber_label};
use streaming::{DatasetRegistry, DatasetScope, LoadState};
use tracing::debug;

use crate::metrics::ScoreProvider;
use crate::symbology::{RegionStyle, Rgb, get_color};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRegion {
    pub region: Region,
    pub score: Option<f64>,
    pub color: Rgb,
    pub style: RegionStyle,
    pub selected: bool,
    /// Profile metadata, for districts listed in the state's profile document.
    pub profile: Option<DistrictProfile>,
    /// Flat triangle list (3 vertices per triangle) in screen pixels.
    pub triangles: Vec<Vec2>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegionLayerSnapshot {
    /// States at the national level, otherwise the selected state's counties.
    pub regions: Vec<RenderedRegion>,
    /// The active chamber's districts, when a state is selected and the layer is loaded.
    pub districts: Vec<RenderedRegion>,
    pub placeholder: Option<String>,
}

/// The choropleth layer: one filled polygon per visible region.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RegionLayer;

impl RegionLayer {
    pub fn new() -> Self {
        Self
    }

    /// Collects the regions to draw for the current view.
    ///
    /// Triangles are only produced when a projection is supplied.
    pub fn extract(
        &self,
        view: &ViewState,
        registry: &DatasetRegistry,
        scores: &dyn ScoreProvider,
        projection: Option<&Projection>,
    ) -> RegionLayerSnapshot {
        let mut out = RegionLayerSnapshot {
            placeholder: view.notice.clone(),
            ..RegionLayerSnapshot::default()
        };
        let selected_id = view.selection.current().id;
        let render = |region: Region, feature: &BoundaryFeature| {
            let score = scores.score(&region.id, view.overlay);
            let selected = region.id == selected_id;
            RenderedRegion {
                score,
                color: get_color(score, view.theme),
                style: RegionStyle::for_score(score, view.theme, selected),
                selected,
                profile: None,
                triangles: projection
                    .map(|p| triangulate(&feature.geometry, p))
                    .unwrap_or_default(),
                region,
            }
        };

        let Some(state) = view.selection.state() else {
            if let Some(states) = registry.boundaries(&DatasetScope::States) {
                for feature in &states.features {
                    match resolve_feature_state(feature) {
                        Some(code) => out.regions.push(render(Region::state(code), feature)),
                        None => {
                            debug!(id = ?feature.id, "skipping feature outside the state table")
                        }
                    }
                }
            }
            return out;
        };

        if let Some(counties) = registry.boundaries(&DatasetScope::Counties) {
            for feature in &counties.features {
                let Some(id) = feature.identifier() else {
                    continue;
                };
                if county_in_state(&id, state.fips) {
                    out.regions
                        .push(render(Region::county(state, &id, feature.name()), feature));
                }
            }
        }

        let scope = DatasetScope::districts(state.fips, view.chamber);
        match registry.state(&scope) {
            LoadState::Loaded => {
                let profiles = registry.profiles(&DatasetScope::profiles(state.fips));
                if let Some(districts) = registry.boundaries(&scope) {
                    for feature in &districts.features {
                        let Some(id) = feature.identifier() else {
                            continue;
                        };
                        let region = Region::district(state, view.chamber, &id, feature.name());
                        let mut rendered = render(region, feature);
                        rendered.profile = profiles
                            .as_ref()
                            .and_then(|p| p.get(view.chamber, &id))
                            .cloned();
                        out.districts.push(rendered);
                    }
                }
            }
            LoadState::Unavailable if out.placeholder.is_none() => {
                out.placeholder = Some(format!(
                    "{} district boundaries are not available for {}",
                    chamber_label(view.chamber),
                    state.name
                ));
            }
            _ => {}
        }
        out
    }
}

fn resolve_feature_state(feature: &BoundaryFeature) -> Option<StateCode> {
    feature
        .identifier()
        .and_then(|id| StateCode::resolve(&id))
        .or_else(|| feature.name().and_then(StateCode::resolve))
}

fn triangulate(geometry: &BoundaryGeometry, projection: &Projection) -> Vec<Vec2> {
    let mut out = Vec::new();
    for polygon in &geometry.polygons {
        out.extend(triangulate_polygon(polygon, projection));
    }
    out
}

fn triangulate_polygon(rings: &[Vec<Vec2>], projection: &Projection) -> Vec<Vec2> {
    let mut vertices: Vec<Vec2> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for (ring_i, ring) in rings.iter().enumerate() {
        let mut pts: Vec<Vec2> = ring.iter().filter_map(|p| projection.project(*p)).collect();
        drop_closing_duplicate(&mut pts);
        if pts.len() < 3 {
            // An outer ring that cannot be drawn takes its holes with it.
            if ring_i == 0 {
                return Vec::new();
            }
            continue;
        }
        if ring_i > 0 {
            hole_indices.push(vertices.len());
        }
        for p in pts {
            coords.push(p.x);
            coords.push(p.y);
            vertices.push(p);
        }
    }

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };
    indices
        .into_iter()
        .filter_map(|i| vertices.get(i).copied())
        .collect()
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
        if points.len() >= 2
            && (first.x - last.x).abs() < 1e-9
            && (first.y - last.y).abs() < 1e-9
        {
            points.pop();
        }
    }
}
