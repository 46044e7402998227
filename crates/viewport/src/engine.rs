use foundation::Aabb2;
use foundation::math::{FitError, Projection, ProjectionKind, Vec2};
use formats::{BoundaryCollection, BoundaryGeometry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::controller::{MAX_ZOOM, MIN_ZOOM, ViewportState};
use crate::fallback::{FallbackTable, NATION_NAME};

pub const DEFAULT_PADDING: f64 = 32.0;

/// Lon/lat extent used as the national base before a states dataset is fitted.
const CONTIGUOUS_US: Aabb2 = Aabb2 {
    min: [-124.8, 24.4],
    max: [-66.9, 49.4],
};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The container inset by `padding` on every side.
    pub fn inner_extent(&self, padding: f64) -> Result<Aabb2, FitError> {
        let w = self.width - 2.0 * padding;
        let h = self.height - 2.0 * padding;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(FitError::InvalidViewport {
                width: w,
                height: h,
            });
        }
        Ok(Aabb2::new([padding, padding], [padding + w, padding + h]))
    }
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self::new(960.0, 600.0)
    }
}

/// Result of a fit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted(ViewportState),
    /// The fit failed; the curated view for the region was used instead.
    Fallback { view: ViewportState, reason: FitError },
    /// The fit failed and no curated view exists. The viewport must not move.
    Unchanged { reason: FitError },
}

impl FitOutcome {
    pub fn view(&self) -> Option<ViewportState> {
        match self {
            FitOutcome::Fitted(view) | FitOutcome::Fallback { view, .. } => Some(*view),
            FitOutcome::Unchanged { .. } => None,
        }
    }
}

/// Fits projections to the container and derives per-region views.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    kind: ProjectionKind,
    container: ContainerSize,
    padding: f64,
    fallback: FallbackTable,
    nation: Option<Projection>,
}

impl ProjectionEngine {
    pub fn new(kind: ProjectionKind, container: ContainerSize, fallback: FallbackTable) -> Self {
        Self {
            kind,
            container,
            padding: DEFAULT_PADDING,
            fallback,
            nation: None,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding.max(0.0);
        self
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn fallback(&self) -> &FallbackTable {
        &self.fallback
    }

    /// Resizing invalidates the national fit.
    pub fn set_container(&mut self, container: ContainerSize) {
        self.container = container;
        self.nation = None;
    }

    /// Fits a projection so `geometry` fills the padded container.
    pub fn fit_projection(&self, geometry: &BoundaryGeometry) -> Result<Projection, FitError> {
        let extent = self.container.inner_extent(self.padding)?;
        Projection::fit_extent(self.kind, geometry.outer_vertices(), extent)
    }

    /// The whole-nation projection: the last successful national fit, or a fit
    /// of the contiguous US when none has happened yet.
    pub fn base_projection(&self) -> Result<Projection, FitError> {
        if let Some(p) = self.nation {
            return Ok(p);
        }
        let extent = self.container.inner_extent(self.padding)?;
        Projection::fit_extent(self.kind, box_outline(CONTIGUOUS_US), extent)
    }

    /// Whole-nation fit over every state boundary. On success the result becomes
    /// the base projection for region zoom computation.
    pub fn fit_nation(&mut self, states: &BoundaryCollection) -> FitOutcome {
        let extent = match self.container.inner_extent(self.padding) {
            Ok(extent) => extent,
            Err(reason) => return self.fall_back(NATION_NAME, reason),
        };
        let points = states.features.iter().flat_map(|f| f.geometry.outer_vertices());
        match Projection::fit_extent(self.kind, points, extent) {
            Ok(projection) => {
                self.nation = Some(projection);
                let center = projection
                    .invert(extent.center())
                    .map(|c| [c.x, c.y])
                    .unwrap_or(ViewportState::national().center);
                debug!(scale = projection.scale, "national projection fitted");
                FitOutcome::Fitted(ViewportState::new(center, MIN_ZOOM).clamped())
            }
            Err(reason) => self.fall_back(NATION_NAME, reason),
        }
    }

    /// Single-region fit: centroid and zoom of `geometry`, else the curated
    /// view for `name`, else no change.
    pub fn fit_region(&self, name: &str, geometry: Option<&BoundaryGeometry>) -> FitOutcome {
        let computed = match geometry {
            Some(g) => self.compute_centroid_and_zoom(g),
            None => Err(FitError::EmptyGeometry),
        };
        match computed {
            Ok(view) => FitOutcome::Fitted(view),
            Err(reason) => self.fall_back(name, reason),
        }
    }

    /// Centroid of the region and the zoom at which it fills the padded
    /// container, clamped to `[1, 8]`.
    ///
    /// Projections are linear in scale, so the zoom is the ratio between the
    /// region's own fitted scale and the national base scale.
    pub fn compute_centroid_and_zoom(
        &self,
        geometry: &BoundaryGeometry,
    ) -> Result<ViewportState, FitError> {
        let centroid = centroid(geometry).ok_or(FitError::EmptyGeometry)?;
        let base = self.base_projection()?;
        let region = self.fit_projection(geometry)?;
        let zoom = region.scale / base.scale;
        if !zoom.is_finite() || !centroid.is_finite() {
            return Err(FitError::NonFinite);
        }
        Ok(ViewportState::new(
            [centroid.x, centroid.y],
            zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        ))
    }

    fn fall_back(&self, name: &str, reason: FitError) -> FitOutcome {
        match self.fallback.lookup(name) {
            Some(view) => {
                warn!(region = name, %reason, "projection fit failed, using fallback view");
                FitOutcome::Fallback { view, reason }
            }
            None => {
                warn!(region = name, %reason, "projection fit failed, viewport unchanged");
                FitOutcome::Unchanged { reason }
            }
        }
    }
}

/// Sampled outline of a lon/lat box, so curved projections see its true extent.
fn box_outline(b: Aabb2) -> Vec<Vec2> {
    const STEPS: usize = 16;
    let mut pts = Vec::with_capacity(STEPS * 4);
    for i in 0..STEPS {
        let t = i as f64 / STEPS as f64;
        let lon = b.min[0] + (b.max[0] - b.min[0]) * t;
        let lat = b.min[1] + (b.max[1] - b.min[1]) * t;
        pts.push(Vec2::new(lon, b.min[1]));
        pts.push(Vec2::new(lon, b.max[1]));
        pts.push(Vec2::new(b.min[0], lat));
        pts.push(Vec2::new(b.max[0], lat));
    }
    pts.push(Vec2::new(b.max[0], b.max[1]));
    pts
}

/// Area-weighted planar centroid of the polygons (holes subtract).
///
/// Falls back to the mean of the outer-ring vertices when the total area is zero.
pub fn centroid(geometry: &BoundaryGeometry) -> Option<Vec2> {
    let mut area_sum = 0.0;
    let mut weighted = Vec2::ZERO;
    for polygon in &geometry.polygons {
        for (i, ring) in polygon.iter().enumerate() {
            let (a, c) = ring_area_centroid(ring);
            // Holes are wound either way in the wild; force their sign.
            let a = if i == 0 { a.abs() } else { -a.abs() };
            if a != 0.0 && c.is_finite() {
                area_sum += a;
                weighted = weighted + c.scale(a);
            }
        }
    }
    if area_sum.abs() > f64::EPSILON {
        let c = weighted.scale(1.0 / area_sum);
        if c.is_finite() {
            return Some(c);
        }
    }

    let (mut sum, mut n) = (Vec2::ZERO, 0usize);
    for p in geometry.outer_vertices().filter(|p| p.is_finite()) {
        sum = sum + p;
        n += 1;
    }
    (n > 0).then(|| sum.scale(1.0 / n as f64))
}

/// Unsigned-by-caller shoelace area and centroid of one ring.
fn ring_area_centroid(ring: &[Vec2]) -> (f64, Vec2) {
    if ring.len() < 3 {
        return (0.0, Vec2::ZERO);
    }
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        let cross = p.cross(q);
        twice_area += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    if twice_area == 0.0 {
        return (0.0, Vec2::ZERO);
    }
    let area = twice_area / 2.0;
    (area, Vec2::new(cx / (6.0 * area), cy / (6.0 * area)))
}
