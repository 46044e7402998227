//! Cartographic projections for the heat-map.
//!
//! Projected coordinates are screen-oriented: x grows to the right and y grows
//! downward, matching the pixel space of the map container.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use super::Vec2;
use crate::bounds::Aabb2;

/// Latitude limit of spherical Web Mercator.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Standard parallels of the contiguous-US equal-area conic.
pub const ALBERS_PARALLELS_DEG: [f64; 2] = [29.5, 45.5];

/// Central meridian of the contiguous-US equal-area conic.
pub const ALBERS_CENTRAL_MERIDIAN_DEG: f64 = -96.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ProjectionKind {
    /// Albers conic equal-area, tuned for the contiguous United States.
    #[default]
    ConicEqualArea,
    /// Spherical Web Mercator.
    Mercator,
}

impl ProjectionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "albers" | "conic" | "conic-equal-area" | "conic_equal_area" => {
                Some(ProjectionKind::ConicEqualArea)
            }
            "mercator" | "web-mercator" | "web_mercator" => Some(ProjectionKind::Mercator),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionKind::ConicEqualArea => "albers",
            ProjectionKind::Mercator => "mercator",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// No finite coordinates to fit.
    EmptyGeometry,
    /// Projected bounds have (near) zero width or height.
    DegenerateExtent { width: f64, height: f64 },
    /// The target pixel extent has no usable area.
    InvalidViewport { width: f64, height: f64 },
    /// The fit produced a non-finite scale or translation.
    NonFinite,
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::EmptyGeometry => write!(f, "geometry has no finite coordinates"),
            FitError::DegenerateExtent { width, height } => {
                write!(f, "degenerate projected extent: {width}x{height}")
            }
            FitError::InvalidViewport { width, height } => {
                write!(f, "viewport too small to fit: {width}x{height}")
            }
            FitError::NonFinite => write!(f, "projection fit produced non-finite parameters"),
        }
    }
}

impl std::error::Error for FitError {}

/// Precomputed constants of the conic equal-area projection.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Conic {
    n: f64,
    c: f64,
    r0: f64,
}

impl Conic {
    fn new(parallels_deg: [f64; 2]) -> Self {
        let sy0 = parallels_deg[0].to_radians().sin();
        let sy1 = parallels_deg[1].to_radians().sin();
        let n = (sy0 + sy1) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;
        Self { n, c, r0 }
    }

    fn forward(&self, lambda: f64, phi: f64) -> Vec2 {
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        Vec2::new(r * (lambda * self.n).sin(), self.r0 - r * (lambda * self.n).cos())
    }

    fn inverse(&self, x: f64, y: f64) -> Vec2 {
        let r0y = self.r0 - y;
        let mut l = x.atan2(r0y.abs()) * r0y.signum();
        if r0y * self.n < 0.0 {
            l -= PI * x.signum() * r0y.signum();
        }
        let s = (self.c - (x * x + r0y * r0y) * self.n * self.n) / (2.0 * self.n);
        Vec2::new(l / self.n, s.clamp(-1.0, 1.0).asin())
    }
}

/// A projection with a uniform scale and a pixel translation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub translate: Vec2,
    conic: Conic,
}

impl Projection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            scale: 1.0,
            translate: Vec2::ZERO,
            conic: Conic::new(ALBERS_PARALLELS_DEG),
        }
    }

    pub fn with_transform(mut self, scale: f64, translate: Vec2) -> Self {
        self.scale = scale;
        self.translate = translate;
        self
    }

    /// Unscaled projection of a lon/lat (degrees) point, y up.
    fn raw(&self, lon_lat: Vec2) -> Option<Vec2> {
        if !lon_lat.is_finite() {
            return None;
        }
        let p = match self.kind {
            ProjectionKind::ConicEqualArea => {
                let lambda = wrap_degrees(lon_lat.x - ALBERS_CENTRAL_MERIDIAN_DEG).to_radians();
                self.conic.forward(lambda, lon_lat.y.to_radians())
            }
            ProjectionKind::Mercator => {
                let lat = lon_lat
                    .y
                    .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
                    .to_radians();
                Vec2::new(lon_lat.x.to_radians(), (FRAC_PI_4 + lat / 2.0).tan().ln())
            }
        };
        p.is_finite().then_some(p)
    }

    /// Projects a lon/lat (degrees) point into pixel space.
    pub fn project(&self, lon_lat: Vec2) -> Option<Vec2> {
        let p = self.raw(lon_lat)?;
        let out = Vec2::new(
            self.translate.x + self.scale * p.x,
            self.translate.y - self.scale * p.y,
        );
        out.is_finite().then_some(out)
    }

    /// Maps a pixel-space point back to lon/lat degrees.
    pub fn invert(&self, px: Vec2) -> Option<Vec2> {
        if self.scale == 0.0 || !px.is_finite() {
            return None;
        }
        let x = (px.x - self.translate.x) / self.scale;
        let y = (self.translate.y - px.y) / self.scale;
        let out = match self.kind {
            ProjectionKind::ConicEqualArea => {
                let ll = self.conic.inverse(x, y);
                Vec2::new(
                    wrap_degrees(ll.x.to_degrees() + ALBERS_CENTRAL_MERIDIAN_DEG),
                    ll.y.to_degrees(),
                )
            }
            ProjectionKind::Mercator => Vec2::new(
                x.to_degrees(),
                (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees(),
            ),
        };
        out.is_finite().then_some(out)
    }

    /// Pixel-space bounds of a set of lon/lat points under this projection.
    pub fn projected_bounds(&self, points: impl IntoIterator<Item = Vec2>) -> Aabb2 {
        Aabb2::from_points(points.into_iter().filter_map(|p| self.project(p)))
    }

    /// Fits a projection so the given lon/lat points fill `extent` (pixels),
    /// preserving aspect ratio and centering the shorter axis.
    pub fn fit_extent(
        kind: ProjectionKind,
        points: impl IntoIterator<Item = Vec2>,
        extent: Aabb2,
    ) -> Result<Projection, FitError> {
        let (w, h) = (extent.width(), extent.height());
        if extent.is_empty() || !(w > 0.0 && h > 0.0) {
            return Err(FitError::InvalidViewport {
                width: w,
                height: h,
            });
        }

        let unit = Projection::new(kind);
        let b = unit.projected_bounds(points);
        if b.is_empty() {
            return Err(FitError::EmptyGeometry);
        }
        if b.is_degenerate() {
            return Err(FitError::DegenerateExtent {
                width: b.width(),
                height: b.height(),
            });
        }

        let k = (w / b.width()).min(h / b.height());
        let tx = extent.min[0] + (w - k * (b.max[0] + b.min[0])) / 2.0;
        let ty = extent.min[1] + (h - k * (b.max[1] + b.min[1])) / 2.0;
        let fitted = unit.with_transform(k, Vec2::new(tx, ty));
        if !(k.is_finite() && k > 0.0 && fitted.translate.is_finite()) {
            return Err(FitError::NonFinite);
        }
        Ok(fitted)
    }
}

/// Normalizes a longitude difference into `[-180, 180)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::{FitError, Projection, ProjectionKind, wrap_degrees};
    use crate::bounds::Aabb2;
    use crate::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn contiguous_us() -> Vec<Vec2> {
        vec![
            Vec2::new(-124.7, 48.4),
            Vec2::new(-124.4, 32.5),
            Vec2::new(-117.1, 32.5),
            Vec2::new(-97.1, 25.8),
            Vec2::new(-80.0, 25.0),
            Vec2::new(-67.0, 44.8),
            Vec2::new(-95.2, 49.0),
        ]
    }

    #[test]
    fn wrap_keeps_range() {
        assert_close(wrap_degrees(190.0), -170.0, 1e-9);
        assert_close(wrap_degrees(-190.0), 170.0, 1e-9);
        assert_close(wrap_degrees(0.0), 0.0, 1e-9);
    }

    #[test]
    fn albers_round_trip() {
        let p = Projection::new(ProjectionKind::ConicEqualArea)
            .with_transform(1000.0, Vec2::new(480.0, 300.0));
        for ll in contiguous_us() {
            let px = p.project(ll).expect("project");
            let back = p.invert(px).expect("invert");
            assert_close(back.x, ll.x, 1e-6);
            assert_close(back.y, ll.y, 1e-6);
        }
    }

    #[test]
    fn mercator_round_trip_and_north_up() {
        let p = Projection::new(ProjectionKind::Mercator).with_transform(500.0, Vec2::ZERO);
        let north = p.project(Vec2::new(-100.0, 45.0)).expect("north");
        let south = p.project(Vec2::new(-100.0, 30.0)).expect("south");
        assert!(north.y < south.y, "screen y grows downward");
        let back = p.invert(north).expect("invert");
        assert_close(back.x, -100.0, 1e-9);
        assert_close(back.y, 45.0, 1e-9);
    }

    #[test]
    fn fit_extent_fills_target_and_preserves_aspect() {
        let target = Aabb2::new([32.0, 32.0], [928.0, 568.0]);
        let p = Projection::fit_extent(ProjectionKind::ConicEqualArea, contiguous_us(), target)
            .expect("fit");
        let b = p.projected_bounds(contiguous_us());
        // One axis is filled exactly, the other fits inside.
        let fills_w = (b.width() - target.width()).abs() < 1e-6;
        let fills_h = (b.height() - target.height()).abs() < 1e-6;
        assert!(fills_w || fills_h);
        assert!(b.min[0] >= target.min[0] - 1e-6 && b.max[0] <= target.max[0] + 1e-6);
        assert!(b.min[1] >= target.min[1] - 1e-6 && b.max[1] <= target.max[1] + 1e-6);
        // Centered.
        assert_close(b.center().x, target.center().x, 1e-6);
        assert_close(b.center().y, target.center().y, 1e-6);
    }

    #[test]
    fn fit_extent_rejects_degenerate_geometry() {
        let target = Aabb2::new([0.0, 0.0], [100.0, 100.0]);
        let err = Projection::fit_extent(
            ProjectionKind::Mercator,
            vec![Vec2::new(-100.0, 40.0), Vec2::new(-100.0, 40.0)],
            target,
        )
        .unwrap_err();
        assert!(matches!(err, FitError::DegenerateExtent { .. }));

        let err = Projection::fit_extent(ProjectionKind::Mercator, Vec::new(), target).unwrap_err();
        assert_eq!(err, FitError::EmptyGeometry);
    }

    #[test]
    fn fit_extent_rejects_empty_viewport() {
        let target = Aabb2::new([32.0, 32.0], [32.0, 100.0]);
        let err = Projection::fit_extent(ProjectionKind::Mercator, contiguous_us(), target)
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidViewport { .. }));
    }

    #[test]
    fn kind_parse() {
        assert_eq!(
            ProjectionKind::parse("Albers"),
            Some(ProjectionKind::ConicEqualArea)
        );
        assert_eq!(
            ProjectionKind::parse("web-mercator"),
            Some(ProjectionKind::Mercator)
        );
        assert_eq!(ProjectionKind::parse("robinson"), None);
    }
}
