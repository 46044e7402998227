//! Pan/zoom state of the heat-map viewport.
//!
//! Zoom steps and gesture commits change the committed view immediately; the
//! displayed view follows it with exponential smoothing in `update(dt)`.

use foundation::math::{MERCATOR_MAX_LAT_DEG, wrap_degrees};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;

/// Default national view center (lon, lat): the geographic center of the contiguous US.
pub const NATIONAL_CENTER: [f64; 2] = [-98.58, 39.83];

/// Zoom change of one `zoom_in`/`zoom_out` step.
const ZOOM_STEP: f64 = 1.0;

/// Smoothing factor toward the committed view (higher = faster response).
const VIEW_SMOOTHING: f64 = 8.0;

/// Below this distance the displayed view snaps to the committed one.
const SNAP_EPSILON: f64 = 1e-4;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// (lon, lat) in degrees.
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::national()
    }
}

impl ViewportState {
    pub fn new(center: [f64; 2], zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn national() -> Self {
        Self::new(NATIONAL_CENTER, MIN_ZOOM)
    }

    /// Zoom clamped to `[1, 8]`, longitude wrapped, latitude kept in the Mercator band.
    /// Non-finite parts fall back to the national default.
    pub fn clamped(self) -> Self {
        let zoom = if self.zoom.is_finite() {
            self.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        };
        let [lon, lat] = self.center;
        let center = if lon.is_finite() && lat.is_finite() {
            [
                wrap_degrees(lon),
                lat.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG),
            ]
        } else {
            NATIONAL_CENTER
        };
        Self { center, zoom }
    }

    fn distance(&self, other: &Self) -> f64 {
        let dx = self.center[0] - other.center[0];
        let dy = self.center[1] - other.center[1];
        (dx * dx + dy * dy).sqrt() + (self.zoom - other.zoom).abs()
    }
}

/// Owns the viewport: the committed view, the displayed (animating) view, and
/// an uncommitted gesture preview.
#[derive(Debug, Clone)]
pub struct ViewportController {
    committed: ViewportState,
    displayed: ViewportState,
    home: ViewportState,
    gesture: Option<ViewportState>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportState::national())
    }
}

impl ViewportController {
    pub fn new(home: ViewportState) -> Self {
        let home = pinned_home(home);
        Self {
            committed: home,
            displayed: home,
            home,
            gesture: None,
        }
    }

    /// The committed view.
    pub fn view(&self) -> ViewportState {
        self.committed
    }

    /// What is on screen: the gesture preview if one is active, else the animation frame.
    pub fn displayed(&self) -> ViewportState {
        self.gesture.unwrap_or(self.displayed)
    }

    pub fn home(&self) -> ViewportState {
        self.home
    }

    /// Only the center of `home` is taken; the home zoom is always the national one.
    pub fn set_home(&mut self, home: ViewportState) {
        self.home = pinned_home(home);
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.step_zoom(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.step_zoom(-ZOOM_STEP)
    }

    fn step_zoom(&mut self, delta: f64) -> f64 {
        self.committed.zoom = (self.committed.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        self.committed.zoom
    }

    /// Records an in-progress pan/zoom frame. Nothing is committed.
    pub fn preview_gesture(&mut self, center: [f64; 2], zoom: f64) {
        self.gesture = Some(ViewportState::new(center, zoom).clamped());
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Applies the final gesture view. The view is already on screen, so there is no animation.
    pub fn commit_gesture(&mut self, center: [f64; 2], zoom: f64) -> ViewportState {
        let view = ViewportState::new(center, zoom).clamped();
        self.gesture = None;
        self.committed = view;
        self.displayed = view;
        view
    }

    pub fn reset_view(&mut self) -> ViewportState {
        self.fly_to(self.home)
    }

    /// Commits `target` and animates the displayed view toward it.
    pub fn fly_to(&mut self, target: ViewportState) -> ViewportState {
        self.gesture = None;
        self.committed = target.clamped();
        self.committed
    }

    /// Commits `target` without animation.
    pub fn jump_to(&mut self, target: ViewportState) -> ViewportState {
        self.fly_to(target);
        self.displayed = self.committed;
        self.committed
    }

    pub fn is_animating(&self) -> bool {
        self.displayed != self.committed
    }

    /// Advances the animation. Returns `true` while still animating.
    pub fn update(&mut self, dt: f64) -> bool {
        let dt = if dt.is_finite() { dt.clamp(0.0, 0.1) } else { 0.0 };
        let alpha = 1.0 - (-VIEW_SMOOTHING * dt).exp();

        let from = self.displayed;
        let to = self.committed;
        // Pan along the short way around the antimeridian.
        let dlon = wrap_degrees(to.center[0] - from.center[0]);
        let next = ViewportState::new(
            [
                wrap_degrees(from.center[0] + dlon * alpha),
                from.center[1] + (to.center[1] - from.center[1]) * alpha,
            ],
            from.zoom + (to.zoom - from.zoom) * alpha,
        );

        self.displayed = if next.distance(&to) < SNAP_EPSILON {
            to
        } else {
            next
        };
        self.is_animating()
    }
}

fn pinned_home(home: ViewportState) -> ViewportState {
    ViewportState::new(home.center, MIN_ZOOM).clamped()
}

#[cfg(test)]
mod tests {
    use super::{MAX_ZOOM, MIN_ZOOM, NATIONAL_CENTER, ViewportController, ViewportState};

    #[test]
    fn zoom_in_saturates_at_max() {
        let mut c = ViewportController::default();
        for _ in 0..10 {
            c.zoom_in();
        }
        assert_eq!(c.view().zoom, MAX_ZOOM);
        for _ in 0..10 {
            c.zoom_out();
        }
        assert_eq!(c.view().zoom, MIN_ZOOM);
    }

    #[test]
    fn gestures_commit_only_at_the_end() {
        let mut c = ViewportController::default();
        c.preview_gesture([-112.0, 34.0], 3.0);
        assert!(c.is_gesture_active());
        assert_eq!(c.view(), ViewportState::national());
        assert_eq!(c.displayed().zoom, 3.0);

        let v = c.commit_gesture([-112.0, 34.0], 11.0);
        assert_eq!(v.zoom, MAX_ZOOM);
        assert_eq!(c.view(), v);
        assert!(!c.is_gesture_active());
        assert!(!c.is_animating());
    }

    #[test]
    fn cancelled_gesture_restores_display() {
        let mut c = ViewportController::default();
        c.preview_gesture([-80.0, 30.0], 4.0);
        c.cancel_gesture();
        assert_eq!(c.displayed(), ViewportState::national());
    }

    #[test]
    fn fly_to_converges_with_update() {
        let mut c = ViewportController::default();
        let target = ViewportState::new([-111.7, 34.3], 5.5);
        c.fly_to(target);
        assert!(c.is_animating());

        let mut frames = 0;
        while c.update(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 1000, "animation did not settle");
        }
        assert_eq!(c.displayed(), target);
    }

    #[test]
    fn reset_view_returns_home_at_zoom_one() {
        let mut c = ViewportController::default();
        c.commit_gesture([-70.0, 42.0], 6.0);
        let v = c.reset_view();
        assert_eq!(v.center, NATIONAL_CENTER);
        assert_eq!(v.zoom, 1.0);
    }

    #[test]
    fn home_zoom_stays_national() {
        let mut c = ViewportController::new(ViewportState::new([-98.0, 39.0], 3.0));
        assert_eq!(c.home().zoom, MIN_ZOOM);

        c.set_home(ViewportState::new([-100.0, 40.0], 5.0));
        assert_eq!(c.home(), ViewportState::new([-100.0, 40.0], MIN_ZOOM));

        c.commit_gesture([-70.0, 42.0], 6.0);
        let v = c.reset_view();
        assert_eq!(v.center, [-100.0, 40.0]);
        assert_eq!(v.zoom, MIN_ZOOM);
    }

    #[test]
    fn clamps_untrusted_views() {
        let v = ViewportState::new([190.0, 95.0], f64::NAN).clamped();
        assert_eq!(v.zoom, MIN_ZOOM);
        assert!((v.center[0] - -170.0).abs() < 1e-9);
        assert!(v.center[1] < 90.0);
    }
}
