//! Camera controller: position, zoom, follow, lerp, bounds and shake.

use gamma_common::{Rect, Size};
use gamma_project::ZoomOp;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Smallest zoom the camera accepts; keeps view math finite.
pub const MIN_ZOOM: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraLerp {
    pub start_x: f64,
    pub start_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub duration: f64,
    pub elapsed: f64,
}

impl CameraLerp {
    /// Eased position at the current elapsed time and whether it is done.
    fn sample(&self) -> (DVec2, bool) {
        let progress = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        let eased = progress * (2.0 - progress);
        let start = DVec2::new(self.start_x, self.start_y);
        let target = DVec2::new(self.target_x, self.target_y);
        (start + (target - start) * eased, progress >= 1.0)
    }
}

/// Persistent camera state. This is what save slots capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    #[serde(default)]
    pub bounds: Option<CameraBounds>,
    #[serde(default)]
    pub lerp: Option<CameraLerp>,
    #[serde(default)]
    pub last_x: f64,
    #[serde(default)]
    pub last_y: f64,
    #[serde(default)]
    pub is_moving: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow: Option<String>,
}

impl CameraState {
    pub fn centered_on(center: DVec2) -> Self {
        Self {
            x: center.x,
            y: center.y,
            zoom: 1.0,
            bounds: None,
            lerp: None,
            last_x: center.x,
            last_y: center.y,
            is_moving: false,
            follow: None,
        }
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    fn set_position_vec(&mut self, p: DVec2) {
        self.x = p.x;
        self.y = p.y;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Shake {
    intensity: f64,
    remaining: f64,
}

/// Camera controller. Shake is draw-time only and never saved.
#[derive(Debug, Clone)]
pub struct Camera {
    state: CameraState,
    shake: Shake,
    rng: u64,
    shake_offset: DVec2,
}

impl Camera {
    pub fn new(center: DVec2, seed: u64) -> Self {
        Self {
            state: CameraState::centered_on(center),
            shake: Shake::default(),
            rng: seed,
            shake_offset: DVec2::ZERO,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Reset to a fresh camera centered on `center`. Shake is cleared too.
    pub fn reset(&mut self, center: DVec2) {
        self.state = CameraState::centered_on(center);
        self.shake = Shake::default();
        self.shake_offset = DVec2::ZERO;
    }

    /// Replace the persistent state (load). Active shake is dropped. The
    /// moving flag is measured against this tick's starting position, not
    /// the one stored in `state`.
    pub fn restore(&mut self, state: CameraState) {
        let (last_x, last_y) = (self.state.last_x, self.state.last_y);
        self.state = state;
        self.state.zoom = self.state.zoom.max(MIN_ZOOM);
        self.state.last_x = last_x;
        self.state.last_y = last_y;
        self.shake = Shake::default();
        self.shake_offset = DVec2::ZERO;
        self.refresh_moving();
    }

    pub fn position(&self) -> DVec2 {
        self.state.position()
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn is_moving(&self) -> bool {
        self.state.is_moving
    }

    pub fn follow_target(&self) -> Option<&str> {
        self.state.follow.as_deref()
    }

    /// Offset to add to the camera position when drawing.
    pub fn shake_offset(&self) -> DVec2 {
        self.shake_offset
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.remaining > 0.0
    }

    /// Camera center lies inside the rectangle (edges inclusive).
    pub fn in_bounds(&self, rect: &Rect) -> bool {
        rect.contains(self.position())
    }

    /// Visible world extent at the current zoom.
    pub fn view_size(&self, viewport: Size) -> DVec2 {
        viewport.to_vec() / self.state.zoom
    }

    pub fn screen_to_world(&self, screen: DVec2, viewport: Size) -> DVec2 {
        (screen - viewport.to_vec() * 0.5) / self.state.zoom + self.position()
    }

    /// `None` stops following.
    pub fn follow(&mut self, target: Option<String>) {
        self.state.follow = target;
    }

    pub fn set_position(&mut self, p: DVec2) {
        self.state.set_position_vec(p);
    }

    pub fn start_shake(&mut self, intensity: f64, duration: f64) {
        self.shake = Shake {
            intensity,
            remaining: duration,
        };
    }

    pub fn change_zoom(&mut self, op: ZoomOp, amount: f64) {
        let zoom = match op {
            ZoomOp::Set => amount,
            ZoomOp::Add => self.state.zoom + amount,
        };
        self.state.zoom = if zoom.is_finite() { zoom.max(MIN_ZOOM) } else { 1.0 };
    }

    /// Frame `area` with `padding` on every side. Cancels lerp and follow.
    pub fn zoom_to_fit(&mut self, area: Rect, padding: f64, viewport: Size) {
        let zoom_x = viewport.width / (area.width() + padding * 2.0);
        let zoom_y = viewport.height / (area.height() + padding * 2.0);
        let zoom = zoom_x.min(zoom_y);
        self.state.zoom = if zoom.is_finite() { zoom.max(MIN_ZOOM) } else { 1.0 };
        self.state.set_position_vec(area.center());
        self.state.lerp = None;
        self.state.follow = None;
    }

    /// Ease toward `target` over `duration` seconds. Cancels follow.
    pub fn lerp_to(&mut self, target: DVec2, duration: f64) {
        self.state.lerp = Some(CameraLerp {
            start_x: self.state.x,
            start_y: self.state.y,
            target_x: target.x,
            target_y: target.y,
            duration,
            elapsed: 0.0,
        });
        self.state.follow = None;
    }

    pub fn set_bounds(&mut self, bounds: CameraBounds) {
        self.state.bounds = Some(bounds);
    }

    pub fn clear_bounds(&mut self) {
        self.state.bounds = None;
    }

    /// Record the position at the start of a tick for motion detection.
    pub fn begin_tick(&mut self) {
        self.state.last_x = self.state.x;
        self.state.last_y = self.state.y;
    }

    /// Resolve lerp, follow and bounds, then update the moving flag and
    /// advance shake. `target_center` looks up a live instance's center.
    pub fn update(
        &mut self,
        dt: f64,
        viewport: Size,
        smoothing: f64,
        target_center: impl Fn(&str) -> Option<DVec2>,
    ) {
        if let Some(lerp) = self.state.lerp.as_mut() {
            lerp.elapsed += dt;
            let (p, done) = lerp.sample();
            self.state.set_position_vec(p);
            if done {
                self.state.lerp = None;
            }
        } else if let Some(id) = self.state.follow.as_deref() {
            match target_center(id) {
                Some(target) => {
                    let p = self.position();
                    self.state.set_position_vec(p + (target - p) * smoothing);
                }
                None => {
                    tracing::debug!(object = id, "follow target gone");
                    self.state.follow = None;
                }
            }
        }

        if let Some(b) = self.state.bounds {
            let half = self.view_size(viewport) * 0.5;
            self.state.x = (b.min_x + half.x).max(self.state.x.min(b.max_x - half.x));
            self.state.y = (b.min_y + half.y).max(self.state.y.min(b.max_y - half.y));
        }

        self.refresh_moving();
        self.advance_shake(dt);
    }

    fn refresh_moving(&mut self) {
        self.state.is_moving = self.is_shaking()
            || self.state.lerp.is_some()
            || self.state.x != self.state.last_x
            || self.state.y != self.state.last_y;
    }

    fn advance_shake(&mut self, dt: f64) {
        if self.shake.remaining > 0.0 {
            let jx = self.next_unit() * 2.0 - 1.0;
            let jy = self.next_unit() * 2.0 - 1.0;
            self.shake_offset = DVec2::new(jx, jy) * self.shake.intensity;
            self.shake.remaining -= dt;
        } else {
            self.shake_offset = DVec2::ZERO;
        }
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        self.rng = splitmix64(self.rng);
        (self.rng >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Splitmix64 step. Drives shake jitter reproducibly from the session seed.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    fn no_target(_: &str) -> Option<DVec2> {
        None
    }

    #[test]
    fn lerp_eases_out_and_finishes() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.lerp_to(DVec2::new(100.0, 0.0), 1.0);
        cam.begin_tick();
        cam.update(0.5, VIEW, 0.1, no_target);
        // p = 0.5, eased = 0.75
        assert!((cam.position().x - 75.0).abs() < 1e-9);
        assert!(cam.is_moving());
        cam.begin_tick();
        cam.update(0.5, VIEW, 0.1, no_target);
        assert_eq!(cam.position().x, 100.0);
        assert!(cam.state().lerp.is_none());
        cam.begin_tick();
        cam.update(0.5, VIEW, 0.1, no_target);
        assert!(!cam.is_moving());
    }

    #[test]
    fn follow_moves_a_tenth_of_the_way() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.follow(Some("p".into()));
        cam.begin_tick();
        cam.update(0.016, VIEW, 0.1, |_| Some(DVec2::new(100.0, 50.0)));
        assert!((cam.position() - DVec2::new(10.0, 5.0)).length() < 1e-9);
    }

    #[test]
    fn lerp_suspends_follow() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.follow(Some("p".into()));
        cam.lerp_to(DVec2::new(10.0, 0.0), 1.0);
        assert_eq!(cam.follow_target(), None);
    }

    #[test]
    fn vanished_follow_target_clears() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.follow(Some("gone".into()));
        cam.update(0.016, VIEW, 0.1, no_target);
        assert_eq!(cam.follow_target(), None);
    }

    #[test]
    fn bounds_keep_view_inside() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.set_bounds(CameraBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2000.0,
            max_y: 1000.0,
        });
        for target in [
            DVec2::new(-500.0, -500.0),
            DVec2::new(5000.0, 5000.0),
            DVec2::new(1000.0, 500.0),
        ] {
            cam.set_position(target);
            cam.update(0.016, VIEW, 0.1, no_target);
            let p = cam.position();
            assert!((400.0..=1600.0).contains(&p.x), "x = {}", p.x);
            assert!((300.0..=700.0).contains(&p.y), "y = {}", p.y);
        }
    }

    #[test]
    fn bounds_respect_zoom() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.change_zoom(ZoomOp::Set, 2.0);
        cam.set_bounds(CameraBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2000.0,
            max_y: 1000.0,
        });
        cam.update(0.016, VIEW, 0.1, no_target);
        assert_eq!(cam.position(), DVec2::new(200.0, 150.0));
    }

    #[test]
    fn zoom_to_fit_frames_area() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.follow(Some("x".into()));
        let area = Rect {
            min: DVec2::new(0.0, 0.0),
            max: DVec2::new(380.0, 100.0),
        };
        cam.zoom_to_fit(area, 10.0, VIEW);
        assert_eq!(cam.zoom(), 2.0);
        assert_eq!(cam.position(), DVec2::new(190.0, 50.0));
        assert_eq!(cam.follow_target(), None);
    }

    #[test]
    fn restore_measures_motion_from_tick_start() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.begin_tick();
        let mut moved = CameraState::centered_on(DVec2::new(50.0, 0.0));
        moved.is_moving = false;
        cam.restore(moved);
        assert!(cam.is_moving());
        assert_eq!(cam.state().last_x, 0.0);

        cam.begin_tick();
        let mut still = CameraState::centered_on(DVec2::new(50.0, 0.0));
        still.is_moving = true;
        cam.restore(still);
        assert!(!cam.is_moving());
    }

    #[test]
    fn zoom_add_and_floor() {
        let mut cam = Camera::new(DVec2::ZERO, 1);
        cam.change_zoom(ZoomOp::Add, 0.5);
        assert_eq!(cam.zoom(), 1.5);
        cam.change_zoom(ZoomOp::Set, -3.0);
        assert_eq!(cam.zoom(), MIN_ZOOM);
    }

    #[test]
    fn shake_jitters_within_intensity_then_stops() {
        let mut cam = Camera::new(DVec2::ZERO, 42);
        cam.start_shake(5.0, 0.05);
        cam.begin_tick();
        cam.update(0.02, VIEW, 0.1, no_target);
        assert!(cam.is_moving());
        let o = cam.shake_offset();
        assert!(o.x.abs() <= 5.0 && o.y.abs() <= 5.0);
        for _ in 0..5 {
            cam.begin_tick();
            cam.update(0.02, VIEW, 0.1, no_target);
        }
        assert!(!cam.is_shaking());
        assert_eq!(cam.shake_offset(), DVec2::ZERO);
        assert_eq!(cam.position(), DVec2::ZERO);
    }

    #[test]
    fn shake_is_reproducible_from_seed() {
        let mut a = Camera::new(DVec2::ZERO, 7);
        let mut b = Camera::new(DVec2::ZERO, 7);
        a.start_shake(3.0, 1.0);
        b.start_shake(3.0, 1.0);
        a.update(0.1, VIEW, 0.1, no_target);
        b.update(0.1, VIEW, 0.1, no_target);
        assert_eq!(a.shake_offset(), b.shake_offset());
    }

    #[test]
    fn screen_maps_through_zoom() {
        let mut cam = Camera::new(DVec2::new(400.0, 300.0), 1);
        cam.change_zoom(ZoomOp::Set, 2.0);
        let w = cam.screen_to_world(DVec2::new(600.0, 300.0), VIEW);
        assert_eq!(w, DVec2::new(500.0, 300.0));
    }

    #[test]
    fn in_bounds_is_inclusive() {
        let cam = Camera::new(DVec2::new(10.0, 10.0), 1);
        let r = Rect::from_origin_size(DVec2::ZERO, Size::new(10.0, 10.0));
        assert!(cam.in_bounds(&r));
    }
}
