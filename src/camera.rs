use crate::config::HallConfig;
use crate::input::{InputState, KEY_BACK, KEY_FORWARD, KEY_LEFT, KEY_RIGHT};
use crate::scene::Ray;
use glam::{DVec2, DVec3};
use std::f64::consts::FRAC_PI_3;

/// Pitch is held within +/- this angle
pub const PITCH_LIMIT: f64 = FRAC_PI_3;
/// Camera height above the rig's floor position
pub const EYE_HEIGHT: f64 = 2.0;
/// Vertical field of view in degrees
pub const FOV_Y_DEGREES: f64 = 75.0;
pub const NEAR: f64 = 0.1;
/// Frame duration the per-frame move speed is expressed in
pub const NOMINAL_FRAME: f64 = 1.0 / 60.0;
/// World units of dolly per pixel of pinch spread
pub const PINCH_DOLLY_PER_PX: f64 = 0.02;
/// Where the rig starts, outside the exhibit area
pub const SPAWN: DVec3 = DVec3::new(0.0, 0.0, 20.0);

/// First-person camera: floor position plus look angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: DVec3,
    /// Radians about the vertical axis
    pub yaw: f64,
    /// Radians about the camera's local X axis
    pub pitch: f64,
}

impl CameraRig {
    pub fn spawn() -> Self {
        CameraRig {
            position: SPAWN,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn eye(&self) -> DVec3 {
        self.position + DVec3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// Unit look direction; yaw 0 and pitch 0 look down -Z
    pub fn forward(&self) -> DVec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        DVec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn right(&self) -> DVec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        DVec3::new(cos_yaw, 0.0, -sin_yaw)
    }

    pub fn up(&self) -> DVec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        DVec3::new(sin_pitch * sin_yaw, cos_pitch, sin_pitch * cos_yaw)
    }

    /// World point in camera space: x right, y up, z depth along the look direction
    pub fn to_view(&self, world: DVec3) -> DVec3 {
        let offset = world - self.eye();
        DVec3::new(
            offset.dot(self.right()),
            offset.dot(self.up()),
            offset.dot(self.forward()),
        )
    }

    /// Ray from the eye through a point in normalized device coordinates
    pub fn ray_through(&self, ndc: DVec2, aspect: f64) -> Ray {
        let tan_half = (FOV_Y_DEGREES.to_radians() / 2.0).tan();
        let direction = self.right() * (ndc.x * tan_half * aspect)
            + self.up() * (ndc.y * tan_half)
            + self.forward();
        Ray::new(self.eye(), direction)
    }

    /// Projects a world point to normalized device coordinates and depth
    #[cfg(test)]
    pub fn project(&self, world: DVec3, aspect: f64) -> Option<(DVec2, f64)> {
        let view = self.to_view(world);
        if view.z < NEAR {
            return None;
        }
        Some((project_view(view, aspect), view.z))
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::spawn()
    }
}

/// Perspective divide of a camera-space point (depth must be positive)
pub fn project_view(view: DVec3, aspect: f64) -> DVec2 {
    let tan_half = (FOV_Y_DEGREES.to_radians() / 2.0).tan();
    DVec2::new(
        view.x / (view.z * tan_half * aspect),
        view.y / (view.z * tan_half),
    )
}

/// Turns held keys and look deltas into camera motion, one update per frame
#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraController {
    pub bounds: f64,
    pub move_speed: f64,
    pub mouse_sensitivity: f64,
    pub touch_sensitivity: f64,
}

impl OrbitCameraController {
    pub fn new(config: &HallConfig) -> Self {
        OrbitCameraController {
            bounds: config.bounds,
            move_speed: config.settings.move_speed,
            mouse_sensitivity: config.settings.mouse_sensitivity,
            touch_sensitivity: config.settings.touch_sensitivity,
        }
    }

    /// Advances the rig by one frame of `dt` seconds.
    ///
    /// Look deltas are consumed even when look is suppressed, so they never
    /// pile up while the panel is open or the pointer is free.
    pub fn tick(&self, dt: f64, input: &mut InputState, rig: CameraRig) -> CameraRig {
        let mut rig = rig;
        let (mouse_dx, mouse_dy) = input.consume_pointer_delta();
        let (touch_dx, touch_dy) = input.consume_touch_delta();
        let pinch = input.consume_pinch_delta();

        if input.exhibit_open {
            return self.clamp(rig);
        }

        if input.pointer_locked {
            rig.yaw -= mouse_dx * self.mouse_sensitivity;
            rig.pitch -= mouse_dy * self.mouse_sensitivity;
        }
        // Drag-to-look turns with the finger, the opposite of relative mouse look
        rig.yaw += touch_dx * self.touch_sensitivity;
        rig.pitch -= touch_dy * self.touch_sensitivity;
        rig.pitch = rig.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let frames = dt / NOMINAL_FRAME;
        let mut direction = DVec3::ZERO;
        if input.any_pressed(&KEY_FORWARD) {
            direction.z -= 1.0;
        }
        if input.any_pressed(&KEY_BACK) {
            direction.z += 1.0;
        }
        if input.any_pressed(&KEY_LEFT) {
            direction.x -= 1.0;
        }
        if input.any_pressed(&KEY_RIGHT) {
            direction.x += 1.0;
        }
        if direction.length_squared() > 0.0 {
            let (sin_yaw, cos_yaw) = rig.yaw.sin_cos();
            let direction = direction.normalize();
            let world = DVec3::new(
                direction.x * cos_yaw + direction.z * sin_yaw,
                0.0,
                -direction.x * sin_yaw + direction.z * cos_yaw,
            );
            rig.position += world * self.move_speed * frames;
        }

        // Pinch dolly follows the heading only; pitch never lifts the eye off the floor
        if pinch != 0.0 {
            let (sin_yaw, cos_yaw) = rig.yaw.sin_cos();
            let level_forward = DVec3::new(-sin_yaw, 0.0, -cos_yaw);
            rig.position += level_forward * pinch * PINCH_DOLLY_PER_PX;
        }

        self.clamp(rig)
    }

    /// Hard square clamp on the floor plane
    pub fn clamp(&self, mut rig: CameraRig) -> CameraRig {
        rig.position.x = rig.position.x.clamp(-self.bounds, self.bounds);
        rig.position.z = rig.position.z.clamp(-self.bounds, self.bounds);
        rig
    }
}

/// power2 in-out easing
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Smooth glide of the rig's floor position toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTween {
    from: DVec2,
    to: DVec2,
    elapsed: f64,
    duration: f64,
}

impl CameraTween {
    pub const DEFAULT_DURATION: f64 = 2.0;

    pub fn new(from: DVec2, to: DVec2, duration: f64) -> Self {
        CameraTween {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(f64::EPSILON),
        }
    }

    /// Advances the tween and returns the eased (x, z)
    pub fn advance(&mut self, dt: f64) -> DVec2 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = ease_in_out_quad(self.elapsed / self.duration);
        self.from.lerp(self.to, t)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceTier, HallConfig};
    use approx::assert_relative_eq;

    fn controller() -> OrbitCameraController {
        OrbitCameraController::new(&HallConfig::desktop())
    }

    fn locked_input() -> InputState {
        let mut input = InputState::default();
        input.pointer_locked = true;
        input
    }

    #[test]
    fn idle_tick_leaves_position_unchanged() {
        let mut input = InputState::default();
        let rig = CameraRig::spawn();
        let next = controller().tick(NOMINAL_FRAME, &mut input, rig);
        assert_eq!(next.position, rig.position);
    }

    #[test]
    fn forward_moves_along_negative_z() {
        let mut input = InputState::default();
        input.set_key("KeyW", true);
        let next = controller().tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(next.position.z, SPAWN.z - 0.1, epsilon = 1e-12);
        assert_relative_eq!(next.position.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut input = InputState::default();
        input.set_key("KeyW", true);
        input.set_key("KeyD", true);
        let start = CameraRig::spawn();
        let next = controller().tick(NOMINAL_FRAME, &mut input, start);
        assert_relative_eq!(next.position.distance(start.position), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn opposing_keys_cancel_without_drift() {
        let mut input = InputState::default();
        input.set_key("KeyW", true);
        input.set_key("KeyS", true);
        let start = CameraRig::spawn();
        let next = controller().tick(NOMINAL_FRAME, &mut input, start);
        assert_eq!(next.position, start.position);
    }

    #[test]
    fn movement_follows_yaw() {
        let mut input = InputState::default();
        input.set_key("KeyW", true);
        let rig = CameraRig {
            yaw: std::f64::consts::FRAC_PI_2,
            ..CameraRig::spawn()
        };
        let next = controller().tick(NOMINAL_FRAME, &mut input, rig);
        assert_relative_eq!(next.position.x, -0.1, epsilon = 1e-12);
        assert_relative_eq!(next.position.z, SPAWN.z, epsilon = 1e-12);
    }

    #[test]
    fn position_stays_in_bounds_for_any_key_sequence() {
        let controller = controller();
        let keys = ["KeyW", "KeyA", "KeyS", "KeyD"];
        let mut rig = CameraRig::spawn();
        let mut input = InputState::default();
        for step in 0..4000 {
            let key = keys[(step / 700) % keys.len()];
            for other in keys {
                input.set_key(other, other == key || (step % 3 == 0 && other == "KeyD"));
            }
            input.apply_pointer_delta(((step * 37) % 11) as f64 - 5.0, 0.0);
            input.pointer_locked = true;
            rig = controller.tick(NOMINAL_FRAME * 3.0, &mut input, rig);
            assert!(rig.position.x.abs() <= controller.bounds);
            assert!(rig.position.z.abs() <= controller.bounds);
        }
    }

    #[test]
    fn corner_of_square_is_reachable() {
        let controller = controller();
        let mut input = InputState::default();
        input.set_key("KeyW", true);
        input.set_key("KeyA", true);
        let mut rig = CameraRig::spawn();
        for _ in 0..3000 {
            rig = controller.tick(NOMINAL_FRAME, &mut input, rig);
        }
        assert_relative_eq!(rig.position.x, -controller.bounds);
        assert_relative_eq!(rig.position.z, -controller.bounds);
    }

    #[test]
    fn pitch_is_clamped_for_huge_deltas() {
        let controller = controller();
        let mut input = locked_input();
        input.apply_pointer_delta(0.0, -1.0e9);
        let rig = controller.tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(rig.pitch, PITCH_LIMIT);

        input.apply_pointer_delta(0.0, 1.0e9);
        let rig = controller.tick(NOMINAL_FRAME, &mut input, rig);
        assert_relative_eq!(rig.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn mouse_look_requires_pointer_lock() {
        let mut input = InputState::default();
        input.apply_pointer_delta(100.0, 50.0);
        let rig = controller().tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_eq!(rig.yaw, 0.0);
        assert_eq!(rig.pitch, 0.0);
        // the delta was consumed rather than left to accumulate
        assert_eq!(input.consume_pointer_delta(), (0.0, 0.0));
    }

    #[test]
    fn mouse_look_uses_pointer_sensitivity() {
        let mut input = locked_input();
        input.apply_pointer_delta(100.0, 50.0);
        let rig = controller().tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(rig.yaw, -0.2, epsilon = 1e-12);
        assert_relative_eq!(rig.pitch, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn touch_look_inverts_horizontal_axis() {
        let mut input = InputState::default();
        input.apply_touch_delta(10.0, 10.0);
        let rig = controller().tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(rig.yaw, 0.08, epsilon = 1e-12);
        assert_relative_eq!(rig.pitch, -0.08, epsilon = 1e-12);
    }

    #[test]
    fn open_exhibit_suppresses_look_and_move() {
        let mut input = locked_input();
        input.exhibit_open = true;
        input.set_key("KeyW", true);
        input.apply_pointer_delta(40.0, 40.0);
        let start = CameraRig::spawn();
        let rig = controller().tick(NOMINAL_FRAME, &mut input, start);
        assert_eq!(rig, start);
    }

    #[test]
    fn pinch_dollies_along_look_direction() {
        let mut input = InputState::default();
        input.apply_pinch_delta(50.0);
        let rig = controller().tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(rig.position.z, SPAWN.z - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pinch_dolly_ignores_pitch() {
        let mut input = InputState::default();
        input.apply_pinch_delta(50.0);
        let tilted = CameraRig {
            pitch: -0.8,
            ..CameraRig::spawn()
        };
        let rig = controller().tick(NOMINAL_FRAME, &mut input, tilted);
        assert_relative_eq!(rig.position.y, SPAWN.y, epsilon = 1e-12);
        assert_relative_eq!(rig.position.z, SPAWN.z - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn touch_tier_moves_at_half_speed() {
        let controller = OrbitCameraController::new(&HallConfig::for_tier(DeviceTier::Touch));
        let mut input = InputState::default();
        input.set_key("KeyS", true);
        let rig = controller.tick(NOMINAL_FRAME, &mut input, CameraRig::spawn());
        assert_relative_eq!(rig.position.z, SPAWN.z + 0.05, epsilon = 1e-12);
    }

    #[test]
    fn projection_and_ray_agree() {
        let rig = CameraRig {
            yaw: 0.4,
            pitch: -0.2,
            ..CameraRig::spawn()
        };
        let target = DVec3::new(3.0, 1.0, 5.0);
        let aspect = 1.6;
        let (ndc, depth) = rig.project(target, aspect).unwrap();
        let ray = rig.ray_through(ndc, aspect);
        let distance = rig.eye().distance(target);
        let point = ray.at(distance);
        assert!(depth > 0.0);
        assert_relative_eq!(point.x, target.x, epsilon = 1e-9);
        assert_relative_eq!(point.y, target.y, epsilon = 1e-9);
        assert_relative_eq!(point.z, target.z, epsilon = 1e-9);
    }

    #[test]
    fn camera_basis_is_orthonormal() {
        let rig = CameraRig {
            yaw: 1.1,
            pitch: 0.6,
            ..CameraRig::spawn()
        };
        assert_relative_eq!(rig.forward().length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rig.up().length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rig.forward().dot(rig.up()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rig.forward().dot(rig.right()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rig.right().dot(rig.up()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let rig = CameraRig::spawn();
        assert!(rig.project(DVec3::new(0.0, 2.0, 30.0), 1.0).is_none());
    }

    #[test]
    fn tween_eases_to_target() {
        let mut tween = CameraTween::new(DVec2::ZERO, DVec2::new(10.0, 4.0), 2.0);
        let halfway = tween.advance(1.0);
        assert_relative_eq!(halfway.x, 5.0, epsilon = 1e-12);
        assert!(!tween.is_finished());
        let end = tween.advance(5.0);
        assert_eq!(end, DVec2::new(10.0, 4.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn easing_starts_slow() {
        assert!(ease_in_out_quad(0.1) < 0.1);
        assert!(ease_in_out_quad(0.9) > 0.9);
        assert_relative_eq!(ease_in_out_quad(0.5), 0.5);
    }
}
