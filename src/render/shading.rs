use crate::scene::Rgb;
use glam::{DVec2, DVec3};

/// Where the sun hangs; light arrives from this direction
pub const LIGHT_POSITION: DVec3 = DVec3::new(40.0, 80.0, 40.0);
pub const AMBIENT: f64 = 0.7;
pub const SUN_INTENSITY: f64 = 0.8;
pub const FOG_NEAR: f64 = 20.0;
pub const FOG_FAR: f64 = 60.0;
pub const BACKGROUND: Rgb = Rgb::hex(0xf8f9fa);

/// Edge function used in rasterization
pub fn edge_function(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Calculates the normal vector of a triangle
pub fn calculate_normal(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Ambient plus directional sunlight for a surface normal
pub fn calculate_light_intensity(normal: DVec3) -> f64 {
    let light_dir = LIGHT_POSITION.normalize();
    AMBIENT + SUN_INTENSITY * normal.dot(light_dir).max(0.0)
}

/// Applies lighting to a color
pub fn apply_lighting(color: Rgb, intensity: f64) -> Rgb {
    let scale = |channel: u8| (channel as f64 * intensity).clamp(0.0, 255.0) as u8;
    Rgb(scale(color.0), scale(color.1), scale(color.2))
}

/// 0 before the fog starts, 1 at and beyond full fog
pub fn fog_factor(distance: f64) -> f64 {
    ((distance - FOG_NEAR) / (FOG_FAR - FOG_NEAR)).clamp(0.0, 1.0)
}

pub fn apply_fog(color: Rgb, distance: f64) -> Rgb {
    mix(color, BACKGROUND, fog_factor(distance))
}

/// Linear blend from `a` (t = 0) to `b` (t = 1)
pub fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgb(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
