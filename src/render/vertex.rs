use glam::{DVec2, DVec3};

/// Vertex with world position, framebuffer position, camera depth and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    pub screen_position: DVec2,
    /// Distance along the view direction, always positive once clipped
    pub depth: f64,
    pub normal: DVec3,
}
