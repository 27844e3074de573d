use super::shading::{apply_fog, apply_lighting, calculate_light_intensity, edge_function, mix};
use super::vertex::Vertex;
use crate::scene::{Material, Rgb};
use glam::DVec3;

/// RGB pixels plus a depth buffer
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    depth: Vec<f64>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![Rgb::default(); width * height],
            depth: vec![f64::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
        self.depth.fill(f64::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    #[cfg(test)]
    pub fn depth_at(&self, x: usize, y: usize) -> f64 {
        self.depth[y * self.width + x]
    }

    /// Writes an opaque sample, or blends a translucent one without touching depth
    fn plot(&mut self, offset: usize, depth: f64, color: Rgb, opacity: f64) {
        if depth >= self.depth[offset] {
            return;
        }
        if opacity >= 1.0 {
            self.depth[offset] = depth;
            self.pixels[offset] = color;
        } else {
            self.pixels[offset] = mix(self.pixels[offset], color, opacity);
        }
    }
}

/// How a primitive is coloured: its material, seen from `eye`
#[derive(Debug, Clone, Copy)]
pub struct Shade {
    pub material: Material,
    pub eye: DVec3,
}

impl Shade {
    fn color_at(&self, position: DVec3, normal: DVec3) -> Rgb {
        let base = if self.material.lit {
            // Thin surfaces are lit from whichever side faces the viewer
            let normal = if normal.dot(self.eye - position) < 0.0 {
                -normal
            } else {
                normal
            };
            apply_lighting(self.material.color, calculate_light_intensity(normal))
        } else {
            self.material.color
        };
        apply_fog(base, position.distance(self.eye))
    }
}

/// Draws a triangle with per-pixel lighting, in either winding
pub fn draw_triangle(v0: &Vertex, v1: &Vertex, v2: &Vertex, frame: &mut Framebuffer, shade: &Shade) {
    if frame.width == 0 || frame.height == 0 {
        return;
    }
    let (s0, s1, s2) = (v0.screen_position, v1.screen_position, v2.screen_position);

    // Compute bounding box of the triangle
    let min_x = s0.x.min(s1.x).min(s2.x).floor().max(0.0);
    let max_x = s0.x.max(s1.x).max(s2.x).ceil().min(frame.width as f64 - 1.0);
    let min_y = s0.y.min(s1.y).min(s2.y).floor().max(0.0);
    let max_y = s0.y.max(s1.y).max(s2.y).ceil().min(frame.height as f64 - 1.0);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let area = edge_function(s0, s1, s2);
    if area.abs() < 1e-9 {
        return;
    }

    for y in min_y as usize..=max_y as usize {
        for x in min_x as usize..=max_x as usize {
            let p = glam::DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge_function(s1, s2, p) / area;
            let w1 = edge_function(s2, s0, p) / area;
            let w2 = edge_function(s0, s1, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            // Depth is interpolated as 1/z to stay perspective-correct
            let depth = 1.0 / (w0 / v0.depth + w1 / v1.depth + w2 / v2.depth);
            let offset = y * frame.width + x;
            if depth >= frame.depth[offset] {
                continue;
            }

            let position = v0.position * w0 + v1.position * w1 + v2.position * w2;
            let normal = (v0.normal * w0 + v1.normal * w1 + v2.normal * w2).normalize_or_zero();
            let color = shade.color_at(position, normal);
            frame.plot(offset, depth, color, shade.material.opacity);
        }
    }
}

/// Draws a depth-tested line between two vertices using Bresenham's algorithm
pub fn draw_line(a: &Vertex, b: &Vertex, frame: &mut Framebuffer, shade: &Shade) {
    let (mut x0, mut y0, x1, y1) = (
        a.screen_position.x.round() as isize,
        a.screen_position.y.round() as isize,
        b.screen_position.x.round() as isize,
        b.screen_position.y.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let steps = dx.max(-dy).max(1) as f64;
    let mut step = 0.0;

    loop {
        if x0 >= 0 && x0 < frame.width as isize && y0 >= 0 && y0 < frame.height as isize {
            let t = step / steps;
            let depth = 1.0 / ((1.0 - t) / a.depth + t / b.depth);
            let position = a.position.lerp(b.position, t);
            let color = shade.color_at(position, DVec3::Y);
            let offset = y0 as usize * frame.width + x0 as usize;
            frame.plot(offset, depth, color, shade.material.opacity);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
        step += 1.0;
    }
}
