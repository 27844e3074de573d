//! Turns scene shapes into world-space triangles and gets them onto the screen.

use super::shading::calculate_normal;
use super::vertex::Vertex;
use crate::camera::{project_view, CameraRig, NEAR};
use crate::scene::{Shape, Transform};
use glam::{DVec2, DVec3};
use std::f64::consts::PI;

/// Faces larger than this are split into tiles so fog and clipping stay smooth
pub const MAX_TILE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [DVec3; 3],
    pub normals: [DVec3; 3],
}

/// World-space triangles for a shape placed by `transform`
pub fn tessellate(shape: &Shape, transform: &Transform) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    match *shape {
        Shape::Sphere { radius, segments } => sphere(&mut triangles, radius, segments),
        Shape::Cuboid { half_extents: h } => {
            // (centre, u axis, v axis) per face, wound so u x v points outward
            let faces = [
                (DVec3::new(0.0, h.y, 0.0), DVec3::new(0.0, 0.0, h.z), DVec3::new(h.x, 0.0, 0.0)),
                (DVec3::new(0.0, -h.y, 0.0), DVec3::new(h.x, 0.0, 0.0), DVec3::new(0.0, 0.0, h.z)),
                (DVec3::new(h.x, 0.0, 0.0), DVec3::new(0.0, h.y, 0.0), DVec3::new(0.0, 0.0, h.z)),
                (DVec3::new(-h.x, 0.0, 0.0), DVec3::new(0.0, 0.0, h.z), DVec3::new(0.0, h.y, 0.0)),
                (DVec3::new(0.0, 0.0, h.z), DVec3::new(h.x, 0.0, 0.0), DVec3::new(0.0, h.y, 0.0)),
                (DVec3::new(0.0, 0.0, -h.z), DVec3::new(0.0, h.y, 0.0), DVec3::new(h.x, 0.0, 0.0)),
            ];
            for (center, u, v) in faces {
                quad(&mut triangles, center, u, v);
            }
        }
        Shape::Panel {
            half_width,
            half_height,
        } => quad(
            &mut triangles,
            DVec3::ZERO,
            DVec3::new(half_width, 0.0, 0.0),
            DVec3::new(0.0, half_height, 0.0),
        ),
    }
    for triangle in &mut triangles {
        for i in 0..3 {
            triangle.positions[i] = transform.to_world(triangle.positions[i]);
            triangle.normals[i] = transform.rotate(triangle.normals[i]);
        }
    }
    triangles
}

/// Rectangle spanning centre +/- u +/- v, tiled
fn quad(out: &mut Vec<Triangle>, center: DVec3, u: DVec3, v: DVec3) {
    let normal = calculate_normal(center, center + u, center + v);
    let tiles_u = ((u.length() * 2.0) / MAX_TILE).ceil().max(1.0) as usize;
    let tiles_v = ((v.length() * 2.0) / MAX_TILE).ceil().max(1.0) as usize;
    let corner = |i: usize, j: usize| {
        let a = i as f64 / tiles_u as f64 * 2.0 - 1.0;
        let b = j as f64 / tiles_v as f64 * 2.0 - 1.0;
        center + u * a + v * b
    };
    for i in 0..tiles_u {
        for j in 0..tiles_v {
            let (p00, p10, p11, p01) = (corner(i, j), corner(i + 1, j), corner(i + 1, j + 1), corner(i, j + 1));
            out.push(Triangle {
                positions: [p00, p10, p11],
                normals: [normal; 3],
            });
            out.push(Triangle {
                positions: [p00, p11, p01],
                normals: [normal; 3],
            });
        }
    }
}

fn sphere(out: &mut Vec<Triangle>, radius: f64, segments: u32) {
    let rings = segments.max(3) as usize;
    let sectors = rings * 2;
    let point = |ring: usize, sector: usize| {
        let polar = PI * ring as f64 / rings as f64;
        let azimuth = 2.0 * PI * sector as f64 / sectors as f64;
        DVec3::new(
            polar.sin() * azimuth.cos(),
            polar.cos(),
            polar.sin() * azimuth.sin(),
        )
    };
    for ring in 0..rings {
        for sector in 0..sectors {
            let n00 = point(ring, sector);
            let n01 = point(ring, sector + 1);
            let n10 = point(ring + 1, sector);
            let n11 = point(ring + 1, sector + 1);
            if ring > 0 {
                out.push(Triangle {
                    positions: [n00 * radius, n01 * radius, n11 * radius],
                    normals: [n00, n01, n11],
                });
            }
            if ring + 1 < rings {
                out.push(Triangle {
                    positions: [n00 * radius, n11 * radius, n10 * radius],
                    normals: [n00, n11, n10],
                });
            }
        }
    }
}

/// A point in camera space with the attributes carried through clipping
#[derive(Debug, Clone, Copy)]
struct ViewPoint {
    view: DVec3,
    world: DVec3,
    normal: DVec3,
}

impl ViewPoint {
    fn lerp(&self, other: &ViewPoint, t: f64) -> ViewPoint {
        ViewPoint {
            view: self.view.lerp(other.view, t),
            world: self.world.lerp(other.world, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// Maps camera space onto a framebuffer of the given pixel size
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    pub rig: CameraRig,
    pub aspect: f64,
    pub width: f64,
    pub height: f64,
}

impl Projector {
    fn to_vertex(&self, point: &ViewPoint) -> Vertex {
        let ndc = project_view(point.view, self.aspect);
        Vertex {
            position: point.world,
            screen_position: self.to_screen(ndc),
            depth: point.view.z,
            normal: point.normal,
        }
    }

    pub fn to_screen(&self, ndc: DVec2) -> DVec2 {
        DVec2::new(
            (ndc.x + 1.0) / 2.0 * self.width,
            (1.0 - ndc.y) / 2.0 * self.height,
        )
    }

    /// Clips a world triangle against the near plane and projects what is left.
    /// Returns zero, one or two screen triangles.
    pub fn project_triangle(&self, triangle: &Triangle) -> Vec<[Vertex; 3]> {
        let points: Vec<ViewPoint> = (0..3)
            .map(|i| ViewPoint {
                view: self.rig.to_view(triangle.positions[i]),
                world: triangle.positions[i],
                normal: triangle.normals[i],
            })
            .collect();

        let mut clipped: Vec<ViewPoint> = Vec::with_capacity(4);
        for i in 0..points.len() {
            let current = points[i];
            let next = points[(i + 1) % points.len()];
            let current_in = current.view.z >= NEAR;
            let next_in = next.view.z >= NEAR;
            if current_in {
                clipped.push(current);
            }
            if current_in != next_in {
                let t = (NEAR - current.view.z) / (next.view.z - current.view.z);
                clipped.push(current.lerp(&next, t));
            }
        }
        if clipped.len() < 3 {
            return Vec::new();
        }

        let vertices: Vec<Vertex> = clipped.iter().map(|point| self.to_vertex(point)).collect();
        (1..vertices.len() - 1)
            .map(|i| [vertices[0], vertices[i], vertices[i + 1]])
            .collect()
    }

    /// Clips a world segment against the near plane and projects it
    pub fn project_segment(&self, a: DVec3, b: DVec3) -> Option<(Vertex, Vertex)> {
        let mut p = ViewPoint {
            view: self.rig.to_view(a),
            world: a,
            normal: DVec3::Y,
        };
        let mut q = ViewPoint {
            view: self.rig.to_view(b),
            world: b,
            normal: DVec3::Y,
        };
        match (p.view.z >= NEAR, q.view.z >= NEAR) {
            (false, false) => return None,
            (true, false) => q = p.lerp(&q, (NEAR - p.view.z) / (q.view.z - p.view.z)),
            (false, true) => p = q.lerp(&p, (NEAR - q.view.z) / (p.view.z - q.view.z)),
            (true, true) => {}
        }
        Some((self.to_vertex(&p), self.to_vertex(&q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projector() -> Projector {
        Projector {
            rig: CameraRig::spawn(),
            aspect: 2.0,
            width: 200.0,
            height: 100.0,
        }
    }

    #[test]
    fn cuboid_normals_point_outward() {
        let shape = Shape::Cuboid {
            half_extents: DVec3::new(1.0, 2.0, 3.0),
        };
        for triangle in tessellate(&shape, &Transform::default()) {
            let centroid = (triangle.positions[0] + triangle.positions[1] + triangle.positions[2]) / 3.0;
            assert!(triangle.normals[0].dot(centroid) > 0.0);
        }
    }

    #[test]
    fn large_faces_are_tiled() {
        let shape = Shape::Cuboid {
            half_extents: DVec3::new(40.0, 0.01, 40.0),
        };
        let triangles = tessellate(&shape, &Transform::default());
        // top and bottom are 20x20 tiles, thin sides are 20x1
        assert_eq!(triangles.len(), 2 * (2 * 400 + 4 * 20));
    }

    #[test]
    fn sphere_vertices_lie_on_surface() {
        let transform = Transform::at(DVec3::new(0.0, 30.0, 0.0));
        let shape = Shape::Sphere {
            radius: 2.5,
            segments: 6,
        };
        let triangles = tessellate(&shape, &transform);
        assert!(!triangles.is_empty());
        for triangle in triangles {
            for position in triangle.positions {
                assert_relative_eq!(position.distance(transform.translation), 2.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn triangle_behind_camera_is_dropped() {
        let behind = Triangle {
            positions: [
                DVec3::new(0.0, 2.0, 25.0),
                DVec3::new(1.0, 2.0, 25.0),
                DVec3::new(0.0, 3.0, 25.0),
            ],
            normals: [DVec3::Z; 3],
        };
        assert!(projector().project_triangle(&behind).is_empty());
    }

    #[test]
    fn straddling_triangle_is_clipped_to_near_plane() {
        let straddling = Triangle {
            positions: [
                DVec3::new(-1.0, 0.0, 10.0),
                DVec3::new(1.0, 0.0, 10.0),
                DVec3::new(0.0, 0.0, 30.0),
            ],
            normals: [DVec3::Y; 3],
        };
        let pieces = projector().project_triangle(&straddling);
        assert!(!pieces.is_empty());
        for piece in pieces {
            for vertex in piece {
                assert!(vertex.depth >= NEAR - 1e-9);
            }
        }
    }

    #[test]
    fn point_ahead_lands_mid_screen() {
        let (a, _) = projector()
            .project_segment(DVec3::new(0.0, 2.0, 0.0), DVec3::new(0.0, 2.0, -10.0))
            .unwrap();
        assert_relative_eq!(a.screen_position.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(a.screen_position.y, 50.0, epsilon = 1e-9);
        assert_relative_eq!(a.depth, 20.0, epsilon = 1e-9);
    }
}
