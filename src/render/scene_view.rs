use super::mesh::{tessellate, Projector, Triangle};
use super::raster::{draw_line, draw_triangle, Framebuffer, Shade};
use super::shading::{BACKGROUND, LIGHT_POSITION};
use crate::hall::Hall;
use crate::nbody::{BODY_COLORS, BODY_RADIUS};
use crate::scene::{Material, Rgb, Shape, Transform};
use glam::DVec3;

/// Trails are drawn at this opacity
pub const TRAIL_OPACITY: f64 = 0.3;
const BODY_SEGMENTS: u32 = 12;
const SHADOW_COLOR: Rgb = Rgb(40, 70, 40);
const SHADOW_OPACITY: f64 = 0.25;
const SHADOW_SIDES: usize = 12;

struct Batch {
    triangles: Vec<Triangle>,
    material: Material,
    /// Distance from the eye, for back-to-front translucent ordering
    distance: f64,
}

/// Rasterises the 3D part of a frame into `frame`
pub fn draw_scene(hall: &Hall, frame: &mut Framebuffer) {
    frame.clear(BACKGROUND);
    let rig = *hall.rig();
    let eye = rig.eye();
    let projector = Projector {
        rig,
        aspect: hall.viewport().aspect(),
        width: frame.width() as f64,
        height: frame.height() as f64,
    };

    let mut batches: Vec<Batch> = hall
        .scene()
        .drawables()
        .into_iter()
        .map(|drawable| Batch {
            triangles: tessellate(&drawable.shape, &drawable.transform),
            material: drawable.material,
            distance: drawable.transform.translation.distance(eye),
        })
        .collect();

    for (body, color) in hall.sim().bodies().iter().zip(BODY_COLORS) {
        let sphere = Shape::Sphere {
            radius: BODY_RADIUS,
            segments: BODY_SEGMENTS,
        };
        batches.push(Batch {
            triangles: tessellate(&sphere, &Transform::at(body.position)),
            material: Material::lit(color),
            distance: body.position.distance(eye),
        });
    }

    if hall.config().settings.shadows {
        let casters = hall
            .sim()
            .bodies()
            .iter()
            .map(|body| (body.position, BODY_RADIUS))
            .chain(hall.store().iter().map(|exhibit| {
                (DVec3::new(exhibit.position.x, 2.0, exhibit.position.z), 1.3)
            }));
        for (position, radius) in casters {
            let ground = shadow_point(position);
            batches.push(Batch {
                triangles: shadow_disc(ground, radius),
                material: Material::unlit(SHADOW_COLOR).with_opacity(SHADOW_OPACITY),
                distance: ground.distance(eye),
            });
        }
    }

    // Opaque first, then translucent from far to near
    let (opaque, mut translucent): (Vec<Batch>, Vec<Batch>) = batches
        .into_iter()
        .partition(|batch| batch.material.opacity >= 1.0);
    translucent.sort_by(|a, b| b.distance.total_cmp(&a.distance));

    for batch in opaque.iter() {
        draw_batch(batch, &projector, frame, eye);
    }

    let trail_shade = |color| Shade {
        material: Material::unlit(color).with_opacity(TRAIL_OPACITY),
        eye,
    };
    for (trail, color) in hall.sim().trails().iter().zip(BODY_COLORS) {
        let shade = trail_shade(color);
        let samples: Vec<DVec3> = trail.iter().copied().collect();
        for pair in samples.windows(2) {
            if pair[0] == pair[1] {
                continue;
            }
            if let Some((a, b)) = projector.project_segment(pair[0], pair[1]) {
                draw_line(&a, &b, frame, &shade);
            }
        }
    }

    for batch in translucent.iter() {
        draw_batch(batch, &projector, frame, eye);
    }
}

fn draw_batch(batch: &Batch, projector: &Projector, frame: &mut Framebuffer, eye: DVec3) {
    let shade = Shade {
        material: batch.material,
        eye,
    };
    for triangle in &batch.triangles {
        for [a, b, c] in projector.project_triangle(triangle) {
            draw_triangle(&a, &b, &c, frame, &shade);
        }
    }
}

/// Where a point's shadow falls on the ground, cast away from the sun
pub fn shadow_point(position: DVec3) -> DVec3 {
    let toward_sun = LIGHT_POSITION.normalize();
    let travel = position.y / toward_sun.y;
    let ground = position - toward_sun * travel;
    DVec3::new(ground.x, 0.02, ground.z)
}

fn shadow_disc(center: DVec3, radius: f64) -> Vec<Triangle> {
    let rim = |i: usize| {
        let angle = std::f64::consts::TAU * i as f64 / SHADOW_SIDES as f64;
        center + DVec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
    };
    (0..SHADOW_SIDES)
        .map(|i| Triangle {
            positions: [center, rim(i + 1), rim(i)],
            normals: [DVec3::Y; 3],
        })
        .collect()
}
