//! Three bodies under mutual gravity, held inside a reflecting sphere and
//! followed by fixed-length trails.

use crate::error::{HallError, HallResult};
use crate::scene::Rgb;
use glam::DVec3;
use std::collections::VecDeque;
use tracing::debug;

/// Samples kept per trail
pub const TRAIL_LENGTH: usize = 1000;
pub const GRAVITY: f64 = 0.7;
/// Fixed physics step; the sky advances per frame, not per wall-clock second
pub const PHYSICS_DT: f64 = 0.016;
/// Pair separations are clamped to at least this, keeping accelerations finite
pub const MIN_SEPARATION: f64 = 0.1;
/// Fraction of velocity kept after a boundary bounce
pub const BOUNCE_RETENTION: f64 = 0.8;
/// Bodies are put back this far inside the boundary
pub const SURFACE_INSET: f64 = 0.01;
/// Drawn radius of each body
pub const BODY_RADIUS: f64 = 2.5;

pub const BODY_COLORS: [Rgb; 3] = [Rgb::hex(0xff6b6b), Rgb::hex(0x4ecdc4), Rgb::hex(0x45b7d1)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub mass: f64,
    pub position: DVec3,
    pub velocity: DVec3,
}

impl Body {
    pub fn new(mass: f64, position: DVec3, velocity: DVec3) -> Self {
        Body {
            mass,
            position,
            velocity,
        }
    }

    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Most recent positions of one body, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    samples: VecDeque<DVec3>,
    capacity: usize,
}

impl Trail {
    /// A full trail with every slot at `position`, so it does not uncoil from the origin
    pub fn filled(position: DVec3, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Trail {
            samples: std::iter::repeat(position).take(capacity).collect(),
            capacity,
        }
    }

    /// Appends the newest sample, evicting the oldest
    pub fn push(&mut self, position: DVec3) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(position);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn oldest(&self) -> Option<DVec3> {
        self.samples.front().copied()
    }

    #[cfg(test)]
    pub fn newest(&self) -> Option<DVec3> {
        self.samples.back().copied()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &DVec3> {
        self.samples.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundarySphere {
    /// Puts an escaped body back on the surface and bounces it inward.
    /// Returns true when a bounce happened.
    pub fn contain(&self, body: &mut Body) -> bool {
        let relative = body.position - self.center;
        if relative.length() <= self.radius {
            return false;
        }

        let normal = relative.normalize();
        body.position = self.center + normal * (self.radius - SURFACE_INSET);

        body.velocity -= normal * (2.0 * body.velocity.dot(normal));
        // Still heading out after one reflection: reflect again
        if body.velocity.dot(normal) > 0.0 {
            body.velocity -= normal * (2.0 * body.velocity.dot(normal));
        }
        body.velocity *= BOUNCE_RETENTION;
        true
    }
}

#[derive(Debug, Clone)]
pub struct NBodySimulator {
    bodies: Vec<Body>,
    initial: Vec<Body>,
    trails: Vec<Trail>,
    boundary: BoundarySphere,
    gravity: f64,
    trail_length: usize,
}

impl NBodySimulator {
    pub fn new(bodies: Vec<Body>, gravity: f64, boundary: BoundarySphere) -> Self {
        Self::with_trail_length(bodies, gravity, boundary, TRAIL_LENGTH)
    }

    pub fn with_trail_length(
        bodies: Vec<Body>,
        gravity: f64,
        boundary: BoundarySphere,
        trail_length: usize,
    ) -> Self {
        let trails = bodies
            .iter()
            .map(|body| Trail::filled(body.position, trail_length))
            .collect();
        NBodySimulator {
            initial: bodies.clone(),
            bodies,
            trails,
            boundary,
            gravity,
            trail_length,
        }
    }

    /// The sky above the hall
    pub fn three_body() -> Self {
        let bodies = vec![
            Body::new(40.0, DVec3::new(-20.0, 30.0, -20.0), DVec3::new(2.0, 0.0, 2.0)),
            Body::new(70.0, DVec3::new(20.0, 30.0, 20.0), DVec3::new(-1.5, 0.0, -2.0)),
            Body::new(120.0, DVec3::new(0.0, 30.0, -40.0), DVec3::new(0.0, 0.0, 2.5)),
        ];
        let boundary = BoundarySphere {
            center: DVec3::new(0.0, 30.0, 0.0),
            radius: 30.0,
        };
        Self::new(bodies, GRAVITY, boundary)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    #[cfg(test)]
    pub fn boundary(&self) -> &BoundarySphere {
        &self.boundary
    }

    pub fn momentum(&self) -> DVec3 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    /// Pairwise gravitational accelerations for the current positions
    pub fn accelerations(&self) -> Vec<DVec3> {
        let mut accelerations = vec![DVec3::ZERO; self.bodies.len()];
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                let diff = b.position - a.position;
                let distance = diff.length().max(MIN_SEPARATION);
                let force = self.gravity * a.mass * b.mass / (distance * distance);
                let force = diff.normalize_or_zero() * force;
                accelerations[i] += force / a.mass;
                accelerations[j] -= force / b.mass;
            }
        }
        accelerations
    }

    /// Advances every body by `dt`: velocity, then position, then containment,
    /// then the trails.
    pub fn step(&mut self, dt: f64) {
        let accelerations = self.accelerations();
        for (index, (body, acceleration)) in self.bodies.iter_mut().zip(accelerations).enumerate() {
            body.velocity += acceleration * dt;
            body.position += body.velocity * dt;
            if self.boundary.contain(body) {
                debug!(body = index, speed = body.velocity.length(), "boundary bounce");
            }
        }
        for (trail, body) in self.trails.iter_mut().zip(&self.bodies) {
            trail.push(body.position);
        }
        debug_assert!(self.check_finite().is_ok());
    }

    pub fn check_finite(&self) -> HallResult<()> {
        match self.bodies.iter().position(|body| !body.is_finite()) {
            Some(body) => Err(HallError::NonFiniteState { body }),
            None => Ok(()),
        }
    }

    /// Back to the starting configuration with fresh trails
    pub fn reset(&mut self) {
        self.bodies = self.initial.clone();
        self.trails = self
            .bodies
            .iter()
            .map(|body| Trail::filled(body.position, self.trail_length))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_inside(sim: &NBodySimulator) {
        let boundary = sim.boundary();
        for body in sim.bodies() {
            let distance = body.position.distance(boundary.center);
            assert!(distance <= boundary.radius, "body escaped to {distance}");
        }
    }

    #[test]
    fn stays_inside_boundary_at_sixty_hertz() {
        let mut sim = NBodySimulator::three_body();
        for _ in 0..1000 {
            sim.step(PHYSICS_DT);
            assert_inside(&sim);
        }
        assert!(sim.check_finite().is_ok());
    }

    #[test]
    fn stays_inside_boundary_at_coarse_step() {
        let mut sim = NBodySimulator::three_body();
        for _ in 0..1000 {
            sim.step(1.0 / 16.0);
            assert_inside(&sim);
            for body in sim.bodies() {
                assert!(!body.position.x.is_nan());
                assert!(!body.position.y.is_nan());
                assert!(!body.position.z.is_nan());
            }
        }
    }

    #[test]
    fn momentum_is_conserved_away_from_boundary() {
        let bodies = vec![
            Body::new(40.0, DVec3::new(-3.0, 30.0, 0.0), DVec3::new(0.0, 0.0, 0.5)),
            Body::new(70.0, DVec3::new(3.0, 30.0, 0.0), DVec3::new(0.0, 0.0, -0.3)),
            Body::new(120.0, DVec3::new(0.0, 33.0, 2.0), DVec3::new(0.2, 0.0, 0.0)),
        ];
        let boundary = BoundarySphere {
            center: DVec3::new(0.0, 30.0, 0.0),
            radius: 30.0,
        };
        let mut sim = NBodySimulator::new(bodies, GRAVITY, boundary);
        let before = sim.momentum();
        for _ in 0..50 {
            sim.step(PHYSICS_DT);
        }
        let after = sim.momentum();
        assert_abs_diff_eq!(before.x, after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-9);
        assert_abs_diff_eq!(before.z, after.z, epsilon = 1e-9);
    }

    #[test]
    fn accelerations_obey_third_law() {
        let sim = NBodySimulator::three_body();
        let total: DVec3 = sim
            .accelerations()
            .iter()
            .zip(sim.bodies())
            .map(|(acceleration, body)| *acceleration * body.mass)
            .sum();
        assert_abs_diff_eq!(total.length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_bodies_stay_finite() {
        let bodies = vec![
            Body::new(40.0, DVec3::new(0.0, 30.0, 0.0), DVec3::ZERO),
            Body::new(70.0, DVec3::new(0.0, 30.0, 0.0), DVec3::ZERO),
            Body::new(120.0, DVec3::new(0.0, 30.0, 1e-9), DVec3::ZERO),
        ];
        let boundary = BoundarySphere {
            center: DVec3::new(0.0, 30.0, 0.0),
            radius: 30.0,
        };
        let mut sim = NBodySimulator::new(bodies, GRAVITY, boundary);
        for _ in 0..100 {
            sim.step(PHYSICS_DT);
        }
        assert!(sim.check_finite().is_ok());
        assert_inside(&sim);
    }

    #[test]
    fn bounce_reflects_and_loses_energy() {
        let boundary = BoundarySphere {
            center: DVec3::ZERO,
            radius: 10.0,
        };
        let mut body = Body::new(1.0, DVec3::new(10.5, 0.0, 0.0), DVec3::new(3.0, 1.0, 0.0));
        assert!(boundary.contain(&mut body));
        assert_abs_diff_eq!(body.position.x, 10.0 - SURFACE_INSET, epsilon = 1e-12);
        assert_abs_diff_eq!(body.velocity.x, -3.0 * BOUNCE_RETENTION, epsilon = 1e-12);
        assert_abs_diff_eq!(body.velocity.y, 1.0 * BOUNCE_RETENTION, epsilon = 1e-12);
    }

    #[test]
    fn inward_velocity_outside_is_reflected_twice() {
        let boundary = BoundarySphere {
            center: DVec3::ZERO,
            radius: 10.0,
        };
        // already heading inward: the first reflection points it outward, the second back in
        let mut body = Body::new(1.0, DVec3::new(10.5, 0.0, 0.0), DVec3::new(-2.0, 0.0, 0.0));
        assert!(boundary.contain(&mut body));
        assert_abs_diff_eq!(body.velocity.x, -2.0 * BOUNCE_RETENTION, epsilon = 1e-12);
    }

    #[test]
    fn body_inside_is_untouched() {
        let boundary = BoundarySphere {
            center: DVec3::ZERO,
            radius: 10.0,
        };
        let mut body = Body::new(1.0, DVec3::new(3.0, 0.0, 0.0), DVec3::new(5.0, 0.0, 0.0));
        assert!(!boundary.contain(&mut body));
        assert_eq!(body.velocity, DVec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn trail_starts_full_of_start_position() {
        let sim = NBodySimulator::three_body();
        for (trail, body) in sim.trails().iter().zip(sim.bodies()) {
            assert_eq!(trail.len(), TRAIL_LENGTH);
            assert!(trail.iter().all(|sample| *sample == body.position));
        }
    }

    #[test]
    fn trail_length_is_constant_while_stepping() {
        let mut sim = NBodySimulator::three_body();
        for _ in 0..1500 {
            sim.step(PHYSICS_DT);
        }
        assert!(sim.trails().iter().all(|trail| trail.len() == TRAIL_LENGTH));
        for (trail, body) in sim.trails().iter().zip(sim.bodies()) {
            assert_eq!(trail.newest(), Some(body.position));
        }
    }

    #[test]
    fn trail_evicts_oldest_first() {
        let a = DVec3::new(1.0, 0.0, 0.0);
        let b = DVec3::new(2.0, 0.0, 0.0);
        let c = DVec3::new(3.0, 0.0, 0.0);
        let mut trail = Trail::filled(a, TRAIL_LENGTH);
        trail.push(b);
        assert_eq!(trail.len(), TRAIL_LENGTH);
        assert_eq!(trail.oldest(), Some(a));
        assert_eq!(trail.newest(), Some(b));

        let mut short = Trail::filled(a, 2);
        short.push(b);
        short.push(c);
        assert_eq!(short.iter().copied().collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn reset_restores_initial_bodies() {
        let mut sim = NBodySimulator::three_body();
        let initial = sim.bodies().to_vec();
        for _ in 0..10 {
            sim.step(PHYSICS_DT);
        }
        sim.reset();
        assert_eq!(sim.bodies(), initial.as_slice());
        assert!(sim.trails()[0].iter().all(|sample| *sample == initial[0].position));
    }

    #[test]
    fn reset_keeps_the_configured_trail_length() {
        let start = NBodySimulator::three_body();
        let mut sim = NBodySimulator::with_trail_length(
            start.bodies().to_vec(),
            GRAVITY,
            *start.boundary(),
            5,
        );
        for _ in 0..10 {
            sim.step(PHYSICS_DT);
        }
        sim.reset();
        for trail in sim.trails() {
            assert_eq!(trail.capacity(), 5);
            assert_eq!(trail.len(), 5);
        }
    }
}
