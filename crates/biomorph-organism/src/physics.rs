//! Rigid-body movement and collision resolution for organisms
//!
//! Organisms are kinematic bodies with a position, rotation and two
//! velocities. Collisions are segment-segment intersections resolved with a
//! single impulse exchange along the normal of the edge that was crossed.

use crate::types::{OrganismId, Rect};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Smallest segment length that takes part in collisions
pub const MIN_COLLISION_LENGTH: f64 = 1.0;

/// Configuration for movement and impulse resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity multiplier applied every tick
    pub rubbing: f64,
    /// Coefficient of restitution for collisions
    pub elasticity: f64,
    /// Largest linear speed per axis after an impulse
    pub max_velocity: f64,
    /// Largest angular speed after an impulse
    pub max_rotation: f64,
    /// Speeds and energies below this are treated as zero
    pub tolerance: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            rubbing: 0.98,
            elasticity: 0.8,
            max_velocity: 5.0,
            max_rotation: PI / 16.0,
            tolerance: 1e-7,
        }
    }
}

/// Kinematic state of one organism
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: DVec2,
    pub rotation: f64,
    pub velocity: DVec2,
    pub angular_velocity: f64,
    /// Radial expansion speed per unit of radius from a growth step this tick
    pub growth_rate: f64,
}

impl Motion {
    pub fn at(position: DVec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Velocity of a body point at world position `point`
    pub fn point_velocity(&self, point: DVec2) -> DVec2 {
        let r = point - self.position;
        self.velocity + self.angular_velocity * r.perp() + self.growth_rate * r
    }

    pub fn is_still(&self) -> bool {
        self.velocity == DVec2::ZERO && self.angular_velocity == 0.0
    }

    pub fn stop(&mut self) {
        self.velocity = DVec2::ZERO;
        self.angular_velocity = 0.0;
    }

    /// Clamp both velocities to the configured maximums
    pub fn clamp_speed(&mut self, config: &PhysicsConfig) {
        self.velocity = self
            .velocity
            .clamp(DVec2::splat(-config.max_velocity), DVec2::splat(config.max_velocity));
        self.angular_velocity = self
            .angular_velocity
            .clamp(-config.max_rotation, config.max_rotation);
    }
}

/// Decay velocities by the rubbing coefficient, snapping tiny values to zero
pub fn apply_friction(motion: &mut Motion, config: &PhysicsConfig) {
    let snap = |v: f64| {
        let v = v * config.rubbing;
        if v.abs() < config.tolerance {
            0.0
        } else {
            v
        }
    };
    motion.velocity = DVec2::new(snap(motion.velocity.x), snap(motion.velocity.y));
    motion.angular_velocity = snap(motion.angular_velocity);
}

/// Rescale velocities after a mass change so `m * v²` is preserved
pub fn rescale_for_growth(motion: &mut Motion, old_mass: f64, new_mass: f64) {
    if old_mass <= f64::EPSILON || new_mass <= f64::EPSILON {
        return;
    }
    let factor = (old_mass / new_mass).sqrt();
    motion.velocity *= factor;
    motion.angular_velocity *= factor;
}

/// Reflect outward velocity components when `body` leaves `bounds`.
///
/// Returns `true` when the body is fully inside the world. Angular velocity
/// is zeroed on any exit.
pub fn reflect_out_of_bounds(motion: &mut Motion, body: &Rect, bounds: &Rect) -> bool {
    let mut inside = true;
    if body.min.x < bounds.min.x {
        motion.velocity.x = motion.velocity.x.abs();
        inside = false;
    } else if body.max.x > bounds.max.x {
        motion.velocity.x = -motion.velocity.x.abs();
        inside = false;
    }
    if body.min.y < bounds.min.y {
        motion.velocity.y = motion.velocity.y.abs();
        inside = false;
    } else if body.max.y > bounds.max.y {
        motion.velocity.y = -motion.velocity.y.abs();
        inside = false;
    }
    if !inside {
        motion.angular_velocity = 0.0;
    }
    inside
}

/// Intersection point of segments `a0-a1` and `b0-b1`, if any
pub fn segment_intersection(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.perp_dot(s);
    if denom.abs() < f64::EPSILON {
        // Parallel or degenerate
        return None;
    }
    let qp = b0 - a0;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a0 + r * t)
    } else {
        None
    }
}

/// First intersecting segment pair between two placed bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub own_segment: usize,
    pub other: OrganismId,
    pub other_segment: usize,
    pub point: DVec2,
}

/// Test every collidable segment of `own` against every collidable segment
/// of `other`, stopping at the first hit
pub fn find_contact(
    own: &[(DVec2, DVec2)],
    own_lengths: &[f64],
    other_id: OrganismId,
    other: &[(DVec2, DVec2)],
    other_lengths: &[f64],
) -> Option<Contact> {
    for (i, &(a0, a1)) in own.iter().enumerate() {
        if own_lengths.get(i).copied().unwrap_or(0.0) < MIN_COLLISION_LENGTH {
            continue;
        }
        for (j, &(b0, b1)) in other.iter().enumerate() {
            if other_lengths.get(j).copied().unwrap_or(0.0) < MIN_COLLISION_LENGTH {
                continue;
            }
            if let Some(point) = segment_intersection(a0, a1, b0, b1) {
                return Some(Contact {
                    own_segment: i,
                    other: other_id,
                    other_segment: j,
                    point,
                });
            }
        }
    }
    None
}

/// One side of an impulse exchange
pub struct ImpactBody<'a> {
    pub motion: &'a mut Motion,
    pub mass: f64,
    pub inertia: f64,
    /// World-space endpoints of the touching segment
    pub edge: (DVec2, DVec2),
}

/// Exchange an impulse between two touching bodies at `point`.
///
/// The normal belongs to whichever edge was crossed through its middle: the
/// one whose nearest endpoint is farther from `point`. Separating bodies are
/// left alone. Returns the impulse magnitude applied.
pub fn touch_move(
    first: ImpactBody<'_>,
    second: ImpactBody<'_>,
    point: DVec2,
    config: &PhysicsConfig,
) -> f64 {
    let nearest = |(e0, e1): (DVec2, DVec2)| {
        point
            .distance_squared(e0)
            .min(point.distance_squared(e1))
    };
    let edge = if nearest(first.edge) >= nearest(second.edge) {
        first.edge
    } else {
        second.edge
    };

    let mut normal = (edge.1 - edge.0).perp().normalize_or_zero();
    if normal == DVec2::ZERO {
        normal = (first.motion.position - second.motion.position).normalize_or_zero();
    }
    if normal == DVec2::ZERO {
        normal = DVec2::X;
    }
    // Point from the second body toward the first
    if normal.dot(first.motion.position - second.motion.position) < 0.0 {
        normal = -normal;
    }

    let relative = first.motion.point_velocity(point) - second.motion.point_velocity(point);
    let approach = relative.dot(normal);
    if approach >= 0.0 {
        return 0.0;
    }

    let r1 = point - first.motion.position;
    let r2 = point - second.motion.position;
    let r1n = r1.perp_dot(normal);
    let r2n = r2.perp_dot(normal);
    let m1 = first.mass.max(f64::EPSILON);
    let m2 = second.mass.max(f64::EPSILON);
    let i1 = first.inertia.max(f64::EPSILON);
    let i2 = second.inertia.max(f64::EPSILON);

    let denom = 1.0 / m1 + 1.0 / m2 + r1n * r1n / i1 + r2n * r2n / i2;
    let j = -(1.0 + config.elasticity) * approach / denom;

    first.motion.velocity += normal * (j / m1);
    first.motion.angular_velocity += j * r1n / i1;
    second.motion.velocity -= normal * (j / m2);
    second.motion.angular_velocity -= j * r2n / i2;

    first.motion.clamp_speed(config);
    second.motion.clamp_speed(config);
    j
}
