//! Point sweeps against a Rapier [`PhysicsWorld`].
//!
//! Uses the broad phase as a query pipeline and solid ray casts: a ray that
//! starts inside a collider reports a hit at time zero, which is how
//! start-in-solid is detected.

use glam::Vec3;
use rapier3d::prelude::*;

use crate::PhysicsWorld;
use crate::trace::{SweepQuery, TraceResult};

/// Gap kept between a hit point and the collider surface.
pub const CONTACT_BACKOFF: f32 = 1.0e-3;

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

fn to_vec3(v: Vector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Sweep adapter over a physics world, optionally ignoring one rigid body
/// (usually the body being moved).
pub struct RapierSweep<'a> {
    physics: &'a PhysicsWorld,
    filter: QueryFilter<'a>,
}

impl<'a> RapierSweep<'a> {
    /// Sweeps against every collider in `physics`.
    pub fn new(physics: &'a PhysicsWorld) -> Self {
        Self {
            physics,
            filter: QueryFilter::default(),
        }
    }

    /// Sweeps that ignore the colliders attached to `body`.
    pub fn excluding(physics: &'a PhysicsWorld, body: RigidBodyHandle) -> Self {
        Self {
            physics,
            filter: QueryFilter::new().exclude_rigid_body(body),
        }
    }

    fn starts_solid(&self, point: Vec3) -> bool {
        let query_pipeline = self.physics.broad_phase.as_query_pipeline(
            self.physics.narrow_phase.query_dispatcher(),
            &self.physics.rigid_body_set,
            &self.physics.collider_set,
            self.filter,
        );
        let ray = Ray::new(to_vector(point), Vector::new(0.0, 1.0, 0.0));
        query_pipeline.cast_ray(&ray, 0.0, true).is_some()
    }
}

impl SweepQuery for RapierSweep<'_> {
    fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult {
        if self.starts_solid(start) {
            return TraceResult::started_solid(start, end);
        }

        let delta = end - start;
        let length = delta.length();
        if length <= f32::EPSILON {
            return TraceResult::miss(start, end);
        }
        let direction = delta / length;

        let query_pipeline = self.physics.broad_phase.as_query_pipeline(
            self.physics.narrow_phase.query_dispatcher(),
            &self.physics.rigid_body_set,
            &self.physics.collider_set,
            self.filter,
        );
        let ray = Ray::new(to_vector(start), to_vector(direction));

        match query_pipeline.cast_ray_and_get_normal(&ray, length, true) {
            Some((_handle, hit)) => {
                let travelled = (hit.time_of_impact - CONTACT_BACKOFF).max(0.0);
                TraceResult::hit(start, end, travelled / length, to_vec3(hit.normal))
            }
            None => TraceResult::miss(start, end),
        }
    }
}

impl SweepQuery for PhysicsWorld {
    fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult {
        RapierSweep::new(self).sweep(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::mover::GravityMover;

    /// Floor collider with its top face at y = 0.
    fn add_floor(physics: &mut PhysicsWorld) {
        let floor_body = RigidBodyBuilder::fixed()
            .translation(Vector::new(0.0, -0.5, 0.0))
            .build();
        let floor_handle = physics.rigid_body_set.insert(floor_body);
        let floor_collider = ColliderBuilder::cuboid(50.0, 0.5, 50.0).build();
        physics
            .collider_set
            .insert_with_parent(floor_collider, floor_handle, &mut physics.rigid_body_set);
    }

    fn floor_world() -> PhysicsWorld {
        let mut physics = PhysicsWorld::new();
        add_floor(&mut physics);
        // Step once so the broad phase is up to date.
        physics.step();
        physics
    }

    #[test]
    fn test_sweep_hits_floor() {
        let physics = floor_world();
        let tr = physics.sweep(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));

        assert!(tr.hit && !tr.start_solid);
        assert!((tr.fraction - 0.5).abs() < 1e-3, "fraction {}", tr.fraction);
        assert!((tr.normal - Vec3::Y).length() < 1e-4);
        assert!(tr.end_position.y >= 0.0);
    }

    #[test]
    fn test_sweep_misses_open_space() {
        let physics = floor_world();
        let tr = physics.sweep(Vec3::new(0.0, 5.0, 0.0), Vec3::new(10.0, 5.0, 0.0));
        assert!(!tr.hit);
        assert_eq!(tr.end_position, Vec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_start_inside_collider_is_start_solid() {
        let physics = floor_world();
        let p = Vec3::new(0.0, -0.5, 0.0);
        assert!(physics.sweep(p, p).start_solid);
        assert!(physics.sweep(p, p + Vec3::Y * 3.0).start_solid);
    }

    #[test]
    fn test_excluded_body_is_ignored() {
        let mut physics = PhysicsWorld::new();
        let blocker = physics
            .rigid_body_set
            .insert(RigidBodyBuilder::fixed().translation(Vector::new(5.0, 0.0, 0.0)).build());
        physics.collider_set.insert_with_parent(
            ColliderBuilder::cuboid(0.5, 5.0, 5.0).build(),
            blocker,
            &mut physics.rigid_body_set,
        );
        physics.step();

        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        assert!(RapierSweep::new(&physics).sweep(start, end).hit);
        assert!(!RapierSweep::excluding(&physics, blocker).sweep(start, end).hit);
    }

    #[test]
    fn test_mover_lands_on_rapier_floor() {
        let physics = floor_world();
        let mut body = Body::new(Vec3::new(0.0, 2.0, 0.0)).with_velocity(Vec3::new(0.0, -100.0, 0.0));

        GravityMover::new(&physics, &mut body, Vec3::NEG_Y).try_move(0.1);

        assert!(body.position.y > 0.0 && body.position.y < 0.1, "y = {}", body.position.y);
        assert!(body.velocity.length() < 1e-3);
    }
}
