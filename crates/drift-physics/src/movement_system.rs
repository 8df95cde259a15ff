//! Fixed-tick movement for every [`Body`] against a sweep backend resource.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::body::Body;
use crate::gravity::{LocalGravity, SimulationStep};
use crate::mover::{GravityMover, MoverSettings};
use crate::trace::SweepQuery;

/// How far below a body the ground probe reaches.
pub const GROUND_PROBE_DISTANCE: f32 = 2.0;

/// Moves each body once per tick.
///
/// A body found inside solid geometry only gets the unstuck search this tick.
/// Grounded bodies get friction and may step up; airborne bodies slide.
pub fn body_movement_system<W: SweepQuery + Resource>(
    world: Res<W>,
    settings: Res<MoverSettings>,
    step: Res<SimulationStep>,
    mut bodies: Query<(Entity, &mut Body, Option<&LocalGravity>)>,
) {
    let dt = step.0;

    for (entity, mut body, gravity) in bodies.iter_mut() {
        let down = gravity
            .filter(|g| g.is_active())
            .map_or(Vec3::NEG_Y, |g| g.direction);
        let mut mover = GravityMover::new(&*world, &mut *body, down).with_settings(*settings);

        if mover.is_stuck() {
            if !mover.try_unstuck() {
                tracing::debug!(?entity, "body still stuck, retrying next tick");
            }
            continue;
        }

        let ground = mover.sweep_direction(mover.down() * GROUND_PROBE_DISTANCE);
        if mover.is_floor(&ground) {
            mover.apply_friction(settings.friction, dt);
            mover.try_move_with_step(dt, settings.step_size);
        } else {
            mover.try_move(dt);
        }
    }
}
