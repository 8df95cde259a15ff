//! Gravity-aware movement: sweep-based move-and-slide, step climbing, unstuck
//! recovery and per-body gravity from pluggable gravity sources.
//!
//! The mover only talks to collision geometry through [`SweepQuery`]. Two
//! backends ship with the crate: [`BoxWorld`] for static box geometry and
//! [`RapierSweep`] over a Rapier [`PhysicsWorld`].

use bevy_ecs::prelude::*;
use rapier3d::prelude::*;

pub mod body;
pub mod box_world;
pub mod clip_planes;
pub mod gravity;
pub mod movement_system;
pub mod mover;
pub mod rapier_sweep;
pub mod trace;

pub use body::{Body, BodyState};
pub use box_world::{BoxEntry, BoxWorld, SolidBox};
pub use clip_planes::{CLIP_ITERATIONS, ClipPlanes, MAX_CLIP_PLANES, clip_velocity, resolve};
pub use gravity::{
    DEFAULT_GRAVITY_PULL, GravityAware, GravityKind, GravityResolver, GravityResult,
    GravitySource, LocalGravity, SimulationStep, SourceSelection, apply_gravity_system,
    gravity_update_system,
};
pub use movement_system::{GROUND_PROBE_DISTANCE, body_movement_system};
pub use mover::{GravityMover, GravityOrientation, MoverSettings, SURFACE_NUDGE};
pub use rapier_sweep::RapierSweep;
pub use trace::{SweepQuery, TraceResult};

/// Rapier collision state queried by [`RapierSweep`].
///
/// Insert into the ECS world as a resource when Rapier colliders are the
/// movement geometry. Rapier applies no gravity of its own; bodies get theirs
/// from [`LocalGravity`].
#[derive(Resource)]
pub struct PhysicsWorld {
    /// Timestep and solver configuration.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides the query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection.
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Creates an empty world with a `1/60` s timestep.
    pub fn new() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: 1.0 / 60.0,
            ..Default::default()
        };

        Self {
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Advances Rapier by one fixed timestep with zero gravity. This is what
    /// refreshes the broad phase, so newly inserted colliders only become
    /// visible to sweeps after a step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// ECS system that steps the Rapier world once per invocation.
pub fn physics_step_system(mut physics: ResMut<PhysicsWorld>) {
    physics.step();
}
