//! Body state store: position, velocity, contact flags, and tuning.
//!
//! The mover reads and writes a body exclusively through [`BodyState`], so any
//! game-side store can be driven. [`Body`] is the plain value implementation,
//! also usable directly as an ECS component.

use bevy_ecs::prelude::*;
use drift_config::MovementConfig;
use glam::Vec3;

/// Speed below which friction does nothing.
const MIN_FRICTION_SPEED: f32 = 0.1;

/// Accessor contract between the mover and whatever owns the body.
pub trait BodyState {
    /// Current position.
    fn position(&self) -> Vec3;
    /// Overwrite the position.
    fn set_position(&mut self, position: Vec3);
    /// Current velocity.
    fn velocity(&self) -> Vec3;
    /// Overwrite the velocity.
    fn set_velocity(&mut self, velocity: Vec3);
    /// Whether the first bump of the last move hit a wall or ceiling.
    fn hit_wall(&self) -> bool;
    /// Set the wall-contact flag.
    fn set_hit_wall(&mut self, hit_wall: bool);
    /// Bounce coefficient against floors.
    fn ground_bounce(&self) -> f32;
    /// Bounce coefficient against walls and ceilings.
    fn wall_bounce(&self) -> f32;
    /// Steepest standable surface, in degrees from "up".
    fn max_standable_angle(&self) -> f32;
    /// Slow the body down by `friction_amount` over `delta` seconds.
    fn apply_friction(&mut self, friction_amount: f32, delta: f32);
}

/// A moving body with its movement tuning.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// World position.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Set when the first bump of the last move hit a non-floor surface.
    pub hit_wall: bool,
    /// Bounce coefficient against floors.
    pub ground_bounce: f32,
    /// Bounce coefficient against walls and ceilings.
    pub wall_bounce: f32,
    /// Steepest standable surface, in degrees from "up".
    pub max_standable_angle: f32,
    /// Friction treats slower bodies as if moving at this speed.
    pub stop_speed: f32,
}

impl Default for Body {
    fn default() -> Self {
        Self::from_config(&MovementConfig::default(), Vec3::ZERO)
    }
}

impl Body {
    /// A resting body at `position` with default tuning.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// A resting body at `position` tuned from `config`.
    pub fn from_config(config: &MovementConfig, position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            hit_wall: false,
            ground_bounce: config.ground_bounce,
            wall_bounce: config.wall_bounce,
            max_standable_angle: config.max_standable_angle,
            stop_speed: config.stop_speed,
        }
    }

    /// Builder: set the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// An independent copy of everything the mover can observe on `state`.
    ///
    /// Changes to the copy never reach `state`.
    pub fn snapshot<B: BodyState + ?Sized>(state: &B) -> Self {
        Self {
            position: state.position(),
            velocity: state.velocity(),
            hit_wall: state.hit_wall(),
            ground_bounce: state.ground_bounce(),
            wall_bounce: state.wall_bounce(),
            max_standable_angle: state.max_standable_angle(),
            stop_speed: MovementConfig::default().stop_speed,
        }
    }
}

impl BodyState for Body {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn hit_wall(&self) -> bool {
        self.hit_wall
    }

    fn set_hit_wall(&mut self, hit_wall: bool) {
        self.hit_wall = hit_wall;
    }

    fn ground_bounce(&self) -> f32 {
        self.ground_bounce
    }

    fn wall_bounce(&self) -> f32 {
        self.wall_bounce
    }

    fn max_standable_angle(&self) -> f32 {
        self.max_standable_angle
    }

    /// Stop-speed friction: slow bodies lose at least `stop_speed * amount * delta`.
    fn apply_friction(&mut self, friction_amount: f32, delta: f32) {
        let speed = self.velocity.length();
        if speed < MIN_FRICTION_SPEED {
            return;
        }

        let control = speed.max(self.stop_speed);
        let drop = control * delta * friction_amount;
        let new_speed = (speed - drop).max(0.0);
        if new_speed == speed {
            return;
        }

        self.velocity *= new_speed / speed;
    }
}
