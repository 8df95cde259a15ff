//! Gravity-aware move-and-slide for a single body.
//!
//! [`GravityMover`] sweeps a body through a [`SweepQuery`] backend along its
//! velocity, clipping against every surface it bumps into, optionally climbing
//! steps, and recovering bodies embedded in solid geometry. "Up" is whatever
//! the active gravity says it is, fixed for the lifetime of the mover.

use bevy_ecs::prelude::*;
use drift_config::Config;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::body::{Body, BodyState};
use crate::clip_planes::{CLIP_ITERATIONS, ClipPlanes, MAX_CLIP_PLANES};
use crate::trace::{SweepQuery, TraceResult};

/// Speeds below this are treated as standing still.
const STOPPED_SPEED: f32 = 1.0e-4;

/// Default push-off distance after hitting a surface.
pub const SURFACE_NUDGE: f32 = 0.031_25;

/// Tunables for the move loop and unstuck search.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct MoverSettings {
    /// Distance a body is pushed along the surface normal after each hit.
    pub surface_nudge: f32,
    /// Maximum clip planes (and bumps) per move step.
    pub max_clip_planes: usize,
    /// Joint resolution passes per bump.
    pub clip_iterations: usize,
    /// Straight-up unstuck probes.
    pub up_attempts: u32,
    /// Random-direction unstuck probes.
    pub random_attempts: u32,
    /// Gap left between a recovered body and the surface it escaped through.
    pub snap_margin: f32,
    /// Seed mixed with the body position for random unstuck probes.
    pub rng_seed: u64,
    /// Step-up height used by the movement system.
    pub step_size: f32,
    /// Ground friction used by the movement system.
    pub friction: f32,
}

impl Default for MoverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl MoverSettings {
    /// Build settings from the movement and unstuck config sections.
    pub fn from_config(config: &Config) -> Self {
        let movement = &config.movement;
        let unstuck = &config.unstuck;
        Self {
            surface_nudge: movement.surface_nudge,
            max_clip_planes: if movement.max_clip_planes == 0 {
                MAX_CLIP_PLANES
            } else {
                movement.max_clip_planes
            },
            clip_iterations: if movement.clip_iterations == 0 {
                CLIP_ITERATIONS
            } else {
                movement.clip_iterations
            },
            up_attempts: unstuck.up_attempts,
            random_attempts: unstuck.random_attempts,
            snap_margin: unstuck.snap_margin,
            rng_seed: unstuck.rng_seed,
            step_size: movement.step_size,
            friction: movement.friction,
        }
    }
}

/// The "down"/"up" pair a mover works in. `up` is always `-down`, both unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityOrientation {
    down: Vec3,
    up: Vec3,
}

impl Default for GravityOrientation {
    fn default() -> Self {
        Self::from_down(Vec3::NEG_Y)
    }
}

impl GravityOrientation {
    /// Orientation from a down vector. Zero-length input falls back to `-Y`.
    pub fn from_down(down: Vec3) -> Self {
        let down = down.try_normalize().unwrap_or(Vec3::NEG_Y);
        Self { down, up: -down }
    }

    /// Unit "down".
    pub fn down(&self) -> Vec3 {
        self.down
    }

    /// Unit "up".
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Angle in degrees between `normal` and "up". Degenerate normals count as vertical walls.
    pub fn angle_to_up(&self, normal: Vec3) -> f32 {
        let Some(normal) = normal.try_normalize() else {
            return 90.0;
        };
        normal.dot(self.up).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Which unstuck phase freed a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnstuckPhase {
    Upward,
    Random,
}

/// Moves one body through the world under a fixed gravity orientation.
pub struct GravityMover<'a, W: SweepQuery + ?Sized, B: BodyState> {
    world: &'a W,
    body: &'a mut B,
    orientation: GravityOrientation,
    settings: MoverSettings,
}

impl<'a, W: SweepQuery + ?Sized, B: BodyState> GravityMover<'a, W, B> {
    /// A mover for `body` in `world`, with "down" along `down`.
    pub fn new(world: &'a W, body: &'a mut B, down: Vec3) -> Self {
        Self {
            world,
            body,
            orientation: GravityOrientation::from_down(down),
            settings: MoverSettings::default(),
        }
    }

    /// Builder: replace the settings.
    pub fn with_settings(mut self, settings: MoverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Unit "down".
    pub fn down(&self) -> Vec3 {
        self.orientation.down()
    }

    /// Unit "up".
    pub fn up(&self) -> Vec3 {
        self.orientation.up()
    }

    /// The body being moved.
    pub fn body(&self) -> &B {
        self.body
    }

    /// Sweep between two arbitrary points.
    pub fn sweep_from_to(&self, start: Vec3, end: Vec3) -> TraceResult {
        self.world.sweep(start, end)
    }

    /// Sweep from the body's position along `direction`.
    pub fn sweep_direction(&self, direction: Vec3) -> TraceResult {
        self.world.sweep_direction(self.body.position(), direction)
    }

    /// True if `trace` hit a surface shallow enough to stand on.
    ///
    /// A surface exactly at the standable angle is not floor.
    pub fn is_floor(&self, trace: &TraceResult) -> bool {
        trace.hit && self.orientation.angle_to_up(trace.normal) < self.body.max_standable_angle()
    }

    /// Delegate friction to the body store.
    pub fn apply_friction(&mut self, friction_amount: f32, delta: f32) {
        self.body.apply_friction(friction_amount, delta);
    }

    /// Move straight by `delta`, stopping at the first obstruction. No sliding.
    pub fn move_by(&mut self, delta: Vec3) -> TraceResult {
        let position = self.body.position();
        let trace = self.world.sweep(position, position + delta);
        self.body.set_position(trace.end_position);
        trace
    }

    /// Slide the body along its velocity for `timestep` seconds.
    ///
    /// Returns the summed fraction of each bump's requested distance. The sum
    /// is not clamped: a step that hits a wall halfway and then slides freely
    /// returns 1.5. A return of exactly zero also zeroes the velocity.
    pub fn try_move(&mut self, timestep: f32) -> f32 {
        let mut time_left = timestep;
        let mut travel_fraction = 0.0;
        self.body.set_hit_wall(false);

        let mut planes = ClipPlanes::new(self.settings.max_clip_planes, self.settings.clip_iterations);
        planes.begin(self.body.velocity());

        for bump in 0..planes.capacity() {
            let velocity = self.body.velocity();
            if velocity.length() < STOPPED_SPEED {
                break;
            }

            let position = self.body.position();
            let trace = self.world.sweep(position, position + velocity * time_left);
            travel_fraction += trace.fraction;

            if !trace.hit {
                self.body.set_position(trace.end_position);
                break;
            }

            // Sweeps can report an end point marginally inside the surface.
            self.body
                .set_position(trace.end_position + trace.normal * self.settings.surface_nudge);

            planes.start_bump(velocity);

            let angle = self.orientation.angle_to_up(trace.normal);
            if bump == 0 && angle >= self.body.max_standable_angle() {
                self.body.set_hit_wall(true);
            }

            time_left -= time_left * trace.fraction;

            let bounce = if self.is_floor(&trace) {
                self.body.ground_bounce()
            } else {
                self.body.wall_bounce()
            };

            tracing::trace!(bump, fraction = trace.fraction, normal = ?trace.normal, angle, "bump");

            match planes.try_add(trace.normal, velocity, bounce) {
                Some(resolved) => self.body.set_velocity(resolved),
                None => {
                    tracing::debug!(planes = planes.len(), "clip plane capacity exhausted");
                    break;
                }
            }
        }

        if travel_fraction == 0.0 {
            self.body.set_velocity(Vec3::ZERO);
        }

        travel_fraction
    }

    /// Like [`try_move`](Self::try_move), but also tries stepping over
    /// obstacles up to `step_size` high and keeps whichever got further.
    ///
    /// The stepped attempt runs on a detached copy of the body and is only
    /// committed if it lands on standable ground farther from the start.
    ///
    /// A landing exactly at the standable angle is accepted here, even though
    /// [`is_floor`](Self::is_floor) and the wall check in `try_move` treat
    /// that angle as a wall.
    pub fn try_move_with_step(&mut self, timestep: f32, step_size: f32) -> f32 {
        let start = self.body.position();
        let mut probe = Body::snapshot(&*self.body);

        let fraction = self.try_move(timestep);

        let (step_fraction, landing) = {
            let mut stepper = GravityMover {
                world: self.world,
                body: &mut probe,
                orientation: self.orientation,
                settings: self.settings,
            };
            stepper.move_by(self.orientation.up() * step_size);
            let step_fraction = stepper.try_move(timestep);
            let landing = stepper.move_by(self.orientation.down() * step_size);
            (step_fraction, landing)
        };

        if !landing.hit {
            return fraction;
        }

        if self.orientation.angle_to_up(landing.normal) > self.body.max_standable_angle() {
            return fraction;
        }

        if start.distance(probe.position) <= start.distance(self.body.position()) {
            return fraction;
        }

        tracing::debug!(
            from = ?self.body.position(),
            to = ?probe.position,
            "step-up result committed"
        );
        self.body.set_position(probe.position);
        self.body.set_velocity(probe.velocity);
        self.body.set_hit_wall(probe.hit_wall);

        step_fraction
    }

    /// True if the body's position is inside solid geometry.
    pub fn is_stuck(&self) -> bool {
        let position = self.body.position();
        self.world.sweep(position, position).start_solid
    }

    /// Free the body if it is embedded in solid geometry.
    ///
    /// Returns `true` if the body was not stuck or has been freed, `false` if
    /// both search phases failed and the body is still stuck.
    pub fn try_unstuck(&mut self) -> bool {
        if !self.is_stuck() {
            return true;
        }
        self.unstuck()
    }

    fn unstuck(&mut self) -> bool {
        let origin = self.body.position();

        // Most stuck bodies are sunk into the floor.
        let up = self.orientation.up();
        for i in 1..=self.settings.up_attempts {
            let candidate = origin + up * i as f32;
            if self.escape_through(UnstuckPhase::Upward, i, candidate, origin) {
                return true;
            }
        }

        let mut rng = Xoshiro256StarStar::seed_from_u64(probe_seed(self.settings.rng_seed, origin));
        for i in 1..=self.settings.random_attempts {
            let candidate = origin + random_direction(&mut rng) * i as f32;
            if self.escape_through(UnstuckPhase::Random, i, candidate, origin) {
                return true;
            }
        }

        tracing::warn!(position = ?origin, "body is stuck and no escape was found");
        false
    }

    /// Snap to `candidate` if it is free, backing toward `origin` up to the margin.
    fn escape_through(&mut self, phase: UnstuckPhase, attempt: u32, candidate: Vec3, origin: Vec3) -> bool {
        let trace = self.world.sweep(candidate, origin);
        if trace.start_solid {
            return false;
        }

        let snapped = candidate + trace.direction * (trace.distance - self.settings.snap_margin);
        tracing::debug!(?phase, attempt, from = ?origin, to = ?snapped, "body unstuck");
        self.body.set_position(snapped);
        self.body.set_velocity(Vec3::ZERO);
        true
    }
}

/// Seed for the random unstuck phase, varied by where the body is stuck.
fn probe_seed(seed: u64, position: Vec3) -> u64 {
    let [x, y, z] = position.to_array().map(|c| u64::from(c.to_bits()));
    seed ^ x.rotate_left(42) ^ y.rotate_left(21) ^ z
}

/// Uniformly distributed unit vector.
fn random_direction(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1.0e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

#[cfg(test)]
#[path = "mover_tests.rs"]
mod tests;
