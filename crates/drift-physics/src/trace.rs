//! Sweep queries: the collision contract the mover is written against.
//!
//! A backend answers "move a point from here to there, what did it hit first?"
//! with a [`TraceResult`]. The mover never looks at geometry directly.

use glam::Vec3;

/// Result of a single sweep through the world.
///
/// Produced fresh by every query and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// Whether the sweep was obstructed.
    pub hit: bool,
    /// Whether the start point was already inside solid geometry.
    pub start_solid: bool,
    /// Fraction of the requested distance travelled (`0.0..=1.0`).
    pub fraction: f32,
    /// Where the sweep began.
    pub start_position: Vec3,
    /// Where the sweep stopped.
    pub end_position: Vec3,
    /// Surface normal at the obstruction, pointing into free space.
    /// Zero when nothing was hit or the sweep started in solid.
    pub normal: Vec3,
    /// Distance actually travelled.
    pub distance: f32,
    /// Normalized direction of travel (zero for zero-length sweeps).
    pub direction: Vec3,
}

impl TraceResult {
    /// An unobstructed sweep that reached `end`.
    pub fn miss(start: Vec3, end: Vec3) -> Self {
        let delta = end - start;
        Self {
            hit: false,
            start_solid: false,
            fraction: 1.0,
            start_position: start,
            end_position: end,
            normal: Vec3::ZERO,
            distance: delta.length(),
            direction: delta.normalize_or_zero(),
        }
    }

    /// A sweep stopped at `fraction` of the way to `end` by a surface with `normal`.
    pub fn hit(start: Vec3, end: Vec3, fraction: f32, normal: Vec3) -> Self {
        let delta = end - start;
        let fraction = fraction.clamp(0.0, 1.0);
        Self {
            hit: true,
            start_solid: false,
            fraction,
            start_position: start,
            end_position: start + delta * fraction,
            normal: normal.normalize_or_zero(),
            distance: delta.length() * fraction,
            direction: delta.normalize_or_zero(),
        }
    }

    /// A sweep whose start point is embedded in solid geometry.
    pub fn started_solid(start: Vec3, end: Vec3) -> Self {
        Self {
            hit: true,
            start_solid: true,
            fraction: 0.0,
            start_position: start,
            end_position: start,
            normal: Vec3::ZERO,
            distance: 0.0,
            direction: (end - start).normalize_or_zero(),
        }
    }
}

/// Collision backend answering point sweeps.
///
/// Implementations must always return a well-formed result; there is no
/// failure channel. Queries are synchronous and side-effect free.
pub trait SweepQuery {
    /// Sweep from `start` to `end`.
    fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult;

    /// Sweep from `start` along `direction` (its length is the distance).
    fn sweep_direction(&self, start: Vec3, direction: Vec3) -> TraceResult {
        self.sweep(start, start + direction)
    }
}

impl<T: SweepQuery + ?Sized> SweepQuery for &T {
    fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult {
        (**self).sweep(start, end)
    }

    fn sweep_direction(&self, start: Vec3, direction: Vec3) -> TraceResult {
        (**self).sweep_direction(start, direction)
    }
}
