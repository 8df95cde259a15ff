//! Velocity clipping against every surface touched during one move step.
//!
//! Projecting against only the latest surface lets a body slide back into the
//! previous one at creases and corners. [`resolve`] instead keeps re-clipping
//! against all accumulated planes until none is penetrated, and falls back to
//! sliding along a crease (or stopping) when the iteration budget runs out.

use glam::Vec3;

/// Maximum number of clip planes (and therefore bumps) per move step.
pub const MAX_CLIP_PLANES: usize = 5;

/// Joint resolution passes over the accumulated planes.
pub const CLIP_ITERATIONS: usize = 8;

/// Penetration tolerated when checking a resolved velocity against a plane.
pub const CLIP_EPSILON: f32 = 1.0e-4;

/// Remove the into-surface component of `velocity` and reflect `bounce` of it back out.
///
/// Velocities already leaving the surface are returned unchanged.
pub fn clip_velocity(velocity: Vec3, normal: Vec3, bounce: f32) -> Vec3 {
    let into = velocity.dot(normal);
    if into >= 0.0 {
        return velocity;
    }
    velocity - normal * (into * (1.0 + bounce))
}

/// True when `velocity` does not drive into any of `planes`.
pub fn satisfies_all(planes: &[Vec3], velocity: Vec3) -> bool {
    planes.iter().all(|n| velocity.dot(*n) >= -CLIP_EPSILON)
}

/// Resolve `velocity` against all `planes` at once.
///
/// Returns the new velocity and whether the joint iteration converged. When it
/// does not, the returned velocity is the input projected onto the first
/// crease (intersection of two planes) that satisfies every plane, or zero.
/// Either way the result never penetrates any plane.
pub fn resolve(planes: &[Vec3], velocity: Vec3, bounce: f32, iterations: usize) -> (Vec3, bool) {
    let mut resolved = velocity;

    for _ in 0..iterations.max(1) {
        for normal in planes {
            resolved = clip_velocity(resolved, *normal, bounce);
        }
        if satisfies_all(planes, resolved) {
            return (resolved, true);
        }
    }

    for (i, a) in planes.iter().enumerate() {
        for b in &planes[i + 1..] {
            let crease = a.cross(*b).normalize_or_zero();
            let along = crease * crease.dot(velocity);
            if satisfies_all(planes, along) {
                return (along, false);
            }
        }
    }

    (Vec3::ZERO, false)
}

/// Bounded, ordered set of contact normals for a single move step.
#[derive(Clone, Debug)]
pub struct ClipPlanes {
    planes: Vec<Vec3>,
    capacity: usize,
    iterations: usize,
    initial_velocity: Vec3,
    bump_velocity: Vec3,
    bumps: usize,
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self::new(MAX_CLIP_PLANES, CLIP_ITERATIONS)
    }
}

impl ClipPlanes {
    /// An empty set holding at most `capacity` planes (minimum 1).
    pub fn new(capacity: usize, iterations: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            planes: Vec::with_capacity(capacity),
            capacity,
            iterations: iterations.max(1),
            initial_velocity: Vec3::ZERO,
            bump_velocity: Vec3::ZERO,
            bumps: 0,
        }
    }

    /// Reset for a new move step.
    pub fn begin(&mut self, initial_velocity: Vec3) {
        self.planes.clear();
        self.initial_velocity = initial_velocity;
        self.bump_velocity = initial_velocity;
        self.bumps = 0;
    }

    /// Record the velocity a new bump starts with. Repeating the same
    /// velocity within a bump changes nothing.
    pub fn start_bump(&mut self, velocity: Vec3) {
        if self.bumps == 0 || velocity != self.bump_velocity {
            self.bumps += 1;
        }
        self.bump_velocity = velocity;
    }

    /// Add `normal` and resolve `velocity` against every plane so far.
    ///
    /// Returns `None` once the set is full; the caller should stop bumping.
    pub fn try_add(&mut self, normal: Vec3, velocity: Vec3, bounce: f32) -> Option<Vec3> {
        if self.is_full() {
            return None;
        }
        self.planes.push(normal);

        let (resolved, converged) = resolve(&self.planes, velocity, bounce, self.iterations);
        if !converged {
            tracing::trace!(
                planes = self.planes.len(),
                ?resolved,
                "clip iteration did not converge, using crease fallback"
            );
        }
        Some(resolved)
    }

    /// The accumulated normals in collision order.
    pub fn planes(&self) -> &[Vec3] {
        &self.planes
    }

    /// Number of accumulated planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// True when no plane has been added since [`begin`](Self::begin).
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Maximum number of planes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when another [`try_add`](Self::try_add) would be rejected.
    pub fn is_full(&self) -> bool {
        self.planes.len() >= self.capacity
    }

    /// Velocity the step started with.
    pub fn initial_velocity(&self) -> Vec3 {
        self.initial_velocity
    }

    /// Velocity recorded by the latest [`start_bump`](Self::start_bump).
    pub fn bump_velocity(&self) -> Vec3 {
        self.bump_velocity
    }

    /// Number of distinct bumps started since [`begin`](Self::begin).
    pub fn bumps(&self) -> usize {
        self.bumps
    }
}
