//! Static axis-aligned box geometry answering point sweeps.
//!
//! Deterministic and cheap; drives the scenario tests and the demo.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::trace::{SweepQuery, TraceResult};

/// A solid axis-aligned box.
///
/// Invariant: `min <= max` on every axis. The constructor enforces this by
/// sorting components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl SolidBox {
    /// Box spanning two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Returns true if the point lies strictly inside. Points on a face are free.
    pub fn contains_strict(&self, p: Vec3) -> bool {
        p.cmpgt(self.min).all() && p.cmplt(self.max).all()
    }

    /// Where the segment `start + delta * t` first enters the box, if it
    /// does so at some `t` in `0..=1`.
    pub fn entry(&self, start: Vec3, delta: Vec3) -> Option<BoxEntry> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut entered = BoxEntry {
            fraction: 0.0,
            axis: 0,
            normal: Vec3::ZERO,
            plane: 0.0,
        };

        for axis in 0..3 {
            let s = start[axis];
            let d = delta[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d == 0.0 {
                if s < lo || s > hi {
                    return None;
                }
                continue;
            }

            let (t_near, t_far, face, plane) = if d > 0.0 {
                ((lo - s) / d, (hi - s) / d, -1.0, lo)
            } else {
                ((hi - s) / d, (lo - s) / d, 1.0, hi)
            };

            if t_near > t_enter {
                t_enter = t_near;
                entered.axis = axis;
                entered.normal = Vec3::ZERO;
                entered.normal[axis] = face;
                entered.plane = plane;
            }
            t_exit = t_exit.min(t_far);
        }

        // Grazing an edge or face enters and exits at the same instant.
        if t_enter >= t_exit || !(0.0..=1.0).contains(&t_enter) {
            return None;
        }
        entered.fraction = t_enter;
        Some(entered)
    }
}

/// Where a sweep segment enters a [`SolidBox`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxEntry {
    /// Fraction of the segment travelled before entry.
    pub fraction: f32,
    /// Axis (0, 1, 2) of the face crossed.
    pub axis: usize,
    /// Outward normal of the face crossed.
    pub normal: Vec3,
    /// Coordinate of the face crossed along `axis`.
    pub plane: f32,
}

/// A world made of static solid boxes.
#[derive(Resource, Clone, Debug, Default)]
pub struct BoxWorld {
    boxes: Vec<SolidBox>,
}

impl BoxWorld {
    /// An empty world; every sweep misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a box.
    pub fn with_box(mut self, solid: SolidBox) -> Self {
        self.boxes.push(solid);
        self
    }

    /// Add a box.
    pub fn add_box(&mut self, solid: SolidBox) {
        self.boxes.push(solid);
    }

    /// All boxes in insertion order.
    pub fn boxes(&self) -> &[SolidBox] {
        &self.boxes
    }

    /// True if `point` is strictly inside any box.
    pub fn is_solid(&self, point: Vec3) -> bool {
        self.boxes.iter().any(|b| b.contains_strict(point))
    }
}

impl SweepQuery for BoxWorld {
    fn sweep(&self, start: Vec3, end: Vec3) -> TraceResult {
        if self.is_solid(start) {
            return TraceResult::started_solid(start, end);
        }

        let delta = end - start;
        if delta == Vec3::ZERO {
            return TraceResult::miss(start, end);
        }

        let nearest = self
            .boxes
            .iter()
            .filter_map(|b| b.entry(start, delta))
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction));

        match nearest {
            Some(entry) => {
                let mut trace = TraceResult::hit(start, end, entry.fraction, entry.normal);
                // Rounding can leave the end point a hair inside the face.
                trace.end_position[entry.axis] = entry.plane;
                trace
            }
            None => TraceResult::miss(start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> SolidBox {
        SolidBox::new(Vec3::new(-100.0, -10.0, -100.0), Vec3::new(100.0, 0.0, 100.0))
    }

    #[test]
    fn test_new_sorts_corners() {
        let b = SolidBox::new(Vec3::new(1.0, -1.0, 5.0), Vec3::new(-1.0, 1.0, 2.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 2.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn test_surface_point_is_not_solid() {
        let world = BoxWorld::new().with_box(floor());
        assert!(!world.is_solid(Vec3::ZERO));
        assert!(world.is_solid(Vec3::new(0.0, -0.1, 0.0)));
    }

    #[test]
    fn test_downward_sweep_hits_floor_top() {
        let world = BoxWorld::new().with_box(floor());
        let tr = world.sweep(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, -4.0, 0.0));
        assert!(tr.hit && !tr.start_solid);
        assert!((tr.fraction - 0.5).abs() < 1e-6);
        assert_eq!(tr.normal, Vec3::Y);
        assert!(tr.end_position.y.abs() < 1e-5);
    }

    #[test]
    fn test_sweep_along_surface_misses() {
        let world = BoxWorld::new().with_box(floor());
        let tr = world.sweep(Vec3::new(0.0, 0.01, 0.0), Vec3::new(50.0, 0.01, 0.0));
        assert!(!tr.hit);
        assert_eq!(tr.fraction, 1.0);
    }

    #[test]
    fn test_leaving_from_surface_misses() {
        let world = BoxWorld::new().with_box(floor());
        let tr = world.sweep(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0));
        assert!(!tr.hit);
    }

    #[test]
    fn test_start_inside_is_start_solid() {
        let world = BoxWorld::new().with_box(floor());
        let p = Vec3::new(0.0, -2.0, 0.0);
        let tr = world.sweep(p, p);
        assert!(tr.start_solid);
        assert_eq!(tr.fraction, 0.0);
    }

    #[test]
    fn test_nearest_box_wins() {
        let near = SolidBox::new(Vec3::new(5.0, -5.0, -5.0), Vec3::new(6.0, 5.0, 5.0));
        let far = SolidBox::new(Vec3::new(8.0, -5.0, -5.0), Vec3::new(9.0, 5.0, 5.0));
        let world = BoxWorld::new().with_box(far).with_box(near);

        let tr = world.sweep(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert!((tr.fraction - 0.5).abs() < 1e-6);
        assert_eq!(tr.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_edge_graze_is_not_a_hit() {
        let b = SolidBox::new(Vec3::ZERO, Vec3::ONE);
        // Passes exactly through the corner at (1, 1, z).
        assert!(b.entry(Vec3::new(0.0, 2.0, 0.5), Vec3::new(2.0, -2.0, 0.0)).is_none());
    }
}
