//! Per-body gravity from the active gravity source.
//!
//! Each body tracks the sources whose volumes it is inside ([`GravityAware`]).
//! Once per fixed tick one of them is picked as active by the configured
//! [`SourceSelection`], and [`GravityResolver`] turns it into a direction and
//! an acceleration cached on the body ([`LocalGravity`]). Volume enter/exit
//! wiring lives outside this crate and calls [`GravityAware::add`] /
//! [`GravityAware::remove`].

use bevy_ecs::prelude::*;
use drift_config::{Config, SourceSelectionConfig};
use glam::{Quat, Vec3};

use crate::body::Body;

/// Pull of a gravity source with scale 1.0, in units/s².
pub const DEFAULT_GRAVITY_PULL: f32 = 800.0;

/// How a gravity source decides which way is down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GravityKind {
    /// The world's own down vector.
    #[default]
    EngineDefault,
    /// Toward the source's position, like a planet.
    Spherical,
    /// Along the source's own rotated down axis.
    Directional,
}

/// A volume that applies gravity to the bodies inside it.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct GravitySource {
    pub kind: GravityKind,
    /// Multiplier on the base pull.
    pub scale: f32,
    /// Flip the direction (push away from a spherical source, pull "up" otherwise).
    pub inverse: bool,
    /// Reference point for spherical sources and the `Closest` selection policy.
    pub position: Vec3,
    /// Orientation of directional sources. Down is `rotation * -Y`.
    pub rotation: Quat,
    /// Rank used by the `HighestPriority` selection policy.
    pub priority: i32,
}

impl Default for GravitySource {
    fn default() -> Self {
        Self {
            kind: GravityKind::EngineDefault,
            scale: 1.0,
            inverse: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            priority: 0,
        }
    }
}

impl GravitySource {
    /// Uniform world gravity.
    pub fn engine_default() -> Self {
        Self::default()
    }

    /// Point gravity centred on `position`.
    pub fn spherical(position: Vec3) -> Self {
        Self {
            kind: GravityKind::Spherical,
            position,
            ..Self::default()
        }
    }

    /// Uniform gravity along `rotation * -Y`.
    pub fn directional(rotation: Quat) -> Self {
        Self {
            kind: GravityKind::Directional,
            rotation,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}

/// Policy for picking the active source among several overlapping ones.
///
/// Every policy keeps the earliest registered source on ties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceSelection {
    #[default]
    FirstRegistered,
    Closest,
    StrongestPull,
    HighestPriority,
}

impl From<SourceSelectionConfig> for SourceSelection {
    fn from(config: SourceSelectionConfig) -> Self {
        match config {
            SourceSelectionConfig::FirstRegistered => Self::FirstRegistered,
            SourceSelectionConfig::Closest => Self::Closest,
            SourceSelectionConfig::StrongestPull => Self::StrongestPull,
            SourceSelectionConfig::HighestPriority => Self::HighestPriority,
        }
    }
}

impl SourceSelection {
    /// Pick one of `candidates` (in registration order) for a body at `body_position`.
    pub fn select<'s, T>(
        &self,
        body_position: Vec3,
        candidates: impl IntoIterator<Item = (T, &'s GravitySource)>,
    ) -> Option<(T, &'s GravitySource)> {
        let mut candidates = candidates.into_iter();
        if *self == Self::FirstRegistered {
            return candidates.next();
        }

        let mut best: Option<(T, &'s GravitySource)> = None;
        for (id, source) in candidates {
            let better = match &best {
                None => true,
                Some((_, current)) => match self {
                    Self::FirstRegistered => false,
                    Self::Closest => {
                        source.position.distance_squared(body_position)
                            < current.position.distance_squared(body_position)
                    }
                    Self::StrongestPull => source.scale > current.scale,
                    Self::HighestPriority => source.priority > current.priority,
                },
            };
            if better {
                best = Some((id, source));
            }
        }

        best
    }
}

/// Gravity acting on one body from one source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityResult {
    /// Unit direction of the pull (zero if undefined).
    pub direction: Vec3,
    /// Pull magnitude in units/s².
    pub pull: f32,
    /// `direction * pull`.
    pub acceleration: Vec3,
}

/// Turns a gravity source into a direction and acceleration.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct GravityResolver {
    /// Pull of a source with scale 1.0.
    pub base_pull: f32,
    /// World down used by engine-default sources.
    pub world_down: Vec3,
    /// Active-source policy.
    pub selection: SourceSelection,
}

impl Default for GravityResolver {
    fn default() -> Self {
        Self {
            base_pull: DEFAULT_GRAVITY_PULL,
            world_down: Vec3::NEG_Y,
            selection: SourceSelection::FirstRegistered,
        }
    }
}

impl GravityResolver {
    pub fn from_config(config: &Config) -> Self {
        let gravity = &config.gravity;
        Self {
            base_pull: gravity.base_pull,
            world_down: Vec3::from_array(gravity.world_down)
                .try_normalize()
                .unwrap_or(Vec3::NEG_Y),
            selection: gravity.selection.into(),
        }
    }

    /// Unit gravity direction for a body at `body_position`.
    ///
    /// A body sitting exactly on a spherical source's position gets a zero
    /// direction.
    pub fn resolve_direction(&self, body_position: Vec3, source: &GravitySource) -> Vec3 {
        let down = match source.kind {
            GravityKind::EngineDefault => self.world_down,
            GravityKind::Directional => (source.rotation * Vec3::NEG_Y).normalize_or_zero(),
            GravityKind::Spherical => {
                let away = (body_position - source.position).normalize_or_zero();
                return if source.inverse { away } else { -away };
            }
        };
        if source.inverse { -down } else { down }
    }

    /// Pull magnitude of `source`. Independent of distance.
    pub fn pull(&self, source: &GravitySource) -> f32 {
        self.base_pull * source.scale
    }

    /// Gravity acceleration along `direction` for `source`.
    pub fn resolve_gravity_vector(&self, source: &GravitySource, direction: Vec3) -> Vec3 {
        direction * self.pull(source)
    }

    /// Direction, pull and acceleration in one go.
    pub fn resolve(&self, body_position: Vec3, source: &GravitySource) -> GravityResult {
        let direction = self.resolve_direction(body_position, source);
        let pull = self.pull(source);
        GravityResult {
            direction,
            pull,
            acceleration: direction * pull,
        }
    }
}

/// Gravity sources whose volumes a body is currently inside, in entry order.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct GravityAware {
    sources: Vec<Entity>,
}

impl GravityAware {
    /// Register a source. Registering the same source twice is a no-op.
    pub fn add(&mut self, source: Entity) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Unregister a source.
    pub fn remove(&mut self, source: Entity) {
        self.sources.retain(|s| *s != source);
    }

    pub fn sources(&self) -> &[Entity] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Cached gravity for one body, refreshed every fixed tick.
///
/// Movement reads `direction` to know which way is down.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalGravity {
    /// The active source, `None` when the body is in no gravity volume.
    pub source: Option<Entity>,
    /// Unit gravity direction (zero without a source).
    pub direction: Vec3,
    /// Acceleration in units/s² (zero without a source).
    pub acceleration: Vec3,
}

impl LocalGravity {
    /// Switch gravity off.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }
}

/// Fixed simulation timestep in seconds.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct SimulationStep(pub f32);

impl Default for SimulationStep {
    fn default() -> Self {
        Self(1.0 / 60.0)
    }
}

/// Selects each body's active source and caches its gravity.
pub fn gravity_update_system(
    resolver: Res<GravityResolver>,
    sources: Query<&GravitySource>,
    mut bodies: Query<(Entity, &Body, &GravityAware, &mut LocalGravity)>,
) {
    for (entity, body, aware, mut gravity) in bodies.iter_mut() {
        let candidates = aware
            .sources()
            .iter()
            .filter_map(|e| sources.get(*e).ok().map(|s| (*e, s)));

        match resolver.selection.select(body.position, candidates) {
            Some((active, source)) => {
                let result = resolver.resolve(body.position, source);
                if gravity.source != Some(active) {
                    tracing::debug!(?entity, source = ?active, kind = ?source.kind, "active gravity source changed");
                }
                gravity.source = Some(active);
                gravity.direction = result.direction;
                gravity.acceleration = result.acceleration;
            }
            None => {
                if gravity.is_active() {
                    tracing::debug!(?entity, "left all gravity sources");
                }
                gravity.reset();
            }
        }
    }
}

/// Adds each body's cached gravity to its velocity once per fixed tick.
pub fn apply_gravity_system(step: Res<SimulationStep>, mut bodies: Query<(&mut Body, &LocalGravity)>) {
    for (mut body, gravity) in bodies.iter_mut() {
        if gravity.is_active() {
            body.velocity += gravity.acceleration * step.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_spherical_pulls_toward_source() {
        let resolver = GravityResolver::default();
        let planet = GravitySource::spherical(Vec3::ZERO);

        let dir = resolver.resolve_direction(Vec3::new(0.0, 100.0, 0.0), &planet);
        assert!(close(dir, Vec3::NEG_Y));

        let dir = resolver.resolve_direction(Vec3::new(-30.0, 0.0, 0.0), &planet);
        assert!(close(dir, Vec3::X));
    }

    #[test]
    fn test_inverted_spherical_pushes_away() {
        let resolver = GravityResolver::default();
        let source = GravitySource::spherical(Vec3::new(10.0, 0.0, 0.0)).inverted();
        let dir = resolver.resolve_direction(Vec3::new(10.0, 5.0, 0.0), &source);
        assert!(close(dir, Vec3::Y));
    }

    #[test]
    fn test_spherical_at_centre_has_no_direction() {
        let resolver = GravityResolver::default();
        let source = GravitySource::spherical(Vec3::ONE);
        assert_eq!(resolver.resolve_direction(Vec3::ONE, &source), Vec3::ZERO);
    }

    #[test]
    fn test_engine_default_uses_world_down() {
        let resolver = GravityResolver {
            world_down: Vec3::NEG_Z,
            ..GravityResolver::default()
        };
        let source = GravitySource::engine_default();
        assert_eq!(resolver.resolve_direction(Vec3::splat(50.0), &source), Vec3::NEG_Z);
        assert_eq!(resolver.resolve_direction(Vec3::ZERO, &source.inverted()), Vec3::Z);
    }

    #[test]
    fn test_directional_uses_source_rotation() {
        let resolver = GravityResolver::default();
        // Rolled a quarter turn about Z: -Y rotates onto +X.
        let source = GravitySource::directional(Quat::from_rotation_z(FRAC_PI_2));
        let dir = resolver.resolve_direction(Vec3::new(3.0, 4.0, 5.0), &source);
        assert!(close(dir, Vec3::X), "dir {dir:?}");
        let up = resolver.resolve_direction(Vec3::ZERO, &source.inverted());
        assert!(close(up, Vec3::NEG_X));
    }

    #[test]
    fn test_pull_is_base_times_scale() {
        let resolver = GravityResolver::default();
        let source = GravitySource::spherical(Vec3::ZERO).with_scale(0.5);
        assert_eq!(resolver.pull(&source), 400.0);

        let near = resolver.resolve(Vec3::new(0.0, 1.0, 0.0), &source);
        let far = resolver.resolve(Vec3::new(0.0, 1000.0, 0.0), &source);
        assert_eq!(near.pull, far.pull);
        assert!(close(far.acceleration, Vec3::new(0.0, -400.0, 0.0)));
        assert!(close(
            resolver.resolve_gravity_vector(&source, Vec3::X),
            Vec3::new(400.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_resolver_from_config() {
        let mut config = Config::default();
        config.gravity.base_pull = 600.0;
        config.gravity.world_down = [0.0, 0.0, -2.0];
        config.gravity.selection = SourceSelectionConfig::Closest;

        let resolver = GravityResolver::from_config(&config);
        assert_eq!(resolver.base_pull, 600.0);
        assert_eq!(resolver.world_down, Vec3::NEG_Z);
        assert_eq!(resolver.selection, SourceSelection::Closest);
    }

    #[test]
    fn test_selection_policies() {
        let a = GravitySource::spherical(Vec3::new(100.0, 0.0, 0.0)).with_priority(1);
        let b = GravitySource::spherical(Vec3::new(10.0, 0.0, 0.0)).with_scale(3.0);
        let c = GravitySource::engine_default().at(Vec3::new(50.0, 0.0, 0.0)).with_priority(5);
        let candidates = [(0, &a), (1, &b), (2, &c)];
        let body = Vec3::ZERO;

        let pick = |policy: SourceSelection| policy.select(body, candidates).map(|(id, _)| id);
        assert_eq!(pick(SourceSelection::FirstRegistered), Some(0));
        assert_eq!(pick(SourceSelection::Closest), Some(1));
        assert_eq!(pick(SourceSelection::StrongestPull), Some(1));
        assert_eq!(pick(SourceSelection::HighestPriority), Some(2));
    }

    #[test]
    fn test_selection_ties_keep_first() {
        let a = GravitySource::default();
        let b = GravitySource::default();
        let picked = SourceSelection::HighestPriority
            .select(Vec3::ZERO, [("a", &a), ("b", &b)])
            .map(|(id, _)| id);
        assert_eq!(picked, Some("a"));
        let none: [(u8, &GravitySource); 0] = [];
        assert!(SourceSelection::Closest.select(Vec3::ZERO, none).is_none());
    }

    #[test]
    fn test_gravity_aware_add_remove() {
        let mut world = World::new();
        let s1 = world.spawn_empty().id();
        let s2 = world.spawn_empty().id();

        let mut aware = GravityAware::default();
        aware.add(s1);
        aware.add(s2);
        aware.add(s1);
        assert_eq!(aware.sources(), &[s1, s2]);

        aware.remove(s1);
        assert_eq!(aware.sources(), &[s2]);
        aware.remove(s2);
        assert!(aware.is_empty());
    }

    fn gravity_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((gravity_update_system, apply_gravity_system).chain());
        schedule
    }

    #[test]
    fn test_systems_pull_body_toward_planet() {
        let mut world = World::new();
        world.insert_resource(GravityResolver::default());
        world.insert_resource(SimulationStep(0.1));

        let planet = world.spawn(GravitySource::spherical(Vec3::ZERO)).id();
        let mut aware = GravityAware::default();
        aware.add(planet);
        let body = world
            .spawn((Body::new(Vec3::new(0.0, 0.0, 200.0)), aware, LocalGravity::default()))
            .id();

        gravity_schedule().run(&mut world);

        let gravity = world.get::<LocalGravity>(body).unwrap();
        assert_eq!(gravity.source, Some(planet));
        assert!(close(gravity.direction, Vec3::NEG_Z));
        let velocity = world.get::<Body>(body).unwrap().velocity;
        assert!(close(velocity, Vec3::new(0.0, 0.0, -80.0)), "velocity {velocity:?}");
    }

    #[test]
    fn test_leaving_last_source_resets_gravity() {
        let mut world = World::new();
        world.insert_resource(GravityResolver::default());
        world.insert_resource(SimulationStep::default());

        let field = world.spawn(GravitySource::engine_default()).id();
        let mut aware = GravityAware::default();
        aware.add(field);
        let body = world.spawn((Body::default(), aware, LocalGravity::default())).id();

        let mut schedule = gravity_schedule();
        schedule.run(&mut world);
        assert!(world.get::<LocalGravity>(body).unwrap().is_active());

        world.get_mut::<GravityAware>(body).unwrap().remove(field);
        world.get_mut::<Body>(body).unwrap().velocity = Vec3::ZERO;
        schedule.run(&mut world);

        let gravity = world.get::<LocalGravity>(body).unwrap();
        assert_eq!(*gravity, LocalGravity::default());
        assert_eq!(world.get::<Body>(body).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_despawned_source_is_skipped() {
        let mut world = World::new();
        world.insert_resource(GravityResolver::default());
        world.insert_resource(SimulationStep::default());

        let gone = world.spawn(GravitySource::spherical(Vec3::ZERO)).id();
        let field = world.spawn(GravitySource::engine_default().with_scale(2.0)).id();
        let mut aware = GravityAware::default();
        aware.add(gone);
        aware.add(field);
        let body = world.spawn((Body::default(), aware, LocalGravity::default())).id();
        world.despawn(gone);

        gravity_schedule().run(&mut world);

        let gravity = world.get::<LocalGravity>(body).unwrap();
        assert_eq!(gravity.source, Some(field));
        assert!(close(gravity.acceleration, Vec3::new(0.0, -1600.0, 0.0)));
    }
}
