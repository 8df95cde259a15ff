//! Demo binary that drives the gravity-aware mover through scripted scenarios.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p drift-demo` to see the log output.
//! Run with `cargo run -p drift-demo -- --ticks 600 --log-level debug` for a longer run.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use drift_config::{CliArgs, Config};
use drift_physics::{
    Body, BoxWorld, ClipPlanes, GravityAware, GravityMover, GravityResolver, GravitySource,
    LocalGravity, MoverSettings, SimulationStep, SolidBox, SourceSelection, SweepQuery,
    apply_gravity_system, body_movement_system, gravity_update_system,
};
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{info, warn};

/// A floor with its top face at y = 0 and a 10-unit stair starting at x = 20.
fn demo_world() -> BoxWorld {
    BoxWorld::new()
        .with_box(SolidBox::new(
            Vec3::new(-500.0, -10.0, -500.0),
            Vec3::new(500.0, 0.0, 500.0),
        ))
        .with_box(SolidBox::new(
            Vec3::new(20.0, -1.0, -50.0),
            Vec3::new(60.0, 10.0, 50.0),
        ))
        .with_box(SolidBox::new(
            Vec3::new(60.0, -1.0, -50.0),
            Vec3::new(70.0, 200.0, 50.0),
        ))
}

/// Resolves a velocity against a floor and a wall at once.
fn demonstrate_clip_planes() {
    info!("Starting clip plane demonstration");

    let mut planes = ClipPlanes::default();
    let velocity = Vec3::new(10.0, -10.0, 4.0);
    planes.begin(velocity);

    let mut current = velocity;
    for normal in [Vec3::Y, Vec3::NEG_X] {
        planes.start_bump(current);
        match planes.try_add(normal, current, 0.0) {
            Some(resolved) => current = resolved,
            None => warn!("Clip plane capacity reached"),
        }
    }

    info!(
        "Velocity {velocity:?} against {} planes resolves to {current:?}",
        planes.len()
    );
    info!("Clip plane demonstration completed successfully");
}

/// Walks a body into the stair, then into the tall wall behind it.
fn demonstrate_step_climb(config: &Config) {
    info!("Starting step climb demonstration");

    let world = demo_world();
    let settings = MoverSettings::from_config(config);
    let mut body = Body::from_config(&config.movement, Vec3::new(15.0, 0.5, 0.0))
        .with_velocity(Vec3::new(100.0, 0.0, 0.0));

    let fraction = GravityMover::new(&world, &mut body, Vec3::NEG_Y)
        .with_settings(settings)
        .try_move_with_step(0.1, settings.step_size);
    info!(
        "Stair: fraction {fraction:.2}, position {:?}, hit wall {}",
        body.position, body.hit_wall
    );

    body.position = Vec3::new(55.0, 10.0, 0.0);
    body.velocity = Vec3::new(100.0, 0.0, 0.0);
    let fraction = GravityMover::new(&world, &mut body, Vec3::NEG_Y)
        .with_settings(settings)
        .try_move_with_step(0.1, settings.step_size);
    info!(
        "Wall: fraction {fraction:.2}, position {:?}, hit wall {}",
        body.position, body.hit_wall
    );

    info!("Step climb demonstration completed successfully");
}

/// Frees a body embedded in the floor.
fn demonstrate_unstuck(config: &Config) {
    info!("Starting unstuck demonstration");

    let world = demo_world();
    let mut body = Body::from_config(&config.movement, Vec3::new(0.0, -2.5, 0.0));
    let before = body.position;

    let freed = GravityMover::new(&world, &mut body, Vec3::NEG_Y)
        .with_settings(MoverSettings::from_config(config))
        .try_unstuck();

    if freed {
        info!("Unstuck: {before:?} -> {:?}", body.position);
    } else {
        warn!("Unstuck failed at {before:?}");
    }
    info!("Unstuck demonstration completed successfully");
}

/// Resolves gravity from each source kind and each selection policy.
fn demonstrate_gravity_sources(config: &Config) {
    info!("Starting gravity source demonstration");

    let resolver = GravityResolver::from_config(config);
    let body_position = Vec3::new(0.0, 120.0, 40.0);
    let sources = [
        ("engine", GravitySource::engine_default()),
        ("planet", GravitySource::spherical(Vec3::ZERO).with_scale(1.5).with_priority(2)),
        (
            "ramp",
            GravitySource::directional(Quat::from_rotation_x(0.3))
                .at(Vec3::new(0.0, 100.0, 40.0))
                .with_priority(1),
        ),
    ];

    for (name, source) in &sources {
        let result = resolver.resolve(body_position, source);
        info!(
            "{name}: direction {:?}, pull {:.1}, acceleration {:?}",
            result.direction, result.pull, result.acceleration
        );
    }

    for policy in [
        SourceSelection::FirstRegistered,
        SourceSelection::Closest,
        SourceSelection::StrongestPull,
        SourceSelection::HighestPriority,
    ] {
        let active = policy.select(body_position, sources.iter().map(|(name, s)| (*name, s)));
        info!("{policy:?} picks {:?}", active.map(|(name, _)| name));
    }

    info!("Gravity source demonstration completed successfully");
}

/// Runs the ECS schedule with a handful of bodies dropped over the stair.
fn run_simulation(config: &Config, ticks: u32) {
    info!("Starting simulation: {ticks} ticks");

    let mut world = World::new();
    world.insert_resource(demo_world());
    world.insert_resource(MoverSettings::from_config(config));
    world.insert_resource(GravityResolver::from_config(config));
    world.insert_resource(SimulationStep::default());

    let field = world.spawn(GravitySource::engine_default()).id();

    let mut rng = Xoshiro256StarStar::seed_from_u64(config.unstuck.rng_seed);
    let mut bodies = Vec::new();
    for _ in 0..8 {
        let position = Vec3::new(
            rng.gen_range(-10.0..15.0),
            rng.gen_range(1.0..30.0),
            rng.gen_range(-20.0..20.0),
        );
        let velocity = Vec3::new(rng.gen_range(50.0..250.0), 0.0, rng.gen_range(-40.0..40.0));
        let mut aware = GravityAware::default();
        aware.add(field);
        let entity = world
            .spawn((
                Body::from_config(&config.movement, position).with_velocity(velocity),
                aware,
                LocalGravity::default(),
            ))
            .id();
        bodies.push(entity);
    }

    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            gravity_update_system,
            apply_gravity_system,
            body_movement_system::<BoxWorld>,
        )
            .chain(),
    );

    for tick in 0..ticks {
        schedule.run(&mut world);
        if tick % 30 == 0
            && let Some(body) = bodies.first().and_then(|e| world.get::<Body>(*e))
        {
            info!("Tick {tick}: first body at {:?}", body.position);
        }
    }

    let solid = world.resource::<BoxWorld>();
    for (i, entity) in bodies.iter().enumerate() {
        let Some(body) = world.get::<Body>(*entity) else {
            continue;
        };
        if solid.sweep(body.position, body.position).start_solid {
            warn!("Body {i} ended inside solid geometry at {:?}", body.position);
        } else {
            info!("Body {i} ended at {:?}, velocity {:?}", body.position, body.velocity);
        }
    }

    info!("Simulation completed successfully");
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(drift_config::default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".drift"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    // Initialize logging with config and debug settings
    let log_dir = config_dir.join("logs");
    drift_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    demonstrate_clip_planes();
    demonstrate_step_climb(&config);
    demonstrate_unstuck(&config);
    demonstrate_gravity_sources(&config);
    run_simulation(&config, args.ticks);
}
