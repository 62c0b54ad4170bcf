//! Arena Phys - native demo
//!
//! Runs a small chase scene headless: a player body in the middle of the
//! arena and a few chasers steering toward it. Collision events are logged
//! (`RUST_LOG=debug` for per-contact detail) and the final state is printed as
//! JSON.
//!
//! Usage: `arena-phys [TUNABLES.json | PRESET] [TICKS]`

use std::cell::Cell;
use std::rc::Rc;

use arena_phys::{Arena, Body, BodyId, PhysicsEngine, TunablePreset, Tunables};
use glam::Vec2;

const ARENA_WIDTH: f32 = 800.0;
const ARENA_HEIGHT: f32 = 600.0;
const OBJECT_SIZE: f32 = 24.0;
const CHASER_COUNT: usize = 3;
const CHASER_START_OFFSET: f32 = 60.0;
const CHASER_ACCELERATION: f32 = 0.08;
const CHASER_SPEED_CAP: f32 = 6.0;
const DEFAULT_TICKS: u64 = 600;

fn main() {
    env_logger::init();
    log::info!("Arena Phys (native) starting...");

    let mut args = std::env::args().skip(1);
    let tunables = match args.next() {
        Some(arg) => match TunablePreset::from_str(&arg) {
            Some(preset) => {
                log::info!("Using {} preset", preset.as_str());
                Tunables::from_preset(preset)
            }
            None => match Tunables::load(&arg) {
                Ok(t) => t,
                Err(e) => {
                    log::error!("{}", e);
                    std::process::exit(1);
                }
            },
        },
        None => Tunables::from_preset(TunablePreset::Arcade),
    };
    let ticks = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    if let Err(e) = run(tunables, ticks) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(tunables: Tunables, ticks: u64) -> arena_phys::Result<()> {
    let arena = Arena::new(ARENA_WIDTH, ARENA_HEIGHT);
    let mut engine = PhysicsEngine::with_tunables(tunables)?;

    let wall_hits = Rc::new(Cell::new(0u32));
    let tags = Rc::new(Cell::new(0u32));

    let center = Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0);
    let mut player =
        Body::square("player", center, OBJECT_SIZE).with_velocity(Vec2::new(3.0, -2.0));
    let hits = Rc::clone(&wall_hits);
    let tagged = Rc::clone(&tags);
    player.add_collision_callback(move |contact| match contact.other {
        None => hits.set(hits.get() + 1),
        Some(_) => tagged.set(tagged.get() + 1),
    });
    let player_id = engine.add_body(player)?;

    let mut chasers = Vec::with_capacity(CHASER_COUNT);
    for i in 0..CHASER_COUNT {
        // Alternate sides along X, step down along Y
        let x = if (i + 1) % 2 == 0 {
            ARENA_WIDTH - CHASER_START_OFFSET
        } else {
            CHASER_START_OFFSET
        };
        let y = CHASER_START_OFFSET * (i as f32 + 1.0);
        let chaser =
            Body::square(format!("chaser-{i}"), Vec2::new(x, y), OBJECT_SIZE).with_mass(1.5)?;
        chasers.push(engine.add_body(chaser)?);
    }

    for _ in 0..ticks {
        for &chaser in &chasers {
            steer_toward(&mut engine, chaser, player_id, CHASER_ACCELERATION);
        }
        engine.tick(arena);
    }

    log::info!(
        "Simulated {} ticks: {} wall hits, tagged {} times",
        engine.ticks(),
        wall_hits.get(),
        tags.get()
    );
    match serde_json::to_string_pretty(&engine.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Failed to serialize snapshot: {}", e),
    }
    Ok(())
}

/// Accelerate `tracker` toward `target`, capping its speed
fn steer_toward(engine: &mut PhysicsEngine, tracker: BodyId, target: BodyId, force: f32) {
    let Some(goal) = engine.body(target).map(|b| b.position) else {
        return;
    };
    let Some(body) = engine.body_mut(tracker) else {
        return;
    };
    let dir = (goal - body.position).normalize_or_zero();
    body.velocity += dir * force;
    body.velocity = body.velocity.clamp_length_max(CHASER_SPEED_CAP);
}
