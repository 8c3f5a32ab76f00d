//! Maze Tanks headless runner
//!
//! Plays a seeded match between wandering bots and logs each round's result.
//! Handy for soak-testing the simulation and for reproducing a seed.
//!
//! Usage: `maze-tanks [seed] [players] [seconds] [settings.json]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use maze_tanks::sim::{ControlInput, GameState, RoundOutcome, SimEvent, tick};
use maze_tanks::{FixedStep, Settings, SimError};

/// Host frame rate the runner pretends to render at
const FRAME_HZ: u32 = 30;

struct Args {
    seed: u64,
    players: usize,
    seconds: u32,
    settings: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
        let players = args.next().and_then(|s| s.parse().ok()).unwrap_or(2);
        let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(120);
        let settings = args.next();
        Self {
            seed,
            players,
            seconds,
            settings,
        }
    }
}

/// Drives in a random direction for a while, then picks another; fires at random
struct Bot {
    rng: Pcg32,
    heading: Vec2,
    hold: u32,
}

impl Bot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            heading: Vec2::X,
            hold: 0,
        }
    }

    fn input(&mut self) -> ControlInput {
        if self.hold == 0 {
            let angle = self.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            self.heading = Vec2::from_angle(angle);
            self.hold = self.rng.random_range(20..120);
        }
        self.hold -= 1;
        ControlInput::with_stick(self.heading, self.rng.random_bool(0.08))
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    log::info!(
        "Arena {}x{} px, {} collision",
        settings.field_width(),
        settings.field_height(),
        settings.arena.collision_tier.as_str()
    );

    let mut state = GameState::new(args.seed, settings)?;
    state.start_game(args.players)?;

    let mut bots: Vec<Bot> = (0..args.players as u64)
        .map(|slot| Bot::new(args.seed.wrapping_add(slot + 1)))
        .collect();
    let mut clock = FixedStep::new();
    let frame_dt = 1.0 / FRAME_HZ as f32;

    let mut wins = vec![0u32; args.players];
    let mut draws = 0u32;
    let mut kills = 0u32;

    for _ in 0..args.seconds * FRAME_HZ {
        for _ in 0..clock.advance(frame_dt) {
            let inputs: Vec<ControlInput> = bots.iter_mut().map(Bot::input).collect();
            tick(&mut state, &inputs);

            for event in &state.events {
                match event {
                    SimEvent::RoundEnded {
                        outcome: RoundOutcome::Winner(id),
                    } => wins[id.0 as usize] += 1,
                    SimEvent::RoundEnded {
                        outcome: RoundOutcome::Draw,
                    } => draws += 1,
                    SimEvent::ActorKilled { .. } => kills += 1,
                    _ => log::trace!("{:?}", event),
                }
            }
        }
    }

    log::info!(
        "Finished after {} ticks, {} rounds, {} kills",
        state.time_ticks,
        state.round_index,
        kills
    );
    for (slot, count) in wins.iter().enumerate() {
        log::info!("P{}: {} wins", slot + 1, count);
    }
    log::info!("Draws: {}", draws);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Maze Tanks (headless) starting...");

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
