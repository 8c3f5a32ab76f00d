//! Fixed timestep simulation tick
//!
//! One call advances the match by one tick. Within a tick the phases run in
//! a fixed order: power-up spawn, actor updates (which carry their
//! projectiles), power-up pickup, hit resolution, then the round-end check.

use super::actor::{Actor, ActorEnv, ControlInput};
use super::collision::circles_overlap;
use super::state::{
    ActorId, GamePhase, GameState, RoundOutcome, RoundStatus, SimEvent, TargetView, WarpField,
};

/// Advance the game state by one fixed timestep.
///
/// `inputs` is indexed by player slot; missing entries count as idle.
/// Nothing happens while on the menu.
pub fn tick(state: &mut GameState, inputs: &[ControlInput]) {
    if state.phase != GamePhase::Playing {
        return;
    }

    state.events.clear();
    state.events.append(&mut state.pending_events);
    state.time_ticks += 1;
    let now = state.time_ticks;

    if let RoundStatus::Ended { resume_at, .. } = state.round {
        if now >= resume_at {
            state.init_round();
        }
    }

    // (a) Power-up spawn
    if now >= state.next_power_up_at {
        state.spawn_power_up();
    }

    // (b) Actors and their projectiles
    update_actors(state, inputs, now);

    // (c) Pickup
    collect_power_ups(state);

    // (d) Hits
    resolve_hits(state, now);

    // (e) Round end
    check_round_end(state, now);
}

fn update_actors(state: &mut GameState, inputs: &[ControlInput], now: u64) {
    // Everyone steers against where the others stood at the start of the tick
    let targets: Vec<TargetView> = state.actors.iter().map(Actor::target_view).collect();
    let warp_fields: Vec<WarpField> = state
        .actors
        .iter()
        .filter_map(|a| a.warp_field(now, &state.settings))
        .collect();

    let mut env = ActorEnv {
        maze: &state.maze,
        settings: &state.settings,
        targets: &targets,
        warp_fields: &warp_fields,
        portals: &mut state.portals,
        events: &mut state.events,
        next_id: &mut state.next_id,
        now,
    };
    for (slot, actor) in state.actors.iter_mut().enumerate() {
        let input = inputs.get(slot).copied().unwrap_or_default();
        actor.update(&input, &mut env);
    }
}

fn collect_power_ups(state: &mut GameState) {
    let tank_radius = state.settings.tank.radius();
    let pickup_radius = state.settings.power_up.size / 2.0;

    for actor in state.actors.iter_mut().filter(|a| a.alive) {
        let Some(power_up) = state
            .power_ups
            .iter_mut()
            .find(|p| p.active && circles_overlap(actor.pos, tank_radius, p.pos, pickup_radius))
        else {
            continue;
        };
        power_up.active = false;
        actor.grant(power_up.kind);
        state.events.push(SimEvent::PowerUpCollected {
            actor: actor.id,
            kind: power_up.kind,
        });
        log::debug!("{} picked up {:?}", actor.id, power_up.kind);
    }

    state.power_ups.retain(|p| p.active);
}

fn resolve_hits(state: &mut GameState, now: u64) {
    let tank_radius = state.settings.tank.radius();
    let bullet_radius = state.settings.projectile.radius;
    let immunity = state.settings.projectile.own_immunity_ticks;

    let victims: Vec<(usize, ActorId, glam::Vec2)> = state
        .actors
        .iter()
        .enumerate()
        .filter(|(_, a)| a.alive)
        .map(|(slot, a)| (slot, a.id, a.pos))
        .collect();

    let mut killed: Vec<(usize, ActorId)> = Vec::new();
    for &(slot, victim, pos) in &victims {
        'owners: for owner in state.actors.iter_mut() {
            for projectile in owner.projectiles.iter_mut() {
                if projectile.can_hit(victim, now, immunity)
                    && circles_overlap(pos, tank_radius, projectile.pos, bullet_radius)
                {
                    // One projectile, one kill
                    projectile.active = false;
                    killed.push((slot, owner.id));
                    break 'owners;
                }
            }
        }
    }

    for (slot, by) in killed {
        let victim = &mut state.actors[slot];
        victim.alive = false;
        victim.remote = None;
        state.events.push(SimEvent::ActorKilled {
            victim: victim.id,
            by,
        });
        log::info!("{} destroyed by {}", victim.id, by);
    }
}

fn check_round_end(state: &mut GameState, now: u64) {
    if state.round != RoundStatus::Active {
        return;
    }
    let mut survivors = state.actors.iter().filter(|a| a.alive).map(|a| a.id);
    let first = survivors.next();
    if survivors.next().is_some() {
        return;
    }

    let outcome = first.map_or(RoundOutcome::Draw, RoundOutcome::Winner);
    state.round = RoundStatus::Ended {
        outcome,
        resume_at: now + state.settings.round.end_delay_ticks,
    };
    state.events.push(SimEvent::RoundEnded { outcome });
    match outcome {
        RoundOutcome::Winner(id) => log::info!("Round {} won by {}", state.round_index, id),
        RoundOutcome::Draw => log::info!("Round {} ended in a draw", state.round_index),
    }
}
