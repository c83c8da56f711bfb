//! Fixed timestep simulation tick
//!
//! Applies one frame of player input, then advances simulated time by popping
//! due timer events in order. Handlers run with `state.time` set to the
//! event's own instant, so anything they schedule is anchored to when it
//! happened rather than to the frame boundary.

use glam::Vec2;

use super::collision::nearest_within;
use super::port::CountdownOutcome;
use super::ship::MovementStrategy;
use super::spawn;
use super::state::{GameEvent, GamePhase, GameState};
use super::timers::TimerEvent;
use super::upgrade::UpgradeKind;
use crate::consts::*;
use crate::error::DrawRejection;

/// One touch sample from the host, in playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Began(Vec2),
    Moved(Vec2),
    Ended(Vec2),
    /// Touch was taken away (system gesture, focus loss)
    Cancelled,
}

/// Player action on the upgrade prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeChoice {
    /// Take one of the offered upgrades
    Pick(UpgradeKind),
    /// Apply the picked upgrade to this line
    Target(usize),
    Dismiss,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Switch the line that receives strokes
    pub select_line: Option<usize>,
    /// Touch samples in arrival order
    pub touches: Vec<TouchEvent>,
    pub upgrade: Option<UpgradeChoice>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                for line in &mut state.lines {
                    line.cancel_draw();
                }
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing {
        return;
    }

    apply_input(state, input);

    let target = state.time + f64::from(dt);
    while let Some((at, event)) = state.scheduler.pop_due(target) {
        state.time = state.time.max(at);
        handle_timer(state, event);
        if state.is_over() {
            return;
        }
    }
    state.time = target;

    update_ship_positions(state);
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    if let Some(index) = input.select_line {
        select_line(state, index);
    }
    for touch in &input.touches {
        handle_touch(state, *touch);
    }
    if let Some(choice) = input.upgrade {
        handle_upgrade_choice(state, choice);
    }
}

fn select_line(state: &mut GameState, index: usize) {
    if index >= state.lines.len() {
        log::debug!("Ignoring selection of locked line {}", index);
        return;
    }
    if let Some(previous) = state.active_line.filter(|&p| p != index) {
        if let Some(line) = state.lines.get_mut(previous) {
            line.cancel_draw();
        }
    }
    state.active_line = Some(index);
}

fn reject_stroke(events: &mut Vec<GameEvent>, reason: DrawRejection) {
    log::debug!("Stroke rejected: {}", reason);
    events.push(GameEvent::StrokeRejected { reason });
}

fn handle_touch(state: &mut GameState, touch: TouchEvent) {
    let Some(line_index) = state.active_line else {
        if matches!(touch, TouchEvent::Began(_)) {
            reject_stroke(&mut state.events, DrawRejection::NoLineSelected);
        }
        return;
    };
    let Some(line) = state.lines.get_mut(line_index) else {
        return;
    };

    match touch {
        TouchEvent::Began(at) => {
            if let Err(reason) = line.start_draw(at, state.config.end_pick_radius) {
                reject_stroke(&mut state.events, reason);
            }
        }
        TouchEvent::Moved(to) => {
            if let Err(reason) = line.extend_draw(to, &state.islands) {
                reject_stroke(&mut state.events, reason);
            }
        }
        TouchEvent::Ended(at) => end_stroke(state, line_index, at),
        TouchEvent::Cancelled => line.cancel_draw(),
    }
}

/// Validate the finished stroke and commit it to the line
fn end_stroke(state: &mut GameState, line_index: usize, at: Vec2) {
    let Some(line) = state.lines.get_mut(line_index) else {
        return;
    };
    let Some(session) = line.draw.as_ref() else {
        return;
    };
    if session.invalidated {
        // Already reported when the stroke hit the island
        line.cancel_draw();
        return;
    }
    if let Err(reason) = line.extend_draw(at, &state.islands) {
        line.cancel_draw();
        reject_stroke(&mut state.events, reason);
        return;
    }

    let connection = match line.validate_connection(&state.ports, state.config.port_snap_radius) {
        Ok(connection) => connection,
        Err(reason) => {
            line.cancel_draw();
            reject_stroke(&mut state.events, reason);
            return;
        }
    };

    line.snap_stroke(state.ports[connection.from].pos, state.ports[connection.to].pos);
    line.record_connection(connection.pair);
    let ids = &mut state.ids;
    let outcome = line.finalize_current_line(
        state.config.ship_capacity,
        state.config.loop_close_tolerance,
        || ids.next_id(),
    );

    let (a, b) = connection.pair.ids();
    log::info!(
        "{} line connected ports {} and {} (+{} points)",
        line.color.as_str(),
        a,
        b,
        outcome.added
    );
    state.events.push(GameEvent::RouteCommitted {
        line: line_index,
        points_added: outcome.added,
    });
    if let Some(ship_id) = outcome.new_ship {
        state.scheduler.schedule(
            state.time,
            TimerEvent::ShipArrival {
                line: line_index,
                ship_id,
            },
        );
    }
    if outcome.loop_closed {
        log::info!("{} line closed into a loop", line.color.as_str());
        state.events.push(GameEvent::LoopClosed { line: line_index });
    }
}

fn handle_upgrade_choice(state: &mut GameState, choice: UpgradeChoice) {
    match choice {
        UpgradeChoice::Pick(kind) => {
            let expires_at = state.time + f64::from(state.config.upgrade_prompt_seconds);
            if state.upgrade_prompt.pick(kind, expires_at) {
                state.arm_prompt_expiry(expires_at);
            }
        }
        UpgradeChoice::Target(line_index) => {
            if line_index >= state.lines.len() {
                return;
            }
            let Some(kind) = state.upgrade_prompt.take_for_line() else {
                return;
            };
            state.prompt_serial = state.prompt_serial.wrapping_add(1);

            let upgrade = state.upgrade_factory.make(kind, &state.config);
            let ids = &mut state.ids;
            let effect = upgrade.apply(&mut state.lines[line_index], || ids.next_id());
            if let Some(ship_id) = effect.new_ship {
                state.scheduler.schedule(
                    state.time,
                    TimerEvent::ShipArrival {
                        line: line_index,
                        ship_id,
                    },
                );
            }
            log::info!(
                "{} applied to line {} ({} ships affected)",
                kind.as_str(),
                line_index,
                effect.ships_affected
            );
            state.events.push(GameEvent::UpgradeApplied { kind, line: line_index });
        }
        UpgradeChoice::Dismiss => {
            if state.upgrade_prompt.dismiss() {
                state.prompt_serial = state.prompt_serial.wrapping_add(1);
                state.events.push(GameEvent::UpgradeDismissed);
            }
        }
    }
}

fn handle_timer(state: &mut GameState, event: TimerEvent) {
    let now = state.time;
    match event {
        TimerEvent::ShipArrival { line, ship_id } => handle_ship_arrival(state, line, ship_id),
        TimerEvent::OverloadCountdown { port_id, generation } => {
            let Some(index) = state.port_index(port_id) else {
                return;
            };
            match state.ports[index].countdown_tick(generation, OVERLOAD_TICK_SECONDS) {
                CountdownOutcome::Stale => {}
                CountdownOutcome::Running(left) => {
                    log::debug!("Port {} overload: {:.0}s left", port_id, left);
                    state
                        .scheduler
                        .schedule(now + f64::from(OVERLOAD_TICK_SECONDS), event);
                }
                CountdownOutcome::Expired => state.schedule_game_over(port_id, now),
            }
        }
        TimerEvent::GameOver { .. } => state.finish_run(),
        TimerEvent::SpawnPort => {
            state.spawn_port();
            state.scheduler.schedule(
                now + f64::from(state.config.port_spawn_interval),
                TimerEvent::SpawnPort,
            );
        }
        TimerEvent::SpawnStorm => {
            state.spawn_storm();
            state.scheduler.schedule(
                now + f64::from(state.config.storm_spawn_interval),
                TimerEvent::SpawnStorm,
            );
        }
        TimerEvent::SpawnCargo => {
            if let Some(index) = spawn::pick_producer(state.rng.as_mut(), &state.ports) {
                state.produce_cargo_at(index);
            }
            let interval = spawn::cargo_interval(state.score, &state.config);
            state
                .scheduler
                .schedule(now + f64::from(interval), TimerEvent::SpawnCargo);
        }
        TimerEvent::OfferUpgrade => {
            state.offer_upgrade(now);
            state.scheduler.schedule(
                now + f64::from(state.config.upgrade_interval),
                TimerEvent::OfferUpgrade,
            );
        }
        TimerEvent::UpgradePromptExpired { serial } => {
            if serial == state.prompt_serial && state.upgrade_prompt.dismiss() {
                log::debug!("Upgrade prompt timed out");
                state.events.push(GameEvent::UpgradeDismissed);
            }
        }
    }
}

/// Ship reached its target waypoint: trade with the port there, then depart
fn handle_ship_arrival(state: &mut GameState, line_index: usize, ship_id: u32) {
    let now = state.time;

    // Settle onto the waypoint and trade
    let (port_index, visit) = {
        let Some(ship) = state
            .lines
            .get_mut(line_index)
            .and_then(|line| line.ship_mut(ship_id))
        else {
            return;
        };
        if let Some(transit) = ship.transit.take() {
            ship.current_index = transit.target_index;
            ship.pos = transit.to;
        }
        let port_index = nearest_within(
            state.ports.iter().map(|p| p.pos),
            ship.pos,
            state.config.port_detection_radius,
        );
        let visit = match port_index {
            Some(i) => ship.visit_port(&mut state.ports[i], &mut state.alarm),
            None => None,
        };
        (port_index, visit)
    };

    if let (Some(index), Some(visit)) = (port_index, visit) {
        let port_id = state.ports[index].id;
        for cargo in &visit.delivered {
            state.record_delivery(port_id, ship_id, cargo.kind);
        }
        if visit.loaded > 0 {
            state.events.push(GameEvent::CargoLoaded {
                port_id,
                ship_id,
                count: visit.loaded,
            });
        }
        state.apply_transition(index, visit.transition);
    }

    // Depart for the next waypoint
    let Some(line) = state.lines.get_mut(line_index) else {
        return;
    };
    let is_loop = line.is_loop;
    let points = &line.permanent_points;
    let Some(ship) = line.ships.iter_mut().find(|s| s.id == ship_id) else {
        return;
    };
    if is_loop {
        ship.strategy = MovementStrategy::Loop;
    }
    let Some(next) = ship.strategy.compute_next_waypoint(ship, points) else {
        return;
    };

    let arrive_at = ship.depart(next, now, &state.config, state.storm.as_ref(), port_index.is_some());
    state.scheduler.schedule(
        arrive_at,
        TimerEvent::ShipArrival {
            line: line_index,
            ship_id,
        },
    );
}

fn update_ship_positions(state: &mut GameState) {
    let now = state.time;
    for line in &mut state.lines {
        for ship in &mut line.ships {
            if ship.transit.is_some() {
                ship.pos = ship.position_at(now);
            }
        }
    }
}
