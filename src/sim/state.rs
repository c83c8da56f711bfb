//! Game state and run lifecycle
//!
//! `GameState` owns every entity of a run plus the scheduler that drives
//! them. Entity modules never reach back into it: ports get the alarm counter
//! lent to them, lines get an id allocator, and this module turns their return
//! values into events, score and follow-up timers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cargo::{CargoFactory, CargoType};
use super::obstacles::{Island, Storm};
use super::port::{AlarmState, OverloadTransition, Port};
use super::route::{LineColor, RouteLine};
use super::spawn;
use super::timers::{Scheduler, TimerEvent};
use super::upgrade::{UpgradeFactory, UpgradeKind, UpgradeOffer, UpgradePrompt};
use crate::config::GameConfig;
use crate::consts::OVERLOAD_TICK_SECONDS;
use crate::error::DrawRejection;
use crate::platform::{GameObserver, RandomSource, SeededRandom, SymbolTextures, TextureLookup};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Time advances, input is accepted
    Playing,
    /// Time frozen until unpaused
    Paused,
    /// Run ended; everything is ignored until `reset`
    GameOver,
}

/// Things the host may want to react to, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CargoProduced { port_id: u32, kind: CargoType },
    /// One unit delivered; worth one point
    Delivered { port_id: u32, ship_id: u32, kind: CargoType },
    CargoLoaded { port_id: u32, ship_id: u32, count: usize },
    PortSpawned { port_id: u32, accepted: CargoType },
    /// No free spot found this cycle
    PortSpawnSkipped,
    StormSpawned { pos: Vec2, radius: f32 },
    RouteCommitted { line: usize, points_added: usize },
    LoopClosed { line: usize },
    StrokeRejected { reason: DrawRejection },
    LineUnlocked { color: LineColor },
    UpgradeOffered { choices: Vec<UpgradeOffer> },
    UpgradeApplied { kind: UpgradeKind, line: usize },
    UpgradeDismissed,
    PortOverloaded { port_id: u32 },
    PortRecovered { port_id: u32 },
    AlarmStarted,
    AlarmStopped,
    GameOver { final_score: u64 },
}

/// Monotonic entity id source shared by ports and ships
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Complete state of one simulation
#[derive(Debug)]
pub struct GameState {
    pub config: GameConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Simulated seconds since the run started
    pub time: f64,
    pub score: u64,
    pub ports: Vec<Port>,
    /// Unlocked lines, in unlock order
    pub lines: Vec<RouteLine>,
    pub islands: Vec<Island>,
    pub storm: Option<Storm>,
    pub alarm: AlarmState,
    pub upgrade_prompt: UpgradePrompt,
    /// Line receiving touch strokes
    pub active_line: Option<usize>,
    /// Pending events for the host (drain each frame)
    pub events: Vec<GameEvent>,
    pub(crate) scheduler: Scheduler,
    pub(crate) ids: IdAllocator,
    pub(crate) rng: Box<dyn RandomSource>,
    pub(crate) textures: Box<dyn TextureLookup>,
    pub(crate) cargo_factory: CargoFactory,
    pub(crate) upgrade_factory: UpgradeFactory,
    /// Bumped on every prompt step so stale expiry timers are ignored
    pub(crate) prompt_serial: u32,
    game_over_scheduled: bool,
}

impl GameState {
    /// Start a run with default balance and the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_config(GameConfig::default(), seed)
    }

    /// Start a run with custom balance
    pub fn with_config(config: GameConfig, seed: u64) -> Self {
        let mut state = Self::blank(config, Box::new(SeededRandom::new(seed)), Box::new(SymbolTextures));
        state.seed = seed;
        state.start_run();
        state
    }

    /// Empty state: no entities, nothing scheduled
    pub fn blank(config: GameConfig, rng: Box<dyn RandomSource>, textures: Box<dyn TextureLookup>) -> Self {
        Self {
            config,
            seed: 0,
            phase: GamePhase::Playing,
            time: 0.0,
            score: 0,
            ports: Vec::new(),
            lines: Vec::new(),
            islands: Vec::new(),
            storm: None,
            alarm: AlarmState::default(),
            upgrade_prompt: UpgradePrompt::Idle,
            active_line: None,
            events: Vec::new(),
            scheduler: Scheduler::new(),
            ids: IdAllocator::default(),
            rng,
            textures,
            cargo_factory: CargoFactory::default(),
            upgrade_factory: UpgradeFactory::default(),
            prompt_serial: 0,
            game_over_scheduled: false,
        }
    }

    /// Populate the world and arm the recurring spawners
    pub fn start_run(&mut self) {
        for _ in 0..self.config.island_count {
            match spawn::find_island_position(self.rng.as_mut(), &self.config, &self.ports, &self.islands) {
                Some(pos) => self.islands.push(Island::new(pos, self.config.island_radius)),
                None => log::debug!("No room for another island"),
            }
        }
        for _ in 0..self.config.initial_ports {
            self.spawn_port();
        }
        self.check_unlocks();
        if self.active_line.is_none() && !self.lines.is_empty() {
            self.active_line = Some(0);
        }

        let now = self.time;
        self.scheduler.schedule(now + f64::from(self.config.port_spawn_interval), TimerEvent::SpawnPort);
        self.scheduler.schedule(now + f64::from(self.config.storm_spawn_interval), TimerEvent::SpawnStorm);
        self.scheduler.schedule(
            now + f64::from(spawn::cargo_interval(self.score, &self.config)),
            TimerEvent::SpawnCargo,
        );
        self.scheduler.schedule(now + f64::from(self.config.upgrade_interval), TimerEvent::OfferUpgrade);

        log::info!(
            "Run started: seed={}, ports={}, islands={}, lines={}",
            self.seed,
            self.ports.len(),
            self.islands.len(),
            self.lines.len()
        );
    }

    /// Tear the run down and start a fresh one
    ///
    /// Pending timers are dropped before any entity so nothing late can
    /// touch the new run.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.ports.clear();
        self.lines.clear();
        self.islands.clear();
        self.storm = None;
        self.alarm = AlarmState::default();
        self.upgrade_prompt = UpgradePrompt::Idle;
        self.prompt_serial = self.prompt_serial.wrapping_add(1);
        self.active_line = None;
        self.events.clear();
        self.score = 0;
        self.time = 0.0;
        self.phase = GamePhase::Playing;
        self.game_over_scheduled = false;
        self.start_run();
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn port_index(&self, port_id: u32) -> Option<usize> {
        self.ports.iter().position(|p| p.id == port_id)
    }

    /// Place a port directly (spawner and tests)
    pub fn add_port(&mut self, pos: Vec2, accepted: CargoType) -> u32 {
        let id = self.ids.next_id();
        self.ports.push(Port::new(id, pos, accepted, &self.config, self.textures.as_ref()));
        self.events.push(GameEvent::PortSpawned { port_id: id, accepted });
        id
    }

    /// Try to place a port at a random free spot
    pub fn spawn_port(&mut self) -> Option<u32> {
        let Some(pos) = spawn::find_port_position(self.rng.as_mut(), &self.config, &self.ports, &self.islands) else {
            log::debug!("Port spawn skipped: no free position");
            self.events.push(GameEvent::PortSpawnSkipped);
            return None;
        };
        let accepted = spawn::accepted_type_for(self.rng.as_mut(), &self.ports);
        let id = self.add_port(pos, accepted);
        log::debug!("Port {} spawned at ({:.0}, {:.0}) accepting {}", id, pos.x, pos.y, accepted.as_str());
        Some(id)
    }

    /// Replace the storm with a new one
    pub fn spawn_storm(&mut self) {
        let pos = spawn::storm_position(self.rng.as_mut(), &self.config);
        let radius = self.config.storm_radius;
        self.storm = Some(Storm::new(pos, radius));
        self.events.push(GameEvent::StormSpawned { pos, radius });
        log::debug!("Storm moved to ({:.0}, {:.0})", pos.x, pos.y);
    }

    /// Have the port at `index` produce one unit, then react to overload
    pub fn produce_cargo_at(&mut self, index: usize) {
        let Some(port) = self.ports.get_mut(index) else {
            return;
        };
        let (cargo, transition) = port.produce_cargo(
            self.rng.as_mut(),
            &self.cargo_factory,
            self.textures.as_ref(),
            &mut self.alarm,
        );
        let port_id = port.id;
        self.events.push(GameEvent::CargoProduced { port_id, kind: cargo.kind });
        self.apply_transition(index, transition);
    }

    /// Take collectible cargo from a port outside of a ship visit
    pub fn remove_cargo_at(&mut self, index: usize, excluding: CargoType, max_count: usize) -> usize {
        let Some(port) = self.ports.get_mut(index) else {
            return 0;
        };
        let (taken, transition) = port.remove_cargo(excluding, max_count, &mut self.alarm);
        self.apply_transition(index, transition);
        taken.len()
    }

    /// Follow up an overload transition: events, alarm cue, countdown timer
    pub(crate) fn apply_transition(&mut self, index: usize, transition: OverloadTransition) {
        let Some(port) = self.ports.get(index) else {
            return;
        };
        let port_id = port.id;
        match transition {
            OverloadTransition::None => {}
            OverloadTransition::Entered => {
                log::info!("Port {} overloaded ({} waiting)", port_id, port.buffer.len());
                self.events.push(GameEvent::PortOverloaded { port_id });
                self.scheduler.schedule(
                    self.time + f64::from(OVERLOAD_TICK_SECONDS),
                    TimerEvent::OverloadCountdown {
                        port_id,
                        generation: port.countdown_generation,
                    },
                );
                if self.alarm.overloaded_ports() == 1 {
                    self.events.push(GameEvent::AlarmStarted);
                }
            }
            OverloadTransition::Cleared => {
                log::info!("Port {} recovered", port_id);
                self.events.push(GameEvent::PortRecovered { port_id });
                if !self.alarm.is_sounding() {
                    self.events.push(GameEvent::AlarmStopped);
                }
            }
        }
    }

    /// Score one delivered unit and unlock lines if a milestone was crossed
    pub(crate) fn record_delivery(&mut self, port_id: u32, ship_id: u32, kind: CargoType) {
        self.score += 1;
        self.events.push(GameEvent::Delivered { port_id, ship_id, kind });
        self.check_unlocks();
    }

    /// Add every line whose threshold the score has reached
    pub fn check_unlocks(&mut self) {
        for unlock in &self.config.line_unlocks {
            if unlock.score > self.score || self.lines.iter().any(|l| l.color == unlock.color) {
                continue;
            }
            self.lines.push(RouteLine::new(unlock.color));
            self.events.push(GameEvent::LineUnlocked { color: unlock.color });
            log::info!("{} line unlocked at score {}", unlock.color.as_str(), self.score);
        }
    }

    /// Arm the game-over signal once, after the grace delay
    pub(crate) fn schedule_game_over(&mut self, port_id: u32, now: f64) {
        if self.game_over_scheduled {
            return;
        }
        self.game_over_scheduled = true;
        log::info!("Port {} countdown expired", port_id);
        self.scheduler.schedule(
            now + f64::from(self.config.game_over_grace_seconds),
            TimerEvent::GameOver { port_id },
        );
    }

    /// End the run: cancel every pending timer, then notify
    pub(crate) fn finish_run(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.scheduler.clear();
        self.phase = GamePhase::GameOver;
        for line in &mut self.lines {
            line.cancel_draw();
        }
        self.upgrade_prompt = UpgradePrompt::Idle;
        self.events.push(GameEvent::GameOver { final_score: self.score });
        log::info!("Game over: score {} after {:.1}s", self.score, self.time);
    }

    /// Open an upgrade prompt with freshly shuffled choices
    pub(crate) fn offer_upgrade(&mut self, now: f64) {
        if self.upgrade_prompt.is_open() {
            return;
        }
        let kinds = spawn::upgrade_offers(self.rng.as_mut(), self.config.upgrade_choice_count);
        let choices: Vec<UpgradeOffer> = kinds
            .into_iter()
            .map(|kind| UpgradeOffer::new(kind, self.textures.as_ref()))
            .collect();
        let expires_at = now + f64::from(self.config.upgrade_prompt_seconds);
        self.upgrade_prompt = UpgradePrompt::ChoosingUpgrade {
            choices: choices.clone(),
            expires_at,
        };
        self.arm_prompt_expiry(expires_at);
        log::info!("Upgrade offered: {:?}", choices.iter().map(|c| c.kind).collect::<Vec<_>>());
        self.events.push(GameEvent::UpgradeOffered { choices });
    }

    pub(crate) fn arm_prompt_expiry(&mut self, expires_at: f64) {
        self.prompt_serial = self.prompt_serial.wrapping_add(1);
        self.scheduler.schedule(
            expires_at,
            TimerEvent::UpgradePromptExpired {
                serial: self.prompt_serial,
            },
        );
    }

    /// Number of pending timers (diagnostics and tests)
    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain events into `observer` hooks; returns them for cue playback
    pub fn dispatch_events(&mut self, observer: &mut dyn GameObserver) -> Vec<GameEvent> {
        let events = self.drain_events();
        for event in &events {
            match event {
                GameEvent::Delivered { .. } => observer.on_delivery_success(),
                GameEvent::GameOver { final_score } => observer.on_game_over(*final_score),
                GameEvent::AlarmStarted => observer.on_alarm_started(),
                GameEvent::AlarmStopped => observer.on_alarm_stopped(),
                GameEvent::LineUnlocked { color } => observer.on_line_unlocked(*color),
                _ => {}
            }
        }
        events
    }
}
