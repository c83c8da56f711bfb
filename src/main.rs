//! Harbor Lines headless runner
//!
//! Plays a scripted session against the simulation on a fixed clock and logs
//! what happens. Handy for balance checks:
//!
//! ```text
//! RUST_LOG=info harbor-lines [config.json] [seed]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use std::collections::BTreeSet;

    use glam::Vec2;
    use harbor_lines::consts::*;
    use harbor_lines::platform::{ClockSource, FixedClock, GameObserver};
    use harbor_lines::sim::{GameState, TickInput, TouchEvent, UpgradeChoice, UpgradePrompt, tick};
    use harbor_lines::{GameConfig, HighScores, ScoreSink};

    /// Longest simulated session before the runner gives up
    const MAX_SESSION_SECONDS: f64 = 900.0;
    /// Distance between scripted touch samples
    const STROKE_STEP: f32 = 20.0;

    #[derive(Default)]
    struct LogObserver {
        deliveries: u64,
        final_score: Option<u64>,
    }

    impl GameObserver for LogObserver {
        fn on_delivery_success(&mut self) {
            self.deliveries += 1;
        }

        fn on_game_over(&mut self, final_score: u64) {
            self.final_score = Some(final_score);
        }

        fn on_alarm_started(&mut self) {
            log::warn!("Overload alarm!");
        }

        fn on_alarm_stopped(&mut self) {
            log::info!("Alarm cleared");
        }
    }

    fn stroke_between(from: Vec2, to: Vec2) -> Vec<TouchEvent> {
        let steps = ((from.distance(to) / STROKE_STEP).ceil() as usize).max(1);
        let mut touches = vec![TouchEvent::Began(from)];
        for i in 1..steps {
            touches.push(TouchEvent::Moved(from.lerp(to, i as f32 / steps as f32)));
        }
        touches.push(TouchEvent::Ended(to));
        touches
    }

    /// Next scripted move: answer the upgrade prompt, else wire up a port
    /// no line serves yet
    fn autopilot(state: &GameState, attempted: &mut BTreeSet<(usize, u32)>) -> TickInput {
        match &state.upgrade_prompt {
            UpgradePrompt::ChoosingUpgrade { choices, .. } => {
                if let Some(choice) = choices.first() {
                    return TickInput {
                        upgrade: Some(UpgradeChoice::Pick(choice.kind)),
                        ..Default::default()
                    };
                }
            }
            UpgradePrompt::ChoosingLine { .. } => {
                let busiest = (0..state.lines.len())
                    .max_by_key(|&i| state.lines[i].permanent_points.len())
                    .unwrap_or(0);
                return TickInput {
                    upgrade: Some(UpgradeChoice::Target(busiest)),
                    ..Default::default()
                };
            }
            UpgradePrompt::Idle => {}
        }

        let served: BTreeSet<u32> = state
            .lines
            .iter()
            .flat_map(|l| l.existing_connections.iter())
            .flat_map(|pair| {
                let (a, b) = pair.ids();
                [a, b]
            })
            .collect();

        for port in state.ports.iter().filter(|p| !served.contains(&p.id)) {
            for (index, line) in state.lines.iter().enumerate() {
                if line.is_loop || attempted.contains(&(index, port.id)) {
                    continue;
                }
                let start = match line.permanent_points.last() {
                    Some(&end) => end,
                    None => {
                        let Some(nearest) = state
                            .ports
                            .iter()
                            .filter(|p| p.id != port.id)
                            .min_by(|a, b| a.pos.distance(port.pos).total_cmp(&b.pos.distance(port.pos)))
                        else {
                            continue;
                        };
                        nearest.pos
                    }
                };
                attempted.insert((index, port.id));
                return TickInput {
                    select_line: Some(index),
                    touches: stroke_between(start, port.pos),
                    ..Default::default()
                };
            }
        }
        TickInput::default()
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::init();

        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => {
                let loaded = std::fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|json| GameConfig::from_json(&json).map_err(|e| e.to_string()));
                match loaded {
                    Ok(config) => config,
                    Err(e) => {
                        log::warn!("Could not load config {}: {}", path, e);
                        return Err(e.into());
                    }
                }
            }
            None => GameConfig::default(),
        };
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
        log::info!(
            "Harbor Lines (headless) seed={} starting lines={:?}",
            seed,
            config.starting_colors()
        );

        let mut state = GameState::with_config(config, seed);
        let mut observer = LogObserver::default();
        let mut scores = HighScores::new();
        let mut clock = FixedClock::new(SIM_DT);
        let mut attempted = BTreeSet::new();
        let mut accumulator = 0.0f32;
        let mut input = TickInput::default();

        while !state.is_over() && state.time < MAX_SESSION_SECONDS {
            accumulator += clock.delta_seconds().min(MAX_FRAME_DT);

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut state, &input, SIM_DT);
                // Input is one-shot
                input = TickInput::default();
                accumulator -= SIM_DT;
                substeps += 1;
            }

            state.dispatch_events(&mut observer);
            input = autopilot(&state, &mut attempted);
        }

        let final_score = observer.final_score.unwrap_or(state.score);
        log::info!(
            "Session ended after {:.0}s: score {} ({} deliveries), {} ports, {} lines",
            state.time,
            final_score,
            observer.deliveries,
            state.ports.len(),
            state.lines.len()
        );
        scores.submit(final_score);
        println!("{}", scores.to_json()?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    runner::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly
}
