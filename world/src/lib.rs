#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Maze Chase.
//!
//! The world owns the grid overlay, the player, the adversaries and the
//! session state machine. Every mutation flows through [`apply`], which
//! appends the resulting [`Event`] values to a caller-provided buffer.

pub mod grid;
pub mod motion;

use std::time::Duration;

use maze_chase_core::{
    AdversaryId, AdversarySnapshot, CellCoord, CellKind, Command, Direction, Event, GameState,
    Outcome, PlayerSnapshot, SessionId, Tuning, WELCOME_BANNER,
};
use maze_chase_system_pursuit::{Config as PursuitConfig, Pursuit};
use tracing::{debug, info};

use crate::{
    grid::{GridMap, Layout},
    motion::{advance, Body, Geometry},
};

#[derive(Clone, Debug)]
struct Player {
    body: Body,
    facing: Option<Direction>,
    spawn: CellCoord,
    lives: u32,
    score: u32,
    currency: u32,
    power_remaining: Duration,
}

impl Player {
    fn spawn(layout: &Layout, geometry: &Geometry, tuning: &Tuning) -> Self {
        let spawn = layout.player_spawn();
        Self {
            body: Body::at_rest(geometry, spawn, tuning.player_speed),
            facing: None,
            spawn,
            lives: tuning.starting_lives,
            score: 0,
            currency: 0,
            power_remaining: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
struct Adversary {
    id: AdversaryId,
    body: Body,
    spawn: CellCoord,
    base_speed: f32,
    scared: bool,
    captured: bool,
}

impl Adversary {
    fn spawn(index: usize, cell: CellCoord, geometry: &Geometry, tuning: &Tuning) -> Self {
        let mut body = Body::at_rest(geometry, cell, tuning.adversary_speed);
        body.direction = Some(if index % 2 == 0 {
            Direction::Right
        } else {
            Direction::Left
        });
        Self {
            id: AdversaryId::new(index as u32),
            body,
            spawn: cell,
            base_speed: tuning.adversary_speed,
            scared: false,
            captured: false,
        }
    }

    fn scare(&mut self, scared_speed: f32) {
        self.scared = true;
        self.captured = false;
        self.body.speed = scared_speed;
    }

    fn calm(&mut self) {
        self.scared = false;
        self.captured = false;
        self.body.speed = self.base_speed;
    }

    fn snapshot(&self, geometry: &Geometry) -> AdversarySnapshot {
        AdversarySnapshot {
            id: self.id,
            position: self.body.position,
            cell: geometry.cell_of(self.body.position),
            direction: self.body.direction,
            queued: self.body.queued,
            speed: self.body.speed,
            scared: self.scared,
            captured: self.captured,
        }
    }
}

/// Represents the authoritative Maze Chase world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    layout: Layout,
    grid: GridMap,
    geometry: Geometry,
    tuning: Tuning,
    pursuit: Pursuit,
    state: GameState,
    session: SessionId,
    player: Player,
    adversaries: Vec<Adversary>,
    high_score: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world on the standard maze with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(Layout::standard(), Tuning::default())
    }

    /// Creates a world on the provided maze and tuning, waiting in the start state.
    #[must_use]
    pub fn with_layout(layout: Layout, tuning: Tuning) -> Self {
        let geometry = Geometry::new(tuning.tile_length, tuning.snap_threshold);
        let pursuit = Pursuit::new(PursuitConfig::new(
            tuning.seed,
            tuning.ambush_lead,
            tuning.erratic_spread,
        ));
        let grid = GridMap::new(&layout);
        let player = Player::spawn(&layout, &geometry, &tuning);
        let adversaries = spawn_adversaries(&layout, &geometry, &tuning);
        Self {
            banner: WELCOME_BANNER,
            layout,
            grid,
            geometry,
            tuning,
            pursuit,
            state: GameState::Start,
            session: SessionId::default(),
            player,
            adversaries,
            high_score: 0,
            tick_index: 0,
        }
    }

    fn breach_active(&self) -> bool {
        self.player.currency >= self.tuning.breach_threshold
    }

    fn set_state(&mut self, state: GameState, out_events: &mut Vec<Event>) {
        info!(session = self.session.get(), ?state, "state changed");
        self.state = state;
        out_events.push(Event::StateChanged { state });
    }

    fn add_score(&mut self, points: u32, out_events: &mut Vec<Event>) {
        self.player.score = self.player.score.saturating_add(points);
        out_events.push(Event::ScoreChanged {
            score: self.player.score,
        });
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.session = self.session.next();
        self.grid = GridMap::new(&self.layout);
        self.player = Player::spawn(&self.layout, &self.geometry, &self.tuning);
        self.adversaries = spawn_adversaries(&self.layout, &self.geometry, &self.tuning);
        self.tick_index = 0;

        info!(
            session = self.session.get(),
            collectibles = self.grid.remaining_collectibles(),
            "session started"
        );
        out_events.push(Event::SessionStarted {
            session: self.session,
        });
        out_events.push(Event::ScoreChanged { score: 0 });
        self.set_state(GameState::Playing, out_events);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let dt = dt.min(self.tuning.max_frame_delta());
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let breach_capable = self.breach_active();
        advance(
            &mut self.player.body,
            &self.grid,
            &self.geometry,
            breach_capable,
        );
        if let Some(direction) = self.player.body.direction {
            self.player.facing = Some(direction);
        }
        self.resolve_player_tile(out_events);
        self.decay_power(dt, out_events);
        self.move_adversaries(out_events);

        if self.state == GameState::Playing && !self.grid.has_remaining_collectibles() {
            self.finish(Outcome::Won, out_events);
        }
    }

    fn resolve_player_tile(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.geometry.cell_of(self.player.body.position);
        match self.grid.consume(cell) {
            Some(CellKind::Collectible) => {
                self.player.currency = self.player.currency.saturating_add(1);
                debug!(?cell, currency = self.player.currency, "dot eaten");
                out_events.push(Event::DotEaten { cell });
                self.add_score(self.tuning.dot_score, out_events);
                if self.player.currency == self.tuning.breach_threshold {
                    info!(currency = self.player.currency, "breach unlocked");
                    out_events.push(Event::BreachUnlocked);
                }
            }
            Some(CellKind::PowerCollectible) => {
                self.player.power_remaining = self.tuning.power_duration();
                let scared_speed = self.tuning.scared_speed;
                for adversary in &mut self.adversaries {
                    adversary.scare(scared_speed);
                }
                debug!(?cell, "power eaten");
                out_events.push(Event::PowerEaten { cell });
                self.add_score(self.tuning.power_score, out_events);
            }
            Some(_) => {}
            None => {
                if self.breach_active()
                    && self.grid.cell_at(cell) == CellKind::BreakableWall
                    && self.grid.breach(cell)
                {
                    debug!(?cell, "wall broken");
                    out_events.push(Event::WallBroken { cell });
                    out_events.push(Event::ParticleBurst { cell });
                    self.add_score(self.tuning.wall_score, out_events);
                }
            }
        }
    }

    fn decay_power(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.player.power_remaining.is_zero() {
            return;
        }
        self.player.power_remaining = self.player.power_remaining.saturating_sub(dt);
        if !self.player.power_remaining.is_zero() {
            return;
        }

        for adversary in &mut self.adversaries {
            adversary.calm();
        }
        debug!("power expired");
        out_events.push(Event::PowerExpired);
    }

    fn move_adversaries(&mut self, out_events: &mut Vec<Event>) {
        let capture_distance = self.tuning.capture_distance();

        for index in 0..self.adversaries.len() {
            if self.geometry.at_decision_point(self.adversaries[index].body.position) {
                let player = self.player_snapshot();
                let snapshot = self.adversaries[index].snapshot(&self.geometry);
                let grid = &self.grid;
                if let Some(direction) =
                    self.pursuit
                        .steer(&snapshot, &player, |cell| grid.is_passable(cell, false))
                {
                    self.adversaries[index].body.queued = Some(direction);
                }
            }

            advance(
                &mut self.adversaries[index].body,
                &self.grid,
                &self.geometry,
                false,
            );

            let distance = self.adversaries[index]
                .body
                .position
                .distance(self.player.body.position);
            if distance >= capture_distance {
                continue;
            }

            if self.adversaries[index].scared {
                self.send_home(index, out_events);
            } else if self.player_caught(out_events) {
                return;
            }
        }
    }

    fn send_home(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let geometry = self.geometry;
        let home = self.layout.home();
        let adversary = &mut self.adversaries[index];
        let home = home.unwrap_or(adversary.spawn);
        adversary.body = Body::at_rest(&geometry, home, adversary.base_speed);
        adversary.scared = false;
        adversary.captured = true;
        let id = adversary.id;

        debug!(adversary = id.get(), "adversary eaten");
        out_events.push(Event::AdversaryEaten { adversary: id });
        self.add_score(self.tuning.adversary_score, out_events);
    }

    /// Handles a capture by a hunting adversary; reports whether the session ended.
    fn player_caught(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.player.lives > 1 {
            self.player.lives -= 1;
            debug!(lives = self.player.lives, "player caught");
            out_events.push(Event::PlayerDied {
                lives_remaining: self.player.lives,
            });
            self.reset_positions();
            return false;
        }

        self.player.lives = 0;
        out_events.push(Event::PlayerDied { lives_remaining: 0 });
        self.finish(Outcome::Lost, out_events);
        true
    }

    fn reset_positions(&mut self) {
        let geometry = self.geometry;
        self.player.body = Body::at_rest(&geometry, self.player.spawn, self.player.body.speed);
        self.player.facing = None;
        for adversary in &mut self.adversaries {
            adversary.body = Body::at_rest(&geometry, adversary.spawn, adversary.body.speed);
        }
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        let score = self.player.score;
        if score > self.high_score {
            self.high_score = score;
            out_events.push(Event::HighScoreChanged { high_score: score });
        }

        info!(
            session = self.session.get(),
            ?outcome,
            score,
            high_score = self.high_score,
            "session finished"
        );
        match outcome {
            Outcome::Won => {
                self.set_state(GameState::Won, out_events);
                out_events.push(Event::GameWon {
                    session: self.session,
                    score,
                });
            }
            Outcome::Lost => {
                self.set_state(GameState::GameOver, out_events);
                out_events.push(Event::GameOver {
                    session: self.session,
                    score,
                });
            }
        }
    }

    fn player_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.player.body.position,
            cell: self.geometry.cell_of(self.player.body.position),
            direction: self.player.body.direction,
            facing: self.player.facing,
            queued: self.player.body.queued,
            lives: self.player.lives,
            score: self.player.score,
            currency: self.player.currency,
            breach_active: self.breach_active(),
            power_remaining: self.player.power_remaining,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_adversaries(layout: &Layout, geometry: &Geometry, tuning: &Tuning) -> Vec<Adversary> {
    layout
        .adversary_spawns()
        .iter()
        .enumerate()
        .map(|(index, cell)| Adversary::spawn(index, *cell, geometry, tuning))
        .collect()
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Steer { direction } => {
            if world.state == GameState::Playing {
                world.player.body.queued = Some(direction);
            }
        }
        Command::TogglePause => match world.state {
            GameState::Playing => world.set_state(GameState::Paused, out_events),
            GameState::Paused => world.set_state(GameState::Playing, out_events),
            GameState::Start | GameState::GameOver | GameState::Won => {}
        },
        Command::Restart => {
            if world.state.accepts_restart() {
                world.restart(out_events);
            }
        }
        Command::Tick { dt } => {
            if world.state == GameState::Playing {
                world.tick(dt, out_events);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_chase_core::{AdversaryView, Frame, GameState, PlayerSnapshot, SessionId, Tuning};

    use super::World;
    use crate::{
        grid::{GridMap, Layout},
        motion::Geometry,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current state of the session state machine.
    #[must_use]
    pub fn game_state(world: &World) -> GameState {
        world.state
    }

    /// Identity of the current session.
    #[must_use]
    pub fn session(world: &World) -> SessionId {
        world.session
    }

    /// Best score reached since the world was created.
    #[must_use]
    pub fn high_score(world: &World) -> u32 {
        world.high_score
    }

    /// Number of ticks integrated during the current session.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player_snapshot()
    }

    /// Captures a read-only view of the adversaries inhabiting the maze.
    #[must_use]
    pub fn adversaries(world: &World) -> AdversaryView {
        AdversaryView::from_snapshots(
            world
                .adversaries
                .iter()
                .map(|adversary| adversary.snapshot(&world.geometry))
                .collect(),
        )
    }

    /// Provides read-only access to the session's grid overlay.
    #[must_use]
    pub fn grid(world: &World) -> &GridMap {
        &world.grid
    }

    /// Provides read-only access to the pristine maze layout.
    #[must_use]
    pub fn layout(world: &World) -> &Layout {
        &world.layout
    }

    /// Geometry the motion model runs with.
    #[must_use]
    pub fn geometry(world: &World) -> Geometry {
        world.geometry
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Everything a presentation layer needs to draw the current frame.
    #[must_use]
    pub fn frame(world: &World) -> Frame {
        Frame {
            session: world.session,
            state: world.state,
            player: world.player_snapshot(),
            adversaries: adversaries(world),
            high_score: world.high_score,
            remaining_collectibles: world.grid.remaining_collectibles(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(layout: &str, tuning: Tuning) -> (World, Vec<Event>) {
        let layout = Layout::parse(layout).expect("valid layout");
        let mut world = World::with_layout(layout, tuning);
        let mut events = Vec::new();
        apply(&mut world, Command::Restart, &mut events);
        (world, events)
    }

    #[test]
    fn new_world_waits_in_start_state() {
        let world = World::new();
        assert_eq!(query::game_state(&world), GameState::Start);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::adversaries(&world).len(), 4);
    }

    #[test]
    fn ticks_before_start_are_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::tick_index(&world), 0);
    }

    #[test]
    fn restart_emits_session_prologue() {
        let (world, events) = started("#####\n#P..#\n#####", Tuning::default());
        assert_eq!(
            events,
            vec![
                Event::SessionStarted {
                    session: SessionId::new(1)
                },
                Event::ScoreChanged { score: 0 },
                Event::StateChanged {
                    state: GameState::Playing
                },
            ]
        );
        assert_eq!(query::session(&world), SessionId::new(1));
    }

    #[test]
    fn restart_is_ignored_while_playing() {
        let (mut world, _) = started("#####\n#P..#\n#####", Tuning::default());
        let mut events = Vec::new();
        apply(&mut world, Command::Restart, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::session(&world), SessionId::new(1));
    }

    #[test]
    fn frame_delta_is_clamped() {
        let (mut world, _) = started("#####\n#P..#\n#####", Tuning::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(5),
            },
            &mut events,
        );
        assert_eq!(
            events.first(),
            Some(&Event::TimeAdvanced {
                dt: Duration::from_millis(250)
            })
        );
    }

    #[test]
    fn adversaries_start_moving_laterally() {
        let world = World::new();
        let directions: Vec<_> = query::adversaries(&world)
            .iter()
            .map(|adversary| adversary.direction)
            .collect();
        assert_eq!(
            directions,
            vec![
                Some(Direction::Right),
                Some(Direction::Left),
                Some(Direction::Right),
                Some(Direction::Left),
            ]
        );
    }

    #[test]
    fn facing_survives_stopping_at_a_wall() {
        let (mut world, _) = started(
            "######\n#P  ##\n#.####\n######",
            Tuning::default(),
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Steer {
                direction: Direction::Right,
            },
            &mut events,
        );
        for _ in 0..30 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(16),
                },
                &mut events,
            );
        }

        let player = query::player(&world);
        assert_eq!(player.cell, CellCoord::new(3, 1));
        assert_eq!(player.direction, None);
        assert_eq!(player.facing, Some(Direction::Right));
    }

    #[test]
    fn facing_clears_when_positions_reset() {
        let (mut world, _) = started("#####\n#P.G#\n#####", Tuning::default());
        world.player.facing = Some(Direction::Left);
        world.reset_positions();
        assert_eq!(query::player(&world).facing, None);
    }
}
