#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! carrying player intent and frame ticks, the world executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values that
//! presentation layers and systems react to. Read-only snapshots such as
//! [`Frame`] describe the simulation for drawing without exposing mutable
//! state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Chase.";

/// Lifecycle states of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Initial state before the first session starts; no ticks are processed.
    Start,
    /// Simulation ticks are processed.
    Playing,
    /// Ticks are suspended without resetting anything.
    Paused,
    /// The player ran out of lives.
    GameOver,
    /// Every collectible was consumed.
    Won,
}

impl GameState {
    /// Reports whether the session has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Won)
    }

    /// Reports whether a restart command is honoured from this state.
    #[must_use]
    pub const fn accepts_restart(self) -> bool {
        matches!(self, Self::Start | Self::GameOver | Self::Won)
    }
}

/// Final result of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The maze was cleared.
    Won,
    /// The last life was lost.
    Lost,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Writes the player's queued direction; consumed by the next tick.
    Steer {
        /// Direction the player wants to travel next.
        direction: Direction,
    },
    /// Toggles between playing and paused. Ignored in every other state.
    TogglePause,
    /// Reinitialises the maze, player and adversaries and starts playing.
    Restart,
    /// Advances the simulation by one rendered frame.
    Tick {
        /// Wall-clock time that elapsed since the previous frame.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that a simulation tick ran.
    TimeAdvanced {
        /// Elapsed time integrated by the tick.
        dt: Duration,
    },
    /// Announces that a fresh session began.
    SessionStarted {
        /// Identity of the new session.
        session: SessionId,
    },
    /// Announces that the session entered a new state.
    StateChanged {
        /// State that became active.
        state: GameState,
    },
    /// The player consumed a collectible.
    DotEaten {
        /// Cell the collectible occupied.
        cell: CellCoord,
    },
    /// The player consumed a power collectible and adversaries became scared.
    PowerEaten {
        /// Cell the power collectible occupied.
        cell: CellCoord,
    },
    /// The player broke through a breakable wall.
    WallBroken {
        /// Cell the wall occupied.
        cell: CellCoord,
    },
    /// Cosmetic particle burst accompanying a broken wall.
    ParticleBurst {
        /// Cell the burst originates from.
        cell: CellCoord,
    },
    /// The player's currency reached the breach threshold.
    BreachUnlocked,
    /// The power timer ran out and adversaries stopped being scared.
    PowerExpired,
    /// A scared adversary was caught and sent home.
    AdversaryEaten {
        /// Identifier of the caught adversary.
        adversary: AdversaryId,
    },
    /// The player was caught by an adversary.
    PlayerDied {
        /// Lives left after the capture.
        lives_remaining: u32,
    },
    /// The cumulative score changed.
    ScoreChanged {
        /// New score total.
        score: u32,
    },
    /// The high score was beaten.
    HighScoreChanged {
        /// New high score.
        high_score: u32,
    },
    /// The session ended with every collectible consumed.
    GameWon {
        /// Session that was won.
        session: SessionId,
        /// Final score of the session.
        score: u32,
    },
    /// The session ended with the player out of lives.
    GameOver {
        /// Session that was lost.
        session: SessionId,
        /// Final score of the session.
        score: u32,
    },
}

/// Cardinal movement directions.
///
/// The declaration order doubles as the enumeration order used when
/// adversaries break ties between equally good moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in enumeration order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Column and row offsets of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Unit vector of the direction in world units.
    #[must_use]
    pub fn unit(self) -> (f32, f32) {
        let (columns, rows) = self.delta();
        (columns as f32, rows as f32)
    }
}

/// Unique identifier assigned to an adversary. Also selects its pursuit policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdversaryId(u32);

impl AdversaryId {
    /// Creates a new adversary identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identity of a play session; bumped on every restart.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Location of a single maze tile expressed as column and row coordinates.
///
/// Coordinates are signed: targets computed by adversaries and positions
/// inside tunnel mouths can lie outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Adjacent tile in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (columns, rows) = direction.delta();
        self.offset(columns, rows)
    }

    /// Tile displaced by the provided number of columns and rows.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self {
            column: self.column.saturating_add(columns),
            row: self.row.saturating_add(rows),
        }
    }

    /// Squared Euclidean distance between two tiles.
    #[must_use]
    pub fn squared_distance(self, other: CellCoord) -> i64 {
        let columns = i64::from(self.column) - i64::from(other.column);
        let rows = i64::from(self.row) - i64::from(other.row);
        columns * columns + rows * rows
    }
}

/// Continuous position measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate, growing downward with the row index.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Kinds of cell composing the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable wall.
    Wall,
    /// Wall the player may break through once the breach ability is active.
    BreakableWall,
    /// Empty corridor.
    Open,
    /// Primary consumable worth score and breach currency.
    Collectible,
    /// Consumable that scares every adversary.
    PowerCollectible,
    /// Interior of the adversaries' home.
    AdversaryHome,
    /// Where the player starts.
    PlayerSpawn,
    /// Where an adversary starts.
    AdversarySpawn,
}

impl CellKind {
    /// Reports whether the cell still holds something to consume.
    #[must_use]
    pub const fn is_collectible(self) -> bool {
        matches!(self, Self::Collectible | Self::PowerCollectible)
    }
}

/// Tuned constants governing movement, timers, scoring and randomness.
///
/// Missing fields fall back to [`Tuning::default`] when deserialised, so a
/// configuration file only needs to list the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Side length of a square tile in world units.
    pub tile_length: f32,
    /// Distance the player travels per frame.
    pub player_speed: f32,
    /// Distance an adversary travels per frame while hunting.
    pub adversary_speed: f32,
    /// Distance an adversary travels per frame while scared.
    pub scared_speed: f32,
    /// Maximum distance from a tile center at which turns are committed.
    pub snap_threshold: f32,
    /// Player/adversary contact distance, measured in tiles.
    pub capture_radius: f32,
    /// Length of the power state in milliseconds.
    pub power_duration_ms: u64,
    /// Currency needed before the player can break walls.
    pub breach_threshold: u32,
    /// Lives granted at the start of a session.
    pub starting_lives: u32,
    /// Score for a collectible.
    pub dot_score: u32,
    /// Score for a power collectible.
    pub power_score: u32,
    /// Score for a broken wall.
    pub wall_score: u32,
    /// Score for catching a scared adversary.
    pub adversary_score: u32,
    /// How many tiles ahead of the player the ambusher aims.
    pub ambush_lead: i32,
    /// Largest per-axis jitter applied by the erratic adversary.
    pub erratic_spread: i32,
    /// Upper bound on the elapsed time a single tick integrates, in milliseconds.
    pub max_frame_delta_ms: u64,
    /// Seed for adversary randomness.
    pub seed: u64,
}

impl Tuning {
    /// Length of the power state.
    #[must_use]
    pub const fn power_duration(&self) -> Duration {
        Duration::from_millis(self.power_duration_ms)
    }

    /// Upper bound on the elapsed time a single tick integrates.
    #[must_use]
    pub const fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    /// Contact distance in world units.
    #[must_use]
    pub fn capture_distance(&self) -> f32 {
        self.capture_radius * self.tile_length
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tile_length: 20.0,
            player_speed: 3.5,
            adversary_speed: 2.0,
            scared_speed: 1.0,
            snap_threshold: 5.0,
            capture_radius: 0.8,
            power_duration_ms: 8_000,
            breach_threshold: 20,
            starting_lives: 3,
            dot_score: 10,
            power_score: 50,
            wall_score: 20,
            adversary_score: 200,
            ambush_lead: 4,
            erratic_spread: 2,
            max_frame_delta_ms: 250,
            seed: 0x5eed_c4a5_e0dd_ba11,
        }
    }
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Continuous position of the player.
    pub position: Position,
    /// Tile containing the player's position.
    pub cell: CellCoord,
    /// Direction of travel, if moving.
    pub direction: Option<Direction>,
    /// Last direction travelled; kept while the player stands against a wall.
    pub facing: Option<Direction>,
    /// Direction waiting to be committed at the next tile center.
    pub queued: Option<Direction>,
    /// Lives remaining.
    pub lives: u32,
    /// Cumulative score of the session.
    pub score: u32,
    /// Collectibles eaten this session.
    pub currency: u32,
    /// Whether the player may currently break walls.
    pub breach_active: bool,
    /// Time left on the power state; zero when inactive.
    pub power_remaining: Duration,
}

/// Immutable representation of a single adversary used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AdversarySnapshot {
    /// Identifier of the adversary.
    pub id: AdversaryId,
    /// Continuous position of the adversary.
    pub position: Position,
    /// Tile containing the adversary's position.
    pub cell: CellCoord,
    /// Direction of travel, if moving.
    pub direction: Option<Direction>,
    /// Direction chosen at the last decision point.
    pub queued: Option<Direction>,
    /// Current distance travelled per frame.
    pub speed: f32,
    /// Whether the adversary is vulnerable.
    pub scared: bool,
    /// Whether the adversary was caught during the current power state.
    pub captured: bool,
}

/// Read-only snapshot describing all adversaries within the maze.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdversaryView {
    snapshots: Vec<AdversarySnapshot>,
}

impl AdversaryView {
    /// Creates a new adversary view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AdversarySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AdversarySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single adversary.
    #[must_use]
    pub fn get(&self, id: AdversaryId) -> Option<&AdversarySnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of adversaries in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no adversaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AdversarySnapshot> {
        self.snapshots
    }
}

/// Everything a presentation layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Session the frame belongs to.
    pub session: SessionId,
    /// Current session state.
    pub state: GameState,
    /// Player state.
    pub player: PlayerSnapshot,
    /// Adversary states in identifier order.
    pub adversaries: AdversaryView,
    /// Best score seen by this world.
    pub high_score: u32,
    /// Collectibles still in the maze.
    pub remaining_collectibles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction.reverse(), direction);
            assert_eq!(direction.reverse().reverse(), direction);
        }
    }

    #[test]
    fn step_follows_screen_axes() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(origin.step(Direction::Up), CellCoord::new(3, 2));
        assert_eq!(origin.step(Direction::Down), CellCoord::new(3, 4));
        assert_eq!(origin.step(Direction::Left), CellCoord::new(2, 3));
        assert_eq!(origin.step(Direction::Right), CellCoord::new(4, 3));
    }

    #[test]
    fn squared_distance_handles_off_grid_targets() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.squared_distance(CellCoord::new(-3, 4)), 25);
        assert_eq!(CellCoord::new(-3, 4).squared_distance(origin), 25);
    }

    #[test]
    fn only_consumables_count_as_collectible() {
        assert!(CellKind::Collectible.is_collectible());
        assert!(CellKind::PowerCollectible.is_collectible());
        assert!(!CellKind::Open.is_collectible());
        assert!(!CellKind::BreakableWall.is_collectible());
    }

    #[test]
    fn restart_is_accepted_only_outside_play() {
        assert!(GameState::Start.accepts_restart());
        assert!(GameState::GameOver.accepts_restart());
        assert!(GameState::Won.accepts_restart());
        assert!(!GameState::Playing.accepts_restart());
        assert!(!GameState::Paused.accepts_restart());
    }

    #[test]
    fn default_tuning_matches_reference_values() {
        let tuning = Tuning::default();
        assert_eq!(tuning.power_duration(), Duration::from_millis(8_000));
        assert_eq!(tuning.breach_threshold, 20);
        assert_eq!(tuning.starting_lives, 3);
        assert!((tuning.capture_distance() - 16.0).abs() < 1e-4);
        assert!((tuning.snap_threshold - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_tuning_fills_missing_fields_from_defaults() {
        let tuning: Tuning = toml::from_str("player_speed = 4.0\nseed = 7\n").expect("parse");
        assert_eq!(tuning.seed, 7);
        assert!((tuning.player_speed - 4.0).abs() < f32::EPSILON);
        assert_eq!(tuning.breach_threshold, Tuning::default().breach_threshold);
    }
}
