#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adversary decision making.
//!
//! Each adversary follows one of four named strategies selected by its
//! identifier. At a decision point the system enumerates the passable
//! neighbours, drops the reversal unless it is the only way out, and then
//! either picks at random (scared or wandering adversaries) or greedily
//! minimises the squared distance to the strategy's target tile.

use maze_chase_core::{AdversaryId, AdversarySnapshot, CellCoord, Direction, PlayerSnapshot};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Closed set of adversary policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Targets the player's current tile.
    DirectPursuer,
    /// Targets a tile ahead of the player along its facing.
    Ambusher,
    /// Targets the player's tile displaced by a fresh random offset.
    Erratic,
    /// Ignores the player and wanders at random.
    Wanderer,
}

impl Strategy {
    /// Strategy assigned to the provided adversary; identifiers past three cycle.
    #[must_use]
    pub const fn for_adversary(id: AdversaryId) -> Self {
        match id.get() % 4 {
            0 => Self::DirectPursuer,
            1 => Self::Ambusher,
            2 => Self::Erratic,
            _ => Self::Wanderer,
        }
    }
}

/// Configuration for the pursuit system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    seed: u64,
    ambush_lead: i32,
    erratic_spread: i32,
}

impl Config {
    /// Creates a configuration from a seed and the targeting distances in tiles.
    #[must_use]
    pub const fn new(seed: u64, ambush_lead: i32, erratic_spread: i32) -> Self {
        Self {
            seed,
            ambush_lead,
            erratic_spread,
        }
    }

    /// Seed used for every random choice.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Tiles the ambusher aims ahead of the player.
    #[must_use]
    pub const fn ambush_lead(&self) -> i32 {
        self.ambush_lead
    }

    /// Largest per-axis offset the erratic adversary applies.
    #[must_use]
    pub const fn erratic_spread(&self) -> i32 {
        self.erratic_spread
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0, 4, 2)
    }
}

/// Seeded adversary policy evaluator.
#[derive(Clone, Debug)]
pub struct Pursuit {
    config: Config,
    rng: ChaCha8Rng,
}

impl Pursuit {
    /// Creates a new evaluator seeded from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Chooses the direction an adversary should travel next.
    ///
    /// `is_passable` reports whether a non-breaching mover may enter a tile.
    /// Returns `None` only when every neighbour is blocked.
    pub fn steer<F>(
        &mut self,
        adversary: &AdversarySnapshot,
        player: &PlayerSnapshot,
        is_passable: F,
    ) -> Option<Direction>
    where
        F: Fn(CellCoord) -> bool,
    {
        let candidates = candidate_directions(adversary.cell, adversary.direction, &is_passable);
        if candidates.is_empty() {
            return None;
        }

        if adversary.scared {
            return self.pick_random(&candidates);
        }

        match self.target_tile(adversary.id, player) {
            Some(target) => greedy_choice(adversary.cell, target, &candidates),
            None => self.pick_random(&candidates),
        }
    }

    /// Target tile for a hunting adversary, or `None` for the wanderer.
    ///
    /// The erratic offset draws from the generator on every call.
    pub fn target_tile(&mut self, id: AdversaryId, player: &PlayerSnapshot) -> Option<CellCoord> {
        match Strategy::for_adversary(id) {
            Strategy::DirectPursuer => Some(player.cell),
            Strategy::Ambusher => Some(ambush_target(
                player.cell,
                player.facing,
                self.config.ambush_lead,
            )),
            Strategy::Erratic => {
                let spread = self.config.erratic_spread.abs();
                let columns = self.rng.gen_range(-spread..=spread);
                let rows = self.rng.gen_range(-spread..=spread);
                Some(player.cell.offset(columns, rows))
            }
            Strategy::Wanderer => None,
        }
    }

    fn pick_random(&mut self, candidates: &Candidates) -> Option<Direction> {
        candidates.as_slice().choose(&mut self.rng).copied()
    }
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Tile `lead` steps ahead of `cell` along `facing`; a player that never moved is its own target.
#[must_use]
pub fn ambush_target(cell: CellCoord, facing: Option<Direction>, lead: i32) -> CellCoord {
    match facing {
        Some(direction) => {
            let (columns, rows) = direction.delta();
            cell.offset(columns * lead, rows * lead)
        }
        None => cell,
    }
}

/// Direction whose neighbour lands closest to `target`; ties keep enumeration order.
#[must_use]
fn greedy_choice(from: CellCoord, target: CellCoord, candidates: &Candidates) -> Option<Direction> {
    let mut best: Option<Candidate> = None;
    for &direction in candidates.as_slice() {
        let candidate = Candidate {
            direction,
            distance: from.step(direction).squared_distance(target),
        };
        best = Some(match best {
            None => candidate,
            Some(existing) => {
                if candidate.is_better_than(existing) {
                    candidate
                } else {
                    existing
                }
            }
        });
    }
    best.map(|candidate| candidate.direction)
}

fn candidate_directions<F>(
    cell: CellCoord,
    travelling: Option<Direction>,
    is_passable: &F,
) -> Candidates
where
    F: Fn(CellCoord) -> bool,
{
    let mut open = Candidates::default();
    for direction in Direction::ALL {
        if is_passable(cell.step(direction)) {
            open.push(direction);
        }
    }

    let Some(reverse) = travelling.map(Direction::reverse) else {
        return open;
    };
    if open.len() <= 1 {
        return open;
    }

    let mut forward = Candidates::default();
    for &direction in open.as_slice() {
        if direction != reverse {
            forward.push(direction);
        }
    }
    forward
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    direction: Direction,
    distance: i64,
}

impl Candidate {
    fn is_better_than(self, other: Candidate) -> bool {
        self.distance < other.distance
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidates {
    directions: [Direction; 4],
    len: usize,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            directions: [Direction::Up; 4],
            len: 0,
        }
    }
}

impl Candidates {
    fn push(&mut self, direction: Direction) {
        if self.len < self.directions.len() {
            self.directions[self.len] = direction;
            self.len += 1;
        }
    }

    fn as_slice(&self) -> &[Direction] {
        &self.directions[..self.len]
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}
