use maze_chase_core::{Command, Direction, Frame};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded stand-in for keyboard input during headless runs.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    cadence: u32,
    countdown: u32,
}

impl Autopilot {
    /// Creates an autopilot that steers every `cadence` frames; zero disables it.
    pub(crate) fn new(seed: u64, cadence: u32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            cadence,
            countdown: 0,
        }
    }

    /// Intent for the upcoming frame, if any.
    ///
    /// A stalled player is steered immediately; otherwise a new direction is
    /// picked once per cadence period.
    pub(crate) fn next_intent(&mut self, frame: &Frame) -> Option<Command> {
        if self.cadence == 0 {
            return None;
        }

        let stalled = frame.player.direction.is_none();
        if self.countdown > 0 && !stalled {
            self.countdown -= 1;
            return None;
        }
        self.countdown = self.cadence - 1;

        let choices: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| frame.player.queued != Some(*direction) || stalled)
            .collect();
        choices
            .choose(&mut self.rng)
            .map(|direction| Command::Steer {
                direction: *direction,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_world::{query, World};

    #[test]
    fn disabled_autopilot_stays_silent() {
        let frame = query::frame(&World::new());
        let mut autopilot = Autopilot::new(1, 0);
        assert!((0..100).all(|_| autopilot.next_intent(&frame).is_none()));
    }

    #[test]
    fn stalled_player_is_steered_every_frame() {
        let frame = query::frame(&World::new());
        assert_eq!(frame.player.direction, None);
        let mut autopilot = Autopilot::new(1, 30);
        assert!((0..10).all(|_| autopilot.next_intent(&frame).is_some()));
    }

    #[test]
    fn moving_player_is_steered_once_per_cadence() {
        let mut frame = query::frame(&World::new());
        frame.player.direction = Some(Direction::Left);
        frame.player.queued = Some(Direction::Left);
        let mut autopilot = Autopilot::new(9, 4);

        let intents: Vec<_> = (0..12).map(|_| autopilot.next_intent(&frame)).collect();

        assert_eq!(intents.iter().filter(|intent| intent.is_some()).count(), 3);
        assert!(intents.iter().flatten().all(|intent| !matches!(
            intent,
            Command::Steer {
                direction: Direction::Left
            }
        )));
    }

    #[test]
    fn same_seed_same_intents() {
        let frame = query::frame(&World::new());
        let mut first = Autopilot::new(42, 5);
        let mut second = Autopilot::new(42, 5);
        for _ in 0..50 {
            assert_eq!(first.next_intent(&frame), second.next_intent(&frame));
        }
    }
}
