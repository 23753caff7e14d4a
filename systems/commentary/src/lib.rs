#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! End-of-game commentary.
//!
//! The world never waits on commentary. [`Commentary`] turns terminal events
//! into at most one [`CommentaryRequest`] per session, an adapter runs
//! [`fetch`] on its scheduler, and the reply lands in a [`CommentaryBoard`]
//! only if it still belongs to the session on screen.

use std::time::Duration;

use maze_chase_core::{Event, Outcome, SessionId};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Default bound on how long a commentator may take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures a commentator can report.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommentaryError {
    /// The collaborator could not be reached or refused the request.
    #[error("commentator unavailable: {0}")]
    Unavailable(String),
    /// The collaborator answered with blank text.
    #[error("commentator returned no text")]
    Empty,
    /// The collaborator did not answer in time.
    #[error("commentator timed out after {0:?}")]
    TimedOut(Duration),
}

/// Source of a short line reacting to a finished session.
#[allow(async_fn_in_trait)]
pub trait Commentator {
    /// Produces commentary for the outcome and final score.
    async fn commentate(&self, outcome: Outcome, score: u32) -> Result<String, CommentaryError>;
}

/// Offline commentator with canned lines and an optional artificial delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticCommentator {
    latency: Duration,
}

impl StaticCommentator {
    /// Creates a commentator that answers immediately.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Creates a commentator that waits before answering.
    #[must_use]
    pub const fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Commentator for StaticCommentator {
    async fn commentate(&self, outcome: Outcome, _score: u32) -> Result<String, CommentaryError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        Ok(offline_line(outcome).to_owned())
    }
}

/// Canned line used when no live commentator is configured.
#[must_use]
pub const fn offline_line(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Won => "Shabash! Great job, Beta!",
        Outcome::Lost => "Arey yaar! Better luck next time!",
    }
}

/// Line shown when a commentator fails or times out.
#[must_use]
pub const fn fallback_line(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Won => "Shabash! You won!",
        Outcome::Lost => "Arey no! Try again!",
    }
}

/// Line shown when a commentator answers with blank text.
#[must_use]
pub const fn blank_line(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Won => "You Won!",
        Outcome::Lost => "Game Over!",
    }
}

/// Request for commentary on a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommentaryRequest {
    /// Session the commentary belongs to.
    pub session: SessionId,
    /// How the session ended.
    pub outcome: Outcome,
    /// Final score of the session.
    pub score: u32,
}

/// Text produced for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentaryReply {
    /// Session the reply belongs to.
    pub session: SessionId,
    /// Line to display.
    pub text: String,
    /// Whether the fixed fallback replaced the commentator's answer.
    pub fell_back: bool,
}

/// Pure system that issues one commentary request per finished session.
#[derive(Debug, Default)]
pub struct Commentary {
    last_requested: Option<SessionId>,
}

impl Commentary {
    /// Creates a new commentary system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits commentary requests.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<CommentaryRequest>) {
        for event in events {
            let (session, outcome, score) = match event {
                Event::GameWon { session, score } => (*session, Outcome::Won, *score),
                Event::GameOver { session, score } => (*session, Outcome::Lost, *score),
                _ => continue,
            };
            if self.last_requested == Some(session) {
                continue;
            }
            self.last_requested = Some(session);
            debug!(session = session.get(), ?outcome, score, "commentary requested");
            out.push(CommentaryRequest {
                session,
                outcome,
                score,
            });
        }
    }
}

/// Display slot holding the commentary of the current session.
#[derive(Debug, Default)]
pub struct CommentaryBoard {
    session: SessionId,
    text: Option<String>,
    pending: bool,
}

impl CommentaryBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks session changes; a new session clears the slot.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            if let Event::SessionStarted { session } = event {
                self.session = *session;
                self.text = None;
                self.pending = false;
            }
        }
    }

    /// Marks a request as in flight if it belongs to the current session.
    pub fn begin(&mut self, request: &CommentaryRequest) {
        if request.session == self.session {
            self.pending = true;
        }
    }

    /// Stores a reply; replies for other sessions are discarded.
    pub fn deliver(&mut self, reply: CommentaryReply) -> bool {
        if reply.session != self.session {
            debug!(
                reply_session = reply.session.get(),
                current_session = self.session.get(),
                "discarding stale commentary"
            );
            return false;
        }
        self.text = Some(reply.text);
        self.pending = false;
        true
    }

    /// Session the board currently displays.
    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Commentary text, once it arrived.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Reports whether a request for the current session is still in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending
    }
}

/// Asks the commentator for a line, bounded by `limit`.
///
/// Never fails: errors and timeouts yield [`fallback_line`], blank answers
/// yield [`blank_line`].
pub async fn fetch<C>(
    commentator: &C,
    request: CommentaryRequest,
    limit: Duration,
) -> CommentaryReply
where
    C: Commentator,
{
    let answer = match timeout(limit, commentator.commentate(request.outcome, request.score)).await
    {
        Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        Ok(Ok(_)) => Err(CommentaryError::Empty),
        Ok(Err(error)) => Err(error),
        Err(_) => Err(CommentaryError::TimedOut(limit)),
    };

    match answer {
        Ok(text) => CommentaryReply {
            session: request.session,
            text,
            fell_back: false,
        },
        Err(error) => {
            warn!(session = request.session.get(), %error, "using fallback commentary");
            let text = match error {
                CommentaryError::Empty => blank_line(request.outcome),
                _ => fallback_line(request.outcome),
            };
            CommentaryReply {
                session: request.session,
                text: text.to_owned(),
                fell_back: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Commentator for Failing {
        async fn commentate(&self, _: Outcome, _: u32) -> Result<String, CommentaryError> {
            Err(CommentaryError::Unavailable("no key".to_owned()))
        }
    }

    struct Blank;

    impl Commentator for Blank {
        async fn commentate(&self, _: Outcome, _: u32) -> Result<String, CommentaryError> {
            Ok("   ".to_owned())
        }
    }

    fn request(session: u64, outcome: Outcome) -> CommentaryRequest {
        CommentaryRequest {
            session: SessionId::new(session),
            outcome,
            score: 1_230,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn static_commentator_answers_with_offline_line() {
        let reply = fetch(
            &StaticCommentator::new(),
            request(1, Outcome::Won),
            DEFAULT_TIMEOUT,
        )
        .await;
        assert_eq!(reply.text, "Shabash! Great job, Beta!");
        assert!(!reply.fell_back);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_commentator_times_out_to_fallback() {
        let slow = StaticCommentator::with_latency(Duration::from_secs(30));
        let reply = fetch(&slow, request(2, Outcome::Lost), Duration::from_secs(1)).await;
        assert_eq!(reply.text, "Arey no! Try again!");
        assert!(reply.fell_back);
        assert_eq!(reply.session, SessionId::new(2));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_inside_the_bound_is_tolerated() {
        let slow = StaticCommentator::with_latency(Duration::from_millis(900));
        let reply = fetch(&slow, request(2, Outcome::Lost), Duration::from_secs(1)).await;
        assert_eq!(reply.text, "Arey yaar! Better luck next time!");
        assert!(!reply.fell_back);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_fall_back_to_encouragement() {
        let reply = fetch(&Failing, request(3, Outcome::Won), DEFAULT_TIMEOUT).await;
        assert_eq!(reply.text, "Shabash! You won!");
        assert!(reply.fell_back);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_falls_back_to_plain_outcome() {
        let reply = fetch(&Blank, request(3, Outcome::Lost), DEFAULT_TIMEOUT).await;
        assert_eq!(reply.text, "Game Over!");
        assert!(reply.fell_back);

        let reply = fetch(&Blank, request(4, Outcome::Won), DEFAULT_TIMEOUT).await;
        assert_eq!(reply.text, "You Won!");
        assert!(reply.fell_back);
    }

    #[test]
    fn one_request_per_session() {
        let mut commentary = Commentary::new();
        let mut requests = Vec::new();
        let ending = Event::GameOver {
            session: SessionId::new(4),
            score: 90,
        };
        commentary.handle(&[ending.clone(), ending.clone()], &mut requests);
        commentary.handle(&[ending], &mut requests);
        assert_eq!(requests, vec![request_with_score(4, Outcome::Lost, 90)]);
    }

    #[test]
    fn board_discards_replies_from_previous_sessions() {
        let mut board = CommentaryBoard::new();
        board.observe(&[Event::SessionStarted {
            session: SessionId::new(1),
        }]);
        let first = request(1, Outcome::Lost);
        board.begin(&first);
        assert!(board.is_loading());

        board.observe(&[Event::SessionStarted {
            session: SessionId::new(2),
        }]);
        assert!(!board.is_loading());

        let stale = CommentaryReply {
            session: SessionId::new(1),
            text: "late".to_owned(),
            fell_back: false,
        };
        assert!(!board.deliver(stale));
        assert_eq!(board.text(), None);

        let fresh = CommentaryReply {
            session: SessionId::new(2),
            text: "on time".to_owned(),
            fell_back: false,
        };
        assert!(board.deliver(fresh));
        assert_eq!(board.text(), Some("on time"));
    }

    fn request_with_score(session: u64, outcome: Outcome, score: u32) -> CommentaryRequest {
        CommentaryRequest {
            score,
            ..request(session, outcome)
        }
    }
}
