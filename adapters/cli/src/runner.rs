use std::time::Duration;

use anyhow::{bail, Result};
use maze_chase_core::{Command, Event, Frame, GameState, SessionId};
use maze_chase_system_commentary::{
    fetch, Commentary, CommentaryBoard, CommentaryReply, CommentaryRequest, Commentator,
};
use maze_chase_world::{self as world, query, World};
use tokio::{
    sync::mpsc,
    task,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{autopilot::Autopilot, board};

/// Elapsed time reported per frame when frames are not paced by the clock.
const UNPACED_FRAME: Duration = Duration::from_millis(16);

/// Knobs controlling a headless run.
#[derive(Clone, Debug)]
pub(crate) struct RunOptions {
    /// Maximum frames simulated per session.
    pub(crate) frames_per_session: u32,
    /// Number of sessions to play back to back.
    pub(crate) sessions: u32,
    /// Wall-clock frame period; `None` runs as fast as possible.
    pub(crate) frame_interval: Option<Duration>,
    /// Frames between autopilot steering decisions; zero disables it.
    pub(crate) steer_every: u32,
    /// Seed for the autopilot.
    pub(crate) autopilot_seed: u64,
    /// Upper bound on each commentary fetch.
    pub(crate) commentary_timeout: Duration,
}

/// Outcome of one session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionSummary {
    pub(crate) session: SessionId,
    pub(crate) state: GameState,
    pub(crate) score: u32,
    pub(crate) lives: u32,
    pub(crate) frames: u32,
    pub(crate) commentary: Option<String>,
}

/// Outcome of a whole run.
#[derive(Clone, Debug)]
pub(crate) struct RunSummary {
    pub(crate) sessions: Vec<SessionSummary>,
    pub(crate) high_score: u32,
    pub(crate) final_frame: Frame,
    pub(crate) final_board: String,
}

/// Plays sessions on the current `LocalSet`, fetching commentary in the background.
pub(crate) async fn run<C>(
    mut world: World,
    commentator: C,
    options: &RunOptions,
) -> Result<RunSummary>
where
    C: Commentator + Clone + 'static,
{
    if options.sessions == 0 {
        bail!("at least one session must be played");
    }

    let (replies_tx, mut replies_rx) = mpsc::unbounded_channel::<CommentaryReply>();
    let mut commentary = Commentary::new();
    let mut board = CommentaryBoard::new();
    let mut autopilot = Autopilot::new(options.autopilot_seed, options.steer_every);
    let mut clock = options.frame_interval.map(|period| {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let mut summaries = Vec::with_capacity(options.sessions as usize);
    let mut requests = Vec::new();
    let mut events = Vec::new();

    info!(banner = query::welcome_banner(&world), "maze chase starting");

    for _ in 0..options.sessions {
        events.clear();
        world::apply(&mut world, Command::Restart, &mut events);
        log_events(&events);
        board.observe(&events);

        let mut last_frame = Instant::now();
        let mut frames = 0;
        while frames < options.frames_per_session {
            let dt = match clock.as_mut() {
                Some(interval) => {
                    let now = interval.tick().await;
                    let dt = now.saturating_duration_since(last_frame);
                    last_frame = now;
                    dt
                }
                None => {
                    task::yield_now().await;
                    UNPACED_FRAME
                }
            };
            frames += 1;

            events.clear();
            if let Some(intent) = autopilot.next_intent(&query::frame(&world)) {
                world::apply(&mut world, intent, &mut events);
            }
            world::apply(&mut world, Command::Tick { dt }, &mut events);
            log_events(&events);
            board.observe(&events);

            commentary.handle(&events, &mut requests);
            for request in requests.drain(..) {
                board.begin(&request);
                spawn_fetch(commentator.clone(), request, options.commentary_timeout, &replies_tx);
            }
            while let Ok(reply) = replies_rx.try_recv() {
                let _ = board.deliver(reply);
            }

            if query::game_state(&world).is_terminal() {
                break;
            }
        }

        while board.is_loading() {
            match replies_rx.recv().await {
                Some(reply) => {
                    let _ = board.deliver(reply);
                }
                None => break,
            }
        }

        let player = query::player(&world);
        let summary = SessionSummary {
            session: query::session(&world),
            state: query::game_state(&world),
            score: player.score,
            lives: player.lives,
            frames,
            commentary: board.text().map(str::to_owned),
        };
        info!(
            session = summary.session.get(),
            state = ?summary.state,
            score = summary.score,
            frames = summary.frames,
            "session summary"
        );
        summaries.push(summary);

        if !query::game_state(&world).accepts_restart() {
            warn!(
                frames = options.frames_per_session,
                "session did not finish within the frame budget; stopping"
            );
            break;
        }
    }

    let final_frame = query::frame(&world);
    Ok(RunSummary {
        sessions: summaries,
        high_score: query::high_score(&world),
        final_board: board::render(query::grid(&world), &final_frame),
        final_frame,
    })
}

fn spawn_fetch<C>(
    commentator: C,
    request: CommentaryRequest,
    limit: Duration,
    replies: &mpsc::UnboundedSender<CommentaryReply>,
) where
    C: Commentator + 'static,
{
    let replies = replies.clone();
    let _ = task::spawn_local(async move {
        let reply = fetch(&commentator, request, limit).await;
        if replies.send(reply).is_err() {
            debug!(session = request.session.get(), "runner gone before commentary arrived");
        }
    });
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::TimeAdvanced { .. } => {}
            Event::PlayerDied { lives_remaining } => info!(lives_remaining, "player died"),
            other => debug!(event = ?other, "world event"),
        }
    }
}
