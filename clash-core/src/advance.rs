//! Round advancement. Exactly one advancement happens per round no matter
//! how many submissions, polls, or timeout sweeps race to trigger it: the
//! caller serializes on the session mutex and `try_advance` checks the
//! round index it was asked to advance before doing anything.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use clash_types::{AnswerOutcome, GameStatus};

use crate::scoring::ScoringEngine;
use crate::session::GameSession;
use crate::timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The round is still open; nothing changed.
    NotReady,
    /// Moved to the next round and dealt a fresh challenge.
    Advanced,
    /// That was the final round; the game is now finished.
    Finished,
    /// Another caller already advanced past the requested round.
    AlreadyAdvanced,
}

pub struct RoundAdvancer;

impl RoundAdvancer {
    /// A round is complete when every filled seat has an outcome, or the
    /// grace deadline has passed.
    pub fn round_complete(session: &GameSession, now: DateTime<Utc>) -> bool {
        let all_answered = session
            .state
            .seats
            .iter()
            .all(|s| session.state.question_results.contains_key(&s.seat));
        if all_answered {
            return true;
        }
        match session.round_started_at {
            Some(started) => timer::past_grace_deadline(
                started,
                session.state.time_left,
                session.settings.grace_secs,
                now,
            ),
            None => false,
        }
    }

    /// Default every seat without an outcome to a timeout. Keyed on entry
    /// presence, so re-running it never double-penalizes.
    pub fn apply_timeout_defaults(session: &mut GameSession, now: DateTime<Utc>) {
        let missing: Vec<_> = session
            .state
            .seats
            .iter()
            .filter(|s| !session.state.question_results.contains_key(&s.seat))
            .map(|s| (s.seat, s.player_id))
            .collect();

        for (seat, player_id) in missing {
            let outcome = AnswerOutcome {
                is_correct: false,
                answer_time: now.to_rfc3339(),
                answer_time_seconds: session
                    .round_started_at
                    .map(|started| timer::elapsed_seconds(started, now))
                    .unwrap_or(0),
                speed_bonus: 0,
                points_delta: ScoringEngine::timeout_delta(),
                selected_index: None,
                timed_out: true,
                skipped: false,
            };
            debug!(game_id = %session.state.id, %seat, "timeout default applied");
            session.apply_outcome(seat, player_id, outcome, now);
        }
    }

    /// Advance past `expected_round` if it is complete. Safe to call from
    /// every submission and every poll; only the first effective call for a
    /// given round does anything.
    pub fn try_advance(
        session: &mut GameSession,
        expected_round: u32,
        now: DateTime<Utc>,
    ) -> AdvanceOutcome {
        match session.state.status {
            GameStatus::Finished => return AdvanceOutcome::AlreadyAdvanced,
            GameStatus::Waiting => return AdvanceOutcome::NotReady,
            GameStatus::Active => {}
        }
        if expected_round != session.state.current_round {
            return AdvanceOutcome::AlreadyAdvanced;
        }
        if !Self::round_complete(session, now) {
            return AdvanceOutcome::NotReady;
        }

        Self::apply_timeout_defaults(session, now);

        if session.state.current_round + 1 >= session.state.max_rounds {
            session.state.status = GameStatus::Finished;
            session.state.winner = ScoringEngine::decide_winner(&session.state.seats);
            session.state.current_word = None;
            session.state.question_results.clear();
            session.state.timer_start_time = None;
            session.state.time_left = 0;
            session.round_started_at = None;
            session.touch(now);
            info!(
                game_id = %session.state.id,
                winner = ?session.state.winner,
                "game finished"
            );
            return AdvanceOutcome::Finished;
        }

        session.state.current_round += 1;
        session.begin_round(now);
        debug!(
            game_id = %session.state.id,
            round = session.state.current_round,
            "round advanced"
        );
        AdvanceOutcome::Advanced
    }
}
