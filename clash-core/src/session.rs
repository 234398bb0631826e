use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use clash_types::{
    AnswerOutcome, AnswerPayload, ChallengePayload, ChatMessage, CommandError, Game, GameId,
    GameStatus, MoveRecord, PlayerId, PlayerState, PowerUpKind, Seat, SeatId,
};

use crate::question_bank::QuestionBank;
use crate::scoring::ScoringEngine;
use crate::timer;
use crate::validation::{AnswerValidator, FuzzyConfig, normalize};

pub const MIN_SEATS_TO_START: usize = 2;
pub const DEFAULT_MAX_ROUNDS: u32 = 10;
pub const CHAT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct GameSettings {
    pub max_rounds: u32,
    pub fuzzy: FuzzyConfig,
    pub grace_secs: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            fuzzy: FuzzyConfig::default(),
            grace_secs: timer::GRACE_PERIOD_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PowerUpEffect {
    LetterRevealed(char),
    WordSkipped,
    /// Declared in the data model but wired to no effect; the counter is
    /// still consumed.
    OpponentFrozen,
}

/// The authoritative session for one game. Mutations assume the caller
/// serializes access per game; the server holds one mutex per session.
#[derive(Debug)]
pub struct GameSession {
    pub state: Game,
    pub settings: GameSettings,
    pub validator: AnswerValidator,
    pub bank: QuestionBank,
    /// Authoritative start instant of the current round; the snapshot's
    /// `timer_start_time` mirrors it for clients.
    pub round_started_at: Option<DateTime<Utc>>,
    /// Normalized sentences already presented as recording prompts.
    pub recorded_sentences: HashSet<String>,
    pub last_activity: DateTime<Utc>,
}

impl GameSession {
    pub fn create(
        id: GameId,
        player_id: PlayerId,
        display_name: String,
        settings: GameSettings,
        bank: QuestionBank,
        now: DateTime<Utc>,
    ) -> Self {
        let state = Game {
            id,
            status: GameStatus::Waiting,
            current_round: 0,
            max_rounds: settings.max_rounds,
            current_word: None,
            seats: vec![Seat {
                seat: SeatId::Player1,
                player_id,
                display_name,
                state: PlayerState::default(),
            }],
            question_results: HashMap::new(),
            last_move: None,
            winner: None,
            timer_start_time: None,
            time_left: 0,
            chat_messages: Vec::new(),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        let validator = AnswerValidator::new(settings.fuzzy);
        info!(game_id = %id, "created game");

        Self {
            state,
            settings,
            validator,
            bank,
            round_started_at: None,
            recorded_sentences: HashSet::new(),
            last_activity: now,
        }
    }

    /// Fill the next empty seat. Fails without mutation if the game already
    /// started, is full, or the player is already seated.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        display_name: String,
        now: DateTime<Utc>,
    ) -> Result<(), CommandError> {
        if self.state.status != GameStatus::Waiting {
            return Err(CommandError::conflict("game has already started"));
        }
        if self.state.seat_of(player_id).is_some() {
            return Err(CommandError::conflict("player is already seated"));
        }
        if self.state.is_full() {
            return Err(CommandError::conflict("game is full"));
        }

        let seat = SeatId::ALL[self.state.seats.len()];
        self.state.seats.push(Seat {
            seat,
            player_id,
            display_name,
            state: PlayerState::default(),
        });
        info!(game_id = %self.state.id, %seat, "player joined");
        self.touch(now);
        self.try_start(now);
        Ok(())
    }

    /// Mark a seat ready. The start predicate is re-evaluated on every
    /// ready (and join), not just once.
    pub fn set_ready(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(), CommandError> {
        if self.state.status != GameStatus::Waiting {
            return Err(CommandError::conflict("game has already started"));
        }
        let seat = self
            .state
            .seat_of_mut(player_id)
            .ok_or(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            })?;
        seat.state.is_ready = true;
        self.touch(now);
        self.try_start(now);
        Ok(())
    }

    pub fn start_predicate_holds(&self) -> bool {
        self.state.seats.len() >= MIN_SEATS_TO_START
            && self.state.seats.iter().all(|s| s.state.is_ready)
    }

    /// Transition to active play if the predicate holds. Idempotent.
    pub fn try_start(&mut self, now: DateTime<Utc>) -> bool {
        if self.state.status != GameStatus::Waiting || !self.start_predicate_holds() {
            return false;
        }
        self.state.status = GameStatus::Active;
        self.begin_round(now);
        info!(game_id = %self.state.id, seats = self.state.seats.len(), "game started");
        true
    }

    /// Explicit start command; fails if the predicate does not hold.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), CommandError> {
        match self.state.status {
            GameStatus::Active => Err(CommandError::conflict("game has already started")),
            GameStatus::Finished => Err(CommandError::conflict("game is finished")),
            GameStatus::Waiting => {
                if !self.try_start(now) {
                    return Err(CommandError::conflict(
                        "need at least 2 seats with every seat ready",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Draw the next challenge and reset the round timer. Clears
    /// `question_results`; this is the only place that happens.
    pub(crate) fn begin_round(&mut self, now: DateTime<Utc>) {
        let challenge = self.bank.draw(&self.recorded_sentences);
        if let ChallengePayload::Recording { sentence } = &challenge.payload {
            self.recorded_sentences.insert(normalize(sentence));
        }

        self.state.question_results.clear();
        self.state.time_left = timer::round_duration(&challenge);
        self.state.current_word = Some(challenge);
        self.round_started_at = Some(now);
        self.state.timer_start_time = Some(now.to_rfc3339());
        self.touch(now);
    }

    /// Submit one seat's answer for the current round. All-or-nothing: any
    /// rejection leaves the session untouched.
    pub fn submit_move(
        &mut self,
        player_id: PlayerId,
        round: u32,
        answer: &AnswerPayload,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, CommandError> {
        if self.state.status != GameStatus::Active {
            return Err(CommandError::conflict("game is not active"));
        }
        let seat = self
            .state
            .seat_of(player_id)
            .ok_or(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            })?
            .seat;

        if round != self.state.current_round {
            return Err(CommandError::StaleRound {
                submitted: round,
                current: self.state.current_round,
            });
        }
        let Some(started_at) = self.round_started_at else {
            return Err(CommandError::conflict("round timer is not running"));
        };
        // Late submissions are fine up to the grace deadline; past it the
        // round is locked for timeout defaults.
        if timer::past_grace_deadline(started_at, self.state.time_left, self.settings.grace_secs, now)
        {
            return Err(CommandError::StaleRound {
                submitted: round,
                current: self.state.current_round,
            });
        }
        if self.state.question_results.contains_key(&seat) {
            return Err(CommandError::conflict("seat already answered this round"));
        }

        let verdict = {
            let challenge = self
                .state
                .current_word
                .as_ref()
                .ok_or_else(|| CommandError::conflict("no active question"))?;
            self.validator.validate(challenge, answer)?
        };

        let elapsed = timer::elapsed_seconds(started_at, now);
        let (delta, speed_bonus) = ScoringEngine::score_answer(verdict.is_correct, elapsed);

        let outcome = AnswerOutcome {
            is_correct: verdict.is_correct,
            answer_time: now.to_rfc3339(),
            answer_time_seconds: elapsed,
            speed_bonus,
            points_delta: delta,
            selected_index: verdict.selected_index,
            timed_out: false,
            skipped: false,
        };

        self.apply_outcome(seat, player_id, outcome.clone(), now);
        debug!(
            game_id = %self.state.id,
            %seat,
            correct = verdict.is_correct,
            elapsed,
            "answer recorded"
        );
        Ok(outcome)
    }

    /// Record a seat's outcome and apply its point delta. Also used by the
    /// advancement controller for timeout defaults.
    pub(crate) fn apply_outcome(
        &mut self,
        seat: SeatId,
        player_id: PlayerId,
        outcome: AnswerOutcome,
        now: DateTime<Utc>,
    ) {
        if let Some(entry) = self.state.seats.iter_mut().find(|s| s.seat == seat) {
            entry.state.score += outcome.points_delta;
        }
        self.state.last_move = Some(MoveRecord {
            seat,
            player_id,
            round: self.state.current_round,
            outcome: outcome.clone(),
        });
        self.state.question_results.insert(seat, outcome);
        self.touch(now);
    }

    pub fn use_power_up(
        &mut self,
        player_id: PlayerId,
        kind: PowerUpKind,
        now: DateTime<Utc>,
    ) -> Result<PowerUpEffect, CommandError> {
        if self.state.status != GameStatus::Active {
            return Err(CommandError::conflict("game is not active"));
        }
        let seat_id = self
            .state
            .seat_of(player_id)
            .ok_or(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            })?
            .seat;

        match kind {
            PowerUpKind::RevealLetter => {
                let letter = {
                    let challenge = self
                        .state
                        .current_word
                        .as_ref()
                        .ok_or_else(|| CommandError::conflict("no active question"))?;
                    let letters: Vec<char> = challenge.word.chars().collect();
                    if letters.is_empty() {
                        return Err(CommandError::conflict("current word has no letters"));
                    }
                    // Arbitrary but stable within a round; no promise it is
                    // a useful letter.
                    letters[self.state.current_round as usize % letters.len()]
                };
                self.consume_power_up(seat_id, kind)?;
                self.touch(now);
                Ok(PowerUpEffect::LetterRevealed(letter))
            }
            PowerUpKind::SkipWord => {
                if self.state.question_results.contains_key(&seat_id) {
                    return Err(CommandError::conflict("seat already answered this round"));
                }
                self.consume_power_up(seat_id, kind)?;
                // Forfeits this round's scoring for the seat; the round
                // keeps running for everyone else.
                let outcome = AnswerOutcome {
                    is_correct: false,
                    answer_time: now.to_rfc3339(),
                    answer_time_seconds: self
                        .round_started_at
                        .map(|started| timer::elapsed_seconds(started, now))
                        .unwrap_or(0),
                    speed_bonus: 0,
                    points_delta: 0,
                    selected_index: None,
                    timed_out: false,
                    skipped: true,
                };
                self.apply_outcome(seat_id, player_id, outcome, now);
                Ok(PowerUpEffect::WordSkipped)
            }
            PowerUpKind::FreezeOpponent => {
                self.consume_power_up(seat_id, kind)?;
                debug!(game_id = %self.state.id, %seat_id, "freeze opponent used (no effect)");
                self.touch(now);
                Ok(PowerUpEffect::OpponentFrozen)
            }
        }
    }

    fn consume_power_up(&mut self, seat_id: SeatId, kind: PowerUpKind) -> Result<(), CommandError> {
        let seat = self
            .state
            .seats
            .iter_mut()
            .find(|s| s.seat == seat_id)
            .ok_or(CommandError::SeatNotFound {
                player_id: seat_id.to_string(),
            })?;
        let counter = match kind {
            PowerUpKind::RevealLetter => &mut seat.state.power_ups.reveal_letter,
            PowerUpKind::SkipWord => &mut seat.state.power_ups.skip_word,
            PowerUpKind::FreezeOpponent => &mut seat.state.power_ups.freeze_opponent,
        };
        if *counter == 0 {
            return Err(CommandError::conflict("no power-ups of that kind left"));
        }
        *counter -= 1;
        Ok(())
    }

    /// Opaque message append; chat rendering lives elsewhere.
    pub fn append_chat(
        &mut self,
        player_id: PlayerId,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<(), CommandError> {
        if text.trim().is_empty() {
            return Err(CommandError::validation("chat message is empty"));
        }
        let display_name = self
            .state
            .seat_of(player_id)
            .ok_or(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            })?
            .display_name
            .clone();

        self.state.chat_messages.push(ChatMessage {
            player_id,
            display_name,
            text,
            sent_at: now.to_rfc3339(),
        });
        if self.state.chat_messages.len() > CHAT_HISTORY_LIMIT {
            let overflow = self.state.chat_messages.len() - CHAT_HISTORY_LIMIT;
            self.state.chat_messages.drain(..overflow);
        }
        self.touch(now);
        Ok(())
    }

    /// Derived remaining time for the current round.
    pub fn remaining_time(&self, now: DateTime<Utc>) -> u32 {
        match self.round_started_at {
            Some(started) => timer::remaining_seconds(started, self.state.time_left, now),
            None => 0,
        }
    }

    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity > timeout
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.state.updated_at = now.to_rfc3339();
    }
}
