use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::challenge::{SafeChallenge, WordChallenge};
use crate::{GameId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatus {
    Waiting,  // Seats filling, players readying up
    Active,   // Rounds in progress
    Finished, // All rounds played, winner decided
}

/// One of the up-to-three participant slots in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SeatId {
    Player1,
    Player2,
    Player3,
}

impl SeatId {
    pub const ALL: [SeatId; 3] = [SeatId::Player1, SeatId::Player2, SeatId::Player3];

    pub fn label(&self) -> &'static str {
        match self {
            SeatId::Player1 => "player1",
            SeatId::Player2 => "player2",
            SeatId::Player3 => "player3",
        }
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PowerUpKind {
    RevealLetter,
    SkipWord,
    FreezeOpponent,
}

/// Per-seat power-up counters. Decremented on use, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PowerUps {
    pub reveal_letter: u8,
    pub skip_word: u8,
    pub freeze_opponent: u8,
}

impl Default for PowerUps {
    fn default() -> Self {
        Self {
            reveal_letter: 1,
            skip_word: 1,
            freeze_opponent: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerState {
    pub score: i32, // Can go negative, no floor
    pub is_ready: bool,
    pub power_ups: PowerUps,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            score: 0,
            is_ready: false,
            power_ups: PowerUps::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Seat {
    pub seat: SeatId,
    pub player_id: PlayerId,
    pub display_name: String,
    pub state: PlayerState,
}

/// A seat's recorded answer outcome for the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub answer_time: String, // ISO 8601 string
    pub answer_time_seconds: u32,
    pub speed_bonus: i32,
    pub points_delta: i32,
    pub selected_index: Option<usize>,
    pub timed_out: bool,
    pub skipped: bool,
}

/// Most recent single-seat answer event. Diagnostic view only; the
/// authoritative per-round record is `question_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MoveRecord {
    pub seat: SeatId,
    pub player_id: PlayerId,
    pub round: u32,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Winner {
    Seat(SeatId),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub player_id: PlayerId,
    pub display_name: String,
    pub text: String,
    pub sent_at: String, // ISO 8601 string
}

/// The authoritative shared game record. All coordination between polling
/// clients goes through this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub current_round: u32, // 0-based
    pub max_rounds: u32,
    pub current_word: Option<WordChallenge>,
    pub seats: Vec<Seat>,
    /// Cleared exactly when a round transition occurs; at most one entry
    /// per seat per round.
    pub question_results: HashMap<SeatId, AnswerOutcome>,
    pub last_move: Option<MoveRecord>,
    pub winner: Option<Winner>,
    /// Wall clock at which the current round's timer began.
    pub timer_start_time: Option<String>, // ISO 8601 string
    /// Seconds allotted for the current round at start. Remaining time is
    /// always derived from this and `timer_start_time`, never counted down
    /// in place.
    pub time_left: u32,
    pub chat_messages: Vec<ChatMessage>,
    pub created_at: String, // ISO 8601 string
    pub updated_at: String, // ISO 8601 string
}

impl Game {
    pub fn seat_of(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }

    pub fn seat_of_mut(&mut self, player_id: PlayerId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.player_id == player_id)
    }

    pub fn filled_seats(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= SeatId::ALL.len()
    }
}

/// Safe version of [`Game`] with the active challenge's answer key
/// redacted. This is what poll responses carry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SafeGame {
    pub id: GameId,
    pub status: GameStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub current_word: Option<SafeChallenge>,
    pub seats: Vec<Seat>,
    pub question_results: HashMap<SeatId, AnswerOutcome>,
    pub last_move: Option<MoveRecord>,
    pub winner: Option<Winner>,
    pub timer_start_time: Option<String>,
    pub time_left: u32,
    pub chat_messages: Vec<ChatMessage>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Game> for SafeGame {
    fn from(game: &Game) -> Self {
        SafeGame {
            id: game.id,
            status: game.status,
            current_round: game.current_round,
            max_rounds: game.max_rounds,
            current_word: game.current_word.as_ref().map(SafeChallenge::from),
            seats: game.seats.clone(),
            question_results: game.question_results.clone(),
            last_move: game.last_move.clone(),
            winner: game.winner,
            timer_start_time: game.timer_start_time.clone(),
            time_left: game.time_left,
            chat_messages: game.chat_messages.clone(),
            created_at: game.created_at.clone(),
            updated_at: game.updated_at.clone(),
        }
    }
}
