//! Round timer authority. Remaining time is always derived from the round's
//! start instant and allotted duration, never counted down in place, so two
//! observers polling at different instants agree on it.

use chrono::{DateTime, Utc};
use clash_types::{QuestionType, WordChallenge};

/// Base round duration for every question type.
pub const BASE_ROUND_SECS: u32 = 20;
/// Dictation of a sentence the players already had to record gets double
/// time for transcription.
pub const RECORDED_DICTATION_SECS: u32 = 40;
/// Extra wait past timer expiry before timeout defaults are applied, so
/// straggling submissions can still land.
pub const GRACE_PERIOD_SECS: u32 = 3;
/// Interval at which clients are expected to poll the snapshot endpoint.
pub const POLL_INTERVAL_SECS: u64 = 2;

pub fn round_duration(challenge: &WordChallenge) -> u32 {
    match challenge.question_type() {
        QuestionType::Dictation if challenge.was_recorded => RECORDED_DICTATION_SECS,
        _ => BASE_ROUND_SECS,
    }
}

pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    (now - started_at).num_seconds().max(0) as u32
}

pub fn remaining_seconds(started_at: DateTime<Utc>, allotted: u32, now: DateTime<Utc>) -> u32 {
    allotted.saturating_sub(elapsed_seconds(started_at, now))
}

pub fn timer_expired(started_at: DateTime<Utc>, allotted: u32, now: DateTime<Utc>) -> bool {
    remaining_seconds(started_at, allotted, now) == 0
}

/// Once this holds, no further submissions are accepted for the round and
/// missing seats may be auto-scored.
pub fn past_grace_deadline(
    started_at: DateTime<Utc>,
    allotted: u32,
    grace_secs: u32,
    now: DateTime<Utc>,
) -> bool {
    elapsed_seconds(started_at, now) >= allotted + grace_secs
}
