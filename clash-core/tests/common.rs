use chrono::{DateTime, Utc};
use uuid::Uuid;

use clash_core::question_bank::QuestionBank;
use clash_core::session::{GameSession, GameSettings};
use clash_types::{AnswerPayload, ChallengePayload, PlayerId, WordChallenge};

pub fn dictation_challenge(sentence: &str) -> WordChallenge {
    WordChallenge::new(
        "word",
        ChallengePayload::Dictation {
            sentence: sentence.to_string(),
        },
    )
}

pub fn dictation_answer(text: &str) -> AnswerPayload {
    AnswerPayload::Dictation {
        text: text.to_string(),
    }
}

/// Session with the given seats joined and every seat marked ready, which
/// starts round zero at `now`.
pub fn started_session(
    players: &[(PlayerId, &str)],
    max_rounds: u32,
    bank: QuestionBank,
    now: DateTime<Utc>,
) -> GameSession {
    let (first_id, first_name) = players[0];
    let mut session = GameSession::create(
        Uuid::new_v4(),
        first_id,
        first_name.to_string(),
        GameSettings {
            max_rounds,
            ..GameSettings::default()
        },
        bank,
        now,
    );
    for &(player_id, name) in &players[1..] {
        session.join(player_id, name.to_string(), now).unwrap();
    }
    for &(player_id, _) in players {
        session.set_ready(player_id, now).unwrap();
    }
    session
}
