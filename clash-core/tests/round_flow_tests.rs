mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use clash_core::advance::{AdvanceOutcome, RoundAdvancer};
use clash_core::question_bank::QuestionBank;
use clash_core::timer;
use clash_types::{GameStatus, SeatId, Winner};

use common::{dictation_answer, dictation_challenge, started_session};

#[test]
fn test_single_round_game_with_timeout_default() {
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let bank = QuestionBank::scripted(vec![dictation_challenge("The cat is big.")]);
    let mut session = started_session(&[(alice, "Alice"), (bob, "Bob")], 1, bank, now);

    assert_eq!(session.state.status, GameStatus::Active);
    assert_eq!(session.state.time_left, timer::BASE_ROUND_SECS);

    // Alice answers correctly inside the fastest bonus tier; Bob stays
    // silent for the whole round.
    let answered_at = now + Duration::seconds(3);
    let outcome = session
        .submit_move(alice, 0, &dictation_answer("the cat is big"), answered_at)
        .unwrap();
    assert_eq!(outcome.points_delta, 5);

    // One answer in, the round stays open through the grace period.
    assert_eq!(
        RoundAdvancer::try_advance(&mut session, 0, answered_at),
        AdvanceOutcome::NotReady
    );
    let at_expiry = now + Duration::seconds(timer::BASE_ROUND_SECS as i64);
    assert_eq!(session.remaining_time(at_expiry), 0);
    assert_eq!(
        RoundAdvancer::try_advance(&mut session, 0, at_expiry),
        AdvanceOutcome::NotReady
    );

    // Past the grace deadline a poll-driven sweep closes the game.
    let past_deadline =
        at_expiry + Duration::seconds(session.settings.grace_secs as i64);
    assert_eq!(
        RoundAdvancer::try_advance(&mut session, 0, past_deadline),
        AdvanceOutcome::Finished
    );

    assert_eq!(session.state.status, GameStatus::Finished);
    assert_eq!(session.state.winner, Some(Winner::Seat(SeatId::Player1)));
    assert_eq!(session.state.seat_of(alice).unwrap().state.score, 5);
    assert_eq!(session.state.seat_of(bob).unwrap().state.score, -2);
    assert!(session.state.current_word.is_none());

    // Bob's late submission is rejected and changes nothing.
    let late = session.submit_move(bob, 0, &dictation_answer("the cat is big"), past_deadline);
    assert!(late.is_err());
    assert_eq!(session.state.seat_of(bob).unwrap().state.score, -2);
}

#[test]
fn test_three_seat_round_advances_on_last_answer() {
    let now = Utc::now();
    let players: Vec<_> = ["Alice", "Bob", "Cara"]
        .iter()
        .map(|&name| (Uuid::new_v4(), name))
        .collect();
    let bank = QuestionBank::scripted(vec![
        dictation_challenge("The cat is big."),
        dictation_challenge("She opened the window."),
    ]);
    let mut session = started_session(&players, 2, bank, now);

    // First two answers leave the round open; the third closes it the way
    // the server does, by attempting advancement after every move.
    for (i, &(player_id, _)) in players.iter().enumerate() {
        let at = now + Duration::seconds(2 + i as i64);
        session
            .submit_move(player_id, 0, &dictation_answer("the cat is big"), at)
            .unwrap();
        let expected = if i < 2 {
            AdvanceOutcome::NotReady
        } else {
            AdvanceOutcome::Advanced
        };
        assert_eq!(RoundAdvancer::try_advance(&mut session, 0, at), expected);
    }

    assert_eq!(session.state.current_round, 1);
    assert!(session.state.question_results.is_empty());
    let challenge = session.state.current_word.as_ref().unwrap();
    assert_eq!(challenge.word, "word");

    // The fresh round has its own timer; nobody timed out.
    let round_start = session.round_started_at.unwrap();
    assert_eq!(session.remaining_time(round_start), timer::BASE_ROUND_SECS);
    for &(player_id, _) in &players {
        assert!(session.state.seat_of(player_id).unwrap().state.score > 0);
    }
}

#[test]
fn test_scores_accumulate_across_rounds() {
    let now = Utc::now();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let bank = QuestionBank::scripted(vec![
        dictation_challenge("The cat is big."),
        dictation_challenge("She opened the window."),
    ]);
    let mut session = started_session(&[(alice, "Alice"), (bob, "Bob")], 2, bank, now);

    // Round 0: Alice fast and correct, Bob slow and wrong.
    let r0 = now + Duration::seconds(4);
    session
        .submit_move(alice, 0, &dictation_answer("the cat is big"), r0)
        .unwrap();
    session
        .submit_move(
            bob,
            0,
            &dictation_answer("entirely different words here"),
            now + Duration::seconds(12),
        )
        .unwrap();
    assert_eq!(
        RoundAdvancer::try_advance(&mut session, 0, now + Duration::seconds(12)),
        AdvanceOutcome::Advanced
    );

    // Round 1: both correct, outside the bonus tiers.
    let round_start = session.round_started_at.unwrap();
    let r1 = round_start + Duration::seconds(15);
    session
        .submit_move(alice, 1, &dictation_answer("she opened the window"), r1)
        .unwrap();
    session
        .submit_move(bob, 1, &dictation_answer("she opened the window"), r1)
        .unwrap();
    assert_eq!(
        RoundAdvancer::try_advance(&mut session, 1, r1),
        AdvanceOutcome::Finished
    );

    // Alice: (3+2) + 3 = 8. Bob: -2 + 3 = 1.
    assert_eq!(session.state.seat_of(alice).unwrap().state.score, 8);
    assert_eq!(session.state.seat_of(bob).unwrap().state.score, 1);
    assert_eq!(session.state.winner, Some(Winner::Seat(SeatId::Player1)));
}
