use clash_types::{Seat, Winner};

/// Base points for a correct answer.
pub const CORRECT_BASE_POINTS: i32 = 3;
/// Applied to incorrect answers and timeout defaults. Scores can go
/// negative; there is no floor at zero.
pub const INCORRECT_PENALTY: i32 = -2;

/// Speed bonus tiers for correct answers, from round start to submission.
pub const FAST_TIER_SECS: u32 = 5;
pub const FAST_TIER_BONUS: i32 = 2;
pub const QUICK_TIER_SECS: u32 = 10;
pub const QUICK_TIER_BONUS: i32 = 1;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Bonus points for answering quickly. Only correct answers earn it.
    pub fn speed_bonus(elapsed_seconds: u32) -> i32 {
        if elapsed_seconds <= FAST_TIER_SECS {
            FAST_TIER_BONUS
        } else if elapsed_seconds <= QUICK_TIER_SECS {
            QUICK_TIER_BONUS
        } else {
            0
        }
    }

    /// Point delta and speed bonus for a submitted answer. The bonus is
    /// reported separately so clients can show a "base + bonus" breakdown.
    pub fn score_answer(is_correct: bool, elapsed_seconds: u32) -> (i32, i32) {
        if is_correct {
            let bonus = Self::speed_bonus(elapsed_seconds);
            (CORRECT_BASE_POINTS + bonus, bonus)
        } else {
            (INCORRECT_PENALTY, 0)
        }
    }

    /// Delta for a seat that never answered before the grace deadline.
    pub fn timeout_delta() -> i32 {
        INCORRECT_PENALTY
    }

    /// Winner by final score; ties at the top are a draw.
    pub fn decide_winner(seats: &[Seat]) -> Option<Winner> {
        let top = seats.iter().map(|s| s.state.score).max()?;
        let mut leaders = seats.iter().filter(|s| s.state.score == top);
        let first = leaders.next()?;
        if leaders.next().is_some() {
            Some(Winner::Draw)
        } else {
            Some(Winner::Seat(first.seat))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clash_types::{PlayerState, SeatId};
    use uuid::Uuid;

    fn seat(id: SeatId, score: i32) -> Seat {
        Seat {
            seat: id,
            player_id: Uuid::new_v4(),
            display_name: format!("{id}"),
            state: PlayerState {
                score,
                ..PlayerState::default()
            },
        }
    }

    #[test]
    fn test_correct_answer_in_fastest_tier() {
        let (delta, bonus) = ScoringEngine::score_answer(true, 2);
        assert_eq!(bonus, FAST_TIER_BONUS);
        assert_eq!(delta, CORRECT_BASE_POINTS + FAST_TIER_BONUS);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoringEngine::speed_bonus(FAST_TIER_SECS), FAST_TIER_BONUS);
        assert_eq!(ScoringEngine::speed_bonus(FAST_TIER_SECS + 1), QUICK_TIER_BONUS);
        assert_eq!(ScoringEngine::speed_bonus(QUICK_TIER_SECS), QUICK_TIER_BONUS);
        assert_eq!(ScoringEngine::speed_bonus(QUICK_TIER_SECS + 1), 0);
    }

    #[test]
    fn test_correct_answer_outside_bonus_tiers() {
        let (delta, bonus) = ScoringEngine::score_answer(true, 15);
        assert_eq!(bonus, 0);
        assert_eq!(delta, CORRECT_BASE_POINTS);
    }

    #[test]
    fn test_incorrect_answer_gets_no_speed_bonus() {
        let (delta, bonus) = ScoringEngine::score_answer(false, 1);
        assert_eq!(delta, INCORRECT_PENALTY);
        assert_eq!(bonus, 0);
    }

    #[test]
    fn test_winner_by_score() {
        let seats = vec![seat(SeatId::Player1, 7), seat(SeatId::Player2, -2)];
        assert_eq!(
            ScoringEngine::decide_winner(&seats),
            Some(Winner::Seat(SeatId::Player1))
        );
    }

    #[test]
    fn test_tie_is_a_draw() {
        let seats = vec![
            seat(SeatId::Player1, 5),
            seat(SeatId::Player2, 5),
            seat(SeatId::Player3, 1),
        ];
        assert_eq!(ScoringEngine::decide_winner(&seats), Some(Winner::Draw));
    }

    #[test]
    fn test_negative_scores_still_produce_a_winner() {
        let seats = vec![seat(SeatId::Player1, -2), seat(SeatId::Player2, -6)];
        assert_eq!(
            ScoringEngine::decide_winner(&seats),
            Some(Winner::Seat(SeatId::Player1))
        );
    }

    #[test]
    fn test_no_seats_no_winner() {
        assert_eq!(ScoringEngine::decide_winner(&[]), None);
    }
}
