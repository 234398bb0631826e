use serde::Serialize;
use tracing::{debug, warn};

use clash_types::{Game, Winner};

#[derive(Debug, Serialize)]
struct GameReport {
    game_id: String,
    winner: Option<String>,
    rounds_played: u32,
    scores: Vec<SeatReport>,
}

#[derive(Debug, Serialize)]
struct SeatReport {
    player_id: String,
    display_name: String,
    score: i32,
}

/// Fire-and-forget post of a finished game's result. Failures are logged
/// and never surface to players; the game outcome is already final.
pub fn report_game_finished(endpoint: Option<String>, game: &Game) {
    let Some(endpoint) = endpoint else {
        debug!(game_id = %game.id, "no stats endpoint configured, skipping report");
        return;
    };

    let report = GameReport {
        game_id: game.id.to_string(),
        winner: game.winner.as_ref().map(|w| match w {
            Winner::Seat(seat) => seat.to_string(),
            Winner::Draw => "draw".to_string(),
        }),
        rounds_played: game.current_round + 1,
        scores: game
            .seats
            .iter()
            .map(|s| SeatReport {
                player_id: s.player_id.to_string(),
                display_name: s.display_name.clone(),
                score: s.state.score,
            })
            .collect(),
    };

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        match client.post(&endpoint).json(&report).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(game_id = %report.game_id, "game result reported");
            }
            Ok(response) => {
                warn!(
                    game_id = %report.game_id,
                    status = %response.status(),
                    "stats endpoint rejected game report"
                );
            }
            Err(err) => {
                warn!(game_id = %report.game_id, error = %err, "failed to report game result");
            }
        }
    });
}
