use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warp::Filter;
use warp::http::StatusCode;

use clash_types::{
    AnswerOutcome, AnswerPayload, CommandError, GameId, PlayerId, PowerUpKind, SafeGame,
};

use crate::registry::SessionRegistry;

pub mod config;
pub mod rate_limiter;
pub mod registry;
pub mod stats;

#[derive(Deserialize)]
struct CreateGameRequest {
    player_id: PlayerId,
    display_name: String,
    #[serde(default)]
    max_rounds: Option<u32>,
}

#[derive(Deserialize)]
struct JoinRequest {
    player_id: PlayerId,
    display_name: String,
}

#[derive(Deserialize)]
struct PlayerRequest {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct MoveRequest {
    player_id: PlayerId,
    round: u32,
    answer: AnswerPayload,
}

#[derive(Deserialize)]
struct NextRoundRequest {
    player_id: PlayerId,
    round: u32,
}

#[derive(Deserialize)]
struct PowerUpRequest {
    player_id: PlayerId,
    kind: PowerUpKind,
}

#[derive(Deserialize)]
struct ChatRequest {
    player_id: PlayerId,
    text: String,
}

#[derive(Serialize)]
struct MoveResponse {
    outcome: AnswerOutcome,
    game: SafeGame,
}

pub fn create_routes(
    registry: Arc<SessionRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let create_game = warp::path!("game")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_create_game);

    let join_game = warp::path!("game" / String / "join")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_join);

    let ready = warp::path!("game" / String / "ready")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_ready);

    let start = warp::path!("game" / String / "start")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_start);

    let submit_move = warp::path!("game" / String / "move")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_move);

    let next_round = warp::path!("game" / String / "next-round")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_next_round);

    let power_up = warp::path!("game" / String / "power-up")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_power_up);

    let chat = warp::path!("game" / String / "chat")
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_chat);

    // Polling endpoint; clients hit this every couple of seconds.
    let game_state = warp::path!("game" / String)
        .and(warp::get())
        .and(registry_filter.clone())
        .and_then(handle_game_state);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(create_game)
        .or(join_game)
        .or(ready)
        .or(start)
        .or(submit_move)
        .or(next_round)
        .or(power_up)
        .or(chat)
        .or(game_state)
        .with(cors)
        .with(warp::log("clash_server"))
}

type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

fn json_ok<T: Serialize>(value: &T) -> JsonReply {
    warp::reply::with_status(warp::reply::json(value), StatusCode::OK)
}

fn error_response(err: &CommandError) -> JsonReply {
    let status = match err {
        CommandError::Validation { .. } => StatusCode::BAD_REQUEST,
        CommandError::GameNotFound { .. } | CommandError::SeatNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        CommandError::Conflict { .. } | CommandError::StaleRound { .. } => StatusCode::CONFLICT,
        CommandError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    };
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "code": err.code(),
            "message": err.to_string(),
        })),
        status,
    )
}

fn parse_game_id(raw: &str) -> Result<GameId, JsonReply> {
    Uuid::parse_str(raw).map_err(|_| {
        error_response(&CommandError::validation("invalid game ID format"))
    })
}

fn check_limit(
    registry: &SessionRegistry,
    game_id: GameId,
    player_id: PlayerId,
) -> Result<(), JsonReply> {
    registry
        .check_rate_limit(game_id, player_id)
        .map_err(|err| error_response(&err))
}

async fn handle_create_game(
    body: CreateGameRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    match registry.create_game(body.player_id, body.display_name, body.max_rounds) {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_join(
    game_id: String,
    body: JoinRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry
        .join_game(game_id, body.player_id, body.display_name)
        .await
    {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_ready(
    game_id: String,
    body: PlayerRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry.mark_ready(game_id, body.player_id).await {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_start(
    game_id: String,
    body: PlayerRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry.start_game(game_id, body.player_id).await {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_move(
    game_id: String,
    body: MoveRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry
        .submit_move(game_id, body.player_id, body.round, &body.answer)
        .await
    {
        Ok((outcome, game)) => Ok(json_ok(&MoveResponse { outcome, game })),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_next_round(
    game_id: String,
    body: NextRoundRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry
        .advance_round(game_id, body.player_id, body.round)
        .await
    {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_power_up(
    game_id: String,
    body: PowerUpRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry.use_power_up(game_id, body.player_id, body.kind).await {
        Ok((effect, game)) => {
            let effect = match effect {
                clash_core::session::PowerUpEffect::LetterRevealed(letter) => {
                    serde_json::json!({ "kind": "letter_revealed", "letter": letter })
                }
                clash_core::session::PowerUpEffect::WordSkipped => {
                    serde_json::json!({ "kind": "word_skipped" })
                }
                clash_core::session::PowerUpEffect::OpponentFrozen => {
                    serde_json::json!({ "kind": "opponent_frozen" })
                }
            };
            Ok(json_ok(&serde_json::json!({ "effect": effect, "game": game })))
        }
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_chat(
    game_id: String,
    body: ChatRequest,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if let Err(reply) = check_limit(&registry, game_id, body.player_id) {
        return Ok(reply);
    }
    match registry.append_chat(game_id, body.player_id, body.text).await {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_game_state(
    game_id: String,
    registry: Arc<SessionRegistry>,
) -> Result<JsonReply, warp::Rejection> {
    let game_id = match parse_game_id(&game_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    match registry.snapshot(game_id).await {
        Ok(game) => Ok(json_ok(&game)),
        Err(err) => Ok(error_response(&err)),
    }
}
