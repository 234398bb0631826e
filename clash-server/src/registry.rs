use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use clash_core::advance::{AdvanceOutcome, RoundAdvancer};
use clash_core::question_bank::QuestionBank;
use clash_core::session::{GameSession, GameSettings, PowerUpEffect};
use clash_types::{
    AnswerOutcome, AnswerPayload, CommandError, GameId, PlayerId, PowerUpKind, SafeGame,
};

use crate::config::Config;
use crate::rate_limiter::RateLimiter;
use crate::stats;

/// Holds every live game behind its own mutex. All round mutations for one
/// game serialize on that mutex; the registry map itself is sharded.
pub struct SessionRegistry {
    games: DashMap<GameId, Arc<Mutex<GameSession>>>,
    limiters: DashMap<(GameId, PlayerId), RateLimiter>,
    settings: GameSettings,
    rate_limit_tokens: u32,
    rate_limit_refill: Duration,
    stats_endpoint: Option<String>,
}

impl SessionRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            games: DashMap::new(),
            limiters: DashMap::new(),
            settings: GameSettings {
                max_rounds: config.max_rounds,
                fuzzy: config.fuzzy(),
                ..GameSettings::default()
            },
            rate_limit_tokens: config.rate_limit_tokens,
            rate_limit_refill: Duration::from_secs(config.rate_limit_refill_seconds),
            stats_endpoint: config.stats_endpoint.clone(),
        }
    }

    #[cfg(test)]
    pub fn new_for_tests(settings: GameSettings) -> Self {
        Self {
            games: DashMap::new(),
            limiters: DashMap::new(),
            settings,
            rate_limit_tokens: 1000,
            rate_limit_refill: Duration::from_secs(1),
            stats_endpoint: None,
        }
    }

    /// Per-player token bucket, scoped to the game so a player's traffic in
    /// one game cannot starve another.
    pub fn check_rate_limit(&self, game_id: GameId, player_id: PlayerId) -> Result<(), CommandError> {
        let mut limiter = self
            .limiters
            .entry((game_id, player_id))
            .or_insert_with(|| {
                RateLimiter::new_with_limits(self.rate_limit_tokens, self.rate_limit_refill)
            });
        if limiter.check_rate_limit() {
            Ok(())
        } else {
            Err(CommandError::RateLimited)
        }
    }

    pub fn create_game(
        &self,
        player_id: PlayerId,
        display_name: String,
        max_rounds: Option<u32>,
    ) -> Result<SafeGame, CommandError> {
        let mut settings = self.settings.clone();
        if let Some(rounds) = max_rounds {
            if rounds == 0 {
                return Err(CommandError::validation("max_rounds must be at least 1"));
            }
            settings.max_rounds = rounds;
        }
        self.insert_session(player_id, display_name, settings, QuestionBank::builtin())
    }

    pub fn create_game_with_bank(
        &self,
        player_id: PlayerId,
        display_name: String,
        bank: QuestionBank,
    ) -> Result<SafeGame, CommandError> {
        self.insert_session(player_id, display_name, self.settings.clone(), bank)
    }

    fn insert_session(
        &self,
        player_id: PlayerId,
        display_name: String,
        settings: GameSettings,
        bank: QuestionBank,
    ) -> Result<SafeGame, CommandError> {
        let now = Utc::now();
        let game_id = uuid::Uuid::new_v4();
        let session = GameSession::create(game_id, player_id, display_name, settings, bank, now);
        let snapshot = SafeGame::from(&session.state);
        self.games.insert(game_id, Arc::new(Mutex::new(session)));
        Ok(snapshot)
    }

    pub async fn join_game(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        display_name: String,
    ) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        session.join(player_id, display_name, Utc::now())?;
        Ok(self.render(&session))
    }

    pub async fn mark_ready(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        session.set_ready(player_id, Utc::now())?;
        Ok(self.render(&session))
    }

    pub async fn start_game(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        if session.state.seat_of(player_id).is_none() {
            return Err(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            });
        }
        session.start(Utc::now())?;
        Ok(self.render(&session))
    }

    /// Submit an answer, then attempt advancement for that round so a full
    /// round closes on its last answer instead of waiting for a poll.
    pub async fn submit_move(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        round: u32,
        answer: &AnswerPayload,
    ) -> Result<(AnswerOutcome, SafeGame), CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        let now = Utc::now();
        let outcome = session.submit_move(player_id, round, answer, now)?;
        let advanced = RoundAdvancer::try_advance(&mut session, round, now);
        self.after_advance(&session, advanced);
        Ok((outcome, self.render(&session)))
    }

    /// Poll-driven advancement for a specific round. Idempotent; racing
    /// clients all see the state the winner of the race produced.
    pub async fn advance_round(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        round: u32,
    ) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        if session.state.seat_of(player_id).is_none() {
            return Err(CommandError::SeatNotFound {
                player_id: player_id.to_string(),
            });
        }
        let advanced = RoundAdvancer::try_advance(&mut session, round, Utc::now());
        self.after_advance(&session, advanced);
        Ok(self.render(&session))
    }

    pub async fn use_power_up(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        kind: PowerUpKind,
    ) -> Result<(PowerUpEffect, SafeGame), CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        let now = Utc::now();
        let effect = session.use_power_up(player_id, kind, now)?;
        // A skip can be the round's last outstanding answer.
        let round = session.state.current_round;
        let advanced = RoundAdvancer::try_advance(&mut session, round, now);
        self.after_advance(&session, advanced);
        Ok((effect, self.render(&session)))
    }

    pub async fn append_chat(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        text: String,
    ) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        session.append_chat(player_id, text, Utc::now())?;
        Ok(self.render(&session))
    }

    /// Redacted snapshot for polling clients. Also sweeps the current
    /// round, so an abandoned game drifts forward on reads alone.
    pub async fn snapshot(&self, game_id: GameId) -> Result<SafeGame, CommandError> {
        let session = self.get_session(game_id)?;
        let mut session = session.lock().await;
        let round = session.state.current_round;
        let advanced = RoundAdvancer::try_advance(&mut session, round, Utc::now());
        self.after_advance(&session, advanced);
        Ok(self.render(&session))
    }

    /// Drop games idle past the timeout, along with their rate limiters.
    pub async fn cleanup_expired_games(&self, timeout: chrono::Duration) -> usize {
        let now = Utc::now();
        // Snapshot the handles first so no map guard is held across a
        // session lock await.
        let sessions: Vec<(GameId, Arc<Mutex<GameSession>>)> = self
            .games
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut expired = Vec::new();
        for (game_id, session) in sessions {
            if session.lock().await.is_expired(timeout, now) {
                expired.push(game_id);
            }
        }

        for game_id in &expired {
            self.games.remove(game_id);
            info!(%game_id, "removed expired game");
        }
        // Also reclaims buckets created for game ids that never existed;
        // commands rate-limit before the game lookup.
        self.limiters
            .retain(|(game_id, _), _| self.games.contains_key(game_id));
        expired.len()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    #[cfg(test)]
    pub fn limiter_count(&self) -> usize {
        self.limiters.len()
    }

    fn get_session(&self, game_id: GameId) -> Result<Arc<Mutex<GameSession>>, CommandError> {
        self.games
            .get(&game_id)
            .map(|entry| entry.value().clone())
            .ok_or(CommandError::GameNotFound {
                game_id: game_id.to_string(),
            })
    }

    /// Snapshots carry the allotted round duration untouched; clients
    /// derive the countdown from it and `timer_start_time` themselves, so
    /// every observer computes the same value no matter when it polls.
    fn render(&self, session: &GameSession) -> SafeGame {
        SafeGame::from(&session.state)
    }

    fn after_advance(&self, session: &GameSession, outcome: AdvanceOutcome) {
        if outcome == AdvanceOutcome::Finished {
            debug!(game_id = %session.state.id, "reporting finished game");
            stats::report_game_finished(self.stats_endpoint.clone(), &session.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clash_types::{ChallengePayload, GameStatus, WordChallenge};
    use uuid::Uuid;

    fn registry() -> SessionRegistry {
        SessionRegistry::new_for_tests(GameSettings {
            max_rounds: 1,
            ..GameSettings::default()
        })
    }

    fn scripted_bank() -> QuestionBank {
        QuestionBank::scripted(vec![WordChallenge::new(
            "cat",
            ChallengePayload::Dictation {
                sentence: "The cat is big.".into(),
            },
        )])
    }

    #[tokio::test]
    async fn test_create_join_and_snapshot() {
        let registry = registry();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let created = registry
            .create_game_with_bank(alice, "Alice".into(), scripted_bank())
            .unwrap();
        assert_eq!(created.status, GameStatus::Waiting);
        assert_eq!(registry.game_count(), 1);

        let joined = registry.join_game(created.id, bob, "Bob".into()).await.unwrap();
        assert_eq!(joined.seats.len(), 2);

        let snapshot = registry.snapshot(created.id).await.unwrap();
        assert_eq!(snapshot.id, created.id);
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let registry = registry();
        let result = registry.snapshot(Uuid::new_v4()).await;
        assert!(matches!(result, Err(CommandError::GameNotFound { .. })));
    }

    #[tokio::test]
    async fn test_full_game_through_registry() {
        let registry = registry();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let game = registry
            .create_game_with_bank(alice, "Alice".into(), scripted_bank())
            .unwrap();
        registry.join_game(game.id, bob, "Bob".into()).await.unwrap();
        registry.mark_ready(game.id, alice).await.unwrap();
        let started = registry.mark_ready(game.id, bob).await.unwrap();
        assert_eq!(started.status, GameStatus::Active);
        assert!(started.current_word.is_some());

        let answer = AnswerPayload::Dictation {
            text: "the cat is big".into(),
        };
        let (outcome, _) = registry.submit_move(game.id, alice, 0, &answer).await.unwrap();
        assert!(outcome.is_correct);

        let wrong = AnswerPayload::Dictation {
            text: "totally different words here".into(),
        };
        let (_, snapshot) = registry.submit_move(game.id, bob, 0, &wrong).await.unwrap();

        // Single-round game: the second answer finishes it.
        assert_eq!(snapshot.status, GameStatus::Finished);
        assert!(snapshot.winner.is_some());
    }

    #[tokio::test]
    async fn test_rate_limit_trips_and_reports() {
        let registry = SessionRegistry::new_for_tests(GameSettings::default());
        let game_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();

        // new_for_tests allows 1000 tokens; drain them all.
        for _ in 0..1000 {
            registry.check_rate_limit(game_id, player_id).unwrap();
        }
        assert!(matches!(
            registry.check_rate_limit(game_id, player_id),
            Err(CommandError::RateLimited)
        ));

        // Other players are unaffected.
        assert!(registry.check_rate_limit(game_id, Uuid::new_v4()).is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_keeps_allotted_duration_stable() {
        let registry = registry();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let game = registry
            .create_game_with_bank(alice, "Alice".into(), scripted_bank())
            .unwrap();
        registry.join_game(game.id, bob, "Bob".into()).await.unwrap();
        registry.mark_ready(game.id, alice).await.unwrap();
        registry.mark_ready(game.id, bob).await.unwrap();

        let first = registry.snapshot(game.id).await.unwrap();
        assert_eq!(first.time_left, 20);

        // Clients derive the countdown from timer_start_time; the snapshot
        // field itself must not shrink between polls.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = registry.snapshot(game.id).await.unwrap();
        assert_eq!(second.time_left, 20);
        assert_eq!(second.timer_start_time, first.timer_start_time);
    }

    #[tokio::test]
    async fn test_cleanup_drops_limiters_for_unknown_games() {
        let registry = registry();
        // Commands rate-limit before the game lookup, so buckets appear
        // even for game ids that never existed.
        for _ in 0..5 {
            registry
                .check_rate_limit(Uuid::new_v4(), Uuid::new_v4())
                .unwrap();
        }
        assert_eq!(registry.limiter_count(), 5);

        registry.cleanup_expired_games(chrono::Duration::minutes(30)).await;
        assert_eq!(registry.limiter_count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_games() {
        let registry = registry();
        let alice = Uuid::new_v4();
        registry
            .create_game_with_bank(alice, "Alice".into(), scripted_bank())
            .unwrap();

        let removed = registry.cleanup_expired_games(chrono::Duration::minutes(30)).await;
        assert_eq!(removed, 0);

        // A negative timeout expires everything immediately.
        let removed = registry.cleanup_expired_games(chrono::Duration::seconds(-1)).await;
        assert_eq!(removed, 1);
        assert_eq!(registry.game_count(), 0);
    }
}
