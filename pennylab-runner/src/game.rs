//! The multi-round game shell.
//!
//! A `Game` owns everything the UI layer would otherwise keep in a store:
//! the engine for the current round, the players, the trade ledger, and the
//! round counter. All mutation funnels through this one owner, which gives
//! the session the single-writer discipline the core expects; callers that
//! need a background session move the whole `Game` onto one worker.

use chrono::{DateTime, Utc};
use pennylab_core::{
    compute_score, default_catalog, evaluate_challenges, init_session, ChallengeProgress,
    IdGen, MarketEngine, Player, PlayerId, PlayerScore, SessionConfig, SessionPhase,
    SessionSeed, Stock, StockId, TickResult, Trade, TradeAction, TradeLedger, TradeRejection,
};
use serde::Serialize;
use thiserror::Error;

/// Where the game is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    Lobby,
    Trading,
    Results,
}

/// Caller misuse and trade outcomes surfaced at the game boundary.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown instrument: {0}")]
    UnknownStock(StockId),

    #[error("trade rejected: {0}")]
    Rejected(#[from] TradeRejection),

    #[error("no trading session is active")]
    NotTrading,

    #[error("round limit reached ({0} rounds)")]
    RoundLimit(u32),
}

/// End-of-round summary for every player.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResults {
    pub round: u32,
    pub scores: Vec<PlayerScore>,
}

impl RoundResults {
    /// Compact JSON, the shape the surrounding application consumes.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One multi-round game.
pub struct Game {
    config: SessionConfig,
    seed: SessionSeed,
    phase: GamePhase,
    round: u32,
    engine: MarketEngine,
    players: Vec<Player>,
    ledger: TradeLedger,
    id_gen: IdGen,
}

impl Game {
    pub fn new(config: SessionConfig, master_seed: u64) -> Self {
        let seed = SessionSeed::new(master_seed);
        let mut id_gen = IdGen::new();
        let stocks = init_session(&default_catalog(), &mut id_gen);
        let engine = MarketEngine::with_rng(stocks, config.clone(), seed.engine_rng(1));
        Self {
            config,
            seed,
            phase: GamePhase::Lobby,
            round: 1,
            engine,
            players: Vec::new(),
            ledger: TradeLedger::new(),
            id_gen,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stocks(&self) -> &[Stock] {
        self.engine.stocks()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn engine(&self) -> &MarketEngine {
        &self.engine
    }

    /// Register a player with the configured starting cash.
    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = self.id_gen.player_id();
        self.players
            .push(Player::new(id, name, self.config.starting_cash));
        id
    }

    /// Open the trading session for the current round.
    pub fn start_round(&mut self) {
        self.engine.start();
        if self.engine.phase() == SessionPhase::Running {
            self.phase = GamePhase::Trading;
        }
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
    }

    /// Advance the session one tick; flips to Results when it completes.
    pub fn step(&mut self) -> TickResult {
        self.step_at(Utc::now())
    }

    pub fn step_at(&mut self, now: DateTime<Utc>) -> TickResult {
        let result = self.engine.tick_at(now);
        if result.session_complete {
            self.phase = GamePhase::Results;
        }
        result
    }

    /// Execute a trade for a player against the live book.
    pub fn execute_trade(
        &mut self,
        player_id: PlayerId,
        stock_id: StockId,
        action: TradeAction,
        quantity: u32,
    ) -> Result<Trade, GameError> {
        self.execute_trade_at(player_id, stock_id, action, quantity, Utc::now())
    }

    pub fn execute_trade_at(
        &mut self,
        player_id: PlayerId,
        stock_id: StockId,
        action: TradeAction,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Trade, GameError> {
        if self.phase != GamePhase::Trading {
            return Err(GameError::NotTrading);
        }
        let marks = self.engine.marks();
        let stock = self
            .engine
            .stock(stock_id)
            .cloned()
            .ok_or(GameError::UnknownStock(stock_id))?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        Ok(self
            .ledger
            .execute(player, &stock, action, quantity, &marks, now)?)
    }

    /// Score every player against the final tape of this round.
    pub fn results(&self) -> RoundResults {
        self.results_at(Utc::now())
    }

    pub fn results_at(&self, now: DateTime<Utc>) -> RoundResults {
        let stocks = self.engine.stocks();
        let scores = self
            .players
            .iter()
            .map(|player| {
                let progresses = evaluate_challenges(player, stocks, now);
                compute_score(
                    player,
                    stocks,
                    self.round,
                    self.config.max_rounds,
                    &progresses,
                    self.config.starting_cash,
                )
            })
            .collect();
        RoundResults {
            round: self.round,
            scores,
        }
    }

    /// Challenge progress for one player, against the live tape.
    pub fn challenges(&self, player_id: PlayerId) -> Result<Vec<ChallengeProgress>, GameError> {
        let player = self
            .player(player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        Ok(evaluate_challenges(player, self.engine.stocks(), Utc::now()))
    }

    /// Move to the next round: fresh instruments, reseeded engine, players
    /// reset to starting cash.
    pub fn next_round(&mut self) -> Result<(), GameError> {
        if self.round >= self.config.max_rounds {
            return Err(GameError::RoundLimit(self.config.max_rounds));
        }
        self.round += 1;
        let stocks = init_session(&default_catalog(), &mut self.id_gen);
        self.engine = MarketEngine::with_rng(
            stocks,
            self.config.clone(),
            self.seed.engine_rng(self.round),
        );
        for player in &mut self.players {
            player.reset(self.config.starting_cash);
        }
        self.phase = GamePhase::Lobby;
        Ok(())
    }
}
