//! PennyLab Runner — headless orchestration over `pennylab-core`.
//!
//! This crate is the stand-in for the UI/store layer the engine expects
//! around it:
//! - Multi-round game shell (players, phases, round advancement)
//! - Fixed-step session driver with pause/resume and speed multipliers
//! - Results assembly and JSON export

pub mod driver;
pub mod game;

pub use driver::{DriverError, SessionDriver, TickPacer};
pub use game::{Game, GameError, GamePhase, RoundResults};

use anyhow::Context;
use pennylab_core::SessionConfig;

/// Run one full session headlessly: parse the config, seed a game with one
/// player, drive it to completion, and return the scored results.
pub fn run_headless_from_toml(
    config_toml: &str,
    master_seed: u64,
    player_name: &str,
) -> anyhow::Result<RoundResults> {
    let config = SessionConfig::from_toml_str(config_toml).context("loading session config")?;
    let mut game = Game::new(config.clone(), master_seed);
    game.add_player(player_name);
    game.start_round();

    let mut driver = SessionDriver::new(&config);
    driver.run_to_completion(&mut game);

    Ok(game.results())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_run_produces_scored_results() {
        let results = run_headless_from_toml("session_length_ticks = 15", 4, "Ann").unwrap();
        assert_eq!(results.round, 1);
        assert_eq!(results.scores.len(), 1);
        // No trades: flat PnL, level 1
        assert_eq!(results.scores[0].pnl, 0.0);
        assert_eq!(results.scores[0].level, 1);
    }

    #[test]
    fn bad_config_surfaces_with_context() {
        let err = run_headless_from_toml("session_length_ticks = 0", 4, "Ann").unwrap_err();
        assert!(format!("{err:#}").contains("loading session config"));
    }

    #[test]
    fn results_serialize_to_json() {
        let results = run_headless_from_toml("session_length_ticks = 10", 4, "Ann").unwrap();
        let json = results.to_json().unwrap();
        assert!(json.contains("\"round\":1"));
        assert!(json.contains("\"scores\""));
    }
}
