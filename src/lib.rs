#![deny(missing_docs)]

//! Kamino Lending read model: reserve and obligation economics rebuilt from account state

pub mod action;
pub mod config;
pub mod error;
pub mod market;
pub mod math;
pub mod obligation;
pub mod reserve;
pub mod state;

pub use action::ActionType;
pub use config::LendingConfig;
pub use error::{LendingError, LendingResult};
pub use market::{KaminoMarket, MarketContext};
pub use obligation::{KaminoObligation, ObligationStats, Position};
pub use reserve::KaminoReserve;

// Export current sdk types for downstream users building with a different sdk version
pub use solana_program;
