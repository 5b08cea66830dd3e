//! Error types

use solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Errors that may be returned by the lending read model.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LendingError {
    /// Account bytes could not be decoded into the expected record
    #[error("Invalid account data")]
    InvalidAccountData,

    /// Reserve status code outside of Active/Obsolete/Hidden
    #[error("Invalid reserve status code {0}")]
    InvalidReserveStatus(u8),

    /// Borrow rate curve cannot be evaluated
    #[error("Invalid borrow rate curve: {0}")]
    InvalidBorrowRateCurve(&'static str),

    /// No reserve with this address in the market
    #[error("Reserve {0} not found")]
    ReserveNotFound(Pubkey),

    /// No reserve for this liquidity mint in the market
    #[error("Reserve for mint {0} not found")]
    ReserveNotFoundForMint(Pubkey),

    /// Obligation has no deposit in this reserve
    #[error("Deposit in reserve {0} not found")]
    DepositNotFound(Pubkey),

    /// Obligation has no borrow in this reserve
    #[error("Borrow in reserve {0} not found")]
    BorrowNotFound(Pubkey),

    /// Obligation elevation group is not supported by the target reserve
    #[error(
        "Obligation elevation group {elevation_group} is not supported by reserve {reserve}, downgrade the obligation first"
    )]
    InconsistentElevationGroup {
        /// Elevation group of the obligation
        elevation_group: u8,
        /// Reserve the action targets
        reserve: Pubkey,
    },

    /// Action tag is unknown or not allowed here
    #[error("Invalid action type: {0}")]
    InvalidActionType(String),

    /// A composite action is missing one of its amounts
    #[error("Action {action} requires {parameter}")]
    MissingActionParameter {
        /// Action tag
        action: String,
        /// Name of the missing parameter
        parameter: &'static str,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate
pub type LendingResult<T> = Result<T, LendingError>;
