//! State types

mod lending_market;
mod obligation;
mod price;
mod reserve;

pub use lending_market::*;
pub use obligation::*;
pub use price::*;
pub use reserve::*;

use crate::error::{LendingError, LendingResult};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

/// Accounts are created with data zeroed out, so uninitialized state instances
/// will have the version set to 0.
pub const UNINITIALIZED_VERSION: u64 = 0;

/// Number of elevation groups a lending market can define
pub const ELEVATION_GROUPS_COUNT: usize = 32;

/// Elevation group id meaning "no elevation group"
pub const ELEVATION_GROUP_NONE: u8 = 0;

/// Borsh encoded account record, without the account discriminator
pub trait AccountState: BorshSerialize + BorshDeserialize + Sized {
    /// Record name used in logs
    const NAME: &'static str;

    /// Decode a record, every byte must be consumed
    fn unpack(src: &[u8]) -> LendingResult<Self> {
        Self::try_from_slice(src).map_err(|err| {
            log::warn!("Failed to deserialize {}: {}", Self::NAME, err);
            LendingError::InvalidAccountData
        })
    }

    /// Encode a record
    fn pack(&self) -> LendingResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|err| {
            log::warn!("Failed to serialize {}: {}", Self::NAME, err);
            LendingError::InvalidAccountData
        })
    }
}

/// Slot of the last on-chain refresh
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct LastUpdate {
    /// Last slot when updated
    pub slot: u64,
    /// True when marked stale
    pub stale: u8,
    /// Status of the prices used for the last refresh
    pub price_status: u8,
    /// Padding
    pub placeholder: [u8; 6],
}

/// Returns false for the all-zero key marking an unused slot
pub fn is_not_null_pubkey(pubkey: &Pubkey) -> bool {
    *pubkey != Pubkey::default()
}
