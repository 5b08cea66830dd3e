//! User actions that can be simulated

use crate::error::LendingError;
use std::{fmt, str::FromStr};

/// Lending action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Deposit liquidity as collateral
    Deposit,
    /// Withdraw collateral as liquidity
    Withdraw,
    /// Borrow liquidity
    Borrow,
    /// Repay debt
    Repay,
    /// Deposit collateral then borrow in one transaction
    DepositAndBorrow,
    /// Repay debt then withdraw collateral in one transaction
    RepayAndWithdraw,
    /// Deposit liquidity for collateral tokens, outside of an obligation
    Mint,
    /// Redeem collateral tokens for liquidity, outside of an obligation
    Redeem,
}

impl ActionType {
    /// Tag as used by clients
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Deposit => "deposit",
            ActionType::Withdraw => "withdraw",
            ActionType::Borrow => "borrow",
            ActionType::Repay => "repay",
            ActionType::DepositAndBorrow => "depositAndBorrow",
            ActionType::RepayAndWithdraw => "repayAndWithdraw",
            ActionType::Mint => "mint",
            ActionType::Redeem => "redeem",
        }
    }
}

impl FromStr for ActionType {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(ActionType::Deposit),
            "withdraw" => Ok(ActionType::Withdraw),
            "borrow" => Ok(ActionType::Borrow),
            "repay" => Ok(ActionType::Repay),
            "depositAndBorrow" => Ok(ActionType::DepositAndBorrow),
            "repayAndWithdraw" => Ok(ActionType::RepayAndWithdraw),
            "mint" => Ok(ActionType::Mint),
            "redeem" => Ok(ActionType::Redeem),
            other => Err(LendingError::InvalidActionType(other.to_string())),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
