//! Plan steps
//!
//! Each [`Operation`] maps to exactly one signed call. Amounts that must be
//! resolved at execution time are carried as caps rather than final values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use venear_core::{AccountId, Amount};

/// Operation kinds, in the order they may appear in a lock plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    DeployLockup,
    TransferNative,
    TransferToken,
    SelectStakingPool,
    RefreshBalance,
    LockNear,
    BeginUnlock,
    EndUnlock,
    LockPending,
    WithdrawToOwner,
    DepositAndStake,
    Unstake,
    WithdrawAllFromStakingPool,
}

/// Error returned when parsing an `OperationKind` from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationKindParseError(pub String);

impl fmt::Display for OperationKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operation kind '{}'", self.0)
    }
}

impl std::error::Error for OperationKindParseError {}

impl OperationKind {
    pub const ALL: [OperationKind; 13] = [
        Self::DeployLockup,
        Self::TransferNative,
        Self::TransferToken,
        Self::SelectStakingPool,
        Self::RefreshBalance,
        Self::LockNear,
        Self::BeginUnlock,
        Self::EndUnlock,
        Self::LockPending,
        Self::WithdrawToOwner,
        Self::DepositAndStake,
        Self::Unstake,
        Self::WithdrawAllFromStakingPool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeployLockup => "deploy_lockup",
            Self::TransferNative => "transfer_native",
            Self::TransferToken => "transfer_token",
            Self::SelectStakingPool => "select_staking_pool",
            Self::RefreshBalance => "refresh_balance",
            Self::LockNear => "lock_near",
            Self::BeginUnlock => "begin_unlock",
            Self::EndUnlock => "end_unlock",
            Self::LockPending => "lock_pending",
            Self::WithdrawToOwner => "withdraw_to_owner",
            Self::DepositAndStake => "deposit_and_stake",
            Self::Unstake => "unstake",
            Self::WithdrawAllFromStakingPool => "withdraw_all_from_staking_pool",
        }
    }
}

impl FromStr for OperationKind {
    type Err = OperationKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OperationKindParseError(s.to_string()))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a plan with the arguments for its signed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Register the owner and deploy the lockup in one call
    DeployLockup {
        registration_deposit: Amount,
        deployment_deposit: Amount,
    },
    TransferNative {
        lockup_id: AccountId,
        amount: Amount,
    },
    /// `ft_transfer_call` of a liquid staking token into the lockup
    TransferToken {
        token_id: AccountId,
        lockup_id: AccountId,
        amount: Amount,
    },
    SelectStakingPool {
        lockup_id: AccountId,
        pool_id: AccountId,
    },
    /// Reconcile the lockup's tracked pool balance after a token transfer
    RefreshBalance { lockup_id: AccountId },
    /// Lock `min(lockable balance at execution time, cap)`
    LockNear { lockup_id: AccountId, cap: Amount },
    /// `None` unlocks the full locked balance
    BeginUnlock {
        lockup_id: AccountId,
        amount: Option<Amount>,
    },
    EndUnlock {
        lockup_id: AccountId,
        amount: Option<Amount>,
    },
    /// Re-lock principal whose unlock is still pending
    LockPending {
        lockup_id: AccountId,
        amount: Option<Amount>,
    },
    WithdrawToOwner {
        lockup_id: AccountId,
        amount: Amount,
    },
    DepositAndStake {
        lockup_id: AccountId,
        amount: Amount,
    },
    Unstake {
        lockup_id: AccountId,
        amount: Option<Amount>,
    },
    WithdrawAllFromStakingPool { lockup_id: AccountId },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::DeployLockup { .. } => OperationKind::DeployLockup,
            Self::TransferNative { .. } => OperationKind::TransferNative,
            Self::TransferToken { .. } => OperationKind::TransferToken,
            Self::SelectStakingPool { .. } => OperationKind::SelectStakingPool,
            Self::RefreshBalance { .. } => OperationKind::RefreshBalance,
            Self::LockNear { .. } => OperationKind::LockNear,
            Self::BeginUnlock { .. } => OperationKind::BeginUnlock,
            Self::EndUnlock { .. } => OperationKind::EndUnlock,
            Self::LockPending { .. } => OperationKind::LockPending,
            Self::WithdrawToOwner { .. } => OperationKind::WithdrawToOwner,
            Self::DepositAndStake { .. } => OperationKind::DepositAndStake,
            Self::Unstake { .. } => OperationKind::Unstake,
            Self::WithdrawAllFromStakingPool { .. } => OperationKind::WithdrawAllFromStakingPool,
        }
    }

    /// Human-readable step description for progress display
    pub fn label(&self) -> String {
        match self {
            Self::DeployLockup { .. } => "Register and deploy lockup".to_string(),
            Self::TransferNative { .. } => "Transfer NEAR to lockup".to_string(),
            Self::TransferToken { token_id, .. } => format!("Transfer {} to lockup", token_id),
            Self::SelectStakingPool { pool_id, .. } => {
                format!("Select staking pool {}", pool_id)
            }
            Self::RefreshBalance { .. } => "Refresh lockup pool balance".to_string(),
            Self::LockNear { .. } => "Lock NEAR".to_string(),
            Self::BeginUnlock { .. } => "Begin unlock".to_string(),
            Self::EndUnlock { .. } => "Complete unlock".to_string(),
            Self::LockPending { .. } => "Re-lock pending NEAR".to_string(),
            Self::WithdrawToOwner { .. } => "Withdraw NEAR to wallet".to_string(),
            Self::DepositAndStake { .. } => "Stake NEAR".to_string(),
            Self::Unstake { .. } => "Unstake NEAR".to_string(),
            Self::WithdrawAllFromStakingPool { .. } => {
                "Withdraw from staking pool".to_string()
            }
        }
    }
}

/// Step kinds of a plan, used to detect a plan that changed shape
pub fn plan_shape(steps: &[Operation]) -> Vec<OperationKind> {
    steps.iter().map(Operation::kind).collect()
}
