//! near-state-client: Read-only access to the on-chain state the planner needs
//!
//! The [`AccountStateReader`] trait is the seam between planning code and the
//! RPC transport. Two implementations ship here:
//!
//! - [`CachedStateReader`]: wraps any reader with a short TTL cache that is
//!   explicitly invalidated after a plan completes
//! - [`InMemoryStateReader`]: a mutable snapshot for tests and offline previews
//!
//! [`queries`] composes the single reads into the lockup and token views the
//! planners consume.

pub mod cache;
pub mod memory;
pub mod queries;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use venear_core::{AccountId, Amount, ConversionRate, RpcError, TimestampNs};

pub use cache::CachedStateReader;
pub use memory::{InMemoryStateReader, LockupSnapshot, StateSnapshot};
pub use queries::{get_lockup_overview, get_token_holding, LockupOverview, TokenHolding};

/// Result type for state reads
pub type Result<T> = std::result::Result<T, RpcError>;

/// Liquid (unstaked, unlocked) NEAR held by a lockup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidBalance {
    /// Available for `deposit_and_stake`
    pub stakable: Amount,
    /// Available for transfer back to the owner
    pub withdrawable: Amount,
}

/// Locked principal held by a lockup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalance {
    /// Counts toward voting power
    pub locked: Amount,
    /// Unlock started, not yet completed
    pub pending: Amount,
    /// When `pending` becomes claimable
    pub unlock_timestamp_ns: Option<TimestampNs>,
}

/// Global governance parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Storage deposit for registering the owner account
    pub registration_cost: Amount,
    /// Deposit covering lockup contract deployment
    pub lockup_deployment_cost: Amount,
    /// Delay between `begin_unlock` and `end_unlock`
    pub unlock_duration_ns: u64,
    /// Smallest amount the lockup accepts for locking
    pub min_lockup_deposit: Amount,
}

/// Cache groups invalidated after a plan completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationKey {
    /// Owner native and fungible-token balances
    Balances,
    /// Lockup liquid and lockable balances
    LockupLiquidBalance,
    /// Lockup deployment, pool selection, locked and pending amounts
    LockupState,
    /// Governance power of the owner
    VotingPower,
    /// Owner registration with the governance contract
    AccountRegistration,
    /// LST conversion rates and pool minimums
    TokenRates,
    /// Global governance parameters
    GovernanceConfig,
}

impl InvalidationKey {
    /// Keys invalidated after each confirmed plan step
    pub const AFTER_PLAN: [InvalidationKey; 5] = [
        Self::Balances,
        Self::LockupLiquidBalance,
        Self::LockupState,
        Self::VotingPower,
        Self::AccountRegistration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balances => "balances",
            Self::LockupLiquidBalance => "lockup_liquid_balance",
            Self::LockupState => "lockup_state",
            Self::VotingPower => "voting_power",
            Self::AccountRegistration => "account_registration",
            Self::TokenRates => "token_rates",
            Self::GovernanceConfig => "governance_config",
        }
    }
}

/// Read-only chain queries consumed by the planner.
///
/// Implementations MUST NOT mutate chain state and MUST NOT retry internally.
#[async_trait]
pub trait AccountStateReader: Send + Sync {
    /// Whether the owner has a storage registration with the governance contract
    async fn is_account_registered(&self, account_id: &AccountId) -> Result<bool>;

    /// Deterministic lockup account id for an owner
    async fn get_lockup_account_id(&self, account_id: &AccountId) -> Result<AccountId>;

    async fn is_lockup_deployed(&self, lockup_id: &AccountId) -> Result<bool>;

    async fn get_selected_staking_pool(&self, lockup_id: &AccountId)
        -> Result<Option<AccountId>>;

    async fn get_liquid_lockup_balance(&self, lockup_id: &AccountId) -> Result<LiquidBalance>;

    /// Balance the lockup can lock right now
    async fn get_lockable_balance(&self, lockup_id: &AccountId) -> Result<Amount>;

    async fn get_locked_balance(&self, lockup_id: &AccountId) -> Result<LockedBalance>;

    /// Native value per token unit; `None` while the rate is unavailable
    async fn get_conversion_rate(&self, token_id: &AccountId) -> Result<Option<ConversionRate>>;

    /// Pool-specific minimum deposit for a token, when the pool publishes one
    async fn get_minimum_deposit(&self, token_id: &AccountId) -> Result<Option<Amount>>;

    async fn get_native_balance(&self, account_id: &AccountId) -> Result<Amount>;

    async fn get_token_balance(&self, token_id: &AccountId, account_id: &AccountId)
        -> Result<Amount>;

    async fn get_voting_power(&self, account_id: &AccountId) -> Result<Amount>;

    async fn get_governance_config(&self) -> Result<GovernanceConfig>;

    /// Drop cached reads for the given groups. Uncached readers ignore this.
    async fn invalidate(&self, _keys: &[InvalidationKey]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_key_serialization() {
        let json = serde_json::to_string(&InvalidationKey::LockupLiquidBalance).unwrap();
        assert_eq!(json, "\"lockup_liquid_balance\"");
        assert_eq!(InvalidationKey::VotingPower.as_str(), "voting_power");
    }

    #[test]
    fn test_after_plan_keys_cover_balances_and_power() {
        let keys = InvalidationKey::AFTER_PLAN;
        assert!(keys.contains(&InvalidationKey::Balances));
        assert!(keys.contains(&InvalidationKey::LockupLiquidBalance));
        assert!(keys.contains(&InvalidationKey::VotingPower));
        assert!(!keys.contains(&InvalidationKey::TokenRates));
    }
}
