//! Assets and account state consumed by the planners

use near_state_client::{GovernanceConfig, LiquidBalance};
use serde::{Deserialize, Serialize};
use venear_core::constants::NEAR_DECIMALS;
use venear_core::{AccountId, Amount, ConversionRate};

use crate::calculator::compute_max_stakable;
use crate::constants::{LOCKUP_NEAR_SYMBOL, NEAR_SYMBOL};

/// Asset discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    NativeCoin,
    LiquidStakingToken,
    LockupHeldCoin,
}

/// A lockable holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    /// NEAR in the owner's wallet, 1:1 with voting power
    NativeCoin { balance: Amount },
    /// Wrapped staked NEAR; `rate` is `None` while the rate is unavailable
    LiquidStakingToken {
        contract_id: AccountId,
        symbol: String,
        decimals: u32,
        balance: Amount,
        rate: Option<ConversionRate>,
    },
    /// NEAR already inside the lockup, lockable without a transfer
    LockupHeldCoin { balance: Amount },
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::NativeCoin { .. } => AssetKind::NativeCoin,
            Self::LiquidStakingToken { .. } => AssetKind::LiquidStakingToken,
            Self::LockupHeldCoin { .. } => AssetKind::LockupHeldCoin,
        }
    }

    pub fn balance(&self) -> &Amount {
        match self {
            Self::NativeCoin { balance }
            | Self::LiquidStakingToken { balance, .. }
            | Self::LockupHeldCoin { balance } => balance,
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Self::LiquidStakingToken { decimals, .. } => *decimals,
            _ => NEAR_DECIMALS,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::NativeCoin { .. } => NEAR_SYMBOL,
            Self::LiquidStakingToken { symbol, .. } => symbol,
            Self::LockupHeldCoin { .. } => LOCKUP_NEAR_SYMBOL,
        }
    }

    /// Token contract for wrapped tokens
    pub fn contract_id(&self) -> Option<&AccountId> {
        match self {
            Self::LiquidStakingToken { contract_id, .. } => Some(contract_id),
            _ => None,
        }
    }
}

/// Snapshot of the owner's governance onboarding and lockup state.
///
/// Re-read before every planning pass; never stored inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub owner_id: AccountId,
    pub lockup_id: AccountId,
    pub is_registered: bool,
    pub is_lockup_deployed: bool,
    pub selected_staking_pool: Option<AccountId>,
    pub liquid_balance: LiquidBalance,
}

impl AccountState {
    /// State of an owner who has never interacted with governance
    pub fn new_owner(owner_id: AccountId, lockup_id: AccountId) -> Self {
        Self {
            owner_id,
            lockup_id,
            is_registered: false,
            is_lockup_deployed: false,
            selected_staking_pool: None,
            liquid_balance: LiquidBalance::default(),
        }
    }

    /// Registration or lockup deployment is still outstanding
    pub fn needs_onboarding(&self) -> bool {
        !self.is_registered || !self.is_lockup_deployed
    }

    /// The lockup holds liquid NEAR that could be staked directly
    pub fn has_stakable_liquid(&self, dust_threshold: &Amount) -> bool {
        self.is_lockup_deployed
            && !compute_max_stakable(&self.liquid_balance.stakable, dust_threshold).is_zero()
    }
}

/// Inputs to [`crate::build_lock_plan`], passed explicitly rather than read
/// from ambient state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningContext {
    /// `None` until the user picks an asset
    pub asset: Option<Asset>,
    /// Entered amount in the asset's smallest unit; `None` while empty
    pub entered_amount: Option<Amount>,
    pub account: AccountState,
    pub governance: GovernanceConfig,
    /// Onboarding flow: the NEAR deposit is paid out of the entered amount
    pub is_onboarding: bool,
}

impl PlanningContext {
    pub fn new(account: AccountState, governance: GovernanceConfig) -> Self {
        let is_onboarding = account.needs_onboarding();
        Self {
            asset: None,
            entered_amount: None,
            account,
            governance,
            is_onboarding,
        }
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.entered_amount = Some(amount);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountState {
        AccountState::new_owner(
            AccountId::new("alice.near"),
            AccountId::new("alice-near.venear.dao"),
        )
    }

    #[test]
    fn test_asset_accessors() {
        let lst = Asset::LiquidStakingToken {
            contract_id: AccountId::new("meta-pool.near"),
            symbol: "stNEAR".into(),
            decimals: 24,
            balance: Amount::from(9),
            rate: None,
        };
        assert_eq!(lst.kind(), AssetKind::LiquidStakingToken);
        assert_eq!(lst.balance(), &Amount::from(9));
        assert_eq!(lst.symbol(), "stNEAR");
        assert_eq!(lst.contract_id().unwrap().as_str(), "meta-pool.near");

        let held = Asset::LockupHeldCoin {
            balance: Amount::from(1),
        };
        assert_eq!(held.decimals(), NEAR_DECIMALS);
        assert!(held.contract_id().is_none());
    }

    #[test]
    fn test_new_owner_needs_onboarding() {
        let mut state = account();
        assert!(state.needs_onboarding());

        state.is_registered = true;
        assert!(state.needs_onboarding());

        state.is_lockup_deployed = true;
        assert!(!state.needs_onboarding());
    }

    #[test]
    fn test_stakable_liquid_respects_dust() {
        let mut state = account();
        state.is_lockup_deployed = true;
        state.liquid_balance.stakable = Amount::from(5);

        assert!(state.has_stakable_liquid(&Amount::from(5)));
        assert!(!state.has_stakable_liquid(&Amount::from(6)));

        state.is_lockup_deployed = false;
        assert!(!state.has_stakable_liquid(&Amount::from(1)));
    }

    #[test]
    fn test_asset_serializes_with_kind_tag() {
        let asset = Asset::NativeCoin {
            balance: Amount::from(10),
        };
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["kind"], "native_coin");
        assert_eq!(json["balance"], "10");
    }
}
