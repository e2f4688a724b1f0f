//! Stake and unstake planning for liquid lockup NEAR
//!
//! A lockup stakes with exactly one pool at a time. Staking selects the pool
//! first when none is selected yet.

use near_state_client::LiquidBalance;
use near_tx::Operation;
use serde::{Deserialize, Serialize};
use venear_core::{AccountId, Amount, ValidationError};

use crate::calculator::compute_max_stakable;

/// Lockup state a staking plan is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingContext {
    pub lockup_id: AccountId,
    pub selected_pool: Option<AccountId>,
    pub liquid: LiquidBalance,
    pub dust_threshold: Amount,
}

impl StakingContext {
    pub fn max_stakable(&self) -> Amount {
        compute_max_stakable(&self.liquid.stakable, &self.dust_threshold)
    }
}

/// Ordered staking steps plus display data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPlan {
    pub steps: Vec<Operation>,
    /// `None` for whole-balance operations
    pub amount: Option<Amount>,
    /// Pool already selected on the lockup when a different one was requested
    pub conflicting_pool: Option<AccountId>,
}

impl StakingPlan {
    fn empty() -> Self {
        Self {
            steps: Vec::new(),
            amount: None,
            conflicting_pool: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Plan staking `amount` of liquid lockup NEAR with `pool_id`.
///
/// Requesting a pool other than the selected one yields an empty plan with
/// `conflicting_pool` set; the lockup must be unstaked and withdrawn first.
pub fn plan_stake(
    ctx: &StakingContext,
    pool_id: &AccountId,
    amount: &Amount,
) -> Result<StakingPlan, ValidationError> {
    let max = ctx.max_stakable();
    if amount > &max {
        return Err(ValidationError::InsufficientFunds {
            requested: amount.clone(),
            available: max,
        });
    }
    if amount.is_zero() {
        return Ok(StakingPlan::empty());
    }

    let mut steps = Vec::with_capacity(2);
    match &ctx.selected_pool {
        Some(selected) if selected != pool_id => {
            return Ok(StakingPlan {
                conflicting_pool: Some(selected.clone()),
                ..StakingPlan::empty()
            });
        }
        Some(_) => {}
        None => steps.push(Operation::SelectStakingPool {
            lockup_id: ctx.lockup_id.clone(),
            pool_id: pool_id.clone(),
        }),
    }

    steps.push(Operation::DepositAndStake {
        lockup_id: ctx.lockup_id.clone(),
        amount: amount.clone(),
    });

    Ok(StakingPlan {
        steps,
        amount: Some(amount.clone()),
        conflicting_pool: None,
    })
}

/// Plan unstaking from the selected pool; `None` unstakes everything
pub fn plan_unstake(ctx: &StakingContext, amount: Option<&Amount>) -> StakingPlan {
    if ctx.selected_pool.is_none() || amount.map_or(false, Amount::is_zero) {
        return StakingPlan::empty();
    }

    StakingPlan {
        steps: vec![Operation::Unstake {
            lockup_id: ctx.lockup_id.clone(),
            amount: amount.cloned(),
        }],
        amount: amount.cloned(),
        conflicting_pool: None,
    }
}

/// Plan withdrawing everything unstaked from the pool back to the lockup
pub fn plan_withdraw_from_pool(ctx: &StakingContext) -> StakingPlan {
    if ctx.selected_pool.is_none() {
        return StakingPlan::empty();
    }

    StakingPlan {
        steps: vec![Operation::WithdrawAllFromStakingPool {
            lockup_id: ctx.lockup_id.clone(),
        }],
        amount: None,
        conflicting_pool: None,
    }
}
