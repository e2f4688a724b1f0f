//! veNEAR lock plan builder
//!
//! Derives the ordered steps for locking an asset from a [`PlanningContext`].
//!
//! # Step order
//!
//! 1. `DeployLockup` - only when the lockup does not exist yet
//! 2. `TransferNative` / `TransferToken` - unless the NEAR is already in the lockup
//! 3. `SelectStakingPool` - LST only, when the lockup has no pool selected
//! 4. `RefreshBalance` - after every LST transfer
//! 5. `LockNear` - always last; amount resolved at execution time
//!
//! Building is pure: the same context always yields the same plan, and missing
//! inputs yield an empty plan instead of an error. An LST whose conversion rate
//! is unavailable also yields no steps, since the lock cap cannot be computed.

use near_tx::{Operation, OperationKind};
use serde::Serialize;
use venear_core::Amount;

use crate::calculator::{
    compute_deposit_total, compute_max_lockable, convert_to_native_value,
    validate_entered_amount, ValidationResult,
};
use crate::state::{Asset, AssetKind, PlanningContext};

/// Ordered lock steps plus the amounts shown alongside them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockPlan {
    pub steps: Vec<Operation>,
    /// Registration and deployment deposits attached to `DeployLockup`
    pub deposit_total: Amount,
    /// Amount of the selected asset moved into the lockup
    pub transfer_amount: Amount,
    /// Voting power gained, in yoctoNEAR
    pub estimated_voting_power: Amount,
    /// False while an LST conversion rate is unavailable; the estimate is then
    /// zero and the plan has no steps
    pub voting_power_available: bool,
}

impl LockPlan {
    /// Plan for incomplete input; nothing can execute yet
    pub fn empty() -> Self {
        Self {
            steps: Vec::new(),
            deposit_total: Amount::zero(),
            transfer_amount: Amount::zero(),
            estimated_voting_power: Amount::zero(),
            voting_power_available: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn kinds(&self) -> Vec<OperationKind> {
        near_tx::plan_shape(&self.steps)
    }
}

/// Build the lock plan for the context's asset and entered amount
pub fn build_lock_plan(ctx: &PlanningContext) -> LockPlan {
    let (asset, entered) = match (&ctx.asset, &ctx.entered_amount) {
        (Some(asset), Some(entered)) if !entered.is_zero() => (asset, entered),
        _ => return LockPlan::empty(),
    };

    let account = &ctx.account;
    let governance = &ctx.governance;
    let lockup_id = &account.lockup_id;

    let deposit_total = compute_deposit_total(
        account.is_registered,
        account.is_lockup_deployed,
        &governance.registration_cost,
        &governance.lockup_deployment_cost,
    );

    if let Asset::LiquidStakingToken { rate: None, .. } = asset {
        return LockPlan {
            deposit_total,
            transfer_amount: entered.clone(),
            voting_power_available: false,
            ..LockPlan::empty()
        };
    }

    let mut steps = Vec::with_capacity(5);

    if !account.is_lockup_deployed {
        let registration_deposit = if account.is_registered {
            Amount::zero()
        } else {
            governance.registration_cost.clone()
        };
        steps.push(Operation::DeployLockup {
            registration_deposit,
            deployment_deposit: governance.lockup_deployment_cost.clone(),
        });
    }

    let (transfer_amount, lock_cap, estimated_voting_power) = match asset {
        Asset::NativeCoin { .. } => {
            let transfer_amount = if ctx.is_onboarding {
                entered.saturating_sub(&deposit_total)
            } else {
                entered.clone()
            };
            steps.push(Operation::TransferNative {
                lockup_id: lockup_id.clone(),
                amount: transfer_amount.clone(),
            });
            (transfer_amount, entered.clone(), entered.clone())
        }
        Asset::LiquidStakingToken {
            contract_id, rate, ..
        } => {
            steps.push(Operation::TransferToken {
                token_id: contract_id.clone(),
                lockup_id: lockup_id.clone(),
                amount: entered.clone(),
            });
            if account.selected_staking_pool.is_none() {
                steps.push(Operation::SelectStakingPool {
                    lockup_id: lockup_id.clone(),
                    pool_id: contract_id.clone(),
                });
            }
            steps.push(Operation::RefreshBalance {
                lockup_id: lockup_id.clone(),
            });

            let value = convert_to_native_value(entered, rate.as_ref());
            let power = if account.is_registered {
                value.amount.clone()
            } else {
                &value.amount + &governance.registration_cost
            };
            (entered.clone(), value.amount, power)
        }
        Asset::LockupHeldCoin { .. } => (Amount::zero(), entered.clone(), entered.clone()),
    };

    steps.push(Operation::LockNear {
        lockup_id: lockup_id.clone(),
        cap: lock_cap,
    });

    LockPlan {
        steps,
        deposit_total,
        transfer_amount,
        estimated_voting_power,
        voting_power_available: true,
    }
}

/// Validate an entered amount for locking `asset`.
///
/// The pool minimum only applies to liquid staking tokens.
pub fn validate_lock_input(
    asset: &Asset,
    entered: &str,
    gas_reserve: &Amount,
    pool_minimum: Option<&Amount>,
) -> ValidationResult {
    let max = compute_max_lockable(asset.balance(), asset.kind(), gas_reserve);
    let minimum = match asset.kind() {
        AssetKind::LiquidStakingToken => pool_minimum,
        AssetKind::NativeCoin | AssetKind::LockupHeldCoin => None,
    };
    validate_entered_amount(entered, asset.decimals(), &max, minimum)
}
