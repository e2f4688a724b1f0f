//! Unlock and withdraw planning
//!
//! Locked NEAR leaves the lockup in two phases. `begin_unlock` moves principal
//! from locked to pending and starts the unlock timer. Once the timer expires
//! the pending amount can be completed with `end_unlock` and then withdrawn to
//! the owner, or put back to work with `lock_pending`.

use near_state_client::LockedBalance;
use near_tx::Operation;
use serde::{Deserialize, Serialize};
use venear_core::constants::NEAR_DECIMALS;
use venear_core::{AccountId, Amount, TimestampNs, ValidationError};

use crate::calculator::{
    compute_max_unlockable, filter_dust, validate_entered_amount, ValidationResult,
};

/// Lockup state an unlock plan is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockContext {
    pub lockup_id: AccountId,
    pub locked: LockedBalance,
    /// Liquid NEAR the lockup can already transfer to the owner
    pub liquid_withdrawable: Amount,
    pub now_ns: TimestampNs,
    pub dust_threshold: Amount,
}

impl UnlockContext {
    /// Pending principal after dust filtering
    pub fn pending(&self) -> Amount {
        filter_dust(&self.locked.pending, &self.dust_threshold)
    }

    /// Pending principal exists and its timer has expired
    pub fn is_unlock_ready(&self) -> bool {
        !self.pending().is_zero()
            && self
                .locked
                .unlock_timestamp_ns
                .map_or(true, |ts| self.now_ns >= ts)
    }

    pub fn max_unlockable(&self) -> Amount {
        compute_max_unlockable(&self.locked.locked, &self.dust_threshold)
    }
}

/// Ordered unlock steps plus display data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPlan {
    pub steps: Vec<Operation>,
    /// Principal moved by the plan
    pub amount: Amount,
    /// Set when the plan is empty because the unlock timer is still running
    pub waiting_until_ns: Option<TimestampNs>,
    /// Beginning an unlock while another is pending restarts the timer for
    /// the combined amount
    pub resets_pending_timer: bool,
}

impl UnlockPlan {
    fn empty() -> Self {
        Self {
            steps: Vec::new(),
            amount: Amount::zero(),
            waiting_until_ns: None,
            resets_pending_timer: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Validate an entered unlock amount against the locked balance
pub fn validate_unlock_input(ctx: &UnlockContext, entered: &str) -> ValidationResult {
    validate_entered_amount(entered, NEAR_DECIMALS, &ctx.max_unlockable(), None)
}

/// Plan `begin_unlock` for `amount`.
///
/// Unlocking the whole locked balance omits the amount so no remainder is
/// left behind by rounding.
pub fn plan_begin_unlock(
    ctx: &UnlockContext,
    amount: &Amount,
) -> Result<UnlockPlan, ValidationError> {
    if amount.is_zero() {
        return Ok(UnlockPlan::empty());
    }

    let max = ctx.max_unlockable();
    if amount > &max {
        return Err(ValidationError::InsufficientFunds {
            requested: amount.clone(),
            available: max,
        });
    }

    let step_amount = if amount == &ctx.locked.locked {
        None
    } else {
        Some(amount.clone())
    };

    Ok(UnlockPlan {
        steps: vec![Operation::BeginUnlock {
            lockup_id: ctx.lockup_id.clone(),
            amount: step_amount,
        }],
        amount: amount.clone(),
        waiting_until_ns: None,
        resets_pending_timer: !ctx.pending().is_zero(),
    })
}

/// Plan completion of the pending unlock, optionally withdrawing everything
/// liquid to the owner afterwards.
///
/// Before the unlock timestamp the plan is empty and carries the timestamp.
pub fn plan_complete_unlock(ctx: &UnlockContext, withdraw: bool) -> UnlockPlan {
    let pending = ctx.pending();
    if pending.is_zero() {
        return UnlockPlan::empty();
    }

    if !ctx.is_unlock_ready() {
        return UnlockPlan {
            waiting_until_ns: ctx.locked.unlock_timestamp_ns,
            ..UnlockPlan::empty()
        };
    }

    let mut steps = vec![Operation::EndUnlock {
        lockup_id: ctx.lockup_id.clone(),
        amount: None,
    }];

    if withdraw {
        steps.push(Operation::WithdrawToOwner {
            lockup_id: ctx.lockup_id.clone(),
            amount: &pending + &ctx.liquid_withdrawable,
        });
    }

    UnlockPlan {
        steps,
        amount: pending,
        waiting_until_ns: None,
        resets_pending_timer: false,
    }
}

/// Plan re-locking all pending principal. Allowed whether or not the timer
/// has expired.
pub fn plan_relock_pending(ctx: &UnlockContext) -> UnlockPlan {
    let pending = ctx.pending();
    if pending.is_zero() {
        return UnlockPlan::empty();
    }

    UnlockPlan {
        steps: vec![Operation::LockPending {
            lockup_id: ctx.lockup_id.clone(),
            amount: None,
        }],
        amount: pending,
        waiting_until_ns: None,
        resets_pending_timer: false,
    }
}

/// Plan a transfer of liquid lockup NEAR back to the owner; `None` withdraws
/// everything withdrawable
pub fn plan_withdraw(
    ctx: &UnlockContext,
    amount: Option<&Amount>,
) -> Result<UnlockPlan, ValidationError> {
    let available = filter_dust(&ctx.liquid_withdrawable, &ctx.dust_threshold);
    let amount = match amount {
        Some(a) if a > &available => {
            return Err(ValidationError::InsufficientFunds {
                requested: a.clone(),
                available,
            });
        }
        Some(a) => a.clone(),
        None => available,
    };

    if amount.is_zero() {
        return Ok(UnlockPlan::empty());
    }

    Ok(UnlockPlan {
        steps: vec![Operation::WithdrawToOwner {
            lockup_id: ctx.lockup_id.clone(),
            amount: amount.clone(),
        }],
        amount,
        waiting_until_ns: None,
        resets_pending_timer: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_tx::OperationKind;

    fn ctx(locked: u128, pending: u128, unlock_at: Option<u64>, now: u64) -> UnlockContext {
        UnlockContext {
            lockup_id: AccountId::new("alice-near.venear.dao"),
            locked: LockedBalance {
                locked: Amount::from(locked),
                pending: Amount::from(pending),
                unlock_timestamp_ns: unlock_at,
            },
            liquid_withdrawable: Amount::from(4),
            now_ns: now,
            dust_threshold: Amount::from(2),
        }
    }

    #[test]
    fn test_begin_unlock_partial_carries_amount() {
        let plan = plan_begin_unlock(&ctx(100, 0, None, 0), &Amount::from(30)).unwrap();

        assert_eq!(
            plan.steps,
            vec![Operation::BeginUnlock {
                lockup_id: AccountId::new("alice-near.venear.dao"),
                amount: Some(Amount::from(30)),
            }]
        );
        assert!(!plan.resets_pending_timer);
    }

    #[test]
    fn test_begin_unlock_all_omits_amount() {
        let plan = plan_begin_unlock(&ctx(100, 0, None, 0), &Amount::from(100)).unwrap();
        assert!(matches!(
            plan.steps[0],
            Operation::BeginUnlock { amount: None, .. }
        ));
    }

    #[test]
    fn test_begin_unlock_over_locked_is_rejected() {
        let result = plan_begin_unlock(&ctx(100, 0, None, 0), &Amount::from(101));
        assert!(matches!(
            result,
            Err(ValidationError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_begin_unlock_with_pending_resets_timer() {
        let plan = plan_begin_unlock(&ctx(100, 50, Some(10), 0), &Amount::from(10)).unwrap();
        assert!(plan.resets_pending_timer);
    }

    #[test]
    fn test_dust_locked_cannot_unlock() {
        let c = ctx(1, 0, None, 0);
        assert!(c.max_unlockable().is_zero());
        assert!(matches!(
            validate_unlock_input(&c, "0.000000000000000000000001"),
            Err(ValidationError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_complete_before_timestamp_waits() {
        let plan = plan_complete_unlock(&ctx(0, 50, Some(1_000), 999), true);

        assert!(plan.is_empty());
        assert_eq!(plan.waiting_until_ns, Some(1_000));
    }

    #[test]
    fn test_complete_after_timestamp_with_withdraw() {
        let plan = plan_complete_unlock(&ctx(0, 50, Some(1_000), 1_000), true);

        let kinds: Vec<_> = plan.steps.iter().map(Operation::kind).collect();
        assert_eq!(
            kinds,
            vec![OperationKind::EndUnlock, OperationKind::WithdrawToOwner]
        );
        assert_eq!(
            plan.steps[1],
            Operation::WithdrawToOwner {
                lockup_id: AccountId::new("alice-near.venear.dao"),
                amount: Amount::from(54),
            }
        );
        assert_eq!(plan.amount, Amount::from(50));
        assert_eq!(plan.waiting_until_ns, None);
    }

    #[test]
    fn test_complete_without_withdraw_keeps_funds_in_lockup() {
        let plan = plan_complete_unlock(&ctx(0, 50, Some(1_000), 2_000), false);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].kind(), OperationKind::EndUnlock);
    }

    #[test]
    fn test_nothing_pending_is_empty_without_marker() {
        let plan = plan_complete_unlock(&ctx(100, 1, Some(1_000), 0), true);
        assert!(plan.is_empty());
        assert_eq!(plan.waiting_until_ns, None);
        assert!(plan_relock_pending(&ctx(100, 0, None, 0)).is_empty());
    }

    #[test]
    fn test_relock_pending_ignores_timer() {
        let plan = plan_relock_pending(&ctx(0, 50, Some(1_000), 0));
        assert_eq!(
            plan.steps,
            vec![Operation::LockPending {
                lockup_id: AccountId::new("alice-near.venear.dao"),
                amount: None,
            }]
        );
        assert_eq!(plan.amount, Amount::from(50));
    }

    #[test]
    fn test_withdraw_bounds() {
        let c = ctx(0, 0, None, 0);

        let all = plan_withdraw(&c, None).unwrap();
        assert_eq!(all.amount, Amount::from(4));

        let part = plan_withdraw(&c, Some(&Amount::from(3))).unwrap();
        assert_eq!(part.amount, Amount::from(3));

        assert!(plan_withdraw(&c, Some(&Amount::from(5))).is_err());
    }
}
