//! veNEAR protocol constants
//!
//! Network-specific contract ids live in `venear_core::config`.

use near_tx::OperationKind;

/// Display symbol for native NEAR
pub const NEAR_SYMBOL: &str = "NEAR";

/// Display symbol for NEAR already held by the lockup
pub const LOCKUP_NEAR_SYMBOL: &str = "NEAR (lockup)";

/// Relative order of lock plan steps. A plan may omit any step except
/// `LockNear`, and never contains both transfer kinds.
pub const LOCK_STEP_ORDER: [OperationKind; 6] = [
    OperationKind::DeployLockup,
    OperationKind::TransferNative,
    OperationKind::TransferToken,
    OperationKind::SelectStakingPool,
    OperationKind::RefreshBalance,
    OperationKind::LockNear,
];

/// Whether `kinds` is a subsequence of [`LOCK_STEP_ORDER`] ending in `LockNear`
pub fn follows_lock_step_order(kinds: &[OperationKind]) -> bool {
    if kinds.last() != Some(&OperationKind::LockNear) {
        return false;
    }

    let mut order = LOCK_STEP_ORDER.iter();
    kinds.iter().all(|kind| order.any(|k| k == kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperationKind::*;

    #[test]
    fn test_lock_step_order() {
        assert!(follows_lock_step_order(&[LockNear]));
        assert!(follows_lock_step_order(&[
            DeployLockup,
            TransferToken,
            SelectStakingPool,
            RefreshBalance,
            LockNear
        ]));
        assert!(!follows_lock_step_order(&[TransferNative, DeployLockup, LockNear]));
        assert!(!follows_lock_step_order(&[DeployLockup, TransferNative]));
        assert!(!follows_lock_step_order(&[LockNear, LockNear]));
        assert!(!follows_lock_step_order(&[]));
    }
}
