//! Recording signer for tests
//!
//! Records every attempted call in order, returns scripted failures per
//! operation kind (FIFO), and runs an optional hook after each successful
//! call so tests can apply the call's effect to simulated chain state.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use venear_core::{AccountId, Amount};

use crate::{LockupSigner, Operation, OperationKind, SignerError, TxOutcome};

type Hook = Box<dyn Fn(&Operation) + Send + Sync>;

/// One attempted signed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The call with its final arguments (lock amounts already resolved)
    pub operation: Operation,
    pub succeeded: bool,
}

/// Signer that records calls instead of talking to a wallet
#[derive(Default)]
pub struct RecordingSigner {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<OperationKind, VecDeque<SignerError>>>,
    hook: Option<Hook>,
}

impl RecordingSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` after every successful call
    pub fn with_hook(hook: impl Fn(&Operation) + Send + Sync + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Fail the next call of `kind` with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, kind: OperationKind, error: SignerError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.entry(kind).or_default().push_back(error);
        }
    }

    /// All attempted calls, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Attempted calls (successful or not) of one kind
    pub fn call_count(&self, kind: OperationKind) -> usize {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|c| c.operation.kind() == kind)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Kinds of all attempted calls, oldest first
    pub fn call_kinds(&self) -> Vec<OperationKind> {
        self.calls()
            .iter()
            .map(|c| c.operation.kind())
            .collect()
    }

    fn record(&self, operation: Operation) -> Result<TxOutcome, SignerError> {
        let kind = operation.kind();
        let failure = self
            .failures
            .lock()
            .ok()
            .and_then(|mut f| f.get_mut(&kind).and_then(|q| q.pop_front()));

        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| SignerError::Network(format!("mutex poisoned: {}", e)))?;
            calls.push(RecordedCall {
                operation: operation.clone(),
                succeeded: failure.is_none(),
            });
            calls.len()
        };

        if let Some(error) = failure {
            return Err(error);
        }

        if let Some(hook) = &self.hook {
            hook(&operation);
        }

        Ok(TxOutcome {
            tx_hash: format!("tx-{}-{}", index, kind),
        })
    }
}

#[async_trait]
impl LockupSigner for RecordingSigner {
    async fn deploy_lockup_and_register(
        &self,
        registration_deposit: &Amount,
        deployment_deposit: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::DeployLockup {
            registration_deposit: registration_deposit.clone(),
            deployment_deposit: deployment_deposit.clone(),
        })
    }

    async fn transfer_native(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::TransferNative {
            lockup_id: lockup_id.clone(),
            amount: amount.clone(),
        })
    }

    async fn transfer_wrapped_token(
        &self,
        token_id: &AccountId,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::TransferToken {
            token_id: token_id.clone(),
            lockup_id: lockup_id.clone(),
            amount: amount.clone(),
        })
    }

    async fn select_staking_pool(
        &self,
        lockup_id: &AccountId,
        pool_id: &AccountId,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::SelectStakingPool {
            lockup_id: lockup_id.clone(),
            pool_id: pool_id.clone(),
        })
    }

    async fn refresh_lockup_balance(
        &self,
        lockup_id: &AccountId,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::RefreshBalance {
            lockup_id: lockup_id.clone(),
        })
    }

    async fn lock_native(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::LockNear {
            lockup_id: lockup_id.clone(),
            cap: amount.clone(),
        })
    }

    async fn begin_unlock(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::BeginUnlock {
            lockup_id: lockup_id.clone(),
            amount: amount.cloned(),
        })
    }

    async fn end_unlock(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::EndUnlock {
            lockup_id: lockup_id.clone(),
            amount: amount.cloned(),
        })
    }

    async fn lock_pending(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::LockPending {
            lockup_id: lockup_id.clone(),
            amount: amount.cloned(),
        })
    }

    async fn transfer_to_owner(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::WithdrawToOwner {
            lockup_id: lockup_id.clone(),
            amount: amount.clone(),
        })
    }

    async fn deposit_and_stake(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::DepositAndStake {
            lockup_id: lockup_id.clone(),
            amount: amount.clone(),
        })
    }

    async fn unstake(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::Unstake {
            lockup_id: lockup_id.clone(),
            amount: amount.cloned(),
        })
    }

    async fn withdraw_all_from_staking_pool(
        &self,
        lockup_id: &AccountId,
    ) -> Result<TxOutcome, SignerError> {
        self.record(Operation::WithdrawAllFromStakingPool {
            lockup_id: lockup_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn lockup() -> AccountId {
        AccountId::new("alice-near.venear.dao")
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let signer = RecordingSigner::new();
        signer
            .transfer_native(&lockup(), &Amount::from(5))
            .await
            .unwrap();
        signer
            .lock_native(&lockup(), &Amount::from(5))
            .await
            .unwrap();

        assert_eq!(
            signer.call_kinds(),
            vec![OperationKind::TransferNative, OperationKind::LockNear]
        );
        assert!(signer.calls().iter().all(|c| c.succeeded));
    }

    #[tokio::test]
    async fn test_scripted_failure_is_consumed_once() {
        let signer = RecordingSigner::new();
        signer.fail_next(
            OperationKind::RefreshBalance,
            SignerError::Rejected("closed popup".into()),
        );

        let first = signer.refresh_lockup_balance(&lockup()).await;
        assert_eq!(first, Err(SignerError::Rejected("closed popup".into())));

        let second = signer.refresh_lockup_balance(&lockup()).await;
        assert!(second.is_ok());
        assert_eq!(signer.call_count(OperationKind::RefreshBalance), 2);
        assert!(!signer.calls()[0].succeeded);
    }

    #[tokio::test]
    async fn test_hook_runs_only_on_success() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let signer = RecordingSigner::with_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        signer.fail_next(
            OperationKind::WithdrawAllFromStakingPool,
            SignerError::Network("timeout".into()),
        );

        let _ = signer.withdraw_all_from_staking_pool(&lockup()).await;
        signer.withdraw_all_from_staking_pool(&lockup()).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
