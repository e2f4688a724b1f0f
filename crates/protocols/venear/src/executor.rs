//! Sequential plan executor
//!
//! Runs plan steps one at a time through a [`LockupSigner`], suspending on
//! each signature. The first failing step halts the run and is retained in
//! [`ExecutionState`] so the caller can retry from exactly that step.
//!
//! # State machine
//!
//! - `Idle` -> `Running(i)` for `i` in `start_at..len`
//! - `Running(i)` -> `Failed(i)` on the first rejected call
//! - `Running(len - 1)` -> `Completed` once the last call succeeds
//!
//! Steps before a failed index are never re-submitted. Dropping an in-flight
//! `execute` future leaves the state `Running` at the current step, which
//! resumes the same way as a failure.
//!
//! Cached reads are invalidated after every confirmed step, so a plan rebuilt
//! after a failure sees what the earlier steps already committed.

use near_state_client::{AccountStateReader, InvalidationKey};
use near_tx::{plan_shape, LockupSigner, Operation, OperationKind};
use serde::{Deserialize, Serialize};
use venear_core::{AccountId, Amount, ExecutorError, StepExecutionError};

/// Execution lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Progress of one plan, owned by the caller and advanced only by the executor
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    step_index: usize,
    status: ExecutionStatus,
    last_error: Option<StepExecutionError>,
    current_label: Option<String>,
    shape: Vec<OperationKind>,
    tx_hashes: Vec<String>,
    invalidations: Vec<InvalidationKey>,
}

/// Presentation view of an [`ExecutionState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionProgress {
    pub step_index: usize,
    pub total_steps: usize,
    pub description: Option<String>,
    pub completed: bool,
    pub error_message: Option<String>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0-based index of the running or failed step; plan length once completed
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    pub fn last_error(&self) -> Option<&StepExecutionError> {
        self.last_error.as_ref()
    }

    /// Label of the step currently running, or the one that failed
    pub fn current_label(&self) -> Option<&str> {
        self.current_label.as_deref()
    }

    /// Hashes of the transactions confirmed so far, across retries
    pub fn tx_hashes(&self) -> &[String] {
        &self.tx_hashes
    }

    /// Cache groups to refetch; set once any step has been confirmed
    pub fn invalidations(&self) -> &[InvalidationKey] {
        &self.invalidations
    }

    /// Forget all progress before starting an unrelated plan
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn progress(&self) -> ExecutionProgress {
        ExecutionProgress {
            step_index: self.step_index,
            total_steps: self.shape.len(),
            description: self.current_label.clone(),
            completed: self.is_completed(),
            error_message: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Executes plans against a signer, reading state for lazily resolved amounts
pub struct SequentialExecutor<'a> {
    signer: &'a dyn LockupSigner,
    reader: &'a dyn AccountStateReader,
}

impl<'a> SequentialExecutor<'a> {
    pub fn new(signer: &'a dyn LockupSigner, reader: &'a dyn AccountStateReader) -> Self {
        Self { signer, reader }
    }

    /// Run `steps[start_at..]`, recording progress in `state`.
    ///
    /// A rejected step is not an `Err`: it leaves `state` `Failed` with the
    /// step error attached. `Err` is reserved for plans that cannot be
    /// resumed and must be rebuilt.
    pub async fn execute(
        &self,
        steps: &[Operation],
        state: &mut ExecutionState,
        start_at: usize,
    ) -> Result<ExecutionStatus, ExecutorError> {
        let shape = plan_shape(steps);
        match state.status {
            ExecutionStatus::Idle => {}
            ExecutionStatus::Completed => {
                if state.shape != shape {
                    return Err(ExecutorError::PlanShapeChanged);
                }
                return Ok(ExecutionStatus::Completed);
            }
            ExecutionStatus::Running | ExecutionStatus::Failed => {
                if state.shape != shape {
                    return Err(ExecutorError::PlanShapeChanged);
                }
                if start_at != state.step_index {
                    return Err(ExecutorError::PlanCorrupted {
                        start_at,
                        plan_len: steps.len(),
                    });
                }
            }
        }

        if start_at >= steps.len() {
            return Err(ExecutorError::PlanCorrupted {
                start_at,
                plan_len: steps.len(),
            });
        }

        state.shape = shape;
        state.status = ExecutionStatus::Running;
        state.last_error = None;

        for (index, step) in steps.iter().enumerate().skip(start_at) {
            let label = step.label();
            state.step_index = index;
            state.current_label = Some(label.clone());

            tracing::info!(
                step = index + 1,
                total = steps.len(),
                kind = %step.kind(),
                "Submitting plan step: {}",
                label
            );

            match self.submit(step).await {
                Ok(tx_hash) => {
                    tracing::info!(step = index + 1, tx_hash = %tx_hash, "Plan step confirmed");
                    state.tx_hashes.push(tx_hash);
                    state.invalidations = InvalidationKey::AFTER_PLAN.to_vec();
                    self.reader.invalidate(&state.invalidations).await;
                }
                Err(message) => {
                    tracing::warn!(
                        step = index + 1,
                        kind = %step.kind(),
                        "Plan step failed: {}",
                        message
                    );
                    state.status = ExecutionStatus::Failed;
                    state.last_error = Some(StepExecutionError {
                        step_index: index,
                        kind: step.kind().as_str(),
                        label,
                        message,
                    });
                    return Ok(ExecutionStatus::Failed);
                }
            }
        }

        state.step_index = steps.len();
        state.status = ExecutionStatus::Completed;
        state.current_label = None;

        tracing::info!(steps = steps.len(), "Plan completed");
        Ok(ExecutionStatus::Completed)
    }

    /// Resume from the retained step index
    pub async fn retry_from_current_step(
        &self,
        steps: &[Operation],
        state: &mut ExecutionState,
    ) -> Result<ExecutionStatus, ExecutorError> {
        let start_at = state.step_index;
        self.execute(steps, state, start_at).await
    }

    /// Submit one step; returns the tx hash or a display message
    async fn submit(&self, step: &Operation) -> Result<String, String> {
        let outcome = match step {
            Operation::DeployLockup {
                registration_deposit,
                deployment_deposit,
            } => {
                self.signer
                    .deploy_lockup_and_register(registration_deposit, deployment_deposit)
                    .await
            }
            Operation::TransferNative { lockup_id, amount } => {
                self.signer.transfer_native(lockup_id, amount).await
            }
            Operation::TransferToken {
                token_id,
                lockup_id,
                amount,
            } => {
                self.signer
                    .transfer_wrapped_token(token_id, lockup_id, amount)
                    .await
            }
            Operation::SelectStakingPool { lockup_id, pool_id } => {
                self.signer.select_staking_pool(lockup_id, pool_id).await
            }
            Operation::RefreshBalance { lockup_id } => {
                self.signer.refresh_lockup_balance(lockup_id).await
            }
            Operation::LockNear { lockup_id, cap } => {
                let amount = self.resolve_lock_amount(lockup_id, cap).await?;
                self.signer.lock_native(lockup_id, &amount).await
            }
            Operation::BeginUnlock { lockup_id, amount } => {
                self.signer.begin_unlock(lockup_id, amount.as_ref()).await
            }
            Operation::EndUnlock { lockup_id, amount } => {
                self.signer.end_unlock(lockup_id, amount.as_ref()).await
            }
            Operation::LockPending { lockup_id, amount } => {
                self.signer.lock_pending(lockup_id, amount.as_ref()).await
            }
            Operation::WithdrawToOwner { lockup_id, amount } => {
                self.signer.transfer_to_owner(lockup_id, amount).await
            }
            Operation::DepositAndStake { lockup_id, amount } => {
                self.signer.deposit_and_stake(lockup_id, amount).await
            }
            Operation::Unstake { lockup_id, amount } => {
                self.signer.unstake(lockup_id, amount.as_ref()).await
            }
            Operation::WithdrawAllFromStakingPool { lockup_id } => {
                self.signer.withdraw_all_from_staking_pool(lockup_id).await
            }
        };

        outcome.map(|o| o.tx_hash).map_err(|e| e.to_string())
    }

    /// `min(lockable now, cap)`, re-read so earlier steps are reflected
    async fn resolve_lock_amount(
        &self,
        lockup_id: &AccountId,
        cap: &Amount,
    ) -> Result<Amount, String> {
        self.reader
            .invalidate(&[InvalidationKey::LockupLiquidBalance])
            .await;

        let lockable = self
            .reader
            .get_lockable_balance(lockup_id)
            .await
            .map_err(|e| format!("Failed to read lockable balance: {}", e))?;

        let amount = Amount::min_of(&lockable, cap);

        tracing::debug!(
            lockup = %lockup_id,
            lockable = %lockable,
            cap = %cap,
            resolved = %amount,
            "Resolved lock amount"
        );

        if amount.is_zero() {
            return Err("Nothing to lock: lockup has no lockable balance".to_string());
        }

        Ok(amount)
    }
}
