//! Wallet signing seam
//!
//! One method per signed call. Each call suspends until the wallet signs and
//! the transaction is confirmed, or fails. No timeout is imposed here: a
//! signature prompt may stay open indefinitely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use venear_core::{AccountId, Amount};

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub tx_hash: String,
}

/// Why a signed call did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Wallet rejected the request: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Contract rejected the call: {0}")]
    Contract(String),
}

/// Signing and submission of lockup-related calls.
///
/// Implementations MUST NOT retry internally; retry is always an explicit
/// caller decision.
#[async_trait]
pub trait LockupSigner: Send + Sync {
    /// Storage registration plus lockup deployment, attaching both deposits
    async fn deploy_lockup_and_register(
        &self,
        registration_deposit: &Amount,
        deployment_deposit: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn transfer_native(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn transfer_wrapped_token(
        &self,
        token_id: &AccountId,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn select_staking_pool(
        &self,
        lockup_id: &AccountId,
        pool_id: &AccountId,
    ) -> Result<TxOutcome, SignerError>;

    async fn refresh_lockup_balance(&self, lockup_id: &AccountId)
        -> Result<TxOutcome, SignerError>;

    async fn lock_native(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn begin_unlock(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError>;

    async fn end_unlock(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError>;

    async fn lock_pending(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError>;

    async fn transfer_to_owner(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn deposit_and_stake(
        &self,
        lockup_id: &AccountId,
        amount: &Amount,
    ) -> Result<TxOutcome, SignerError>;

    async fn unstake(
        &self,
        lockup_id: &AccountId,
        amount: Option<&Amount>,
    ) -> Result<TxOutcome, SignerError>;

    async fn withdraw_all_from_staking_pool(
        &self,
        lockup_id: &AccountId,
    ) -> Result<TxOutcome, SignerError>;
}
