//! Error types for the planner

use thiserror::Error;

use crate::{AccountId, Amount};

/// Core errors that can occur while planning or executing
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Step failed: {0}")]
    Step(#[from] StepExecutionError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Chain state read errors
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("RPC unreachable at {url}")]
    Unreachable { url: String },

    #[error("View call {contract}::{method} failed: {message}")]
    ViewCallFailed {
        contract: String,
        method: String,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: AccountId },
}

/// Entered-amount validation failures, surfaced before any on-chain call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid amount: '{input}'")]
    InvalidFormat { input: String },

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Amount {entered} is below the minimum deposit {minimum}")]
    BelowMinimum { minimum: Amount, entered: Amount },
}

impl ValidationError {
    /// Stable code for presentation layers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::BelowMinimum { .. } => "below_minimum",
        }
    }
}

/// A single plan step whose external call was rejected.
///
/// Every step before `step_index` is already committed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label} (step {}) failed: {message}", .step_index + 1)]
pub struct StepExecutionError {
    pub step_index: usize,
    /// Operation kind name, e.g. "transfer_token"
    pub kind: &'static str,
    /// Human-readable step description
    pub label: String,
    pub message: String,
}

/// Fatal executor errors. The caller must rebuild the plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Plan corrupted: cannot start at step {start_at} of a {plan_len}-step plan")]
    PlanCorrupted { start_at: usize, plan_len: usize },

    #[error("Plan corrupted: steps changed since the failed attempt")]
    PlanShapeChanged,
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_codes() {
        let err = ValidationError::InvalidFormat {
            input: "abc".into(),
        };
        assert_eq!(err.error_code(), "invalid_format");

        let err = ValidationError::InsufficientFunds {
            requested: Amount::from(10),
            available: Amount::from(5),
        };
        assert_eq!(err.error_code(), "insufficient_funds");
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 10, available 5"
        );
    }

    #[test]
    fn test_step_error_display_is_one_based() {
        let err = StepExecutionError {
            step_index: 1,
            kind: "transfer_native",
            label: "Transfer NEAR to lockup".into(),
            message: "User rejected the request".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transfer NEAR to lockup (step 2) failed: User rejected the request"
        );
    }

    #[test]
    fn test_plan_corrupted_converts_into_core_error() {
        let err: Error = ExecutorError::PlanCorrupted {
            start_at: 4,
            plan_len: 3,
        }
        .into();
        assert!(matches!(err, Error::Executor(ExecutorError::PlanCorrupted { .. })));
    }
}
