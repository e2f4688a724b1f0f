//! veNEAR Lock Planning and Execution
//!
//! This crate turns a user's intent to lock, unlock, or stake NEAR into an
//! ordered list of lockup operations and executes that list one signed call
//! at a time.
//!
//! # Protocol Overview
//!
//! veNEAR voting power comes from NEAR locked in a per-owner lockup contract:
//! - NEAR: locked 1:1
//! - Liquid staking tokens (stNEAR, LiNEAR, rNEAR): transferred into the
//!   lockup and locked at their NEAR conversion rate
//! - Unlocking is two-phase, with a governance-defined delay between phases
//!
//! # Features
//!
//! - Exact integer amount math (no floating point)
//! - Token catalog with dust filtering and pending-rate handling
//! - Lock, unlock, and stake planners
//! - Resumable sequential executor with retry from the failed step
//!
//! # Example
//!
//! ```ignore
//! use venear::{build_lock_plan, load_planning_context, ExecutionState, SequentialExecutor};
//!
//! let ctx = load_planning_context(&reader, &owner).await?
//!     .with_asset(asset)
//!     .with_amount(amount);
//! let plan = build_lock_plan(&ctx);
//!
//! let mut state = ExecutionState::new();
//! let executor = SequentialExecutor::new(&signer, &reader);
//! executor.execute(&plan.steps, &mut state, 0).await?;
//! ```

pub mod calculator;
pub mod catalog;
pub mod constants;
pub mod executor;
pub mod fetch;
pub mod plan_builder;
pub mod staking;
pub mod state;
pub mod unlock;

pub use calculator::*;
pub use catalog::{CatalogEntry, TokenCatalog};
pub use constants::*;
pub use executor::{ExecutionProgress, ExecutionState, ExecutionStatus, SequentialExecutor};
pub use fetch::{
    fetch_account_state, fetch_staking_context, fetch_unlock_context, load_planning_context,
    prepare_lock_plan,
};
pub use plan_builder::{build_lock_plan, validate_lock_input, LockPlan};
pub use staking::*;
pub use state::*;
pub use unlock::*;
