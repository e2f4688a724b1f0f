//! veNEAR state fetching
//!
//! Builds the planner inputs from an [`AccountStateReader`]. Every call reads
//! fresh (or freshly invalidated) state; nothing here is memoized.

use near_state_client::{get_lockup_overview, AccountStateReader, Result};
use venear_core::{AccountId, Amount, AppConfig, TimestampNs};

use crate::catalog::CatalogEntry;
use crate::plan_builder::{build_lock_plan, validate_lock_input, LockPlan};
use crate::staking::StakingContext;
use crate::state::{AccountState, PlanningContext};
use crate::unlock::UnlockContext;

/// Fetch the owner's onboarding and lockup state.
///
/// Lockup reads are skipped while the lockup is not deployed.
pub async fn fetch_account_state(
    reader: &dyn AccountStateReader,
    owner_id: &AccountId,
) -> Result<AccountState> {
    let lockup_id = reader.get_lockup_account_id(owner_id).await?;
    let is_registered = reader.is_account_registered(owner_id).await?;
    let is_lockup_deployed = reader.is_lockup_deployed(&lockup_id).await?;

    let mut state = AccountState::new_owner(owner_id.clone(), lockup_id);
    state.is_registered = is_registered;
    state.is_lockup_deployed = is_lockup_deployed;

    if is_lockup_deployed {
        state.selected_staking_pool = reader.get_selected_staking_pool(&state.lockup_id).await?;
        state.liquid_balance = reader.get_liquid_lockup_balance(&state.lockup_id).await?;
    }

    Ok(state)
}

/// Account state plus governance costs, with no asset or amount selected yet
pub async fn load_planning_context(
    reader: &dyn AccountStateReader,
    owner_id: &AccountId,
) -> Result<PlanningContext> {
    let account = fetch_account_state(reader, owner_id).await?;
    let governance = reader.get_governance_config().await?;
    Ok(PlanningContext::new(account, governance))
}

/// Validate `entered` for a catalog entry, then build its lock plan from
/// freshly read account state
pub async fn prepare_lock_plan(
    reader: &dyn AccountStateReader,
    owner_id: &AccountId,
    entry: &CatalogEntry,
    entered: &str,
    config: &AppConfig,
) -> venear_core::Result<LockPlan> {
    let amount = validate_lock_input(
        &entry.asset,
        entered,
        &config.gas_reserve,
        entry.minimum_deposit.as_ref(),
    )?;
    let ctx = load_planning_context(reader, owner_id)
        .await?
        .with_asset(entry.asset.clone())
        .with_amount(amount);
    Ok(build_lock_plan(&ctx))
}

/// Locked and liquid lockup balances for unlock planning
pub async fn fetch_unlock_context(
    reader: &dyn AccountStateReader,
    lockup_id: &AccountId,
    now_ns: TimestampNs,
    dust_threshold: &Amount,
) -> Result<UnlockContext> {
    let overview = get_lockup_overview(reader, lockup_id).await?;
    Ok(UnlockContext {
        lockup_id: lockup_id.clone(),
        locked: overview.locked,
        liquid_withdrawable: overview.liquid.withdrawable,
        now_ns,
        dust_threshold: dust_threshold.clone(),
    })
}

/// Pool selection and liquid balance for stake planning
pub async fn fetch_staking_context(
    reader: &dyn AccountStateReader,
    lockup_id: &AccountId,
    dust_threshold: &Amount,
) -> Result<StakingContext> {
    let overview = get_lockup_overview(reader, lockup_id).await?;
    Ok(StakingContext {
        lockup_id: lockup_id.clone(),
        selected_pool: overview.selected_pool,
        liquid: overview.liquid,
        dust_threshold: dust_threshold.clone(),
    })
}
