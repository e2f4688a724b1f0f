//! In-memory account state reader
//!
//! Serves reads from a mutable [`StateSnapshot`]. Used by tests to stand in
//! for the RPC and by offline previews fed from a JSON snapshot.
//!
//! Every read bumps a per-method call counter so tests can assert exactly
//! which queries were issued.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use venear_core::{AccountId, Amount, ConversionRate, RpcError};

use crate::{AccountStateReader, GovernanceConfig, LiquidBalance, LockedBalance, Result};

/// 90 days
const DEFAULT_UNLOCK_DURATION_NS: u64 = 90 * 24 * 60 * 60 * 1_000_000_000;

/// On-chain state of one lockup account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockupSnapshot {
    pub deployed: bool,
    pub selected_pool: Option<AccountId>,
    pub liquid: LiquidBalance,
    pub lockable: Amount,
    pub locked: LockedBalance,
}

/// Everything the in-memory reader can answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub venear_contract: AccountId,
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub registered: HashSet<AccountId>,
    #[serde(default)]
    pub lockups: HashMap<AccountId, LockupSnapshot>,
    #[serde(default)]
    pub native_balances: HashMap<AccountId, Amount>,
    /// Keyed by token contract, then holder
    #[serde(default)]
    pub token_balances: HashMap<AccountId, HashMap<AccountId, Amount>>,
    #[serde(default)]
    pub rates: HashMap<AccountId, ConversionRate>,
    #[serde(default)]
    pub minimum_deposits: HashMap<AccountId, Amount>,
    #[serde(default)]
    pub voting_power: HashMap<AccountId, Amount>,
}

impl StateSnapshot {
    /// Lockup id derived from the owner id and governance contract
    pub fn lockup_id_for(&self, owner: &AccountId) -> AccountId {
        let prefix: String = owner
            .as_str()
            .chars()
            .map(|c| if c == '.' { '-' } else { c })
            .collect();
        AccountId::new(format!("{}.{}", prefix, self.venear_contract))
    }

    /// Mutable lockup entry, created undeployed if absent
    pub fn lockup_mut(&mut self, lockup_id: &AccountId) -> &mut LockupSnapshot {
        self.lockups.entry(lockup_id.clone()).or_default()
    }

    pub fn set_token_balance(&mut self, token: &AccountId, holder: &AccountId, amount: Amount) {
        self.token_balances
            .entry(token.clone())
            .or_default()
            .insert(holder.clone(), amount);
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            venear_contract: AccountId::new("venear.dao"),
            governance: GovernanceConfig {
                registration_cost: Amount::from(1_250_000_000_000_000_000_000u128),
                lockup_deployment_cost: Amount::from(3_000_000_000_000_000_000_000_000u128),
                unlock_duration_ns: DEFAULT_UNLOCK_DURATION_NS,
                min_lockup_deposit: Amount::zero(),
            },
            registered: HashSet::new(),
            lockups: HashMap::new(),
            native_balances: HashMap::new(),
            token_balances: HashMap::new(),
            rates: HashMap::new(),
            minimum_deposits: HashMap::new(),
            voting_power: HashMap::new(),
        }
    }
}

/// Reader backed by a [`StateSnapshot`]
#[derive(Default)]
pub struct InMemoryStateReader {
    state: Mutex<StateSnapshot>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<bool>,
}

impl InMemoryStateReader {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            calls: Mutex::new(HashMap::new()),
            failing: Mutex::new(false),
        }
    }

    /// Load a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: StateSnapshot =
            serde_json::from_str(json).map_err(|e| RpcError::ParseError(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    /// Mutate the snapshot in place. Poisoned locks are skipped.
    pub fn update(&self, f: impl FnOnce(&mut StateSnapshot)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }

    /// Clone of the current snapshot
    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.state.lock().ok().map(|s| s.clone())
    }

    /// Make every read fail with [`RpcError::Unreachable`]
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    /// How many times a read method was called
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .ok()
            .and_then(|calls| calls.get(method).copied())
            .unwrap_or(0)
    }

    fn read<T>(&self, method: &'static str, f: impl FnOnce(&StateSnapshot) -> T) -> Result<T> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(method).or_insert(0) += 1;
        }

        let failing = self.failing.lock().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(RpcError::Unreachable {
                url: "memory://".to_string(),
            });
        }

        let state = self
            .state
            .lock()
            .map_err(|e| RpcError::ParseError(format!("state lock poisoned: {}", e)))?;
        Ok(f(&state))
    }

    fn lockup<T>(
        &self,
        method: &'static str,
        lockup_id: &AccountId,
        f: impl FnOnce(&LockupSnapshot) -> T,
    ) -> Result<T> {
        self.read(method, |s| {
            let empty = LockupSnapshot::default();
            f(s.lockups.get(lockup_id).unwrap_or(&empty))
        })
    }
}

#[async_trait]
impl AccountStateReader for InMemoryStateReader {
    async fn is_account_registered(&self, account_id: &AccountId) -> Result<bool> {
        self.read("is_account_registered", |s| s.registered.contains(account_id))
    }

    async fn get_lockup_account_id(&self, account_id: &AccountId) -> Result<AccountId> {
        self.read("get_lockup_account_id", |s| s.lockup_id_for(account_id))
    }

    async fn is_lockup_deployed(&self, lockup_id: &AccountId) -> Result<bool> {
        self.lockup("is_lockup_deployed", lockup_id, |l| l.deployed)
    }

    async fn get_selected_staking_pool(
        &self,
        lockup_id: &AccountId,
    ) -> Result<Option<AccountId>> {
        self.lockup("get_selected_staking_pool", lockup_id, |l| {
            l.selected_pool.clone()
        })
    }

    async fn get_liquid_lockup_balance(&self, lockup_id: &AccountId) -> Result<LiquidBalance> {
        self.lockup("get_liquid_lockup_balance", lockup_id, |l| l.liquid.clone())
    }

    async fn get_lockable_balance(&self, lockup_id: &AccountId) -> Result<Amount> {
        self.lockup("get_lockable_balance", lockup_id, |l| l.lockable.clone())
    }

    async fn get_locked_balance(&self, lockup_id: &AccountId) -> Result<LockedBalance> {
        self.lockup("get_locked_balance", lockup_id, |l| l.locked.clone())
    }

    async fn get_conversion_rate(&self, token_id: &AccountId) -> Result<Option<ConversionRate>> {
        self.read("get_conversion_rate", |s| s.rates.get(token_id).cloned())
    }

    async fn get_minimum_deposit(&self, token_id: &AccountId) -> Result<Option<Amount>> {
        self.read("get_minimum_deposit", |s| {
            s.minimum_deposits.get(token_id).cloned()
        })
    }

    async fn get_native_balance(&self, account_id: &AccountId) -> Result<Amount> {
        self.read("get_native_balance", |s| {
            s.native_balances.get(account_id).cloned().unwrap_or_default()
        })
    }

    async fn get_token_balance(
        &self,
        token_id: &AccountId,
        account_id: &AccountId,
    ) -> Result<Amount> {
        self.read("get_token_balance", |s| {
            s.token_balances
                .get(token_id)
                .and_then(|holders| holders.get(account_id))
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn get_voting_power(&self, account_id: &AccountId) -> Result<Amount> {
        self.read("get_voting_power", |s| {
            s.voting_power.get(account_id).cloned().unwrap_or_default()
        })
    }

    async fn get_governance_config(&self) -> Result<GovernanceConfig> {
        self.read("get_governance_config", |s| s.governance.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_lockup_reads_as_undeployed() {
        let reader = InMemoryStateReader::default();
        let lockup = AccountId::new("nobody.venear.dao");

        assert!(!reader.is_lockup_deployed(&lockup).await.unwrap());
        assert_eq!(reader.get_selected_staking_pool(&lockup).await.unwrap(), None);
        assert_eq!(reader.get_lockable_balance(&lockup).await.unwrap(), Amount::zero());
    }

    #[tokio::test]
    async fn test_lockup_id_is_deterministic() {
        let reader = InMemoryStateReader::default();
        let owner = AccountId::new("alice.near");

        let a = reader.get_lockup_account_id(&owner).await.unwrap();
        let b = reader.get_lockup_account_id(&owner).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "alice-near.venear.dao");
    }

    #[tokio::test]
    async fn test_update_is_visible_to_reads() {
        let reader = InMemoryStateReader::default();
        let token = AccountId::new("meta-pool.near");
        let owner = AccountId::new("alice.near");

        reader.update(|s| s.set_token_balance(&token, &owner, Amount::from(7)));

        let balance = reader.get_token_balance(&token, &owner).await.unwrap();
        assert_eq!(balance, Amount::from(7));
        assert_eq!(reader.call_count("get_token_balance"), 1);
    }

    #[tokio::test]
    async fn test_from_json_snapshot() {
        let json = r#"{
            "venear_contract": "venear.dao",
            "governance": {
                "registration_cost": "3",
                "lockup_deployment_cost": "2",
                "unlock_duration_ns": 100,
                "min_lockup_deposit": "0"
            },
            "registered": ["alice.near"],
            "rates": { "meta-pool.near": "1.2" }
        }"#;
        let reader = InMemoryStateReader::from_json(json).unwrap();

        assert!(reader
            .is_account_registered(&AccountId::new("alice.near"))
            .await
            .unwrap());
        let rate = reader
            .get_conversion_rate(&AccountId::new("meta-pool.near"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rate.to_string(), "1.2");
    }

    #[tokio::test]
    async fn test_failing_reader() {
        let reader = InMemoryStateReader::default();
        reader.set_failing(true);
        assert!(matches!(
            reader.get_governance_config().await,
            Err(RpcError::Unreachable { .. })
        ));
    }
}
