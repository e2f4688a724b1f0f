//! TTL cache over an [`AccountStateReader`]
//!
//! Entries expire after a short TTL, but confirmed plan steps invalidate them
//! explicitly so the next planning pass never sees pre-transaction state.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use venear_core::{AccountId, Amount, AppConfig, ConversionRate};

use crate::{
    AccountStateReader, GovernanceConfig, InvalidationKey, LiquidBalance, LockedBalance, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Registered(AccountId),
    LockupId(AccountId),
    Deployed(AccountId),
    StakingPool(AccountId),
    LiquidBalance(AccountId),
    LockableBalance(AccountId),
    LockedBalance(AccountId),
    ConversionRate(AccountId),
    MinimumDeposit(AccountId),
    NativeBalance(AccountId),
    TokenBalance(AccountId, AccountId),
    VotingPower(AccountId),
    GovernanceConfig,
}

impl CacheKey {
    fn group(&self) -> InvalidationKey {
        match self {
            Self::Registered(_) | Self::LockupId(_) => InvalidationKey::AccountRegistration,
            Self::Deployed(_) | Self::StakingPool(_) | Self::LockedBalance(_) => {
                InvalidationKey::LockupState
            }
            Self::LiquidBalance(_) | Self::LockableBalance(_) => {
                InvalidationKey::LockupLiquidBalance
            }
            Self::ConversionRate(_) | Self::MinimumDeposit(_) => InvalidationKey::TokenRates,
            Self::NativeBalance(_) | Self::TokenBalance(_, _) => InvalidationKey::Balances,
            Self::VotingPower(_) => InvalidationKey::VotingPower,
            Self::GovernanceConfig => InvalidationKey::GovernanceConfig,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Flag(bool),
    Account(AccountId),
    OptionalAccount(Option<AccountId>),
    Liquid(LiquidBalance),
    Locked(LockedBalance),
    Amount(Amount),
    OptionalAmount(Option<Amount>),
    Rate(Option<ConversionRate>),
    Governance(GovernanceConfig),
}

/// Read results the cache can hold
trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

macro_rules! impl_cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: &CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_cacheable!(bool, Flag);
impl_cacheable!(AccountId, Account);
impl_cacheable!(Option<AccountId>, OptionalAccount);
impl_cacheable!(LiquidBalance, Liquid);
impl_cacheable!(LockedBalance, Locked);
impl_cacheable!(Amount, Amount);
impl_cacheable!(Option<Amount>, OptionalAmount);
impl_cacheable!(Option<ConversionRate>, Rate);
impl_cacheable!(GovernanceConfig, Governance);

struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
}

/// Caching wrapper around any [`AccountStateReader`]
pub struct CachedStateReader<R> {
    inner: R,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<R: AccountStateReader> CachedStateReader<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache with the TTL from `config.cache_ttl_secs`
    pub fn from_config(inner: R, config: &AppConfig) -> Self {
        Self::new(inner, Duration::from_secs(config.cache_ttl_secs))
    }

    /// Get the wrapped reader
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of stored entries; expired ones linger until the next write
    pub async fn cached_entries(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop every cached entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn get_or_fetch<T, F>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Cacheable + Clone + Send,
        F: Future<Output = Result<T>> + Send,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    if let Some(value) = T::from_cached(&entry.value) {
                        return Ok(value);
                    }
                }
            }
        }

        let value = fetch.await?;

        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                value: value.clone().into_cached(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }
}

#[async_trait]
impl<R: AccountStateReader> AccountStateReader for CachedStateReader<R> {
    async fn is_account_registered(&self, account_id: &AccountId) -> Result<bool> {
        self.get_or_fetch(
            CacheKey::Registered(account_id.clone()),
            self.inner.is_account_registered(account_id),
        )
        .await
    }

    async fn get_lockup_account_id(&self, account_id: &AccountId) -> Result<AccountId> {
        self.get_or_fetch(
            CacheKey::LockupId(account_id.clone()),
            self.inner.get_lockup_account_id(account_id),
        )
        .await
    }

    async fn is_lockup_deployed(&self, lockup_id: &AccountId) -> Result<bool> {
        self.get_or_fetch(
            CacheKey::Deployed(lockup_id.clone()),
            self.inner.is_lockup_deployed(lockup_id),
        )
        .await
    }

    async fn get_selected_staking_pool(
        &self,
        lockup_id: &AccountId,
    ) -> Result<Option<AccountId>> {
        self.get_or_fetch(
            CacheKey::StakingPool(lockup_id.clone()),
            self.inner.get_selected_staking_pool(lockup_id),
        )
        .await
    }

    async fn get_liquid_lockup_balance(&self, lockup_id: &AccountId) -> Result<LiquidBalance> {
        self.get_or_fetch(
            CacheKey::LiquidBalance(lockup_id.clone()),
            self.inner.get_liquid_lockup_balance(lockup_id),
        )
        .await
    }

    async fn get_lockable_balance(&self, lockup_id: &AccountId) -> Result<Amount> {
        self.get_or_fetch(
            CacheKey::LockableBalance(lockup_id.clone()),
            self.inner.get_lockable_balance(lockup_id),
        )
        .await
    }

    async fn get_locked_balance(&self, lockup_id: &AccountId) -> Result<LockedBalance> {
        self.get_or_fetch(
            CacheKey::LockedBalance(lockup_id.clone()),
            self.inner.get_locked_balance(lockup_id),
        )
        .await
    }

    async fn get_conversion_rate(&self, token_id: &AccountId) -> Result<Option<ConversionRate>> {
        self.get_or_fetch(
            CacheKey::ConversionRate(token_id.clone()),
            self.inner.get_conversion_rate(token_id),
        )
        .await
    }

    async fn get_minimum_deposit(&self, token_id: &AccountId) -> Result<Option<Amount>> {
        self.get_or_fetch(
            CacheKey::MinimumDeposit(token_id.clone()),
            self.inner.get_minimum_deposit(token_id),
        )
        .await
    }

    async fn get_native_balance(&self, account_id: &AccountId) -> Result<Amount> {
        self.get_or_fetch(
            CacheKey::NativeBalance(account_id.clone()),
            self.inner.get_native_balance(account_id),
        )
        .await
    }

    async fn get_token_balance(
        &self,
        token_id: &AccountId,
        account_id: &AccountId,
    ) -> Result<Amount> {
        self.get_or_fetch(
            CacheKey::TokenBalance(token_id.clone(), account_id.clone()),
            self.inner.get_token_balance(token_id, account_id),
        )
        .await
    }

    async fn get_voting_power(&self, account_id: &AccountId) -> Result<Amount> {
        self.get_or_fetch(
            CacheKey::VotingPower(account_id.clone()),
            self.inner.get_voting_power(account_id),
        )
        .await
    }

    async fn get_governance_config(&self) -> Result<GovernanceConfig> {
        self.get_or_fetch(
            CacheKey::GovernanceConfig,
            self.inner.get_governance_config(),
        )
        .await
    }

    async fn invalidate(&self, keys: &[InvalidationKey]) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !keys.contains(&key.group()));
        tracing::debug!(
            groups = ?keys,
            dropped = before - entries.len(),
            "Invalidated cached account state"
        );
        drop(entries);

        self.inner.invalidate(keys).await;
    }
}
