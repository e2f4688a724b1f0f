//! Token catalog
//!
//! The set of assets an owner can lock, with dust-filtered balances and their
//! native value. Built fresh from the state reader for each planning pass.

use near_state_client::{get_token_holding, AccountStateReader, Result};
use serde::Serialize;
use venear_core::{AccountId, Amount, AppConfig};

use crate::calculator::{compute_max_lockable, convert_to_native_value, filter_dust, NativeValue};
use crate::state::{AccountState, Asset, AssetKind};

/// One lockable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub asset: Asset,
    /// Balance expressed in yoctoNEAR
    pub native_value: NativeValue,
    /// Pool-specific minimum deposit, LSTs only
    pub minimum_deposit: Option<Amount>,
}

impl CatalogEntry {
    fn native(asset: Asset) -> Self {
        let native_value = NativeValue::exact(asset.balance().clone());
        Self {
            asset,
            native_value,
            minimum_deposit: None,
        }
    }

    /// Most of this asset that can be locked
    pub fn max_lockable(&self, gas_reserve: &Amount) -> Amount {
        compute_max_lockable(self.asset.balance(), self.asset.kind(), gas_reserve)
    }
}

/// Lockable assets in display order: wallet NEAR, lockup NEAR, then
/// configured LSTs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenCatalog {
    entries: Vec<CatalogEntry>,
}

impl TokenCatalog {
    /// Load the catalog for `account`.
    ///
    /// The wallet NEAR balance is required. A token whose balance cannot be
    /// read is left out rather than failing the whole catalog, and a missing
    /// conversion rate leaves the token listed with a pending native value.
    pub async fn load(
        reader: &dyn AccountStateReader,
        config: &AppConfig,
        account: &AccountState,
    ) -> Result<Self> {
        let dust = &config.dust_threshold;
        let mut entries = Vec::with_capacity(config.liquid_staking_tokens.len() + 2);

        let native = reader.get_native_balance(&account.owner_id).await?;
        entries.push(CatalogEntry::native(Asset::NativeCoin { balance: native }));

        if account.is_lockup_deployed {
            let lockable = reader.get_lockable_balance(&account.lockup_id).await?;
            entries.push(CatalogEntry::native(Asset::LockupHeldCoin {
                balance: filter_dust(&lockable, dust),
            }));
        }

        for token in &config.liquid_staking_tokens {
            let holding =
                match get_token_holding(reader, &token.contract_id, &account.owner_id).await {
                    Ok(holding) => holding,
                    Err(e) => {
                        tracing::warn!(
                            token = %token.contract_id,
                            error = %e,
                            "Skipping token with unreadable balance"
                        );
                        continue;
                    }
                };

            let balance = filter_dust(&holding.balance, dust);
            let native_value = convert_to_native_value(&balance, holding.rate.as_ref());
            if !native_value.available {
                tracing::warn!(token = %token.contract_id, "Conversion rate unavailable");
            }

            entries.push(CatalogEntry {
                asset: Asset::LiquidStakingToken {
                    contract_id: token.contract_id.clone(),
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                    balance,
                    rate: holding.rate,
                },
                native_value,
                minimum_deposit: holding.minimum_deposit,
            });
        }

        tracing::debug!(
            owner = %account.owner_id,
            entries = entries.len(),
            "Token catalog loaded"
        );
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn native(&self) -> Option<&CatalogEntry> {
        self.by_kind(AssetKind::NativeCoin)
    }

    pub fn lockup_held(&self) -> Option<&CatalogEntry> {
        self.by_kind(AssetKind::LockupHeldCoin)
    }

    /// LST entry by token contract
    pub fn token(&self, contract_id: &AccountId) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.asset.contract_id() == Some(contract_id))
    }

    /// Entries with something to lock after the gas reserve
    pub fn lockable<'a>(
        &'a self,
        gas_reserve: &'a Amount,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| !e.max_lockable(gas_reserve).is_zero())
    }

    fn by_kind(&self, kind: AssetKind) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.asset.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_state_client::InMemoryStateReader;
    use venear_core::{Network, TokenConfig};

    fn config() -> AppConfig {
        let mut config = AppConfig::for_network(Network::Mainnet);
        config.dust_threshold = Amount::from(10);
        config.gas_reserve = Amount::from(5);
        config.liquid_staking_tokens = vec![
            TokenConfig {
                contract_id: AccountId::new("meta-pool.near"),
                symbol: "stNEAR".into(),
                decimals: 24,
            },
            TokenConfig {
                contract_id: AccountId::new("linear-protocol.near"),
                symbol: "LiNEAR".into(),
                decimals: 24,
            },
        ];
        config
    }

    fn account(deployed: bool) -> AccountState {
        let mut account = AccountState::new_owner(
            AccountId::new("alice.near"),
            AccountId::new("alice-near.venear.dao"),
        );
        account.is_lockup_deployed = deployed;
        account
    }

    fn reader() -> InMemoryStateReader {
        let reader = InMemoryStateReader::default();
        reader.update(|s| {
            let owner = AccountId::new("alice.near");
            s.native_balances.insert(owner.clone(), Amount::from(100));
            s.lockup_mut(&AccountId::new("alice-near.venear.dao")).lockable = Amount::from(3);
            s.set_token_balance(&AccountId::new("meta-pool.near"), &owner, Amount::from(50));
            s.set_token_balance(&AccountId::new("linear-protocol.near"), &owner, Amount::from(20));
            s.rates
                .insert(AccountId::new("meta-pool.near"), "1.5".parse().unwrap());
            s.minimum_deposits
                .insert(AccountId::new("meta-pool.near"), Amount::from(12));
        });
        reader
    }

    #[tokio::test]
    async fn test_catalog_order_and_values() {
        let catalog = TokenCatalog::load(&reader(), &config(), &account(true))
            .await
            .unwrap();

        let kinds: Vec<_> = catalog.entries().iter().map(|e| e.asset.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                AssetKind::NativeCoin,
                AssetKind::LockupHeldCoin,
                AssetKind::LiquidStakingToken,
                AssetKind::LiquidStakingToken,
            ]
        );

        // Lockup balance below dust reads as zero
        assert!(catalog.lockup_held().unwrap().asset.balance().is_zero());

        let stnear = catalog.token(&AccountId::new("meta-pool.near")).unwrap();
        assert_eq!(stnear.native_value, NativeValue::exact(Amount::from(75)));
        assert_eq!(stnear.minimum_deposit, Some(Amount::from(12)));
    }

    #[tokio::test]
    async fn test_missing_rate_is_pending_not_zero() {
        let catalog = TokenCatalog::load(&reader(), &config(), &account(false))
            .await
            .unwrap();

        let linear = catalog
            .token(&AccountId::new("linear-protocol.near"))
            .unwrap();
        assert!(!linear.native_value.available);
        assert_eq!(linear.asset.balance(), &Amount::from(20));
    }

    #[tokio::test]
    async fn test_undeployed_lockup_has_no_held_entry() {
        let reader = reader();
        let catalog = TokenCatalog::load(&reader, &config(), &account(false))
            .await
            .unwrap();

        assert!(catalog.lockup_held().is_none());
        assert_eq!(reader.call_count("get_lockable_balance"), 0);
    }

    #[tokio::test]
    async fn test_lockable_filter_applies_gas_reserve() {
        let reader = reader();
        reader.update(|s| {
            s.native_balances
                .insert(AccountId::new("alice.near"), Amount::from(4));
        });
        let config = config();
        let catalog = TokenCatalog::load(&reader, &config, &account(true))
            .await
            .unwrap();

        let lockable: Vec<_> = catalog
            .lockable(&config.gas_reserve)
            .map(|e| e.asset.symbol().to_string())
            .collect();
        assert_eq!(lockable, vec!["stNEAR", "LiNEAR"]);
    }

    #[tokio::test]
    async fn test_native_balance_failure_fails_catalog() {
        let reader = reader();
        reader.set_failing(true);

        let result = TokenCatalog::load(&reader, &config(), &account(true)).await;
        assert!(result.is_err());
    }
}
