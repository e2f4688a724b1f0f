//! Composite reads built from several [`AccountStateReader`] calls

use venear_core::{AccountId, Amount, ConversionRate};

use crate::{AccountStateReader, LiquidBalance, LockedBalance, Result};

/// Everything known about a lockup contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockupOverview {
    pub deployed: bool,
    pub selected_pool: Option<AccountId>,
    pub liquid: LiquidBalance,
    pub lockable: Amount,
    pub locked: LockedBalance,
}

/// An owner's holding of one fungible token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolding {
    pub balance: Amount,
    /// `None` when the rate read failed or the token reported none
    pub rate: Option<ConversionRate>,
    pub minimum_deposit: Option<Amount>,
}

/// Read the full lockup state.
///
/// An undeployed lockup short-circuits to the default overview without
/// querying balances on a contract that does not exist.
pub async fn get_lockup_overview(
    reader: &dyn AccountStateReader,
    lockup_id: &AccountId,
) -> Result<LockupOverview> {
    if !reader.is_lockup_deployed(lockup_id).await? {
        return Ok(LockupOverview::default());
    }

    Ok(LockupOverview {
        deployed: true,
        selected_pool: reader.get_selected_staking_pool(lockup_id).await?,
        liquid: reader.get_liquid_lockup_balance(lockup_id).await?,
        lockable: reader.get_lockable_balance(lockup_id).await?,
        locked: reader.get_locked_balance(lockup_id).await?,
    })
}

/// Read a token balance with its conversion rate and pool minimum.
///
/// Only the balance read is fatal. Rate and minimum failures degrade to
/// `None` and are logged.
pub async fn get_token_holding(
    reader: &dyn AccountStateReader,
    token_id: &AccountId,
    holder: &AccountId,
) -> Result<TokenHolding> {
    let balance = reader.get_token_balance(token_id, holder).await?;

    let rate = match reader.get_conversion_rate(token_id).await {
        Ok(rate) => rate,
        Err(e) => {
            tracing::warn!(token = %token_id, error = %e, "Conversion rate unavailable");
            None
        }
    };

    let minimum_deposit = match reader.get_minimum_deposit(token_id).await {
        Ok(minimum) => minimum,
        Err(e) => {
            tracing::warn!(token = %token_id, error = %e, "Pool minimum unavailable");
            None
        }
    };

    Ok(TokenHolding {
        balance,
        rate,
        minimum_deposit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStateReader;

    fn lockup() -> AccountId {
        AccountId::new("alice-near.venear.dao")
    }

    #[tokio::test]
    async fn test_undeployed_lockup_skips_balance_reads() {
        let reader = InMemoryStateReader::default();
        let overview = get_lockup_overview(&reader, &lockup()).await.unwrap();

        assert!(!overview.deployed);
        assert_eq!(reader.call_count("get_liquid_lockup_balance"), 0);
        assert_eq!(reader.call_count("get_locked_balance"), 0);
    }

    #[tokio::test]
    async fn test_deployed_lockup_overview() {
        let reader = InMemoryStateReader::default();
        reader.update(|s| {
            let l = s.lockup_mut(&lockup());
            l.deployed = true;
            l.selected_pool = Some(AccountId::new("meta-pool.near"));
            l.lockable = Amount::from(40);
            l.locked.locked = Amount::from(100);
        });

        let overview = get_lockup_overview(&reader, &lockup()).await.unwrap();

        assert!(overview.deployed);
        assert_eq!(overview.selected_pool, Some(AccountId::new("meta-pool.near")));
        assert_eq!(overview.lockable, Amount::from(40));
        assert_eq!(overview.locked.locked, Amount::from(100));
    }

    #[tokio::test]
    async fn test_token_holding_reads_rate_and_minimum() {
        let token = AccountId::new("linear-protocol.near");
        let owner = AccountId::new("alice.near");
        let reader = InMemoryStateReader::default();
        reader.update(|s| {
            s.set_token_balance(&token, &owner, Amount::from(70));
            s.rates.insert(token.clone(), "1.2".parse().unwrap());
            s.minimum_deposits.insert(token.clone(), Amount::from(5));
        });

        let holding = get_token_holding(&reader, &token, &owner).await.unwrap();

        assert_eq!(holding.balance, Amount::from(70));
        assert_eq!(holding.rate, Some("1.2".parse().unwrap()));
        assert_eq!(holding.minimum_deposit, Some(Amount::from(5)));
    }

    #[tokio::test]
    async fn test_token_holding_fails_on_balance_error() {
        let reader = InMemoryStateReader::default();
        reader.set_failing(true);

        let result = get_token_holding(
            &reader,
            &AccountId::new("meta-pool.near"),
            &AccountId::new("alice.near"),
        )
        .await;

        assert!(result.is_err());
    }
}
