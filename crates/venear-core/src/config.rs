//! Configuration types for the planner

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DUST_THRESHOLD_YOCTO, DEFAULT_GAS_RESERVE_YOCTO, NEAR_DECIMALS};
use crate::{AccountId, Amount, Network};

/// A liquid staking token that may be locked for voting power
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub contract_id: AccountId,
    pub symbol: String,
    #[serde(default = "default_token_decimals")]
    pub decimals: u32,
}

fn default_token_decimals() -> u32 {
    NEAR_DECIMALS
}

/// Governance contract and token ids for a network
#[derive(Debug, Clone)]
pub struct ContractIds {
    pub venear_contract: AccountId,
    pub liquid_staking_tokens: Vec<TokenConfig>,
}

impl ContractIds {
    /// Get contract ids for a network
    pub fn for_network(network: Network) -> Self {
        let lst = |contract: &str, symbol: &str| TokenConfig {
            contract_id: AccountId::new(contract),
            symbol: symbol.to_string(),
            decimals: NEAR_DECIMALS,
        };

        match network {
            Network::Mainnet => Self {
                venear_contract: AccountId::new("venear.dao"),
                liquid_staking_tokens: vec![
                    lst("meta-pool.near", "stNEAR"),
                    lst("linear-protocol.near", "LiNEAR"),
                    lst("lst.rhealab.near", "rNEAR"),
                ],
            },
            Network::Testnet => Self {
                venear_contract: AccountId::new("v.hos03.testnet"),
                liquid_staking_tokens: vec![
                    lst("meta-v2.pool.testnet", "stNEAR"),
                    lst("linear-protocol.testnet", "LiNEAR"),
                ],
            },
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network (mainnet or testnet)
    pub network: Network,

    /// veNEAR governance contract
    pub venear_contract_id: AccountId,

    /// Lockable liquid staking tokens, in display order
    #[serde(default)]
    pub liquid_staking_tokens: Vec<TokenConfig>,

    /// Native balance withheld for gas when locking NEAR
    #[serde(default = "default_gas_reserve")]
    pub gas_reserve: Amount,

    /// Balances below this are shown as zero
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: Amount,

    /// Time-to-live for cached account state reads
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_gas_reserve() -> Amount {
    Amount::from(DEFAULT_GAS_RESERVE_YOCTO)
}

fn default_dust_threshold() -> Amount {
    Amount::from(DEFAULT_DUST_THRESHOLD_YOCTO)
}

fn default_cache_ttl_secs() -> u64 {
    15
}

impl AppConfig {
    pub fn for_network(network: Network) -> Self {
        let ids = ContractIds::for_network(network);
        Self {
            network,
            venear_contract_id: ids.venear_contract,
            liquid_staking_tokens: ids.liquid_staking_tokens,
            gas_reserve: default_gas_reserve(),
            dust_threshold: default_dust_threshold(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }

    /// Look up a configured token by contract id
    pub fn token(&self, contract_id: &AccountId) -> Option<&TokenConfig> {
        self.liquid_staking_tokens
            .iter()
            .find(|t| &t.contract_id == contract_id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.venear_contract_id.as_str(), "venear.dao");
        assert_eq!(config.cache_ttl_secs, 15);
        assert!(!config.liquid_staking_tokens.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::for_network(Network::Testnet);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.network, Network::Testnet);
        assert_eq!(parsed.gas_reserve, config.gas_reserve);
        assert_eq!(parsed.liquid_staking_tokens, config.liquid_staking_tokens);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let json = r#"{"network":"mainnet","venear_contract_id":"venear.dao"}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.gas_reserve, Amount::from(DEFAULT_GAS_RESERVE_YOCTO));
        assert_eq!(parsed.dust_threshold, Amount::from(DEFAULT_DUST_THRESHOLD_YOCTO));
        assert!(parsed.liquid_staking_tokens.is_empty());
    }

    #[test]
    fn test_token_lookup() {
        let config = AppConfig::default();
        let token = config.token(&AccountId::new("meta-pool.near")).unwrap();
        assert_eq!(token.symbol, "stNEAR");
        assert!(config.token(&AccountId::new("unknown.near")).is_none());
    }
}
