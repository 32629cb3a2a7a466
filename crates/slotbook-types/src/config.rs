//! Configuration types for SlotBook clients and the deployment tool.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, SettlementAddr, SlotbookError, constants};

/// Which network a deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

/// Transaction builder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Where leftover funding goes. `None` leaves it to the network as fee.
    pub change_address: Option<SettlementAddr>,
    /// Satoshis left unclaimed for the network.
    pub fee: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            change_address: None,
            fee: constants::DEFAULT_TX_FEE,
        }
    }
}

/// One-shot deployment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub network: Network,
    /// Satoshis locked into the contract output.
    pub initial_balance: u64,
    /// Where the contract script hash is written.
    pub script_hash_file: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            initial_balance: constants::DEFAULT_DEPLOY_BALANCE,
            script_hash_file: constants::DEFAULT_SCRIPT_HASH_FILE.to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotbookConfig {
    pub deploy: DeployConfig,
    pub builder: BuilderConfig,
    pub log: LogConfig,
}

impl SlotbookConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlotbookError::Configuration(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SlotbookConfig::default();
        assert_eq!(cfg.deploy.initial_balance, 1);
        assert_eq!(cfg.deploy.script_hash_file, ".scriptHash");
        assert_eq!(cfg.deploy.network, Network::Testnet);
        assert_eq!(cfg.builder.fee, constants::DEFAULT_TX_FEE);
        assert!(cfg.builder.change_address.is_none());
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SlotbookConfig::from_json_str(
            r#"{ "deploy": { "network": "mainnet" }, "builder": { "fee": 0 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.deploy.network, Network::Mainnet);
        assert_eq!(cfg.deploy.initial_balance, 1);
        assert_eq!(cfg.builder.fee, 0);
        assert!(!cfg.log.json);
    }

    #[test]
    fn bad_json_is_configuration_error() {
        let err = SlotbookConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, SlotbookError::Configuration(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SlotbookConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SlotbookError::Io(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let mut cfg = SlotbookConfig::default();
        cfg.builder.change_address = Some(SettlementAddr([3; constants::ADDR_LEN]));
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(SlotbookConfig::from_json_str(&json).unwrap(), cfg);
    }
}
