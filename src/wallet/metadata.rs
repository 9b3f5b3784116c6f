use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::InfrastructureConfig;

const SECS_PER_DAY: i64 = 86_400;

/// Why a wallet is treated as infrastructure rather than an individual user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureType {
    Exchange,
    Bridge,
    Contract,
    Mixer,
    HighVolume,
    HighVolumeContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureMatch {
    pub infrastructure_type: InfrastructureType,
    pub label: String,
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    chain: String,
    addresses: Vec<KnownAddress>,
}

#[derive(Debug, Deserialize)]
struct KnownAddress {
    address: String,
    name: String,
    kind: InfrastructureType,
}

/// Known exchange, bridge and protocol addresses, keyed by chain then
/// lower-case `0x` address.
#[derive(Debug, Default)]
pub struct InfrastructureRegistry {
    by_chain: HashMap<String, HashMap<String, InfrastructureMatch>>,
}

impl InfrastructureRegistry {
    /// Load the registry from a JSON file.
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read known addresses file '{}': {}", path, e))?;
        let registry = Self::from_json(&content)?;

        tracing::info!(
            chains = registry.by_chain.len(),
            addresses = registry.len(),
            "Loaded infrastructure registry"
        );
        Ok(registry)
    }

    pub fn from_json(content: &str) -> eyre::Result<Self> {
        let entries: Vec<ChainEntry> = serde_json::from_str(content)
            .map_err(|e| eyre::eyre!("Failed to parse known addresses JSON: {}", e))?;

        let mut by_chain: HashMap<String, HashMap<String, InfrastructureMatch>> = HashMap::new();
        for entry in entries {
            let chain = by_chain.entry(entry.chain.to_lowercase()).or_default();
            for known in entry.addresses {
                let address = Address::from_str(&known.address)
                    .map_err(|e| eyre::eyre!("Invalid address '{}': {}", known.address, e))?;
                chain.insert(
                    normalize(&address),
                    InfrastructureMatch {
                        infrastructure_type: known.kind,
                        label: known.name,
                    },
                );
            }
        }

        Ok(Self { by_chain })
    }

    /// Look up a known address. Unparseable addresses are never known.
    pub fn lookup(&self, chain: &str, address: &str) -> Option<&InfrastructureMatch> {
        let address = Address::from_str(address).ok()?;
        self.by_chain
            .get(&chain.to_lowercase())?
            .get(&normalize(&address))
    }

    pub fn len(&self) -> usize {
        self.by_chain.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Decide whether a wallet is infrastructure: a registry hit wins, otherwise
/// very high transaction counts mark it as a high-volume service.
pub fn classify_wallet(
    registry: &InfrastructureRegistry,
    config: &InfrastructureConfig,
    chain: &str,
    address: &str,
    tx_count: u64,
    is_contract: bool,
) -> Option<InfrastructureMatch> {
    if let Some(known) = registry.lookup(chain, address) {
        return Some(known.clone());
    }

    if tx_count > config.high_volume_tx_count {
        return Some(InfrastructureMatch {
            infrastructure_type: InfrastructureType::HighVolume,
            label: "High Activity (Possible Infrastructure)".to_string(),
        });
    }

    if is_contract && tx_count > config.high_volume_contract_tx_count {
        return Some(InfrastructureMatch {
            infrastructure_type: InfrastructureType::HighVolumeContract,
            label: "High Activity Contract".to_string(),
        });
    }

    None
}

/// Whole days elapsed since the wallet's first transaction. Zero if the
/// timestamp lies in the future.
pub fn wallet_age_days(first_tx_timestamp: i64, now: DateTime<Utc>) -> u64 {
    let elapsed = now.timestamp().saturating_sub(first_tx_timestamp);
    (elapsed.max(0) / SECS_PER_DAY) as u64
}
