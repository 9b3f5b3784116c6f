use serde::{Deserialize, Serialize};

use crate::anomaly::types::{RiskLevel, SuspiciousIndicator};
use crate::compare::ComparedWallet;
use crate::graph::cluster::{WalletFunding, DEFAULT_MIN_CLUSTER_SIZE};
use crate::types::Transaction;
use crate::wallet::metadata::InfrastructureMatch;

// ============================================================
// Request bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct RiskScoreRequest {
    #[serde(default)]
    pub indicators: Vec<SuspiciousIndicator>,
}

#[derive(Debug, Deserialize)]
pub struct BlocksRequest {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    #[serde(default = "default_chain")]
    pub chain: String,
    pub address: String,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub is_contract: bool,
    /// Unix timestamp of the wallet's first transaction.
    pub first_tx_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SybilClustersRequest {
    /// Chain used to label known funding sources.
    #[serde(default = "default_chain")]
    pub chain: String,
    pub wallets: Vec<WalletFunding>,
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub wallets: Vec<ComparedWallet>,
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

fn default_chain() -> String {
    "ethereum".to_string()
}

// ============================================================
// Response types
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RiskScoreResponse {
    pub score: u32,
    pub level: RiskLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub is_infrastructure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<InfrastructureMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_age: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
