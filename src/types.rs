use serde::{Deserialize, Serialize};

use crate::graph::funding::FundingNode;

/// Execution outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failed,
}

/// Normalized transaction category as produced by the transaction provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxCategory {
    Transfer,
    TokenTransfer,
    NftTransfer,
    ContractCall,
    ContractCreation,
    #[serde(other)]
    Unknown,
}

/// A normalized transaction touching the analyzed wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// Absent on contract creation.
    #[serde(default)]
    pub to: Option<String>,
    pub value_in_eth: f64,
    pub timestamp: i64,
    pub block_number: u64,
    /// Relative to the analyzed wallet.
    pub is_incoming: bool,
    pub status: TxStatus,
    pub category: TxCategory,
}

impl Transaction {
    /// Value in ETH with negative and NaN inputs clamped to zero.
    pub fn value_eth(&self) -> f64 {
        if self.value_in_eth.is_nan() || self.value_in_eth < 0.0 {
            0.0
        } else {
            self.value_in_eth
        }
    }
}

/// Everything the detector needs for a single wallet analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub funding_sources: FundingNode,
    pub funding_destinations: FundingNode,
    /// Days since first activity, if known.
    #[serde(default)]
    pub wallet_age: Option<u64>,
    /// Known exchange, bridge or protocol wallet.
    #[serde(default)]
    pub is_infrastructure: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_clamping() {
        let mut tx = Transaction {
            hash: "0x01".to_string(),
            from: "0xaaa".to_string(),
            to: None,
            value_in_eth: -1.5,
            timestamp: 0,
            block_number: 1,
            is_incoming: true,
            status: TxStatus::Success,
            category: TxCategory::Transfer,
        };
        assert_eq!(tx.value_eth(), 0.0);
        tx.value_in_eth = f64::NAN;
        assert_eq!(tx.value_eth(), 0.0);
        tx.value_in_eth = 0.25;
        assert_eq!(tx.value_eth(), 0.25);
    }

    #[test]
    fn test_parse_context_json() {
        let json = r#"{
            "transactions": [{
                "hash": "0xabc",
                "from": "0x1111111111111111111111111111111111111111",
                "valueInEth": 1.5,
                "timestamp": 1700000000,
                "blockNumber": 18000000,
                "isIncoming": true,
                "status": "success",
                "category": "internal_call"
            }],
            "fundingSources": { "address": "0xroot", "totalValue": 1.5 },
            "fundingDestinations": { "address": "0xroot", "totalValue": 0.0, "children": [] },
            "walletAge": 12
        }"#;

        let ctx: AnalysisContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.transactions.len(), 1);
        assert_eq!(ctx.transactions[0].to, None);
        assert_eq!(ctx.transactions[0].category, TxCategory::Unknown);
        assert_eq!(ctx.transactions[0].block_number, 18_000_000);
        assert!(ctx.funding_sources.children.is_empty());
        assert_eq!(ctx.wallet_age, Some(12));
        assert!(!ctx.is_infrastructure);
    }
}
