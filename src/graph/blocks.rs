use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Transaction;

/// Blocks with at least this many wallet transactions look automated.
pub const SUSPICIOUS_BLOCK_TX_COUNT: usize = 3;

const SAME_BLOCK_REASON: &str = "Multiple transactions in same block (possible bot/MEV)";

/// Transactions of the analyzed wallet that landed in the same block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockActivityGroup {
    pub block_number: u64,
    /// Timestamp of the first transaction seen in this block.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub is_suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Group transactions by block number, keeping only blocks with more than one
/// transaction. Groups are ordered by size, largest first; equal sizes keep
/// the order in which their block was first encountered.
pub fn group_by_block(transactions: &[Transaction]) -> Vec<BlockActivityGroup> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut buckets: Vec<(u64, Vec<&Transaction>)> = Vec::new();

    for tx in transactions {
        match index.get(&tx.block_number) {
            Some(&i) => buckets[i].1.push(tx),
            None => {
                index.insert(tx.block_number, buckets.len());
                buckets.push((tx.block_number, vec![tx]));
            }
        }
    }

    let mut groups: Vec<BlockActivityGroup> = buckets
        .into_iter()
        .filter(|(_, txs)| txs.len() > 1)
        .map(|(block_number, txs)| {
            let is_suspicious = txs.len() >= SUSPICIOUS_BLOCK_TX_COUNT;
            BlockActivityGroup {
                block_number,
                timestamp: txs[0].timestamp,
                transactions: txs.into_iter().cloned().collect(),
                is_suspicious,
                reason: is_suspicious.then(|| SAME_BLOCK_REASON.to_string()),
            }
        })
        .collect();

    // sort_by is stable
    groups.sort_by(|a, b| b.transactions.len().cmp(&a.transactions.len()));
    groups
}
