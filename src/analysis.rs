use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::anomaly::engine::{calculate_risk_score, risk_level, SuspiciousDetector};
use crate::anomaly::types::{RiskLevel, SuspiciousIndicator};
use crate::graph::blocks::{group_by_block, BlockActivityGroup};
use crate::graph::funding::FundingNode;
use crate::types::{AnalysisContext, Transaction, TxCategory, TxStatus};

const SECONDS_PER_DAY: i128 = 86_400;
const TOP_COUNTERPARTIES: usize = 5;

/// Result of running the detector over one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub suspicious_indicators: Vec<SuspiciousIndicator>,
    pub overall_risk_score: u32,
    pub risk_level: RiskLevel,
    pub same_block_transactions: Vec<BlockActivityGroup>,
    pub summary: WalletSummary,
}

/// Activity totals for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub total_transactions: usize,
    pub successful_txs: usize,
    pub failed_txs: usize,
    /// Native transfers and contract calls only; token and NFT values use other units.
    pub total_value_sent_eth: f64,
    pub total_value_received_eth: f64,
    pub unique_interacted_addresses: usize,
    pub top_funding_sources: Vec<CounterpartyValue>,
    pub top_funding_destinations: Vec<CounterpartyValue>,
    pub activity_period_days: u64,
    pub average_tx_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyValue {
    pub address: String,
    pub value_eth: f64,
}

/// Detect suspicious patterns, score them and group same-block activity for reporting.
pub fn analyze(detector: &SuspiciousDetector, context: &AnalysisContext) -> AnalysisReport {
    let suspicious_indicators = detector.detect(context);
    let overall_risk_score = calculate_risk_score(&suspicious_indicators);
    let risk_level = risk_level(overall_risk_score);
    let same_block_transactions = group_by_block(&context.transactions);
    let summary = summarize(context);

    for indicator in &suspicious_indicators {
        tracing::warn!(
            indicator = indicator.indicator_type.as_str(),
            severity = indicator.severity.as_str(),
            score = indicator.score,
            evidence = ?indicator.evidence,
            "SUSPICIOUS ACTIVITY"
        );
    }

    tracing::info!(
        transactions = context.transactions.len(),
        indicators = suspicious_indicators.len(),
        risk_score = overall_risk_score,
        risk_level = risk_level.as_str(),
        infrastructure = context.is_infrastructure,
        active_days = summary.activity_period_days,
        "Wallet analysis complete"
    );

    AnalysisReport {
        suspicious_indicators,
        overall_risk_score,
        risk_level,
        same_block_transactions,
        summary,
    }
}

/// Totals, counterparties and activity span for a wallet's transaction history.
pub fn summarize(context: &AnalysisContext) -> WalletSummary {
    let txs = &context.transactions;

    let successful_txs = txs.iter().filter(|tx| tx.status == TxStatus::Success).count();
    let failed_txs = txs.iter().filter(|tx| tx.status == TxStatus::Failed).count();

    let mut total_value_sent_eth = 0.0;
    let mut total_value_received_eth = 0.0;
    for tx in txs.iter().filter(|tx| is_native_value(tx)) {
        if tx.is_incoming {
            total_value_received_eth += tx.value_eth();
        } else {
            total_value_sent_eth += tx.value_eth();
        }
    }

    let mut unique: HashSet<&str> = HashSet::new();
    for tx in txs {
        unique.insert(tx.from.as_str());
        if let Some(to) = tx.to.as_deref() {
            unique.insert(to);
        }
    }

    let activity_period_days = activity_period_days(txs);

    WalletSummary {
        total_transactions: txs.len(),
        successful_txs,
        failed_txs,
        total_value_sent_eth,
        total_value_received_eth,
        unique_interacted_addresses: unique.len(),
        top_funding_sources: top_counterparties(&context.funding_sources),
        top_funding_destinations: top_counterparties(&context.funding_destinations),
        activity_period_days,
        average_tx_per_day: txs.len() as f64 / activity_period_days as f64,
    }
}

fn is_native_value(tx: &Transaction) -> bool {
    matches!(tx.category, TxCategory::Transfer | TxCategory::ContractCall)
}

/// Whole days between the first and last dated transaction, never less than one.
fn activity_period_days(txs: &[Transaction]) -> u64 {
    let mut dated = txs.iter().map(|tx| tx.timestamp).filter(|&ts| ts > 0);
    let Some(first) = dated.next() else {
        return 1;
    };
    let (min, max) = dated.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));

    let span = i128::from(max) - i128::from(min);
    let days = (span + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u64::try_from(days).unwrap_or(u64::MAX).max(1)
}

/// Direct children by value, highest first, ties kept in tree order.
fn top_counterparties(root: &FundingNode) -> Vec<CounterpartyValue> {
    let mut children: Vec<&FundingNode> = root.children.iter().collect();
    children.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    children
        .into_iter()
        .take(TOP_COUNTERPARTIES)
        .map(|c| CounterpartyValue {
            address: c.address.clone(),
            value_eth: c.total_value,
        })
        .collect()
}
