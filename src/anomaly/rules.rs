use std::collections::{HashMap, HashSet};

use crate::config::{
    CircularFlowConfig, DustAttackConfig, FreshWalletConfig, RapidMovementConfig, SybilConfig,
    WashTradingConfig,
};
use crate::graph::blocks::{group_by_block, SUSPICIOUS_BLOCK_TX_COUNT};
use crate::graph::funding::FundingNode;
use crate::types::Transaction;

use super::types::{IndicatorType, Severity, SuspiciousIndicator};

const RAPID_MAX_SCORE: u32 = 30;
const SAME_BLOCK_MAX_SCORE: u32 = 25;
const CIRCULAR_MAX_SCORE: u32 = 30;
const DUST_SCORE: u32 = 10;
const FRESH_WALLET_SCORE: u32 = 15;
const SYBIL_MAX_SCORE: u32 = 40;
const WASH_MAX_SCORE: u32 = 35;

/// Check for funds that pass straight through the wallet: a sizeable incoming
/// transfer followed within the hold window by an outgoing one of similar value.
pub fn check_rapid_movement(
    transactions: &[Transaction],
    config: &RapidMovementConfig,
) -> Option<SuspiciousIndicator> {
    let mut incoming: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.is_incoming && tx.value_eth() > config.min_value_eth)
        .collect();
    incoming.sort_by_key(|tx| tx.timestamp);

    let mut outgoing: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| !tx.is_incoming && tx.value_eth() > config.min_value_eth)
        .collect();
    outgoing.sort_by_key(|tx| tx.timestamp);

    let mut matches = 0u32;
    let mut evidence = Vec::new();

    for inc in &incoming {
        let value_in = inc.value_eth();
        let matched = outgoing.iter().find_map(|out| {
            let gap = out.timestamp.checked_sub(inc.timestamp)?;
            let similar = (out.value_eth() - value_in).abs() < value_in * config.value_tolerance;
            (gap > 0 && gap < config.max_hold_secs && similar).then_some(gap)
        });

        if let Some(gap) = matched {
            matches += 1;
            let hold_minutes = (gap as f64 / 60.0).round() as i64;
            if evidence.len() < 5 {
                evidence.push(format!(
                    "{} ETH held for {} min",
                    fixed(value_in, 4),
                    hold_minutes
                ));
            }
        }
    }

    if matches < config.min_matches {
        return None;
    }

    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::RapidMovement,
        severity: if matches >= 5 {
            Severity::High
        } else {
            Severity::Medium
        },
        description: format!("Funds rapidly passed through wallet {} times", matches),
        evidence,
        score: matches.saturating_mul(6).min(RAPID_MAX_SCORE),
    })
}

/// Check for blocks holding several of the wallet's transactions at once.
pub fn check_same_block_activity(transactions: &[Transaction]) -> Option<SuspiciousIndicator> {
    let suspicious: Vec<_> = group_by_block(transactions)
        .into_iter()
        .filter(|g| g.is_suspicious)
        .collect();

    let largest = suspicious.iter().map(|g| g.transactions.len()).max()?;
    let block_count = suspicious.len() as u32;

    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::SameBlockActivity,
        severity: if largest >= 5 {
            Severity::High
        } else {
            Severity::Medium
        },
        description: format!(
            "{} blocks with {}+ transactions (bot/MEV behavior)",
            block_count, SUSPICIOUS_BLOCK_TX_COUNT
        ),
        evidence: suspicious
            .iter()
            .take(3)
            .map(|g| {
                format!(
                    "Block {}: {} transactions",
                    g.block_number,
                    g.transactions.len()
                )
            })
            .collect(),
        score: block_count.saturating_mul(5).min(SAME_BLOCK_MAX_SCORE),
    })
}

/// Check for counterparties the wallet both received from and sent to.
pub fn check_circular_flow(
    transactions: &[Transaction],
    config: &CircularFlowConfig,
) -> Option<SuspiciousIndicator> {
    let mut received_from: HashSet<String> = HashSet::new();
    let mut sent_to: Vec<String> = Vec::new();
    let mut sent_seen: HashSet<String> = HashSet::new();

    for tx in transactions {
        if tx.is_incoming {
            if !tx.from.is_empty() {
                received_from.insert(tx.from.to_lowercase());
            }
        } else if let Some(to) = tx.to.as_deref().filter(|to| !to.is_empty()) {
            let to = to.to_lowercase();
            if sent_seen.insert(to.clone()) {
                sent_to.push(to);
            }
        }
    }

    let circular: Vec<&String> = sent_to
        .iter()
        .filter(|addr| received_from.contains(*addr))
        .collect();

    if circular.len() < config.min_addresses {
        return None;
    }

    let count = circular.len() as u32;
    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::CircularFlow,
        severity: if count >= 5 {
            Severity::High
        } else {
            Severity::Medium
        },
        description: format!("Circular fund flows detected with {} addresses", count),
        evidence: circular
            .iter()
            .take(5)
            .map(|addr| shorten(addr, 10))
            .collect(),
        score: count.saturating_mul(6).min(CIRCULAR_MAX_SCORE),
    })
}

/// Check for a burst of negligible incoming transfers.
pub fn check_dust_attack(
    transactions: &[Transaction],
    config: &DustAttackConfig,
) -> Option<SuspiciousIndicator> {
    let dust: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| {
            let value = tx.value_eth();
            tx.is_incoming && value > 0.0 && value < config.max_value_eth
        })
        .collect();

    if dust.len() < config.min_count {
        return None;
    }

    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::DustAttack,
        severity: Severity::Low,
        description: format!(
            "{} tiny incoming transactions (possible dust attack)",
            dust.len()
        ),
        evidence: dust
            .iter()
            .take(3)
            .map(|tx| format!("{} ETH from {}", fixed(tx.value_eth(), 8), shorten(&tx.from, 10)))
            .collect(),
        score: DUST_SCORE,
    })
}

/// Check for a young wallet that is already very active.
pub fn check_fresh_wallet(
    wallet_age: Option<u64>,
    transactions: &[Transaction],
    config: &FreshWalletConfig,
) -> Option<SuspiciousIndicator> {
    let age = wallet_age?;
    let tx_count = transactions.len();

    if age >= config.max_age_days || tx_count <= config.min_tx_count {
        return None;
    }

    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::FreshWallet,
        severity: Severity::Medium,
        description: format!(
            "New wallet ({} days) with high activity ({} txs)",
            age, tx_count
        ),
        evidence: vec![
            format!("Created {} days ago", age),
            format!("{} transactions", tx_count),
        ],
        score: FRESH_WALLET_SCORE,
    })
}

/// Check for addresses that show up both upstream and downstream of the wallet.
///
/// Every occurrence in the source tree is counted, so an address reached
/// through several source branches contributes once per branch.
pub fn check_sybil_pattern(
    sources: &FundingNode,
    destinations: &FundingNode,
    config: &SybilConfig,
) -> Option<SuspiciousIndicator> {
    let destination_set: HashSet<&str> = destinations.descendant_addresses().into_iter().collect();
    if destination_set.is_empty() {
        return None;
    }

    let overlap: Vec<&str> = sources
        .descendant_addresses()
        .into_iter()
        .filter(|addr| destination_set.contains(addr))
        .collect();

    if overlap.len() < config.min_overlap {
        return None;
    }

    let count = overlap.len() as u32;
    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::SybilFarming,
        severity: Severity::High,
        description: format!(
            "Potential Sybil network: {} addresses appear in both funding sources and destinations",
            count
        ),
        evidence: overlap.iter().take(5).map(|addr| shorten(addr, 16)).collect(),
        score: count.saturating_mul(8).min(SYBIL_MAX_SCORE),
    })
}

/// Check for repeated identical-value transfers between the same two parties.
pub fn check_wash_trading(
    transactions: &[Transaction],
    config: &WashTradingConfig,
) -> Option<SuspiciousIndicator> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tallies: Vec<(String, u32)> = Vec::new();

    for tx in transactions {
        let Some(to) = tx.to.as_deref() else {
            continue;
        };
        let (a, b) = if tx.from.as_str() <= to {
            (tx.from.as_str(), to)
        } else {
            (to, tx.from.as_str())
        };
        let key = format!("{}-{}:{}", a, b, fixed(tx.value_eth(), 4));

        match index.get(&key) {
            Some(&i) => tallies[i].1 += 1,
            None => {
                index.insert(key.clone(), tallies.len());
                tallies.push((key, 1));
            }
        }
    }

    let mut repeated: Vec<(String, u32)> = tallies
        .into_iter()
        .filter(|(_, count)| *count >= config.min_repeats)
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1));

    let max_repeats = repeated.first()?.1;

    Some(SuspiciousIndicator {
        indicator_type: IndicatorType::WashTrading,
        severity: if max_repeats >= 10 {
            Severity::High
        } else {
            Severity::Medium
        },
        description: format!(
            "{} address pairs with repeated identical transfers",
            repeated.len()
        ),
        evidence: repeated
            .iter()
            .take(3)
            .map(|(_, count)| format!("{}x identical transfers", count))
            .collect(),
        score: max_repeats.saturating_mul(3).min(WASH_MAX_SCORE),
    })
}

/// Format with `decimals` places, rounding exact halves away from zero.
///
/// `{:.N}` alone rounds binary ties to even (`1.03125` becomes `1.0312`), which
/// would split otherwise identical wash-trading keys from upstream reports.
pub(crate) fn fixed(value: f64, decimals: i32) -> String {
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    let rounded = if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    };
    format!("{:.*}", decimals as usize, rounded)
}

/// First `len` characters of an address followed by an ellipsis.
fn shorten(address: &str, len: usize) -> String {
    let prefix: String = address.chars().take(len).collect();
    format!("{}...", prefix)
}
