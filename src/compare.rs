use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::funding::FundingNode;
use crate::types::{AnalysisContext, Transaction, TxCategory};

const MAX_CORRELATION_SCORE: u32 = 100;

/// One wallet in a comparison: its address plus the usual analysis inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedWallet {
    pub address: String,
    #[serde(flatten)]
    pub context: AnalysisContext,
}

/// Links found between a set of wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCorrelation {
    pub common_funding_sources: Vec<String>,
    pub common_destinations: Vec<String>,
    /// Contracts every wallet called, lower-cased.
    pub shared_projects: Vec<String>,
    pub direct_transfers: Vec<Transaction>,
    pub correlation_score: u32,
}

/// Compare wallets for shared funding, shared contract usage and transfers
/// between each other.
pub fn compare_wallets(wallets: &[ComparedWallet]) -> WalletCorrelation {
    let sources: Vec<Vec<&str>> = wallets
        .iter()
        .map(|w| tree_addresses(&w.context.funding_sources))
        .collect();
    let destinations: Vec<Vec<&str>> = wallets
        .iter()
        .map(|w| tree_addresses(&w.context.funding_destinations))
        .collect();
    let common_funding_sources = common_elements(&sources);
    let common_destinations = common_elements(&destinations);

    // Per-wallet project lists are distinct, so a count equal to the wallet
    // count means every wallet used the contract
    let mut project_counts: HashMap<String, usize> = HashMap::new();
    let mut project_order: Vec<String> = Vec::new();
    for wallet in wallets {
        for project in contracts_called(&wallet.context.transactions) {
            let count = project_counts.entry(project.clone()).or_insert(0);
            if *count == 0 {
                project_order.push(project);
            }
            *count += 1;
        }
    }
    let shared_projects: Vec<String> = project_order
        .into_iter()
        .filter(|p| project_counts.get(p) == Some(&wallets.len()))
        .collect();
    let shared_project_entries = shared_projects.len() * wallets.len();

    let members: HashSet<String> = wallets.iter().map(|w| w.address.to_lowercase()).collect();
    let direct_transfers: Vec<Transaction> = wallets
        .iter()
        .flat_map(|w| w.context.transactions.iter())
        .filter(|tx| {
            members.contains(&tx.from.to_lowercase())
                && tx.to.as_deref().is_some_and(|to| members.contains(&to.to_lowercase()))
        })
        .cloned()
        .collect();

    let correlation_score = correlation_score(
        common_funding_sources.len(),
        common_destinations.len(),
        shared_project_entries,
        direct_transfers.len(),
    );

    tracing::debug!(
        wallets = wallets.len(),
        common_sources = common_funding_sources.len(),
        shared_projects = shared_projects.len(),
        direct_transfers = direct_transfers.len(),
        score = correlation_score,
        "Wallet comparison complete"
    );

    WalletCorrelation {
        common_funding_sources,
        common_destinations,
        shared_projects,
        direct_transfers,
        correlation_score,
    }
}

/// Weighted link count, each signal capped: sources 30, destinations 25,
/// projects 25, direct transfers 20.
pub fn correlation_score(
    common_sources: usize,
    common_destinations: usize,
    shared_projects: usize,
    direct_transfers: usize,
) -> u32 {
    let part = |count: usize, weight: u32, cap: u32| {
        u32::try_from(count)
            .unwrap_or(u32::MAX)
            .saturating_mul(weight)
            .min(cap)
    };

    (part(common_sources, 10, 30)
        + part(common_destinations, 8, 25)
        + part(shared_projects, 5, 25)
        + part(direct_transfers, 4, 20))
    .min(MAX_CORRELATION_SCORE)
}

/// Entries of the first list present in every other list, in first-list order.
/// A single list is returned as is.
pub fn common_elements(lists: &[Vec<&str>]) -> Vec<String> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let rest: Vec<HashSet<&str>> = rest.iter().map(|l| l.iter().copied().collect()).collect();

    first
        .iter()
        .filter(|item| rest.iter().all(|set| set.contains(*item)))
        .map(|item| item.to_string())
        .collect()
}

/// The root address followed by every descendant, pre-order.
fn tree_addresses(root: &FundingNode) -> Vec<&str> {
    let mut addresses = vec![root.address.as_str()];
    addresses.extend(root.descendant_addresses());
    addresses
}

/// Distinct contracts the wallet called, lower-cased, first-seen order.
fn contracts_called(transactions: &[Transaction]) -> Vec<String> {
    let mut seen = HashSet::new();
    transactions
        .iter()
        .filter(|tx| tx.category == TxCategory::ContractCall)
        .filter_map(|tx| tx.to.as_deref())
        .map(str::to_lowercase)
        .filter(|to| seen.insert(to.clone()))
        .collect()
}
