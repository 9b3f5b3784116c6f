use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::anomaly::rules::fixed;

/// Smallest group of co-funded wallets reported as a cluster.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

const HIGH_RISK_SCORE: u32 = 60;
const MEDIUM_RISK_SCORE: u32 = 30;
const SHORT_SPAN_HOURS: f64 = 48.0;
const VERY_SHORT_SPAN_HOURS: f64 = 6.0;

const MAX_SIZE_SCORE: f64 = 60.0;
const SIZE_SCORE_FULL_AT: f64 = 20.0;
const VERY_SHORT_SPAN_SCORE: f64 = 30.0;
const SHORT_SPAN_SCORE: f64 = 15.0;
const SIMILAR_AMOUNT_SCORE: f64 = 10.0;
const KNOWN_SOURCE_DISCOUNT: f64 = 30.0;

/// First funding transfer observed for a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletFunding {
    pub address: String,
    /// Sender of the first incoming transfer; `None` when it could not be found.
    #[serde(default)]
    pub funder: Option<String>,
    #[serde(default)]
    pub funding_timestamp: Option<i64>,
    #[serde(default)]
    pub funding_amount: f64,
    #[serde(default = "default_interactions")]
    pub interaction_count: u32,
}

fn default_interactions() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingTimeSpan {
    pub first: i64,
    pub last: i64,
    pub duration_hours: f64,
}

/// Wallets sharing one funding source, with their Sybil score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SybilCluster {
    pub funding_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_source_label: Option<String>,
    pub wallets: Vec<WalletFunding>,
    pub total_wallets: usize,
    pub total_interactions: u64,
    pub average_funding_amount: f64,
    pub time_span: FundingTimeSpan,
    pub sybil_score: u32,
    pub flags: Vec<String>,
}

/// Wallet counts per risk band, summed over clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub high_risk_wallets: usize,
    pub medium_risk_wallets: usize,
    pub low_risk_wallets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub total_wallets: usize,
    pub clusters: Vec<SybilCluster>,
    /// Clusters scoring at least medium risk.
    pub flagged_clusters: Vec<SybilCluster>,
    pub summary: ClusterSummary,
}

/// Group wallets by funder, score every cluster and summarize.
///
/// Wallets are de-duplicated by lower-cased address (first entry wins).
/// `label_of` names well-known funding sources such as exchange hot wallets;
/// labelled clusters get a score discount. Clusters are ordered by score,
/// highest first, ties in first-seen funder order.
pub fn analyze_clusters(
    wallets: &[WalletFunding],
    min_size: usize,
    label_of: impl Fn(&str) -> Option<String>,
) -> ClusterReport {
    let mut seen = HashSet::new();
    let unique: Vec<&WalletFunding> = wallets
        .iter()
        .filter(|w| seen.insert(w.address.to_lowercase()))
        .collect();

    let mut clusters: Vec<SybilCluster> = cluster_by_funding_source(&unique, min_size)
        .into_iter()
        .map(|mut cluster| {
            cluster.funding_source_label = label_of(&cluster.funding_source);
            score_cluster(&mut cluster);
            cluster
        })
        .collect();
    clusters.sort_by(|a, b| b.sybil_score.cmp(&a.sybil_score));

    let flagged_clusters = clusters
        .iter()
        .filter(|c| c.sybil_score >= MEDIUM_RISK_SCORE)
        .cloned()
        .collect();
    let summary = summarize(&clusters);

    tracing::debug!(
        wallets = unique.len(),
        clusters = clusters.len(),
        high_risk_wallets = summary.high_risk_wallets,
        "Clustered wallets by funding source"
    );

    ClusterReport {
        total_wallets: unique.len(),
        clusters,
        flagged_clusters,
        summary,
    }
}

/// Unscored clusters of at least `min_size` wallets, in first-seen funder order.
/// Wallets without a known funder never form a cluster.
fn cluster_by_funding_source(wallets: &[&WalletFunding], min_size: usize) -> Vec<SybilCluster> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<WalletFunding>)> = Vec::new();

    for wallet in wallets {
        let Some(funder) = wallet.funder.as_deref().filter(|f| !f.is_empty()) else {
            continue;
        };
        let funder = funder.to_lowercase();
        match index.get(&funder) {
            Some(&i) => groups[i].1.push((*wallet).clone()),
            None => {
                index.insert(funder.clone(), groups.len());
                groups.push((funder, vec![(*wallet).clone()]));
            }
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= min_size.max(1))
        .map(|(funding_source, members)| {
            let timestamps: Vec<i64> = members
                .iter()
                .filter_map(|m| m.funding_timestamp)
                .filter(|&ts| ts != 0)
                .collect();
            let first = timestamps.iter().copied().min().unwrap_or(0);
            let last = timestamps.iter().copied().max().unwrap_or(0);

            let total_funding: f64 = members.iter().map(|m| m.funding_amount).sum();

            SybilCluster {
                funding_source,
                funding_source_label: None,
                total_wallets: members.len(),
                total_interactions: members.iter().map(|m| u64::from(m.interaction_count)).sum(),
                average_funding_amount: total_funding / members.len() as f64,
                time_span: FundingTimeSpan {
                    first,
                    last,
                    duration_hours: (last as f64 - first as f64) / 3600.0,
                },
                wallets: members,
                sybil_score: 0,
                flags: Vec::new(),
            }
        })
        .collect()
}

/// Score a cluster 0-100 from its size, funding burst, amount uniformity
/// and whether the source is a known service.
fn score_cluster(cluster: &mut SybilCluster) {
    let mut score = (cluster.total_wallets as f64 / SIZE_SCORE_FULL_AT * MAX_SIZE_SCORE)
        .min(MAX_SIZE_SCORE);
    let mut flags = Vec::new();

    if cluster.total_wallets >= 5 {
        flags.push(format!("Cluster: {} wallets from same source", cluster.total_wallets));
    }

    let hours = cluster.time_span.duration_hours;
    if hours > 0.0 {
        if hours <= VERY_SHORT_SPAN_HOURS {
            score += VERY_SHORT_SPAN_SCORE;
            flags.push(format!("All funded within {}h", fixed(hours, 1)));
        } else if hours <= SHORT_SPAN_HOURS {
            score += SHORT_SPAN_SCORE;
            flags.push("Funded within 48h window".to_string());
        }
    }

    if cluster.wallets.len() >= 3 {
        let n = cluster.wallets.len() as f64;
        let mean = cluster.wallets.iter().map(|w| w.funding_amount).sum::<f64>() / n;
        let variance = cluster
            .wallets
            .iter()
            .map(|w| (w.funding_amount - mean).powi(2))
            .sum::<f64>()
            / n;
        if variance.sqrt() < mean * 0.1 && mean > 0.001 {
            score += SIMILAR_AMOUNT_SCORE;
            flags.push(format!("Similar funding amounts (~{} ETH)", fixed(mean, 4)));
        }
    }

    if let Some(label) = &cluster.funding_source_label {
        score = (score - KNOWN_SOURCE_DISCOUNT).max(0.0);
        flags.push(format!("Known source: {}", label));
    }

    cluster.sybil_score = score.round().clamp(0.0, 100.0) as u32;
    cluster.flags = flags;
}

fn summarize(clusters: &[SybilCluster]) -> ClusterSummary {
    let mut summary = ClusterSummary::default();
    for cluster in clusters {
        if cluster.sybil_score >= HIGH_RISK_SCORE {
            summary.high_risk_wallets += cluster.total_wallets;
        } else if cluster.sybil_score >= MEDIUM_RISK_SCORE {
            summary.medium_risk_wallets += cluster.total_wallets;
        } else {
            summary.low_risk_wallets += cluster.total_wallets;
        }
    }
    summary
}
