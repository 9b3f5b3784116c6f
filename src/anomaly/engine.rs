use crate::config::DetectionConfig;
use crate::types::AnalysisContext;

use super::rules;
use super::types::{RiskLevel, SuspiciousIndicator};

const MAX_RISK_SCORE: u32 = 100;

/// The suspicious activity detector. Runs every pattern check against one
/// wallet's analysis context.
///
/// Holds only configuration, so a single instance can be shared freely
/// between concurrent analyses.
#[derive(Debug, Clone, Default)]
pub struct SuspiciousDetector {
    config: DetectionConfig,
}

impl SuspiciousDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Run all detection patterns. Output order is fixed: the organic-behavior
    /// checks (rapid movement, same-block activity, Sybil pattern) first, then
    /// circular flow, dust attack, fresh wallet and wash trading.
    pub fn detect(&self, context: &AnalysisContext) -> Vec<SuspiciousIndicator> {
        if !self.config.enabled {
            return Vec::new();
        }

        let txs = &context.transactions;
        let mut indicators = Vec::new();

        // Exchanges, bridges and protocols move funds like this routinely
        if context.is_infrastructure {
            tracing::debug!("Infrastructure wallet, skipping organic behavior checks");
        } else {
            indicators.extend(rules::check_rapid_movement(txs, &self.config.rapid_movement));
            indicators.extend(rules::check_same_block_activity(txs));
            indicators.extend(rules::check_sybil_pattern(
                &context.funding_sources,
                &context.funding_destinations,
                &self.config.sybil,
            ));
        }

        indicators.extend(rules::check_circular_flow(txs, &self.config.circular_flow));
        indicators.extend(rules::check_dust_attack(txs, &self.config.dust_attack));
        indicators.extend(rules::check_fresh_wallet(
            context.wallet_age,
            txs,
            &self.config.fresh_wallet,
        ));
        indicators.extend(rules::check_wash_trading(txs, &self.config.wash_trading));

        for indicator in &indicators {
            tracing::debug!(
                indicator = indicator.indicator_type.as_str(),
                score = indicator.score,
                organic = indicator.indicator_type.is_organic_behavior(),
                "Pattern matched"
            );
        }

        indicators
    }
}

/// Sum of indicator scores, capped at 100. Works on any indicator list,
/// not only the detector's own output.
pub fn calculate_risk_score(indicators: &[SuspiciousIndicator]) -> u32 {
    indicators
        .iter()
        .fold(0u32, |sum, ind| sum.saturating_add(ind.score))
        .min(MAX_RISK_SCORE)
}

/// Bucket an aggregate score into a risk level.
pub fn risk_level(score: u32) -> RiskLevel {
    RiskLevel::from_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::types::{IndicatorType, Severity};
    use crate::graph::funding::FundingNode;
    use crate::types::{Transaction, TxCategory, TxStatus};

    const WALLET: &str = "0x9999999999999999999999999999999999999999";

    fn addr(n: u32) -> String {
        format!("0x{:040x}", n)
    }

    fn tx(
        from: &str,
        to: &str,
        value: f64,
        timestamp: i64,
        block: u64,
        is_incoming: bool,
    ) -> Transaction {
        Transaction {
            hash: format!("0x{:x}{}", timestamp, from),
            from: from.to_string(),
            to: Some(to.to_string()),
            value_in_eth: value,
            timestamp,
            block_number: block,
            is_incoming,
            status: TxStatus::Success,
            category: TxCategory::Transfer,
        }
    }

    fn context(transactions: Vec<Transaction>) -> AnalysisContext {
        AnalysisContext {
            transactions,
            funding_sources: FundingNode::leaf(WALLET, 0.0),
            funding_destinations: FundingNode::leaf(WALLET, 0.0),
            wallet_age: None,
            is_infrastructure: false,
        }
    }

    fn indicator(score: u32) -> SuspiciousIndicator {
        SuspiciousIndicator {
            indicator_type: IndicatorType::CircularFlow,
            severity: Severity::Medium,
            description: String::new(),
            evidence: Vec::new(),
            score,
        }
    }

    /// Rapid movement, same-block bursts, a Sybil overlap and circular flow.
    fn busy_context() -> AnalysisContext {
        let mut txs = Vec::new();
        for i in 0..3u32 {
            let t = 1000 + i as i64 * 10_000;
            txs.push(tx(&addr(i), WALLET, 1.0, t, 100, true));
            txs.push(tx(WALLET, &addr(i), 0.95, t + 300, 100, false));
        }

        let shared: Vec<FundingNode> = (10..13).map(|i| FundingNode::leaf(addr(i), 1.0)).collect();
        let mut ctx = context(txs);
        ctx.funding_sources.children = shared.clone();
        ctx.funding_destinations.children = shared;
        ctx
    }

    fn types_of(indicators: &[SuspiciousIndicator]) -> Vec<IndicatorType> {
        indicators.iter().map(|i| i.indicator_type).collect()
    }

    #[test]
    fn test_detect_order() {
        let indicators = SuspiciousDetector::default().detect(&busy_context());
        assert_eq!(
            types_of(&indicators),
            vec![
                IndicatorType::RapidMovement,
                IndicatorType::SameBlockActivity,
                IndicatorType::SybilFarming,
                IndicatorType::CircularFlow,
            ]
        );
    }

    #[test]
    fn test_infrastructure_suppression() {
        let mut ctx = busy_context();
        ctx.is_infrastructure = true;

        let indicators = SuspiciousDetector::default().detect(&ctx);
        assert!(indicators
            .iter()
            .all(|i| !i.indicator_type.is_organic_behavior()));
        assert_eq!(types_of(&indicators), vec![IndicatorType::CircularFlow]);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = SuspiciousDetector::default();
        let ctx = busy_context();
        let first = detector.detect(&ctx);
        let second = detector.detect(&ctx.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn test_dust_only_scenario() {
        let txs = (1..=5)
            .map(|i| tx(&addr(i), WALLET, 0.00001, i as i64, i as u64, true))
            .collect();

        let indicators = SuspiciousDetector::default().detect(&context(txs));
        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators[0].indicator_type, IndicatorType::DustAttack);
        assert_eq!(indicators[0].severity, Severity::Low);
        assert_eq!(indicators[0].score, 10);
    }

    #[test]
    fn test_empty_context() {
        let indicators = SuspiciousDetector::default().detect(&context(Vec::new()));
        assert!(indicators.is_empty());
        assert_eq!(calculate_risk_score(&indicators), 0);
        assert_eq!(risk_level(0), RiskLevel::Low);
    }

    #[test]
    fn test_disabled_detector() {
        let config = DetectionConfig {
            enabled: false,
            ..DetectionConfig::default()
        };
        assert!(SuspiciousDetector::new(config).detect(&busy_context()).is_empty());
    }

    #[test]
    fn test_risk_score_clamped() {
        let indicators: Vec<_> = [30, 25, 40, 10].into_iter().map(indicator).collect();
        let score = calculate_risk_score(&indicators);
        assert_eq!(score, 100);
        assert_eq!(risk_level(score), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_score_bounds() {
        assert_eq!(calculate_risk_score(&[indicator(u32::MAX), indicator(5)]), 100);
        assert_eq!(calculate_risk_score(&[indicator(12), indicator(15)]), 27);
        assert_eq!(risk_level(27), RiskLevel::Medium);
    }
}
