use serde::{Deserialize, Serialize};

/// Patterns the detector can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    RapidMovement,
    SameBlockActivity,
    CircularFlow,
    DustAttack,
    FreshWallet,
    SybilFarming,
    WashTrading,
}

impl IndicatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RapidMovement => "rapid_movement",
            Self::SameBlockActivity => "same_block_activity",
            Self::CircularFlow => "circular_flow",
            Self::DustAttack => "dust_attack",
            Self::FreshWallet => "fresh_wallet",
            Self::SybilFarming => "sybil_farming",
            Self::WashTrading => "wash_trading",
        }
    }

    /// Patterns that ordinary infrastructure wallets exhibit as a matter of course.
    pub fn is_organic_behavior(&self) -> bool {
        matches!(
            self,
            Self::RapidMovement | Self::SameBlockActivity | Self::SybilFarming
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Overall risk bucket derived from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bucket a 0-100 score: critical from 75, high from 50, medium from 25.
    pub fn from_score(score: u32) -> Self {
        if score >= 75 {
            Self::Critical
        } else if score >= 50 {
            Self::High
        } else if score >= 25 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A single triggered pattern with its contribution to the risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousIndicator {
    #[serde(rename = "type")]
    pub indicator_type: IndicatorType,
    pub severity: Severity,
    pub description: String,
    pub evidence: Vec<String>,
    pub score: u32,
}
