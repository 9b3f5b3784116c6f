use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_true() -> bool {
    true
}

// ============================================================
// Detection Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub rapid_movement: RapidMovementConfig,
    #[serde(default)]
    pub circular_flow: CircularFlowConfig,
    #[serde(default)]
    pub dust_attack: DustAttackConfig,
    #[serde(default)]
    pub fresh_wallet: FreshWalletConfig,
    #[serde(default)]
    pub sybil: SybilConfig,
    #[serde(default)]
    pub wash_trading: WashTradingConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rapid_movement: RapidMovementConfig::default(),
            circular_flow: CircularFlowConfig::default(),
            dust_attack: DustAttackConfig::default(),
            fresh_wallet: FreshWalletConfig::default(),
            sybil: SybilConfig::default(),
            wash_trading: WashTradingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RapidMovementConfig {
    #[serde(default = "default_rapid_min_value")]
    pub min_value_eth: f64,
    #[serde(default = "default_rapid_max_hold")]
    pub max_hold_secs: i64,
    /// Maximum in/out value difference as a fraction of the incoming value.
    #[serde(default = "default_rapid_tolerance")]
    pub value_tolerance: f64,
    #[serde(default = "default_rapid_min_matches")]
    pub min_matches: u32,
}

impl Default for RapidMovementConfig {
    fn default() -> Self {
        Self {
            min_value_eth: 0.1,
            max_hold_secs: 3600,
            value_tolerance: 0.1,
            min_matches: 2,
        }
    }
}

fn default_rapid_min_value() -> f64 {
    0.1
}

fn default_rapid_max_hold() -> i64 {
    3600
}

fn default_rapid_tolerance() -> f64 {
    0.1
}

fn default_rapid_min_matches() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct CircularFlowConfig {
    #[serde(default = "default_circular_min")]
    pub min_addresses: usize,
}

impl Default for CircularFlowConfig {
    fn default() -> Self {
        Self { min_addresses: 2 }
    }
}

fn default_circular_min() -> usize {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct DustAttackConfig {
    #[serde(default = "default_dust_max_value")]
    pub max_value_eth: f64,
    #[serde(default = "default_dust_min_count")]
    pub min_count: usize,
}

impl Default for DustAttackConfig {
    fn default() -> Self {
        Self {
            max_value_eth: 0.0001,
            min_count: 5,
        }
    }
}

fn default_dust_max_value() -> f64 {
    0.0001
}

fn default_dust_min_count() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct FreshWalletConfig {
    #[serde(default = "default_fresh_max_age")]
    pub max_age_days: u64,
    /// The wallet must have strictly more transactions than this.
    #[serde(default = "default_fresh_min_txs")]
    pub min_tx_count: usize,
}

impl Default for FreshWalletConfig {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            min_tx_count: 50,
        }
    }
}

fn default_fresh_max_age() -> u64 {
    30
}

fn default_fresh_min_txs() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SybilConfig {
    #[serde(default = "default_sybil_min_overlap")]
    pub min_overlap: usize,
}

impl Default for SybilConfig {
    fn default() -> Self {
        Self { min_overlap: 3 }
    }
}

fn default_sybil_min_overlap() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct WashTradingConfig {
    #[serde(default = "default_wash_min_repeats")]
    pub min_repeats: u32,
}

impl Default for WashTradingConfig {
    fn default() -> Self {
        Self { min_repeats: 3 }
    }
}

fn default_wash_min_repeats() -> u32 {
    3
}

// ============================================================
// Infrastructure Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct InfrastructureConfig {
    pub known_addresses_path: Option<String>,
    #[serde(default = "default_high_volume_txs")]
    pub high_volume_tx_count: u64,
    #[serde(default = "default_high_volume_contract_txs")]
    pub high_volume_contract_tx_count: u64,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            known_addresses_path: None,
            high_volume_tx_count: 50_000,
            high_volume_contract_tx_count: 10_000,
        }
    }
}

fn default_high_volume_txs() -> u64 {
    50_000
}

fn default_high_volume_contract_txs() -> u64 {
    10_000
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
    /// Largest transaction list accepted by the analyze endpoint.
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
            max_transactions: 10_000,
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_max_transactions() -> usize {
    10_000
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        let d = &self.detection;

        if !(d.rapid_movement.min_value_eth > 0.0) {
            return Err(eyre::eyre!(
                "rapid_movement.min_value_eth must be positive, got {}",
                d.rapid_movement.min_value_eth
            ));
        }
        if d.rapid_movement.max_hold_secs <= 0 {
            return Err(eyre::eyre!(
                "rapid_movement.max_hold_secs must be positive, got {}",
                d.rapid_movement.max_hold_secs
            ));
        }
        let tolerance = d.rapid_movement.value_tolerance;
        if !(tolerance > 0.0 && tolerance <= 1.0) {
            return Err(eyre::eyre!(
                "rapid_movement.value_tolerance must be in (0, 1], got {}",
                tolerance
            ));
        }
        if !(d.dust_attack.max_value_eth > 0.0) {
            return Err(eyre::eyre!(
                "dust_attack.max_value_eth must be positive, got {}",
                d.dust_attack.max_value_eth
            ));
        }

        let counts = [
            ("rapid_movement.min_matches", d.rapid_movement.min_matches as u64),
            ("circular_flow.min_addresses", d.circular_flow.min_addresses as u64),
            ("dust_attack.min_count", d.dust_attack.min_count as u64),
            ("sybil.min_overlap", d.sybil.min_overlap as u64),
            ("wash_trading.min_repeats", d.wash_trading.min_repeats as u64),
            ("api.max_transactions", self.api.max_transactions as u64),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(eyre::eyre!("{} must be at least 1", name));
            }
        }

        Ok(())
    }
}
