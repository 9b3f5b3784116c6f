use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use crate::analysis::{self, AnalysisReport};
use crate::anomaly::engine::{calculate_risk_score, risk_level};
use crate::compare::{compare_wallets, WalletCorrelation};
use crate::graph::blocks::{group_by_block, BlockActivityGroup};
use crate::graph::cluster::{analyze_clusters, ClusterReport};
use crate::types::AnalysisContext;
use crate::wallet::metadata::{classify_wallet, wallet_age_days};

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

fn check_size(state: &AppState, count: usize) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if count > state.max_transactions {
        return Err(api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "{} transactions exceeds the limit of {}",
                count, state.max_transactions
            ),
        ));
    }
    Ok(())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(context): Json<AnalysisContext>,
) -> ApiResult<AnalysisReport> {
    check_size(&state, context.transactions.len())?;
    Ok(Json(analysis::analyze(&state.detector, &context)))
}

pub async fn risk_score(Json(body): Json<RiskScoreRequest>) -> Json<RiskScoreResponse> {
    let score = calculate_risk_score(&body.indicators);
    Json(RiskScoreResponse {
        score,
        level: risk_level(score),
    })
}

pub async fn blocks(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BlocksRequest>,
) -> ApiResult<Vec<BlockActivityGroup>> {
    check_size(&state, body.transactions.len())?;
    Ok(Json(group_by_block(&body.transactions)))
}

pub async fn classify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClassifyRequest>,
) -> ApiResult<ClassifyResponse> {
    if body.address.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "address is required"));
    }

    let infrastructure = classify_wallet(
        &state.registry,
        &state.infrastructure,
        &body.chain,
        &body.address,
        body.tx_count,
        body.is_contract,
    );

    Ok(Json(ClassifyResponse {
        is_infrastructure: infrastructure.is_some(),
        infrastructure,
        wallet_age: body
            .first_tx_timestamp
            .map(|ts| wallet_age_days(ts, Utc::now())),
    }))
}

pub async fn sybil_clusters(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SybilClustersRequest>,
) -> ApiResult<ClusterReport> {
    check_size(&state, body.wallets.len())?;

    let report = analyze_clusters(&body.wallets, body.min_cluster_size, |source| {
        state
            .registry
            .lookup(&body.chain, source)
            .map(|known| known.label.clone())
    });
    Ok(Json(report))
}

pub async fn compare(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CompareRequest>,
) -> ApiResult<WalletCorrelation> {
    if body.wallets.len() < 2 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "at least two wallets are required",
        ));
    }
    let tx_count = body
        .wallets
        .iter()
        .map(|w| w.context.transactions.len())
        .sum();
    check_size(&state, tx_count)?;

    Ok(Json(compare_wallets(&body.wallets)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::types::{IndicatorType, RiskLevel, Severity, SuspiciousIndicator};
    use crate::config::Config;
    use crate::graph::cluster::WalletFunding;
    use crate::wallet::metadata::InfrastructureRegistry;

    fn state(max_transactions: usize) -> Arc<AppState> {
        let mut config = Config::default();
        config.api.max_transactions = max_transactions;
        Arc::new(AppState::new(&config, InfrastructureRegistry::default()))
    }

    fn context_json(tx_count: usize) -> AnalysisContext {
        let txs: Vec<serde_json::Value> = (0..tx_count)
            .map(|i| {
                serde_json::json!({
                    "hash": format!("0x{:x}", i),
                    "from": format!("0x{:040x}", i + 1),
                    "to": "0x9999999999999999999999999999999999999999",
                    "valueInEth": 0.00001,
                    "timestamp": 1_700_000_000 + i as i64,
                    "blockNumber": 100 + i as u64,
                    "isIncoming": true,
                    "status": "success",
                    "category": "transfer"
                })
            })
            .collect();

        serde_json::from_value(serde_json::json!({
            "transactions": txs,
            "fundingSources": { "address": "0x9999999999999999999999999999999999999999" },
            "fundingDestinations": { "address": "0x9999999999999999999999999999999999999999" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_dust_wallet() {
        let Json(report) = analyze(State(state(100)), Json(context_json(5)))
            .await
            .unwrap();

        assert_eq!(report.suspicious_indicators.len(), 1);
        assert_eq!(
            report.suspicious_indicators[0].indicator_type,
            IndicatorType::DustAttack
        );
        assert_eq!(report.overall_risk_score, 10);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_analyze_rejects_oversized_context() {
        let err = analyze(State(state(3)), Json(context_json(4)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_risk_score_external_indicators() {
        let indicators = [30, 25, 40, 10]
            .into_iter()
            .map(|score| SuspiciousIndicator {
                indicator_type: IndicatorType::WashTrading,
                severity: Severity::High,
                description: "external".to_string(),
                evidence: vec![],
                score,
            })
            .collect();

        let Json(resp) = risk_score(Json(RiskScoreRequest { indicators })).await;
        assert_eq!(resp.score, 100);
        assert_eq!(resp.level, RiskLevel::Critical);
    }

    #[tokio::test]
    async fn test_blocks_grouping() {
        let mut transactions = context_json(4).transactions;
        for tx in transactions.iter_mut().take(3) {
            tx.block_number = 777;
        }

        let Json(groups) = blocks(State(state(100)), Json(BlocksRequest { transactions }))
            .await
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].block_number, 777);
        assert!(groups[0].is_suspicious);
    }

    #[tokio::test]
    async fn test_classify_high_volume() {
        let body = ClassifyRequest {
            chain: "ethereum".to_string(),
            address: "0x1111111111111111111111111111111111111111".to_string(),
            tx_count: 60_000,
            is_contract: false,
            first_tx_timestamp: Some(0),
        };

        let Json(resp) = classify(State(state(100)), Json(body)).await.unwrap();
        assert!(resp.is_infrastructure);
        assert!(resp.wallet_age.unwrap() > 365);
    }

    #[tokio::test]
    async fn test_classify_requires_address() {
        let body = ClassifyRequest {
            chain: "ethereum".to_string(),
            address: String::new(),
            tx_count: 0,
            is_contract: false,
            first_tx_timestamp: None,
        };
        let err = classify(State(state(100)), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sybil_clusters_uses_registry_labels() {
        let registry = InfrastructureRegistry::from_json(
            r#"[{ "chain": "ethereum", "addresses": [
                { "address": "0x28C6c06298d514Db089934071355E5743bf21d60", "name": "Binance 14", "kind": "exchange" }
            ] }]"#,
        )
        .unwrap();
        let state = Arc::new(AppState::new(&Config::default(), registry));

        let body: SybilClustersRequest = serde_json::from_value(serde_json::json!({
            "wallets": (0..4).map(|i| serde_json::json!({
                "address": format!("0x{:040x}", i),
                "funder": "0x28C6c06298d514Db089934071355E5743bf21d60",
                "fundingTimestamp": 1_700_000_000 + i * 60,
                "fundingAmount": 0.1
            })).collect::<Vec<_>>()
        }))
        .unwrap();

        let Json(report) = sybil_clusters(State(state), Json(body)).await.unwrap();
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(
            report.clusters[0].funding_source_label.as_deref(),
            Some("Binance 14")
        );
        assert!(report.flagged_clusters.is_empty());
    }

    #[tokio::test]
    async fn test_sybil_clusters_rejects_oversized_request() {
        let wallets = (0..4)
            .map(|i| WalletFunding {
                address: format!("0x{:040x}", i),
                funder: None,
                funding_timestamp: None,
                funding_amount: 0.0,
                interaction_count: 1,
            })
            .collect();
        let body = SybilClustersRequest {
            chain: "ethereum".to_string(),
            wallets,
            min_cluster_size: 3,
        };
        let err = sybil_clusters(State(state(3)), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_compare_requires_two_wallets() {
        let body: CompareRequest = serde_json::from_value(serde_json::json!({
            "wallets": [{
                "address": "0x1",
                "transactions": [],
                "fundingSources": { "address": "0x1" },
                "fundingDestinations": { "address": "0x1" }
            }]
        }))
        .unwrap();
        let err = compare(State(state(100)), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_shared_funder() {
        let wallet = |addr: &str| {
            serde_json::json!({
                "address": addr,
                "transactions": [],
                "fundingSources": { "address": addr, "children": [{ "address": "0xfunder" }] },
                "fundingDestinations": { "address": addr }
            })
        };
        let body: CompareRequest =
            serde_json::from_value(serde_json::json!({ "wallets": [wallet("0x1"), wallet("0x2")] }))
                .unwrap();

        let Json(result) = compare(State(state(100)), Json(body)).await.unwrap();
        assert_eq!(result.common_funding_sources, vec!["0xfunder"]);
        assert_eq!(result.correlation_score, 10);
    }
}
