use crate::infra::{AdvisoryState, AppState};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use risk_ai::advisor::{AdvisorError, AdvisoryRequest};
use risk_ai::catalog::{self, RISK_CATEGORIES, RISK_TYPES, SECTORS};
use risk_ai::kinney::{Classification, Factor, MAX_RATING, MIN_RATING};
use risk_ai::workflows::assessment::{
    assessment_router, compare, reconcile, AnalysisRepository, AnalysisService, Appraisal,
    ComparisonReport, Evaluation,
};
use risk_ai::workflows::learning::{learning_router, ArtifactStore, FeedbackStore, LearningService};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub(crate) fn with_service_routes<R, F, A>(
    analyses: Arc<AnalysisService<R>>,
    learning: Arc<LearningService<F, A>>,
) -> axum::Router
where
    R: AnalysisRepository + 'static,
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    assessment_router(analyses)
        .merge(learning_router(learning))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/catalog", axum::routing::get(catalog_endpoint))
        .route(
            "/api/v1/risk/compare",
            axum::routing::post(compare_endpoint),
        )
        .route(
            "/api/v1/risk/analyze",
            axum::routing::post(advised_analysis_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogResponse {
    pub(crate) categories: Vec<&'static str>,
    pub(crate) types: Vec<&'static str>,
    pub(crate) sectors: Vec<&'static str>,
    pub(crate) classifications: Vec<ClassificationBand>,
    pub(crate) rating_scales: Vec<RatingScale>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassificationBand {
    pub(crate) classification: Classification,
    pub(crate) min_score: u16,
    pub(crate) max_score: u16,
    pub(crate) action_plan: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingScale {
    pub(crate) factor: Factor,
    pub(crate) label: &'static str,
    pub(crate) steps: Vec<RatingStep>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingStep {
    pub(crate) rating: u8,
    pub(crate) description: &'static str,
}

pub(crate) async fn catalog_endpoint() -> Json<CatalogResponse> {
    let classifications = Classification::ALL
        .iter()
        .map(|classification| {
            let (min_score, max_score) = classification.bounds();
            ClassificationBand {
                classification: *classification,
                min_score,
                max_score,
                action_plan: classification.action_plan(),
            }
        })
        .collect();

    let rating_scales = Factor::ALL
        .iter()
        .map(|factor| RatingScale {
            factor: *factor,
            label: factor.describe(),
            steps: (MIN_RATING..=MAX_RATING)
                .map(|rating| RatingStep {
                    rating,
                    description: catalog::rating_description(*factor, rating),
                })
                .collect(),
        })
        .collect();

    Json(CatalogResponse {
        categories: RISK_CATEGORIES.to_vec(),
        types: RISK_TYPES.to_vec(),
        sectors: SECTORS.to_vec(),
        classifications,
        rating_scales,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareRequest {
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) risk_type: String,
    #[serde(default)]
    pub(crate) sector: String,
    pub(crate) severity: u8,
    pub(crate) frequency: u8,
    pub(crate) probability: u8,
    /// Analyst override pinned as the comparison label; the classification
    /// derived from the ratings is used otherwise.
    #[serde(default)]
    pub(crate) classification: Option<Classification>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareResponse {
    pub(crate) human: Appraisal,
    pub(crate) advisor: Appraisal,
    pub(crate) advisor_causes: Vec<String>,
    pub(crate) advisor_recommendations: Vec<String>,
    pub(crate) advisor_justification: String,
    pub(crate) comparison: ComparisonReport,
}

/// Puts an analyst appraisal side by side with the advisor's. The advisor is
/// mandatory here; without it there is nothing to compare against.
pub(crate) async fn compare_endpoint(
    Extension(advisory): Extension<AdvisoryState>,
    Json(payload): Json<CompareRequest>,
) -> Response {
    let ratings = [payload.severity, payload.frequency, payload.probability];
    if ratings
        .iter()
        .any(|rating| !(MIN_RATING..=MAX_RATING).contains(rating))
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("factor ratings must lie in [{MIN_RATING}, {MAX_RATING}]")
            })),
        )
            .into_response();
    }

    let request = AdvisoryRequest {
        description: payload.description,
        category: payload.category,
        risk_type: payload.risk_type,
        sector: payload.sector,
    };
    let opinion = match advisory.advisor.advise(&request) {
        Ok(opinion) => opinion,
        Err(error) => return advisor_error_response(&error),
    };

    let mut human =
        Appraisal::from_ratings(payload.severity, payload.frequency, payload.probability);
    if let Some(classification) = payload.classification {
        human = human.with_classification(classification);
    }
    let (severity, frequency, probability) = opinion.clamped_ratings();
    let advisor = Appraisal::from_ratings(severity, frequency, probability);
    let comparison = compare(&human, &advisor);

    (
        StatusCode::OK,
        Json(CompareResponse {
            human,
            advisor,
            advisor_causes: opinion.causes,
            advisor_recommendations: opinion.recommendations,
            advisor_justification: opinion.justification,
            comparison,
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvisedAnalysisRequest {
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) risk_type: String,
    #[serde(default)]
    pub(crate) sector: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdvisedAnalysisResponse {
    pub(crate) severity: u8,
    pub(crate) frequency: u8,
    pub(crate) probability: u8,
    pub(crate) score: u16,
    pub(crate) normalized_score: u8,
    pub(crate) classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) model_classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) advisor_classification: Option<String>,
    pub(crate) causes: Vec<String>,
    pub(crate) recommendations: Vec<String>,
    pub(crate) justification: String,
}

/// Full opinion flow for one risk: advisor ratings drive the deterministic
/// score, the statistical opinion is attached when the artifact is loadable,
/// and the final classification stays the deterministic one.
pub(crate) async fn advised_analysis_endpoint(
    Extension(advisory): Extension<AdvisoryState>,
    Json(payload): Json<AdvisedAnalysisRequest>,
) -> Response {
    if !catalog::validate_category(&payload.category) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("unknown risk category '{}'", payload.category)
            })),
        )
            .into_response();
    }
    if !catalog::validate_risk_type(&payload.risk_type) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("unknown risk type '{}'", payload.risk_type)
            })),
        )
            .into_response();
    }

    let request = AdvisoryRequest {
        description: payload.description,
        category: payload.category,
        risk_type: payload.risk_type,
        sector: payload.sector,
    };
    let opinion = match advisory.advisor.advise(&request) {
        Ok(opinion) => opinion,
        Err(error) => return advisor_error_response(&error),
    };

    let (severity, frequency, probability) = opinion.clamped_ratings();
    let evaluation = Evaluation::from_ratings(severity, frequency, probability);

    let model_classification = match advisory.predictor.predict(
        severity,
        frequency,
        probability,
        &request.category,
        &request.risk_type,
    ) {
        Ok(model) => Some(model.classification),
        Err(error) => {
            warn!(error = %error, "statistical opinion unavailable, proceeding without it");
            None
        }
    };
    let reconciled = reconcile(
        evaluation.classification,
        model_classification,
        opinion.classification,
    );

    (
        StatusCode::OK,
        Json(AdvisedAnalysisResponse {
            severity,
            frequency,
            probability,
            score: evaluation.score,
            normalized_score: evaluation.normalized_score,
            classification: reconciled.classification,
            model_classification: reconciled.model_classification,
            advisor_classification: reconciled.advisor_classification,
            causes: opinion.causes,
            recommendations: opinion.recommendations,
            justification: opinion.justification,
        }),
    )
        .into_response()
}

fn advisor_error_response(error: &AdvisorError) -> Response {
    let status = match error {
        AdvisorError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AdvisorError::Malformed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{DisabledAdvisor, ScriptedAdvisor};
    use axum::body::to_bytes;
    use risk_ai::advisor::{AdvisorOpinion, RiskAdvisor};
    use risk_ai::workflows::learning::{JsonFileArtifactStore, PredictionService};
    use std::sync::atomic::AtomicBool;

    fn app_state(ready: bool) -> AppState {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn advisory_state(advisor: Arc<dyn RiskAdvisor>) -> AdvisoryState {
        // points at a directory that never exists, so the predictor degrades
        let store = JsonFileArtifactStore::in_dir(
            std::env::temp_dir().join("risk-ai-api-routes-no-artifact"),
        );
        AdvisoryState {
            advisor,
            predictor: Arc::new(PredictionService::new(Arc::new(store))),
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn compare_request() -> CompareRequest {
        CompareRequest {
            description: "Build server exposed to the office network".to_string(),
            category: "Program".to_string(),
            risk_type: "Cyber & InfoSec".to_string(),
            sector: String::new(),
            severity: 4,
            frequency: 2,
            probability: 4,
            classification: None,
        }
    }

    #[tokio::test]
    async fn readiness_endpoint_tracks_the_flag() {
        let state = app_state(false);
        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state
            .readiness
            .store(true, std::sync::atomic::Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn catalog_endpoint_lists_the_fixed_vocabulary() {
        let Json(body) = catalog_endpoint().await;

        assert_eq!(body.categories, RISK_CATEGORIES.to_vec());
        assert!(body.types.contains(&"Cyber & InfoSec"));
        assert_eq!(body.sectors.len(), SECTORS.len());

        let high = body.classifications.last().expect("three bands");
        assert_eq!(high.classification, Classification::High);
        assert_eq!((high.min_score, high.max_score), (51, 125));
        assert_eq!(high.action_plan, "Take immediate measures");

        assert_eq!(body.rating_scales.len(), 3);
        assert!(body.rating_scales.iter().all(|scale| scale.steps.len() == 5));
    }

    #[tokio::test]
    async fn compare_endpoint_reports_agreement() {
        // scripted opinion for this request: G=5 F=2 P=4 -> 40, Medium
        let state = advisory_state(Arc::new(ScriptedAdvisor));
        let response = compare_endpoint(Extension(state), Json(compare_request())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["human"]["score"], 32);
        assert_eq!(body["advisor"]["score"], 40);
        assert_eq!(body["comparison"]["classifications_match"], true);
        assert_eq!(body["comparison"]["agreement"], "strong");
        assert_eq!(body["comparison"]["max_divergence_factor"], "severity");
        assert!(body["advisor_justification"]
            .as_str()
            .expect("justification string")
            .contains("G=5"));
    }

    #[tokio::test]
    async fn compare_endpoint_rejects_out_of_range_ratings() {
        let state = advisory_state(Arc::new(ScriptedAdvisor));
        let mut request = compare_request();
        request.severity = 0;

        let response = compare_endpoint(Extension(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compare_endpoint_needs_a_reachable_advisor() {
        let state = advisory_state(Arc::new(DisabledAdvisor));
        let response = compare_endpoint(Extension(state), Json(compare_request())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .expect("error string")
            .contains("unavailable"));
    }

    #[tokio::test]
    async fn advised_analysis_keeps_the_deterministic_verdict() {
        let state = advisory_state(Arc::new(ScriptedAdvisor));
        let request = AdvisedAnalysisRequest {
            description: "Credential store exposed through a misconfigured share".to_string(),
            category: "Program".to_string(),
            risk_type: "Cyber & InfoSec".to_string(),
            sector: String::new(),
        };

        let response = advised_analysis_endpoint(Extension(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["score"], 40);
        assert_eq!(body["normalized_score"], 32);
        assert_eq!(body["classification"], "Medium");
        assert_eq!(body["advisor_classification"], "Medium");
        // no artifact on disk: the statistical opinion is absent, not an error
        assert!(body.get("model_classification").is_none());
        assert_eq!(body["causes"].as_array().expect("causes array").len(), 2);
    }

    #[tokio::test]
    async fn advised_analysis_rejects_unknown_vocabulary() {
        let state = advisory_state(Arc::new(ScriptedAdvisor));
        let request = AdvisedAnalysisRequest {
            description: "Any".to_string(),
            category: "Logistics".to_string(),
            risk_type: "Cyber & InfoSec".to_string(),
            sector: String::new(),
        };

        let response = advised_analysis_endpoint(Extension(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .expect("error string")
            .contains("Logistics"));
    }

    #[tokio::test]
    async fn advised_analysis_maps_malformed_advisor_payloads() {
        struct MalformedAdvisor;

        impl RiskAdvisor for MalformedAdvisor {
            fn advise(
                &self,
                _request: &AdvisoryRequest,
            ) -> Result<AdvisorOpinion, AdvisorError> {
                Err(AdvisorError::Malformed("missing opinion fields".to_string()))
            }
        }

        let state = advisory_state(Arc::new(MalformedAdvisor));
        let request = AdvisedAnalysisRequest {
            description: "Any".to_string(),
            category: "Program".to_string(),
            risk_type: "Technical".to_string(),
            sector: String::new(),
        };

        let response = advised_analysis_endpoint(Extension(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
