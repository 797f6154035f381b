use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::artifact::ArtifactStore;
use super::domain::{FeedbackSubmission, TrainingReport};
use super::feedback::FeedbackStore;
use super::service::LearningService;
use crate::storage::StoreError;

/// Router builder exposing feedback intake and the training surface.
pub fn learning_router<F, A>(service: Arc<LearningService<F, A>>) -> Router
where
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    Router::new()
        .route("/api/v1/learning/feedback", post(feedback_handler::<F, A>))
        .route("/api/v1/learning/feedback/stats", get(stats_handler::<F, A>))
        .route("/api/v1/learning/status", get(status_handler::<F, A>))
        .route("/api/v1/learning/retrain", post(retrain_handler::<F, A>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RetrainQuery {
    force: Option<bool>,
}

pub(crate) async fn feedback_handler<F, A>(
    State(service): State<Arc<LearningService<F, A>>>,
    axum::Json(submission): axum::Json<FeedbackSubmission>,
) -> Response
where
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    match service.record_feedback(submission) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn stats_handler<F, A>(
    State(service): State<Arc<LearningService<F, A>>>,
) -> Response
where
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn status_handler<F, A>(
    State(service): State<Arc<LearningService<F, A>>>,
) -> Response
where
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    match service.status() {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(error) => internal_error(error),
    }
}

/// Training can take a while, so the fit runs on a blocking task; the
/// request stays open until the report is in.
pub(crate) async fn retrain_handler<F, A>(
    State(service): State<Arc<LearningService<F, A>>>,
    Query(query): Query<RetrainQuery>,
) -> Response
where
    F: FeedbackStore + 'static,
    A: ArtifactStore + 'static,
{
    let force = query.force.unwrap_or(false);
    let report = match tokio::task::spawn_blocking(move || service.retrain(force)).await {
        Ok(report) => report,
        Err(join_error) => {
            let payload = json!({ "error": format!("training task aborted: {join_error}") });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let status = match &report {
        TrainingReport::Busy => StatusCode::CONFLICT,
        TrainingReport::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        TrainingReport::Completed { .. }
        | TrainingReport::InsufficientData { .. }
        | TrainingReport::NoNewData => StatusCode::OK,
    };
    (status, axum::Json(report)).into_response()
}

fn internal_error(error: StoreError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
