use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AnalysisRecord, QuestionnaireSubmission, ResidualRequest};
use super::repository::AnalysisRepository;
use super::service::{AnalysisService, AnalysisServiceError};

/// Router builder exposing the questionnaire and analysis trace endpoints.
pub fn assessment_router<R>(service: Arc<AnalysisService<R>>) -> Router
where
    R: AnalysisRepository + 'static,
{
    Router::new()
        .route("/api/v1/questionnaire", get(questions_handler::<R>))
        .route("/api/v1/questionnaire/analyze", post(analyze_handler::<R>))
        .route("/api/v1/questionnaire/residual", post(residual_handler::<R>))
        .route("/api/v1/questionnaire/analyses", get(list_handler::<R>))
        .route(
            "/api/v1/questionnaire/analyses/:analysis_id",
            get(fetch_handler::<R>).delete(remove_handler::<R>),
        )
        .route("/api/v1/questionnaire/export", get(export_handler::<R>))
        .route("/api/v1/questionnaire/import", post(import_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsQuery {
    sector: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

pub(crate) async fn questions_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Query(query): Query<QuestionsQuery>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    let bank = service.bank();
    let questions = bank.for_sector(query.sector.as_deref());
    let payload = json!({
        "version": bank.version(),
        "questions": questions,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn analyze_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    axum::Json(submission): axum::Json<QuestionnaireSubmission>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    match service.analyze(submission) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn residual_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    axum::Json(request): axum::Json<ResidualRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    match service.residual(request) {
        Ok(records) => (StatusCode::CREATED, axum::Json(records)).into_response(),
        Err(AnalysisServiceError::UnknownAnalysis(id)) => unknown_analysis(&id),
        Err(AnalysisServiceError::Validation(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Query(query): Query<PageQuery>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);
    match service.page(offset, limit) {
        Ok(page) => {
            let payload = json!({
                "total": page.total,
                "limit": limit,
                "offset": offset,
                "items": page.items,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn fetch_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Path(analysis_id): Path<String>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    match service.fetch(&analysis_id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(AnalysisServiceError::UnknownAnalysis(id)) => unknown_analysis(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn remove_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Path(analysis_id): Path<String>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    match service.remove(&analysis_id) {
        Ok(()) => {
            let payload = json!({ "deleted": analysis_id });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(AnalysisServiceError::UnknownAnalysis(id)) => unknown_analysis(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    match service.export() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn import_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    axum::Json(records): axum::Json<Vec<AnalysisRecord>>,
) -> Response
where
    R: AnalysisRepository + 'static,
{
    let imported = match service.import(records) {
        Ok(imported) => imported,
        Err(error) => return internal_error(error),
    };
    match service.export() {
        Ok(all) => {
            let payload = json!({ "imported": imported, "total": all.len() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => internal_error(error),
    }
}

fn unknown_analysis(id: &str) -> Response {
    let payload = json!({ "error": format!("analysis '{id}' not found") });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn internal_error(error: AnalysisServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
