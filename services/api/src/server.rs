use crate::cli::ServeArgs;
use crate::infra::{AdvisoryState, AppState, DisabledAdvisor};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use risk_ai::config::AppConfig;
use risk_ai::error::AppError;
use risk_ai::telemetry;
use risk_ai::workflows::assessment::{
    AnalysisService, JsonFileAnalysisRepository, QuestionBank,
};
use risk_ai::workflows::learning::{
    JsonFileArtifactStore, JsonFileFeedbackStore, LearningService, PredictionService,
    TrainingOptions,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let data_dir = config.storage.data_dir.clone();
    let analyses = Arc::new(JsonFileAnalysisRepository::in_dir(&data_dir));
    let feedback = Arc::new(JsonFileFeedbackStore::in_dir(&data_dir));
    let artifacts = Arc::new(JsonFileArtifactStore::in_dir(&data_dir));

    let analysis_service = Arc::new(AnalysisService::new(
        Arc::new(QuestionBank::standard()),
        analyses,
    ));
    let training_options = TrainingOptions {
        synthetic_samples: config.training.synthetic_samples,
        dataset_dump: config
            .training
            .dataset_dump
            .then(|| data_dir.join("training_dataset.csv")),
        ..TrainingOptions::default()
    };
    let learning_service = Arc::new(LearningService::new(
        feedback,
        Arc::clone(&artifacts),
        training_options,
    ));
    let advisory_state = AdvisoryState {
        advisor: Arc::new(DisabledAdvisor),
        predictor: Arc::new(PredictionService::new(artifacts)),
    };

    let app = with_service_routes(analysis_service, learning_service)
        .layer(Extension(app_state))
        .layer(Extension(advisory_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "risk severity service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
