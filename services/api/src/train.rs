use clap::Args;
use risk_ai::config::AppConfig;
use risk_ai::error::AppError;
use risk_ai::telemetry;
use risk_ai::workflows::learning::{
    JsonFileArtifactStore, JsonFileFeedbackStore, LearningService, TrainingOptions, TrainingReport,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct TrainArgs {
    /// Train even when no new feedback is pending and the dataset is small
    #[arg(long)]
    pub(crate) force: bool,
    /// Override the number of synthetic rows added to the dataset
    #[arg(long)]
    pub(crate) synthetic_samples: Option<usize>,
    /// Directory holding the JSON stores and the classifier artifact
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

/// Runs one training pass against the configured JSON stores and prints the
/// report. The same pipeline the retrain endpoint calls, without the server.
pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(samples) = args.synthetic_samples {
        config.training.synthetic_samples = samples;
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let data_dir = config.storage.data_dir;
    let feedback = Arc::new(JsonFileFeedbackStore::in_dir(&data_dir));
    let artifacts = Arc::new(JsonFileArtifactStore::in_dir(&data_dir));
    let options = TrainingOptions {
        synthetic_samples: config.training.synthetic_samples,
        dataset_dump: config
            .training
            .dataset_dump
            .then(|| data_dir.join("training_dataset.csv")),
        ..TrainingOptions::default()
    };
    let service = LearningService::new(feedback, artifacts, options);

    let report = service.retrain(args.force);
    render_report(&report);
    Ok(())
}

pub(crate) fn render_report(report: &TrainingReport) {
    match report {
        TrainingReport::Completed {
            metrics,
            classes,
            finished_at,
        } => {
            println!("Training completed at {finished_at}");
            println!("- classes: {}", classes.join(", "));
            println!(
                "- train accuracy {:.4} | test accuracy {:.4}",
                metrics.train_accuracy, metrics.test_accuracy
            );
            println!(
                "- {} training rows, {} held out, {} total",
                metrics.training_samples, metrics.test_samples, metrics.total_samples
            );
        }
        TrainingReport::Busy => println!("A training run is already in progress"),
        TrainingReport::InsufficientData { rows } => println!(
            "Not enough training data ({rows} rows); rerun with --force to train anyway"
        ),
        TrainingReport::NoNewData => {
            println!("No new training data; rerun with --force to retrain regardless")
        }
        TrainingReport::Failed { message } => println!("Training failed: {message}"),
    }
}
