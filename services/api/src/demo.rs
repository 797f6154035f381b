use crate::infra::{
    InMemoryAnalysisRepository, InMemoryArtifactStore, InMemoryFeedbackStore, ScriptedAdvisor,
};
use crate::train::render_report;
use clap::Args;
use risk_ai::advisor::{AdvisoryRequest, RiskAdvisor};
use risk_ai::catalog::{RISK_CATEGORIES, RISK_TYPES};
use risk_ai::error::AppError;
use risk_ai::kinney::Classification;
use risk_ai::workflows::assessment::{
    compare, reconcile, AnalysisService, Answer, Appraisal, FactorAnswerSets, FactorImpacts,
    MitigationMeasure, QuestionBank, QuestionnaireSubmission, ResidualRequest,
};
use risk_ai::workflows::learning::{
    FeedbackSubmission, LearningService, PredictionService, TrainingOptions,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Synthetic rows generated for the demo training run
    #[arg(long, default_value_t = 500)]
    pub(crate) synthetic_samples: usize,
}

/// Walks one risk through the whole system on in-memory stores: catalog,
/// questionnaire scoring, residual re-scoring, advisor comparison, feedback,
/// a training run and the resulting statistical opinion.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Risk severity scoring demo");

    println!("\nCatalog");
    println!("- categories: {}", RISK_CATEGORIES.join(", "));
    println!("- types: {}", RISK_TYPES.join(", "));
    for classification in Classification::ALL {
        let (min_score, max_score) = classification.bounds();
        println!(
            "- {} ({min_score}-{max_score}): {}",
            classification.label(),
            classification.action_plan()
        );
    }

    let analyses = Arc::new(AnalysisService::new(
        Arc::new(QuestionBank::standard()),
        Arc::new(InMemoryAnalysisRepository::default()),
    ));

    let submission = QuestionnaireSubmission {
        description: "Unpatched VPN appliance exposed to the internet".to_string(),
        category: "Program".to_string(),
        risk_type: "Cyber & InfoSec".to_string(),
        sector: "Technology".to_string(),
        answers: vec![
            Answer::new("G1", "G1_O4"),
            Answer::new("G2", "G2_O5"),
            Answer::new("F1", "F1_O3"),
            Answer::new("F2", "F2_O3"),
            Answer::new("P1", "P1_O4"),
            Answer::new("P2", "P2_O4"),
        ],
    };

    println!("\nQuestionnaire analysis");
    let analysis = match analyses.analyze(submission) {
        Ok(record) => record,
        Err(err) => {
            println!("  Analysis rejected: {err}");
            return Ok(());
        }
    };
    let evaluation = analysis.evaluation;
    println!(
        "- {}: G={} F={} P={} | score {} ({}% of max) | {}",
        analysis.id,
        evaluation.severity,
        evaluation.frequency,
        evaluation.probability,
        evaluation.score,
        evaluation.normalized_score,
        evaluation.classification.label()
    );
    println!("  Action plan: {}", evaluation.classification.action_plan());

    println!("\nResidual re-scoring after mitigation");
    let measure = MitigationMeasure {
        description: "Patch the appliance and restrict VPN access".to_string(),
        impacts: FactorImpacts {
            severity: false,
            frequency: false,
            probability: true,
        },
        answers: FactorAnswerSets {
            probability: vec![Answer::new("P1", "P1_O2"), Answer::new("P2", "P2_O1")],
            ..FactorAnswerSets::default()
        },
    };
    let residual_request = ResidualRequest {
        parent_id: analysis.id.clone(),
        measures: vec![measure],
    };
    let residuals = match analyses.residual(residual_request) {
        Ok(records) => records,
        Err(err) => {
            println!("  Residual request rejected: {err}");
            return Ok(());
        }
    };
    for residual in &residuals {
        println!(
            "- {}: G={} F={} P={} | score {} | {} (parent was {})",
            residual.measure_description.as_deref().unwrap_or("measure"),
            residual.evaluation.severity,
            residual.evaluation.frequency,
            residual.evaluation.probability,
            residual.evaluation.score,
            residual.evaluation.classification.label(),
            evaluation.classification.label()
        );
    }

    println!("\nAdvisor comparison");
    let advisor = ScriptedAdvisor;
    let advisory_request = AdvisoryRequest {
        description: analysis.description.clone(),
        category: analysis.category.clone(),
        risk_type: analysis.risk_type.clone(),
        sector: analysis.sector.clone(),
    };
    match advisor.advise(&advisory_request) {
        Ok(opinion) => {
            let human = Appraisal::from_ratings(
                evaluation.severity,
                evaluation.frequency,
                evaluation.probability,
            );
            let (severity, frequency, probability) = opinion.clamped_ratings();
            let advised = Appraisal::from_ratings(severity, frequency, probability);
            let report = compare(&human, &advised);

            println!(
                "- human {} ({}) vs advisor {} ({})",
                human.score,
                human.classification.label(),
                advised.score,
                advised.classification.label()
            );
            println!(
                "  Agreement: {} ({})",
                report.agreement.label(),
                report.agreement_message
            );
            if let Some(factor) = report.max_divergence_factor {
                println!("  Widest gap: {}", factor.describe());
            }
            for note in &report.recommendations {
                println!("  - {note}");
            }
            println!("  Advisor justification: {}", opinion.justification);
        }
        Err(err) => println!("- Advisor opinion unavailable: {err}"),
    }

    println!("\nAnalyst feedback and retraining");
    let artifacts = Arc::new(InMemoryArtifactStore::default());
    let options = TrainingOptions {
        synthetic_samples: args.synthetic_samples,
        ..TrainingOptions::default()
    };
    let learning = Arc::new(LearningService::new(
        Arc::new(InMemoryFeedbackStore::default()),
        Arc::clone(&artifacts),
        options,
    ));

    let verdicts = [
        (
            "Unpatched VPN appliance exposed to the internet",
            "Program",
            "Cyber & InfoSec",
            5,
            3,
            4,
        ),
        (
            "Recurring invoice mismatches with a key supplier",
            "Quality",
            "Financial",
            3,
            4,
            3,
        ),
        (
            "Forklift traffic crossing a pedestrian route",
            "Industrial",
            "Technical",
            4,
            4,
            2,
        ),
    ];
    for (description, category, risk_type, severity, frequency, probability) in verdicts {
        let feedback = FeedbackSubmission {
            description: description.to_string(),
            category: category.to_string(),
            risk_type: risk_type.to_string(),
            severity,
            frequency,
            probability,
            ..FeedbackSubmission::default()
        };
        match learning.record_feedback(feedback) {
            Ok(entry) => println!(
                "- recorded {} as {}",
                entry.id,
                entry.user_classification.label()
            ),
            Err(err) => {
                println!("- feedback rejected: {err}");
                return Ok(());
            }
        }
    }

    let report = learning.retrain(false);
    render_report(&report);
    if !report.is_completed() {
        return Ok(());
    }

    println!("\nStatistical opinion");
    let predictor = PredictionService::new(Arc::clone(&artifacts));
    match predictor.predict(
        evaluation.severity,
        evaluation.frequency,
        evaluation.probability,
        &analysis.category,
        &analysis.risk_type,
    ) {
        Ok(opinion) => {
            let reconciled = reconcile(
                evaluation.classification,
                Some(opinion.classification.clone()),
                None,
            );
            println!(
                "- model says {} | final verdict stays {}",
                opinion.classification,
                reconciled.classification.label()
            );
        }
        Err(err) => println!("- prediction unavailable: {err}"),
    }

    println!("\nTraining status");
    match learning.status() {
        Ok(status) => {
            println!("- training in progress: {}", status.is_training);
            println!(
                "- feedback recorded: {} ({} pending)",
                status.feedback.total, status.feedback.pending_training
            );
            println!("- curated scenarios: {}", status.scenario_count);
            println!("- artifact present: {}", status.artifact_exists);
        }
        Err(err) => println!("- status unavailable: {err}"),
    }

    Ok(())
}
