use std::sync::Arc;

use crate::kinney::Classification;
use crate::workflows::assessment::domain::{
    AnalysisMethod, QuestionnaireSubmission, ResidualRequest,
};
use crate::workflows::assessment::questionnaire::{QuestionBank, QUESTIONNAIRE_VERSION};
use crate::workflows::assessment::service::{AnalysisService, AnalysisServiceError};

use super::common::{build_service, probability_measure, submission, UnavailableRepository};

#[test]
fn analyze_persists_a_scored_record() {
    let (service, repository) = build_service();
    let record = service.analyze(submission()).expect("analysis succeeds");

    assert!(record.id.starts_with("qa-"));
    assert_eq!(record.method, AnalysisMethod::Questionnaire);
    assert_eq!(record.questionnaire_version, QUESTIONNAIRE_VERSION);
    assert_eq!(record.evaluation.severity, 4);
    assert_eq!(record.evaluation.frequency, 3);
    assert_eq!(record.evaluation.probability, 3);
    assert_eq!(record.evaluation.score, 36);
    assert_eq!(record.evaluation.normalized_score, 29);
    assert_eq!(record.evaluation.classification, Classification::Medium);
    assert_eq!(record.breakdown.severity.len(), 2);
    assert_eq!(record.breakdown.frequency.len(), 2);
    assert_eq!(record.breakdown.probability.len(), 2);
    assert!(record.parent_id.is_none());

    let stored = repository.records.lock().expect("repository mutex poisoned");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, record.id);
}

#[test]
fn analyze_without_answers_scores_the_floor() {
    let (service, _repository) = build_service();
    let record = service
        .analyze(QuestionnaireSubmission {
            description: "Unassessed draft risk".to_string(),
            ..QuestionnaireSubmission::default()
        })
        .expect("analysis succeeds");

    assert_eq!(record.evaluation.severity, 1);
    assert_eq!(record.evaluation.frequency, 1);
    assert_eq!(record.evaluation.probability, 1);
    assert_eq!(record.evaluation.score, 1);
    assert_eq!(record.evaluation.classification, Classification::Low);
}

#[test]
fn residual_links_to_the_parent_and_copies_context() {
    let (service, _repository) = build_service();
    let parent = service.analyze(submission()).expect("parent stored");

    let residuals = service
        .residual(ResidualRequest {
            parent_id: parent.id.clone(),
            measures: vec![probability_measure()],
        })
        .expect("residual succeeds");

    assert_eq!(residuals.len(), 1);
    let residual = &residuals[0];
    assert!(residual.id.starts_with("qr-"));
    assert_eq!(residual.method, AnalysisMethod::Residual);
    assert_eq!(residual.parent_id.as_deref(), Some(parent.id.as_str()));
    assert_eq!(
        residual.measure_description.as_deref(),
        Some("Deployed offline backups and EDR monitoring")
    );
    assert_eq!(residual.category, parent.category);
    assert_eq!(residual.risk_type, parent.risk_type);
    assert!(residual.answers.is_empty());
    assert!(residual.breakdown.probability.is_empty());
    assert_eq!(residual.evaluation.severity, parent.evaluation.severity);
    assert_eq!(residual.evaluation.probability, 2);
    assert_eq!(residual.evaluation.score, 24);
    assert_eq!(residual.evaluation.classification, Classification::Low);
}

#[test]
fn residual_with_unknown_parent_is_rejected() {
    let (service, _repository) = build_service();
    let error = service
        .residual(ResidualRequest {
            parent_id: "qa-20240101000000-0001".to_string(),
            measures: vec![probability_measure()],
        })
        .expect_err("parent does not exist");
    assert!(matches!(error, AnalysisServiceError::UnknownAnalysis(_)));
}

#[test]
fn failing_measure_persists_nothing() {
    let (service, repository) = build_service();
    let parent = service.analyze(submission()).expect("parent stored");

    let mut empty = probability_measure();
    empty.answers.probability.clear();
    let error = service
        .residual(ResidualRequest {
            parent_id: parent.id.clone(),
            measures: vec![probability_measure(), empty],
        })
        .expect_err("second measure invalid");
    assert!(matches!(error, AnalysisServiceError::Validation(_)));

    let stored = repository.records.lock().expect("repository mutex poisoned");
    assert_eq!(stored.len(), 1, "only the parent remains stored");
}

#[test]
fn pagination_reports_the_full_total() {
    let (service, _repository) = build_service();
    for index in 0..5 {
        let mut request = submission();
        request.description = format!("risk #{index}");
        service.analyze(request).expect("analysis succeeds");
    }

    let page = service.page(0, 2).expect("page loads");
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);

    let tail = service.page(4, 2).expect("page loads");
    assert_eq!(tail.total, 5);
    assert_eq!(tail.items.len(), 1);
}

#[test]
fn remove_then_fetch_misses() {
    let (service, _repository) = build_service();
    let record = service.analyze(submission()).expect("analysis succeeds");
    service.remove(&record.id).expect("delete succeeds");
    let error = service.fetch(&record.id).expect_err("record is gone");
    assert!(matches!(error, AnalysisServiceError::UnknownAnalysis(_)));
    let error = service.remove(&record.id).expect_err("already gone");
    assert!(matches!(error, AnalysisServiceError::UnknownAnalysis(_)));
}

#[test]
fn import_merges_only_new_ids() {
    let (service, _repository) = build_service();
    let first = service.analyze(submission()).expect("analysis succeeds");
    let second = service.analyze(submission()).expect("analysis succeeds");

    let exported = service.export().expect("export succeeds");
    assert_eq!(exported.len(), 2);

    let (other_service, _other_repository) = build_service();
    let added = other_service.import(exported.clone()).expect("import succeeds");
    assert_eq!(added, 2);
    let added_again = other_service.import(exported).expect("import succeeds");
    assert_eq!(added_again, 0);

    let all = other_service.export().expect("export succeeds");
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|record| record.id == first.id));
    assert!(all.iter().any(|record| record.id == second.id));
}

#[test]
fn store_outage_surfaces_as_store_error() {
    let service = AnalysisService::new(
        Arc::new(QuestionBank::standard()),
        Arc::new(UnavailableRepository),
    );
    let error = service.analyze(submission()).expect_err("store offline");
    assert!(matches!(error, AnalysisServiceError::Store(_)));
}
