use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::storage::StoreError;
use crate::workflows::assessment::domain::{
    AnalysisRecord, Answer, FactorAnswerSets, FactorImpacts, MitigationMeasure,
    QuestionnaireSubmission,
};
use crate::workflows::assessment::questionnaire::QuestionBank;
use crate::workflows::assessment::repository::{AnalysisPage, AnalysisRepository};
use crate::workflows::assessment::router::assessment_router;
use crate::workflows::assessment::service::AnalysisService;

pub(super) fn answer(question_id: &str, option_id: &str) -> Answer {
    Answer::new(question_id, option_id)
}

/// Answers aggregating to G=4, F=3, P=3 (score 36, Medium).
pub(super) fn medium_risk_answers() -> Vec<Answer> {
    vec![
        answer("G1", "G1_O4"),
        answer("G2", "G2_O4"),
        answer("F1", "F1_O3"),
        answer("F2", "F2_O3"),
        answer("P1", "P1_O3"),
        answer("P2", "P2_O3"),
    ]
}

pub(super) fn submission() -> QuestionnaireSubmission {
    QuestionnaireSubmission {
        description: "Ransomware attack on the production plant".to_string(),
        category: "Industrial".to_string(),
        risk_type: "Cyber & InfoSec".to_string(),
        sector: "Technology".to_string(),
        answers: medium_risk_answers(),
    }
}

/// A measure impacting only probability, re-answered towards the low end.
pub(super) fn probability_measure() -> MitigationMeasure {
    MitigationMeasure {
        description: "Deployed offline backups and EDR monitoring".to_string(),
        impacts: FactorImpacts { severity: false, frequency: false, probability: true },
        answers: FactorAnswerSets {
            severity: Vec::new(),
            frequency: Vec::new(),
            probability: vec![answer("P1", "P1_O2"), answer("P2", "P2_O2")],
        },
    }
}

pub(super) fn build_service() -> (Arc<AnalysisService<MemoryRepository>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(AnalysisService::new(
        Arc::new(QuestionBank::standard()),
        repository.clone(),
    ));
    (service, repository)
}

pub(super) fn router_with_service(
    service: Arc<AnalysisService<MemoryRepository>>,
) -> axum::Router {
    assessment_router(service)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<AnalysisRecord>>>,
}

impl AnalysisRepository for MemoryRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }

    fn insert_many(&self, records: Vec<AnalysisRecord>) -> Result<Vec<AnalysisRecord>, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.extend(records.iter().cloned());
        Ok(records)
    }

    fn fetch(&self, id: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| record.id == id).cloned())
    }

    fn page(&self, offset: usize, limit: usize) -> Result<AnalysisPage, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut all = guard.clone();
        all.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        let total = all.len();
        let items = all.into_iter().skip(offset).take(limit).collect();
        Ok(AnalysisPage { total, items })
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|record| record.id != id);
        if guard.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn export(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }

    fn import(&self, records: Vec<AnalysisRecord>) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let mut added = 0;
        for record in records {
            if guard.iter().all(|existing| existing.id != record.id) {
                guard.push(record);
                added += 1;
            }
        }
        Ok(added)
    }
}

pub(super) struct UnavailableRepository;

impl AnalysisRepository for UnavailableRepository {
    fn insert(&self, _record: AnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn insert_many(
        &self,
        _records: Vec<AnalysisRecord>,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn page(&self, _offset: usize, _limit: usize) -> Result<AnalysisPage, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn remove(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn export(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn import(&self, _records: Vec<AnalysisRecord>) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
