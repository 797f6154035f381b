use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use risk_ai::advisor::{AdvisorError, AdvisorOpinion, AdvisoryRequest, RiskAdvisor};
use risk_ai::kinney;
use risk_ai::storage::StoreError;
use risk_ai::workflows::assessment::{AnalysisPage, AnalysisRecord, AnalysisRepository};
use risk_ai::workflows::learning::{
    ArtifactStore, FeedbackEntry, FeedbackId, FeedbackStore, JsonFileArtifactStore,
    PredictionService, TrainingArtifact,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Advisor seam handed to the compare/analyze endpoints. The predictor reads
/// the same artifact file the training pipeline writes.
#[derive(Clone)]
pub(crate) struct AdvisoryState {
    pub(crate) advisor: Arc<dyn RiskAdvisor>,
    pub(crate) predictor: Arc<PredictionService<JsonFileArtifactStore>>,
}

/// Default advisor wiring: no language-model integration is configured, so
/// every request reports the upstream as unavailable.
pub(crate) struct DisabledAdvisor;

impl RiskAdvisor for DisabledAdvisor {
    fn advise(&self, _request: &AdvisoryRequest) -> Result<AdvisorOpinion, AdvisorError> {
        Err(AdvisorError::Unavailable(
            "no language-model advisor is configured".to_string(),
        ))
    }
}

/// Deterministic advisor for the CLI demo and handler tests. Rates from the
/// declared type and category with the same lean the synthetic generator
/// uses, so the opinions read plausibly without any upstream call.
pub(crate) struct ScriptedAdvisor;

impl RiskAdvisor for ScriptedAdvisor {
    fn advise(&self, request: &AdvisoryRequest) -> Result<AdvisorOpinion, AdvisorError> {
        let severity = match request.risk_type.as_str() {
            "Cyber & InfoSec" => 5,
            "Financial" | "Technical" => 4,
            _ => 3,
        };
        let frequency = match request.category.as_str() {
            "Industrial" => 4,
            "Quality" => 3,
            _ => 2,
        };
        let description = request.description.to_lowercase();
        let probability = if description.contains("unpatched") || description.contains("exposed") {
            4
        } else {
            3
        };

        let score = kinney::score(severity, frequency, probability);
        let classification = kinney::classify(score);

        Ok(AdvisorOpinion {
            severity,
            frequency,
            probability,
            classification: Some(classification.label().to_string()),
            causes: vec![
                format!(
                    "{} exposure is typical for the {} category",
                    request.risk_type, request.category
                ),
                "The description mentions no compensating controls".to_string(),
            ],
            recommendations: vec![
                "Assign an owner and a remediation deadline".to_string(),
                format!("Planned response: {}", classification.action_plan()),
            ],
            justification: format!(
                "Rated G={severity} F={frequency} P={probability} from the declared risk type and category."
            ),
        })
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAnalysisRepository {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl AnalysisRepository for InMemoryAnalysisRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        let mut guard = self.records.lock().expect("analysis mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }

    fn insert_many(&self, records: Vec<AnalysisRecord>) -> Result<Vec<AnalysisRecord>, StoreError> {
        let mut guard = self.records.lock().expect("analysis mutex poisoned");
        guard.extend(records.iter().cloned());
        Ok(records)
    }

    fn fetch(&self, id: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let guard = self.records.lock().expect("analysis mutex poisoned");
        Ok(guard.iter().find(|record| record.id == id).cloned())
    }

    fn page(&self, offset: usize, limit: usize) -> Result<AnalysisPage, StoreError> {
        let guard = self.records.lock().expect("analysis mutex poisoned");
        let mut all = guard.clone();
        all.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        let total = all.len();
        let items = all.into_iter().skip(offset).take(limit).collect();
        Ok(AnalysisPage { total, items })
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("analysis mutex poisoned");
        let before = guard.len();
        guard.retain(|record| record.id != id);
        if guard.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn export(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        let guard = self.records.lock().expect("analysis mutex poisoned");
        Ok(guard.clone())
    }

    fn import(&self, records: Vec<AnalysisRecord>) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("analysis mutex poisoned");
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

#[derive(Default)]
pub(crate) struct InMemoryFeedbackStore {
    entries: Mutex<Vec<FeedbackEntry>>,
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn append(&self, entry: FeedbackEntry) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().expect("feedback mutex poisoned");
        guard.push(entry);
        Ok(())
    }

    fn all(&self) -> Result<Vec<FeedbackEntry>, StoreError> {
        let guard = self.entries.lock().expect("feedback mutex poisoned");
        Ok(guard.clone())
    }

    fn mark_used(&self, ids: &[FeedbackId]) -> Result<usize, StoreError> {
        let mut guard = self.entries.lock().expect("feedback mutex poisoned");
        let mut changed = 0;
        for entry in guard.iter_mut() {
            if !entry.used_for_training && ids.contains(&entry.id) {
                entry.used_for_training = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryArtifactStore {
    slot: Mutex<Option<(TrainingArtifact, DateTime<Utc>)>>,
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load(&self) -> Result<TrainingArtifact, StoreError> {
        let guard = self.slot.lock().expect("artifact mutex poisoned");
        guard
            .as_ref()
            .map(|(artifact, _)| artifact.clone())
            .ok_or(StoreError::NotFound)
    }

    fn save(&self, artifact: &TrainingArtifact) -> Result<(), StoreError> {
        let mut guard = self.slot.lock().expect("artifact mutex poisoned");
        *guard = Some((artifact.clone(), Utc::now()));
        Ok(())
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        let guard = self.slot.lock().expect("artifact mutex poisoned");
        guard.as_ref().map(|(_, saved_at)| *saved_at)
    }
}
