use std::path::PathBuf;
use std::sync::Mutex;

use crate::storage::{self, StoreError};

use super::domain::AnalysisRecord;

/// One page of the analysis listing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisPage {
    pub total: usize,
    pub items: Vec<AnalysisRecord>,
}

/// Persistence seam for analysis records.
pub trait AnalysisRepository: Send + Sync {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, StoreError>;
    /// Appends a batch in one snapshot rewrite; residual batches must land
    /// together or not at all.
    fn insert_many(&self, records: Vec<AnalysisRecord>) -> Result<Vec<AnalysisRecord>, StoreError>;
    fn fetch(&self, id: &str) -> Result<Option<AnalysisRecord>, StoreError>;
    /// Newest first, with the pre-pagination total.
    fn page(&self, offset: usize, limit: usize) -> Result<AnalysisPage, StoreError>;
    fn remove(&self, id: &str) -> Result<(), StoreError>;
    fn export(&self) -> Result<Vec<AnalysisRecord>, StoreError>;
    /// Merges records whose id is not present yet and reports how many were
    /// added.
    fn import(&self, records: Vec<AnalysisRecord>) -> Result<usize, StoreError>;
}

/// Whole-file JSON store. Every operation takes the store mutex, reloads the
/// snapshot, applies the change and rewrites the file.
pub struct JsonFileAnalysisRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileAnalysisRepository {
    pub const FILE_NAME: &'static str = "questionnaire_analyses.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir.into().join(Self::FILE_NAME))
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("analysis store lock poisoned".to_string()))
    }

    fn load(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        storage::load_collection(&self.path)
    }

    fn save(&self, records: &[AnalysisRecord]) -> Result<(), StoreError> {
        storage::save_collection(&self.path, records)
    }
}

impl AnalysisRepository for JsonFileAnalysisRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        self.insert_many(vec![record])
            .map(|mut records| records.remove(0))
    }

    fn insert_many(&self, records: Vec<AnalysisRecord>) -> Result<Vec<AnalysisRecord>, StoreError> {
        let _guard = self.guard()?;
        let mut all = self.load()?;
        all.extend(records.iter().cloned());
        self.save(&all)?;
        Ok(records)
    }

    fn fetch(&self, id: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let _guard = self.guard()?;
        Ok(self.load()?.into_iter().find(|record| record.id == id))
    }

    fn page(&self, offset: usize, limit: usize) -> Result<AnalysisPage, StoreError> {
        let _guard = self.guard()?;
        let mut all = self.load()?;
        all.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        let total = all.len();
        let items = all.into_iter().skip(offset).take(limit).collect();
        Ok(AnalysisPage { total, items })
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut all = self.load()?;
        let before = all.len();
        all.retain(|record| record.id != id);
        if all.len() == before {
            return Err(StoreError::NotFound);
        }
        self.save(&all)
    }

    fn export(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        let _guard = self.guard()?;
        self.load()
    }

    fn import(&self, records: Vec<AnalysisRecord>) -> Result<usize, StoreError> {
        let _guard = self.guard()?;
        let mut all = self.load()?;
        let mut added = 0;
        for record in records {
            if all.iter().all(|existing| existing.id != record.id) {
                all.push(record);
                added += 1;
            }
        }
        if added > 0 {
            self.save(&all)?;
        }
        Ok(added)
    }
}
