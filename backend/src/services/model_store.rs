//! File-backed model artifacts: load, save, archive

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::scorer::LinearModel;

/// Reads and writes JSON model artifacts. A model reference is a file path.
#[derive(Debug, Clone)]
pub struct ModelStore {
    archive_dir: PathBuf,
}

impl ModelStore {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Load and validate an artifact
    pub fn load(&self, path: &Path) -> AppResult<LinearModel> {
        let bytes = fs::read(path)?;
        let model: LinearModel = serde_json::from_slice(&bytes)?;
        model
            .validate()
            .map_err(|e| AppError::InternalInvariant(format!("{}: {}", path.display(), e)))?;
        Ok(model)
    }

    /// Write an artifact, replacing any file at `path` in one rename
    pub fn save(&self, path: &Path, model: &LinearModel) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(model)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Where a retrain job writes its candidate
    pub fn candidate_path(&self, job_id: Uuid) -> PathBuf {
        self.archive_dir.join(format!("candidate_{}.json", job_id))
    }

    /// Copy the artifact at `active` into the archive.
    ///
    /// Returns the archived path, or `None` when there was nothing to archive.
    pub fn archive(&self, active: &Path) -> AppResult<Option<PathBuf>> {
        if !active.is_file() {
            return Ok(None);
        }
        fs::create_dir_all(&self.archive_dir)?;
        let stem = active
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        let archived = self.archive_dir.join(format!(
            "{}_{}.json",
            stem,
            Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        fs::copy(active, &archived)?;
        tracing::info!("Archived {} to {}", active.display(), archived.display());
        Ok(Some(archived))
    }

    /// Promote `candidate` to `active`, archiving the previous artifact first
    pub fn promote(&self, candidate: &Path, active: &Path) -> AppResult<Option<PathBuf>> {
        let model = self.load(candidate)?;
        let archived = self.archive(active)?;
        self.save(active, &model)?;
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::FEATURE_COUNT;

    fn model(version: &str) -> LinearModel {
        LinearModel {
            version: version.to_string(),
            trained_at: Utc::now(),
            feature_names: LinearModel::contract_feature_names(),
            means: vec![0.0; FEATURE_COUNT],
            scales: vec![1.0; FEATURE_COUNT],
            coefficients: vec![0.5; FEATURE_COUNT],
            intercept: 3.0,
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("archive"));
        let path = dir.path().join("active.json");
        store.save(&path, &model("v1")).unwrap();
        assert_eq!(store.load(&path).unwrap().version, "v1");
    }

    #[test]
    fn load_rejects_wrong_feature_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("archive"));
        let path = dir.path().join("active.json");
        let mut bad = model("v1");
        bad.coefficients.truncate(10);
        fs::write(&path, serde_json::to_vec(&bad).unwrap()).unwrap();
        assert!(matches!(
            store.load(&path),
            Err(AppError::InternalInvariant(_))
        ));
    }

    #[test]
    fn load_rejects_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("archive"));
        let path = dir.path().join("active.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(store.load(&path), Err(AppError::Storage(_))));
    }

    #[test]
    fn promote_archives_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("archive"));
        let active = dir.path().join("active.json");
        let candidate = store.candidate_path(Uuid::new_v4());
        store.save(&active, &model("old")).unwrap();
        store.save(&candidate, &model("new")).unwrap();

        let archived = store.promote(&candidate, &active).unwrap().unwrap();
        assert_eq!(store.load(&archived).unwrap().version, "old");
        assert_eq!(store.load(&active).unwrap().version, "new");
    }

    #[test]
    fn archive_without_active_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("archive"));
        assert_eq!(store.archive(&dir.path().join("missing.json")).unwrap(), None);
    }
}
