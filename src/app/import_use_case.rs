//! Job submission and status polling. Each submitted import runs as one
//! independent background task; callers poll the status read model rather
//! than being pushed results.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::common::error::{ImportError, Result};
use crate::domain::{ColumnMapping, Import, ImportStatusView, RawFieldMap};
use crate::pipeline::matcher::MatcherConfig;
use crate::pipeline::processor::ImportProcessor;
use crate::storage::Storage;

pub struct ImportUseCase {
    storage: Arc<dyn Storage>,
    config: MatcherConfig,
}

impl ImportUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, MatcherConfig::default())
    }

    pub fn with_config(storage: Arc<dyn Storage>, config: MatcherConfig) -> Self {
        Self { storage, config }
    }

    /// Creates the job record and spawns the processor in the background.
    /// Returns the import id immediately; progress is visible through
    /// `status`.
    pub async fn submit(
        &self,
        filename: &str,
        source_ref: Option<String>,
        created_by: Option<String>,
        mapping: ColumnMapping,
        rows: Vec<RawFieldMap>,
    ) -> Result<Uuid> {
        let import_id = self
            .create_job(filename, source_ref, created_by, rows.len() as u32)
            .await?;

        let processor = ImportProcessor::with_config(self.storage.clone(), self.config.clone());
        tokio::spawn(async move {
            if let Err(e) = processor.run(import_id, &mapping, &rows).await {
                error!("Import job {} could not record its outcome: {}", import_id, e);
            }
        });

        Ok(import_id)
    }

    /// Creates the job record and runs the processor to completion before
    /// returning. Used by the CLI and tests.
    pub async fn run_inline(
        &self,
        filename: &str,
        source_ref: Option<String>,
        created_by: Option<String>,
        mapping: &ColumnMapping,
        rows: &[RawFieldMap],
    ) -> Result<Uuid> {
        let import_id = self
            .create_job(filename, source_ref, created_by, rows.len() as u32)
            .await?;
        let processor = ImportProcessor::with_config(self.storage.clone(), self.config.clone());
        processor.run(import_id, mapping, rows).await?;
        Ok(import_id)
    }

    async fn create_job(
        &self,
        filename: &str,
        source_ref: Option<String>,
        created_by: Option<String>,
        total_rows: u32,
    ) -> Result<Uuid> {
        let mut import = Import::new(filename, source_ref, created_by, total_rows);
        self.storage.create_import(&mut import).await?;
        let import_id = import.id.ok_or(ImportError::MissingId)?;
        info!(
            "Submitted import {} ({}, {} rows)",
            import_id, filename, total_rows
        );
        Ok(import_id)
    }

    /// Past and in-flight jobs, newest first, projected through the same
    /// read model as `status`.
    pub async fn history(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<ImportStatusView>> {
        let imports = self.storage.list_imports(limit, offset).await?;
        Ok(imports.iter().filter_map(ImportStatusView::from_import).collect())
    }

    pub async fn status(&self, import_id: Uuid) -> Result<ImportStatusView> {
        let import = self
            .storage
            .get_import(import_id)
            .await?
            .ok_or(ImportError::NotFound {
                entity: "import",
                id: import_id,
            })?;
        ImportStatusView::from_import(&import).ok_or(ImportError::MissingId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImportStatus;
    use crate::storage::InMemoryStorage;
    use serde_json::json;
    use std::time::Duration;

    fn mapping() -> ColumnMapping {
        [("full_name", "Name"), ("email", "Email")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn run_inline_completes_and_projects_status() {
        let storage = Arc::new(InMemoryStorage::new());
        let use_case = ImportUseCase::new(storage);

        let rows = vec![
            [("Name".to_string(), json!("Grace Hopper"))].into_iter().collect(),
            [("Email".to_string(), json!("bad"))].into_iter().collect(),
        ];
        let id = use_case
            .run_inline("people.csv", None, Some("ops".into()), &mapping(), &rows)
            .await
            .unwrap();

        let status = use_case.status(id).await.unwrap();
        assert_eq!(status.status, ImportStatus::Completed);
        assert_eq!(status.filename, "people.csv");
        assert_eq!(status.total_rows, 2);
        assert_eq!(status.inserted_count, 1);
        assert_eq!(status.error_count, 1);
        assert_eq!(status.created_by.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn submit_runs_in_background_until_completed() {
        let storage = Arc::new(InMemoryStorage::new());
        let use_case = ImportUseCase::new(storage);

        let rows = vec![[("Name".to_string(), json!("Ada Lovelace"))]
            .into_iter()
            .collect()];
        let id = use_case
            .submit("bg.csv", None, None, mapping(), rows)
            .await
            .unwrap();

        // Status is readable immediately; poll until the job finishes.
        for _ in 0..50 {
            let status = use_case.status(id).await.unwrap();
            if status.status == ImportStatus::Completed {
                assert_eq!(status.inserted_count, 1);
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background import never completed");
    }

    #[tokio::test]
    async fn history_lists_jobs_newest_first() {
        let storage = Arc::new(InMemoryStorage::new());
        let use_case = ImportUseCase::new(storage);

        let rows: Vec<RawFieldMap> = vec![[("Name".to_string(), json!("Grace Hopper"))]
            .into_iter()
            .collect()];
        for name in ["jan.csv", "feb.csv", "mar.csv"] {
            use_case
                .run_inline(name, None, None, &mapping(), &rows)
                .await
                .unwrap();
        }

        let history = use_case.history(None, None).await.unwrap();
        let names: Vec<&str> = history.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, vec!["mar.csv", "feb.csv", "jan.csv"]);
        assert!(history.iter().all(|s| s.status == ImportStatus::Completed));

        let page = use_case.history(Some(1), Some(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].filename, "feb.csv");
    }

    #[tokio::test]
    async fn status_of_unknown_import_is_not_found() {
        let storage = Arc::new(InMemoryStorage::new());
        let use_case = ImportUseCase::new(storage);
        let err = use_case.status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ImportError::NotFound { entity: "import", .. }));
    }
}
