//! The per-row decision pipeline: mapping -> normalize -> validate -> match
//! -> classify, with aggregate job bookkeeping. Each row's effects commit
//! immediately; a concurrent status reader can watch counters and the
//! progress cursor advance while the job is still `processing`.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::common::error::{ImportError, Result};
use crate::domain::{
    ColumnMapping, Customer, DuplicateCandidate, FieldMap, Import, ImportRow, ImportStatus,
    RawFieldMap, Resolution, RowStatus,
};
use crate::pipeline::matcher::{find_candidates, MatcherConfig};
use crate::pipeline::normalize::{normalize, rule_for_field};
use crate::pipeline::validate::{validate, ValidateRule};
use crate::storage::Storage;

/// Fields with a format check and the rule applied to them.
const VALIDATED_FIELDS: [(&str, ValidateRule); 1] = [("email", ValidateRule::Email)];

/// Applies the column mapping to one raw row. Fields absent from the mapping,
/// columns absent from the row, and null cells are simply omitted.
pub fn map_row(raw: &RawFieldMap, mapping: &ColumnMapping) -> FieldMap {
    let mut mapped = FieldMap::new();
    for (field, column) in mapping {
        let Some(value) = raw.get(column) else { continue };
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        mapped.insert(field.clone(), text);
    }
    mapped
}

/// Normalizes every mapped field with its per-field rule; absent results are
/// omitted from the map.
pub fn normalize_mapped(mapped: &FieldMap) -> FieldMap {
    let mut normalized = FieldMap::new();
    for (field, value) in mapped {
        if let Some(out) = normalize(Some(value), rule_for_field(field)) {
            normalized.insert(field.clone(), out);
        }
    }
    normalized
}

/// Runs format checks over normalized data, one message per failing field.
pub fn validate_normalized(normalized: &FieldMap) -> Vec<String> {
    let mut errors = Vec::new();
    for (field, rule) in VALIDATED_FIELDS {
        if let Some(value) = normalized.get(field) {
            if let Some(message) = validate(value, rule) {
                errors.push(format!("{field}: {message}"));
            }
        }
    }
    errors
}

enum RowOutcome {
    Inserted,
    Error,
    Candidate,
}

/// Orchestrates one import job over the storage seam.
pub struct ImportProcessor {
    storage: Arc<dyn Storage>,
    config: MatcherConfig,
}

impl ImportProcessor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, MatcherConfig::default())
    }

    pub fn with_config(storage: Arc<dyn Storage>, config: MatcherConfig) -> Self {
        Self { storage, config }
    }

    /// Runs the full row loop for a previously created import. On success the
    /// job ends `completed`; any unexpected error marks it `failed` with the
    /// captured message, leaving already-committed rows untouched. Returns
    /// `Err` only when even the failure could not be recorded.
    pub async fn run(
        &self,
        import_id: Uuid,
        mapping: &ColumnMapping,
        rows: &[RawFieldMap],
    ) -> Result<()> {
        info!("Starting import job {} with {} rows", import_id, rows.len());

        match self.process_rows(import_id, mapping, rows).await {
            Ok(import) => {
                info!(
                    "Import job {} completed: {} inserted, {} errors, {} candidates",
                    import_id, import.inserted_count, import.error_count, import.candidate_count
                );
                Ok(())
            }
            Err(e) => {
                error!("Import job {} failed: {}", import_id, e);
                let mut import = self
                    .storage
                    .get_import(import_id)
                    .await?
                    .ok_or(ImportError::NotFound {
                        entity: "import",
                        id: import_id,
                    })?;
                import.status = ImportStatus::Failed;
                import.error_message = Some(e.to_string());
                self.storage.update_import(&import).await?;
                Ok(())
            }
        }
    }

    async fn process_rows(
        &self,
        import_id: Uuid,
        mapping: &ColumnMapping,
        rows: &[RawFieldMap],
    ) -> Result<Import> {
        let mut import = self
            .storage
            .get_import(import_id)
            .await?
            .ok_or(ImportError::NotFound {
                entity: "import",
                id: import_id,
            })?;

        // The fuzzy-matching pool is snapshotted once per job. Customers
        // created by earlier rows of this job are invisible here, but ARE
        // visible to the live exact-match probe below.
        let snapshot = self.storage.list_customers().await?;
        debug!(
            "Import {}: snapshot of {} existing customers",
            import_id,
            snapshot.len()
        );

        for (idx, raw) in rows.iter().enumerate() {
            let idx = idx as u32;
            let outcome = self.process_row(import_id, idx, raw, mapping, &snapshot).await?;

            match outcome {
                RowOutcome::Inserted => import.inserted_count += 1,
                RowOutcome::Error => import.error_count += 1,
                RowOutcome::Candidate => import.candidate_count += 1,
            }
            import.last_row_index = Some(idx);
            self.storage.update_import(&import).await?;
        }

        import.status = ImportStatus::Completed;
        self.storage.update_import(&import).await?;
        Ok(import)
    }

    async fn process_row(
        &self,
        import_id: Uuid,
        row_index: u32,
        raw: &RawFieldMap,
        mapping: &ColumnMapping,
        snapshot: &[Customer],
    ) -> Result<RowOutcome> {
        let mapped = map_row(raw, mapping);
        let normalized = normalize_mapped(&mapped);
        let validation_errors = validate_normalized(&normalized);

        if !validation_errors.is_empty() {
            debug!(
                "Row {} failed validation: {:?}",
                row_index, validation_errors
            );
            self.write_row(
                import_id,
                row_index,
                raw,
                mapped,
                normalized,
                validation_errors,
                RowStatus::Error,
            )
            .await?;
            return Ok(RowOutcome::Error);
        }

        // Exact-match fast path against live storage: email first, then
        // phone. A hit merges the row into the existing customer in place.
        if let Some(mut existing) = self.find_exact(&normalized).await? {
            existing.apply_normalized(&normalized);
            self.storage.update_customer(&existing).await?;
            debug!(
                "Row {} exact-matched customer {:?}",
                row_index, existing.id
            );
            self.write_row(
                import_id,
                row_index,
                raw,
                mapped,
                normalized,
                Vec::new(),
                RowStatus::Inserted,
            )
            .await?;
            return Ok(RowOutcome::Inserted);
        }

        let candidates = find_candidates(&normalized, snapshot, &self.config);
        if !candidates.is_empty() {
            let row = self
                .write_row(
                    import_id,
                    row_index,
                    raw,
                    mapped,
                    normalized,
                    Vec::new(),
                    RowStatus::Candidate,
                )
                .await?;
            let row_id = row.id.ok_or(ImportError::MissingId)?;
            for candidate in &candidates {
                let mut record = DuplicateCandidate {
                    id: None,
                    import_row_id: row_id,
                    existing_customer_id: candidate.customer_id,
                    match_reason: candidate.match_reason.clone(),
                    similarity_score: candidate.score,
                    resolution: Resolution::Pending,
                    created_at: chrono::Utc::now(),
                };
                self.storage.create_candidate(&mut record).await?;
            }
            debug!(
                "Row {} flagged with {} duplicate candidates",
                row_index,
                candidates.len()
            );
            return Ok(RowOutcome::Candidate);
        }

        // Clean insert. A uniqueness conflict here means a concurrent job won
        // the race past the exact-match probe; that is a row-level error, not
        // a job failure.
        let mut customer = Customer::from_normalized(&normalized);
        match self.storage.create_customer(&mut customer).await {
            Ok(()) => {
                self.write_row(
                    import_id,
                    row_index,
                    raw,
                    mapped,
                    normalized,
                    Vec::new(),
                    RowStatus::Inserted,
                )
                .await?;
                Ok(RowOutcome::Inserted)
            }
            Err(ImportError::UniqueViolation { field, value }) => {
                warn!(
                    "Row {} lost a uniqueness race on {}: {}",
                    row_index, field, value
                );
                self.write_row(
                    import_id,
                    row_index,
                    raw,
                    mapped,
                    normalized,
                    vec![format!("{field}: duplicate value {value}")],
                    RowStatus::Error,
                )
                .await?;
                Ok(RowOutcome::Error)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_exact(&self, normalized: &FieldMap) -> Result<Option<Customer>> {
        if let Some(email) = normalized.get("email").filter(|v| !v.is_empty()) {
            if let Some(customer) = self.storage.get_customer_by_email(email).await? {
                return Ok(Some(customer));
            }
        }
        if let Some(phone) = normalized.get("phone").filter(|v| !v.is_empty()) {
            if let Some(customer) = self.storage.get_customer_by_phone(phone).await? {
                return Ok(Some(customer));
            }
        }
        Ok(None)
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_row(
        &self,
        import_id: Uuid,
        row_index: u32,
        raw: &RawFieldMap,
        mapped: FieldMap,
        normalized: FieldMap,
        validation_errors: Vec<String>,
        status: RowStatus,
    ) -> Result<ImportRow> {
        let mut row = ImportRow {
            id: None,
            import_id,
            row_index,
            raw_data: raw.clone(),
            mapped_data: mapped,
            normalized_data: normalized,
            validation_errors,
            status,
        };
        self.storage.create_import_row(&mut row).await?;
        Ok(row)
    }
}
