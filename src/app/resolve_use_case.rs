//! The candidate-resolution workflow: a human picks merge / create / ignore
//! for a flagged duplicate, exactly once per candidate.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::common::error::{ImportError, Result};
use crate::domain::{CandidateView, Customer, FieldMap, ImportRow, Resolution};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    Merged,
    CreatedNew,
    Ignored,
}

/// Result of a resolution: the terminal state reached and, for merge/create,
/// the affected customer.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutcome {
    pub resolution: Resolution,
    pub customer_id: Option<Uuid>,
}

pub struct ResolveUseCase {
    storage: Arc<dyn Storage>,
}

impl ResolveUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Candidate read model for an import: the flagged row's normalized data
    /// next to the referenced customer's current fields.
    pub async fn list_candidates(&self, import_id: Uuid) -> Result<Vec<CandidateView>> {
        let candidates = self.storage.get_candidates_by_import(import_id).await?;

        let mut views = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = candidate.id.ok_or(ImportError::MissingId)?;
            let row = self.require_row(candidate.import_row_id).await?;
            let customer = self.require_customer(candidate.existing_customer_id).await?;
            views.push(CandidateView {
                id,
                import_row_id: candidate.import_row_id,
                existing_customer_id: candidate.existing_customer_id,
                existing_customer: customer,
                new_data: row.normalized_data,
                match_reason: candidate.match_reason,
                similarity_score: candidate.similarity_score,
                resolution: candidate.resolution,
            });
        }
        Ok(views)
    }

    /// Applies one terminal action to a pending candidate. Re-resolving a
    /// candidate that already reached a terminal state is rejected without
    /// any mutation.
    pub async fn resolve(
        &self,
        candidate_id: Uuid,
        action: ResolveAction,
        overrides: Option<FieldMap>,
        resolved_by: Option<String>,
    ) -> Result<ResolveOutcome> {
        let mut candidate =
            self.storage
                .get_candidate(candidate_id)
                .await?
                .ok_or(ImportError::NotFound {
                    entity: "duplicate candidate",
                    id: candidate_id,
                })?;

        if candidate.resolution.is_terminal() {
            return Err(ImportError::AlreadyResolved {
                id: candidate_id,
                resolution: candidate.resolution.as_str().to_string(),
            });
        }

        let row = self.require_row(candidate.import_row_id).await?;
        let data = overlay(&row.normalized_data, overrides);

        let (resolution, customer_id) = match action {
            ResolveAction::Merged => {
                let mut customer = self.require_customer(candidate.existing_customer_id).await?;
                customer.apply_normalized(&data);
                self.storage.update_customer(&customer).await?;
                (Resolution::Merged, customer.id)
            }
            ResolveAction::CreatedNew => {
                let mut customer = Customer::from_normalized(&data);
                self.storage.create_customer(&mut customer).await?;
                (Resolution::CreatedNew, customer.id)
            }
            ResolveAction::Ignored => (Resolution::Ignored, None),
        };

        candidate.resolution = resolution;
        self.storage.update_candidate(&candidate).await?;
        self.stamp_resolver(&row, resolved_by).await?;

        info!(
            "Candidate {} resolved as {}",
            candidate_id,
            resolution.as_str()
        );
        Ok(ResolveOutcome {
            resolution,
            customer_id,
        })
    }

    /// Audit stamp on the owning import. An anonymous resolution refreshes
    /// `resolved_at` but keeps the last named resolver.
    async fn stamp_resolver(&self, row: &ImportRow, resolved_by: Option<String>) -> Result<()> {
        let Some(mut import) = self.storage.get_import(row.import_id).await? else {
            return Ok(());
        };
        if resolved_by.is_some() {
            import.resolved_by = resolved_by;
        }
        import.resolved_at = Some(Utc::now());
        self.storage.update_import(&import).await
    }

    async fn require_row(&self, row_id: Uuid) -> Result<ImportRow> {
        self.storage
            .get_import_row(row_id)
            .await?
            .ok_or(ImportError::NotFound {
                entity: "import row",
                id: row_id,
            })
    }

    async fn require_customer(&self, customer_id: Uuid) -> Result<Customer> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or(ImportError::NotFound {
                entity: "customer",
                id: customer_id,
            })
    }
}

/// Row data overlaid with any non-empty override fields supplied by the
/// resolver.
fn overlay(base: &FieldMap, overrides: Option<FieldMap>) -> FieldMap {
    let mut data = base.clone();
    if let Some(overrides) = overrides {
        for (field, value) in overrides {
            if !value.is_empty() {
                data.insert(field, value);
            }
        }
    }
    data
}
