use crate::common::error::Result;
use crate::domain::{Customer, DuplicateCandidate, Import, ImportRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Narrow storage interface consumed by the pipeline and the resolution
/// workflow. A persistent engine lives behind this trait; an in-memory
/// adapter ships for the CLI and tests. `list_customers` returns the registry
/// in insertion order, which the duplicate detector relies on for stable
/// tie-breaking.
#[async_trait]
pub trait Storage: Send + Sync {
    // Import job operations. `list_imports` returns jobs newest-first for
    // the import-history surface.
    async fn create_import(&self, import: &mut Import) -> Result<()>;
    async fn get_import(&self, import_id: Uuid) -> Result<Option<Import>>;
    async fn list_imports(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Import>>;
    async fn update_import(&self, import: &Import) -> Result<()>;

    // Import row operations
    async fn create_import_row(&self, row: &mut ImportRow) -> Result<()>;
    async fn get_import_row(&self, row_id: Uuid) -> Result<Option<ImportRow>>;
    async fn get_rows_by_import(&self, import_id: Uuid) -> Result<Vec<ImportRow>>;

    // Customer registry operations. `create_customer` enforces email
    // uniqueness and reports a conflict as `ImportError::UniqueViolation`.
    async fn create_customer(&self, customer: &mut Customer) -> Result<()>;
    async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>>;
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
    async fn get_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>>;
    async fn list_customers(&self) -> Result<Vec<Customer>>;
    async fn update_customer(&self, customer: &Customer) -> Result<()>;

    // Duplicate candidate operations
    async fn create_candidate(&self, candidate: &mut DuplicateCandidate) -> Result<()>;
    async fn get_candidate(&self, candidate_id: Uuid) -> Result<Option<DuplicateCandidate>>;
    async fn get_candidates_by_import(&self, import_id: Uuid) -> Result<Vec<DuplicateCandidate>>;
    async fn update_candidate(&self, candidate: &DuplicateCandidate) -> Result<()>;
}
