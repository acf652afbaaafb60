use super::traits::Storage;
use crate::common::error::{ImportError, Result};
use crate::domain::{Customer, DuplicateCandidate, Import, ImportRow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// In-memory storage implementation for the CLI and tests. Imports,
/// customers and candidates live in Vecs so listings preserve insertion
/// order.
pub struct InMemoryStorage {
    imports: Arc<Mutex<Vec<Import>>>,
    rows: Arc<Mutex<HashMap<Uuid, ImportRow>>>,
    customers: Arc<Mutex<Vec<Customer>>>,
    candidates: Arc<Mutex<Vec<DuplicateCandidate>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            imports: Arc::new(Mutex::new(Vec::new())),
            rows: Arc::new(Mutex::new(HashMap::new())),
            customers: Arc::new(Mutex::new(Vec::new())),
            candidates: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_import(&self, import: &mut Import) -> Result<()> {
        let id = Uuid::new_v4();
        import.id = Some(id);

        let mut imports = self.imports.lock().unwrap();
        imports.push(import.clone());

        debug!("Created import: {} with id {}", import.filename, id);
        Ok(())
    }

    async fn get_import(&self, import_id: Uuid) -> Result<Option<Import>> {
        let imports = self.imports.lock().unwrap();
        Ok(imports.iter().find(|i| i.id == Some(import_id)).cloned())
    }

    async fn list_imports(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Import>> {
        let imports = self.imports.lock().unwrap();
        Ok(imports
            .iter()
            .rev()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn update_import(&self, import: &Import) -> Result<()> {
        let id = import.id.ok_or(ImportError::MissingId)?;
        let mut imports = self.imports.lock().unwrap();
        let slot = imports
            .iter_mut()
            .find(|i| i.id == Some(id))
            .ok_or(ImportError::NotFound {
                entity: "import",
                id,
            })?;
        *slot = import.clone();
        Ok(())
    }

    async fn create_import_row(&self, row: &mut ImportRow) -> Result<()> {
        let id = Uuid::new_v4();
        row.id = Some(id);

        let mut rows = self.rows.lock().unwrap();
        rows.insert(id, row.clone());

        debug!(
            "Created import row {} for import {} with id {}",
            row.row_index, row.import_id, id
        );
        Ok(())
    }

    async fn get_import_row(&self, row_id: Uuid) -> Result<Option<ImportRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&row_id).cloned())
    }

    async fn get_rows_by_import(&self, import_id: Uuid) -> Result<Vec<ImportRow>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<ImportRow> = rows
            .values()
            .filter(|r| r.import_id == import_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.row_index);
        Ok(found)
    }

    async fn create_customer(&self, customer: &mut Customer) -> Result<()> {
        let mut customers = self.customers.lock().unwrap();

        if let Some(email) = customer.email.as_deref() {
            if customers.iter().any(|c| c.email.as_deref() == Some(email)) {
                return Err(ImportError::UniqueViolation {
                    field: "email",
                    value: email.to_string(),
                });
            }
        }

        let id = Uuid::new_v4();
        customer.id = Some(id);
        customers.push(customer.clone());

        debug!("Created customer with id {}", id);
        Ok(())
    }

    async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>> {
        let customers = self.customers.lock().unwrap();
        Ok(customers.iter().find(|c| c.id == Some(customer_id)).cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let customers = self.customers.lock().unwrap();
        Ok(customers
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn get_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
        let customers = self.customers.lock().unwrap();
        Ok(customers
            .iter()
            .find(|c| c.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let customers = self.customers.lock().unwrap();
        Ok(customers.clone())
    }

    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        let id = customer.id.ok_or(ImportError::MissingId)?;
        let mut customers = self.customers.lock().unwrap();
        let slot = customers
            .iter_mut()
            .find(|c| c.id == Some(id))
            .ok_or(ImportError::NotFound {
                entity: "customer",
                id,
            })?;
        *slot = customer.clone();
        Ok(())
    }

    async fn create_candidate(&self, candidate: &mut DuplicateCandidate) -> Result<()> {
        let id = Uuid::new_v4();
        candidate.id = Some(id);

        let mut candidates = self.candidates.lock().unwrap();
        candidates.push(candidate.clone());

        debug!(
            "Created duplicate candidate {} for row {}",
            id, candidate.import_row_id
        );
        Ok(())
    }

    async fn get_candidate(&self, candidate_id: Uuid) -> Result<Option<DuplicateCandidate>> {
        let candidates = self.candidates.lock().unwrap();
        Ok(candidates.iter().find(|c| c.id == Some(candidate_id)).cloned())
    }

    async fn get_candidates_by_import(&self, import_id: Uuid) -> Result<Vec<DuplicateCandidate>> {
        let row_ids: Vec<Uuid> = {
            let rows = self.rows.lock().unwrap();
            rows.values()
                .filter(|r| r.import_id == import_id)
                .filter_map(|r| r.id)
                .collect()
        };
        let candidates = self.candidates.lock().unwrap();
        Ok(candidates
            .iter()
            .filter(|c| row_ids.contains(&c.import_row_id))
            .cloned()
            .collect())
    }

    async fn update_candidate(&self, candidate: &DuplicateCandidate) -> Result<()> {
        let id = candidate.id.ok_or(ImportError::MissingId)?;
        let mut candidates = self.candidates.lock().unwrap();
        let slot = candidates
            .iter_mut()
            .find(|c| c.id == Some(id))
            .ok_or(ImportError::NotFound {
                entity: "duplicate candidate",
                id,
            })?;
        *slot = candidate.clone();
        Ok(())
    }
}
