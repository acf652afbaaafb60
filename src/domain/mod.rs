use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Field name -> normalized/mapped string value. Absent fields are omitted,
/// never stored as empty strings.
pub type FieldMap = BTreeMap<String, String>;

/// Source column name -> raw cell value (CSV/XLSX cells may be non-string).
pub type RawFieldMap = BTreeMap<String, serde_json::Value>;

/// Internal field name -> source column name.
pub type ColumnMapping = BTreeMap<String, String>;

/// Customer fields the pipeline knows how to map, in registry column order.
pub const CUSTOMER_FIELDS: [&str; 7] = [
    "full_name",
    "email",
    "phone",
    "address",
    "city",
    "state",
    "zip_code",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// In-flight only. The pipeline classifies each row before writing it,
    /// so persisted rows always carry one of the terminal states below;
    /// `pending` exists for external producers that stage rows ahead of
    /// classification.
    Pending,
    Inserted,
    Error,
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Pending,
    Merged,
    CreatedNew,
    Ignored,
}

impl Resolution {
    /// Terminal resolutions never transition again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Resolution::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Pending => "pending",
            Resolution::Merged => "merged",
            Resolution::CreatedNew => "created_new",
            Resolution::Ignored => "ignored",
        }
    }
}

/// One batch reconciliation job over a set of input rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub id: Option<Uuid>,
    pub filename: String,
    /// Opaque reference to the uploaded object (storage key, URL, ...).
    pub source_ref: Option<String>,
    pub status: ImportStatus,
    pub total_rows: u32,
    pub inserted_count: u32,
    pub error_count: u32,
    pub candidate_count: u32,
    /// Progress cursor: highest row_index whose effects have been committed.
    pub last_row_index: Option<u32>,
    pub error_message: Option<String>,
    pub created_by: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Import {
    pub fn new(
        filename: &str,
        source_ref: Option<String>,
        created_by: Option<String>,
        total_rows: u32,
    ) -> Self {
        Self {
            id: None,
            filename: filename.to_string(),
            source_ref,
            status: ImportStatus::Processing,
            total_rows,
            inserted_count: 0,
            error_count: 0,
            candidate_count: 0,
            last_row_index: None,
            error_message: None,
            created_by,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }
}

/// One input record's full lifecycle: raw, mapped and normalized data plus
/// its terminal classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRow {
    pub id: Option<Uuid>,
    pub import_id: Uuid,
    pub row_index: u32,
    pub raw_data: RawFieldMap,
    pub mapped_data: FieldMap,
    pub normalized_data: FieldMap,
    pub validation_errors: Vec<String>,
    pub status: RowStatus,
}

/// A registry record that incoming rows are deduplicated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<Uuid>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn empty_to_none(value: Option<&String>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => None,
    }
}

impl Customer {
    /// Builds a new customer from a row's normalized data. Empty strings are
    /// stored as absent so the email uniqueness constraint is never tripped
    /// by blanks.
    pub fn from_normalized(data: &FieldMap) -> Self {
        Self {
            id: None,
            full_name: empty_to_none(data.get("full_name")),
            email: empty_to_none(data.get("email")),
            phone: empty_to_none(data.get("phone")),
            address: empty_to_none(data.get("address")),
            city: empty_to_none(data.get("city")),
            state: empty_to_none(data.get("state")),
            zip_code: empty_to_none(data.get("zip_code")),
            created_at: Utc::now(),
        }
    }

    /// Overwrites only the fields present (non-empty) in the given data.
    pub fn apply_normalized(&mut self, data: &FieldMap) {
        for field in CUSTOMER_FIELDS {
            if let Some(value) = data.get(field) {
                if value.is_empty() {
                    continue;
                }
                let slot = match field {
                    "full_name" => &mut self.full_name,
                    "email" => &mut self.email,
                    "phone" => &mut self.phone,
                    "address" => &mut self.address,
                    "city" => &mut self.city,
                    "state" => &mut self.state,
                    "zip_code" => &mut self.zip_code,
                    _ => continue,
                };
                *slot = Some(value.clone());
            }
        }
    }
}

/// A flagged possible match between an import row and an existing customer,
/// awaiting human resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub id: Option<Uuid>,
    pub import_row_id: Uuid,
    pub existing_customer_id: Uuid,
    pub match_reason: String,
    /// Rounded to 2 decimals, in [0, 1].
    pub similarity_score: f64,
    pub resolution: Resolution,
    pub created_at: DateTime<Utc>,
}

/// Pure projection of an Import for status polling.
#[derive(Debug, Clone, Serialize)]
pub struct ImportStatusView {
    pub id: Uuid,
    pub filename: String,
    pub status: ImportStatus,
    pub total_rows: u32,
    pub inserted_count: u32,
    pub error_count: u32,
    pub candidate_count: u32,
    pub last_row_index: Option<u32>,
    pub error_message: Option<String>,
    pub created_by: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ImportStatusView {
    pub fn from_import(import: &Import) -> Option<Self> {
        Some(Self {
            id: import.id?,
            filename: import.filename.clone(),
            status: import.status,
            total_rows: import.total_rows,
            inserted_count: import.inserted_count,
            error_count: import.error_count,
            candidate_count: import.candidate_count,
            last_row_index: import.last_row_index,
            error_message: import.error_message.clone(),
            created_by: import.created_by.clone(),
            resolved_by: import.resolved_by.clone(),
            resolved_at: import.resolved_at,
            created_at: import.created_at,
        })
    }
}

/// Read model for a duplicate candidate: the flagged row's data next to the
/// existing customer it may match.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub id: Uuid,
    pub import_row_id: Uuid,
    pub existing_customer_id: Uuid,
    pub existing_customer: Customer,
    pub new_data: FieldMap,
    pub match_reason: String,
    pub similarity_score: f64,
    pub resolution: Resolution,
}
