//! Reference lists a patient points at: doctors, discount givers, referrers.

use serde::{Deserialize, Serialize};

/// Which reference list an entry belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Doctor,
    DiscountGiver,
    Referrer,
}

impl ReferenceKind {
    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Doctor => "doctors",
            ReferenceKind::DiscountGiver => "discount_givers",
            ReferenceKind::Referrer => "referrers",
        }
    }

    /// Column on `patients` holding the weak reference.
    pub fn patient_column(&self) -> &'static str {
        match self {
            ReferenceKind::Doctor => "doctor_id",
            ReferenceKind::DiscountGiver => "discount_giver_id",
            ReferenceKind::Referrer => "referrer_id",
        }
    }
}

/// One entry in a reference list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEntry {
    pub id: String,
    pub kind: ReferenceKind,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: String,
}

impl ReferenceEntry {
    pub fn new(kind: ReferenceKind, name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name,
            phone: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
