//! Patient models.

use serde::{Deserialize, Serialize};

/// Whether a patient is still under care. Patients are never deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Inactive,
}

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID
    pub id: String,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: Option<u32>,
    /// Gender as entered at intake
    pub gender: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Presenting complaint / clinical notes
    pub medical_notes: Option<String>,
    /// Primary doctor (weak reference)
    pub doctor_id: Option<String>,
    /// Who authorised the patient's discount (weak reference)
    pub discount_giver_id: Option<String>,
    /// Who referred the patient (weak reference)
    pub referrer_id: Option<String>,
    /// Active / inactive
    pub status: PatientStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new active patient with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            age: None,
            gender: None,
            phone: None,
            address: None,
            medical_notes: None,
            doctor_id: None,
            discount_giver_id: None,
            referrer_id: None,
            status: PatientStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PatientStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Asha Rao".into());
        assert_eq!(patient.name, "Asha Rao");
        assert!(patient.is_active());
        assert_eq!(patient.id.len(), 36); // UUID format
    }
}
