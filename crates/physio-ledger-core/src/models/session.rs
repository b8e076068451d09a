//! Daily therapy session records.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One scheduled/consumed session. The row's presence is its only state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapySessionRecord {
    pub id: String,
    pub patient_id: String,
    pub therapy_type_id: String,
    pub therapy_date: NaiveDate,
    pub therapy_time: NaiveTime,
    pub created_at: String,
    pub updated_at: String,
}

impl TherapySessionRecord {
    pub fn new(
        patient_id: String,
        therapy_type_id: String,
        therapy_date: NaiveDate,
        therapy_time: NaiveTime,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            therapy_type_id,
            therapy_date,
            therapy_time,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
