//! Therapy catalog models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog status. Only active types can be newly sold or scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TherapyStatus {
    Active,
    Inactive,
}

/// A therapy type in the clinic's catalog (e.g. "Backpain", "TENS").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapyType {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Price per session-day
    pub price: Decimal,
    /// Active / inactive
    pub status: TherapyStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl TherapyType {
    /// Create a new active therapy type.
    pub fn new(name: String, price: Decimal) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: None,
            price: crate::money::round2(price),
            status: TherapyStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TherapyStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_therapy_type_is_active() {
        let therapy = TherapyType::new("Backpain".into(), Decimal::from(500));
        assert!(therapy.is_active());
        assert_eq!(therapy.price.to_string(), "500.00");
    }
}
