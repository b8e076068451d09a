//! Clinic-wide business settings.

use serde::{Deserialize, Serialize};

/// Singleton settings row printed on invoices and statements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessSettings {
    pub clinic_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Symbol shown in front of amounts (e.g. "₹", "$")
    pub currency_symbol: String,
    /// Footer line on invoices
    pub invoice_footer: Option<String>,
    pub updated_at: String,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            clinic_name: "Physiotherapy Clinic".into(),
            address: None,
            phone: None,
            email: None,
            currency_symbol: "₹".into(),
            invoice_footer: None,
            updated_at: String::new(),
        }
    }
}
