//! Per-patient account statement.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::db::Database;
use crate::ledger::{Ledger, LedgerError, LedgerResult, TherapyBalance};
use crate::models::{BusinessSettings, Invoice, Patient};
use crate::money::round2;

/// Invoices, payments and therapy balances for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientStatement {
    pub generated_at: String,
    pub as_of: NaiveDate,
    /// Clinic header
    pub clinic: BusinessSettings,
    pub patient: Patient,
    pub invoices: Vec<Invoice>,
    pub balances: Vec<StatementBalance>,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub total_due: Decimal,
}

/// A therapy balance with the therapy's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementBalance {
    pub therapy_type_id: String,
    /// Empty if the therapy type was deleted
    pub therapy_name: String,
    pub total_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

impl PatientStatement {
    pub fn new(
        clinic: BusinessSettings,
        patient: Patient,
        invoices: Vec<Invoice>,
        balances: &[TherapyBalance],
        therapy_names: &HashMap<String, String>,
        as_of: NaiveDate,
    ) -> Self {
        let mut total_billed = round2(Decimal::ZERO);
        let mut total_paid = round2(Decimal::ZERO);
        let mut total_due = round2(Decimal::ZERO);
        for invoice in &invoices {
            total_billed = round2(total_billed.saturating_add(invoice.total_amount));
            total_paid = round2(total_paid.saturating_add(invoice.paid_amount));
            total_due = round2(total_due.saturating_add(invoice.due_amount));
        }

        let balances = balances
            .iter()
            .map(|b| StatementBalance {
                therapy_type_id: b.therapy_type_id.clone(),
                therapy_name: therapy_names
                    .get(&b.therapy_type_id)
                    .cloned()
                    .unwrap_or_default(),
                total_days: b.total_days,
                used_days: b.used_days,
                remaining_days: b.remaining_days,
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            as_of,
            clinic,
            patient,
            invoices,
            balances,
            total_billed,
            total_paid,
            total_due,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV: an invoice section, a blank line, then a balance section.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("invoice_number,invoice_date,total_amount,paid_amount,due_amount,status\n");
        for invoice in &self.invoices {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                escape_csv(&invoice.invoice_number),
                invoice.invoice_date,
                invoice.total_amount,
                invoice.paid_amount,
                invoice.due_amount,
                invoice.status.as_str(),
            ));
        }
        csv.push_str(&format!(
            "TOTAL,,{},{},{},\n",
            self.total_billed, self.total_paid, self.total_due
        ));

        csv.push('\n');
        csv.push_str("therapy,total_days,used_days,remaining_days\n");
        for balance in &self.balances {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                escape_csv(&balance.therapy_name),
                balance.total_days,
                balance.used_days,
                balance.remaining_days,
            ));
        }

        csv
    }
}

/// Builds [`PatientStatement`]s from the database.
pub struct StatementExporter<'a> {
    db: &'a Database,
    ledger: Ledger<'a>,
}

impl<'a> StatementExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            ledger: Ledger::new(db),
        }
    }

    /// Statement for one patient with balances as of `as_of`.
    pub fn export(&self, patient_id: &str, as_of: NaiveDate) -> LedgerResult<PatientStatement> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Patient {}", patient_id)))?;
        let invoices = self.db.list_invoices_for_patient(patient_id)?;
        let balances = self.ledger.therapy_balances(patient_id, as_of)?;
        let therapy_names: HashMap<String, String> = self
            .db
            .list_therapy_types(false)?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        Ok(PatientStatement::new(
            self.db.get_settings()?,
            patient,
            invoices,
            &balances,
            &therapy_names,
            as_of,
        ))
    }
}
