//! Outstanding-dues export for due management.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::db::Database;
use crate::ledger::{compute_due_totals, DueTotals, LedgerResult};
use crate::models::{Invoice, InvoiceStatus};

/// Every invoice with money still owed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueReport {
    /// Export timestamp
    pub generated_at: String,
    pub lines: Vec<DueLine>,
    pub totals: DueTotals,
}

/// One unpaid or partially paid invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueLine {
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub patient_id: String,
    /// Empty when the patient row is gone
    pub patient_name: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub status: InvoiceStatus,
}

impl DueReport {
    /// Build a report from invoices and a patient-name lookup. Fully paid
    /// invoices are skipped.
    pub fn from_invoices(
        invoices: &[Invoice],
        patient_names: &HashMap<String, String>,
        reference_date: NaiveDate,
    ) -> Self {
        let owing: Vec<Invoice> = invoices
            .iter()
            .filter(|i| i.due_amount > Decimal::ZERO)
            .cloned()
            .collect();

        let lines = owing
            .iter()
            .map(|invoice| DueLine {
                invoice_number: invoice.invoice_number.clone(),
                invoice_date: invoice.invoice_date,
                patient_id: invoice.patient_id.clone(),
                patient_name: patient_names
                    .get(&invoice.patient_id)
                    .cloned()
                    .unwrap_or_default(),
                total_amount: invoice.total_amount,
                paid_amount: invoice.paid_amount,
                due_amount: invoice.due_amount,
                status: invoice.status,
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            lines,
            totals: compute_due_totals(&owing, reference_date),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format, one row per invoice.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(
            "invoice_number,invoice_date,patient_id,patient_name,total_amount,paid_amount,due_amount,status\n",
        );

        for line in &self.lines {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                escape_csv(&line.invoice_number),
                line.invoice_date,
                escape_csv(&line.patient_id),
                escape_csv(&line.patient_name),
                line.total_amount,
                line.paid_amount,
                line.due_amount,
                line.status.as_str(),
            ));
        }

        csv
    }
}

/// Builds [`DueReport`]s from the database.
pub struct DueReportExporter<'a> {
    db: &'a Database,
}

impl<'a> DueReportExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Report over all invoices with something due. `reference_date` picks
    /// which invoices count toward the same-day subtotal.
    pub fn export(&self, reference_date: NaiveDate) -> LedgerResult<DueReport> {
        let invoices = self.db.list_invoices_with_dues()?;
        let patient_names: HashMap<String, String> = self
            .db
            .list_patients(false)?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let report = DueReport::from_invoices(&invoices, &patient_names, reference_date);
        tracing::debug!(lines = report.lines.len(), total_due = %report.totals.total_due, "built due report");
        Ok(report)
    }
}
