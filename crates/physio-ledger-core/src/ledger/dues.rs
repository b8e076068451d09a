//! Due-amount roll-ups for dashboards and due management.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{Invoice, Patient};
use crate::money::round2;

/// Dues across a set of invoices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DueTotals {
    pub reference_date: NaiveDate,
    /// Sum of `due_amount` over every invoice
    pub total_due: Decimal,
    pub invoice_count: usize,
    /// Sum of `due_amount` over invoices dated `reference_date`
    pub reference_date_due: Decimal,
    pub reference_date_count: usize,
}

/// Total due for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDue {
    pub patient_id: String,
    pub patient_name: String,
    pub total_due: Decimal,
    pub invoice_count: usize,
}

/// Sum dues, and separately the dues of invoices dated `reference_date`.
pub fn compute_due_totals(invoices: &[Invoice], reference_date: NaiveDate) -> DueTotals {
    let mut totals = DueTotals {
        reference_date,
        total_due: round2(Decimal::ZERO),
        invoice_count: 0,
        reference_date_due: round2(Decimal::ZERO),
        reference_date_count: 0,
    };

    for invoice in invoices {
        totals.total_due = round2(totals.total_due.saturating_add(invoice.due_amount));
        totals.invoice_count += 1;
        if invoice.invoice_date == reference_date {
            totals.reference_date_due =
                round2(totals.reference_date_due.saturating_add(invoice.due_amount));
            totals.reference_date_count += 1;
        }
    }
    totals
}

/// Per-patient due totals, in the order patients were given. Invoices whose
/// patient is not in `patients` are ignored.
pub fn summarize_patient_dues(patients: &[Patient], invoices: &[Invoice]) -> Vec<PatientDue> {
    let mut by_patient: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for invoice in invoices {
        let entry = by_patient
            .entry(invoice.patient_id.as_str())
            .or_insert((Decimal::ZERO, 0));
        entry.0 = round2(entry.0.saturating_add(invoice.due_amount));
        entry.1 += 1;
    }

    patients
        .iter()
        .map(|patient| {
            let (total_due, invoice_count) = by_patient
                .get(patient.id.as_str())
                .copied()
                .unwrap_or((Decimal::ZERO, 0));
            PatientDue {
                patient_id: patient.id.clone(),
                patient_name: patient.name.clone(),
                total_due: round2(total_due),
                invoice_count,
            }
        })
        .collect()
}

/// The `n` patients owing the most. Ties keep their input order.
pub fn top_due_patients(mut summaries: Vec<PatientDue>, n: usize) -> Vec<PatientDue> {
    // sort_by is stable
    summaries.sort_by(|a, b| b.total_due.cmp(&a.total_due));
    summaries.truncate(n);
    summaries
}

impl<'a> Ledger<'a> {
    /// Dashboard roll-up over every invoice.
    pub fn dashboard_dues(&self, reference_date: NaiveDate) -> LedgerResult<DueTotals> {
        let invoices = self.db.list_invoices()?;
        Ok(compute_due_totals(&invoices, reference_date))
    }

    /// Everything a patient currently owes.
    pub fn patient_due_total(&self, patient_id: &str) -> LedgerResult<Decimal> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Patient {}", patient_id)))?;
        let invoices = self.db.list_invoices_for_patient(patient_id)?;
        let summary = summarize_patient_dues(std::slice::from_ref(&patient), &invoices);
        Ok(summary
            .first()
            .map(|s| s.total_due)
            .unwrap_or_else(|| round2(Decimal::ZERO)))
    }

    /// Patients owing the most; `n` defaults to the configured limit.
    pub fn top_due_patients(&self, n: Option<usize>) -> LedgerResult<Vec<PatientDue>> {
        let patients = self.db.list_patients(false)?;
        let invoices = self.db.list_invoices()?;
        let summaries = summarize_patient_dues(&patients, &invoices);
        Ok(top_due_patients(summaries, n.unwrap_or(self.top_due_limit)))
    }
}
