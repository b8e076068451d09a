//! Physio-Ledger Core Library
//!
//! Therapy package balance engine for a physiotherapy clinic: invoices buy
//! session-days of a therapy, sessions consume them, and dues are whatever
//! is left unpaid.
//!
//! # Architecture
//!
//! ```text
//!   Invoice (paid / partially_paid)          Session records
//!          │  line items                      (date <= as_of)
//!          │  quantity × days                        │
//!          └──────────────────┬──────────────────────┘
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │  Entitlement Resolver │  total − used = remaining
//!                 └───────────┬───────────┘
//!                             │
//!             ┌───────────────┴───────────────┐
//!             ▼                               ▼
//!     Available therapies              Session Recorder
//!     (remaining > 0, active)          (check + insert, one txn)
//!
//!   Invoice Aggregator ──► paid / due / status ──► Due Roll-up ──► Exports
//! ```
//!
//! # Core Principle
//!
//! **Balances are derived, never stored.** Remaining days and dues are
//! recomputed from invoices and session rows on every call.
//!
//! # Modules
//!
//! - [`config`]: runtime settings from file and environment
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, TherapyType, Invoice, etc.)
//! - [`ledger`]: invoice totals, entitlement, dues and scheduling
//! - [`export`]: due report and patient statement export
//! - [`money`]: decimal rounding

pub mod config;
pub mod db;
pub mod export;
pub mod ledger;
pub mod models;
pub mod money;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use db::Database;
pub use ledger::{
    AvailableTherapy, DueTotals, Ledger, LedgerError, PatientDue, TherapyBalance,
};
pub use models::{
    BusinessSettings, Invoice, InvoiceLineItem, InvoiceStatus, NewInvoice, NewLineItem, Patient,
    PatientStatus, ReferenceEntry, ReferenceKind, TherapySessionRecord, TherapyStatus,
    TherapyType,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PhysioLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("No remaining entitlement: {0}")]
    NoEntitlement(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for PhysioLedgerError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(message) => PhysioLedgerError::NotFound(message),
            db::DbError::Conflict(message) => PhysioLedgerError::ConcurrentModification(message),
            other => PhysioLedgerError::DatabaseError(other.to_string()),
        }
    }
}

impl From<LedgerError> for PhysioLedgerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(message) => PhysioLedgerError::InvalidInput(message),
            LedgerError::InvalidPayment(message) => PhysioLedgerError::InvalidPayment(message),
            LedgerError::NoEntitlement(message) => PhysioLedgerError::NoEntitlement(message),
            LedgerError::NotFound(message) => PhysioLedgerError::NotFound(message),
            LedgerError::ConcurrentModification(message) => {
                PhysioLedgerError::ConcurrentModification(message)
            }
            LedgerError::DataAccess(inner) => inner.into(),
        }
    }
}

impl From<serde_json::Error> for PhysioLedgerError {
    fn from(e: serde_json::Error) -> Self {
        PhysioLedgerError::SerializationError(e.to_string())
    }
}

impl From<::config::ConfigError> for PhysioLedgerError {
    fn from(e: ::config::ConfigError) -> Self {
        PhysioLedgerError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PhysioLedgerError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PhysioLedgerError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, PhysioLedgerError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| PhysioLedgerError::InvalidInput(format!("Bad date '{}': {}", text, e)))
}

fn parse_time(text: &str) -> Result<NaiveTime, PhysioLedgerError> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|e| PhysioLedgerError::InvalidInput(format!("Bad time '{}': {}", text, e)))
}

fn parse_money(text: &str) -> Result<Decimal, PhysioLedgerError> {
    money::parse_amount(text)
        .map_err(|e| PhysioLedgerError::InvalidInput(format!("Bad amount '{}': {}", text, e)))
}

fn parse_optional_money(text: Option<&str>) -> Result<Decimal, PhysioLedgerError> {
    match text {
        Some(t) if !t.trim().is_empty() => parse_money(t),
        _ => Ok(Decimal::ZERO),
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PhysioLedgerCore>, PhysioLedgerError> {
    let config = LedgerConfig {
        database_path: path,
        ..LedgerConfig::default()
    };
    PhysioLedgerCore::from_config(config)
}

/// Open the database named by a config file and `PHYSIO_LEDGER__*`
/// environment variables.
#[uniffi::export]
pub fn open_database_with_config(
    config_path: Option<String>,
) -> Result<Arc<PhysioLedgerCore>, PhysioLedgerError> {
    let config = LedgerConfig::load(config_path.as_deref().map(std::path::Path::new))?;
    PhysioLedgerCore::from_config(config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PhysioLedgerCore>, PhysioLedgerError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PhysioLedgerCore {
        db: Arc::new(Mutex::new(db)),
        config: LedgerConfig::default(),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PhysioLedgerCore {
    db: Arc<Mutex<Database>>,
    config: LedgerConfig,
}

impl PhysioLedgerCore {
    fn from_config(config: LedgerConfig) -> Result<Arc<Self>, PhysioLedgerError> {
        let db = Database::open_with_config(&config)?;
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }
}

#[uniffi::export]
impl PhysioLedgerCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, PhysioLedgerError> {
        let db = self.db.lock()?;
        let mut record = Patient::new(patient.name);
        record.age = patient.age;
        record.gender = patient.gender;
        record.phone = patient.phone;
        record.address = patient.address;
        record.medical_notes = patient.medical_notes;
        record.doctor_id = patient.doctor_id;
        record.discount_giver_id = patient.discount_giver_id;
        record.referrer_id = patient.referrer_id;
        db.insert_patient(&record)?;
        Ok(record.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name or phone.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Activate or deactivate a patient. History is kept either way.
    pub fn set_patient_active(&self, id: String, active: bool) -> Result<(), PhysioLedgerError> {
        let db = self.db.lock()?;
        let status = if active {
            PatientStatus::Active
        } else {
            PatientStatus::Inactive
        };
        if !db.set_patient_status(&id, status)? {
            return Err(PhysioLedgerError::NotFound(format!("Patient {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    // Reference Lists
    // =========================================================================

    /// Add a doctor, discount giver or referrer.
    pub fn add_reference(
        &self,
        kind: FfiReferenceKind,
        name: String,
        phone: Option<String>,
    ) -> Result<FfiReference, PhysioLedgerError> {
        let db = self.db.lock()?;
        let mut entry = ReferenceEntry::new(kind.into(), name);
        entry.phone = phone;
        db.insert_reference(&entry)?;
        Ok(entry.into())
    }

    /// List one reference list, by name.
    pub fn list_references(
        &self,
        kind: FfiReferenceKind,
    ) -> Result<Vec<FfiReference>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let entries = db.list_references(kind.into())?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Therapy Catalog
    // =========================================================================

    /// Add a therapy type to the catalog.
    pub fn create_therapy_type(
        &self,
        name: String,
        price: String,
        description: Option<String>,
    ) -> Result<FfiTherapyType, PhysioLedgerError> {
        let price = parse_money(&price)?;
        if price < Decimal::ZERO {
            return Err(PhysioLedgerError::InvalidInput(
                "Therapy price cannot be negative".into(),
            ));
        }
        let db = self.db.lock()?;
        let mut therapy = TherapyType::new(name, price);
        therapy.description = description;
        db.insert_therapy_type(&therapy)?;
        Ok(therapy.into())
    }

    /// List therapy types, optionally only active ones.
    pub fn list_therapy_types(
        &self,
        active_only: bool,
    ) -> Result<Vec<FfiTherapyType>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let therapies = db.list_therapy_types(active_only)?;
        Ok(therapies.into_iter().map(|t| t.into()).collect())
    }

    /// Activate or deactivate a therapy type.
    pub fn set_therapy_type_active(&self, id: String, active: bool) -> Result<(), PhysioLedgerError> {
        let db = self.db.lock()?;
        let status = if active {
            TherapyStatus::Active
        } else {
            TherapyStatus::Inactive
        };
        if !db.set_therapy_status(&id, status)? {
            return Err(PhysioLedgerError::NotFound(format!("Therapy type {}", id)));
        }
        Ok(())
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    /// Generate an invoice, optionally taking a first payment.
    pub fn generate_invoice(&self, request: FfiNewInvoice) -> Result<FfiInvoice, PhysioLedgerError> {
        let request = request.into_request()?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let generated = ledger.generate_invoice(&request)?;
        Ok(FfiInvoice::from_parts(generated.invoice, generated.items))
    }

    /// Get an invoice with its line items.
    pub fn get_invoice(&self, invoice_id: String) -> Result<FfiInvoice, PhysioLedgerError> {
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let found = ledger.invoice_with_items(&invoice_id)?;
        Ok(FfiInvoice::from_parts(found.invoice, found.items))
    }

    /// Invoices of one patient, newest first, without line items.
    pub fn list_invoices_for_patient(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiInvoice>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let invoices = db.list_invoices_for_patient(&patient_id)?;
        Ok(invoices
            .into_iter()
            .map(|i| FfiInvoice::from_parts(i, Vec::new()))
            .collect())
    }

    /// Record a payment. With `expected_version`, the payment is refused if
    /// the invoice changed since the caller read it.
    pub fn record_payment(
        &self,
        invoice_id: String,
        amount: String,
        expected_version: Option<i64>,
    ) -> Result<FfiInvoice, PhysioLedgerError> {
        let amount = parse_money(&amount)?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let invoice = match expected_version {
            Some(version) => ledger.record_payment_at_version(&invoice_id, version, amount)?,
            None => ledger.record_payment(&invoice_id, amount)?,
        };
        Ok(FfiInvoice::from_parts(invoice, Vec::new()))
    }

    /// Delete an invoice with its items and payments.
    pub fn delete_invoice(&self, invoice_id: String) -> Result<(), PhysioLedgerError> {
        let db = self.db.lock()?;
        Ledger::with_config(&db, &self.config).delete_invoice(&invoice_id)?;
        Ok(())
    }

    // =========================================================================
    // Entitlement and Sessions
    // =========================================================================

    /// Therapies the patient can still be scheduled for as of a date.
    pub fn available_therapies(
        &self,
        patient_id: String,
        as_of: String,
    ) -> Result<Vec<FfiAvailableTherapy>, PhysioLedgerError> {
        let as_of = parse_date(&as_of)?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let available = ledger.available_therapies(&patient_id, as_of)?;
        Ok(available.into_iter().map(|a| a.into()).collect())
    }

    /// Book a session. Fails with `NoEntitlement` when no days are left.
    pub fn schedule_session(
        &self,
        patient_id: String,
        therapy_type_id: String,
        date: String,
        time: String,
    ) -> Result<FfiSession, PhysioLedgerError> {
        let date = parse_date(&date)?;
        let time = parse_time(&time)?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let record = ledger.schedule_session(&patient_id, &therapy_type_id, date, time)?;
        Ok(record.into())
    }

    /// Change the time of a session.
    pub fn update_session_time(
        &self,
        record_id: String,
        time: String,
    ) -> Result<FfiSession, PhysioLedgerError> {
        let time = parse_time(&time)?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        Ok(ledger.update_session_time(&record_id, time)?.into())
    }

    /// Delete a session, giving the day back.
    pub fn delete_session(&self, record_id: String) -> Result<(), PhysioLedgerError> {
        let db = self.db.lock()?;
        Ledger::with_config(&db, &self.config).delete_session(&record_id)?;
        Ok(())
    }

    /// Session history for a patient, newest first.
    pub fn list_sessions_for_patient(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiSession>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let sessions = ledger.sessions_for_patient(&patient_id)?;
        Ok(sessions.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Dues
    // =========================================================================

    /// Total due overall and for invoices dated `reference_date`.
    pub fn dashboard_dues(&self, reference_date: String) -> Result<FfiDueTotals, PhysioLedgerError> {
        let reference_date = parse_date(&reference_date)?;
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        Ok(ledger.dashboard_dues(reference_date)?.into())
    }

    /// Patients owing the most. `limit` defaults to the configured value.
    pub fn top_due_patients(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<FfiPatientDue>, PhysioLedgerError> {
        let db = self.db.lock()?;
        let ledger = Ledger::with_config(&db, &self.config);
        let top = ledger.top_due_patients(limit.map(|n| n as usize))?;
        Ok(top.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn get_settings(&self) -> Result<FfiBusinessSettings, PhysioLedgerError> {
        let db = self.db.lock()?;
        Ok(db.get_settings()?.into())
    }

    pub fn update_settings(&self, settings: FfiBusinessSettings) -> Result<(), PhysioLedgerError> {
        let db = self.db.lock()?;
        db.update_settings(&settings.into())?;
        Ok(())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export outstanding dues as JSON.
    pub fn export_due_report_json(&self, reference_date: String) -> Result<String, PhysioLedgerError> {
        let reference_date = parse_date(&reference_date)?;
        let db = self.db.lock()?;
        let report = export::DueReportExporter::new(&db).export(reference_date)?;
        Ok(report.to_json()?)
    }

    /// Export outstanding dues as CSV.
    pub fn export_due_report_csv(&self, reference_date: String) -> Result<String, PhysioLedgerError> {
        let reference_date = parse_date(&reference_date)?;
        let db = self.db.lock()?;
        let report = export::DueReportExporter::new(&db).export(reference_date)?;
        Ok(report.to_csv())
    }

    /// Export a patient statement as JSON.
    pub fn export_patient_statement_json(
        &self,
        patient_id: String,
        as_of: String,
    ) -> Result<String, PhysioLedgerError> {
        let as_of = parse_date(&as_of)?;
        let db = self.db.lock()?;
        let statement = export::StatementExporter::new(&db).export(&patient_id, as_of)?;
        Ok(statement.to_json()?)
    }

    /// Export a patient statement as CSV.
    pub fn export_patient_statement_csv(
        &self,
        patient_id: String,
        as_of: String,
    ) -> Result<String, PhysioLedgerError> {
        let as_of = parse_date(&as_of)?;
        let db = self.db.lock()?;
        let statement = export::StatementExporter::new(&db).export(&patient_id, as_of)?;
        Ok(statement.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================
//
// Money crosses the boundary as decimal strings ("1250.50") and dates and
// times as ISO text ("2024-01-15", "09:30").

/// FFI-safe patient input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub doctor_id: Option<String>,
    pub discount_giver_id: Option<String>,
    pub referrer_id: Option<String>,
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_notes: Option<String>,
    pub doctor_id: Option<String>,
    pub discount_giver_id: Option<String>,
    pub referrer_id: Option<String>,
    pub active: bool,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        let active = patient.is_active();
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            phone: patient.phone,
            address: patient.address,
            medical_notes: patient.medical_notes,
            doctor_id: patient.doctor_id,
            discount_giver_id: patient.discount_giver_id,
            referrer_id: patient.referrer_id,
            active,
        }
    }
}

#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiReferenceKind {
    Doctor,
    DiscountGiver,
    Referrer,
}

impl From<FfiReferenceKind> for ReferenceKind {
    fn from(kind: FfiReferenceKind) -> Self {
        match kind {
            FfiReferenceKind::Doctor => ReferenceKind::Doctor,
            FfiReferenceKind::DiscountGiver => ReferenceKind::DiscountGiver,
            FfiReferenceKind::Referrer => ReferenceKind::Referrer,
        }
    }
}

/// FFI-safe reference list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReference {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

impl From<ReferenceEntry> for FfiReference {
    fn from(entry: ReferenceEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            phone: entry.phone,
        }
    }
}

/// FFI-safe therapy type.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTherapyType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub active: bool,
}

impl From<TherapyType> for FfiTherapyType {
    fn from(therapy: TherapyType) -> Self {
        let active = therapy.is_active();
        Self {
            id: therapy.id,
            name: therapy.name,
            description: therapy.description,
            price: therapy.price.to_string(),
            active,
        }
    }
}

/// FFI-safe invoice line input. Empty `unit_price` means catalog price.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewLineItem {
    pub therapy_type_id: String,
    pub quantity: i64,
    pub days: i64,
    pub unit_price: Option<String>,
    pub discount_amount: Option<String>,
}

/// FFI-safe invoice input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewInvoice {
    pub patient_id: String,
    pub invoice_date: String,
    pub items: Vec<FfiNewLineItem>,
    pub invoice_discount: Option<String>,
    pub initial_payment: Option<String>,
    pub notes: Option<String>,
}

impl FfiNewInvoice {
    fn into_request(self) -> Result<NewInvoice, PhysioLedgerError> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in self.items {
            let unit_price = match item.unit_price.as_deref() {
                Some(p) if !p.trim().is_empty() => Some(parse_money(p)?),
                _ => None,
            };
            items.push(NewLineItem {
                therapy_type_id: item.therapy_type_id,
                quantity: item.quantity,
                days: item.days,
                unit_price,
                discount_amount: parse_optional_money(item.discount_amount.as_deref())?,
            });
        }

        Ok(NewInvoice {
            patient_id: self.patient_id,
            invoice_date: parse_date(&self.invoice_date)?,
            items,
            invoice_discount: parse_optional_money(self.invoice_discount.as_deref())?,
            initial_payment: parse_optional_money(self.initial_payment.as_deref())?,
            notes: self.notes,
        })
    }
}

/// FFI-safe invoice line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineItem {
    pub id: String,
    pub therapy_type_id: String,
    pub quantity: i64,
    pub days: i64,
    pub unit_price: String,
    pub discount_amount: String,
    pub total_amount: String,
}

impl From<InvoiceLineItem> for FfiLineItem {
    fn from(item: InvoiceLineItem) -> Self {
        Self {
            id: item.id,
            therapy_type_id: item.therapy_type_id,
            quantity: item.quantity,
            days: item.days,
            unit_price: item.unit_price.to_string(),
            discount_amount: item.discount_amount.to_string(),
            total_amount: item.total_amount.to_string(),
        }
    }
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub invoice_number: String,
    pub patient_id: String,
    pub invoice_date: String,
    pub subtotal: String,
    pub discount_amount: String,
    pub total_amount: String,
    pub paid_amount: String,
    pub due_amount: String,
    pub status: String,
    pub notes: Option<String>,
    /// Pass back to `record_payment` to guard against concurrent edits
    pub version: i64,
    pub items: Vec<FfiLineItem>,
}

impl FfiInvoice {
    fn from_parts(invoice: Invoice, items: Vec<InvoiceLineItem>) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            patient_id: invoice.patient_id,
            invoice_date: invoice.invoice_date.to_string(),
            subtotal: invoice.subtotal.to_string(),
            discount_amount: invoice.discount_amount.to_string(),
            total_amount: invoice.total_amount.to_string(),
            paid_amount: invoice.paid_amount.to_string(),
            due_amount: invoice.due_amount.to_string(),
            status: invoice.status.as_str().to_string(),
            notes: invoice.notes,
            version: invoice.version,
            items: items.into_iter().map(|i| i.into()).collect(),
        }
    }
}

/// FFI-safe available therapy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAvailableTherapy {
    pub therapy_type_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub total_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

impl From<AvailableTherapy> for FfiAvailableTherapy {
    fn from(available: AvailableTherapy) -> Self {
        Self {
            therapy_type_id: available.therapy_type_id,
            name: available.name,
            description: available.description,
            price: available.price.to_string(),
            total_days: available.total_days,
            used_days: available.used_days,
            remaining_days: available.remaining_days,
        }
    }
}

/// FFI-safe session record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub id: String,
    pub patient_id: String,
    pub therapy_type_id: String,
    pub therapy_date: String,
    pub therapy_time: String,
}

impl From<TherapySessionRecord> for FfiSession {
    fn from(record: TherapySessionRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id,
            therapy_type_id: record.therapy_type_id,
            therapy_date: record.therapy_date.to_string(),
            therapy_time: record.therapy_time.format("%H:%M").to_string(),
        }
    }
}

/// FFI-safe dashboard totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDueTotals {
    pub reference_date: String,
    pub total_due: String,
    pub invoice_count: u32,
    pub reference_date_due: String,
    pub reference_date_count: u32,
}

impl From<DueTotals> for FfiDueTotals {
    fn from(totals: DueTotals) -> Self {
        Self {
            reference_date: totals.reference_date.to_string(),
            total_due: totals.total_due.to_string(),
            invoice_count: totals.invoice_count as u32,
            reference_date_due: totals.reference_date_due.to_string(),
            reference_date_count: totals.reference_date_count as u32,
        }
    }
}

/// FFI-safe per-patient due.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDue {
    pub patient_id: String,
    pub patient_name: String,
    pub total_due: String,
    pub invoice_count: u32,
}

impl From<PatientDue> for FfiPatientDue {
    fn from(due: PatientDue) -> Self {
        Self {
            patient_id: due.patient_id,
            patient_name: due.patient_name,
            total_due: due.total_due.to_string(),
            invoice_count: due.invoice_count as u32,
        }
    }
}

/// FFI-safe business settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBusinessSettings {
    pub clinic_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency_symbol: String,
    pub invoice_footer: Option<String>,
}

impl From<BusinessSettings> for FfiBusinessSettings {
    fn from(settings: BusinessSettings) -> Self {
        Self {
            clinic_name: settings.clinic_name,
            address: settings.address,
            phone: settings.phone,
            email: settings.email,
            currency_symbol: settings.currency_symbol,
            invoice_footer: settings.invoice_footer,
        }
    }
}

impl From<FfiBusinessSettings> for BusinessSettings {
    fn from(settings: FfiBusinessSettings) -> Self {
        BusinessSettings {
            clinic_name: settings.clinic_name,
            address: settings.address,
            phone: settings.phone,
            email: settings.email,
            currency_symbol: settings.currency_symbol,
            invoice_footer: settings.invoice_footer,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
