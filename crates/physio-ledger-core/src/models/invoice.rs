//! Invoice models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status, always derived from paid vs total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [
        InvoiceStatus::Unpaid,
        InvoiceStatus::PartiallyPaid,
        InvoiceStatus::Paid,
    ];

    /// Stored and exported form.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Whether an invoice in this status grants therapy entitlement.
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid)
    }
}

/// An invoice header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// Unique identifier
    pub id: String,
    /// Human-facing number, `INV-YYYYMMDD-NNNN`
    pub invoice_number: String,
    /// Owning patient
    pub patient_id: String,
    /// Invoice date
    pub invoice_date: NaiveDate,
    /// Sum of gross line amounts
    pub subtotal: Decimal,
    /// Line discounts plus invoice-level discount
    pub discount_amount: Decimal,
    /// `subtotal - discount_amount`, floored at zero
    pub total_amount: Decimal,
    /// Amount received so far
    pub paid_amount: Decimal,
    /// `max(0, total_amount - paid_amount)`
    pub due_amount: Decimal,
    /// Derived payment status
    pub status: InvoiceStatus,
    /// Free-text notes
    pub notes: Option<String>,
    /// Optimistic concurrency counter, bumped on every payment
    pub version: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// A line item on an invoice. The unit of entitlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    pub therapy_type_id: String,
    /// Number of packages bought
    pub quantity: i64,
    /// Session-days per package
    pub days: i64,
    /// Price snapshot at invoice time
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    /// `unit_price * quantity * days - discount_amount`
    pub total_amount: Decimal,
}

impl InvoiceLineItem {
    /// Session-days this line grants once its invoice is (partially) paid.
    ///
    /// Saturates at `i64::MAX`; invoice generation rejects lines that would.
    pub fn entitled_days(&self) -> i64 {
        self.quantity.saturating_mul(self.days)
    }
}

/// One recorded payment against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub paid_at: String,
}

/// Invoice header together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceWithItems {
    pub invoice: Invoice,
    pub items: Vec<InvoiceLineItem>,
}

/// Caller input for one line of a new invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLineItem {
    pub therapy_type_id: String,
    pub quantity: i64,
    pub days: i64,
    /// Overrides the catalog price when set
    pub unit_price: Option<Decimal>,
    pub discount_amount: Decimal,
}

impl NewLineItem {
    /// Line at catalog price with no discount.
    pub fn new(therapy_type_id: impl Into<String>, quantity: i64, days: i64) -> Self {
        Self {
            therapy_type_id: therapy_type_id.into(),
            quantity,
            days,
            unit_price: None,
            discount_amount: Decimal::ZERO,
        }
    }
}

/// Caller input for invoice generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInvoice {
    pub patient_id: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<NewLineItem>,
    /// Discount applied on top of line discounts
    pub invoice_discount: Decimal,
    /// Payment taken at the counter when the invoice is raised
    pub initial_payment: Decimal,
    pub notes: Option<String>,
}

impl NewInvoice {
    pub fn new(patient_id: impl Into<String>, invoice_date: NaiveDate) -> Self {
        Self {
            patient_id: patient_id.into(),
            invoice_date,
            items: Vec::new(),
            invoice_discount: Decimal::ZERO,
            initial_payment: Decimal::ZERO,
            notes: None,
        }
    }

    pub fn with_item(mut self, item: NewLineItem) -> Self {
        self.items.push(item);
        self
    }
}
