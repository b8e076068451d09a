//! Invoice aggregation and payment recording.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{
    Invoice, InvoiceLineItem, InvoicePayment, InvoiceStatus, InvoiceWithItems, NewInvoice,
    TherapyType,
};
use crate::money::{non_negative, round2};

/// One priced line fed into [`compute_invoice_totals`].
#[derive(Debug, Clone)]
pub struct LineInput<'a> {
    pub therapy: &'a TherapyType,
    pub quantity: i64,
    pub days: i64,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
}

/// Computed amounts for one line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineTotals {
    /// `unit_price * quantity * days`
    pub gross_amount: Decimal,
    pub discount_amount: Decimal,
    /// `gross_amount - discount_amount`
    pub total_amount: Decimal,
}

/// Computed amounts for a whole invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceTotals {
    pub lines: Vec<LineTotals>,
    pub subtotal: Decimal,
    pub invoice_discount: Decimal,
    /// Line discounts plus the invoice-level discount
    pub total_discount: Decimal,
    /// `max(0, subtotal - total_discount)`
    pub total_amount: Decimal,
}

/// New paid/due/status after a payment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PaymentOutcome {
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub status: InvoiceStatus,
}

/// Compute subtotal, discounts and total for a set of lines.
///
/// Every amount is rounded to 2 dp after each step.
pub fn compute_invoice_totals(
    lines: &[LineInput<'_>],
    invoice_discount: Decimal,
) -> LedgerResult<InvoiceTotals> {
    if lines.is_empty() {
        return Err(LedgerError::Validation(
            "An invoice needs at least one line item".into(),
        ));
    }
    if invoice_discount < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Invoice discount cannot be negative (got {})",
            invoice_discount
        )));
    }

    let mut line_totals = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;
    let mut line_discount = Decimal::ZERO;

    let out_of_range = || LedgerError::Validation("Invoice amount is out of range".into());
    for line in lines {
        let totals = compute_line_totals(line)?;
        subtotal = subtotal
            .checked_add(totals.gross_amount)
            .map(round2)
            .ok_or_else(out_of_range)?;
        line_discount = round2(line_discount + totals.discount_amount);
        line_totals.push(totals);
    }

    let invoice_discount = round2(invoice_discount);
    let total_discount = line_discount
        .checked_add(invoice_discount)
        .map(round2)
        .ok_or_else(out_of_range)?;
    let total_amount = non_negative(subtotal - total_discount);

    Ok(InvoiceTotals {
        lines: line_totals,
        subtotal,
        invoice_discount,
        total_discount,
        total_amount,
    })
}

fn compute_line_totals(line: &LineInput<'_>) -> LedgerResult<LineTotals> {
    let therapy = line.therapy;
    if !therapy.is_active() {
        return Err(LedgerError::Validation(format!(
            "Therapy type '{}' is inactive and cannot be invoiced",
            therapy.name
        )));
    }
    if line.quantity < 1 {
        return Err(LedgerError::Validation(format!(
            "Quantity for '{}' must be at least 1 (got {})",
            therapy.name, line.quantity
        )));
    }
    if line.days < 1 {
        return Err(LedgerError::Validation(format!(
            "Days for '{}' must be at least 1 (got {})",
            therapy.name, line.days
        )));
    }
    if line.unit_price < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Unit price for '{}' cannot be negative",
            therapy.name
        )));
    }
    if line.discount_amount < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Discount for '{}' cannot be negative",
            therapy.name
        )));
    }

    // Entitlement is quantity x days, so it must fit an i64
    line.quantity.checked_mul(line.days).ok_or_else(|| {
        LedgerError::Validation(format!(
            "{} x {} session-days for '{}' is out of range",
            line.quantity, line.days, therapy.name
        ))
    })?;
    let out_of_range = || {
        LedgerError::Validation(format!(
            "Line amount for '{}' is out of range",
            therapy.name
        ))
    };

    let unit_price = round2(line.unit_price);
    let per_package = unit_price
        .checked_mul(Decimal::from(line.quantity))
        .map(round2)
        .ok_or_else(out_of_range)?;
    let gross_amount = per_package
        .checked_mul(Decimal::from(line.days))
        .map(round2)
        .ok_or_else(out_of_range)?;
    let discount_amount = round2(line.discount_amount);
    if discount_amount > gross_amount {
        return Err(LedgerError::Validation(format!(
            "Discount {} for '{}' exceeds the line amount {}",
            discount_amount, therapy.name, gross_amount
        )));
    }

    Ok(LineTotals {
        gross_amount,
        discount_amount,
        total_amount: round2(gross_amount - discount_amount),
    })
}

/// Status rule: nothing paid is `unpaid`, anything short of the total is
/// `partially_paid`, otherwise `paid`. A zero-total invoice is `paid`.
pub fn derive_status(paid_amount: Decimal, total_amount: Decimal) -> InvoiceStatus {
    if paid_amount >= total_amount {
        InvoiceStatus::Paid
    } else if paid_amount <= Decimal::ZERO {
        InvoiceStatus::Unpaid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

/// Validate a payment against an invoice and compute the resulting amounts.
pub fn apply_payment(invoice: &Invoice, amount: Decimal) -> LedgerResult<PaymentOutcome> {
    let amount = round2(amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidPayment(format!(
            "Payment must be greater than zero (got {})",
            amount
        )));
    }
    if amount > invoice.due_amount {
        return Err(LedgerError::InvalidPayment(format!(
            "Payment {} exceeds the amount due {} on invoice {}",
            amount, invoice.due_amount, invoice.invoice_number
        )));
    }

    let paid_amount = round2(invoice.paid_amount + amount);
    let due_amount = non_negative(invoice.total_amount - paid_amount);
    Ok(PaymentOutcome {
        paid_amount,
        due_amount,
        status: derive_status(paid_amount, invoice.total_amount),
    })
}

impl<'a> Ledger<'a> {
    /// Create an invoice with its line items, optionally taking a payment.
    ///
    /// Line prices default to the therapy type's current catalog price.
    pub fn generate_invoice(&self, request: &NewInvoice) -> LedgerResult<InvoiceWithItems> {
        if request.initial_payment < Decimal::ZERO {
            return Err(LedgerError::InvalidPayment(
                "Initial payment cannot be negative".into(),
            ));
        }

        let generated = self.db.with_write_transaction(|db| {
            if !db.patient_exists(&request.patient_id)? {
                return Err(LedgerError::NotFound(format!(
                    "Patient {}",
                    request.patient_id
                )));
            }

            let mut therapies = Vec::with_capacity(request.items.len());
            for item in &request.items {
                let therapy = db.get_therapy_type(&item.therapy_type_id)?.ok_or_else(|| {
                    LedgerError::NotFound(format!("Therapy type {}", item.therapy_type_id))
                })?;
                therapies.push(therapy);
            }

            let inputs: Vec<LineInput<'_>> = request
                .items
                .iter()
                .zip(&therapies)
                .map(|(item, therapy)| LineInput {
                    therapy,
                    quantity: item.quantity,
                    days: item.days,
                    unit_price: item.unit_price.unwrap_or(therapy.price),
                    discount_amount: item.discount_amount,
                })
                .collect();
            let totals = compute_invoice_totals(&inputs, request.invoice_discount)?;

            let now = chrono::Utc::now().to_rfc3339();
            let mut invoice = Invoice {
                id: uuid::Uuid::new_v4().to_string(),
                invoice_number: db.next_invoice_number(request.invoice_date)?,
                patient_id: request.patient_id.clone(),
                invoice_date: request.invoice_date,
                subtotal: totals.subtotal,
                discount_amount: totals.total_discount,
                total_amount: totals.total_amount,
                paid_amount: round2(Decimal::ZERO),
                due_amount: totals.total_amount,
                status: derive_status(Decimal::ZERO, totals.total_amount),
                notes: request.notes.clone(),
                version: 1,
                created_at: now.clone(),
                updated_at: now,
            };
            db.insert_invoice(&invoice)?;

            let mut items = Vec::with_capacity(inputs.len());
            for (input, line) in inputs.iter().zip(&totals.lines) {
                let item = InvoiceLineItem {
                    id: uuid::Uuid::new_v4().to_string(),
                    invoice_id: invoice.id.clone(),
                    therapy_type_id: input.therapy.id.clone(),
                    quantity: input.quantity,
                    days: input.days,
                    unit_price: round2(input.unit_price),
                    discount_amount: line.discount_amount,
                    total_amount: line.total_amount,
                };
                db.insert_invoice_item(&item)?;
                items.push(item);
            }

            if request.initial_payment > Decimal::ZERO {
                invoice = self.apply_and_store_payment(&invoice, request.initial_payment)?;
            }

            Ok(InvoiceWithItems { invoice, items })
        })?;

        tracing::info!(
            invoice = %generated.invoice.invoice_number,
            patient_id = %generated.invoice.patient_id,
            total = %generated.invoice.total_amount,
            status = ?generated.invoice.status,
            "generated invoice"
        );
        Ok(generated)
    }

    /// Record a payment against an invoice.
    pub fn record_payment(&self, invoice_id: &str, amount: Decimal) -> LedgerResult<Invoice> {
        self.record_payment_inner(invoice_id, None, amount)
    }

    /// Record a payment only if the invoice is still at `expected_version`,
    /// i.e. unchanged since the caller displayed it.
    pub fn record_payment_at_version(
        &self,
        invoice_id: &str,
        expected_version: i64,
        amount: Decimal,
    ) -> LedgerResult<Invoice> {
        self.record_payment_inner(invoice_id, Some(expected_version), amount)
    }

    fn record_payment_inner(
        &self,
        invoice_id: &str,
        expected_version: Option<i64>,
        amount: Decimal,
    ) -> LedgerResult<Invoice> {
        let result = self.db.with_write_transaction(|db| {
            let invoice = db
                .get_invoice(invoice_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("Invoice {}", invoice_id)))?;

            if let Some(expected) = expected_version {
                if invoice.version != expected {
                    return Err(LedgerError::ConcurrentModification(format!(
                        "Invoice {} is at version {}, expected {}",
                        invoice.invoice_number, invoice.version, expected
                    )));
                }
            }

            self.apply_and_store_payment(&invoice, amount)
        });

        match &result {
            Ok(invoice) => tracing::info!(
                invoice = %invoice.invoice_number,
                amount = %round2(amount),
                due = %invoice.due_amount,
                status = ?invoice.status,
                "recorded payment"
            ),
            Err(e) => tracing::warn!(invoice_id, amount = %amount, error = %e, "payment rejected"),
        }
        result
    }

    /// Validate, write the new totals under the version guard, and log the
    /// payment row. Must run inside a write transaction.
    fn apply_and_store_payment(&self, invoice: &Invoice, amount: Decimal) -> LedgerResult<Invoice> {
        let outcome = apply_payment(invoice, amount)?;
        self.db.update_invoice_payment(
            &invoice.id,
            invoice.version,
            outcome.paid_amount,
            outcome.due_amount,
            outcome.status,
        )?;
        self.db.insert_payment(&InvoicePayment {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_id: invoice.id.clone(),
            amount: round2(amount),
            paid_at: chrono::Utc::now().to_rfc3339(),
        })?;

        self.db
            .get_invoice(&invoice.id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Invoice {}", invoice.id)))
    }

    /// Invoice header plus line items.
    pub fn invoice_with_items(&self, invoice_id: &str) -> LedgerResult<InvoiceWithItems> {
        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Invoice {}", invoice_id)))?;
        let items = self.db.get_invoice_items(invoice_id)?;
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Hard-delete an invoice with its items and payments. Any entitlement it
    /// granted disappears with it.
    pub fn delete_invoice(&self, invoice_id: &str) -> LedgerResult<()> {
        if !self.db.delete_invoice(invoice_id)? {
            return Err(LedgerError::NotFound(format!("Invoice {}", invoice_id)));
        }
        tracing::info!(invoice_id, "deleted invoice");
        Ok(())
    }
}
