//! Invoice, line item and payment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{Database, DbError, DbResult};
use crate::money::parse_amount;
use crate::models::{Invoice, InvoiceLineItem, InvoicePayment, InvoiceStatus};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, patient_id, invoice_date, subtotal, discount_amount,
    total_amount, paid_amount, due_amount, status, notes, version, created_at, updated_at
"#;

impl Database {
    /// Insert an invoice header.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                id, invoice_number, patient_id, invoice_date, subtotal, discount_amount,
                total_amount, paid_amount, due_amount, status, notes, version,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                invoice.id,
                invoice.invoice_number,
                invoice.patient_id,
                invoice.invoice_date,
                invoice.subtotal.to_string(),
                invoice.discount_amount.to_string(),
                invoice.total_amount.to_string(),
                invoice.paid_amount.to_string(),
                invoice.due_amount.to_string(),
                invoice_status_to_string(invoice.status),
                invoice.notes,
                invoice.version,
                invoice.created_at,
                invoice.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Insert one line item.
    pub fn insert_invoice_item(&self, item: &InvoiceLineItem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, therapy_type_id, quantity, days,
                unit_price, discount_amount, total_amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                item.id,
                item.invoice_id,
                item.therapy_type_id,
                item.quantity,
                item.days,
                item.unit_price.to_string(),
                item.discount_amount.to_string(),
                item.total_amount.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get an invoice header by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?");
        self.conn
            .query_row(&sql, [id], invoice_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Line items of an invoice, in insertion order.
    pub fn get_invoice_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLineItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_id, therapy_type_id, quantity, days,
                   unit_price, discount_amount, total_amount
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([invoice_id], item_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Invoices of one patient, newest first.
    pub fn list_invoices_for_patient(&self, patient_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE patient_id = ? ORDER BY invoice_date DESC, invoice_number DESC"
        );
        self.query_invoices(&sql, [patient_id])
    }

    /// Every invoice, newest first.
    pub fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY invoice_date DESC, invoice_number DESC"
        );
        self.query_invoices(&sql, [])
    }

    /// Invoices that still have something due, oldest first.
    pub fn list_invoices_with_dues(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status != 'paid' ORDER BY invoice_date, invoice_number"
        );
        self.query_invoices(&sql, [])
    }

    /// Line items that currently grant entitlement for a patient, i.e. items
    /// on the patient's paid or partially paid invoices.
    pub fn list_entitling_items(&self, patient_id: &str) -> DbResult<Vec<InvoiceLineItem>> {
        let sql = format!(
            r#"
            SELECT li.id, li.invoice_id, li.therapy_type_id, li.quantity, li.days,
                   li.unit_price, li.discount_amount, li.total_amount
            FROM invoice_items li
            JOIN invoices i ON i.id = li.invoice_id
            WHERE i.patient_id = ?
              AND i.status IN ({})
            ORDER BY i.invoice_date, li.rowid
            "#,
            entitling_statuses()
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt.query_map([patient_id], item_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Write new payment totals, guarded by the invoice version.
    ///
    /// Fails with [`DbError::Conflict`] when the row was changed since
    /// `expected_version` was read; nothing is written in that case.
    pub fn update_invoice_payment(
        &self,
        id: &str,
        expected_version: i64,
        paid_amount: Decimal,
        due_amount: Decimal,
        status: InvoiceStatus,
    ) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET
                paid_amount = ?3,
                due_amount = ?4,
                status = ?5,
                version = version + 1,
                updated_at = datetime('now')
            WHERE id = ?1 AND version = ?2
            "#,
            params![
                id,
                expected_version,
                paid_amount.to_string(),
                due_amount.to_string(),
                invoice_status_to_string(status),
            ],
        )?;
        if rows_affected == 0 {
            return Err(DbError::Conflict(format!(
                "Invoice {} changed since version {} was read",
                id, expected_version
            )));
        }
        Ok(())
    }

    /// Delete an invoice; its items and payments cascade.
    pub fn delete_invoice(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM invoices WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Record a payment row.
    pub fn insert_payment(&self, payment: &InvoicePayment) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO invoice_payments (id, invoice_id, amount, paid_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                payment.id,
                payment.invoice_id,
                payment.amount.to_string(),
                payment.paid_at,
            ],
        )?;
        Ok(())
    }

    /// Payment history of an invoice, oldest first.
    pub fn list_payments(&self, invoice_id: &str) -> DbResult<Vec<InvoicePayment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_id, amount, paid_at
            FROM invoice_payments
            WHERE invoice_id = ?
            ORDER BY paid_at, rowid
            "#,
        )?;

        let rows = stmt.query_map([invoice_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut payments = Vec::new();
        for row in rows {
            let (id, invoice_id, amount, paid_at) = row?;
            payments.push(InvoicePayment {
                id,
                invoice_id,
                amount: parse_amount(&amount)?,
                paid_at,
            });
        }
        Ok(payments)
    }

    /// Next `INV-YYYYMMDD-NNNN` number for a date.
    pub fn next_invoice_number(&self, invoice_date: NaiveDate) -> DbResult<String> {
        let prefix = format!("INV-{}-", invoice_date.format("%Y%m%d"));
        let last: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT invoice_number FROM invoices
                WHERE invoice_number LIKE ?1 || '%'
                ORDER BY CAST(substr(invoice_number, length(?1) + 1) AS INTEGER) DESC
                LIMIT 1
                "#,
                [prefix.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let next = match last {
            Some(number) => {
                let sequence = number[prefix.len()..].parse::<u32>().map_err(|_| {
                    DbError::InvalidValue(format!("Malformed invoice number: {}", number))
                })?;
                sequence + 1
            }
            None => 1,
        };
        Ok(format!("{}{:04}", prefix, next))
    }

    fn query_invoices<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, invoice_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }
}

/// Intermediate row struct for database mapping.
struct InvoiceRow {
    id: String,
    invoice_number: String,
    patient_id: String,
    invoice_date: NaiveDate,
    subtotal: String,
    discount_amount: String,
    total_amount: String,
    paid_amount: String,
    due_amount: String,
    status: String,
    notes: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

fn invoice_row(row: &Row<'_>) -> rusqlite::Result<InvoiceRow> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        patient_id: row.get(2)?,
        invoice_date: row.get(3)?,
        subtotal: row.get(4)?,
        discount_amount: row.get(5)?,
        total_amount: row.get(6)?,
        paid_amount: row.get(7)?,
        due_amount: row.get(8)?,
        status: row.get(9)?,
        notes: row.get(10)?,
        version: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            patient_id: row.patient_id,
            invoice_date: row.invoice_date,
            subtotal: parse_amount(&row.subtotal)?,
            discount_amount: parse_amount(&row.discount_amount)?,
            total_amount: parse_amount(&row.total_amount)?,
            paid_amount: parse_amount(&row.paid_amount)?,
            due_amount: parse_amount(&row.due_amount)?,
            status: string_to_invoice_status(&row.status)?,
            notes: row.notes,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Intermediate row struct for database mapping.
struct InvoiceItemRow {
    id: String,
    invoice_id: String,
    therapy_type_id: String,
    quantity: i64,
    days: i64,
    unit_price: String,
    discount_amount: String,
    total_amount: String,
}

fn item_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItemRow> {
    Ok(InvoiceItemRow {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        therapy_type_id: row.get(2)?,
        quantity: row.get(3)?,
        days: row.get(4)?,
        unit_price: row.get(5)?,
        discount_amount: row.get(6)?,
        total_amount: row.get(7)?,
    })
}

impl TryFrom<InvoiceItemRow> for InvoiceLineItem {
    type Error = DbError;

    fn try_from(row: InvoiceItemRow) -> Result<Self, Self::Error> {
        Ok(InvoiceLineItem {
            id: row.id,
            invoice_id: row.invoice_id,
            therapy_type_id: row.therapy_type_id,
            quantity: row.quantity,
            days: row.days,
            unit_price: parse_amount(&row.unit_price)?,
            discount_amount: parse_amount(&row.discount_amount)?,
            total_amount: parse_amount(&row.total_amount)?,
        })
    }
}

pub(crate) fn invoice_status_to_string(status: InvoiceStatus) -> &'static str {
    status.as_str()
}

/// SQL list of the statuses that grant entitlement, e.g. `'partially_paid', 'paid'`.
fn entitling_statuses() -> String {
    InvoiceStatus::ALL
        .iter()
        .filter(|status| status.grants_entitlement())
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn string_to_invoice_status(s: &str) -> Result<InvoiceStatus, DbError> {
    match s {
        "unpaid" => Ok(InvoiceStatus::Unpaid),
        "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
        "paid" => Ok(InvoiceStatus::Paid),
        _ => Err(DbError::Constraint(format!("Unknown invoice status: {}", s))),
    }
}
