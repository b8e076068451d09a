//! SQLite schema definition.

/// Version stamped into `schema_version` by [`SCHEMA`].
pub const SCHEMA_VERSION: i64 = 1;

/// Complete database schema for physio-ledger.
///
/// Money columns are TEXT holding exact decimal strings with two places.
/// Dates are `YYYY-MM-DD`, times `HH:MM:SS`, so text comparison orders them.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Reference lists
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS discount_givers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS referrers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Patients (never deleted, status flips to inactive)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER,
    gender TEXT,
    phone TEXT,
    address TEXT,
    medical_notes TEXT,
    doctor_id TEXT REFERENCES doctors(id) ON DELETE SET NULL,
    discount_giver_id TEXT REFERENCES discount_givers(id) ON DELETE SET NULL,
    referrer_id TEXT REFERENCES referrers(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_status ON patients(status);

-- ============================================================================
-- Therapy catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS therapy_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price TEXT NOT NULL DEFAULT '0.00',
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_therapy_types_status ON therapy_types(status);

-- ============================================================================
-- Invoices
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    invoice_date TEXT NOT NULL,
    subtotal TEXT NOT NULL,
    discount_amount TEXT NOT NULL DEFAULT '0.00',
    total_amount TEXT NOT NULL,
    paid_amount TEXT NOT NULL DEFAULT '0.00',
    due_amount TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('unpaid', 'partially_paid', 'paid')),
    notes TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_invoices_patient ON invoices(patient_id);
CREATE INDEX IF NOT EXISTS idx_invoices_date ON invoices(invoice_date);
CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(status);

CREATE TABLE IF NOT EXISTS invoice_items (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    therapy_type_id TEXT NOT NULL REFERENCES therapy_types(id),
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    days INTEGER NOT NULL CHECK (days >= 1),
    unit_price TEXT NOT NULL,
    discount_amount TEXT NOT NULL DEFAULT '0.00',
    total_amount TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice ON invoice_items(invoice_id);
CREATE INDEX IF NOT EXISTS idx_invoice_items_therapy ON invoice_items(therapy_type_id);

CREATE TABLE IF NOT EXISTS invoice_payments (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    amount TEXT NOT NULL,
    paid_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_invoice_payments_invoice ON invoice_payments(invoice_id);

-- ============================================================================
-- Daily therapy records (one row = one consumed session-day)
-- ============================================================================

CREATE TABLE IF NOT EXISTS daily_therapy_records (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    therapy_type_id TEXT NOT NULL REFERENCES therapy_types(id),
    therapy_date TEXT NOT NULL,
    therapy_time TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_patient_therapy ON daily_therapy_records(patient_id, therapy_type_id);
CREATE INDEX IF NOT EXISTS idx_records_date ON daily_therapy_records(therapy_date);

-- ============================================================================
-- Business settings (single row)
-- ============================================================================

CREATE TABLE IF NOT EXISTS business_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    clinic_name TEXT NOT NULL,
    address TEXT,
    phone TEXT,
    email TEXT,
    currency_symbol TEXT NOT NULL,
    invoice_footer TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO business_settings (id, clinic_name, currency_symbol)
VALUES (1, 'Physiotherapy Clinic', '₹');

INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_item_quantity_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO patients (id, name) VALUES ('p1', 'Asha')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO therapy_types (id, name, price) VALUES ('t1', 'Backpain', '500.00')",
            [],
        )
        .unwrap();
        conn.execute(
            r#"INSERT INTO invoices (id, invoice_number, patient_id, invoice_date, subtotal, total_amount, due_amount, status)
               VALUES ('i1', 'INV-1', 'p1', '2024-01-15', '500.00', '500.00', '500.00', 'unpaid')"#,
            [],
        )
        .unwrap();

        // Zero quantity should fail
        let result = conn.execute(
            r#"INSERT INTO invoice_items (id, invoice_id, therapy_type_id, quantity, days, unit_price, total_amount)
               VALUES ('li1', 'i1', 't1', 0, 10, '500.00', '0.00')"#,
            [],
        );
        assert!(result.is_err());

        // Valid item should succeed
        let result = conn.execute(
            r#"INSERT INTO invoice_items (id, invoice_id, therapy_type_id, quantity, days, unit_price, total_amount)
               VALUES ('li1', 'i1', 't1', 1, 10, '500.00', '5000.00')"#,
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_invoice_delete_cascades() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO patients (id, name) VALUES ('p1', 'Asha')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO therapy_types (id, name, price) VALUES ('t1', 'Backpain', '500.00')",
            [],
        )
        .unwrap();
        conn.execute(
            r#"INSERT INTO invoices (id, invoice_number, patient_id, invoice_date, subtotal, total_amount, due_amount, status)
               VALUES ('i1', 'INV-1', 'p1', '2024-01-15', '500.00', '500.00', '500.00', 'unpaid')"#,
            [],
        )
        .unwrap();
        conn.execute(
            r#"INSERT INTO invoice_items (id, invoice_id, therapy_type_id, quantity, days, unit_price, total_amount)
               VALUES ('li1', 'i1', 't1', 1, 1, '500.00', '500.00')"#,
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM invoices WHERE id = 'i1'", []).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM invoice_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
