//! Doctor / discount giver / referrer list operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{ReferenceEntry, ReferenceKind};

impl Database {
    /// Insert an entry into its reference list.
    pub fn insert_reference(&self, entry: &ReferenceEntry) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)",
            entry.kind.table()
        );
        self.conn.execute(
            &sql,
            params![entry.id, entry.name, entry.phone, entry.created_at],
        )?;
        Ok(())
    }

    /// Get one entry.
    pub fn get_reference(&self, kind: ReferenceKind, id: &str) -> DbResult<Option<ReferenceEntry>> {
        let sql = format!(
            "SELECT id, name, phone, created_at FROM {} WHERE id = ?",
            kind.table()
        );
        self.conn
            .query_row(&sql, [id], |row| {
                Ok(ReferenceEntry {
                    id: row.get(0)?,
                    kind,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .optional()
            .map_err(Into::into)
    }

    /// List a reference list ordered by name.
    pub fn list_references(&self, kind: ReferenceKind) -> DbResult<Vec<ReferenceEntry>> {
        let sql = format!(
            "SELECT id, name, phone, created_at FROM {} ORDER BY name",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ReferenceEntry {
                id: row.get(0)?,
                kind,
                name: row.get(1)?,
                phone: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an entry. Patients pointing at it lose the reference.
    pub fn delete_reference(&self, kind: ReferenceKind, id: &str) -> DbResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
        let rows_affected = self.conn.execute(&sql, [id])?;
        Ok(rows_affected > 0)
    }

    /// Patients linked to a reference entry.
    pub fn count_patients_for_reference(&self, kind: ReferenceKind, id: &str) -> DbResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM patients WHERE {} = ?",
            kind.patient_column()
        );
        let count = self.conn.query_row(&sql, [id], |row| row.get(0))?;
        Ok(count)
    }
}
