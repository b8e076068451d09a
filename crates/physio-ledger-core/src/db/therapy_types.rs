//! Therapy catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{TherapyStatus, TherapyType};

impl Database {
    /// Insert a new therapy type.
    pub fn insert_therapy_type(&self, therapy: &TherapyType) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO therapy_types (
                id, name, description, price, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                therapy.id,
                therapy.name,
                therapy.description,
                crate::money::round2(therapy.price).to_string(),
                therapy_status_to_string(therapy.status),
                therapy.created_at,
                therapy.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update name, description and price. Existing invoice lines keep their
    /// price snapshot.
    pub fn update_therapy_type(&self, therapy: &TherapyType) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE therapy_types SET
                name = ?2,
                description = ?3,
                price = ?4,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                therapy.id,
                therapy.name,
                therapy.description,
                crate::money::round2(therapy.price).to_string(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a therapy type by ID, active or not.
    pub fn get_therapy_type(&self, id: &str) -> DbResult<Option<TherapyType>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, description, price, status, created_at, updated_at
                FROM therapy_types
                WHERE id = ?
                "#,
                [id],
                therapy_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List therapy types ordered by name.
    pub fn list_therapy_types(&self, active_only: bool) -> DbResult<Vec<TherapyType>> {
        let sql = if active_only {
            r#"
            SELECT id, name, description, price, status, created_at, updated_at
            FROM therapy_types
            WHERE status = 'active'
            ORDER BY name
            "#
        } else {
            r#"
            SELECT id, name, description, price, status, created_at, updated_at
            FROM therapy_types
            ORDER BY name
            "#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], therapy_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Set catalog status.
    pub fn set_therapy_status(&self, id: &str, status: TherapyStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE therapy_types SET status = ?, updated_at = datetime('now') WHERE id = ?",
            params![therapy_status_to_string(status), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Hard-delete a therapy type that nothing references.
    pub fn delete_therapy_type(&self, id: &str) -> DbResult<bool> {
        let references: i64 = self.conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM invoice_items WHERE therapy_type_id = ?1)
                 + (SELECT COUNT(*) FROM daily_therapy_records WHERE therapy_type_id = ?1)
            "#,
            [id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(DbError::Constraint(format!(
                "Therapy type {} is referenced by {} invoice items or session records; deactivate it instead",
                id, references
            )));
        }

        let rows_affected = self
            .conn
            .execute("DELETE FROM therapy_types WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct TherapyTypeRow {
    id: String,
    name: String,
    description: Option<String>,
    price: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn therapy_row(row: &Row<'_>) -> rusqlite::Result<TherapyTypeRow> {
    Ok(TherapyTypeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl TryFrom<TherapyTypeRow> for TherapyType {
    type Error = DbError;

    fn try_from(row: TherapyTypeRow) -> Result<Self, Self::Error> {
        Ok(TherapyType {
            id: row.id,
            name: row.name,
            description: row.description,
            price: crate::money::parse_amount(&row.price)?,
            status: string_to_therapy_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn therapy_status_to_string(status: TherapyStatus) -> &'static str {
    match status {
        TherapyStatus::Active => "active",
        TherapyStatus::Inactive => "inactive",
    }
}

pub(crate) fn string_to_therapy_status(s: &str) -> Result<TherapyStatus, DbError> {
    match s {
        "active" => Ok(TherapyStatus::Active),
        "inactive" => Ok(TherapyStatus::Inactive),
        _ => Err(DbError::Constraint(format!("Unknown therapy status: {}", s))),
    }
}
