//! Daily therapy record database operations.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::TherapySessionRecord;

impl Database {
    /// Insert a session record.
    pub fn insert_session_record(&self, record: &TherapySessionRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO daily_therapy_records (
                id, patient_id, therapy_type_id, therapy_date, therapy_time,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.patient_id,
                record.therapy_type_id,
                record.therapy_date,
                record.therapy_time,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a session record by ID.
    pub fn get_session_record(&self, id: &str) -> DbResult<Option<TherapySessionRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, therapy_type_id, therapy_date, therapy_time,
                       created_at, updated_at
                FROM daily_therapy_records
                WHERE id = ?
                "#,
                [id],
                session_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Change only the time of a session.
    pub fn update_session_time(&self, id: &str, therapy_time: NaiveTime) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE daily_therapy_records
            SET therapy_time = ?2, updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, therapy_time],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a session record.
    pub fn delete_session_record(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM daily_therapy_records WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// All sessions for a patient, newest first. Includes inactive therapy types.
    pub fn list_sessions_for_patient(&self, patient_id: &str) -> DbResult<Vec<TherapySessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, therapy_type_id, therapy_date, therapy_time,
                   created_at, updated_at
            FROM daily_therapy_records
            WHERE patient_id = ?
            ORDER BY therapy_date DESC, therapy_time DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], session_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sessions for a patient dated on or before `as_of`.
    pub fn list_sessions_until(
        &self,
        patient_id: &str,
        as_of: NaiveDate,
    ) -> DbResult<Vec<TherapySessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, therapy_type_id, therapy_date, therapy_time,
                   created_at, updated_at
            FROM daily_therapy_records
            WHERE patient_id = ?1 AND therapy_date <= ?2
            ORDER BY therapy_date, therapy_time
            "#,
        )?;

        let rows = stmt.query_map(params![patient_id, as_of], session_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Day view: every session on a date, ordered by time.
    pub fn list_sessions_on(&self, date: NaiveDate) -> DbResult<Vec<TherapySessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, therapy_type_id, therapy_date, therapy_time,
                   created_at, updated_at
            FROM daily_therapy_records
            WHERE therapy_date = ?
            ORDER BY therapy_time
            "#,
        )?;

        let rows = stmt.query_map([date], session_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of sessions booked for a (patient, therapy type) pair, on any date.
    pub fn count_sessions(&self, patient_id: &str, therapy_type_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM daily_therapy_records
            WHERE patient_id = ?1 AND therapy_type_id = ?2
            "#,
            params![patient_id, therapy_type_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn session_row(row: &Row<'_>) -> rusqlite::Result<TherapySessionRecord> {
    Ok(TherapySessionRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        therapy_type_id: row.get(2)?,
        therapy_date: row.get(3)?,
        therapy_time: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
