//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Patient, PatientStatus};

const PATIENT_COLUMNS: &str = r#"
    id, name, age, gender, phone, address, medical_notes,
    doctor_id, discount_giver_id, referrer_id, status, created_at, updated_at
"#;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, age, gender, phone, address, medical_notes,
                doctor_id, discount_giver_id, referrer_id, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                patient.id,
                patient.name,
                patient.age,
                patient.gender,
                patient.phone,
                patient.address,
                patient.medical_notes,
                patient.doctor_id,
                patient.discount_giver_id,
                patient.referrer_id,
                patient_status_to_string(patient.status),
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient's demographic and reference fields.
    ///
    /// Status is not touched here; use [`Database::set_patient_status`].
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                age = ?3,
                gender = ?4,
                phone = ?5,
                address = ?6,
                medical_notes = ?7,
                doctor_id = ?8,
                discount_giver_id = ?9,
                referrer_id = ?10,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.age,
                patient.gender,
                patient.phone,
                patient.address,
                patient.medical_notes,
                patient.doctor_id,
                patient.discount_giver_id,
                patient.referrer_id,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?");
        self.conn
            .query_row(&sql, [id], patient_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by name or phone (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let sql = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE name LIKE ?1 OR phone LIKE ?1 ORDER BY name LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, limit as i64], patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List patients, optionally only active ones.
    pub fn list_patients(&self, active_only: bool) -> DbResult<Vec<Patient>> {
        let sql = if active_only {
            format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE status = 'active' ORDER BY name")
        } else {
            format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Flip a patient's status (soft delete / restore).
    pub fn set_patient_status(&self, id: &str, status: PatientStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET status = ?, updated_at = datetime('now') WHERE id = ?",
            params![patient_status_to_string(status), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Whether a patient row exists.
    pub fn patient_exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM patients WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    age: Option<u32>,
    gender: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    medical_notes: Option<String>,
    doctor_id: Option<String>,
    discount_giver_id: Option<String>,
    referrer_id: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        medical_notes: row.get(6)?,
        doctor_id: row.get(7)?,
        discount_giver_id: row.get(8)?,
        referrer_id: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            phone: row.phone,
            address: row.address,
            medical_notes: row.medical_notes,
            doctor_id: row.doctor_id,
            discount_giver_id: row.discount_giver_id,
            referrer_id: row.referrer_id,
            status: string_to_patient_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn patient_status_to_string(status: PatientStatus) -> &'static str {
    match status {
        PatientStatus::Active => "active",
        PatientStatus::Inactive => "inactive",
    }
}

fn string_to_patient_status(s: &str) -> Result<PatientStatus, DbError> {
    match s {
        "active" => Ok(PatientStatus::Active),
        "inactive" => Ok(PatientStatus::Inactive),
        _ => Err(DbError::Constraint(format!("Unknown patient status: {}", s))),
    }
}
