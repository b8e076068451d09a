//! Session scheduling against remaining entitlement.

use chrono::{NaiveDate, NaiveTime};

use super::{EntitlementGrant, Ledger, LedgerError, LedgerResult};
use crate::models::TherapySessionRecord;

impl<'a> Ledger<'a> {
    /// Book one session-day of a therapy type for a patient.
    ///
    /// The entitlement check and the insert run in one write transaction, so
    /// two callers cannot both take the last remaining day. Every booked
    /// session for the pair counts against the entitlement, including ones
    /// dated after `therapy_date`.
    pub fn schedule_session(
        &self,
        patient_id: &str,
        therapy_type_id: &str,
        therapy_date: NaiveDate,
        therapy_time: NaiveTime,
    ) -> LedgerResult<TherapySessionRecord> {
        let result = self.db.with_write_transaction(|db| {
            if !db.patient_exists(patient_id)? {
                return Err(LedgerError::NotFound(format!("Patient {}", patient_id)));
            }
            let therapy = db
                .get_therapy_type(therapy_type_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("Therapy type {}", therapy_type_id)))?;
            if !therapy.is_active() {
                return Err(LedgerError::Validation(format!(
                    "Therapy type '{}' is inactive and cannot be scheduled",
                    therapy.name
                )));
            }

            let total_days: i64 = db
                .list_entitling_items(patient_id)?
                .iter()
                .map(EntitlementGrant::from)
                .filter(|g| g.therapy_type_id == therapy_type_id)
                .fold(0i64, |total, g| total.saturating_add(g.days));
            let used_days = db.count_sessions(patient_id, therapy_type_id)?;
            let remaining_days = total_days.saturating_sub(used_days);
            if remaining_days <= 0 {
                return Err(LedgerError::NoEntitlement(format!(
                    "'{}' has {} of {} days left",
                    therapy.name,
                    remaining_days.max(0),
                    total_days
                )));
            }

            let record = TherapySessionRecord::new(
                patient_id.to_string(),
                therapy_type_id.to_string(),
                therapy_date,
                therapy_time,
            );
            db.insert_session_record(&record)?;
            Ok(record)
        });

        match &result {
            Ok(record) => tracing::info!(
                session_id = %record.id,
                patient_id,
                therapy_type_id,
                date = %therapy_date,
                "scheduled session"
            ),
            Err(e) => tracing::warn!(
                patient_id,
                therapy_type_id,
                date = %therapy_date,
                error = %e,
                "session not scheduled"
            ),
        }
        result
    }

    /// Move a session to a different time on the same day. Entitlement is
    /// not re-checked.
    pub fn update_session_time(
        &self,
        record_id: &str,
        therapy_time: NaiveTime,
    ) -> LedgerResult<TherapySessionRecord> {
        if !self.db.update_session_time(record_id, therapy_time)? {
            return Err(LedgerError::NotFound(format!("Session {}", record_id)));
        }
        tracing::debug!(record_id, time = %therapy_time, "updated session time");
        self.db
            .get_session_record(record_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("Session {}", record_id)))
    }

    /// Remove a session. The consumed day returns to the balance.
    pub fn delete_session(&self, record_id: &str) -> LedgerResult<()> {
        if !self.db.delete_session_record(record_id)? {
            return Err(LedgerError::NotFound(format!("Session {}", record_id)));
        }
        tracing::info!(record_id, "deleted session");
        Ok(())
    }

    pub fn sessions_for_patient(&self, patient_id: &str) -> LedgerResult<Vec<TherapySessionRecord>> {
        Ok(self.db.list_sessions_for_patient(patient_id)?)
    }

    pub fn sessions_on(&self, date: NaiveDate) -> LedgerResult<Vec<TherapySessionRecord>> {
        Ok(self.db.list_sessions_on(date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        Invoice, InvoiceLineItem, InvoiceStatus, NewInvoice, NewLineItem, Patient, TherapyStatus,
        TherapyType,
    };
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    /// Patient with a paid invoice for `days` days of one therapy.
    fn setup_with_entitlement(days: i64) -> (Database, Patient, TherapyType) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Asha Rao".into());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("Backpain".into(), Decimal::from(500));
        db.insert_therapy_type(&therapy).unwrap();

        let mut request = NewInvoice::new(&patient.id, date(1))
            .with_item(NewLineItem::new(&therapy.id, 1, days));
        request.initial_payment = Decimal::from(500 * days);
        Ledger::new(&db).generate_invoice(&request).unwrap();

        (db, patient, therapy)
    }

    #[test]
    fn test_last_day_then_exhausted() {
        let (db, patient, therapy) = setup_with_entitlement(2);
        let ledger = Ledger::new(&db);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();
        let balance = ledger.therapy_balance(&patient.id, &therapy.id, date(31)).unwrap();
        assert_eq!(balance.remaining_days, 1);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(11), time(9))
            .unwrap();
        let balance = ledger.therapy_balance(&patient.id, &therapy.id, date(31)).unwrap();
        assert_eq!(balance.remaining_days, 0);

        let result = ledger.schedule_session(&patient.id, &therapy.id, date(12), time(9));
        assert!(matches!(result, Err(LedgerError::NoEntitlement(_))));
        assert_eq!(ledger.sessions_for_patient(&patient.id).unwrap().len(), 2);
    }

    #[test]
    fn test_future_bookings_count_against_entitlement() {
        let (db, patient, therapy) = setup_with_entitlement(1);
        let ledger = Ledger::new(&db);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(20), time(9))
            .unwrap();
        let result = ledger.schedule_session(&patient.id, &therapy.id, date(5), time(9));
        assert!(matches!(result, Err(LedgerError::NoEntitlement(_))));
    }

    #[test]
    fn test_oversized_stored_package_still_schedules() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Chitra".into());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("Cupping".into(), Decimal::ZERO);
        db.insert_therapy_type(&therapy).unwrap();

        // Rows written outside generate_invoice, e.g. by an older build
        let now = chrono::Utc::now().to_rfc3339();
        let invoice = Invoice {
            id: "inv-big".into(),
            invoice_number: "INV-20240101-0001".into(),
            patient_id: patient.id.clone(),
            invoice_date: date(1),
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            due_amount: Decimal::ZERO,
            status: InvoiceStatus::Paid,
            notes: None,
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        };
        db.insert_invoice(&invoice).unwrap();
        for id in ["li-1", "li-2"] {
            db.insert_invoice_item(&InvoiceLineItem {
                id: id.into(),
                invoice_id: invoice.id.clone(),
                therapy_type_id: therapy.id.clone(),
                quantity: i64::MAX,
                days: 2,
                unit_price: Decimal::ZERO,
                discount_amount: Decimal::ZERO,
                total_amount: Decimal::ZERO,
            })
            .unwrap();
        }

        let ledger = Ledger::new(&db);
        let available = ledger.available_therapies(&patient.id, date(31)).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].total_days, i64::MAX);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();
        let balance = ledger.therapy_balance(&patient.id, &therapy.id, date(31)).unwrap();
        assert_eq!(balance.remaining_days, i64::MAX - 1);
    }

    #[test]
    fn test_listed_as_available_but_later_bookings_use_it_up() {
        let (db, patient, therapy) = setup_with_entitlement(2);
        let ledger = Ledger::new(&db);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(20), time(9))
            .unwrap();
        ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();

        let available = ledger.available_therapies(&patient.id, date(5)).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].remaining_days, 2);

        let result = ledger.schedule_session(&patient.id, &therapy.id, date(5), time(9));
        assert!(matches!(result, Err(LedgerError::NoEntitlement(_))));
    }

    #[test]
    fn test_unpaid_invoice_grants_no_entitlement() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Bilal".into());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("TENS".into(), Decimal::from(200));
        db.insert_therapy_type(&therapy).unwrap();

        let ledger = Ledger::new(&db);
        let request =
            NewInvoice::new(&patient.id, date(1)).with_item(NewLineItem::new(&therapy.id, 1, 5));
        ledger.generate_invoice(&request).unwrap();

        let result = ledger.schedule_session(&patient.id, &therapy.id, date(2), time(9));
        assert!(matches!(result, Err(LedgerError::NoEntitlement(_))));
    }

    #[test]
    fn test_inactive_therapy_rejected() {
        let (db, patient, therapy) = setup_with_entitlement(3);
        db.set_therapy_status(&therapy.id, TherapyStatus::Inactive)
            .unwrap();

        let result =
            Ledger::new(&db).schedule_session(&patient.id, &therapy.id, date(10), time(9));
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_unknown_patient_or_therapy() {
        let (db, patient, therapy) = setup_with_entitlement(3);
        let ledger = Ledger::new(&db);

        assert!(matches!(
            ledger.schedule_session("nobody", &therapy.id, date(10), time(9)),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.schedule_session(&patient.id, "nothing", date(10), time(9)),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_restores_balance() {
        let (db, patient, therapy) = setup_with_entitlement(3);
        let ledger = Ledger::new(&db);

        let before = ledger.therapy_balance(&patient.id, &therapy.id, date(31)).unwrap();
        let record = ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();
        ledger.delete_session(&record.id).unwrap();
        let after = ledger.therapy_balance(&patient.id, &therapy.id, date(31)).unwrap();

        assert_eq!(before, after);
        assert!(matches!(
            ledger.delete_session(&record.id),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_time_keeps_balance() {
        let (db, patient, therapy) = setup_with_entitlement(1);
        let ledger = Ledger::new(&db);

        let record = ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();
        // No days left, but a time-only edit is still allowed
        let updated = ledger.update_session_time(&record.id, time(15)).unwrap();
        assert_eq!(updated.therapy_time, time(15));
        assert_eq!(updated.therapy_date, date(10));

        assert!(matches!(
            ledger.update_session_time("missing", time(15)),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_day_view() {
        let (db, patient, therapy) = setup_with_entitlement(3);
        let ledger = Ledger::new(&db);

        ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(14))
            .unwrap();
        ledger
            .schedule_session(&patient.id, &therapy.id, date(10), time(9))
            .unwrap();
        ledger
            .schedule_session(&patient.id, &therapy.id, date(11), time(9))
            .unwrap();

        let day = ledger.sessions_on(date(10)).unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].therapy_time, time(9));
    }
}
