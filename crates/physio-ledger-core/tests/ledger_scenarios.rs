//! End-to-end ledger scenarios over an in-memory database.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use physio_ledger_core::db::Database;
use physio_ledger_core::ledger::{Ledger, LedgerError};
use physio_ledger_core::models::{
    InvoiceStatus, NewInvoice, NewLineItem, Patient, TherapyStatus, TherapyType,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

struct Clinic {
    db: Database,
    patient: Patient,
    backpain: TherapyType,
}

fn clinic() -> Clinic {
    let db = Database::open_in_memory().unwrap();
    let patient = Patient::new("Asha Rao".to_string());
    db.insert_patient(&patient).unwrap();
    let backpain = TherapyType::new("Backpain".to_string(), d("500"));
    db.insert_therapy_type(&backpain).unwrap();
    Clinic {
        db,
        patient,
        backpain,
    }
}

/// Paid invoice: one line, quantity 1, `days` days.
fn buy_package(clinic: &Clinic, therapy: &TherapyType, days: i64) {
    let ledger = Ledger::new(&clinic.db);
    let mut request = NewInvoice::new(&clinic.patient.id, date(1))
        .with_item(NewLineItem::new(&therapy.id, 1, days));
    request.initial_payment = therapy.price * Decimal::from(days);
    let generated = ledger.generate_invoice(&request).unwrap();
    assert_eq!(generated.invoice.status, InvoiceStatus::Paid);
}

#[test]
fn test_paid_package_is_available() {
    let clinic = clinic();
    buy_package(&clinic, &clinic.backpain, 10);

    let available = Ledger::new(&clinic.db)
        .available_therapies(&clinic.patient.id, date(15))
        .unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].name, "Backpain");
    assert_eq!(available[0].total_days, 10);
    assert_eq!(available[0].remaining_days, 10);
    assert_eq!(available[0].price, d("500"));
}

#[test]
fn test_three_sessions_leave_seven() {
    let clinic = clinic();
    buy_package(&clinic, &clinic.backpain, 10);
    let ledger = Ledger::new(&clinic.db);

    for day in [2, 5, 9] {
        ledger
            .schedule_session(&clinic.patient.id, &clinic.backpain.id, date(day), time(10))
            .unwrap();
    }

    let available = ledger.available_therapies(&clinic.patient.id, date(15)).unwrap();
    assert_eq!(available[0].used_days, 3);
    assert_eq!(available[0].remaining_days, 7);
}

#[test]
fn test_partial_payment_then_settle() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let mut request = NewInvoice::new(&clinic.patient.id, date(1))
        .with_item(NewLineItem::new(&clinic.backpain.id, 1, 2));
    request.invoice_discount = d("100");
    request.initial_payment = d("300");
    let invoice = ledger.generate_invoice(&request).unwrap().invoice;

    assert_eq!(invoice.subtotal, d("1000"));
    assert_eq!(invoice.discount_amount, d("100"));
    assert_eq!(invoice.total_amount, d("900"));
    assert_eq!(invoice.due_amount, d("600"));
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);

    let settled = ledger.record_payment(&invoice.id, d("600")).unwrap();
    assert_eq!(settled.paid_amount, d("900"));
    assert_eq!(settled.due_amount, Decimal::ZERO);
    assert!(settled.due_amount >= Decimal::ZERO);
    assert_eq!(settled.status, InvoiceStatus::Paid);

    // Nothing left to pay
    assert!(matches!(
        ledger.record_payment(&invoice.id, d("0.01")),
        Err(LedgerError::InvalidPayment(_))
    ));
    assert_eq!(clinic.db.list_payments(&invoice.id).unwrap().len(), 2);
}

#[test]
fn test_exhausted_entitlement_leaves_no_record() {
    let clinic = clinic();
    buy_package(&clinic, &clinic.backpain, 1);
    let ledger = Ledger::new(&clinic.db);

    ledger
        .schedule_session(&clinic.patient.id, &clinic.backpain.id, date(2), time(10))
        .unwrap();
    let before = ledger.sessions_for_patient(&clinic.patient.id).unwrap();

    let result =
        ledger.schedule_session(&clinic.patient.id, &clinic.backpain.id, date(3), time(10));
    assert!(matches!(result, Err(LedgerError::NoEntitlement(_))));

    let after = ledger.sessions_for_patient(&clinic.patient.id).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_partially_paid_invoice_grants_full_entitlement() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let mut request = NewInvoice::new(&clinic.patient.id, date(1))
        .with_item(NewLineItem::new(&clinic.backpain.id, 2, 3));
    request.initial_payment = d("1");
    ledger.generate_invoice(&request).unwrap();

    let balance = ledger
        .therapy_balance(&clinic.patient.id, &clinic.backpain.id, date(1))
        .unwrap();
    assert_eq!(balance.total_days, 6);
}

#[test]
fn test_unpaid_invoice_only_gives_nothing() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let request = NewInvoice::new(&clinic.patient.id, date(1))
        .with_item(NewLineItem::new(&clinic.backpain.id, 1, 10));
    ledger.generate_invoice(&request).unwrap();

    assert!(ledger
        .available_therapies(&clinic.patient.id, date(15))
        .unwrap()
        .is_empty());
}

#[test]
fn test_deactivated_type_hidden_but_history_kept() {
    let clinic = clinic();
    let tens = TherapyType::new("TENS".to_string(), d("200"));
    clinic.db.insert_therapy_type(&tens).unwrap();
    buy_package(&clinic, &clinic.backpain, 5);
    buy_package(&clinic, &tens, 5);

    let ledger = Ledger::new(&clinic.db);
    ledger
        .schedule_session(&clinic.patient.id, &tens.id, date(2), time(9))
        .unwrap();
    clinic
        .db
        .set_therapy_status(&tens.id, TherapyStatus::Inactive)
        .unwrap();

    let available = ledger.available_therapies(&clinic.patient.id, date(15)).unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].therapy_type_id, clinic.backpain.id);
    // TENS usage never leaks into Backpain
    assert_eq!(available[0].used_days, 0);

    let balances = ledger.therapy_balances(&clinic.patient.id, date(15)).unwrap();
    let tens_balance = balances
        .iter()
        .find(|b| b.therapy_type_id == tens.id)
        .unwrap();
    assert_eq!(tens_balance.used_days, 1);
    assert_eq!(tens_balance.remaining_days, 4);
}

#[test]
fn test_available_therapies_idempotent() {
    let clinic = clinic();
    buy_package(&clinic, &clinic.backpain, 4);
    let ledger = Ledger::new(&clinic.db);
    ledger
        .schedule_session(&clinic.patient.id, &clinic.backpain.id, date(3), time(9))
        .unwrap();

    let first = ledger.available_therapies(&clinic.patient.id, date(15)).unwrap();
    let second = ledger.available_therapies(&clinic.patient.id, date(15)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_usage_counted_as_of_reference_date() {
    let clinic = clinic();
    buy_package(&clinic, &clinic.backpain, 5);
    let ledger = Ledger::new(&clinic.db);

    for day in [2, 10, 20] {
        ledger
            .schedule_session(&clinic.patient.id, &clinic.backpain.id, date(day), time(9))
            .unwrap();
    }

    let early = ledger
        .therapy_balance(&clinic.patient.id, &clinic.backpain.id, date(10))
        .unwrap();
    assert_eq!(early.used_days, 2);
    assert_eq!(early.remaining_days, 3);

    let late = ledger
        .therapy_balance(&clinic.patient.id, &clinic.backpain.id, date(31))
        .unwrap();
    assert_eq!(late.remaining_days, 2);
}

#[test]
fn test_deleting_invoice_withdraws_entitlement() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let mut request = NewInvoice::new(&clinic.patient.id, date(1))
        .with_item(NewLineItem::new(&clinic.backpain.id, 1, 3));
    request.initial_payment = d("1500");
    let invoice = ledger.generate_invoice(&request).unwrap().invoice;
    assert_eq!(
        ledger.available_therapies(&clinic.patient.id, date(15)).unwrap().len(),
        1
    );

    ledger.delete_invoice(&invoice.id).unwrap();
    assert!(ledger
        .available_therapies(&clinic.patient.id, date(15))
        .unwrap()
        .is_empty());
    assert!(clinic.db.list_payments(&invoice.id).unwrap().is_empty());
}

#[test]
fn test_dues_roll_up_across_patients() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let other = Patient::new("Bilal Khan".to_string());
    clinic.db.insert_patient(&other).unwrap();
    let idle = Patient::new("Chen Wei".to_string());
    clinic.db.insert_patient(&idle).unwrap();

    let mut first = NewInvoice::new(&clinic.patient.id, date(14))
        .with_item(NewLineItem::new(&clinic.backpain.id, 1, 2));
    first.initial_payment = d("250.50");
    ledger.generate_invoice(&first).unwrap();

    let second = NewInvoice::new(&other.id, date(15))
        .with_item(NewLineItem::new(&clinic.backpain.id, 1, 3));
    ledger.generate_invoice(&second).unwrap();

    let totals = ledger.dashboard_dues(date(15)).unwrap();
    assert_eq!(totals.total_due, d("2249.50"));
    assert_eq!(totals.reference_date_due, d("1500"));
    assert_eq!(totals.reference_date_count, 1);

    assert_eq!(
        ledger.patient_due_total(&clinic.patient.id).unwrap(),
        d("749.50")
    );
    assert_eq!(ledger.patient_due_total(&idle.id).unwrap(), Decimal::ZERO);

    let top = ledger.top_due_patients(Some(2)).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].patient_id, other.id);
    assert_eq!(top[1].patient_id, clinic.patient.id);
}

#[test]
fn test_invoice_numbers_are_per_day_sequences() {
    let clinic = clinic();
    let ledger = Ledger::new(&clinic.db);

    let mut numbers = Vec::new();
    for day in [5, 5, 6] {
        let request = NewInvoice::new(&clinic.patient.id, date(day))
            .with_item(NewLineItem::new(&clinic.backpain.id, 1, 1));
        numbers.push(ledger.generate_invoice(&request).unwrap().invoice.invoice_number);
    }

    assert_eq!(
        numbers,
        vec!["INV-20240305-0001", "INV-20240305-0002", "INV-20240306-0001"]
    );
}

#[test]
fn test_on_disk_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let patient_id;
    let therapy_id;
    {
        let db = Database::open(&path).unwrap();
        let patient = Patient::new("Asha Rao".to_string());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("Backpain".to_string(), d("500"));
        db.insert_therapy_type(&therapy).unwrap();

        let mut request = NewInvoice::new(&patient.id, date(1))
            .with_item(NewLineItem::new(&therapy.id, 1, 2));
        request.initial_payment = d("1000");
        Ledger::new(&db).generate_invoice(&request).unwrap();

        patient_id = patient.id;
        therapy_id = therapy.id;
    }

    let db = Database::open(&path).unwrap();
    let balance = Ledger::new(&db)
        .therapy_balance(&patient_id, &therapy_id, date(15))
        .unwrap();
    assert_eq!(balance.remaining_days, 2);
}
