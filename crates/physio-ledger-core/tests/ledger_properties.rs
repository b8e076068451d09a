//! Property tests for money arithmetic and entitlement conservation.

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use physio_ledger_core::db::Database;
use physio_ledger_core::ledger::{
    compute_invoice_totals, derive_status, resolve_balances, EntitlementGrant, Ledger,
    LedgerError, LineInput, SessionUsage,
};
use physio_ledger_core::models::{InvoiceStatus, NewInvoice, NewLineItem, Patient, TherapyType};
use physio_ledger_core::money::round2;

/// Amount in cents as a 2 dp decimal.
fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

proptest! {
    /// Totals follow the formulas exactly and never go negative.
    #[test]
    fn totals_consistent(
        lines in proptest::collection::vec((0i64..100_000, 1i64..5, 1i64..15), 1..6),
        invoice_discount in 0i64..200_000,
    ) {
        let therapy = TherapyType::new("Backpain".to_string(), Decimal::ZERO);
        let inputs: Vec<LineInput<'_>> = lines
            .iter()
            .map(|&(price, quantity, days)| LineInput {
                therapy: &therapy,
                quantity,
                days,
                unit_price: cents(price),
                discount_amount: Decimal::ZERO,
            })
            .collect();

        let totals = compute_invoice_totals(&inputs, cents(invoice_discount)).unwrap();

        let expected_subtotal: Decimal = lines
            .iter()
            .map(|&(price, quantity, days)| cents(price) * Decimal::from(quantity * days))
            .sum();
        prop_assert_eq!(totals.subtotal, expected_subtotal);
        prop_assert!(totals.total_amount >= Decimal::ZERO);
        prop_assert_eq!(
            totals.total_amount,
            (totals.subtotal - totals.total_discount).max(Decimal::ZERO)
        );
        prop_assert_eq!(totals.total_amount, round2(totals.total_amount));
    }

    /// Any sequence of accepted payments keeps paid + due == total and the
    /// status in line with the amounts.
    #[test]
    fn payments_preserve_balance(
        days in 1i64..10,
        payments in proptest::collection::vec(1i64..40_000, 1..12),
    ) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Asha Rao".to_string());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("Backpain".to_string(), Decimal::from(500));
        db.insert_therapy_type(&therapy).unwrap();

        let ledger = Ledger::new(&db);
        let request = NewInvoice::new(&patient.id, date(1))
            .with_item(NewLineItem::new(&therapy.id, 1, days));
        let mut invoice = ledger.generate_invoice(&request).unwrap().invoice;

        for amount in payments {
            match ledger.record_payment(&invoice.id, cents(amount)) {
                Ok(updated) => invoice = updated,
                Err(LedgerError::InvalidPayment(_)) => {
                    prop_assert!(cents(amount) > invoice.due_amount);
                }
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }

            prop_assert!(invoice.due_amount >= Decimal::ZERO);
            prop_assert_eq!(invoice.paid_amount + invoice.due_amount, invoice.total_amount);
            prop_assert_eq!(invoice.status, derive_status(invoice.paid_amount, invoice.total_amount));
            if invoice.due_amount == Decimal::ZERO {
                prop_assert_eq!(invoice.status, InvoiceStatus::Paid);
            }
        }
    }

    /// remaining == total - used for every type, and used only counts
    /// sessions dated on or before the reference date.
    #[test]
    fn entitlement_conservation(
        grants in proptest::collection::vec((0usize..3, 1i64..20), 0..6),
        usages in proptest::collection::vec((0usize..4, 1u32..29), 0..20),
        as_of in 1u32..29,
    ) {
        let ids = ["backpain", "tens", "ultrasound", "cupping"];
        let grants: Vec<EntitlementGrant> = grants
            .iter()
            .map(|&(i, days)| EntitlementGrant { therapy_type_id: ids[i].to_string(), days })
            .collect();
        let usages: Vec<SessionUsage> = usages
            .iter()
            .map(|&(i, day)| SessionUsage { therapy_type_id: ids[i].to_string(), therapy_date: date(day) })
            .collect();

        let balances = resolve_balances(&grants, &usages, date(as_of));
        for balance in &balances {
            let total: i64 = grants
                .iter()
                .filter(|g| g.therapy_type_id == balance.therapy_type_id)
                .map(|g| g.days)
                .sum();
            let used = usages
                .iter()
                .filter(|u| u.therapy_type_id == balance.therapy_type_id && u.therapy_date <= date(as_of))
                .count() as i64;
            prop_assert_eq!(balance.total_days, total);
            prop_assert_eq!(balance.used_days, used);
            prop_assert_eq!(balance.remaining_days, total - used);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Scheduling then deleting a session returns the balance to exactly
    /// where it was.
    #[test]
    fn schedule_delete_round_trip(days in 1i64..6, booked in 0usize..5) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Asha Rao".to_string());
        db.insert_patient(&patient).unwrap();
        let therapy = TherapyType::new("Backpain".to_string(), Decimal::from(500));
        db.insert_therapy_type(&therapy).unwrap();

        let ledger = Ledger::new(&db);
        let mut request = NewInvoice::new(&patient.id, date(1))
            .with_item(NewLineItem::new(&therapy.id, 1, days));
        request.initial_payment = Decimal::from(500 * days);
        ledger.generate_invoice(&request).unwrap();

        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        for day in 0..booked.min(days as usize - 1) {
            ledger.schedule_session(&patient.id, &therapy.id, date(2 + day as u32), nine).unwrap();
        }

        let before = ledger.therapy_balance(&patient.id, &therapy.id, date(28)).unwrap();
        prop_assert!(before.remaining_days > 0);

        let record = ledger.schedule_session(&patient.id, &therapy.id, date(20), nine).unwrap();
        let during = ledger.therapy_balance(&patient.id, &therapy.id, date(28)).unwrap();
        prop_assert_eq!(during.remaining_days, before.remaining_days - 1);

        ledger.delete_session(&record.id).unwrap();
        let after = ledger.therapy_balance(&patient.id, &therapy.id, date(28)).unwrap();
        prop_assert_eq!(before, after);
    }
}
