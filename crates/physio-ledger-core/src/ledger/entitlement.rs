//! Therapy entitlement resolution.
//!
//! A paid or partially paid invoice line grants `quantity * days`
//! session-days of its therapy type. Each session record dated on or before
//! the reference date consumes one. The difference is what the patient can
//! still be scheduled for.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerResult};
use crate::models::{InvoiceLineItem, TherapySessionRecord, TherapyType};

/// Session-days granted by one qualifying line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitlementGrant {
    pub therapy_type_id: String,
    pub days: i64,
}

impl From<&InvoiceLineItem> for EntitlementGrant {
    fn from(item: &InvoiceLineItem) -> Self {
        Self {
            therapy_type_id: item.therapy_type_id.clone(),
            days: item.entitled_days(),
        }
    }
}

/// One consumed session-day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUsage {
    pub therapy_type_id: String,
    pub therapy_date: NaiveDate,
}

impl From<&TherapySessionRecord> for SessionUsage {
    fn from(record: &TherapySessionRecord) -> Self {
        Self {
            therapy_type_id: record.therapy_type_id.clone(),
            therapy_date: record.therapy_date,
        }
    }
}

/// Derived balance for one (patient, therapy type) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TherapyBalance {
    pub therapy_type_id: String,
    pub total_days: i64,
    pub used_days: i64,
    /// `total_days - used_days`; negative when usage ran past entitlement
    pub remaining_days: i64,
}

/// A therapy type the patient can still be scheduled for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableTherapy {
    pub therapy_type_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub total_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

/// Group grants and usages by therapy type.
///
/// Usages dated after `as_of` are ignored. A usage for a type without any
/// grant still gets a row (zero total, negative remainder) so history is
/// never lost. Rows are ordered by therapy type id.
pub fn resolve_balances(
    grants: &[EntitlementGrant],
    usages: &[SessionUsage],
    as_of: NaiveDate,
) -> Vec<TherapyBalance> {
    let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();

    for grant in grants {
        let entry = totals.entry(grant.therapy_type_id.as_str()).or_default();
        entry.0 = entry.0.saturating_add(grant.days);
    }
    for usage in usages.iter().filter(|u| u.therapy_date <= as_of) {
        totals.entry(usage.therapy_type_id.as_str()).or_default().1 += 1;
    }

    totals
        .into_iter()
        .map(|(therapy_type_id, (total_days, used_days))| TherapyBalance {
            therapy_type_id: therapy_type_id.to_string(),
            total_days,
            used_days,
            remaining_days: total_days.saturating_sub(used_days),
        })
        .collect()
}

/// Keep balances with days left whose therapy type is in `catalog` and
/// active, annotated with catalog attributes. Sorted by name, then id.
pub fn available_from(balances: &[TherapyBalance], catalog: &[TherapyType]) -> Vec<AvailableTherapy> {
    let by_id: BTreeMap<&str, &TherapyType> =
        catalog.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut available: Vec<AvailableTherapy> = balances
        .iter()
        .filter(|b| b.remaining_days > 0)
        .filter_map(|b| {
            let therapy = by_id.get(b.therapy_type_id.as_str())?;
            if !therapy.is_active() {
                return None;
            }
            Some(AvailableTherapy {
                therapy_type_id: b.therapy_type_id.clone(),
                name: therapy.name.clone(),
                description: therapy.description.clone(),
                price: therapy.price,
                total_days: b.total_days,
                used_days: b.used_days,
                remaining_days: b.remaining_days,
            })
        })
        .collect();

    available.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.therapy_type_id.cmp(&b.therapy_type_id))
    });
    available
}

impl<'a> Ledger<'a> {
    /// Full balance table for a patient as of a date, including inactive
    /// types and exhausted balances.
    pub fn therapy_balances(
        &self,
        patient_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<Vec<TherapyBalance>> {
        let grants: Vec<EntitlementGrant> = self
            .db
            .list_entitling_items(patient_id)?
            .iter()
            .map(EntitlementGrant::from)
            .collect();
        let usages: Vec<SessionUsage> = self
            .db
            .list_sessions_until(patient_id, as_of)?
            .iter()
            .map(SessionUsage::from)
            .collect();

        let balances = resolve_balances(&grants, &usages, as_of);
        tracing::debug!(
            patient_id,
            %as_of,
            grants = grants.len(),
            usages = usages.len(),
            types = balances.len(),
            "resolved therapy balances"
        );
        Ok(balances)
    }

    /// Therapy types the patient can still be scheduled for as of a date.
    ///
    /// Empty when the patient has no paid or partially paid invoices. Only
    /// sessions dated on or before `as_of` are counted here, while
    /// [`Ledger::schedule_session`] counts every booked session for the pair.
    /// A therapy listed here can therefore still be refused when later-dated
    /// bookings already use up its days.
    pub fn available_therapies(
        &self,
        patient_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<Vec<AvailableTherapy>> {
        let balances = self.therapy_balances(patient_id, as_of)?;
        if balances.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = self.db.list_therapy_types(true)?;
        Ok(available_from(&balances, &catalog))
    }

    /// Balance for a single (patient, therapy type) pair.
    pub fn therapy_balance(
        &self,
        patient_id: &str,
        therapy_type_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<TherapyBalance> {
        let balance = self
            .therapy_balances(patient_id, as_of)?
            .into_iter()
            .find(|b| b.therapy_type_id == therapy_type_id)
            .unwrap_or_else(|| TherapyBalance {
                therapy_type_id: therapy_type_id.to_string(),
                total_days: 0,
                used_days: 0,
                remaining_days: 0,
            });
        Ok(balance)
    }
}
