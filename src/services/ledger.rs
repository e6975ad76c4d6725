//! Ledger engine: balances, groupings and payment application over work
//! entries.
//!
//! Everything in here is pure. Callers load entries from a
//! [`WorkEntryStore`](crate::repositories::WorkEntryStore), hand them to these
//! functions and persist whatever comes back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    entities::work_entry::{Model as WorkEntry, PaymentStatus},
    errors::ServiceError,
    models::{Item, PaymentMode, VehicleNo},
    services::calendar::{weekday_name, Calendar, DateWindow},
};

/// Placeholder shown for empty display fields.
pub const MISSING_FIELD: &str = "-";

/// `total - paid_amount` of a single entry.
pub fn compute_remaining(entry: &WorkEntry) -> Decimal {
    entry.remaining()
}

/// Sum that pins at `Decimal::MAX`/`Decimal::MIN` instead of overflowing.
pub fn saturating_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

/// Display projection of an entry with every optional field filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: Uuid,
    pub name: String,
    pub sqft: Option<String>,
    pub item: String,
    pub from: String,
    pub party_to: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub mal_plus: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub kating: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    pub payment_mode: String,
    pub vehicle_no: String,
}

/// An entry together with its outstanding balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    #[serde(flatten)]
    pub entry: EntryView,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
}

/// Entries of a date range with running sums.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotals {
    pub entries: Vec<LedgerLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_remaining: Decimal,
}

/// Result of [`Ledger::aggregate_range`]. `NoEntries` is kept apart from a
/// zero balance so callers can tell "nothing recorded" from "all settled".
#[derive(Debug, Clone, PartialEq)]
pub enum RangeAggregate {
    NoEntries,
    Entries(RangeTotals),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub day: &'static str,
    pub entries: Vec<LedgerLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLedger {
    pub name: String,
    pub entries: Vec<LedgerLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRemaining {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
}

/// Portion of a bulk payment assigned to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSlice {
    pub entry_id: Uuid,
    pub amount: Decimal,
}

/// Ledger projections bound to a business calendar and display defaults.
#[derive(Debug, Clone)]
pub struct Ledger {
    calendar: Calendar,
    default_origin: String,
}

impl Ledger {
    pub fn new(calendar: Calendar, default_origin: impl Into<String>) -> Self {
        Self {
            calendar,
            default_origin: default_origin.into(),
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn default_origin(&self) -> &str {
        &self.default_origin
    }

    /// Fills in the display defaults shared by every report.
    pub fn view(&self, entry: &WorkEntry) -> EntryView {
        EntryView {
            id: entry.id,
            name: entry.name.clone(),
            sqft: entry.sqft.clone(),
            item: or_placeholder(Some(&entry.item), MISSING_FIELD),
            from: or_placeholder(entry.from_site.as_deref(), &self.default_origin),
            party_to: or_placeholder(entry.party_to.as_deref(), MISSING_FIELD),
            mal_plus: entry.mal_plus,
            kating: entry.kating,
            total: entry.total,
            date: entry.date,
            payment_status: entry.payment_status,
            paid_amount: entry.paid_amount,
            payment_mode: or_placeholder(entry.payment_mode.as_deref(), MISSING_FIELD),
            vehicle_no: or_placeholder(entry.vehicle_no.as_deref(), MISSING_FIELD),
        }
    }

    pub fn line(&self, entry: &WorkEntry) -> LedgerLine {
        LedgerLine {
            entry: self.view(entry),
            remaining_amount: compute_remaining(entry),
        }
    }

    /// Date-ordered lines with per-entry balances and range totals.
    ///
    /// `entries` must already be narrowed to the window and filters of the
    /// report being built.
    pub fn aggregate_range(&self, entries: &[WorkEntry]) -> RangeAggregate {
        if entries.is_empty() {
            return RangeAggregate::NoEntries;
        }

        let mut total_amount = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;
        let lines = sorted_by_date(entries)
            .into_iter()
            .map(|entry| {
                total_amount = total_amount.saturating_add(entry.total);
                total_paid = total_paid.saturating_add(entry.paid_amount);
                self.line(entry)
            })
            .collect();

        RangeAggregate::Entries(RangeTotals {
            entries: lines,
            total_amount,
            total_paid,
            total_remaining: total_amount.saturating_sub(total_paid),
        })
    }

    /// Seven buckets, one per local day of the week starting at
    /// `window.start`, including days without entries. Entries outside the
    /// week are ignored.
    pub fn group_by_calendar_day(&self, entries: &[WorkEntry], window: &DateWindow) -> Vec<DayBucket> {
        let days = self.calendar.days_of_week(window);
        let mut buckets: Vec<DayBucket> = days
            .iter()
            .map(|&date| DayBucket {
                date,
                day: weekday_name(date),
                entries: Vec::new(),
            })
            .collect();

        for entry in sorted_by_date(entries) {
            let local = self.calendar.local_date(entry.date);
            if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.date == local) {
                bucket.entries.push(self.line(entry));
            }
        }

        buckets
    }

    /// Every entry grouped under its customer name, names in ascending order.
    pub fn group_by_user(&self, entries: &[WorkEntry]) -> Vec<UserLedger> {
        let mut users: BTreeMap<&str, Vec<LedgerLine>> = BTreeMap::new();
        for entry in sorted_by_date(entries) {
            users
                .entry(entry.name.as_str())
                .or_default()
                .push(self.line(entry));
        }

        users
            .into_iter()
            .map(|(name, entries)| UserLedger {
                name: name.to_string(),
                entries,
            })
            .collect()
    }
}

/// One row per customer with the sum of their balances. Customers whose sum
/// is zero or less are left out.
pub fn aggregate_remaining_by_user(entries: &[WorkEntry]) -> Vec<UserRemaining> {
    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for entry in entries {
        let sum = sums.entry(entry.name.as_str()).or_insert(Decimal::ZERO);
        *sum = sum.saturating_add(compute_remaining(entry));
    }

    sums.into_iter()
        .filter(|(_, remaining)| *remaining > Decimal::ZERO)
        .map(|(name, remaining_amount)| UserRemaining {
            name: name.to_string(),
            remaining_amount,
        })
        .collect()
}

/// Applies `amount` to a single entry and returns the updated record.
///
/// Rejects missing, non-positive and over-balance amounts without touching
/// the entry. On success the stored item, payment mode and vehicle are
/// re-normalized, the payment is added to `paid_amount`, and the entry flips
/// to `Paid` (settled in cash unless a mode is recorded) once fully covered.
pub fn apply_payment(entry: &WorkEntry, amount: Option<Decimal>) -> Result<WorkEntry, ServiceError> {
    let amount = amount
        .ok_or_else(|| ServiceError::InvalidAmount("payment amount is required".to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "payment amount must be greater than zero, got {}",
            amount
        )));
    }

    let remaining = compute_remaining(entry);
    if amount > remaining {
        return Err(ServiceError::InvalidAmount(format!(
            "payment of {} exceeds remaining balance of {}",
            amount, remaining
        )));
    }

    let paid_amount = entry.paid_amount.checked_add(amount).ok_or_else(|| {
        ServiceError::InvalidAmount(format!("payment of {} overflows the paid amount", amount))
    })?;

    let mut updated = entry.clone();
    updated.item = Item::normalize_or_first(&entry.item).to_string();
    updated.vehicle_no = Some(VehicleNo::normalize(entry.vehicle_no.as_deref()).to_string());
    updated.paid_amount = paid_amount;
    if updated.paid_amount >= updated.total {
        updated.payment_status = PaymentStatus::Paid;
    }
    updated.payment_mode = match (&entry.payment_mode, updated.payment_status) {
        (Some(mode), _) => Some(PaymentMode::normalize(Some(mode.as_str())).to_string()),
        (None, PaymentStatus::Paid) => Some(PaymentMode::Cash.to_string()),
        (None, PaymentStatus::Unpaid) => None,
    };
    Ok(updated)
}

/// Splits `amount` over `entries`, oldest first, never assigning an entry
/// more than its own balance.
///
/// Fails when `amount` is not positive or exceeds the combined balance.
pub fn allocate_payment(
    entries: &[WorkEntry],
    amount: Decimal,
) -> Result<Vec<PaymentSlice>, ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(format!(
            "payment amount must be greater than zero, got {}",
            amount
        )));
    }

    let pending: Vec<&WorkEntry> = sorted_by_date(entries)
        .into_iter()
        .filter(|entry| compute_remaining(entry) > Decimal::ZERO)
        .collect();
    let outstanding = saturating_sum(pending.iter().map(|entry| compute_remaining(entry)));
    if amount > outstanding {
        return Err(ServiceError::InvalidAmount(format!(
            "payment of {} exceeds total remaining balance of {}",
            amount, outstanding
        )));
    }

    let mut left = amount;
    let mut slices = Vec::new();
    for entry in pending {
        if left <= Decimal::ZERO {
            break;
        }
        let slice = left.min(compute_remaining(entry));
        slices.push(PaymentSlice {
            entry_id: entry.id,
            amount: slice,
        });
        left = left.saturating_sub(slice);
    }
    Ok(slices)
}

fn sorted_by_date(entries: &[WorkEntry]) -> Vec<&WorkEntry> {
    let mut sorted: Vec<&WorkEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.date);
    sorted
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{at, entry};
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(Calendar::utc(), "KGN")
    }

    #[test]
    fn payment_sequence_from_worked_example() {
        let mut e = entry("Ramesh", dec!(700), dec!(0), at(2024, 6, 11, 9));
        e.mal_plus = dec!(500);
        e.kating = dec!(200);

        let e = apply_payment(&e, Some(dec!(300))).unwrap();
        assert_eq!(compute_remaining(&e), dec!(400));
        assert_eq!(e.payment_status, PaymentStatus::Unpaid);

        let err = apply_payment(&e, Some(dec!(500))).unwrap_err();
        assert_matches!(err, ServiceError::InvalidAmount(_));
        assert_eq!(e.paid_amount, dec!(300));

        let e = apply_payment(&e, Some(dec!(400))).unwrap();
        assert_eq!(e.paid_amount, dec!(700));
        assert_eq!(e.total, dec!(700));
        assert_eq!(e.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn payment_rejects_missing_and_non_positive_amounts() {
        let e = entry("Ramesh", dec!(100), dec!(0), at(2024, 6, 11, 9));
        assert_matches!(apply_payment(&e, None), Err(ServiceError::InvalidAmount(_)));
        assert_matches!(
            apply_payment(&e, Some(dec!(0))),
            Err(ServiceError::InvalidAmount(_))
        );
        assert_matches!(
            apply_payment(&e, Some(dec!(-5))),
            Err(ServiceError::InvalidAmount(_))
        );
    }

    #[test]
    fn payment_repairs_legacy_item_values() {
        let mut e = entry("Ramesh", dec!(100), dec!(0), at(2024, 6, 11, 9));
        e.item = "crush".to_string();
        assert_eq!(apply_payment(&e, Some(dec!(10))).unwrap().item, "Crush");

        e.item = "cement".to_string();
        assert_eq!(apply_payment(&e, Some(dec!(10))).unwrap().item, "Reti");
    }

    #[test]
    fn payment_repairs_legacy_vehicle_and_mode() {
        let mut e = entry("Ramesh", dec!(100), dec!(0), at(2024, 6, 11, 9));
        e.vehicle_no = Some("K999".to_string());
        e.payment_mode = Some("cheque".to_string());
        let partial = apply_payment(&e, Some(dec!(10))).unwrap();
        assert_eq!(partial.vehicle_no.as_deref(), Some("K101"));
        assert_eq!(partial.payment_mode.as_deref(), Some("Cash"));

        e.vehicle_no = Some("k102".to_string());
        e.payment_mode = Some("online".to_string());
        let partial = apply_payment(&e, Some(dec!(10))).unwrap();
        assert_eq!(partial.vehicle_no.as_deref(), Some("K102"));
        assert_eq!(partial.payment_mode.as_deref(), Some("Online"));

        e.vehicle_no = None;
        e.payment_mode = None;
        let partial = apply_payment(&e, Some(dec!(10))).unwrap();
        assert_eq!(partial.vehicle_no.as_deref(), Some("K101"));
        assert_eq!(partial.payment_mode, None);

        let settled = apply_payment(&e, Some(dec!(100))).unwrap();
        assert_eq!(settled.payment_status, PaymentStatus::Paid);
        assert_eq!(settled.payment_mode.as_deref(), Some("Cash"));
    }

    #[test]
    fn sums_near_the_decimal_limit_saturate() {
        let huge = vec![
            entry("A", Decimal::MAX, dec!(0), at(2024, 6, 10, 9)),
            entry("A", Decimal::MAX, dec!(0), at(2024, 6, 11, 9)),
        ];
        let totals = assert_matches!(
            ledger().aggregate_range(&huge),
            RangeAggregate::Entries(t) => t
        );
        assert_eq!(totals.total_amount, Decimal::MAX);
        assert_eq!(totals.total_remaining, Decimal::MAX);

        let rows = aggregate_remaining_by_user(&huge);
        assert_eq!(rows[0].remaining_amount, Decimal::MAX);

        let slices = allocate_payment(&huge, Decimal::MAX).unwrap();
        assert_eq!(slices.len(), 1);
    }

    #[test]
    fn remaining_of_corrupt_rows_does_not_overflow() {
        let mut e = entry("A", Decimal::MAX, dec!(0), at(2024, 6, 10, 9));
        e.paid_amount = Decimal::MIN;
        assert_eq!(compute_remaining(&e), Decimal::MAX);

        let paid = apply_payment(&e, Some(dec!(1))).unwrap();
        assert_eq!(paid.paid_amount, Decimal::MIN + dec!(1));
        assert_eq!(paid.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn aggregate_range_distinguishes_empty_from_settled() {
        assert_eq!(ledger().aggregate_range(&[]), RangeAggregate::NoEntries);

        let settled = vec![entry("A", dec!(50), dec!(50), at(2024, 6, 11, 9))];
        let totals = assert_matches!(
            ledger().aggregate_range(&settled),
            RangeAggregate::Entries(t) => t
        );
        assert_eq!(totals.total_remaining, dec!(0));
        assert_eq!(totals.entries.len(), 1);
    }

    #[test]
    fn aggregate_range_orders_by_date_and_sums() {
        let entries = vec![
            entry("A", dec!(300), dec!(100), at(2024, 6, 12, 9)),
            entry("A", dec!(200), dec!(0), at(2024, 6, 10, 9)),
        ];
        let totals = assert_matches!(
            ledger().aggregate_range(&entries),
            RangeAggregate::Entries(t) => t
        );
        assert_eq!(totals.entries[0].entry.date, at(2024, 6, 10, 9));
        assert_eq!(totals.entries[0].remaining_amount, dec!(200));
        assert_eq!(totals.entries[1].remaining_amount, dec!(200));
        assert_eq!(totals.total_amount, dec!(500));
        assert_eq!(totals.total_paid, dec!(100));
        assert_eq!(totals.total_remaining, dec!(400));
    }

    #[test]
    fn day_wise_grouping_always_has_seven_buckets() {
        let ledger = ledger();
        let week = ledger.calendar().monday_anchored_week(at(2024, 6, 11, 0).date_naive());
        let wednesday = vec![
            entry("A", dec!(10), dec!(0), at(2024, 6, 12, 8)),
            entry("B", dec!(20), dec!(5), at(2024, 6, 12, 17)),
        ];

        let buckets = ledger.group_by_calendar_day(&wednesday, &week);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].day, "Monday");
        assert_eq!(buckets[6].day, "Sunday");
        assert_eq!(buckets.iter().filter(|b| b.entries.is_empty()).count(), 6);
        assert_eq!(buckets[2].entries.len(), 2);
        assert_eq!(buckets[2].entries[1].remaining_amount, dec!(15));
    }

    #[test]
    fn day_wise_lines_carry_display_defaults() {
        let ledger = ledger();
        let week = ledger.calendar().monday_anchored_week(at(2024, 6, 11, 0).date_naive());
        let mut e = entry("A", dec!(10), dec!(0), at(2024, 6, 10, 8));
        e.vehicle_no = None;

        let buckets = ledger.group_by_calendar_day(&[e], &week);
        let line = &buckets[0].entries[0].entry;
        assert_eq!(line.from, "KGN");
        assert_eq!(line.party_to, "-");
        assert_eq!(line.payment_mode, "-");
        assert_eq!(line.vehicle_no, "-");
    }

    #[test]
    fn group_by_user_keeps_settled_entries() {
        let entries = vec![
            entry("Suresh", dec!(10), dec!(10), at(2024, 6, 12, 8)),
            entry("Amit", dec!(30), dec!(0), at(2024, 6, 14, 8)),
            entry("Amit", dec!(20), dec!(0), at(2024, 6, 13, 8)),
        ];
        let users = ledger().group_by_user(&entries);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Amit");
        assert_eq!(users[0].entries[0].entry.total, dec!(20));
        assert_eq!(users[1].entries[0].remaining_amount, dec!(0));
    }

    #[test]
    fn remaining_by_user_drops_settled_customers() {
        let entries = vec![
            entry("Settled", dec!(100), dec!(100), at(2024, 6, 10, 8)),
            entry("Partly", dec!(100), dec!(100), at(2024, 6, 10, 8)),
            entry("Partly", dec!(80), dec!(30), at(2024, 6, 11, 8)),
        ];
        let rows = aggregate_remaining_by_user(&entries);
        assert_eq!(
            rows,
            vec![UserRemaining {
                name: "Partly".into(),
                remaining_amount: dec!(50)
            }]
        );
    }

    #[test]
    fn allocation_consumes_oldest_entries_first() {
        let newest = entry("A", dec!(100), dec!(0), at(2024, 6, 14, 8));
        let oldest = entry("A", dec!(50), dec!(20), at(2024, 6, 10, 8));
        let settled = entry("A", dec!(40), dec!(40), at(2024, 6, 9, 8));

        let slices =
            allocate_payment(&[newest.clone(), oldest.clone(), settled], dec!(60)).unwrap();
        assert_eq!(
            slices,
            vec![
                PaymentSlice {
                    entry_id: oldest.id,
                    amount: dec!(30)
                },
                PaymentSlice {
                    entry_id: newest.id,
                    amount: dec!(30)
                },
            ]
        );
    }

    #[test]
    fn allocation_rejects_overpayment() {
        let e = entry("A", dec!(100), dec!(0), at(2024, 6, 14, 8));
        assert_matches!(
            allocate_payment(&[e], dec!(100.01)),
            Err(ServiceError::InvalidAmount(_))
        );
    }
}
