//! Read-side report views over work entries.
//!
//! Every report loads its entries through the store, hands them to the
//! [`Ledger`] and projects the result into the shape its endpoint returns.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    entities::work_entry::Model as WorkEntry,
    errors::ServiceError,
    models::VehicleNo,
    repositories::{DateOrder, EntryFilter, WorkEntryStore},
    services::{
        calendar::{Calendar, DateWindow},
        ledger::{
            aggregate_remaining_by_user, compute_remaining, DayBucket, EntryView, Ledger,
            LedgerLine, RangeAggregate, RangeTotals, UserLedger, UserRemaining,
        },
        work_entries::pending_filter,
    },
};

/// Which days a by-name report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRange {
    /// The week closing on this Sunday.
    WeekEnding(NaiveDate),
    /// Explicit inclusive day range.
    Days { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NameReport {
    Found(NameTotals),
    Empty(EmptyReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameTotals {
    pub user_name: String,
    #[serde(flatten)]
    pub totals: RangeTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyReport {
    pub entries: Vec<LedgerLine>,
    pub message: String,
}

/// Entry row of the all-users weekly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnpaidLine {
    #[serde(flatten)]
    pub entry: EntryView,
    #[serde(with = "rust_decimal::serde::float")]
    pub unpaid_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SundayLine {
    pub id: Uuid,
    pub name: String,
    pub party_to: String,
    pub date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleLine {
    pub name: String,
    pub from: String,
    pub party_to: String,
    pub vehicle_no: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginLine {
    pub sr_no: usize,
    pub from: String,
    pub sqft: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn WorkEntryStore>,
    ledger: Ledger,
}

impl ReportService {
    pub fn new(store: Arc<dyn WorkEntryStore>, ledger: Ledger) -> Self {
        Self { store, ledger }
    }

    pub fn calendar(&self) -> &Calendar {
        self.ledger.calendar()
    }

    pub fn default_origin(&self) -> &str {
        self.ledger.default_origin()
    }

    /// One customer's entries for a week or day range, with totals.
    #[instrument(skip(self))]
    pub async fn by_name(&self, name: &str, range: ReportRange) -> Result<NameReport, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("User name is required".to_string()));
        }

        let (window, empty_message) = match range {
            ReportRange::WeekEnding(sunday) => (
                self.calendar().sunday_anchored_week(sunday),
                "No entries found for this week",
            ),
            ReportRange::Days { from, to } => {
                if from > to {
                    return Err(ServiceError::ValidationError(format!(
                        "fromDate {} is after toDate {}",
                        from, to
                    )));
                }
                (
                    self.calendar().day_range(from, to),
                    "No entries found for this date range",
                )
            }
        };

        let entries = self
            .store
            .find(&EntryFilter::all().name(name).within(window), DateOrder::Ascending)
            .await?;

        Ok(match self.ledger.aggregate_range(&entries) {
            RangeAggregate::NoEntries => NameReport::Empty(EmptyReport {
                entries: Vec::new(),
                message: empty_message.to_string(),
            }),
            RangeAggregate::Entries(totals) => NameReport::Found(NameTotals {
                user_name: name.to_string(),
                totals,
            }),
        })
    }

    /// Every entry of the Monday-anchored week containing `reference`.
    #[instrument(skip(self))]
    pub async fn all_users_weekly(&self, reference: NaiveDate) -> Result<Vec<UnpaidLine>, ServiceError> {
        let week = self.calendar().monday_anchored_week(reference);
        let entries = self.entries_within(week).await?;
        Ok(entries
            .iter()
            .map(|entry| UnpaidLine {
                entry: self.ledger.view(entry),
                unpaid_amount: compute_remaining(entry),
            })
            .collect())
    }

    /// The current week split into seven days.
    #[instrument(skip(self))]
    pub async fn day_wise_weekly(&self, now: DateTime<Utc>) -> Result<Vec<DayBucket>, ServiceError> {
        let week = self.calendar().current_week(now);
        let entries = self.entries_within(week).await?;
        Ok(self.ledger.group_by_calendar_day(&entries, &week))
    }

    /// A customer's entries that still owe money, across all dates.
    #[instrument(skip(self))]
    pub async fn pending_by_user(
        &self,
        name: &str,
        party_to: Option<&str>,
    ) -> Result<Vec<LedgerLine>, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("User name is required".to_string()));
        }

        let entries = self
            .store
            .find(&pending_filter(name, party_to), DateOrder::Ascending)
            .await?;
        Ok(entries
            .iter()
            .filter(|entry| compute_remaining(entry) > Decimal::ZERO)
            .map(|entry| self.ledger.line(entry))
            .collect())
    }

    /// All entries grouped by customer, settled ones included.
    pub async fn global_pending(&self) -> Result<Vec<UserLedger>, ServiceError> {
        let entries = self.store.find(&EntryFilter::all(), DateOrder::Ascending).await?;
        Ok(self.ledger.group_by_user(&entries))
    }

    pub async fn sunday_aggregate(&self, sunday: NaiveDate) -> Result<Vec<SundayLine>, ServiceError> {
        let week = self.calendar().sunday_anchored_week(sunday);
        let entries = self.entries_within(week).await?;
        Ok(entries
            .iter()
            .map(|entry| {
                let view = self.ledger.view(entry);
                SundayLine {
                    id: view.id,
                    name: view.name,
                    party_to: view.party_to,
                    date: view.date,
                    total: view.total,
                    remaining_amount: compute_remaining(entry),
                }
            })
            .collect())
    }

    pub async fn sunday_remaining_by_user(
        &self,
        sunday: NaiveDate,
    ) -> Result<Vec<UserRemaining>, ServiceError> {
        let week = self.calendar().sunday_anchored_week(sunday);
        let entries = self.entries_within(week).await?;
        Ok(aggregate_remaining_by_user(&entries))
    }

    /// Deliveries by vehicle, newest first. `None` or "All" lists every
    /// vehicle.
    #[instrument(skip(self))]
    pub async fn vehicle_report(&self, vehicle_no: Option<&str>) -> Result<Vec<VehicleLine>, ServiceError> {
        let filter = match vehicle_no.map(str::trim) {
            None | Some("") => EntryFilter::all(),
            Some(all) if all.eq_ignore_ascii_case("all") => EntryFilter::all(),
            Some(raw) => {
                let vehicle = VehicleNo::parse(raw).ok_or_else(|| {
                    ServiceError::ValidationError(format!("Unknown vehicle: {}", raw))
                })?;
                EntryFilter::all().vehicle_no(vehicle.to_string())
            }
        };

        let entries = self.store.find(&filter, DateOrder::Descending).await?;
        Ok(entries
            .iter()
            .map(|entry| {
                let view = self.ledger.view(entry);
                VehicleLine {
                    name: view.name,
                    from: view.from,
                    party_to: view.party_to,
                    vehicle_no: view.vehicle_no,
                    date: view.date,
                }
            })
            .collect())
    }

    /// Numbered deliveries from one origin site over a day range.
    ///
    /// Entries without an origin count as the default origin, matching how
    /// they are displayed.
    #[instrument(skip(self))]
    pub async fn origin_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        origin: Option<&str>,
    ) -> Result<Vec<OriginLine>, ServiceError> {
        if from > to {
            return Err(ServiceError::ValidationError(format!(
                "fromDate {} is after toDate {}",
                from, to
            )));
        }
        let origin = origin
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| self.default_origin());

        let entries = self.entries_within(self.calendar().day_range(from, to)).await?;
        Ok(entries
            .iter()
            .map(|entry| self.ledger.view(entry))
            .filter(|view| view.from.eq_ignore_ascii_case(origin))
            .enumerate()
            .map(|(index, view)| OriginLine {
                sr_no: index + 1,
                from: view.from,
                sqft: view.sqft,
                total: view.total,
                date: view.date,
            })
            .collect())
    }

    async fn entries_within(&self, window: DateWindow) -> Result<Vec<WorkEntry>, ServiceError> {
        let entries = self
            .store
            .find(&EntryFilter::all().within(window), DateOrder::Ascending)
            .await?;
        debug!(
            start = %window.start,
            end = %window.end,
            count = entries.len(),
            "loaded entries for window"
        );
        Ok(entries)
    }
}
