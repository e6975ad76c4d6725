use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::work_entry::{Model as WorkEntry, PaymentStatus};
use crate::errors::ServiceError;
use crate::services::calendar::DateWindow;

pub mod in_memory;
pub mod work_entry_repository;

pub use in_memory::InMemoryWorkEntryStore;
pub use work_entry_repository::WorkEntryRepository;

/// A validated entry waiting to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkEntry {
    pub name: String,
    pub sqft: Option<String>,
    pub item: String,
    pub from_site: Option<String>,
    pub party_to: Option<String>,
    pub mal_plus: Decimal,
    pub kating: Decimal,
    pub total: Decimal,
    pub date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub paid_amount: Decimal,
    pub payment_mode: Option<String>,
    pub vehicle_no: Option<String>,
}

impl NewWorkEntry {
    pub fn into_model(self, id: Uuid) -> WorkEntry {
        WorkEntry {
            id,
            name: self.name,
            sqft: self.sqft,
            item: self.item,
            from_site: self.from_site,
            party_to: self.party_to,
            mal_plus: self.mal_plus,
            kating: self.kating,
            total: self.total,
            date: self.date,
            payment_status: self.payment_status,
            paid_amount: self.paid_amount,
            payment_mode: self.payment_mode,
            vehicle_no: self.vehicle_no,
        }
    }
}

/// Exact-match filters; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub name: Option<String>,
    pub party_to: Option<String>,
    pub vehicle_no: Option<String>,
    pub window: Option<DateWindow>,
}

impl EntryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn party_to(mut self, party_to: impl Into<String>) -> Self {
        self.party_to = Some(party_to.into());
        self
    }

    pub fn vehicle_no(mut self, vehicle_no: impl Into<String>) -> Self {
        self.vehicle_no = Some(vehicle_no.into());
        self
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn matches(&self, entry: &WorkEntry) -> bool {
        fn eq_opt(wanted: &Option<String>, actual: &Option<String>) -> bool {
            match wanted {
                Some(w) => actual.as_deref() == Some(w.as_str()),
                None => true,
            }
        }

        self.name.as_deref().map_or(true, |n| entry.name == n)
            && eq_opt(&self.party_to, &entry.party_to)
            && eq_opt(&self.vehicle_no, &entry.vehicle_no)
            && self.window.map_or(true, |w| w.contains(entry.date))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    Ascending,
    Descending,
}

/// Durable keyed collection of work entries.
#[async_trait]
pub trait WorkEntryStore: Send + Sync {
    async fn insert(&self, entry: NewWorkEntry) -> Result<WorkEntry, ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkEntry>, ServiceError>;

    async fn find(&self, filter: &EntryFilter, order: DateOrder) -> Result<Vec<WorkEntry>, ServiceError>;

    /// Overwrites every field of the stored entry with the same id.
    async fn update(&self, entry: &WorkEntry) -> Result<WorkEntry, ServiceError>;

    async fn exists_by_name(&self, name: &str) -> Result<bool, ServiceError>;

    /// Every distinct customer name, sorted.
    async fn distinct_names(&self) -> Result<Vec<String>, ServiceError>;

    async fn ping(&self) -> Result<(), ServiceError>;
}
