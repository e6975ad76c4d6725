pub mod common;
pub mod health;
pub mod reports;
pub mod work_entries;

use std::sync::Arc;

use crate::repositories::WorkEntryStore;
use crate::services::{Calendar, EntryValidator, Ledger, ReportService, WorkEntryService};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub work_entries: Arc<WorkEntryService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn WorkEntryStore>,
        calendar: Calendar,
        default_origin: impl Into<String>,
    ) -> Self {
        let work_entries = Arc::new(WorkEntryService::new(
            store.clone(),
            EntryValidator::new(calendar),
        ));
        let reports = Arc::new(ReportService::new(
            store,
            Ledger::new(calendar, default_origin),
        ));

        Self {
            work_entries,
            reports,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        self.reports.calendar()
    }
}
