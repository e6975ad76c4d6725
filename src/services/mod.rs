// Calendar and ledger rules
pub mod calendar;
pub mod ledger;

// Write side
pub mod entry_validator;
pub mod work_entries;

// Read side
pub mod reports;

pub use calendar::{Calendar, DateWindow};
pub use entry_validator::{EntryValidator, RawEntrySubmission};
pub use ledger::Ledger;
pub use reports::{ReportRange, ReportService};
pub use work_entries::{CreateEntryOutcome, WorkEntryService};
