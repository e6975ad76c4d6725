use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::work_entry::Model as WorkEntry,
    errors::ServiceError,
    repositories::{DateOrder, EntryFilter, WorkEntryStore},
    services::{
        entry_validator::{EntryValidator, RawEntrySubmission},
        ledger,
    },
};

/// What happened to a submitted entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateEntryOutcome {
    Created { entry: WorkEntry, is_new_user: bool },
    /// The name is unknown and the client has not confirmed adding it.
    /// Nothing was stored.
    ConfirmationRequired,
}

/// Result of paying down a customer's pending balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentReceipt {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub applied_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_balance: Decimal,
    pub entries: Vec<WorkEntry>,
}

/// Write-side operations on work entries: creation, name lookup and payments.
#[derive(Clone)]
pub struct WorkEntryService {
    store: Arc<dyn WorkEntryStore>,
    validator: EntryValidator,
}

impl WorkEntryService {
    pub fn new(store: Arc<dyn WorkEntryStore>, validator: EntryValidator) -> Self {
        Self { store, validator }
    }

    /// Validates, normalizes and stores a submission.
    ///
    /// Unknown names are only stored when the submission carries
    /// `addUser: true`; otherwise the caller gets
    /// [`CreateEntryOutcome::ConfirmationRequired`].
    #[instrument(skip(self, raw))]
    pub async fn create_entry(
        &self,
        raw: RawEntrySubmission,
        now: DateTime<Utc>,
    ) -> Result<CreateEntryOutcome, ServiceError> {
        let name = EntryValidator::required_name(&raw)?;

        let existing_user = self.store.exists_by_name(&name).await?;
        if !existing_user && !raw.confirms_new_user() {
            info!(%name, "new customer awaiting confirmation");
            return Ok(CreateEntryOutcome::ConfirmationRequired);
        }

        let new_entry = self.validator.normalize(&raw, name, now)?;
        let entry = self.store.insert(new_entry).await?;
        info!(id = %entry.id, name = %entry.name, total = %entry.total, "work entry created");

        Ok(CreateEntryOutcome::Created {
            entry,
            is_new_user: !existing_user,
        })
    }

    /// Distinct names containing `fragment`, ignoring case. A blank fragment
    /// matches nothing.
    pub async fn search_names(&self, fragment: &str) -> Result<Vec<String>, ServiceError> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let names = self.store.distinct_names().await?;
        Ok(names
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Applies a partial or full payment to one entry.
    #[instrument(skip(self))]
    pub async fn apply_payment(
        &self,
        entry_id: Uuid,
        amount: Option<Decimal>,
    ) -> Result<WorkEntry, ServiceError> {
        let entry = self
            .store
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("work entry {} not found", entry_id)))?;

        let updated = ledger::apply_payment(&entry, amount)?;
        let stored = self.store.update(&updated).await?;
        info!(
            id = %stored.id,
            paid = %stored.paid_amount,
            remaining = %stored.remaining(),
            "payment applied"
        );
        Ok(stored)
    }

    /// Spreads `amount` over a customer's unpaid entries, oldest first.
    ///
    /// Each slice is an independent single-entry payment; a store failure
    /// partway leaves the earlier slices applied.
    #[instrument(skip(self))]
    pub async fn pay_pending_balance(
        &self,
        name: &str,
        party_to: Option<&str>,
        amount: Option<Decimal>,
    ) -> Result<PendingPaymentReceipt, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("User name is required".to_string()));
        }
        let amount = amount
            .ok_or_else(|| ServiceError::InvalidAmount("payment amount is required".to_string()))?;

        let filter = pending_filter(name, party_to);
        let entries = self.store.find(&filter, DateOrder::Ascending).await?;
        let plan = ledger::allocate_payment(&entries, amount)?;

        let mut updated = Vec::with_capacity(plan.len());
        for slice in plan {
            match self.apply_payment(slice.entry_id, Some(slice.amount)).await {
                Ok(entry) => updated.push(entry),
                Err(err) => {
                    warn!(
                        entry_id = %slice.entry_id,
                        applied_slices = updated.len(),
                        error = %err,
                        "pending payment stopped partway"
                    );
                    return Err(err);
                }
            }
        }

        let remaining_balance = ledger::saturating_sum(
            self.store
                .find(&filter, DateOrder::Ascending)
                .await?
                .iter()
                .map(ledger::compute_remaining)
                .filter(|remaining| *remaining > Decimal::ZERO),
        );

        Ok(PendingPaymentReceipt {
            name: name.to_string(),
            applied_amount: amount,
            remaining_balance,
            entries: updated,
        })
    }
}

pub(crate) fn pending_filter(name: &str, party_to: Option<&str>) -> EntryFilter {
    let filter = EntryFilter::all().name(name);
    match party_to.map(str::trim).filter(|p| !p.is_empty()) {
        Some(party_to) => filter.party_to(party_to),
        None => filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::work_entry::PaymentStatus;
    use crate::repositories::InMemoryWorkEntryStore;
    use crate::services::calendar::Calendar;
    use crate::services::ledger::test_support::{at, entry};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn service_with(store: Arc<InMemoryWorkEntryStore>) -> WorkEntryService {
        WorkEntryService::new(store, EntryValidator::new(Calendar::utc()))
    }

    fn submission(body: serde_json::Value) -> RawEntrySubmission {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn new_user_requires_confirmation_before_anything_is_stored() {
        let store = Arc::new(InMemoryWorkEntryStore::new());
        let service = service_with(store.clone());
        let body = json!({"name": "Ramesh", "item": "Reti", "malPlus": 500, "kating": 200});

        let outcome = service
            .create_entry(submission(body.clone()), at(2024, 6, 11, 9))
            .await
            .unwrap();
        assert_eq!(outcome, CreateEntryOutcome::ConfirmationRequired);
        assert!(store.distinct_names().await.unwrap().is_empty());

        let mut confirmed = body;
        confirmed["addUser"] = json!(true);
        let outcome = service
            .create_entry(submission(confirmed), at(2024, 6, 11, 9))
            .await
            .unwrap();
        let (entry, is_new_user) = assert_matches!(
            outcome,
            CreateEntryOutcome::Created { entry, is_new_user } => (entry, is_new_user)
        );
        assert!(is_new_user);
        assert_eq!(entry.total, dec!(700));

        let again = service
            .create_entry(
                submission(json!({"name": "Ramesh", "item": "Gitti"})),
                at(2024, 6, 12, 9),
            )
            .await
            .unwrap();
        assert_matches!(again, CreateEntryOutcome::Created { is_new_user: false, .. });
    }

    #[tokio::test]
    async fn invalid_item_is_rejected_for_known_users() {
        let store = Arc::new(InMemoryWorkEntryStore::with_entries(vec![entry(
            "Ramesh",
            dec!(10),
            dec!(0),
            at(2024, 6, 10, 9),
        )]));
        let err = service_with(store)
            .create_entry(submission(json!({"name": "Ramesh", "item": "sand"})), Utc::now())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_distinct() {
        let store = Arc::new(InMemoryWorkEntryStore::with_entries(vec![
            entry("Ramesh", dec!(1), dec!(0), at(2024, 6, 10, 9)),
            entry("Ramesh", dec!(1), dec!(0), at(2024, 6, 11, 9)),
            entry("Paramjit", dec!(1), dec!(0), at(2024, 6, 11, 9)),
            entry("Suresh", dec!(1), dec!(0), at(2024, 6, 11, 9)),
        ]));
        let service = service_with(store);

        assert_eq!(
            service.search_names("RAM").await.unwrap(),
            vec!["Paramjit".to_string(), "Ramesh".to_string()]
        );
        assert!(service.search_names("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn payment_on_unknown_entry_is_not_found() {
        let service = service_with(Arc::new(InMemoryWorkEntryStore::new()));
        assert_matches!(
            service.apply_payment(Uuid::new_v4(), Some(dec!(10))).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn rejected_payment_leaves_stored_entry_untouched() {
        let seeded = entry("Ramesh", dec!(700), dec!(300), at(2024, 6, 10, 9));
        let store = Arc::new(InMemoryWorkEntryStore::with_entries(vec![seeded.clone()]));
        let service = service_with(store.clone());

        assert_matches!(
            service.apply_payment(seeded.id, Some(dec!(500))).await,
            Err(ServiceError::InvalidAmount(_))
        );
        let stored = store.find_by_id(seeded.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_amount, dec!(300));

        let paid = service.apply_payment(seeded.id, Some(dec!(400))).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn pending_balance_is_paid_oldest_first() {
        let older = entry("Ramesh", dec!(100), dec!(0), at(2024, 6, 10, 9));
        let newer = entry("Ramesh", dec!(100), dec!(0), at(2024, 6, 12, 9));
        let other = entry("Suresh", dec!(100), dec!(0), at(2024, 6, 9, 9));
        let store = Arc::new(InMemoryWorkEntryStore::with_entries(vec![
            newer.clone(),
            older.clone(),
            other.clone(),
        ]));
        let service = service_with(store.clone());

        let receipt = service
            .pay_pending_balance("Ramesh", None, Some(dec!(150)))
            .await
            .unwrap();
        assert_eq!(receipt.applied_amount, dec!(150));
        assert_eq!(receipt.remaining_balance, dec!(50));
        assert_eq!(receipt.entries.len(), 2);
        assert_eq!(receipt.entries[0].id, older.id);
        assert_eq!(receipt.entries[0].payment_status, PaymentStatus::Paid);
        assert_eq!(receipt.entries[1].paid_amount, dec!(50));

        let untouched = store.find_by_id(other.id).await.unwrap().unwrap();
        assert_eq!(untouched.paid_amount, dec!(0));

        assert_matches!(
            service.pay_pending_balance("Ramesh", None, Some(dec!(51))).await,
            Err(ServiceError::InvalidAmount(_))
        );
    }
}
