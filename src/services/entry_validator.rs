//! Turns raw client submissions into canonical [`NewWorkEntry`] values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::{
    entities::work_entry::PaymentStatus,
    errors::ServiceError,
    models::{Item, PaymentMode, VehicleNo},
    repositories::NewWorkEntry,
    services::calendar::Calendar,
};

/// Entry as posted by a client. Numeric fields may be JSON numbers or
/// numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEntrySubmission {
    pub name: Option<String>,
    pub sqft: Value,
    pub item: Option<String>,
    pub from: Option<String>,
    pub party_to: Option<String>,
    pub mal_plus: Value,
    pub kating: Value,
    pub date: Option<String>,
    pub payment_status: Option<String>,
    pub paid_amount: Value,
    pub payment_mode: Option<String>,
    pub vehicle_no: Option<String>,
    pub add_user: Option<bool>,
}

impl RawEntrySubmission {
    pub fn confirms_new_user(&self) -> bool {
        self.add_user == Some(true)
    }
}

#[derive(Debug, Clone)]
pub struct EntryValidator {
    calendar: Calendar,
}

impl EntryValidator {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    /// Trimmed customer name, or a validation error when it is blank.
    pub fn required_name(raw: &RawEntrySubmission) -> Result<String, ServiceError> {
        raw.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::ValidationError("User name is required".to_string()))
    }

    /// Normalizes every field but the name, which the caller has already
    /// checked with [`EntryValidator::required_name`].
    pub fn normalize(
        &self,
        raw: &RawEntrySubmission,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<NewWorkEntry, ServiceError> {
        let raw_item = raw.item.as_deref().unwrap_or_default();
        let item = Item::normalize(raw_item).ok_or_else(|| {
            ServiceError::ValidationError(format!("Invalid item: {}", raw_item.trim()))
        })?;

        let payment_status = PaymentStatus::normalize(raw.payment_status.as_deref());
        let (payment_mode, paid_amount) = match payment_status {
            PaymentStatus::Paid => (
                Some(PaymentMode::normalize(raw.payment_mode.as_deref()).to_string()),
                parse_amount(&raw.paid_amount).max(Decimal::ZERO),
            ),
            PaymentStatus::Unpaid => (None, Decimal::ZERO),
        };

        let vehicle_no = VehicleNo::normalize(raw.vehicle_no.as_deref());

        let mal_plus = parse_amount(&raw.mal_plus);
        let kating = parse_amount(&raw.kating);
        let total = mal_plus.checked_add(kating).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Amount too large: malPlus {} + kating {}",
                mal_plus, kating
            ))
        })?;

        let date = match raw.date.as_deref().map(str::trim) {
            None | Some("") => now,
            Some(value) => self.calendar.parse_instant(value).ok_or_else(|| {
                ServiceError::ValidationError(format!("Invalid date: {}", value))
            })?,
        };

        Ok(NewWorkEntry {
            name,
            sqft: quantity_text(&raw.sqft),
            item: item.to_string(),
            from_site: non_blank(raw.from.as_deref()),
            party_to: non_blank(raw.party_to.as_deref()),
            mal_plus,
            kating,
            total,
            date,
            payment_status,
            paid_amount,
            payment_mode,
            vehicle_no: Some(vehicle_no.to_string()),
        })
    }
}

/// Reads a number or numeric string; anything else counts as zero.
pub fn parse_amount(value: &Value) -> Decimal {
    let parsed = match value {
        Value::Number(n) => decimal_from_text(&n.to_string()),
        Value::String(s) => decimal_from_text(s.trim()),
        _ => None,
    };
    parsed.unwrap_or(Decimal::ZERO)
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

fn quantity_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
