use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settlement state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Unpaid")]
    Unpaid,
}

impl PaymentStatus {
    /// Anything other than a case-insensitive "paid" is unpaid.
    pub fn normalize(raw: Option<&str>) -> PaymentStatus {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("paid") => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }
}

/// One delivery recorded against a customer.
///
/// `item`, `payment_mode` and `vehicle_no` are stored as text: new rows are
/// always written with canonical values, while rows imported from older data
/// may carry anything and are repaired lazily.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_entries")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Paying customer
    pub name: String,

    /// Free-form quantity measure
    pub sqft: Option<String>,

    pub item: String,

    /// Origin site label
    #[serde(rename = "from")]
    pub from_site: Option<String>,

    /// Destination party / address
    pub party_to: Option<String>,

    /// Material cost component
    #[serde(with = "rust_decimal::serde::float")]
    pub mal_plus: Decimal,

    /// Labour and transport cost component
    #[serde(with = "rust_decimal::serde::float")]
    pub kating: Decimal,

    /// `mal_plus + kating`, fixed when the entry is created
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,

    pub date: DateTime<Utc>,

    pub payment_status: PaymentStatus,

    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,

    pub payment_mode: Option<String>,

    pub vehicle_no: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Outstanding balance, `total - paid_amount`
    pub fn remaining(&self) -> Decimal {
        self.total.saturating_sub(self.paid_amount)
    }
}
