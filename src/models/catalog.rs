//! Closed vocabularies used by work entries.
//!
//! Every value coming from a client passes through one of the `normalize`
//! functions below before it is stored, so the rest of the crate only ever
//! sees canonical spellings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Material delivered by an entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Item {
    Reti,
    #[strum(serialize = "1/4")]
    #[serde(rename = "1/4")]
    Quarter,
    Crush,
    Malma,
    Gitti,
}

impl Item {
    pub const ALL: [Item; 5] = [
        Item::Reti,
        Item::Quarter,
        Item::Crush,
        Item::Malma,
        Item::Gitti,
    ];

    /// Case-insensitive match against the item list.
    pub fn normalize(raw: &str) -> Option<Item> {
        Item::from_str(raw.trim()).ok()
    }

    /// Like [`Item::normalize`] but falls back to the first listed item.
    pub fn normalize_or_first(raw: &str) -> Item {
        Item::normalize(raw).unwrap_or(Item::ALL[0])
    }
}

/// How a paid entry was settled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum PaymentMode {
    Cash,
    Online,
}

impl PaymentMode {
    /// Unknown or missing modes are treated as cash.
    pub fn normalize(raw: Option<&str>) -> PaymentMode {
        raw.and_then(|value| PaymentMode::from_str(value.trim()).ok())
            .unwrap_or(PaymentMode::Cash)
    }
}

/// Delivery vehicle ("gadi") registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum VehicleNo {
    K101,
    K102,
}

impl VehicleNo {
    pub const ALL: [VehicleNo; 2] = [VehicleNo::K101, VehicleNo::K102];

    pub fn parse(raw: &str) -> Option<VehicleNo> {
        VehicleNo::from_str(raw.trim()).ok()
    }

    /// Unknown or missing vehicles fall back to the first registered one.
    pub fn normalize(raw: Option<&str>) -> VehicleNo {
        raw.and_then(VehicleNo::parse).unwrap_or(VehicleNo::ALL[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Reti", Some(Item::Reti))]
    #[case("reti", Some(Item::Reti))]
    #[case("  CRUSH ", Some(Item::Crush))]
    #[case("1/4", Some(Item::Quarter))]
    #[case("gitti", Some(Item::Gitti))]
    #[case("MALMA", Some(Item::Malma))]
    #[case("sand", None)]
    #[case("", None)]
    fn item_normalization(#[case] raw: &str, #[case] expected: Option<Item>) {
        assert_eq!(Item::normalize(raw), expected);
    }

    #[test]
    fn item_display_uses_canonical_spelling() {
        assert_eq!(Item::Quarter.to_string(), "1/4");
        assert_eq!(Item::Reti.as_ref(), "Reti");
        assert_eq!(Item::normalize_or_first("cement"), Item::Reti);
    }

    #[rstest]
    #[case(Some("online"), PaymentMode::Online)]
    #[case(Some("Cash"), PaymentMode::Cash)]
    #[case(Some("cheque"), PaymentMode::Cash)]
    #[case(None, PaymentMode::Cash)]
    fn payment_mode_normalization(#[case] raw: Option<&str>, #[case] expected: PaymentMode) {
        assert_eq!(PaymentMode::normalize(raw), expected);
    }

    #[rstest]
    #[case(Some("k102"), VehicleNo::K102)]
    #[case(Some("K101"), VehicleNo::K101)]
    #[case(Some("K999"), VehicleNo::K101)]
    #[case(None, VehicleNo::K101)]
    fn vehicle_normalization(#[case] raw: Option<&str>, #[case] expected: VehicleNo) {
        assert_eq!(VehicleNo::normalize(raw), expected);
    }
}
