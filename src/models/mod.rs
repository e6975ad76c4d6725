pub mod catalog;

pub use catalog::{Item, PaymentMode, VehicleNo};
