//! Pure helpers shared by the service and persistence layers.

pub mod order_number;
pub mod phone;
