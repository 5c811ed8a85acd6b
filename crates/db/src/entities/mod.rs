//! `SeaORM` entities for the control database.

pub mod businesses;
pub mod package_purchases;
