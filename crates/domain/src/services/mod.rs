//! Domain services.

pub mod activity;
pub mod availability;
pub mod invoice;
