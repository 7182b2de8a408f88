//! HTTP Route Handlers

pub mod estimate;
pub mod health;
pub mod schema;
pub mod vin;
