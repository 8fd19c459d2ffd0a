//! Request handlers

pub mod billing;
pub mod currencies;
pub mod health;
