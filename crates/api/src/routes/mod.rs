//! HTTP route handlers

pub mod accounts;
pub mod emergency;
pub mod health;
pub mod reports;
pub mod route_safety;
