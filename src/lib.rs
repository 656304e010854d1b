//! Legal document intake service
//!
//! Validates submitted documents against a type and size policy and drives
//! every accepted document through a simulated upload and analysis
//! lifecycle before handing it to the analysis viewer.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
