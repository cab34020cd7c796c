//! Core domain + application logic for the expense tracker bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / PostgreSQL /
//! Redis live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod i18n;
pub mod logging;
pub mod ports;
pub mod stats;

pub use errors::{Error, Result};
