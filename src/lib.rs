//! Finds out which managed computers actually use an application they have installed.
//! Inventory and per-computer usage logs come from a device-management API, the result is a
//! plain text report on stdout.
//!

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod utils;
