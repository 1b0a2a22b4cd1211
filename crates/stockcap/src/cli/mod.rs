//! Command handlers for the `stockcap` binary.

pub mod config;
pub mod interactive;
pub mod models;
pub mod process;
