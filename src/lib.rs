//! # BigQuery Agent Bootstrap Library
//!
//! Idempotent environment bootstrapper for the local BigQuery optimization
//! agent stack.

pub mod app;
pub mod binary;
pub mod cli;
pub mod config;
pub mod deps;
pub mod document;
pub mod error;
pub mod logging;
pub mod output;
pub mod platform;
pub mod profile;
pub mod prompt;
pub mod reconcile;
