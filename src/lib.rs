//! sysreport — point-in-time system facts collection.
//!
//! Provides:
//! - `collector` — system and language-environment debug-data collectors
//! - `aggregator` — collector registry, failure isolation, report assembly
//! - `config` — YAML configuration with defaults
//! - `report` — JSON report persistence
//! - `fmt` — shared formatting helpers (bytes, percentages)

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod fmt;
pub mod report;
