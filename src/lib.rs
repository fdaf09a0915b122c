//! estate - industrial real-estate asset and project-finance tracker
//!
//! This library provides the core functionality behind the `estate` command
//! line tool: a SQLite-backed register of properties, development projects,
//! ledger transactions, consultants, quotes, monthly expenses and WBS tasks,
//! with the aggregation queries that summarise them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: Tracing subscriber setup
//! - `models`: Core data models (assets, projects, transactions, etc.)
//! - `storage`: SQLite storage layer and repositories
//! - `services`: Business logic layer
//! - `market`: Market indicator sources and cache
//! - `finance`: Investment loan calculations
//! - `audit`: Audit logging system
//! - `backup`: Database backup management
//! - `reports`: Terminal and CSV reports
//! - `export`: CSV, JSON and YAML export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers behind the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use estate::config::{paths::EstatePaths, settings::Settings};
//! use estate::storage::Storage;
//!
//! let paths = EstatePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod finance;
pub mod logging;
pub mod market;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{EstateError, EstateResult};
