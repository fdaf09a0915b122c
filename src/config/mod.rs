//! Configuration module for the estate tracker
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::EstatePaths;
pub use settings::Settings;
