//! Audit logging
//!
//! Every create, update and delete made through the services is appended to
//! `audit.log` as one JSON line holding the before and after row states.
//!
//! ```rust,ignore
//! use estate::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(EntityType::Asset, "ast-1", Some(name), &asset))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
