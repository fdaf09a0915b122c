//! YAML Export functionality
//!
//! Exports the complete database to YAML for a human-readable copy.

use std::io::Write;

use crate::error::{EstateError, EstateResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Export the full database to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> EstateResult<()> {
    let export = FullExport::from_storage(storage)?;

    writeln!(writer, "# estate full database export").map_err(|e| EstateError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| EstateError::Export(e.to_string()))?;
    writeln!(writer, "# App Version: {}", export.app_version)
        .map_err(|e| EstateError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| EstateError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| EstateError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> EstateResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| EstateError::Import(e.to_string()))?;
    export.validate().map_err(EstateError::Import)?;
    Ok(export)
}
