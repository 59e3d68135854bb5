use std::path::{Path, PathBuf};

use recon_core::{ReconError, RunMetadata};
use serde_json::{json, Value};

pub const METADATA_FILE: &str = ".metadata.json";

/// `{"analysis": {"info": {...}}}`
pub fn metadata_document(metadata: &RunMetadata) -> Value {
    json!({ "analysis": { "info": metadata } })
}

/// Escribe `.metadata.json` en `dir`.
pub fn write_metadata(dir: &Path, metadata: &RunMetadata) -> Result<PathBuf, ReconError> {
    let path = dir.join(METADATA_FILE);
    let text = serde_json::to_string_pretty(&metadata_document(metadata)).map_err(|e| ReconError::Packaging(e.to_string()))?;
    std::fs::write(&path, text).map_err(|e| ReconError::Packaging(format!("{}: {e}", path.display())))?;
    Ok(path)
}
