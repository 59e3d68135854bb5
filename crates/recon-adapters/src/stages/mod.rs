//! Una `StageDefinition` por `StageKind`.
//!
//! Cada etapa escribe sus derivados en `derived/<stage>/` dentro del árbol
//! del sujeto; las herramientas externas además escriben donde lo hacen por
//! convención (`mri/`, `surf/`, `xhemi/`).

mod registration;
mod segmentation;
mod stats;
mod surfaces;
mod volumes;

pub use registration::RegisterSurfacesStage;
pub use segmentation::{SegmentationStage, TableFormat, TableSource};
pub use stats::ConvertStatsStage;
pub use surfaces::ConvertSurfacesStage;
pub use volumes::ConvertVolumesStage;

use std::path::PathBuf;

use recon_core::{RunMetadata, StageContext, StageError, StageKind};

use crate::tables::Table;

/// Escribe cada tabla como CSV en el directorio de la etapa y la pliega en
/// la metadata bajo su `stem`.
pub(crate) fn emit_tables(ctx: &StageContext<'_>, kind: StageKind, tables: &[Table])
                          -> Result<(Vec<PathBuf>, RunMetadata), StageError> {
    let dir = ctx.ensure_derived_dir(kind)?;
    let mut artifacts = Vec::with_capacity(tables.len());
    let mut metadata = RunMetadata::new();
    for table in tables {
        artifacts.push(table.write_csv(&dir, ctx.subject)?);
        metadata.insert(table.stem.clone(), table.to_metadata());
    }
    Ok((artifacts, metadata))
}

pub(crate) fn read_text(path: &std::path::Path) -> Result<String, StageError> {
    std::fs::read_to_string(path).map_err(|e| StageError::Io(format!("{}: {e}", path.display())))
}

/// Nombre de archivo para mensajes de error.
pub(crate) fn file_label(path: &std::path::Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
