use std::path::PathBuf;

use recon_core::ReconError;
use thiserror::Error;

/// Errores del binario antes de llegar al orquestador.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot read {}: {source}", path.display())]
    ReadConfig { path: PathBuf, source: std::io::Error },
    #[error("{} is not valid JSON: {source}", path.display())]
    ParseConfig { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Recon(#[from] ReconError),
}
