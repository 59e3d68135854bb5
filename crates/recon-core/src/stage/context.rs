use std::path::{Path, PathBuf};

use log::{debug, info};

use super::StageKind;
use crate::config::{RunConfig, SubjectId};
use crate::constants::DERIVED_DIR;
use crate::environ::EnvironmentSnapshot;
use crate::errors::StageError;
use crate::process::ProcessRunner;

/// Contexto entregado a `StageDefinition::run`.
pub struct StageContext<'a> {
    pub subject: &'a SubjectId,
    pub subjects_dir: &'a Path,
    pub config: &'a RunConfig,
    pub environ: &'a EnvironmentSnapshot,
    pub runner: &'a dyn ProcessRunner,
}

impl<'a> StageContext<'a> {
    pub fn subject_dir(&self) -> PathBuf {
        self.subjects_dir.join(self.subject.as_str())
    }

    /// Ruta relativa al árbol del sujeto, p.ej. `"stats/aseg.stats"`.
    pub fn subject_path(&self, rel: &str) -> PathBuf {
        self.subject_dir().join(rel)
    }

    /// Directorio disjunto de derivados de una etapa.
    pub fn derived_dir(&self, kind: StageKind) -> PathBuf {
        self.subject_dir().join(DERIVED_DIR).join(kind.name())
    }

    pub fn ensure_derived_dir(&self, kind: StageKind) -> Result<PathBuf, StageError> {
        let dir = self.derived_dir(kind);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn is_enabled(&self, kind: StageKind) -> bool {
        self.config.stages.is_enabled(kind)
    }

    /// Corre una sub-herramienta de forma síncrona con el snapshot de
    /// entorno. Un código distinto de cero es una falla local de la etapa.
    pub fn invoke(&self, argv: &[String]) -> Result<(), StageError> {
        let tool = argv.first().cloned().unwrap_or_default();
        info!("running {}", argv.join(" "));
        let exit = self.runner
                       .run(argv, self.environ)
                       .map_err(|e| StageError::Launch { tool: tool.clone(),
                                                         reason: e.to_string() })?;
        debug!("`{tool}` exited with {:?}", exit.code);
        if exit.success() {
            Ok(())
        } else {
            Err(StageError::ToolFailed { tool, code: exit.code })
        }
    }
}
