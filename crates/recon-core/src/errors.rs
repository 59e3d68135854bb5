//! Errores del orquestador.
//!
//! `ReconError` cubre las fallas a nivel corrida; `StageError` las fallas
//! locales de una etapa de post-procesado, que se registran en su
//! `StageResult` sin abortar a las etapas hermanas.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ReconError {
    /// Opción malformada o ausente. Se reporta antes de lanzar procesos.
    #[error("configuration error in `{key}`: {reason}")]
    Configuration { key: String, reason: String },
    /// Identificador de sujeto inseguro como nombre de directorio.
    #[error("invalid subject id {0:?}: only letters, digits, '_', '-' and '.' are allowed")]
    InvalidSubjectId(String),
    /// La reconstrucción terminó con código distinto de cero (tras la
    /// política de reintento).
    #[error("external process failed with exit code {exit_code:?} after {attempts} attempt(s)")]
    ExternalProcess { exit_code: Option<i32>, attempts: u32 },
    /// Falla de una etapa configurada como requerida.
    #[error("stage `{stage}` failed: {error}")]
    Stage { stage: String, error: StageError },
    /// No se pudo crear el archivo de salida (único entregable).
    #[error("packaging failed: {0}")]
    Packaging(String),
    /// El modo sólo-post-procesado no encontró un árbol previo utilizable.
    #[error("prior run unavailable: {0}")]
    PriorRunUnavailable(String),
    #[error("io: {0}")]
    Io(String),
}

impl ReconError {
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration { key: key.into(),
                              reason: reason.into() }
    }

    /// Verdadero para los errores que abortan antes de lanzar cualquier
    /// proceso externo.
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidSubjectId(_))
    }
}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StageError {
    #[error("missing prerequisite {}", .0.display())]
    MissingPrerequisite(PathBuf),
    #[error("`{tool}` exited with code {code:?}")]
    ToolFailed { tool: String, code: Option<i32> },
    #[error("could not launch `{tool}`: {reason}")]
    Launch { tool: String, reason: String },
    #[error("conversion failed: {0}")]
    Conversion(String),
    #[error("io: {0}")]
    Io(String),
}

impl From<std::io::Error> for StageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_the_key() {
        let err = ReconError::config("reconall_options", "must not be empty");
        assert_eq!(err.to_string(), "configuration error in `reconall_options`: must not be empty");
        assert!(err.is_preflight());
    }

    #[test]
    fn stage_error_display_includes_path() {
        let err = StageError::MissingPrerequisite(PathBuf::from("/s/sub/stats/aseg.stats"));
        assert_eq!(err.to_string(), "missing prerequisite /s/sub/stats/aseg.stats");
    }

    #[test]
    fn io_errors_convert() {
        let err: ReconError = std::io::Error::other("disk full").into();
        assert_eq!(err, ReconError::Io("disk full".into()));
        assert!(!err.is_preflight());
    }
}
