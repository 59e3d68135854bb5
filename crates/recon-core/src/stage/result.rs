use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{StageKind, StageStatus};
use crate::errors::StageError;

/// Pares clave/valor a nivel corrida (mediciones derivadas de tablas). El
/// orden de inserción se conserva.
pub type RunMetadata = IndexMap<String, Value>;

/// Resultado abstracto de ejecutar una etapa.
#[derive(Debug, Clone)]
pub enum StageRunResult {
    Success { artifacts: Vec<PathBuf>, metadata: RunMetadata },
    Failure { error: StageError },
}

impl StageRunResult {
    pub fn artifacts(artifacts: Vec<PathBuf>) -> Self {
        Self::Success { artifacts,
                        metadata: RunMetadata::new() }
    }
}

impl From<Result<Vec<PathBuf>, StageError>> for StageRunResult {
    fn from(res: Result<Vec<PathBuf>, StageError>) -> Self {
        match res {
            Ok(artifacts) => Self::artifacts(artifacts),
            Err(error) => Self::Failure { error },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    DryRun,
    /// Una etapa anterior falló y la política pide abortar.
    Aborted { after: StageKind },
}

/// Registro inmutable de una etapa una vez terminada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageKind,
    pub attempted: bool,
    pub succeeded: bool,
    /// Su falla hace que la corrida termine con código distinto de cero.
    pub required: bool,
    pub artifacts: Vec<PathBuf>,
    pub error: Option<StageError>,
    pub skip_reason: Option<SkipReason>,
    pub elapsed_ms: u64,
}

impl StageResult {
    pub fn skipped(stage: StageKind, reason: SkipReason, required: bool) -> Self {
        Self { stage,
               attempted: false,
               succeeded: false,
               required,
               artifacts: vec![],
               error: None,
               skip_reason: Some(reason),
               elapsed_ms: 0 }
    }

    pub fn succeeded(stage: StageKind, artifacts: Vec<PathBuf>, required: bool, elapsed_ms: u64) -> Self {
        Self { stage,
               attempted: true,
               succeeded: true,
               required,
               artifacts,
               error: None,
               skip_reason: None,
               elapsed_ms }
    }

    pub fn failed(stage: StageKind, error: StageError, required: bool, elapsed_ms: u64) -> Self {
        Self { stage,
               attempted: true,
               succeeded: false,
               required,
               artifacts: vec![],
               error: Some(error),
               skip_reason: None,
               elapsed_ms }
    }

    pub fn status(&self) -> StageStatus {
        match (self.attempted, self.succeeded) {
            (false, _) => StageStatus::Skipped,
            (true, true) => StageStatus::Succeeded,
            (true, false) => StageStatus::Failed,
        }
    }

    /// Línea legible para el resumen final; `None` si no hay nada que
    /// reportar.
    pub fn summary_line(&self) -> Option<String> {
        match (&self.error, self.skip_reason) {
            (Some(err), _) => {
                let tag = if self.required { "required stage" } else { "stage" };
                Some(format!("{tag} `{}` failed: {err}", self.stage))
            }
            (None, Some(SkipReason::Aborted { after })) => {
                Some(format!("stage `{}` not attempted: aborted after `{after}` failed", self.stage))
            }
            _ => None,
        }
    }
}
