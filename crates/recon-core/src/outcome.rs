//! Outcome Aggregator: decide el código de salida final.
//!
//! Fatal (1) cuando:
//! - la reconstrucción terminó en `FailedTerminal` y no se saltó por el modo
//!   sólo-post-procesado,
//! - falló una etapa marcada como requerida,
//! - falló el empaquetado o una verificación previa (`fatal`).
//!
//! En otro caso 0, aunque hayan fallado etapas opcionales; todas las fallas
//! quedan enumeradas en el resumen.

use serde::{Deserialize, Serialize};

use crate::errors::ReconError;
use crate::executor::{ExecutionOutcome, ExecutionState};
use crate::pipeline::PipelineReport;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub exit_code: i32,
    /// Error que volvió fatal la corrida.
    pub error: Option<ReconError>,
    /// Una línea por fase o etapa con problemas.
    pub summary_lines: Vec<String>,
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

/// `execution` es `None` cuando el modo sólo-post-procesado saltó la
/// reconstrucción. `fatal` lleva un error ajeno a las etapas (empaquetado,
/// archivo previo).
pub fn aggregate(execution: Option<&ExecutionOutcome>, report: &PipelineReport, fatal: Option<ReconError>) -> Verdict {
    let mut summary_lines = Vec::new();
    let mut error: Option<ReconError> = None;

    if let Some(exec) = execution {
        if exec.state == ExecutionState::FailedTerminal {
            let err = ReconError::ExternalProcess { exit_code: exec.exit_code,
                                                    attempts: exec.attempts };
            summary_lines.push(format!("reconstruction failed: {err}"));
            error = Some(err);
        } else if exec.retried() {
            summary_lines.push(format!("reconstruction succeeded after a retry ({} attempts)", exec.attempts));
        }
    }

    for result in &report.results {
        if let Some(line) = result.summary_line() {
            summary_lines.push(line);
        }
        if error.is_none() && result.required {
            if let Some(stage_err) = &result.error {
                error = Some(ReconError::Stage { stage: result.stage.name().to_string(),
                                                 error: stage_err.clone() });
            }
        }
    }

    if let Some(err) = fatal {
        summary_lines.push(err.to_string());
        error.get_or_insert(err);
    }

    let exit_code = if error.is_some() { EXIT_FAILURE } else { EXIT_SUCCESS };
    Verdict { exit_code,
              error,
              summary_lines }
}
