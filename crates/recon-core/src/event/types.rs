//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! - Cada fase del orquestador emite eventos a un `EventStore`.
//! - El journal se serializa como JSON lines junto al archivo de salida y
//!   permite reconstruir qué pasó sin releer los logs completos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ReconError, StageError};
use crate::stage::{SkipReason, StageKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEventKind {
    /// Primer evento de un `run_id`.
    RunInitialized {
        subject: String,
        postprocessing_only: bool,
        dry_run: bool,
    },
    ExecutionAttempt {
        attempt: u32,
        exit_code: Option<i32>,
        fingerprint: String,
    },
    /// El primer intento falló con el flag paralelo y se relanzó el mismo
    /// vector.
    ExecutionRetried { first_exit_code: Option<i32> },
    /// Dry-run o sólo-post-procesado.
    ExecutionSkipped { reason: String },
    StageStarted { stage: StageKind },
    StageFinished {
        stage: StageKind,
        artifacts: usize,
        fingerprint: String,
    },
    StageFailed { stage: StageKind, error: StageError },
    StageSkipped { stage: StageKind, reason: SkipReason },
    ArchiveWritten { path: String, digest: String },
    /// Cierre. `error` presente si la corrida fue fatal.
    RunCompleted {
        exit_code: i32,
        error: Option<ReconError>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    #[serde(flatten)]
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
