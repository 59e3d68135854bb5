/// Estado final de una etapa, derivado de su `StageResult`.
///
/// `Skipped` cubre gate apagado, dry-run y aborto previo; el motivo queda
/// en `StageResult::skip_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}
