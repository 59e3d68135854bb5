use std::path::PathBuf;

use serde_json::json;

use super::{StageContext, StageKind, StageRunResult};
use crate::hashing::hash_value;

/// Trait que define una etapa de post-procesado.
///
/// El pipeline verifica `prerequisites` antes de llamar a `run`; una etapa
/// sólo debe escribir bajo su directorio de derivados o donde su herramienta
/// externa escribe por convención.
pub trait StageDefinition {
    fn kind(&self) -> StageKind;

    /// Nombre amigable (por defecto el de `kind`).
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Archivos del árbol del sujeto que deben existir antes de correr.
    fn prerequisites(&self, ctx: &StageContext<'_>) -> Vec<PathBuf>;

    fn run(&self, ctx: &StageContext<'_>) -> StageRunResult;

    fn definition_hash(&self) -> String {
        hash_value(&json!({
            "engine_version": crate::constants::ENGINE_VERSION,
            "stage": self.kind().name(),
            "type": std::any::type_name::<Self>(),
        }))
    }
}
