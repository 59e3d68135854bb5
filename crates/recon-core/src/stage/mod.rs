//! Etapas de post-procesado.
//!
//! Una etapa consume archivos del árbol del sujeto y deja derivados dentro de
//! él. Este módulo define:
//! - `StageKind`: conjunto cerrado de etapas en su orden declarado.
//! - `StageDefinition`: interfaz neutra que el pipeline ejecuta.
//! - `StageContext`: lo que una etapa puede ver y usar al correr.
//! - `StageRunResult` / `StageResult` y el `StageStatus` derivado.

mod context;
pub mod definition;
pub mod kind;
mod result;
mod status;

pub use context::StageContext;
pub use definition::StageDefinition;
pub use kind::StageKind;
pub use result::{RunMetadata, SkipReason, StageResult, StageRunResult};
pub use status::StageStatus;
