//! Config Resolver: mapa de opciones -> `RunConfig` validado e inmutable.
//!
//! La resolución no tiene efectos secundarios más allá de registrar avisos.
//! Los defaults del manifiesto se aplican clave por clave cuando el mapa
//! crudo no trae valor (o trae `null`).

mod defaults;
mod resolver;
mod subject;

pub use defaults::manifest_defaults;
pub use resolver::ConfigResolver;
pub use subject::SubjectId;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stage::StageKind;

/// Opciones resueltas de una corrida. Se crea una vez y no se muta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Flags libres de la reconstrucción (p.ej. `-all -qcache`).
    pub reconstruction_flags: String,
    /// `None` cuando debe derivarse del archivo previo.
    pub subject_id: Option<SubjectId>,
    pub cpu_count: usize,
    pub parallel: bool,
    pub expert_options: Option<PathBuf>,
    pub dry_run: bool,
    pub postprocessing_only: bool,
    pub log_level: LogLevel,
    pub stages: StageToggles,
    pub failure_policy: FailurePolicy,
}

impl RunConfig {
    /// Tokens de los flags, separados por espacios y sin alterar.
    pub fn flag_tokens(&self) -> impl Iterator<Item = &str> {
        self.reconstruction_flags.split_whitespace()
    }

    pub fn is_required(&self, kind: StageKind) -> bool {
        self.failure_policy.required.contains(&kind)
    }
}

/// Gates por etapa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageToggles {
    enabled: BTreeSet<StageKind>,
}

impl StageToggles {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: StageKind) -> Self {
        self.enabled.insert(kind);
        self
    }

    pub fn without(mut self, kind: StageKind) -> Self {
        self.enabled.remove(&kind);
        self
    }

    pub fn is_enabled(&self, kind: StageKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Etapas habilitadas en orden declarado.
    pub fn enabled(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.enabled.iter().copied()
    }
}

/// Qué hacer cuando una etapa falla.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Si es verdadero, las etapas posteriores a una falla no se intentan.
    pub abort_on_failure: bool,
    /// Etapas cuya falla vuelve fatal la corrida.
    pub required: BTreeSet<StageKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn as_filter(self) -> log::LevelFilter {
        match self {
            Self::Debug => log::LevelFilter::Debug,
            Self::Info => log::LevelFilter::Info,
            Self::Warning => log::LevelFilter::Warn,
        }
    }

    /// Directiva para filtros estilo `RUST_LOG`.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
        }
    }
}
