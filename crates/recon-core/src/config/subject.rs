use serde::{Deserialize, Serialize};

use crate::errors::ReconError;

/// Identificador de sujeto seguro como nombre de directorio.
///
/// Invariante: no vacío, sólo `[A-Za-z0-9_.-]`, no empieza con `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Reemplaza cada espacio en blanco por `_` y rechaza lo que siga siendo
    /// inseguro.
    pub fn sanitize(raw: &str) -> Result<Self, ReconError> {
        let replaced: String = raw.trim()
                                  .chars()
                                  .map(|c| if c.is_whitespace() { '_' } else { c })
                                  .collect();
        let safe = !replaced.is_empty()
                   && !replaced.starts_with('.')
                   && replaced.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if safe {
            Ok(Self(replaced))
        } else {
            Err(ReconError::InvalidSubjectId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = ReconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::sanitize(&value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}
