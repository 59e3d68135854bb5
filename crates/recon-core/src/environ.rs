//! Snapshot inmutable del entorno de los procesos hijos.
//!
//! El contenedor guarda su entorno en un JSON al construirse; la corrida lo
//! carga una vez y lo pasa explícitamente al ejecutor y a las etapas, en vez
//! de leer variables globales del proceso.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SUBJECTS_DIR;
use crate::errors::ReconError;

pub const SUBJECTS_DIR_VAR: &str = "SUBJECTS_DIR";
pub const LICENSE_VAR: &str = "FS_LICENSE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Captura el entorno actual del proceso.
    pub fn from_process() -> Self {
        Self { vars: std::env::vars().collect() }
    }

    /// Carga un objeto JSON plano `{"VAR": "valor"}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ReconError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ReconError::config("environ", format!("{}: {e}", path.display())))
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn subjects_dir(&self) -> PathBuf {
        PathBuf::from(self.get(SUBJECTS_DIR_VAR).unwrap_or(DEFAULT_SUBJECTS_DIR))
    }

    /// Línea `K=V ...` para el log en modo debug.
    pub fn describe(&self) -> String {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_flat_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gear_environ.json");
        std::fs::write(&path, r#"{"SUBJECTS_DIR": "/data/subjects", "FREESURFER_HOME": "/opt/fs"}"#).unwrap();
        let env = EnvironmentSnapshot::from_json_file(&path).unwrap();
        assert_eq!(env.subjects_dir(), PathBuf::from("/data/subjects"));
        assert_eq!(env.get("FREESURFER_HOME"), Some("/opt/fs"));
        assert_eq!(env.describe(), "FREESURFER_HOME=/opt/fs SUBJECTS_DIR=/data/subjects");
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gear_environ.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = EnvironmentSnapshot::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ReconError::Configuration { ref key, .. } if key == "environ"));
    }

    #[test]
    fn default_subjects_dir() {
        assert_eq!(EnvironmentSnapshot::empty().subjects_dir(), PathBuf::from(DEFAULT_SUBJECTS_DIR));
    }
}
