//! `InputSet`: rutas ya resueltas de las entradas de la corrida.
//!
//! El descubrimiento y la validación de formato de los archivos ocurren fuera
//! de este crate; aquí sólo se fija su forma y su orden.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{FLAIR_FLAG, MAX_ANATOMICAL_INPUTS, T2_FLAG};
use crate::errors::ReconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondaryContrast {
    T2,
    Flair,
}

impl SecondaryContrast {
    pub fn flag(self) -> &'static str {
        match self {
            Self::T2 => T2_FLAG,
            Self::Flair => FLAIR_FLAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryVolume {
    pub contrast: SecondaryContrast,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSet {
    /// T1 primario seguido de los auxiliares; el orden afecta el promedio.
    pub anatomical: Vec<PathBuf>,
    pub secondary: Option<SecondaryVolume>,
    pub license: Option<PathBuf>,
    /// Salida comprimida de una corrida previa (modo sólo-post-procesado).
    pub prior_archive: Option<PathBuf>,
}

/// Nombres de entrada del manifiesto para los T1 auxiliares, en orden.
const EXTRA_T1_INPUTS: [&str; 4] = ["t1w_anatomical_2", "t1w_anatomical_3", "t1w_anatomical_4", "t1w_anatomical_5"];

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anatomical(mut self, path: impl Into<PathBuf>) -> Self {
        self.anatomical.push(path.into());
        self
    }

    pub fn with_secondary(mut self, contrast: SecondaryContrast, path: impl Into<PathBuf>) -> Self {
        self.secondary = Some(SecondaryVolume { contrast,
                                                path: path.into() });
        self
    }

    pub fn with_license(mut self, path: impl Into<PathBuf>) -> Self {
        self.license = Some(path.into());
        self
    }

    pub fn with_prior_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.prior_archive = Some(path.into());
        self
    }

    /// Lee la sección `inputs` del `config.json` del job:
    /// `{"<name>": {"location": {"path": "..."}}}`. Un `.zip` en
    /// `anatomical` es la salida de una corrida previa.
    pub fn from_manifest_inputs(inputs: &Value) -> Result<Self, ReconError> {
        let path_of = |name: &str| -> Option<PathBuf> {
            inputs.get(name)
                  .and_then(|i| i.pointer("/location/path"))
                  .and_then(Value::as_str)
                  .map(PathBuf::from)
        };

        let mut set = InputSet::new();
        if let Some(p) = path_of("anatomical") {
            if is_zip(&p) {
                set.prior_archive = Some(p);
            } else {
                set.anatomical.push(p);
            }
        }
        set.anatomical.extend(EXTRA_T1_INPUTS.iter().filter_map(|n| path_of(*n)));
        set.secondary = match (path_of("t2w_anatomical"), path_of("flair_anatomical")) {
            (Some(_), Some(_)) => {
                return Err(ReconError::config("t2w_anatomical", "supply either a T2 or a FLAIR volume, not both"));
            }
            (Some(path), None) => Some(SecondaryVolume { contrast: SecondaryContrast::T2,
                                                         path }),
            (None, Some(path)) => Some(SecondaryVolume { contrast: SecondaryContrast::Flair,
                                                         path }),
            (None, None) => None,
        };
        set.license = path_of("freesurfer_license_file");
        set.validate()?;
        Ok(set)
    }

    /// Rutas absolutas y a lo sumo `MAX_ANATOMICAL_INPUTS` volúmenes.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.anatomical.len() > MAX_ANATOMICAL_INPUTS {
            return Err(ReconError::config("anatomical",
                                          format!("at most {MAX_ANATOMICAL_INPUTS} anatomical volumes, got {}",
                                                  self.anatomical.len())));
        }
        let all = self.anatomical
                      .iter()
                      .map(|p| ("anatomical", p.as_path()))
                      .chain(self.secondary.iter().map(|s| ("secondary", s.path.as_path())))
                      .chain(self.license.iter().map(|p| ("freesurfer_license_file", p.as_path())))
                      .chain(self.prior_archive.iter().map(|p| ("prior_archive", p.as_path())));
        for (key, path) in all {
            if !path.is_absolute() {
                return Err(ReconError::config(key, format!("{} is not an absolute path", path.display())));
            }
        }
        Ok(())
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}
