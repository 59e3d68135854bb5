//! Tablas de una fila (sujeto) por N columnas (regiones).

mod fs_stats;
mod segmentation;

pub use fs_stats::{aparc_table, aseg_table, seg_volume_table, AparcMeasure, AsegMeasure, GlobalMeasure, StatsFile};
pub use segmentation::{parse_volume_pairs, parse_wide_csv};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use recon_core::{StageError, SubjectId};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("{file}: no `# ColHeaders` line")]
    MissingHeader { file: String },
    #[error("{file}: column `{column}` not found")]
    MissingColumn { file: String, column: String },
    #[error("{file}:{line}: {reason}")]
    Malformed { file: String, line: usize, reason: String },
    #[error("{file}: table is empty")]
    Empty { file: String },
}

impl From<TableError> for StageError {
    fn from(err: TableError) -> Self {
        StageError::Conversion(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Nombre estable, p.ej. `aseg_stats_vol_mm3`; es la clave de metadata.
    pub stem: String,
    /// Primera celda del encabezado (`Measure:volume`, `lh.aparc.area`).
    pub measure: String,
    pub values: IndexMap<String, f64>,
}

impl Table {
    pub fn new(stem: impl Into<String>, measure: impl Into<String>, values: IndexMap<String, f64>) -> Self {
        Self { stem: stem.into(),
               measure: measure.into(),
               values }
    }

    pub fn to_csv(&self, subject: &SubjectId) -> String {
        let mut header = vec![csv_cell(&self.measure)];
        header.extend(self.values.keys().map(|k| csv_cell(k)));
        let mut row = vec![csv_cell(subject.as_str())];
        row.extend(self.values.values().map(|v| v.to_string()));
        format!("{}\n{}\n", header.join(","), row.join(","))
    }

    /// Escribe `<dir>/<subject>_<stem>.csv`.
    pub fn write_csv(&self, dir: &Path, subject: &SubjectId) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{subject}_{}.csv", self.stem));
        std::fs::write(&path, self.to_csv(subject))?;
        Ok(path)
    }

    /// Objeto `{columna: valor}`; los valores no finitos quedan en `null`.
    pub fn to_metadata(&self) -> Value {
        let obj: Map<String, Value> = self.values
                                          .iter()
                                          .map(|(k, v)| (k.clone(), serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)))
                                          .collect();
        Value::Object(obj)
    }
}

fn csv_cell(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

pub(crate) fn parse_number(file: &str, line: usize, raw: &str) -> Result<f64, TableError> {
    raw.trim().parse::<f64>().map_err(|_| TableError::Malformed { file: file.to_string(),
                                                                  line,
                                                                  reason: format!("not a number: {raw:?}") })
}
