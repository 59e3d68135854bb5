//! Tablas de volúmenes que escriben las herramientas de segmentación.
//!
//! Dos formatos:
//! - pares `<estructura> <volumen>` por línea (`*.volumes.txt`,
//!   `brainstemSsVolumes.v12.txt`, ...),
//! - CSV ancho de una fila con encabezado (`hypothalamic_subunits_volumes.v1.csv`),
//!   cuya primera columna es el sujeto.

use indexmap::IndexMap;

use super::{parse_number, Table, TableError};

pub fn parse_volume_pairs(file: &str, stem: &str, text: &str) -> Result<Table, TableError> {
    let mut values = IndexMap::new();
    for (idx, line) in text.lines().enumerate() {
        let mut cells = line.split_whitespace();
        let (Some(name), Some(value), None) = (cells.next(), cells.next(), cells.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(TableError::Malformed { file: file.to_string(),
                                               line: idx + 1,
                                               reason: "expected `<name> <value>`".into() });
        };
        values.insert(name.to_string(), parse_number(file, idx + 1, value)?);
    }
    if values.is_empty() {
        return Err(TableError::Empty { file: file.to_string() });
    }
    Ok(Table::new(stem, "Measure:volume", values))
}

pub fn parse_wide_csv(file: &str, stem: &str, text: &str) -> Result<Table, TableError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let (Some(header), Some(row)) = (lines.next(), lines.next()) else {
        return Err(TableError::Empty { file: file.to_string() });
    };
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let cells: Vec<&str> = row.split(',').map(str::trim).collect();
    if names.len() != cells.len() {
        return Err(TableError::Malformed { file: file.to_string(),
                                           line: 2,
                                           reason: format!("{} headers but {} cells", names.len(), cells.len()) });
    }
    let mut values = IndexMap::new();
    for (name, cell) in names.iter().zip(&cells).skip(1) {
        values.insert(name.to_string(), parse_number(file, 2, cell)?);
    }
    if values.is_empty() {
        return Err(TableError::Empty { file: file.to_string() });
    }
    Ok(Table::new(stem, "Measure:volume", values))
}
