//! Superficie ASCII de FreeSurfer (`mris_convert x x.asc`) a Wavefront OBJ.
//!
//! ```text
//! #!ascii version of lh.pial
//! <nvert> <nface>
//! x y z 0        (nvert líneas)
//! a b c 0        (nface líneas, índices 0-based)
//! ```
//! El OBJ lleva `v x y z` y `f a b c` con índices 1-based.

use std::fmt::Write as _;

use crate::tables::TableError;

pub fn ascii_to_obj(file: &str, text: &str) -> Result<String, TableError> {
    let malformed = |line: usize, reason: String| TableError::Malformed { file: file.to_string(),
                                                                          line,
                                                                          reason };
    let mut header = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'));

    let (idx, counts) = header.next().ok_or_else(|| TableError::Empty { file: file.to_string() })?;
    let counts: Vec<usize> = counts.split_whitespace()
                                   .map(|c| c.parse::<usize>())
                                   .collect::<Result<_, _>>()
                                   .map_err(|e| malformed(idx + 1, format!("bad counts: {e}")))?;
    let [nvert, nface] = counts[..] else {
        return Err(malformed(idx + 1, "expected `<vertices> <faces>`".into()));
    };

    // Los conteos vienen del archivo: se validan contra las líneas presentes
    // antes de reservar o iterar.
    let data: Vec<(usize, &str)> = header.collect();
    match nvert.checked_add(nface) {
        Some(total) if total <= data.len() => {}
        _ => {
            return Err(malformed(idx + 1,
                                 format!("header declares {nvert} vertices and {nface} faces but only {} data lines follow",
                                         data.len())));
        }
    }
    let mut lines = data.into_iter();

    let mut obj = String::new();
    for _ in 0..nvert {
        let (idx, line) = lines.next().ok_or_else(|| malformed(0, format!("expected {nvert} vertices")))?;
        let coords: Vec<&str> = line.split_whitespace().collect();
        if coords.len() < 3 {
            return Err(malformed(idx + 1, "vertex needs three coordinates".into()));
        }
        for c in &coords[..3] {
            c.parse::<f64>().map_err(|_| malformed(idx + 1, format!("bad coordinate {c:?}")))?;
        }
        let _ = writeln!(obj, "v {} {} {}", coords[0], coords[1], coords[2]);
    }
    for _ in 0..nface {
        let (idx, line) = lines.next().ok_or_else(|| malformed(0, format!("expected {nface} faces")))?;
        let corners: Vec<usize> = line.split_whitespace()
                                      .take(3)
                                      .map(|c| c.parse::<usize>())
                                      .collect::<Result<_, _>>()
                                      .map_err(|e| malformed(idx + 1, format!("bad face index: {e}")))?;
        if corners.len() != 3 || corners.iter().any(|&c| c >= nvert) {
            return Err(malformed(idx + 1, format!("face {corners:?} out of range")));
        }
        let _ = writeln!(obj, "f {} {} {}", corners[0] + 1, corners[1] + 1, corners[2] + 1);
    }
    Ok(obj)
}
