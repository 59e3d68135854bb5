//! recon-packaging: el único entregable persistido de la corrida.
//!
//! - `archive`: comprime el árbol del sujeto en un zip con nombre
//!   determinista y calcula un digest de su membresía.
//! - `prior`: extrae un archivo de una corrida previa (modo
//!   sólo-post-procesado) y recupera el sujeto.
//! - `metadata`: escribe `.metadata.json` junto al archivo.

pub mod archive;
pub mod metadata;
pub mod prior;

pub use archive::{archive_name, archive_subject, membership, ArchiveSummary};
pub use metadata::{metadata_document, write_metadata, METADATA_FILE};
pub use prior::extract_prior_run;
