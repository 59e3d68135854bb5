//! recon-adapters: etapas concretas de post-procesado.
//!
//! - `tables`: lectura de tablas de FreeSurfer (`*.stats`, volúmenes de
//!   segmentación) y escritura como CSV + metadata.
//! - `surface`: conversión nativa de superficies ASCII a OBJ.
//! - `stages`: una `StageDefinition` por `StageKind`.
//! - `catalog`: el pipeline estándar con todas las etapas registradas.

pub mod catalog;
pub mod stages;
pub mod surface;
pub mod tables;

pub use catalog::standard_pipeline;
