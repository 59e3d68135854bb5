//! reconflow: orquestador de la reconstrucción estructural y su
//! post-procesado.
//!
//! - `job`: lectura del `config.json` del job.
//! - `orchestrator`: control de flujo de una corrida completa.
//! - `settings`: rutas del contenedor (variables de entorno / `.env`).

pub mod errors;
pub mod job;
pub mod orchestrator;
pub mod settings;

pub use orchestrator::{Orchestrator, RunLayout, RunReport};
