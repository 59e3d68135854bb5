//! recon-core: orquestación determinista de la reconstrucción y su
//! post-procesado.
//!
//! Piezas, de las hojas hacia arriba:
//! - `config`: resuelve el mapa de opciones en un `RunConfig` inmutable.
//! - `inputs`: rutas ya resueltas de los volúmenes de entrada (`InputSet`).
//! - `command`: construye el vector de argumentos de la reconstrucción.
//! - `environ` / `process`: snapshot de entorno y frontera de subprocesos.
//! - `executor`: ejecución con la política de reintento del flag paralelo.
//! - `stage` / `pipeline`: etapas de post-procesado y su motor secuencial.
//! - `event`: journal append-only de la corrida.
//! - `outcome`: agregación de resultados y código de salida.
pub mod command;
pub mod config;
pub mod constants;
pub mod environ;
pub mod errors;
pub mod event;
pub mod executor;
pub mod hashing;
pub mod inputs;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod stage;
pub mod testing;

pub use command::{build_command, uses_parallel_flag};
pub use config::{manifest_defaults, ConfigResolver, FailurePolicy, LogLevel, RunConfig, StageToggles, SubjectId};
pub use environ::EnvironmentSnapshot;
pub use errors::{ReconError, StageError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use executor::{AttemptRecord, ExecutionOutcome, ExecutionState, RetryingExecutor};
pub use inputs::{InputSet, SecondaryContrast, SecondaryVolume};
pub use outcome::{aggregate, Verdict};
pub use pipeline::{PipelineBuilder, PipelineReport, PostProcessingPipeline};
pub use process::{ProcessExit, ProcessRunner, SystemProcessRunner};
pub use stage::{RunMetadata, SkipReason, StageContext, StageDefinition, StageKind, StageResult, StageRunResult, StageStatus};
