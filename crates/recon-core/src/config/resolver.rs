use std::collections::BTreeSet;
use std::path::PathBuf;

use log::{debug, warn};
use serde_json::{Map, Value};

use super::{FailurePolicy, LogLevel, RunConfig, StageToggles, SubjectId};
use crate::errors::ReconError;
use crate::stage::StageKind;

const KNOWN_KEYS: &[&str] = &["reconall_options",
                              "subject_id",
                              "n_cpus",
                              "parallel",
                              "expert",
                              "gear-dry-run",
                              "gear-postprocessing-only",
                              "gear-log-level",
                              "gear-abort-on-stage-failure",
                              "gear-required-stages"];

/// Resuelve opciones crudas contra los defaults del manifiesto.
pub struct ConfigResolver<'a> {
    defaults: &'a Map<String, Value>,
    host_cpus: usize,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(defaults: &'a Map<String, Value>) -> Self {
        let host_cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { defaults, host_cpus }
    }

    /// Fija la cantidad de núcleos del host (tests, hosts con cgroups).
    pub fn with_host_cpus(mut self, host_cpus: usize) -> Self {
        self.host_cpus = host_cpus.max(1);
        self
    }

    pub fn host_cpus(&self) -> usize {
        self.host_cpus
    }

    pub fn resolve(&self, raw: &Map<String, Value>) -> Result<RunConfig, ReconError> {
        for key in raw.keys() {
            let is_gate = key.strip_prefix("gear-").and_then(StageKind::from_name).is_some();
            if !is_gate && !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("ignoring unknown option `{key}`");
            }
        }
        let opts = Options { raw,
                             defaults: self.defaults };

        let reconstruction_flags = opts.string("reconall_options")?.unwrap_or_default();
        if reconstruction_flags.trim().is_empty() {
            return Err(ReconError::config("reconall_options", "must be a non-empty string"));
        }

        let subject_id = match opts.string("subject_id")? {
            Some(s) if !s.trim().is_empty() => Some(SubjectId::sanitize(&s)?),
            _ => None,
        };

        let expert_options = opts.string("expert")?.filter(|s| !s.trim().is_empty()).map(PathBuf::from);

        let log_level = match opts.string("gear-log-level")? {
            None => LogLevel::Info,
            Some(s) => LogLevel::parse(&s).ok_or_else(|| {
                                               ReconError::config("gear-log-level",
                                                                  format!("unknown level {s:?} (DEBUG, INFO or WARNING)"))
                                           })?,
        };

        let mut stages = StageToggles::none();
        for kind in StageKind::ORDERED {
            if opts.flag(&kind.gate_key())? {
                stages = stages.with(kind);
            }
        }

        let mut required = BTreeSet::new();
        for name in opts.string("gear-required-stages")?.unwrap_or_default().split_whitespace() {
            let kind = StageKind::from_name(name).ok_or_else(|| {
                                                     ReconError::config("gear-required-stages",
                                                                        format!("unknown stage `{name}`"))
                                                 })?;
            if !stages.is_enabled(kind) {
                return Err(ReconError::config("gear-required-stages",
                                              format!("stage `{name}` is required but `{}` is off", kind.gate_key())));
            }
            required.insert(kind);
        }

        let config = RunConfig { reconstruction_flags,
                                 subject_id,
                                 cpu_count: self.cpu_count(opts.integer("n_cpus")?),
                                 parallel: opts.flag("parallel")?,
                                 expert_options,
                                 dry_run: opts.flag("gear-dry-run")?,
                                 postprocessing_only: opts.flag("gear-postprocessing-only")?,
                                 log_level,
                                 stages,
                                 failure_policy: FailurePolicy { abort_on_failure: opts.flag("gear-abort-on-stage-failure")?,
                                                                 required } };
        debug!("resolved configuration: {config:?}");
        Ok(config)
    }

    /// Sin valor o no positivo -> todos los núcleos; más que el host -> el
    /// máximo del host.
    fn cpu_count(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 0 && (n as u64) <= self.host_cpus as u64 => n as usize,
            Some(n) if n > 0 => {
                warn!("n_cpus ({n}) > number available, using {}", self.host_cpus);
                self.host_cpus
            }
            _ => self.host_cpus,
        }
    }
}

/// Vista combinada crudo -> defaults con lectores tipados.
struct Options<'r> {
    raw: &'r Map<String, Value>,
    defaults: &'r Map<String, Value>,
}

impl<'r> Options<'r> {
    fn lookup(&self, key: &str) -> Option<&'r Value> {
        match self.raw.get(key) {
            Some(Value::Null) | None => self.defaults.get(key).filter(|v| !v.is_null()),
            Some(v) => Some(v),
        }
    }

    fn string(&self, key: &str) -> Result<Option<String>, ReconError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, ReconError> {
        match self.lookup(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<i64>, ReconError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| type_error(key, "an integer", v)),
        }
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> ReconError {
    ReconError::config(key, format!("expected {expected}, found {found}"))
}
