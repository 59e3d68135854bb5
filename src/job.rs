//! Lectura del `config.json` del job: `{"config": {...}, "inputs": {...}}`.

use std::path::Path;

use recon_core::{ConfigResolver, InputSet, RunConfig};
use serde_json::{Map, Value};

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct JobFile {
    pub config: Map<String, Value>,
    pub inputs: Value,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadConfig { path: path.to_path_buf(),
                                                                                         source })?;
        let doc: Value = serde_json::from_str(&text).map_err(|source| AppError::ParseConfig { path: path.to_path_buf(),
                                                                                               source })?;
        Ok(Self::from_value(doc))
    }

    /// Un archivo `expert` entre las entradas se usa si la opción no trae
    /// uno propio.
    pub fn from_value(doc: Value) -> Self {
        let mut config = doc.get("config").and_then(Value::as_object).cloned().unwrap_or_default();
        let inputs = doc.get("inputs").cloned().unwrap_or(Value::Null);
        let expert_input = inputs.pointer("/expert/location/path").and_then(Value::as_str);
        let has_expert = config.get("expert").and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty());
        if let (Some(path), false) = (expert_input, has_expert) {
            config.insert("expert".to_string(), Value::String(path.to_string()));
        }
        Self { config, inputs }
    }

    pub fn resolve(&self, resolver: &ConfigResolver<'_>) -> Result<(RunConfig, InputSet), AppError> {
        let config = resolver.resolve(&self.config)?;
        let inputs = InputSet::from_manifest_inputs(&self.inputs)?;
        Ok((config, inputs))
    }
}

#[cfg(test)]
mod tests {
    use recon_core::manifest_defaults;
    use serde_json::json;

    use super::*;

    #[test]
    fn expert_input_fills_missing_option() {
        let job = JobFile::from_value(json!({
            "config": {"reconall_options": "-all"},
            "inputs": {"expert": {"location": {"path": "/flywheel/v0/input/expert/opts.txt"}}}
        }));
        assert_eq!(job.config["expert"], "/flywheel/v0/input/expert/opts.txt");
        let (cfg, _) = job.resolve(&ConfigResolver::new(manifest_defaults()).with_host_cpus(1)).unwrap();
        assert_eq!(cfg.expert_options.unwrap().to_str(), Some("/flywheel/v0/input/expert/opts.txt"));
    }

    #[test]
    fn configured_expert_option_wins() {
        let job = JobFile::from_value(json!({
            "config": {"expert": "/opt/mine.txt"},
            "inputs": {"expert": {"location": {"path": "/input/other.txt"}}}
        }));
        assert_eq!(job.config["expert"], "/opt/mine.txt");
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = JobFile::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().starts_with("cannot read /nonexistent/config.json"));
    }
}
