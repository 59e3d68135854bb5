//! Defaults declarados por el manifiesto.
//!
//! Los defaults históricos del flag paralelo y de las etapas cambiaron entre
//! versiones; aquí son datos, no comportamiento: quien despliega puede pasar
//! otro mapa a `ConfigResolver::new`.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

static MANIFEST_DEFAULTS: Lazy<Map<String, Value>> = Lazy::new(|| {
    let defaults = json!({
        "reconall_options": "-all -qcache",
        "parallel": false,
        "gear-dry-run": false,
        "gear-postprocessing-only": false,
        "gear-log-level": "INFO",
        "gear-hippocampal_subfields": false,
        "gear-brainstem_structures": false,
        "gear-thalamic_nuclei": false,
        "gear-hypothalamic_subunits": false,
        "gear-gtmseg": false,
        "gear-register_surfaces": false,
        "gear-convert_surfaces": true,
        "gear-convert_volumes": true,
        "gear-convert_stats": true,
        "gear-abort-on-stage-failure": false,
        "gear-required-stages": "",
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
});

pub fn manifest_defaults() -> &'static Map<String, Value> {
    &MANIFEST_DEFAULTS
}
