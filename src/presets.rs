use crate::types::Preset;
use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Registry {
    default: String,
    presets: Vec<Preset>,
}

const PRESETS_JSON: &str = include_str!("../presets/presets.json");

static REGISTRY: Lazy<Registry> =
    Lazy::new(|| serde_json::from_str(PRESETS_JSON).expect("bundled presets.json is malformed"));

pub const DEFAULT_PRESET: &str = "rapper-over-beat";

/// Look up a preset by name.
///
/// Unknown names resolve to the default preset (`rapper-over-beat`). This is
/// silent for the caller; only a `warn` log records the fallback.
pub fn get_preset(name: &str) -> Preset {
    let reg = &*REGISTRY;
    if let Some(p) = reg.presets.iter().find(|p| p.name == name) {
        return p.clone();
    }

    tracing::warn!(preset = name, fallback = %reg.default, "unknown mix preset, using default");
    reg.presets
        .iter()
        .find(|p| p.name == reg.default)
        .cloned()
        .expect("default preset missing from presets.json")
}

/// `(name, is_default)` for every bundled preset, in table order.
pub fn list_presets() -> Vec<(String, bool)> {
    let reg = &*REGISTRY;
    reg.presets
        .iter()
        .map(|p| (p.name.clone(), p.name == reg.default))
        .collect()
}
