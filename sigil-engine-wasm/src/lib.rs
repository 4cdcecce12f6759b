//! WASM bindings for sigil-engine — powers the interactive web playground.

use wasm_bindgen::prelude::*;

use sigil_engine::core::loader;
use sigil_engine::SigilEngine;

// ---------------------------------------------------------------------------
// Embedded demo tables — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const TAVERN_TABLES: &str = include_str!("../../demos/data/tavern.yaml");
    pub const LOOT_TABLES: &str = include_str!("../../demos/data/loot.yaml");
}

const PRESETS: [&str; 2] = ["tavern", "loot"];

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// SigilPlayground — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct SigilPlayground {
    engine: SigilEngine,
}

#[wasm_bindgen]
impl SigilPlayground {
    /// Create an engine over YAML table source. An empty seed means
    /// unseeded (non-reproducible) output.
    #[wasm_bindgen(constructor)]
    pub fn new(tables_yaml: &str, seed: &str) -> Result<SigilPlayground, JsError> {
        let tables = loader::load_tables_str(tables_yaml)
            .map_err(|e| JsError::new(&format!("Table parse error: {e}")))?;

        let mut builder = SigilEngine::builder().with_tables(tables);
        if !seed.is_empty() {
            builder = builder.seed(seed);
        }
        let engine = builder
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;

        Ok(SigilPlayground { engine })
    }

    /// Create an engine over one of the bundled table sets.
    pub fn preset(name: &str, seed: &str) -> Result<SigilPlayground, JsError> {
        let source = match name {
            "tavern" => data::TAVERN_TABLES,
            "loot" => data::LOOT_TABLES,
            _ => return Err(JsError::new(&format!("Unknown preset: {name}"))),
        };
        SigilPlayground::new(source, seed)
    }

    /// Return JSON array of bundled preset names.
    pub fn available_presets() -> String {
        serde_json::to_string(&PRESETS).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn generate(&mut self, template: &str) -> String {
        self.engine.generate(template)
    }

    /// Generate several outputs for the same template. Returns a JSON array of strings.
    pub fn generate_many(&mut self, template: &str, count: usize) -> Result<String, JsError> {
        to_json(&self.engine.generate_many(template, count))
    }

    /// Returns `{"valid": bool, "errors": [string]}` as JSON.
    pub fn validate(&self, template: &str) -> Result<String, JsError> {
        to_json(&self.engine.validate_template(template))
    }

    /// Returns a JSON array of token descriptors (path, modifiers, span, ...).
    pub fn parse_tokens(&self, template: &str) -> Result<String, JsError> {
        to_json(&self.engine.parse_tokens(template))
    }

    /// The stored value at a dotted path as JSON, or `null`.
    pub fn resolve_raw(&self, path: &str) -> Result<String, JsError> {
        to_json(&self.engine.resolve_raw(path))
    }

    /// One weighted pick from the list at a dotted path, unevaluated.
    pub fn resolve_selected(&mut self, path: &str) -> Option<String> {
        self.engine.resolve_selected(path)
    }

    /// Re-seed the engine, keeping its tables.
    pub fn reseed(&mut self, seed: &str) {
        self.engine.reseed(seed);
    }
}
