//! Batch transforms for Kona JSX
//!
//! Uses rayon for parallel iteration when running natively,
//! falls back to sequential processing in WASM.

use wasm_bindgen::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::error::ErrorInfo;
use crate::transformer::{transform, TransformOptions};

/// Module to transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInput {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub filename: String,
}

/// Transformed module; exactly one of `code` and `error` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOutput {
    pub id: String,
    pub code: Option<String>,
    pub error: Option<ErrorInfo>,
}

fn transform_one(module: &ModuleInput, options: &TransformOptions) -> ModuleOutput {
    let mut options = options.clone();
    if !module.filename.is_empty() {
        options.file_path = module.filename.clone();
    }
    match transform(&module.code, &options) {
        Ok(result) => ModuleOutput {
            id: module.id.clone(),
            code: Some(result.code),
            error: None,
        },
        Err(e) => {
            tracing::debug!(id = %module.id, error = %e, "module failed to transform");
            ModuleOutput {
                id: module.id.clone(),
                code: None,
                error: Some(e.info()),
            }
        }
    }
}

/// Transform every module independently, preserving input order.
///
/// A failing module does not affect the others.
pub fn transform_batch(modules: &[ModuleInput], options: &TransformOptions) -> Vec<ModuleOutput> {
    tracing::debug!(modules = modules.len(), "transforming batch");

    #[cfg(not(target_arch = "wasm32"))]
    let results = modules
        .par_iter()
        .map(|m| transform_one(m, options))
        .collect();

    #[cfg(target_arch = "wasm32")]
    let results = modules.iter().map(|m| transform_one(m, options)).collect();

    results
}

/// Parallel transformer
#[wasm_bindgen]
pub struct ParallelProcessor {
    options: TransformOptions,
}

#[wasm_bindgen]
impl ParallelProcessor {
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<TransformOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// Transform multiple modules
    /// Returns JSON array of ModuleOutput
    #[wasm_bindgen]
    pub fn transform_modules(&self, modules_json: &str) -> Result<String, JsValue> {
        let modules: Vec<ModuleInput> = serde_json::from_str(modules_json)
            .map_err(|e| JsValue::from_str(&format!("invalid module list: {}", e)))?;

        let results = transform_batch(&modules, &self.options);
        serde_json::to_string(&results).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
