//! Kona JSX - fast JSX to JavaScript transform
//!
//! Rewrites JSX regions of an ECMAScript module into plain function calls
//! (`createElement(...)` or the automatic `_jsx(...)` runtime) while leaving
//! all other code untouched, exposed via WebAssembly for JavaScript callers.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod host;
pub mod lexer;
pub mod parallel;
pub mod parser;
pub mod transformer;
mod utils;

use wasm_bindgen::prelude::*;

pub use error::{ErrorInfo, SyntaxError, TransformError};
pub use parallel::{transform_batch, ModuleInput, ModuleOutput, ParallelProcessor};
pub use transformer::{
    check, transform, transform_jsx, JsxRuntime, TransformOptions, TransformResult, Transformer,
};

/// Initialize the WASM module with panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Health check to verify WASM module is loaded correctly
#[wasm_bindgen]
pub fn health_check() -> bool {
    true
}

/// Transform JSX with default options (classic runtime, production).
///
/// Throws an `Error` carrying `line` and `column` on malformed JSX.
#[wasm_bindgen(js_name = transformJsx)]
pub fn transform_jsx_js(code: &str) -> Result<String, JsValue> {
    transform_jsx(code).map_err(|e| to_js_error(&e))
}

/// Convert a transform error into a JS `Error` with position fields attached
pub(crate) fn to_js_error(error: &TransformError) -> JsValue {
    let js_error = js_sys::Error::new(&error.to_string());
    if let Some(syntax) = error.syntax_error() {
        let _ = js_sys::Reflect::set(
            &js_error,
            &JsValue::from_str("line"),
            &JsValue::from_f64(syntax.line as f64),
        );
        let _ = js_sys::Reflect::set(
            &js_error,
            &JsValue::from_str("column"),
            &JsValue::from_f64(syntax.column as f64),
        );
    }
    js_error.into()
}
