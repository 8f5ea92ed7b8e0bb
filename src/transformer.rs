//! JSX transform driver
//!
//! Transforms:
//! - JSX → `createElement(...)` calls (classic runtime)
//! - JSX → `_jsx`/`_jsxs` calls with a runtime import (automatic runtime)
//!
//! Everything outside JSX regions is copied through byte for byte and keeps
//! its line number.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::codegen::Rewriter;
use crate::error::{ErrorInfo, TransformError};
use crate::host::scan_program;
use crate::lexer::Cursor;

/// Transform options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[wasm_bindgen]
pub struct TransformOptions {
    #[wasm_bindgen(skip)]
    pub jsx_runtime: JsxRuntime,
    /// Omit development-only metadata (`__self`, `__source`)
    #[wasm_bindgen(skip)]
    pub production: bool,
    /// Classic runtime element factory
    #[wasm_bindgen(skip)]
    pub jsx_pragma: String,
    /// Classic runtime fragment reference
    #[wasm_bindgen(skip)]
    pub jsx_fragment_pragma: String,
    /// Automatic runtime module prefix (`<source>/jsx-runtime`)
    #[wasm_bindgen(skip)]
    pub jsx_import_source: String,
    /// Reported as `fileName` in development output and in errors
    #[wasm_bindgen(skip)]
    pub file_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JsxRuntime {
    Classic,    // createElement(type, props, ...children)
    Automatic,  // jsx/jsxs from <source>/jsx-runtime
}

impl FromStr for JsxRuntime {
    type Err = TransformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "classic" => Ok(JsxRuntime::Classic),
            "automatic" => Ok(JsxRuntime::Automatic),
            other => Err(TransformError::InvalidOptions(format!(
                "unknown jsxRuntime \"{}\", expected \"classic\" or \"automatic\"",
                other
            ))),
        }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            jsx_runtime: JsxRuntime::Classic,
            production: true,
            jsx_pragma: "createElement".to_string(),
            jsx_fragment_pragma: "Fragment".to_string(),
            jsx_import_source: "react".to_string(),
            file_path: String::new(),
        }
    }
}

impl TransformOptions {
    /// Parse options from a JSON object; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        serde_json::from_str(json).map_err(|e| TransformError::InvalidOptions(e.to_string()))
    }
}

#[wasm_bindgen]
impl TransformOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    #[wasm_bindgen(setter)]
    pub fn set_jsx_runtime(&mut self, runtime: &str) {
        match runtime.parse() {
            Ok(parsed) => self.jsx_runtime = parsed,
            Err(e) => tracing::warn!("{}; keeping {:?}", e, self.jsx_runtime),
        }
    }

    #[wasm_bindgen(setter)]
    pub fn set_production(&mut self, value: bool) {
        self.production = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_jsx_pragma(&mut self, pragma: String) {
        self.jsx_pragma = pragma;
    }

    #[wasm_bindgen(setter)]
    pub fn set_jsx_fragment_pragma(&mut self, pragma: String) {
        self.jsx_fragment_pragma = pragma;
    }

    #[wasm_bindgen(setter)]
    pub fn set_jsx_import_source(&mut self, source: String) {
        self.jsx_import_source = source;
    }

    #[wasm_bindgen(setter)]
    pub fn set_file_path(&mut self, path: String) {
        self.file_path = path;
    }
}

/// Transform result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResult {
    pub code: String,
    pub had_jsx: bool,
}

/// Main transformer
#[wasm_bindgen]
pub struct Transformer {
    options: TransformOptions,
}

#[wasm_bindgen]
impl Transformer {
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<TransformOptions>) -> Self {
        Self {
            options: options.unwrap_or_default(),
        }
    }

    /// Build a transformer from a plain JS options object
    #[wasm_bindgen(js_name = fromObject)]
    pub fn from_object(options: JsValue) -> Result<Transformer, JsValue> {
        let options: TransformOptions = if options.is_undefined() || options.is_null() {
            TransformOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| crate::to_js_error(&TransformError::InvalidOptions(e.to_string())))?
        };
        Ok(Self { options })
    }

    /// Transform JSX to JavaScript, returning `{ code, had_jsx }`
    #[wasm_bindgen]
    pub fn transform(&self, source: &str) -> Result<JsValue, JsValue> {
        let result = transform(source, &self.options).map_err(|e| crate::to_js_error(&e))?;
        serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Transform and return just the code string (faster)
    #[wasm_bindgen]
    pub fn transform_code(&self, source: &str) -> Result<String, JsValue> {
        transform(source, &self.options)
            .map(|result| result.code)
            .map_err(|e| crate::to_js_error(&e))
    }

    /// Transform, returning the first error as `{ message, line, column }`
    /// instead of throwing
    #[wasm_bindgen]
    pub fn check(&self, source: &str) -> JsValue {
        match transform(source, &self.options) {
            Ok(_) => JsValue::NULL,
            Err(e) => serde_wasm_bindgen::to_value(&e.info()).unwrap_or(JsValue::NULL),
        }
    }
}

/// Transform with the classic runtime in production mode
pub fn transform_jsx(source: &str) -> Result<String, TransformError> {
    transform(source, &TransformOptions::default()).map(|result| result.code)
}

/// Rewrite every JSX region in `source`.
///
/// Aborts on the first syntax error; no partial output is produced.
pub fn transform(source: &str, options: &TransformOptions) -> Result<TransformResult, TransformError> {
    // Nothing can start a JSX region without '<'.
    if !source.contains('<') {
        return Ok(TransformResult {
            code: source.to_string(),
            had_jsx: false,
        });
    }

    let mut cursor = Cursor::new(source);
    let segments = scan_program(&mut cursor)
        .map_err(|e| TransformError::syntax(e, source, &options.file_path))?;

    let regions = segments
        .iter()
        .filter(|segment| matches!(segment, crate::ast::Segment::Jsx(_)))
        .count();
    if regions == 0 {
        tracing::trace!(bytes = source.len(), "no JSX regions");
        return Ok(TransformResult {
            code: source.to_string(),
            had_jsx: false,
        });
    }

    let code = Rewriter::new(source, options).rewrite_program(&segments);
    tracing::debug!(
        file = %options.file_path,
        regions,
        input_bytes = source.len(),
        output_bytes = code.len(),
        "rewrote JSX"
    );
    Ok(TransformResult {
        code,
        had_jsx: true,
    })
}

/// Error payload for a failed transform, if any
pub fn check(source: &str, options: &TransformOptions) -> Option<ErrorInfo> {
    transform(source, options).err().map(|e| e.info())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::count_newlines;

    fn run(source: &str) -> String {
        transform_jsx(source).unwrap()
    }

    #[test]
    fn test_non_jsx_input_unchanged() {
        let sources = [
            "const x = 1;",
            "if (a < b && c > d) { run(); }",
            "const s = '<div>'; // <span>\n/* <p> */ const re = /<a>/;",
            "for (let i = 0; i<n; i++) total += i << 2;",
            "",
        ];
        for source in sources {
            let result = transform(source, &TransformOptions::default()).unwrap();
            assert_eq!(result.code, source);
            assert!(!result.had_jsx);
        }
    }

    #[test]
    fn test_self_closing_element() {
        assert_eq!(run("<div/>"), r#"createElement("div", null)"#);
    }

    #[test]
    fn test_component_with_expression_prop() {
        assert_eq!(run("<A x={1}/>"), "createElement(A, {x: 1})");
    }

    #[test]
    fn test_whitespace_folding() {
        assert_eq!(
            run("<div>  hello   world  </div>"),
            r#"createElement("div", null, "hello world")"#
        );
    }

    #[test]
    fn test_newline_whitespace_between_elements() {
        let output = run("<div>\n  <span/>\n</div>");
        assert_eq!(output, "createElement(\"div\", null,\ncreateElement(\"span\", null)\n)");
        assert!(!output.contains("\" \""));
    }

    #[test]
    fn test_fragment() {
        assert_eq!(run("<>text</>"), r#"createElement(Fragment, null, "text")"#);
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = transform_jsx("<div><span></div>").unwrap_err();
        let syntax = err.syntax_error().unwrap();
        assert_eq!(
            syntax.message,
            "Expected corresponding JSX closing tag for <span>"
        );
        assert_eq!((syntax.line, syntax.column), (1, 12));
    }

    #[test]
    fn test_spread_attribute() {
        assert_eq!(run("<div {...props}/>"), r#"createElement("div", {...props})"#);
    }

    #[test]
    fn test_surrounding_code_untouched() {
        let source = "const el = <b>hi</b>; // <i>\nexport default el;";
        assert_eq!(
            run(source),
            "const el = createElement(\"b\", null, \"hi\"); // <i>\nexport default el;"
        );
    }

    #[test]
    fn test_line_layout_preserved() {
        let source = "function App() {\n  return (\n    <div\n      id=\"app\"\n    >\n      <h1>{title}</h1>\n      text\n    </div>\n  );\n}\nconsole.log(App);\n";
        let output = run(source);
        assert_eq!(count_newlines(&output), count_newlines(source));
        let last_lines: Vec<&str> = output.lines().rev().take(2).collect();
        assert_eq!(last_lines, vec!["console.log(App);", "}"]);
        assert!(output.contains("id: \"app\"}"));
        assert!(output.contains("createElement(\"h1\", null, title)"));
        assert!(output.contains("\"text\""));
    }

    #[test]
    fn test_nested_jsx_in_expressions() {
        let source = "<ul>{items.map(item => <li key={item.id}>{item.label}</li>)}</ul>";
        assert_eq!(
            run(source),
            r#"createElement("ul", null, items.map(item => createElement("li", {key: item.id}, item.label)))"#
        );
    }

    #[test]
    fn test_jsx_in_attribute_and_template() {
        assert_eq!(
            run("<A icon={<Icon/>} />"),
            "createElement(A, {icon: createElement(Icon, null)})"
        );
        assert_eq!(
            run("const t = `${<b/>}`;"),
            "const t = `${createElement(\"b\", null)}`;"
        );
    }

    #[test]
    fn test_no_partial_output_on_error() {
        let source = "const a = <ok/>;\nconst b = <broken>;\n";
        let err = transform_jsx(source).unwrap_err();
        let info = err.info();
        assert_eq!(info.message, "Unterminated JSX contents");
        assert_eq!(info.line, 3);
    }

    #[test]
    fn test_first_error_in_source_order() {
        let source = "x = <a></b>;\ny = <c></d>;";
        let info = check(source, &TransformOptions::default()).unwrap();
        assert_eq!(info.line, 1);
        assert_eq!(info.message, "Expected corresponding JSX closing tag for <a>");
    }

    #[test]
    fn test_error_carries_file_path() {
        let options = TransformOptions {
            file_path: "src/App.jsx".to_string(),
            ..TransformOptions::default()
        };
        let err = transform("<a>{value", &options).unwrap_err();
        assert!(err.to_string().starts_with("src/App.jsx:1:4: Unterminated JSX expression"));
    }

    #[test]
    fn test_development_prelude() {
        let options = TransformOptions {
            production: false,
            file_path: "App.jsx".to_string(),
            ..TransformOptions::default()
        };
        let result = transform("x = <br/>;\ny();", &options).unwrap();
        assert_eq!(
            result.code,
            "const _jsxFileName = \"App.jsx\";x = createElement(\"br\", {__self: this, __source: {fileName: _jsxFileName, lineNumber: 1}});\ny();"
        );
    }

    #[test]
    fn test_automatic_runtime_import() {
        let options = TransformOptions {
            jsx_runtime: JsxRuntime::Automatic,
            ..TransformOptions::default()
        };
        let result = transform("#!/usr/bin/env node\nrender(<><p/><p/></>);", &options).unwrap();
        assert_eq!(
            result.code,
            "#!/usr/bin/env node\nimport {jsx as _jsx, jsxs as _jsxs, Fragment as _Fragment} from \"react/jsx-runtime\";render(_jsxs(_Fragment, {children: [_jsx(\"p\", {}), _jsx(\"p\", {})]}));"
        );
    }

    #[test]
    fn test_options_from_json() {
        let options =
            TransformOptions::from_json(r#"{"jsxRuntime": "automatic", "production": false}"#)
                .unwrap();
        assert_eq!(options.jsx_runtime, JsxRuntime::Automatic);
        assert!(!options.production);
        assert_eq!(options.jsx_pragma, "createElement");

        let err = TransformOptions::from_json(r#"{"jsxRuntime": "preact"}"#).unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions(_)));
    }

    #[test]
    fn test_non_breaking_spaces_survive() {
        assert_eq!(
            run("<p>a\u{00A0}\u{00A0}b</p>"),
            "createElement(\"p\", null, \"a\u{00A0}\u{00A0}b\")"
        );
        assert_eq!(
            run("<span>\u{00A0}</span>"),
            "createElement(\"span\", null, \"\u{00A0}\")"
        );
    }

    #[test]
    fn test_regex_after_statement_head_unchanged() {
        for source in [
            "if (ok) /<b>/.test(s);",
            "while (next()) /<i>/g.exec(s);",
            "const s = 'a\\\r\nb'; const x = a < b;",
        ] {
            let result = transform(source, &TransformOptions::default()).unwrap();
            assert_eq!(result.code, source);
            assert!(!result.had_jsx);
        }
        assert_eq!(
            run("if (ok) <A/>;"),
            "if (ok) createElement(A, null);"
        );
    }

    #[test]
    fn test_this_tag_is_a_reference() {
        assert_eq!(run("<this/>"), "createElement(this, null)");
        assert_eq!(run("<this.Item/>"), "createElement(this.Item, null)");
    }

    #[test]
    fn test_deep_nesting_is_an_error_on_a_small_stack() {
        let source = format!("x = {}{};", "<a>".repeat(5_000), "</a>".repeat(5_000));
        let handle = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || check(&source, &TransformOptions::default()))
            .unwrap();
        let info = handle.join().unwrap().unwrap();
        assert!(info.message.starts_with("JSX nesting exceeds"));
        assert_eq!(info.line, 1);
    }

    #[test]
    fn test_runtime_setter_ignores_unknown_values() {
        let mut options = TransformOptions::new();
        options.set_jsx_runtime("automatic");
        assert_eq!(options.jsx_runtime, JsxRuntime::Automatic);
        options.set_jsx_runtime("bogus");
        assert_eq!(options.jsx_runtime, JsxRuntime::Automatic);
    }
}
