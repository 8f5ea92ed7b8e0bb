//! JSX rewriter
//!
//! Emits plain function calls for parsed JSX and copies host code through
//! verbatim. Output lines are kept aligned with the input: before a piece of
//! JSX that starts on a later source line is written, the rewriter emits the
//! missing newlines, so code after a JSX region stays on its original line.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{Attribute, AttributeValue, Element, Expression, Fragment, JsxNode, Segment};
use crate::transformer::{JsxRuntime, TransformOptions};
use crate::utils::{count_newlines, is_identifier_name, quote_js_string, LineIndex};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"[ \t\r\n]+").unwrap();
}

/// JSX folds only these; other Unicode spaces such as U+00A0 are content
fn is_jsx_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Helpers referenced by automatic-runtime output
#[derive(Debug, Clone, Copy, Default)]
struct UsedHelpers {
    jsx: bool,
    jsxs: bool,
    jsx_dev: bool,
    fragment: bool,
}

/// A child that survives whitespace folding
enum Child<'n, 'a> {
    Text { value: String, offset: usize },
    Node(&'n JsxNode<'a>),
}

pub struct Rewriter<'o, 's> {
    options: &'o TransformOptions,
    lines: LineIndex<'s>,
    out: String,
    /// Source line the output is currently on
    line: usize,
    helpers: UsedHelpers,
    jsx_count: usize,
}

impl<'o, 's> Rewriter<'o, 's> {
    pub fn new(source: &'s str, options: &'o TransformOptions) -> Self {
        Self {
            options,
            lines: LineIndex::new(source),
            out: String::with_capacity(source.len() * 2),
            line: 1,
            helpers: UsedHelpers::default(),
            jsx_count: 0,
        }
    }

    /// Rewrite a scanned program and return the complete output
    pub fn rewrite_program(mut self, segments: &[Segment<'_>]) -> String {
        for segment in segments {
            match segment {
                Segment::Source { text, .. } => self.emit_source(text),
                Segment::Jsx(node) => {
                    self.jsx_count += 1;
                    self.emit_node(node);
                    self.pad_to(node.span().end);
                }
            }
        }
        let prelude = self.prelude();
        if prelude.is_empty() {
            return self.out;
        }
        // Keep a hashbang on the first line.
        let insert_at = if self.out.starts_with("#!") {
            self.out.find('\n').map(|i| i + 1).unwrap_or(self.out.len())
        } else {
            0
        };
        self.out.insert_str(insert_at, &prelude);
        self.out
    }

    /// Rewrite a single JSX node into an expression string
    pub fn rewrite_node(mut self, node: &JsxNode<'_>) -> String {
        self.line = self.lines.line(node.span().start);
        self.emit_node(node);
        self.out
    }

    /// Declarations the output depends on, written without newlines
    fn prelude(&self) -> String {
        let mut prelude = String::new();
        if self.jsx_count == 0 {
            return prelude;
        }
        if self.options.jsx_runtime == JsxRuntime::Automatic {
            let mut names = Vec::new();
            if self.helpers.jsx {
                names.push("jsx as _jsx");
            }
            if self.helpers.jsxs {
                names.push("jsxs as _jsxs");
            }
            if self.helpers.jsx_dev {
                names.push("jsxDEV as _jsxDEV");
            }
            if self.helpers.fragment {
                names.push("Fragment as _Fragment");
            }
            let module = if self.options.production {
                "jsx-runtime"
            } else {
                "jsx-dev-runtime"
            };
            prelude.push_str(&format!(
                "import {{{}}} from {};",
                names.join(", "),
                quote_js_string(&format!("{}/{}", self.options.jsx_import_source, module))
            ));
        }
        if !self.options.production {
            prelude.push_str(&format!(
                "const _jsxFileName = {};",
                quote_js_string(&self.options.file_path)
            ));
        }
        prelude
    }

    fn emit_source(&mut self, text: &str) {
        self.out.push_str(text);
        self.line += count_newlines(text);
    }

    /// Emit newlines until the output reaches the line of `offset`.
    ///
    /// Returns whether anything was written.
    fn pad_to(&mut self, offset: usize) -> bool {
        let target = self.lines.line(offset);
        if target <= self.line {
            return false;
        }
        for _ in self.line..target {
            self.out.push('\n');
        }
        self.line = target;
        true
    }

    /// `,` followed by either a line break to `offset`'s line or a space
    fn separator(&mut self, offset: usize) {
        self.out.push(',');
        if !self.pad_to(offset) {
            self.out.push(' ');
        }
    }

    fn emit_node(&mut self, node: &JsxNode<'_>) {
        match node {
            JsxNode::Element(el) => match self.options.jsx_runtime {
                JsxRuntime::Classic => self.emit_classic_element(el),
                JsxRuntime::Automatic => self.emit_automatic_element(el),
            },
            JsxNode::Fragment(frag) => match self.options.jsx_runtime {
                JsxRuntime::Classic => self.emit_classic_fragment(frag),
                JsxRuntime::Automatic => self.emit_automatic_fragment(frag),
            },
            JsxNode::Expression(expr) => self.emit_expression(expr),
            JsxNode::Text(text) => {
                if let Some(value) = fold_text(text.raw, true, true) {
                    self.out.push_str(&quote_js_string(&value));
                }
            }
        }
    }

    fn emit_tag(&mut self, el: &Element<'_>) {
        if el.is_intrinsic() {
            self.out.push_str(&quote_js_string(el.name));
        } else {
            self.out.push_str(el.name);
        }
    }

    fn emit_classic_element(&mut self, el: &Element<'_>) {
        self.out.push_str(&self.options.jsx_pragma);
        self.out.push('(');
        self.emit_tag(el);
        self.out.push_str(", ");

        let dev_source = !self.options.production;
        if el.attributes.is_empty() && !dev_source {
            self.out.push_str("null");
        } else {
            self.out.push('{');
            let written = self.emit_attributes(el.attributes.iter());
            if dev_source {
                if written > 0 {
                    self.out.push_str(", ");
                }
                let line = self.lines.line(el.span.start);
                self.out.push_str(&format!(
                    "__self: this, __source: {{fileName: _jsxFileName, lineNumber: {}}}",
                    line
                ));
            }
            self.out.push('}');
        }

        for child in prepare_children(&el.children) {
            self.separator(child.offset());
            self.emit_child(&child);
        }
        self.pad_to(el.span.end.saturating_sub(1));
        self.out.push(')');
    }

    fn emit_classic_fragment(&mut self, frag: &Fragment<'_>) {
        self.out.push_str(&self.options.jsx_pragma);
        self.out.push('(');
        self.out.push_str(&self.options.jsx_fragment_pragma);
        self.out.push_str(", null");
        for child in prepare_children(&frag.children) {
            self.separator(child.offset());
            self.emit_child(&child);
        }
        self.pad_to(frag.span.end.saturating_sub(1));
        self.out.push(')');
    }

    fn emit_automatic_element(&mut self, el: &Element<'_>) {
        let key_index = key_attribute_index(&el.attributes);
        let children = prepare_children(&el.children);
        let callee = self.automatic_callee(children.len());
        self.out.push_str(callee);
        self.out.push('(');
        self.emit_tag(el);
        self.out.push_str(", {");
        let props = el
            .attributes
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != key_index)
            .map(|(_, attr)| attr);
        let written = self.emit_attributes(props);
        self.emit_children_prop(&children, written > 0);
        self.out.push('}');

        let key = key_index.map(|i| &el.attributes[i]);
        self.emit_automatic_tail(key, children.len(), el.span.start);
        self.pad_to(el.span.end.saturating_sub(1));
        self.out.push(')');
    }

    fn emit_automatic_fragment(&mut self, frag: &Fragment<'_>) {
        let children = prepare_children(&frag.children);
        let callee = self.automatic_callee(children.len());
        self.helpers.fragment = true;
        self.out.push_str(callee);
        self.out.push_str("(_Fragment, {");
        self.emit_children_prop(&children, false);
        self.out.push('}');
        self.emit_automatic_tail(None, children.len(), frag.span.start);
        self.pad_to(frag.span.end.saturating_sub(1));
        self.out.push(')');
    }

    fn automatic_callee(&mut self, child_count: usize) -> &'static str {
        if !self.options.production {
            self.helpers.jsx_dev = true;
            "_jsxDEV"
        } else if child_count > 1 {
            self.helpers.jsxs = true;
            "_jsxs"
        } else {
            self.helpers.jsx = true;
            "_jsx"
        }
    }

    /// Key argument, plus the development-only arguments of `jsxDEV`
    fn emit_automatic_tail(&mut self, key: Option<&Attribute<'_>>, child_count: usize, start: usize) {
        if let Some(Attribute::Named { value, span, .. }) = key {
            self.separator(span.start);
            self.emit_attribute_value(value.as_ref());
        } else if !self.options.production {
            self.out.push_str(", void 0");
        }
        if !self.options.production {
            let (line, column) = self.lines.line_col(start);
            self.out.push_str(&format!(
                ", {}, {{fileName: _jsxFileName, lineNumber: {}, columnNumber: {}}}, this",
                child_count > 1,
                line,
                column
            ));
        }
    }

    fn emit_children_prop(&mut self, children: &[Child<'_, '_>], after_props: bool) {
        if children.is_empty() {
            return;
        }
        if after_props {
            self.out.push_str(", ");
        }
        self.out.push_str("children: ");
        if children.len() == 1 {
            self.pad_to(children[0].offset());
            self.emit_child(&children[0]);
            return;
        }
        self.out.push('[');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.separator(child.offset());
            } else {
                self.pad_to(child.offset());
            }
            self.emit_child(child);
        }
        self.out.push(']');
    }

    /// Object literal members for `attributes`; returns how many were written
    fn emit_attributes<'x, 'a: 'x>(
        &mut self,
        attributes: impl Iterator<Item = &'x Attribute<'a>>,
    ) -> usize {
        let mut written = 0;
        for attr in attributes {
            let start = attr.span().start;
            if written > 0 {
                self.separator(start);
            } else {
                self.pad_to(start);
            }
            match attr {
                Attribute::Named { name, value, .. } => {
                    if is_identifier_name(name) {
                        self.out.push_str(name);
                    } else {
                        self.out.push_str(&quote_js_string(name));
                    }
                    self.out.push_str(": ");
                    self.emit_attribute_value(value.as_ref());
                }
                Attribute::Spread { expression, .. } => {
                    self.out.push_str("...");
                    self.emit_expression(expression);
                }
            }
            written += 1;
        }
        written
    }

    fn emit_attribute_value(&mut self, value: Option<&AttributeValue<'_>>) {
        match value {
            None => self.out.push_str("true"),
            Some(AttributeValue::String { raw, .. }) => {
                self.out.push_str(&quote_js_string(raw));
            }
            Some(AttributeValue::Expression(expr)) => self.emit_expression(expr),
            Some(AttributeValue::Element(node)) => self.emit_node(node),
        }
    }

    fn emit_child(&mut self, child: &Child<'_, '_>) {
        match child {
            Child::Text { value, .. } => self.out.push_str(&quote_js_string(value)),
            Child::Node(node) => self.emit_node(node),
        }
    }

    /// Expression container contents, outer whitespace trimmed.
    ///
    /// A trailing line break is kept so a trailing line comment cannot
    /// swallow the rest of the call.
    fn emit_expression(&mut self, expr: &Expression<'_>) {
        let last = expr.segments.len().saturating_sub(1);
        for (i, segment) in expr.segments.iter().enumerate() {
            match segment {
                Segment::Source { text, span } => {
                    let mut text: &str = text;
                    let mut start = span.start;
                    if i == 0 {
                        let trimmed = text.trim_start();
                        start += text.len() - trimmed.len();
                        text = trimmed;
                        self.pad_to(start);
                    }
                    if i == last {
                        let trimmed = text.trim_end();
                        let tail = &text[trimmed.len()..];
                        self.emit_source(trimmed);
                        if tail.contains(['\n', '\r']) {
                            self.out.push('\n');
                            self.line += 1;
                        }
                    } else {
                        self.emit_source(text);
                    }
                }
                Segment::Jsx(node) => {
                    if i == 0 {
                        self.pad_to(node.span().start);
                    }
                    self.emit_node(node);
                }
            }
        }
    }
}

impl<'n, 'a> Child<'n, 'a> {
    fn offset(&self) -> usize {
        match self {
            Child::Text { offset, .. } => *offset,
            Child::Node(node) => node.span().start,
        }
    }
}

/// Fold text children and drop empty expression containers
fn prepare_children<'n, 'a>(children: &'n [JsxNode<'a>]) -> Vec<Child<'n, 'a>> {
    let last = children.len().saturating_sub(1);
    let mut prepared = Vec::with_capacity(children.len());
    for (i, child) in children.iter().enumerate() {
        match child {
            JsxNode::Text(text) => {
                if let Some(value) = fold_text(text.raw, i == 0, i == last) {
                    let leading =
                        text.raw.len() - text.raw.trim_start_matches(is_jsx_whitespace).len();
                    prepared.push(Child::Text {
                        value,
                        offset: text.span.start + leading,
                    });
                }
            }
            JsxNode::Expression(expr) if expr.is_empty => {}
            node => prepared.push(Child::Node(node)),
        }
    }
    prepared
}

/// Index of a `key` attribute that can be passed separately.
///
/// A key preceded by a spread stays in props so the spread cannot
/// override it.
fn key_attribute_index(attributes: &[Attribute<'_>]) -> Option<usize> {
    let mut seen_spread = false;
    for (i, attr) in attributes.iter().enumerate() {
        match attr {
            Attribute::Spread { .. } => seen_spread = true,
            attr if attr.is_key() => return if seen_spread { None } else { Some(i) },
            _ => {}
        }
    }
    None
}

/// Whitespace folding for a text child.
///
/// Whitespace-only text is dropped when it spans lines and becomes a single
/// space otherwise. Other text has inner whitespace runs collapsed to one
/// space; outer whitespace is removed when it contains a line break or sits
/// at the start (end) of the parent's children, else kept as one space.
pub fn fold_text(raw: &str, is_first: bool, is_last: bool) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(is_jsx_whitespace) {
        if raw.contains(['\n', '\r']) {
            return None;
        }
        return Some(" ".to_string());
    }

    let inner = raw.trim_matches(is_jsx_whitespace);
    let leading = &raw[..raw.len() - raw.trim_start_matches(is_jsx_whitespace).len()];
    let trailing = &raw[raw.trim_end_matches(is_jsx_whitespace).len()..];
    let mut value = String::with_capacity(raw.len());
    if !leading.is_empty() && !is_first && !leading.contains(['\n', '\r']) {
        value.push(' ');
    }
    value.push_str(&WHITESPACE_RE.replace_all(inner, " "));
    if !trailing.is_empty() && !is_last && !trailing.contains(['\n', '\r']) {
        value.push(' ');
    }
    Some(value)
}
