//! Utility functions shared by the lexer, rewriter and WASM glue

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[\p{ID_Start}_$][\p{ID_Continue}_$\x{200C}\x{200D}]*$").unwrap();
}

/// Set up panic hook for better error messages in the browser console
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Maps byte offsets to 1-based line and column numbers.
///
/// Columns are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                _ => {}
            }
            i += 1;
        }
        Self { source, line_starts }
    }

    /// Line number (1-based) containing `offset`
    pub fn line(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Line and column (both 1-based) of `offset`
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line(offset);
        let start = self.line_starts[line - 1];
        let end = offset.min(self.source.len());
        let column = self
            .source
            .get(start..end)
            .map(|s| s.chars().count())
            .unwrap_or(end - start);
        (line, column + 1)
    }

    /// Text of the given 1-based line, without its terminator
    pub fn line_text(&self, line: usize) -> &'a str {
        let Some(&start) = self.line_starts.get(line.saturating_sub(1)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        self.source[start..end].trim_end_matches(['\n', '\r'])
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Count line terminators the way `LineIndex` does (`\r\n` counts once)
pub fn count_newlines(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => count += 1,
            b'\r' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    i += 1;
                }
                count += 1;
            }
            _ => {}
        }
        i += 1;
    }
    count
}

/// Render `text` as a double-quoted JavaScript string literal
pub fn quote_js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `name` can be used unquoted as an object literal key
pub fn is_identifier_name(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200C}' || ch == '\u{200D}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("ab\ncd\r\nef");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(1), (1, 2));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(7), (3, 1));
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_text(2), "cd");
    }

    #[test]
    fn test_column_counts_chars() {
        let index = LineIndex::new("é<a");
        assert_eq!(index.line_col(2), (1, 2));
    }

    #[test]
    fn test_count_newlines() {
        assert_eq!(count_newlines("a\nb\r\nc\rd"), 3);
        assert_eq!(count_newlines("plain"), 0);
    }

    #[test]
    fn test_quote_js_string() {
        assert_eq!(quote_js_string("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(quote_js_string("a\\b\nc"), r#""a\\b\nc""#);
    }

    #[test]
    fn test_identifier_name() {
        assert!(is_identifier_name("className"));
        assert!(is_identifier_name("$el"));
        assert!(!is_identifier_name("data-id"));
        assert!(!is_identifier_name("xlink:href"));
        assert!(!is_identifier_name("1abc"));
    }
}
