//! Byte cursor and JSX token production.
//!
//! The cursor is shared between the host scanner and the JSX parser: both
//! advance the same position, so a JSX region ends exactly where host code
//! resumes.

use crate::ast::Span;
use crate::error::SyntaxError;
use crate::utils::{is_identifier_part, is_identifier_start};

/// Token kinds inside a JSX region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LessThan,
    GreaterThan,
    Slash,
    Equals,
    Dot,
    Colon,
    /// `{`, hands control to the host scanner
    LeftBrace,
    Name,
    /// Quoted attribute value, quotes included in the span
    String,
    /// Run of child text up to the next `<` or `{`
    Text,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// Deepest JSX nesting accepted; the parser recurses once per level
pub const MAX_JSX_DEPTH: usize = 64;

/// Fast cursor over the input
pub struct Cursor<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    len: usize,
    /// JSX elements and fragments currently open
    depth: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        Self {
            source,
            bytes,
            pos: 0,
            len: bytes.len(),
            depth: 0,
        }
    }

    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.len);
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.len
    }

    #[inline]
    pub fn peek(&self) -> u8 {
        if self.pos < self.len {
            self.bytes[self.pos]
        } else {
            0
        }
    }

    #[inline]
    pub fn peek_n(&self, n: usize) -> u8 {
        let pos = self.pos + n;
        if pos < self.len {
            self.bytes[pos]
        } else {
            0
        }
    }

    /// Character at the cursor, decoded as UTF-8
    #[inline]
    pub fn peek_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    /// Character `n` bytes ahead, when that offset is a char boundary
    #[inline]
    pub fn peek_char_at(&self, n: usize) -> Option<char> {
        self.source
            .get(self.pos + n..)
            .and_then(|rest| rest.chars().next())
    }

    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub fn advance_n(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.len);
    }

    /// Advance past the character at the cursor
    #[inline]
    pub fn advance_char(&mut self) {
        let width = self.peek_char().map(char::len_utf8).unwrap_or(1);
        self.advance_n(width);
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Enter a JSX element or fragment starting at `offset`
    pub fn enter_jsx(&mut self, offset: usize) -> Result<(), SyntaxError> {
        if self.depth >= MAX_JSX_DEPTH {
            return Err(self.error(
                format!("JSX nesting exceeds {} levels", MAX_JSX_DEPTH),
                offset,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_jsx(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn error(&self, message: impl Into<String>, offset: usize) -> SyntaxError {
        SyntaxError::new(message, self.source, offset)
    }

    /// Skip whitespace, line terminators and comments
    pub fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        while self.pos < self.len {
            match self.peek() {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.advance(),
                b'/' if self.peek_n(1) == b'/' => self.skip_line_comment(),
                b'/' if self.peek_n(1) == b'*' => self.skip_block_comment()?,
                _ => match self.peek_char() {
                    Some(c) if c.is_whitespace() => self.advance_char(),
                    _ => break,
                },
            }
        }
        Ok(())
    }

    pub fn skip_line_comment(&mut self) {
        self.advance_n(2);
        while self.pos < self.len && self.peek() != b'\n' && self.peek() != b'\r' {
            self.advance();
        }
    }

    pub fn skip_block_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.advance_n(2);
        while self.pos < self.len {
            if self.peek() == b'*' && self.peek_n(1) == b'/' {
                self.advance_n(2);
                return Ok(());
            }
            self.advance();
        }
        Err(self.error("Unterminated comment", start))
    }

    /// Skip a `'` or `"` string literal with escapes
    pub fn skip_string(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let quote = self.peek();
        self.advance();
        while self.pos < self.len {
            match self.peek() {
                // `\r\n` after a backslash is one line continuation
                b'\\' if self.peek_n(1) == b'\r' && self.peek_n(2) == b'\n' => self.advance_n(3),
                b'\\' => self.advance_n(2),
                b'\n' | b'\r' => break,
                ch if ch == quote => {
                    self.advance();
                    return Ok(());
                }
                _ => self.advance(),
            }
        }
        Err(self.error("Unterminated string constant", start))
    }

    /// Skip a regular expression literal, flags included
    pub fn skip_regex(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        self.advance();
        let mut in_class = false;
        loop {
            if self.pos >= self.len {
                return Err(self.error("Unterminated regular expression", start));
            }
            match self.peek() {
                b'\\' => self.advance_n(2),
                b'\n' | b'\r' => {
                    return Err(self.error("Unterminated regular expression", start));
                }
                b'[' => {
                    in_class = true;
                    self.advance();
                }
                b']' => {
                    in_class = false;
                    self.advance();
                }
                b'/' if !in_class => {
                    self.advance();
                    break;
                }
                _ => self.advance(),
            }
        }
        while let Some(c) = self.peek_char() {
            if is_identifier_part(c) {
                self.advance_char();
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Read an identifier-like word; JSX names may also contain `-`
    pub fn read_name(&mut self, allow_dash: bool) -> Option<Span> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if is_identifier_start(c) => self.advance_char(),
            _ => return None,
        }
        while let Some(c) = self.peek_char() {
            if is_identifier_part(c) || (allow_dash && c == '-') {
                self.advance_char();
            } else {
                break;
            }
        }
        Some(Span::new(start, self.pos))
    }

    /// Next token inside a tag: punctuation, names, quoted strings, `{`
    pub fn next_tag_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;
        let start = self.pos;
        if self.is_eof() {
            return Err(self.error("Unterminated JSX tag", start));
        }
        let kind = match self.peek() {
            b'<' => TokenKind::LessThan,
            b'>' => TokenKind::GreaterThan,
            b'/' => TokenKind::Slash,
            b'=' => TokenKind::Equals,
            b'.' => TokenKind::Dot,
            b':' => TokenKind::Colon,
            b'{' => TokenKind::LeftBrace,
            b'"' | b'\'' => {
                self.read_attribute_string()?;
                return Ok(Token {
                    kind: TokenKind::String,
                    span: Span::new(start, self.pos),
                });
            }
            _ => {
                if let Some(span) = self.read_name(true) {
                    return Ok(Token {
                        kind: TokenKind::Name,
                        span,
                    });
                }
                self.advance_char();
                return Ok(Token {
                    kind: TokenKind::Other,
                    span: Span::new(start, self.pos),
                });
            }
        };
        self.advance();
        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    /// Peek the next tag token without consuming it
    pub fn peek_tag_token(&mut self) -> Result<Token, SyntaxError> {
        let saved = self.pos;
        let token = self.next_tag_token();
        self.pos = saved;
        token
    }

    /// JSX attribute strings have no escapes and may span lines
    fn read_attribute_string(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let quote = self.peek();
        self.advance();
        while self.pos < self.len {
            if self.peek() == quote {
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(self.error("Unterminated string constant", start))
    }

    /// Next token among element children: `<`, `{` or a text run
    pub fn next_child_token(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        if self.is_eof() {
            return Err(self.error("Unterminated JSX contents", start));
        }
        let kind = match self.peek() {
            b'<' => {
                self.advance();
                TokenKind::LessThan
            }
            b'{' => {
                self.advance();
                TokenKind::LeftBrace
            }
            _ => {
                while self.pos < self.len && self.peek() != b'<' && self.peek() != b'{' {
                    self.advance();
                }
                TokenKind::Text
            }
        };
        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_tokens(source: &str) -> Vec<(TokenKind, String)> {
        let mut cursor = Cursor::new(source);
        let mut tokens = Vec::new();
        while !cursor.is_eof() {
            let token = cursor.next_tag_token().unwrap();
            tokens.push((token.kind, token.text(source).to_string()));
            if token.kind == TokenKind::GreaterThan {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_tag_tokens() {
        let tokens = tag_tokens(r#"<my-el data-id="x" /* note */ on={f}>"#);
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LessThan,
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Equals,
                TokenKind::String,
                TokenKind::Name,
                TokenKind::Equals,
                TokenKind::LeftBrace,
                TokenKind::Name,
                TokenKind::Other,
                TokenKind::GreaterThan,
            ]
        );
        assert_eq!(tokens[1].1, "my-el");
        assert_eq!(tokens[4].1, "\"x\"");
    }

    #[test]
    fn test_unterminated_attribute_string() {
        let mut cursor = Cursor::new("<a b=\"oops");
        cursor.set_pos(5);
        let err = cursor.next_tag_token().unwrap_err();
        assert_eq!(err.message, "Unterminated string constant");
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_unterminated_tag() {
        let mut cursor = Cursor::new("<a b ");
        cursor.set_pos(4);
        let err = cursor.next_tag_token().unwrap_err();
        assert_eq!(err.message, "Unterminated JSX tag");
    }

    #[test]
    fn test_child_tokens() {
        let source = "hello {name}<b/>";
        let mut cursor = Cursor::new(source);
        let text = cursor.next_child_token().unwrap();
        assert_eq!(text.kind, TokenKind::Text);
        assert_eq!(text.text(source), "hello ");
        assert_eq!(cursor.next_child_token().unwrap().kind, TokenKind::LeftBrace);
    }

    #[test]
    fn test_child_tokens_at_eof() {
        let mut cursor = Cursor::new("");
        let err = cursor.next_child_token().unwrap_err();
        assert_eq!(err.message, "Unterminated JSX contents");
    }

    #[test]
    fn test_skip_regex_with_class() {
        let source = "/[/<]+a/gi.test(x)";
        let mut cursor = Cursor::new(source);
        cursor.skip_regex().unwrap();
        assert_eq!(&source[cursor.pos()..], ".test(x)");
    }

    #[test]
    fn test_skip_string_escapes() {
        let source = r#""a\"<b>" rest"#;
        let mut cursor = Cursor::new(source);
        cursor.skip_string().unwrap();
        assert_eq!(&source[cursor.pos()..], " rest");
    }

    #[test]
    fn test_skip_string_line_continuations() {
        for source in ["'a\\\r\nb' rest", "'a\\\nb' rest", "'a\\\rb' rest"] {
            let mut cursor = Cursor::new(source);
            cursor.skip_string().unwrap();
            assert_eq!(&source[cursor.pos()..], " rest");
        }
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut cursor = Cursor::new("  /* open");
        let err = cursor.skip_trivia().unwrap_err();
        assert_eq!(err.message, "Unterminated comment");
        assert_eq!(err.column, 3);
    }
}
