//! Host-language (JavaScript) scanner.
//!
//! Knows just enough of the lexical grammar to copy code through untouched
//! and to find where JSX regions start: strings, template literals,
//! comments, regular expressions, brackets, and whether the previous
//! significant token leaves the scanner at an expression start.

use crate::ast::{Expression, Segment, Span};
use crate::error::SyntaxError;
use crate::lexer::Cursor;
use crate::parser::parse_jsx;
use crate::utils::{is_identifier_part, is_identifier_start};

/// Keywords after which an operand is expected
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "default",
    "extends",
];

/// Keywords whose parenthesized head is followed by a statement, not an operator
const STATEMENT_HEAD_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Classification of the previous significant token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// An operand may start here: `<` opens JSX, `/` opens a regex
    ExpressionStart,
    /// An operator is expected: `<` compares, `/` divides
    ExpressionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    TemplateSubstitution,
}

/// Where a scan stops
#[derive(Debug, Clone, Copy)]
enum Until {
    EndOfInput,
    /// The unmatched `}` closing the container opened at `open`
    CloseBrace { open: usize },
}

struct HostScanner<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    position: Position,
    after_dot: bool,
    /// The previous token was a statement-head keyword
    after_statement_head: bool,
    braces: Vec<Brace>,
    /// One entry per open `(`: whether it opened a statement head
    parens: Vec<bool>,
    segments: Vec<Segment<'a>>,
    segment_start: usize,
    has_content: bool,
}

/// Scan a whole program into source segments and JSX regions
pub fn scan_program<'a>(cursor: &mut Cursor<'a>) -> Result<Vec<Segment<'a>>, SyntaxError> {
    if cursor.pos() == 0 && cursor.peek() == b'#' && cursor.peek_n(1) == b'!' {
        cursor.skip_line_comment();
    }
    let (segments, _) = HostScanner::new_at(cursor, 0).run(Until::EndOfInput)?;
    Ok(segments)
}

/// Scan the inside of a `{...}` container.
///
/// The cursor must sit just past the `{`; on success it is left on the
/// closing `}`.
pub fn scan_expression<'a>(
    cursor: &mut Cursor<'a>,
    open: usize,
) -> Result<Expression<'a>, SyntaxError> {
    let start = cursor.pos();
    let (segments, has_content) = HostScanner::new(cursor).run(Until::CloseBrace { open })?;
    Ok(Expression {
        segments,
        is_empty: !has_content,
        span: Span::new(start, cursor.pos()),
    })
}

impl<'c, 'a> HostScanner<'c, 'a> {
    fn new(cursor: &'c mut Cursor<'a>) -> Self {
        let segment_start = cursor.pos();
        Self::new_at(cursor, segment_start)
    }

    /// Scanner whose first source segment starts at `segment_start`
    fn new_at(cursor: &'c mut Cursor<'a>, segment_start: usize) -> Self {
        Self {
            cursor,
            position: Position::ExpressionStart,
            after_dot: false,
            after_statement_head: false,
            braces: Vec::new(),
            parens: Vec::new(),
            segments: Vec::new(),
            segment_start,
            has_content: false,
        }
    }

    fn run(mut self, until: Until) -> Result<(Vec<Segment<'a>>, bool), SyntaxError> {
        loop {
            if self.cursor.is_eof() {
                if let Until::CloseBrace { open } = until {
                    return Err(self.cursor.error("Unterminated JSX expression", open));
                }
                break;
            }

            let ch = self.cursor.peek();
            match ch {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => {
                    self.cursor.advance();
                    continue;
                }
                b'/' if self.cursor.peek_n(1) == b'/' => {
                    self.cursor.skip_line_comment();
                    continue;
                }
                b'/' if self.cursor.peek_n(1) == b'*' => {
                    self.cursor.skip_block_comment()?;
                    continue;
                }
                _ => {}
            }

            if ch == b'}' && self.braces.is_empty() {
                if let Until::CloseBrace { .. } = until {
                    break;
                }
            }

            self.has_content = true;
            match ch {
                b'\'' | b'"' => {
                    self.cursor.skip_string()?;
                    self.set(Position::ExpressionEnd);
                }
                b'`' => {
                    self.cursor.advance();
                    self.scan_template()?;
                }
                b'{' => {
                    self.braces.push(Brace::Block);
                    self.cursor.advance();
                    self.set(Position::ExpressionStart);
                }
                b'}' => match self.braces.pop() {
                    Some(Brace::TemplateSubstitution) => {
                        self.cursor.advance();
                        self.scan_template()?;
                    }
                    Some(Brace::Block) => {
                        self.cursor.advance();
                        self.set(Position::ExpressionStart);
                    }
                    None => {
                        // Unbalanced in the host code itself; copy it through.
                        self.cursor.advance();
                        self.set(Position::ExpressionStart);
                    }
                },
                b'(' => {
                    self.parens.push(self.after_statement_head);
                    self.cursor.advance();
                    self.set(Position::ExpressionStart);
                }
                b')' => {
                    self.cursor.advance();
                    // `if (...) /re/` and `while (...) <A/>` start a statement
                    if self.parens.pop().unwrap_or(false) {
                        self.set(Position::ExpressionStart);
                    } else {
                        self.set(Position::ExpressionEnd);
                    }
                }
                b'[' => {
                    self.cursor.advance();
                    self.set(Position::ExpressionStart);
                }
                b']' => {
                    self.cursor.advance();
                    self.set(Position::ExpressionEnd);
                }
                b'/' => {
                    if self.position == Position::ExpressionStart {
                        self.cursor.skip_regex()?;
                        self.set(Position::ExpressionEnd);
                    } else {
                        self.cursor.advance();
                        self.set(Position::ExpressionStart);
                    }
                }
                b'<' if self.at_jsx_start() => {
                    self.flush_source();
                    let node = parse_jsx(self.cursor)?;
                    self.segments.push(Segment::Jsx(node));
                    self.segment_start = self.cursor.pos();
                    self.set(Position::ExpressionEnd);
                }
                b'.' if self.cursor.peek_n(1).is_ascii_digit() => self.scan_number(),
                b'.' => {
                    if self.cursor.peek_n(1) == b'.' && self.cursor.peek_n(2) == b'.' {
                        self.cursor.advance_n(3);
                        self.set(Position::ExpressionStart);
                    } else {
                        self.cursor.advance();
                        self.position = Position::ExpressionStart;
                        self.after_dot = true;
                    }
                }
                b'0'..=b'9' => self.scan_number(),
                b'+' | b'-' if self.cursor.peek_n(1) == ch => {
                    // `++`/`--` keep whatever the operand side was
                    self.cursor.advance_n(2);
                }
                _ => self.scan_word_or_punctuator(),
            }
        }

        self.flush_source();
        Ok((self.segments, self.has_content))
    }

    fn set(&mut self, position: Position) {
        self.position = position;
        self.after_dot = false;
        self.after_statement_head = false;
    }

    fn at_jsx_start(&self) -> bool {
        if self.position != Position::ExpressionStart || self.after_dot {
            return false;
        }
        match self.cursor.peek_char_at(1) {
            Some('>') => true,
            Some(c) => is_identifier_start(c),
            None => false,
        }
    }

    fn flush_source(&mut self) {
        let end = self.cursor.pos();
        if end > self.segment_start {
            self.segments.push(Segment::Source {
                text: self.cursor.slice(self.segment_start, end),
                span: Span::new(self.segment_start, end),
            });
        }
        self.segment_start = end;
    }

    /// Scan template characters after a backtick or a substitution's `}`
    fn scan_template(&mut self) -> Result<(), SyntaxError> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            match self.cursor.peek() {
                b'\\' => self.cursor.advance_n(2),
                b'`' => {
                    self.cursor.advance();
                    self.set(Position::ExpressionEnd);
                    return Ok(());
                }
                b'$' if self.cursor.peek_n(1) == b'{' => {
                    self.cursor.advance_n(2);
                    self.braces.push(Brace::TemplateSubstitution);
                    self.set(Position::ExpressionStart);
                    return Ok(());
                }
                _ => self.cursor.advance(),
            }
        }
        Err(self
            .cursor
            .error("Unterminated template", start.saturating_sub(1)))
    }

    fn scan_number(&mut self) {
        while !self.cursor.is_eof() {
            let b = self.cursor.peek();
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.set(Position::ExpressionEnd);
    }

    fn scan_word_or_punctuator(&mut self) {
        let start = self.cursor.pos();
        if let Some(c) = self.cursor.peek_char() {
            if is_identifier_start(c) || c == '\\' {
                self.cursor.advance_char();
                while let Some(c) = self.cursor.peek_char() {
                    if is_identifier_part(c) || c == '\\' {
                        self.cursor.advance_char();
                    } else {
                        break;
                    }
                }
                let word = self.cursor.slice(start, self.cursor.pos());
                let keyword = !self.after_dot;
                let position = if keyword && EXPRESSION_KEYWORDS.contains(&word) {
                    Position::ExpressionStart
                } else {
                    Position::ExpressionEnd
                };
                self.set(position);
                self.after_statement_head = keyword && STATEMENT_HEAD_KEYWORDS.contains(&word);
                return;
            }
        }

        if self.cursor.peek() == b'=' && self.cursor.peek_n(1) == b'>' {
            self.cursor.advance_n(2);
        } else {
            self.cursor.advance_char();
            if self.cursor.pos() == start {
                self.cursor.advance();
            }
        }
        // Any other punctuator expects an operand next.
        self.set(Position::ExpressionStart);
    }
}
