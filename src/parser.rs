//! Recursive-descent JSX parser
//!
//! Starts at a `<` the host scanner identified as a JSX region and builds
//! one `JsxNode`, leaving the cursor just past the matching close.
//! `{...}` containers are handed back to the host scanner, so JSX nested in
//! expressions is parsed by the same code.

use crate::ast::{Attribute, AttributeValue, Element, Expression, Fragment, JsxNode, Span, Text};
use crate::error::SyntaxError;
use crate::host::scan_expression;
use crate::lexer::{Cursor, Token, TokenKind};

/// Parse one element or fragment starting at `<`
pub fn parse_jsx<'a>(cursor: &mut Cursor<'a>) -> Result<JsxNode<'a>, SyntaxError> {
    let start = cursor.pos();
    cursor.enter_jsx(start)?;
    let node = parse_element_or_fragment(cursor, start);
    cursor.exit_jsx();
    node
}

fn parse_element_or_fragment<'a>(
    cursor: &mut Cursor<'a>,
    start: usize,
) -> Result<JsxNode<'a>, SyntaxError> {
    expect(cursor, TokenKind::LessThan, "Expected '<'")?;

    if cursor.peek_tag_token()?.kind == TokenKind::GreaterThan {
        cursor.next_tag_token()?;
        return parse_fragment(cursor, start);
    }

    let name = parse_element_name(cursor)?;
    let attributes = parse_attributes(cursor)?;

    let token = cursor.next_tag_token()?;
    match token.kind {
        TokenKind::Slash => {
            expect(cursor, TokenKind::GreaterThan, "Expected '>' after '/'")?;
            Ok(JsxNode::Element(Element {
                name,
                attributes,
                children: Vec::new(),
                self_closing: true,
                span: Span::new(start, cursor.pos()),
            }))
        }
        TokenKind::GreaterThan => {
            let children = parse_children(cursor, Some(name))?;
            Ok(JsxNode::Element(Element {
                name,
                attributes,
                children,
                self_closing: false,
                span: Span::new(start, cursor.pos()),
            }))
        }
        _ => Err(unexpected(cursor, token)),
    }
}

fn parse_fragment<'a>(cursor: &mut Cursor<'a>, start: usize) -> Result<JsxNode<'a>, SyntaxError> {
    let children = parse_children(cursor, None)?;
    Ok(JsxNode::Fragment(Fragment {
        children,
        span: Span::new(start, cursor.pos()),
    }))
}

/// `name`, `ns:name`, or `a.b.c`
fn parse_element_name<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, SyntaxError> {
    let first = cursor.next_tag_token()?;
    if first.kind != TokenKind::Name {
        return Err(unexpected(cursor, first));
    }
    let start = first.span.start;
    let mut end = first.span.end;

    match cursor.peek_tag_token()?.kind {
        TokenKind::Colon => {
            cursor.next_tag_token()?;
            end = expect(cursor, TokenKind::Name, "Expected a name after ':'")?.span.end;
        }
        TokenKind::Dot => {
            while cursor.peek_tag_token()?.kind == TokenKind::Dot {
                cursor.next_tag_token()?;
                end = expect(cursor, TokenKind::Name, "Expected a name after '.'")?.span.end;
            }
        }
        _ => {}
    }

    let name = cursor.slice(start, end);
    if name.contains(|c: char| c.is_whitespace() || c == '/') {
        return Err(cursor.error("Unexpected whitespace in JSX tag name", start));
    }
    if name.contains('.') && name.contains('-') {
        return Err(cursor.error("Member tag names may not contain '-'", start));
    }
    Ok(name)
}

fn parse_attributes<'a>(cursor: &mut Cursor<'a>) -> Result<Vec<Attribute<'a>>, SyntaxError> {
    let mut attributes = Vec::new();
    loop {
        let token = cursor.peek_tag_token()?;
        match token.kind {
            TokenKind::Slash | TokenKind::GreaterThan => return Ok(attributes),
            TokenKind::LeftBrace => {
                cursor.next_tag_token()?;
                attributes.push(parse_spread_attribute(cursor, token.span.start)?);
            }
            TokenKind::Name => {
                cursor.next_tag_token()?;
                attributes.push(parse_named_attribute(cursor, token)?);
            }
            _ => {
                cursor.next_tag_token()?;
                return Err(unexpected(cursor, token));
            }
        }
    }
}

fn parse_spread_attribute<'a>(
    cursor: &mut Cursor<'a>,
    open: usize,
) -> Result<Attribute<'a>, SyntaxError> {
    cursor.skip_trivia()?;
    if !(cursor.peek() == b'.' && cursor.peek_n(1) == b'.' && cursor.peek_n(2) == b'.') {
        return Err(cursor.error("Expected '...' in JSX spread attribute", cursor.pos()));
    }
    cursor.advance_n(3);
    let expression = parse_container_body(cursor, open)?;
    if expression.is_empty {
        return Err(cursor.error("Expected an expression after '...'", open));
    }
    Ok(Attribute::Spread {
        expression,
        span: Span::new(open, cursor.pos()),
    })
}

fn parse_named_attribute<'a>(
    cursor: &mut Cursor<'a>,
    first: Token,
) -> Result<Attribute<'a>, SyntaxError> {
    let start = first.span.start;
    let mut end = first.span.end;
    if cursor.peek_tag_token()?.kind == TokenKind::Colon {
        cursor.next_tag_token()?;
        end = expect(cursor, TokenKind::Name, "Expected a name after ':'")?.span.end;
    }
    let name = cursor.slice(start, end);
    if name.contains(|c: char| c.is_whitespace() || c == '/') {
        return Err(cursor.error("Unexpected whitespace in attribute name", start));
    }

    if cursor.peek_tag_token()?.kind != TokenKind::Equals {
        return Ok(Attribute::Named {
            name,
            value: None,
            span: Span::new(start, end),
        });
    }
    cursor.next_tag_token()?;

    let value_token = cursor.peek_tag_token()?;
    let value = match value_token.kind {
        TokenKind::String => {
            cursor.next_tag_token()?;
            let span = Span::new(value_token.span.start + 1, value_token.span.end - 1);
            AttributeValue::String {
                raw: cursor.slice(span.start, span.end),
                span,
            }
        }
        TokenKind::LeftBrace => {
            cursor.next_tag_token()?;
            let expression = parse_container_body(cursor, value_token.span.start)?;
            if expression.is_empty {
                return Err(cursor.error(
                    "JSX attributes must only be assigned a non-empty expression",
                    value_token.span.start,
                ));
            }
            AttributeValue::Expression(expression)
        }
        TokenKind::LessThan => {
            cursor.skip_trivia()?;
            AttributeValue::Element(Box::new(parse_jsx(cursor)?))
        }
        _ => {
            return Err(cursor.error(
                "JSX value should be either an expression or a quoted JSX text",
                value_token.span.start,
            ));
        }
    };

    Ok(Attribute::Named {
        name,
        value: Some(value),
        span: Span::new(start, cursor.pos()),
    })
}

/// Contents of `{...}` after the `{`; consumes the closing `}`
fn parse_container_body<'a>(
    cursor: &mut Cursor<'a>,
    open: usize,
) -> Result<Expression<'a>, SyntaxError> {
    let expression = scan_expression(cursor, open)?;
    // scan_expression stops on the unmatched '}'
    cursor.advance();
    Ok(expression)
}

/// Children up to and including the closing tag.
///
/// `parent` is `None` for fragments, which must close with `</>`.
fn parse_children<'a>(
    cursor: &mut Cursor<'a>,
    parent: Option<&'a str>,
) -> Result<Vec<JsxNode<'a>>, SyntaxError> {
    let mut children = Vec::new();
    loop {
        let token = cursor.next_child_token()?;
        match token.kind {
            TokenKind::Text => children.push(JsxNode::Text(Text {
                raw: token.text(cursor.source()),
                span: token.span,
            })),
            TokenKind::LeftBrace => {
                let expression = parse_container_body(cursor, token.span.start)?;
                children.push(JsxNode::Expression(expression));
            }
            TokenKind::LessThan => {
                if cursor.peek_tag_token()?.kind == TokenKind::Slash {
                    cursor.next_tag_token()?;
                    parse_closing_tag(cursor, parent, token.span.start)?;
                    return Ok(children);
                }
                cursor.set_pos(token.span.start);
                children.push(parse_jsx(cursor)?);
            }
            _ => return Err(unexpected(cursor, token)),
        }
    }
}

fn parse_closing_tag<'a>(
    cursor: &mut Cursor<'a>,
    parent: Option<&'a str>,
    start: usize,
) -> Result<(), SyntaxError> {
    let next = cursor.peek_tag_token()?;
    match parent {
        None => {
            if next.kind != TokenKind::GreaterThan {
                return Err(cursor.error(
                    "Expected corresponding closing tag for JSX fragment",
                    start,
                ));
            }
            cursor.next_tag_token()?;
        }
        Some(open_name) => {
            if next.kind != TokenKind::Name {
                return Err(cursor.error(
                    format!("Expected corresponding JSX closing tag for <{}>", open_name),
                    start,
                ));
            }
            let close_name = parse_element_name(cursor)?;
            if close_name != open_name {
                return Err(cursor.error(
                    format!("Expected corresponding JSX closing tag for <{}>", open_name),
                    start,
                ));
            }
            expect(cursor, TokenKind::GreaterThan, "Expected '>' to close the tag")?;
        }
    }
    Ok(())
}

fn expect(cursor: &mut Cursor<'_>, kind: TokenKind, message: &str) -> Result<Token, SyntaxError> {
    let token = cursor.next_tag_token()?;
    if token.kind != kind {
        return Err(cursor.error(message, token.span.start));
    }
    Ok(token)
}

fn unexpected(cursor: &Cursor<'_>, token: Token) -> SyntaxError {
    cursor.error(
        format!("Unexpected token `{}`", token.text(cursor.source())),
        token.span.start,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Segment;

    fn parse(source: &str) -> Result<JsxNode<'_>, SyntaxError> {
        let mut cursor = Cursor::new(source);
        let node = parse_jsx(&mut cursor)?;
        assert_eq!(cursor.pos(), node.span().end);
        Ok(node)
    }

    fn element<'a>(node: &'a JsxNode<'a>) -> &'a Element<'a> {
        match node {
            JsxNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_self_closing() {
        let node = parse("<div/>").unwrap();
        let el = element(&node);
        assert_eq!(el.name, "div");
        assert!(el.self_closing);
        assert!(el.attributes.is_empty());
        assert_eq!(el.span, Span::new(0, 6));
    }

    #[test]
    fn test_member_and_namespaced_names() {
        let source = "<ui.Card.Header></ui.Card.Header>";
        assert_eq!(element(&parse(source).unwrap()).name, "ui.Card.Header");
        let source = "<svg:rect/>";
        assert_eq!(element(&parse(source).unwrap()).name, "svg:rect");
    }

    #[test]
    fn test_attributes() {
        let source = r#"<input type="text" disabled value={v} {...rest} xlink:href='#a'/>"#;
        let node = parse(source).unwrap();
        let el = element(&node);
        assert_eq!(el.attributes.len(), 5);
        match &el.attributes[0] {
            Attribute::Named {
                name,
                value: Some(AttributeValue::String { raw, .. }),
                ..
            } => {
                assert_eq!(*name, "type");
                assert_eq!(*raw, "text");
            }
            other => panic!("unexpected attribute {:?}", other),
        }
        assert!(matches!(
            &el.attributes[1],
            Attribute::Named { name: "disabled", value: None, .. }
        ));
        assert!(matches!(
            &el.attributes[2],
            Attribute::Named { value: Some(AttributeValue::Expression(_)), .. }
        ));
        assert!(matches!(&el.attributes[3], Attribute::Spread { .. }));
        assert!(matches!(
            &el.attributes[4],
            Attribute::Named { name: "xlink:href", .. }
        ));
    }

    #[test]
    fn test_children_kinds() {
        let node = parse("<p>Hi {name}<b>!</b></p>").unwrap();
        let el = element(&node);
        assert_eq!(el.children.len(), 3);
        assert!(matches!(&el.children[0], JsxNode::Text(t) if t.raw == "Hi "));
        assert!(matches!(&el.children[1], JsxNode::Expression(_)));
        assert!(matches!(&el.children[2], JsxNode::Element(b) if b.name == "b"));
    }

    #[test]
    fn test_text_kept_verbatim() {
        let node = parse("<p>a &amp; b\n  c</p>").unwrap();
        let el = element(&node);
        assert!(matches!(&el.children[0], JsxNode::Text(t) if t.raw == "a &amp; b\n  c"));
    }

    #[test]
    fn test_fragment() {
        let node = parse("<>text</>").unwrap();
        match node {
            JsxNode::Fragment(frag) => assert_eq!(frag.children.len(), 1),
            other => panic!("expected fragment, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_jsx_in_expression() {
        let node = parse("<ul>{items.map(i => <li>{i}</li>)}</ul>").unwrap();
        let el = element(&node);
        match &el.children[0] {
            JsxNode::Expression(expr) => {
                assert_eq!(expr.segments.len(), 3);
                assert!(matches!(&expr.segments[1], Segment::Jsx(_)));
            }
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_element_attribute_value() {
        let node = parse("<A icon=<Icon/> />").unwrap();
        let el = element(&node);
        assert!(matches!(
            &el.attributes[0],
            Attribute::Named { value: Some(AttributeValue::Element(_)), .. }
        ));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<div><span></div>").unwrap_err();
        assert_eq!(err.message, "Expected corresponding JSX closing tag for <span>");
        assert_eq!(err.column, 12);
    }

    #[test]
    fn test_fragment_closed_by_element() {
        let err = parse("<>x</div>").unwrap_err();
        assert_eq!(err.message, "Expected corresponding closing tag for JSX fragment");
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<div>text").unwrap_err();
        assert_eq!(err.message, "Unterminated JSX contents");
    }

    #[test]
    fn test_empty_attribute_expression() {
        let err = parse("<a b={} />").unwrap_err();
        assert_eq!(
            err.message,
            "JSX attributes must only be assigned a non-empty expression"
        );
    }

    #[test]
    fn test_malformed_attribute_value() {
        let err = parse("<a b=1 />").unwrap_err();
        assert_eq!(
            err.message,
            "JSX value should be either an expression or a quoted JSX text"
        );
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_nesting_limit() {
        use crate::lexer::MAX_JSX_DEPTH;

        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(parse(&nested(MAX_JSX_DEPTH)).is_ok());

        let source = nested(10_000);
        let err = parse(&source).unwrap_err();
        assert_eq!(err.message, format!("JSX nesting exceeds {} levels", MAX_JSX_DEPTH));
        assert_eq!(err.column, MAX_JSX_DEPTH * 3 + 1);

        // Elements nested through expression containers count too
        let through_expressions = format!("{}{}", "<a>{".repeat(10_000), "}</a>".repeat(10_000));
        let err = parse(&through_expressions).unwrap_err();
        assert!(err.message.starts_with("JSX nesting exceeds"));
    }

    #[test]
    fn test_spread_requires_ellipsis() {
        let err = parse("<a {props} />").unwrap_err();
        assert_eq!(err.message, "Expected '...' in JSX spread attribute");
    }
}
