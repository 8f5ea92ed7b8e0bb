//! JSX tree produced by the parser and consumed by the rewriter.
//!
//! Nodes borrow their text from the transformed input and live for a
//! single transform call.

/// Byte range into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A piece of host-language code: copied verbatim or rewritten JSX
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Source { text: &'a str, span: Span },
    Jsx(JsxNode<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxNode<'a> {
    Element(Element<'a>),
    Fragment(Fragment<'a>),
    Expression(Expression<'a>),
    Text(Text<'a>),
}

impl<'a> JsxNode<'a> {
    pub fn span(&self) -> Span {
        match self {
            JsxNode::Element(el) => el.span,
            JsxNode::Fragment(frag) => frag.span,
            JsxNode::Expression(expr) => expr.span,
            JsxNode::Text(text) => text.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    /// Full tag name as written: `div`, `Foo.Bar`, `svg:rect`, `my-el`
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
    pub children: Vec<JsxNode<'a>>,
    pub self_closing: bool,
    /// From the opening `<` to past the closing `>`
    pub span: Span,
}

impl<'a> Element<'a> {
    /// Lowercase-initial names without a member access are host elements
    /// and are referenced by string; everything else, `this` included, is a
    /// component.
    pub fn is_intrinsic(&self) -> bool {
        let lowercase = self
            .name
            .chars()
            .next()
            .map(|c| c.is_lowercase())
            .unwrap_or(false);
        lowercase && self.name != "this" && !self.name.contains('.')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<'a> {
    pub children: Vec<JsxNode<'a>>,
    pub span: Span,
}

/// Host code inside `{...}`; may itself contain JSX
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<'a> {
    pub segments: Vec<Segment<'a>>,
    /// Only whitespace and comments between the braces
    pub is_empty: bool,
    /// Span of the contents, braces excluded
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text<'a> {
    pub raw: &'a str,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute<'a> {
    Named {
        name: &'a str,
        value: Option<AttributeValue<'a>>,
        span: Span,
    },
    Spread {
        expression: Expression<'a>,
        span: Span,
    },
}

impl<'a> Attribute<'a> {
    pub fn span(&self) -> Span {
        match self {
            Attribute::Named { span, .. } | Attribute::Spread { span, .. } => *span,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Attribute::Named { name: "key", .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue<'a> {
    /// Contents between the quotes, verbatim
    String { raw: &'a str, span: Span },
    Expression(Expression<'a>),
    Element(Box<JsxNode<'a>>),
}
