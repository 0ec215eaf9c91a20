use std::sync::Arc;

// Re-export Position and Span from the scanner so the rest of the crate
// uses a single Span type
pub use crate::parser::scanner::{Position, Span};

/// A standalone markup document: the top-level nodes of one parse pass
#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<Markup>,
    pub source: Arc<str>,
}

impl Document {
    pub fn new(nodes: Vec<Markup>, source: Arc<str>) -> Self {
        Self { nodes, source }
    }
}

/// Parsed markup node
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Element(Element),
    /// Literal text run, already trimmed
    Text(TextNode),
    /// `{expr}`: a single interpolated value
    Expression(ExpressionNode),
    /// `{items...}`: a sequence of sibling nodes expanded in place
    Spread(ExpressionNode),
}

impl Markup {
    pub fn span(&self) -> Span {
        match self {
            Markup::Element(el) => el.span,
            Markup::Text(text) => text.span,
            Markup::Expression(expr) | Markup::Spread(expr) => expr.span,
        }
    }
}

/// Element or component reference
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Span of `<tag`
    pub tag_span: Span,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub children: Vec<Markup>,
    /// Name read from `</name>`; always equal to `tag` when present and
    /// absent for self-closing elements
    pub closing_tag: Option<String>,
    pub span: Span,
}

impl Element {
    /// Tags starting with an uppercase letter reference a component
    pub fn is_component(&self) -> bool {
        self.tag.starts_with(|c: char| c.is_ascii_uppercase())
    }
}

/// Attribute on an element or component, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `name="value"`: the raw text between the quotes
    Literal(String),
    /// `name={expr}`: host-language expression, trimmed
    Expression(String, Span),
}

/// Text content between tags
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub span: Span,
}

/// Host-language expression inside braces
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    /// Trimmed expression source. For spreads this still ends in `...`.
    pub expr: String,
    pub span: Span,
}

impl ExpressionNode {
    /// The expression without a trailing spread marker
    pub fn target(&self) -> &str {
        self.expr.strip_suffix("...").unwrap_or(&self.expr).trim_end()
    }
}
