pub mod element;
pub mod host;
pub mod hybrid;
pub mod scanner;

pub use element::ElementParser;
pub use hybrid::{MarkupRegion, find_markup_regions};
pub use scanner::{Position, Scanner, Span, Token, TokenKind};

use crate::ast::Document;
use crate::error::ParseError;
use std::sync::Arc;

/// Parser trait - converts markup source to a document
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Document, ParseError>;
}

/// Parser for standalone markup (no host code around it)
pub struct MarkupParser {
    // Configuration only, no state
}

impl MarkupParser {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkupParser {
    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        let nodes = ElementParser::new(source).parse_document()?;
        Ok(Document::new(nodes, Arc::from(source)))
    }
}
