//! Markup detection inside Go source.
//!
//! Walks the host tokens, and wherever [`MarkupContext`] allows a value to
//! start and the next bytes look like a tag, hands off to the element parser.
//! The element parser reports where it stopped and a fresh host scanner
//! continues from that offset.

use super::element::ElementParser;
use super::host::{HostKind, HostScanner, HostToken, MarkupContext};
use super::scanner::{Position, Span, is_ident_start};
use crate::ast::Element;
use crate::error::ParseError;
use tracing::{debug, trace};

/// One markup expression found in host source
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupRegion {
    /// First byte to replace: the `<`, or the `(` of a parenthesised block
    pub start: usize,
    /// One past the last byte to replace: the final `>`, or the closing `)`
    pub end: usize,
    pub element: Element,
    pub parenthesized: bool,
}

/// Locate every markup expression in `source`, in order.
pub fn find_markup_regions(source: &str) -> Result<Vec<MarkupRegion>, ParseError> {
    let mut regions = Vec::new();
    let mut context = MarkupContext::new();
    let mut host = HostScanner::new(source);
    // Line/column of the latest handoff. Regions arrive in order, so each
    // handoff counts forward from the previous one.
    let mut located = Position::new();

    loop {
        let token = host.next();
        if token.kind == HostKind::Eof {
            break;
        }

        if context.permits() && token.kind == HostKind::Op {
            let region = match token.text {
                "(" => {
                    let inner = skip_whitespace(source, token.end);
                    if starts_markup(source, inner) {
                        located = located.advance(source, inner);
                        Some(parenthesized_region(source, &token, located)?)
                    } else {
                        None
                    }
                }
                "<" if starts_markup(source, token.start) => {
                    located = located.advance(source, token.start);
                    let mut parser = ElementParser::at(source, located);
                    let element = parser.parse_element()?;
                    Some(MarkupRegion {
                        start: token.start,
                        end: parser.offset(),
                        element,
                        parenthesized: false,
                    })
                }
                _ => None,
            };

            if let Some(region) = region {
                debug!(
                    tag = %region.element.tag,
                    start = region.start,
                    end = region.end,
                    parenthesized = region.parenthesized,
                    "markup region"
                );
                trace!(resume = region.end, "host scanning resumes");
                host = HostScanner::starting_at(source, region.end);
                context.after_markup();
                regions.push(region);
                continue;
            }
        }

        context.observe(&token);
    }

    Ok(regions)
}

fn parenthesized_region(source: &str, open: &HostToken<'_>, inner: Position) -> Result<MarkupRegion, ParseError> {
    let mut parser = ElementParser::at(source, inner);
    let element = parser.parse_element()?;

    let close = HostScanner::starting_at(source, parser.offset()).next();
    if close.kind != HostKind::Op || close.text != ")" {
        let found = match close.kind {
            HostKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", close.text),
        };
        return Err(ParseError::structural("`)` to close the markup block", found, span(source, close.start, close.end))
            .with_related(span(source, open.start, open.end))
            .with_related_label("block opened here")
            .with_help("A parenthesised markup block holds exactly one element"));
    }

    Ok(MarkupRegion {
        start: open.start,
        end: close.end,
        element,
        parenthesized: true,
    })
}

/// `<` followed by a tag name. `<-`, `<=` and `< x` are host operators.
fn starts_markup(source: &str, offset: usize) -> bool {
    let bytes = source.as_bytes();
    bytes.get(offset) == Some(&b'<') && bytes.get(offset + 1).is_some_and(|&b| is_ident_start(b))
}

fn skip_whitespace(source: &str, mut offset: usize) -> usize {
    let bytes = source.as_bytes();
    while bytes.get(offset).is_some_and(u8::is_ascii_whitespace) {
        offset += 1;
    }
    offset
}

fn span(source: &str, start: usize, end: usize) -> Span {
    Span {
        start: Position::locate(source, start),
        end: Position::locate(source, end),
    }
}
