//! Element parser for markup.
//!
//! Open elements are kept on an explicit stack instead of the call stack, so
//! nesting depth is bounded by [`MAX_DEPTH`] rather than by thread stack size.
//! The parser holds a single token of lookahead. Tag context and content
//! context scan the same bytes differently, so the lookahead remembers which
//! context it was scanned in and is rescanned if the other one asks for it.

use super::scanner::{Position, Scanner, Span, Token, TokenKind};
use crate::ast::*;
use crate::error::{LiteralKind, ParseError};
use std::collections::HashMap;

/// Deepest element nesting accepted. The generator, lowering and renderer
/// walk the tree recursively, so this also bounds their stack use.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tag,
    Content,
}

/// An element whose opening tag has been read and whose children are still
/// being collected
struct OpenElement {
    tag: String,
    tag_span: Span,
    start: Span,
    attributes: Vec<Attribute>,
}

/// Children collected at one nesting level
#[derive(Default)]
struct Level {
    /// `None` for the top level of a document
    open: Option<OpenElement>,
    children: Vec<Markup>,
    /// Whitespace is only significant where it touches an interpolation
    after_expression: bool,
}

/// Result of reading an opening tag
enum Opened {
    /// `<tag ... />`
    Complete(Element),
    /// `<tag ...>`: children follow
    Open(OpenElement),
}

/// Builds elements from a markup token stream
pub struct ElementParser<'a> {
    scanner: Scanner<'a>,
    peeked: Option<(Mode, Token<'a>)>,
}

impl<'a> ElementParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Parser whose cursor sits at `offset`, normally the `<` of an element
    /// found by the host scanner.
    pub fn starting_at(source: &'a str, offset: usize) -> Self {
        Self::at(source, Position::locate(source, offset))
    }

    /// Like [`starting_at`](Self::starting_at), for a position the caller
    /// has already located
    pub fn at(source: &'a str, position: Position) -> Self {
        Self {
            scanner: Scanner::at(source, position),
            peeked: None,
        }
    }

    /// Byte offset right after everything consumed so far. After
    /// [`parse_element`](Self::parse_element) this is where host scanning resumes.
    pub fn offset(&self) -> usize {
        match self.peeked {
            Some((_, token)) => token.offset(),
            None => self.scanner.offset(),
        }
    }

    /// Parse top-level markup until end of input.
    pub fn parse_document(&mut self) -> Result<Vec<Markup>, ParseError> {
        let mut stack = vec![Level::default()];
        loop {
            if let Some(done) = self.step(&mut stack)? {
                return Ok(done.into_children());
            }
        }
    }

    /// Parse exactly one element. The next token must be `<`.
    pub fn parse_element(&mut self) -> Result<Element, ParseError> {
        let open = match self.open_tag()? {
            Opened::Complete(el) => return Ok(el),
            Opened::Open(open) => open,
        };
        let mut stack = vec![Level { open: Some(open), ..Level::default() }];
        loop {
            if let Some(done) = self.step(&mut stack)? {
                return done.into_element();
            }
        }
    }

    /// Consume one content item into the innermost level. Returns the
    /// outermost level once it is finished: a closed element, or the
    /// document top level at end of input.
    fn step(&mut self, stack: &mut Vec<Level>) -> Result<Option<Finished>, ParseError> {
        let token = self.peek(Mode::Content);
        let Some(level) = stack.last_mut() else {
            return Err(ParseError::structural("markup", token.describe(), token.span));
        };

        match token.kind {
            TokenKind::CloseTagStart => {
                let Some(open) = level.open.take() else {
                    return Err(ParseError::structural("an element or text", "a closing tag", token.span)
                        .with_help("This closing tag has no matching opening tag"));
                };
                let children = std::mem::take(&mut level.children);
                stack.pop();
                let el = self.close_tag(open, children)?;
                match stack.last_mut() {
                    Some(parent) => {
                        parent.children.push(Markup::Element(el));
                        parent.after_expression = false;
                    }
                    None => return Ok(Some(Finished::Element(el))),
                }
            }
            TokenKind::Eof => match &level.open {
                Some(open) => {
                    let tag = &open.tag;
                    return Err(ParseError::structural(format!("`</{tag}>`"), token.describe(), token.span)
                        .with_related(open.tag_span)
                        .with_help(format!("Close it with </{tag}>, or write <{tag} /> if it has no children")));
                }
                None => {
                    let children = std::mem::take(&mut level.children);
                    return Ok(Some(Finished::Document(children)));
                }
            },
            TokenKind::OpenTag => {
                let depth = stack.iter().filter(|l| l.open.is_some()).count();
                match self.open_tag()? {
                    Opened::Complete(el) => {
                        if let Some(level) = stack.last_mut() {
                            level.children.push(Markup::Element(el));
                            level.after_expression = false;
                        }
                    }
                    Opened::Open(open) => {
                        if depth >= MAX_DEPTH {
                            let outermost = stack.iter().find_map(|l| l.open.as_ref()).map_or(open.tag_span, |o| o.tag_span);
                            return Err(ParseError::structural(
                                format!("at most {MAX_DEPTH} nested elements"),
                                format!("`<{}>`", open.tag),
                                open.tag_span,
                            )
                            .with_related(outermost)
                            .with_related_label("outermost element opened here")
                            .with_help("Split deep markup into components"));
                        }
                        stack.push(Level { open: Some(open), ..Level::default() });
                    }
                }
            }
            TokenKind::Expr { terminated } => {
                self.next(Mode::Content);
                if !terminated {
                    return Err(ParseError::unterminated(LiteralKind::Expression, token.span));
                }
                let expr = token.literal.trim();
                if expr.is_empty() {
                    return Err(ParseError::structural("an expression inside `{}`", "nothing", token.span));
                }
                let node = ExpressionNode { expr: expr.to_string(), span: token.span };
                level.children.push(if expr.ends_with("...") {
                    Markup::Spread(node)
                } else {
                    Markup::Expression(node)
                });
                level.after_expression = true;
            }
            TokenKind::Text => {
                self.next(Mode::Content);
                let before_expression = matches!(self.peek(Mode::Content).kind, TokenKind::Expr { .. });
                let Some(level) = stack.last_mut() else {
                    return Ok(None);
                };

                let mut content = token.literal;
                if !level.after_expression {
                    content = content.trim_start();
                }
                if !before_expression {
                    content = content.trim_end();
                }
                if !content.is_empty() {
                    level.children.push(Markup::Text(TextNode {
                        content: content.to_string(),
                        span: token.span,
                    }));
                }
                level.after_expression = false;
            }
            _ => {
                return Err(ParseError::structural("an element, text or `{expression}`", token.describe(), token.span));
            }
        }
        Ok(None)
    }

    /// Read `<tag attr=...` up to and including `>` or `/>`
    fn open_tag(&mut self) -> Result<Opened, ParseError> {
        let open = self.next(Mode::Tag);
        if open.kind != TokenKind::OpenTag {
            return Err(ParseError::structural("`<` to start an element", open.describe(), open.span));
        }

        let name = self.next(Mode::Tag);
        if name.kind != TokenKind::Ident {
            return Err(ParseError::structural("a tag name", name.describe(), name.span)
                .with_related(open.span)
                .with_related_label("element starts here"));
        }
        let tag = name.literal.to_string();
        let tag_span = open.span.to(name.span);

        // Component tags are emitted as Go identifiers
        if tag.starts_with(|c: char| c.is_ascii_uppercase()) && tag.contains(['-', ':']) {
            return Err(ParseError::structural("a component name made of letters, digits and `_`", format!("`{tag}`"), name.span)
                .with_help("Component tags name a Go function. Use a lowercase tag for a custom element such as <my-card>"));
        }

        let attributes = self.parse_attributes(&tag, tag_span)?;

        let end = self.next(Mode::Tag);
        let self_close_end = match end.kind {
            TokenKind::SelfClose => end.span,
            TokenKind::Slash => {
                let gt = self.next(Mode::Tag);
                if gt.kind != TokenKind::TagEnd {
                    return Err(ParseError::structural("`>` after `/`", gt.describe(), gt.span)
                        .with_help(format!("Write a self-closing tag as <{tag} />")));
                }
                gt.span
            }
            TokenKind::TagEnd => {
                return Ok(Opened::Open(OpenElement { tag, tag_span, start: open.span, attributes }));
            }
            // parse_attributes only stops on the three kinds above
            _ => return Err(ParseError::structural("`>` or `/>`", end.describe(), end.span)),
        };

        Ok(Opened::Complete(Element {
            tag,
            tag_span,
            attributes,
            self_closing: true,
            children: Vec::new(),
            closing_tag: None,
            span: open.span.to(self_close_end),
        }))
    }

    /// Read `</tag>` for `open`, which must be next, and build the element
    fn close_tag(&mut self, open: OpenElement, children: Vec<Markup>) -> Result<Element, ParseError> {
        let OpenElement { tag, tag_span, start, attributes } = open;

        self.next(Mode::Content);
        let close = self.next(Mode::Tag);
        if close.kind != TokenKind::Ident {
            return Err(ParseError::structural(format!("`{tag}` after `</`"), close.describe(), close.span)
                .with_related(tag_span));
        }
        if close.literal != tag {
            return Err(ParseError::mismatched_tag(&tag, close.literal, close.span)
                .with_related(tag_span)
                .with_help(format!("Close it with </{tag}>")));
        }
        let gt = self.next(Mode::Tag);
        if gt.kind != TokenKind::TagEnd {
            return Err(ParseError::structural(format!("`>` to finish </{tag}"), gt.describe(), gt.span));
        }

        Ok(Element {
            closing_tag: Some(close.literal.to_string()),
            tag,
            tag_span,
            attributes,
            self_closing: false,
            children,
            span: start.to(gt.span),
        })
    }

    fn parse_attributes(&mut self, tag: &str, tag_span: Span) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut seen: HashMap<String, Span> = HashMap::new();

        loop {
            let token = self.peek(Mode::Tag);
            match token.kind {
                TokenKind::TagEnd | TokenKind::SelfClose | TokenKind::Slash => return Ok(attributes),
                TokenKind::Ident => {
                    let attr = self.parse_attribute()?;
                    if let Some(first) = seen.get(&attr.name) {
                        return Err(ParseError::duplicate_attribute(&attr.name, tag, attr.span)
                            .with_related(*first)
                            .with_related_label("first set here"));
                    }
                    seen.insert(attr.name.clone(), attr.span);
                    attributes.push(attr);
                }
                TokenKind::Eof => {
                    return Err(ParseError::structural("`>`", token.describe(), token.span)
                        .with_related(tag_span)
                        .with_help(format!("The opening tag of <{tag}> is never finished")));
                }
                _ => {
                    return Err(ParseError::structural("an attribute name or `>`", token.describe(), token.span)
                        .with_related(tag_span));
                }
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.next(Mode::Tag);

        let assign = self.next(Mode::Tag);
        if assign.kind != TokenKind::Assign {
            return Err(ParseError::structural(format!("`=` after `{}`", name.literal), assign.describe(), assign.span)
                .with_help(format!("Give the attribute a value: {}=\"...\" or {}={{expr}}", name.literal, name.literal)));
        }

        let value = self.next(Mode::Tag);
        let value_kind = match value.kind {
            TokenKind::Str { terminated: true } => AttributeValue::Literal(value.literal.to_string()),
            TokenKind::Str { terminated: false } => {
                return Err(ParseError::unterminated(LiteralKind::String, value.span));
            }
            TokenKind::Expr { terminated: true } => {
                let expr = value.literal.trim();
                if expr.is_empty() {
                    return Err(ParseError::structural("an expression inside `{}`", "nothing", value.span));
                }
                AttributeValue::Expression(expr.to_string(), value.span)
            }
            TokenKind::Expr { terminated: false } => {
                return Err(ParseError::unterminated(LiteralKind::Expression, value.span));
            }
            _ => {
                return Err(ParseError::structural(
                    "a quoted string or `{expression}` as attribute value",
                    value.describe(),
                    value.span,
                ));
            }
        };

        Ok(Attribute {
            name: name.literal.to_string(),
            value: value_kind,
            span: name.span.to(value.span),
        })
    }

    fn peek(&mut self, mode: Mode) -> Token<'a> {
        if let Some((peeked_mode, token)) = self.peeked {
            if peeked_mode == mode {
                return token;
            }
            self.scanner.reset(token.span.start);
        }
        let token = self.scan(mode);
        self.peeked = Some((mode, token));
        token
    }

    fn next(&mut self, mode: Mode) -> Token<'a> {
        let token = self.peek(mode);
        self.peeked = None;
        token
    }

    fn scan(&mut self, mode: Mode) -> Token<'a> {
        match mode {
            Mode::Tag => self.scanner.next(),
            Mode::Content => self.scanner.next_content(),
        }
    }
}

/// The outermost level, once complete
enum Finished {
    Element(Element),
    Document(Vec<Markup>),
}

impl Finished {
    fn into_children(self) -> Vec<Markup> {
        match self {
            Finished::Element(el) => vec![Markup::Element(el)],
            Finished::Document(children) => children,
        }
    }

    fn into_element(self) -> Result<Element, ParseError> {
        match self {
            Finished::Element(el) => Ok(el),
            Finished::Document(_) => Err(ParseError::structural("an element", "end of input", Span::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(source: &str) -> Result<Element, ParseError> {
        ElementParser::new(source).parse_element()
    }

    fn text(markup: &Markup) -> &str {
        match markup {
            Markup::Text(t) => &t.content,
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_element() {
        let el = parse(r#"<div attr="value">Content</div>"#).unwrap();
        assert_eq!(el.tag, "div");
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.attributes[0].name, "attr");
        assert_eq!(el.attributes[0].value, AttributeValue::Literal("value".into()));
        assert_eq!(text(&el.children[0]), "Content");
        assert_eq!(el.closing_tag.as_deref(), Some("div"));
        assert!(!el.self_closing);
    }

    #[test]
    fn test_self_closing_with_attributes() {
        let el = parse(r#"<img src="image.png" alt="Image" />"#).unwrap();
        assert!(el.self_closing);
        assert!(el.children.is_empty());
        assert_eq!(el.closing_tag, None);
        let names: Vec<_> = el.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["src", "alt"]);
    }

    #[test]
    fn test_self_closing_with_spaced_slash() {
        let el = parse("<br / >").unwrap();
        assert!(el.self_closing);
    }

    #[test]
    fn test_whitespace_only_children_dropped() {
        let spaced = parse("<div  >  </div >").unwrap();
        let tight = parse("<div></div>").unwrap();
        assert!(spaced.children.is_empty());
        assert_eq!(spaced.children, tight.children);
        assert_eq!(spaced.attributes, tight.attributes);
        assert_eq!(spaced.closing_tag, tight.closing_tag);
    }

    #[test]
    fn test_nested_elements() {
        let el = parse("<div><span/><p>x</p></div>").unwrap();
        assert_eq!(el.children.len(), 2);
        match (&el.children[0], &el.children[1]) {
            (Markup::Element(span), Markup::Element(p)) => {
                assert_eq!(span.tag, "span");
                assert!(span.self_closing);
                assert_eq!(p.tag, "p");
                assert_eq!(text(&p.children[0]), "x");
            }
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_text_keeps_whitespace_next_to_expressions() {
        let el = parse("<p>\n  Hello, {user.Name} and {other}!  \n</p>").unwrap();
        assert_eq!(el.children.len(), 5);
        assert_eq!(text(&el.children[0]), "Hello, ");
        assert!(matches!(&el.children[1], Markup::Expression(e) if e.expr == "user.Name"));
        assert_eq!(text(&el.children[2]), " and ");
        assert!(matches!(&el.children[3], Markup::Expression(e) if e.expr == "other"));
        assert_eq!(text(&el.children[4]), "!");
    }

    #[test]
    fn test_whitespace_between_expressions_is_kept() {
        let el = parse("<p>{first} {last}</p>").unwrap();
        assert_eq!(el.children.len(), 3);
        assert_eq!(text(&el.children[1]), " ");
    }

    #[test]
    fn test_spread_child() {
        let el = parse("<ul>{ items... }</ul>").unwrap();
        match &el.children[0] {
            Markup::Spread(spread) => {
                assert_eq!(spread.expr, "items...");
                assert_eq!(spread.target(), "items");
            }
            other => panic!("expected spread, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_attribute_with_nested_braces() {
        let el = parse(r#"<Card style={Style{Color: "red", Extra: map[string]int{"a": 1}}} />"#).unwrap();
        assert!(el.is_component());
        match &el.attributes[0].value {
            AttributeValue::Expression(expr, span) => {
                assert_eq!(expr, r#"Style{Color: "red", Extra: map[string]int{"a": 1}}"#);
                assert_eq!(span.start.byte, 12);
            }
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_order_preserved() {
        let el = parse(r#"<input type="checkbox" data-id="1" checked="true" />"#).unwrap();
        let names: Vec<_> = el.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["type", "data-id", "checked"]);
    }

    #[test]
    fn test_string_values_are_not_escaped() {
        let el = parse(r#"<a href="/?a=1&b=<2>"></a>"#).unwrap();
        assert_eq!(el.attributes[0].value, AttributeValue::Literal("/?a=1&b=<2>".into()));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<div></span>").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MismatchedTag { open: "div".into(), close: "span".into() }
        );
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn test_closing_tag_is_case_sensitive() {
        let err = parse("<Div></div>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MismatchedTag { .. }));
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse("<div><p>text</p>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structural { ref expected, ref found }
            if expected == "`</div>`" && found == "end of input"));
        assert!(err.related_span.is_some());
    }

    #[test]
    fn test_missing_assign() {
        let err = parse("<input disabled />").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structural { ref found, .. } if found == "`/>`"));
    }

    #[test]
    fn test_bare_attribute_value() {
        let err = parse("<input value=x />").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structural { .. }));
    }

    #[test]
    fn test_unterminated_string_attribute() {
        let err = parse(r#"<a href="/home>"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedLiteral(LiteralKind::String));
    }

    #[test]
    fn test_unterminated_expression_child() {
        let err = parse("<p>{name</p>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedLiteral(LiteralKind::Expression));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse(r#"<a class="x" class="y"></a>"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateAttribute { name: "class".into() });
    }

    #[test]
    fn test_offset_after_element() {
        let source = "<b>x</b>) + 1";
        let mut parser = ElementParser::new(source);
        parser.parse_element().unwrap();
        assert_eq!(parser.offset(), 8);
    }

    #[test]
    fn test_starting_at_offset() {
        let source = "return <hr />, nil";
        let mut parser = ElementParser::starting_at(source, 7);
        let el = parser.parse_element().unwrap();
        assert_eq!(el.tag, "hr");
        assert_eq!(el.span.start.byte, 7);
        assert_eq!(parser.offset(), 13);
    }

    #[test]
    fn test_document_with_several_roots() {
        let nodes = ElementParser::new("<a></a>\n text \n<b/>").parse_document().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(text(&nodes[1]), "text");
    }

    #[test]
    fn test_document_rejects_stray_closing_tag() {
        let err = ElementParser::new("<a></a></b>").parse_document().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structural { .. }));
    }

    #[test]
    fn test_nesting_up_to_the_limit() {
        let source = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        let mut el = parse(&source).unwrap();
        let mut depth = 1;
        while let Some(Markup::Element(child)) = el.children.pop() {
            el = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
    }

    #[test]
    fn test_nesting_past_the_limit() {
        let depth = MAX_DEPTH + 1;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let err = parse(&source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Structural { ref found, .. } if found == "`<a>`"));
        assert_eq!(err.span.start.byte, MAX_DEPTH * 3);
        assert_eq!(err.related_span.map(|s| s.start.byte), Some(0));
        assert!(err.help.is_some());
    }

    #[test]
    fn test_deep_unclosed_nesting_is_an_error() {
        let source = "<a>".repeat(100_000);
        assert!(parse(&source).is_err());
        assert!(ElementParser::new(&source).parse_document().is_err());
    }

    #[test]
    fn test_self_closing_children_do_not_nest() {
        let source = format!("<ul>{}</ul>", "<li/>".repeat(MAX_DEPTH * 2));
        assert_eq!(parse(&source).unwrap().children.len(), MAX_DEPTH * 2);
    }

    #[test]
    fn test_component_name_must_be_identifier() {
        for source in ["<My-Card/>", "<Ui:Card></Ui:Card>"] {
            let err = parse(source).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Structural { .. }), "{source}");
            assert_eq!(err.span.start.byte, 1);
        }
    }

    #[test]
    fn test_lowercase_tag_keeps_dash_and_colon() {
        assert_eq!(parse("<my-card/>").unwrap().tag, "my-card");
        assert_eq!(parse("<svg:rect></svg:rect>").unwrap().tag, "svg:rect");
    }

    #[test]
    fn test_at_known_position() {
        let source = "x :=\n  <p>é</p>";
        let mut parser = ElementParser::at(source, Position::locate(source, 7));
        let el = parser.parse_element().unwrap();
        assert_eq!(el.span.start.line, 1);
        assert_eq!(el.span.start.col, 2);
    }
}
