//! Markup token scanner.
//!
//! Produces one token at a time from raw markup text. Two entry points exist
//! because markup is context sensitive: inside a tag (`<div class="x">`)
//! whitespace separates tokens and letters start identifiers, while between
//! tags everything up to the next `<` or `{` is a raw text run.

/// Position in source code (byte offset plus 0-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

impl Position {
    pub fn new() -> Self {
        Self { byte: 0, line: 0, col: 0 }
    }

    /// Compute the line and column of a byte offset by scanning from the start.
    /// Offsets past the end are clamped.
    pub fn locate(source: &str, byte: usize) -> Self {
        Self::new().advance(source, byte)
    }

    /// Position of `byte`, counting forward from `self`. Cost is the distance
    /// moved, so walking a file front to back stays linear. A target behind
    /// `self` is located from the start instead.
    pub fn advance(self, source: &str, byte: usize) -> Self {
        let byte = byte.min(source.len());
        if byte < self.byte {
            return Self::locate(source, byte);
        }
        let Self { mut line, mut col, .. } = self;
        for &b in &source.as_bytes()[self.byte..byte] {
            if b == b'\n' {
                line += 1;
                col = 0;
            } else if !is_continuation(b) {
                col += 1;
            }
        }
        Self { byte, line, col }
    }
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn point(position: Position) -> Self {
        Self { start: position, end: position }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Self {
        Self { start: self.start, end: other.end }
    }
}

/// Kind of markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input. Returned forever once reached.
    Eof,
    /// `<`
    OpenTag,
    /// `</`
    CloseTagStart,
    /// `>`
    TagEnd,
    /// `/>`
    SelfClose,
    /// A lone `/` not directly followed by `>`
    Slash,
    /// Tag or attribute name
    Ident,
    /// `"..."`; the literal excludes the quotes
    Str { terminated: bool },
    /// `=`
    Assign,
    /// `{...}` with balanced braces; the literal excludes the outer braces
    Expr { terminated: bool },
    /// Raw text run
    Text,
}

/// A single markup token. Literals borrow from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub literal: &'a str,
    pub span: Span,
}

impl Token<'_> {
    /// Byte offset where the token starts
    pub fn offset(&self) -> usize {
        self.span.start.byte
    }

    /// Human readable form used in "found ..." error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::OpenTag => "`<`".to_string(),
            TokenKind::CloseTagStart => "`</`".to_string(),
            TokenKind::TagEnd => "`>`".to_string(),
            TokenKind::SelfClose => "`/>`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Assign => "`=`".to_string(),
            TokenKind::Ident => format!("`{}`", self.literal),
            TokenKind::Str { .. } => format!("string \"{}\"", shorten(self.literal)),
            TokenKind::Expr { .. } => format!("`{{{}}}`", shorten(self.literal)),
            TokenKind::Text => format!("text `{}`", shorten(self.literal)),
        }
    }
}

fn shorten(text: &str) -> String {
    const MAX: usize = 24;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

/// Markup scanner with one byte of lookahead
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: Position::new(),
        }
    }

    /// Start scanning at a byte offset (used when a host scanner hands off).
    pub fn starting_at(source: &'a str, byte: usize) -> Self {
        Self::at(source, Position::locate(source, byte))
    }

    /// Start scanning at an already located position
    pub fn at(source: &'a str, position: Position) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Byte offset of the cursor
    pub fn offset(&self) -> usize {
        self.position.byte
    }

    /// Move the cursor back to a position previously returned by this scanner.
    pub fn reset(&mut self, position: Position) {
        self.position = position;
    }

    /// Next token in tag context: whitespace is skipped, letters start identifiers.
    pub fn next(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.position;

        let Some(b) = self.peek_byte() else {
            return self.eof();
        };

        match b {
            b'<' => self.scan_angle(),
            b'/' => {
                self.advance();
                if self.peek_byte() == Some(b'>') {
                    self.advance();
                    self.token(TokenKind::SelfClose, start)
                } else {
                    self.token(TokenKind::Slash, start)
                }
            }
            b'>' => {
                self.advance();
                self.token(TokenKind::TagEnd, start)
            }
            b'=' => {
                self.advance();
                self.token(TokenKind::Assign, start)
            }
            b'"' => self.scan_string(),
            b'{' => self.scan_expression(),
            b if is_ident_start(b) => {
                while self.peek_byte().is_some_and(is_ident_part) {
                    self.advance();
                }
                self.token(TokenKind::Ident, start)
            }
            _ => {
                let mut token = self.scan_text();
                token.literal = token.literal.trim();
                token
            }
        }
    }

    /// Next token in content context (between tags). Text runs are returned
    /// untrimmed; whether surrounding whitespace matters is the parser's call.
    pub fn next_content(&mut self) -> Token<'a> {
        match self.peek_byte() {
            None => self.eof(),
            Some(b'<') => self.scan_angle(),
            Some(b'{') => self.scan_expression(),
            Some(_) => self.scan_text(),
        }
    }

    /// Byte under the cursor, without consuming it
    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.position.byte).copied()
    }

    /// Byte `n` positions past the cursor
    pub fn peek_byte_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.position.byte + n).copied()
    }

    fn eof(&self) -> Token<'a> {
        Token {
            kind: TokenKind::Eof,
            literal: "",
            span: Span::point(self.position),
        }
    }

    fn scan_angle(&mut self) -> Token<'a> {
        let start = self.position;
        self.advance(); // <
        if self.peek_byte() == Some(b'/') {
            self.advance();
            self.token(TokenKind::CloseTagStart, start)
        } else {
            self.token(TokenKind::OpenTag, start)
        }
    }

    fn scan_string(&mut self) -> Token<'a> {
        let start = self.position;
        self.advance(); // "
        let content_start = self.position.byte;

        let mut terminated = false;
        while let Some(b) = self.peek_byte() {
            if b == b'\\' {
                self.advance();
                if self.peek_byte().is_some() {
                    self.advance();
                }
                continue;
            }
            if b == b'"' {
                terminated = true;
                break;
            }
            self.advance();
        }

        let literal = &self.source[content_start..self.position.byte];
        if terminated {
            self.advance(); // "
        }
        Token {
            kind: TokenKind::Str { terminated },
            literal,
            span: Span { start, end: self.position },
        }
    }

    /// Scan `{...}` counting nested braces. Braces inside Go string, rune and
    /// raw string literals do not count.
    fn scan_expression(&mut self) -> Token<'a> {
        let start = self.position;
        self.advance(); // {
        let content_start = self.position.byte;

        let mut depth = 1usize;
        let mut quote: Option<u8> = None;
        while let Some(b) = self.peek_byte() {
            if let Some(q) = quote {
                if b == b'\\' && q != b'`' {
                    self.advance();
                    if self.peek_byte().is_some() {
                        self.advance();
                    }
                    continue;
                }
                if b == q {
                    quote = None;
                }
                self.advance();
                continue;
            }

            match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.advance();
        }

        let terminated = depth == 0;
        let literal = &self.source[content_start..self.position.byte];
        if terminated {
            self.advance(); // }
        }
        Token {
            kind: TokenKind::Expr { terminated },
            literal,
            span: Span { start, end: self.position },
        }
    }

    fn scan_text(&mut self) -> Token<'a> {
        let start = self.position;
        while let Some(b) = self.peek_byte() {
            if b == b'<' || b == b'{' {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Text, start)
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token<'a> {
        Token {
            kind,
            literal: &self.source[start.byte..self.position.byte],
            span: Span { start, end: self.position },
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_byte().is_some_and(|b| b.is_ascii_whitespace()) {
            self.advance();
        }
    }

    fn advance(&mut self) {
        let Some(b) = self.peek_byte() else { return };
        self.position.byte += 1;
        if b == b'\n' {
            self.position.line += 1;
            self.position.col = 0;
        } else if !is_continuation(b) {
            self.position.col += 1;
        }
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next();
            kinds.push(token.kind);
            if token.kind == TokenKind::Eof {
                return kinds;
            }
        }
    }

    #[test]
    fn test_tag_tokens() {
        assert_eq!(
            kinds(r#"<img src="x.png" />"#),
            vec![
                TokenKind::OpenTag,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Str { terminated: true },
                TokenKind::SelfClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag_start() {
        let mut scanner = Scanner::new("</div >");
        let token = scanner.next();
        assert_eq!(token.kind, TokenKind::CloseTagStart);
        assert_eq!(token.literal, "</");
        assert_eq!(scanner.next().literal, "div");
        assert_eq!(scanner.next().kind, TokenKind::TagEnd);
    }

    #[test]
    fn test_lone_slash() {
        assert_eq!(
            kinds("/ >"),
            vec![TokenKind::Slash, TokenKind::TagEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut scanner = Scanner::new("  ");
        assert_eq!(scanner.next().kind, TokenKind::Eof);
        assert_eq!(scanner.next().kind, TokenKind::Eof);
        assert_eq!(scanner.next_content().kind, TokenKind::Eof);
    }

    #[test]
    fn test_attribute_names_allow_dash_and_colon() {
        let mut scanner = Scanner::new("data-id hx:get");
        assert_eq!(scanner.next().literal, "data-id");
        assert_eq!(scanner.next().literal, "hx:get");
    }

    #[test]
    fn test_string_literal_offsets() {
        let mut scanner = Scanner::new(r#"  "a\"b" "#);
        let token = scanner.next();
        assert_eq!(token.kind, TokenKind::Str { terminated: true });
        assert_eq!(token.literal, r#"a\"b"#);
        assert_eq!(token.offset(), 2);
    }

    #[test]
    fn test_unterminated_string_keeps_content() {
        let mut scanner = Scanner::new(r#""open"#);
        let token = scanner.next();
        assert_eq!(token.kind, TokenKind::Str { terminated: false });
        assert_eq!(token.literal, "open");
        assert_eq!(scanner.next().kind, TokenKind::Eof);
    }

    #[test]
    fn test_nested_braces() {
        let mut scanner = Scanner::new(r#"{style(map[string]string{"a": "}"})} rest"#);
        let token = scanner.next_content();
        assert_eq!(token.kind, TokenKind::Expr { terminated: true });
        assert_eq!(token.literal, r#"style(map[string]string{"a": "}"})"#);
        assert_eq!(scanner.next_content().literal, " rest");
    }

    #[test]
    fn test_unterminated_expression() {
        let mut scanner = Scanner::new("{a{b}");
        let token = scanner.next_content();
        assert_eq!(token.kind, TokenKind::Expr { terminated: false });
        assert_eq!(token.literal, "a{b}");
    }

    #[test]
    fn test_content_text_is_raw() {
        let mut scanner = Scanner::new("  Hello, {name}</p>");
        let text = scanner.next_content();
        assert_eq!(text.kind, TokenKind::Text);
        assert_eq!(text.literal, "  Hello, ");
        assert_eq!(scanner.next_content().literal, "name");
        assert_eq!(scanner.next_content().kind, TokenKind::CloseTagStart);
    }

    #[test]
    fn test_tag_context_text_is_trimmed() {
        let mut scanner = Scanner::new("  @click=x <");
        let token = scanner.next();
        assert_eq!(token.kind, TokenKind::Text);
        assert_eq!(token.literal, "@click=x");
    }

    #[test]
    fn test_peek_byte_does_not_consume() {
        let scanner = Scanner::new("</");
        assert_eq!(scanner.peek_byte(), Some(b'<'));
        assert_eq!(scanner.peek_byte_at(1), Some(b'/'));
        assert_eq!(scanner.peek_byte_at(2), None);
        assert_eq!(scanner.offset(), 0);
    }

    #[test]
    fn test_positions_track_lines_and_chars() {
        let mut scanner = Scanner::new("<p>\n  café <b>");
        scanner.next(); // <
        scanner.next(); // p
        scanner.next(); // >
        scanner.next_content(); // text
        let open = scanner.next_content();
        assert_eq!(open.span.start.line, 1);
        assert_eq!(open.span.start.col, 7);
        assert_eq!(Position::locate("<p>\n  café <b>", open.offset()), open.span.start);
    }

    #[test]
    fn test_starting_at_offset() {
        let source = "x := <a></a>";
        let mut scanner = Scanner::starting_at(source, 5);
        let token = scanner.next();
        assert_eq!(token.kind, TokenKind::OpenTag);
        assert_eq!(token.span.start.col, 5);
    }

    #[test]
    fn test_advance_matches_locate() {
        let source = "a\nbé\n\tcd <x>\nend";
        let mut position = Position::new();
        for byte in [0, 2, 5, 7, 9, 13, source.len()] {
            position = position.advance(source, byte);
            assert_eq!(position, Position::locate(source, byte), "byte {byte}");
        }
        // Moving backwards relocates from the start
        assert_eq!(position.advance(source, 3), Position::locate(source, 3));
    }
}
