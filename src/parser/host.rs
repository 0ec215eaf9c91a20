//! Go host-code scanner and the context that decides where markup may start.
//!
//! Only enough of Go's lexical grammar is recognised to keep track of the
//! previous significant token: identifiers, numbers, string/rune literals,
//! comments and operators. Nothing here builds a syntax tree.

use super::scanner::is_ident_start;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Identifier or keyword
    Ident,
    Number,
    /// Interpreted string, raw string or rune literal
    Str,
    /// Operator or delimiter, longest match
    Op,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostToken<'a> {
    pub kind: HostKind,
    pub text: &'a str,
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
}

const OPERATORS: [&str; 25] = [
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

/// Go token scanner over a byte offset range. Comments and whitespace are skipped.
#[derive(Debug, Clone)]
pub struct HostScanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> HostScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Fresh scanner that resumes at `offset`, normally where a markup
    /// region ended.
    pub fn starting_at(source: &'a str, offset: usize) -> Self {
        Self { source, pos: offset.min(source.len()) }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn next(&mut self) -> HostToken<'a> {
        self.skip_trivia();
        let start = self.pos;
        let bytes = self.source.as_bytes();

        let Some(&b) = bytes.get(start) else {
            return self.token(HostKind::Eof, start);
        };

        let kind = match b {
            b'"' | b'\'' => {
                self.pos += 1;
                while let Some(&c) = bytes.get(self.pos) {
                    self.pos += 1;
                    match c {
                        b'\\' if self.pos < bytes.len() => self.pos += 1,
                        // Unterminated; Go would reject it, we just stop at the line end
                        b'\n' => break,
                        c if c == b => break,
                        _ => {}
                    }
                }
                HostKind::Str
            }
            b'`' => {
                self.pos += 1;
                while let Some(&c) = bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'`' {
                        break;
                    }
                }
                HostKind::Str
            }
            b'0'..=b'9' => {
                self.scan_number();
                HostKind::Number
            }
            b'.' if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) => {
                self.scan_number();
                HostKind::Number
            }
            b if is_ident_start(b) || b >= 0x80 => {
                while bytes.get(self.pos).is_some_and(|&c| is_ident_start(c) || c.is_ascii_digit() || c >= 0x80) {
                    self.pos += 1;
                }
                HostKind::Ident
            }
            _ => {
                let rest = &self.source[start..];
                let len = OPERATORS
                    .iter()
                    .find(|op| rest.starts_with(*op))
                    .map_or_else(|| rest.chars().next().map_or(1, char::len_utf8), |op| op.len());
                self.pos += len;
                HostKind::Op
            }
        };

        self.token(kind, start)
    }

    fn scan_number(&mut self) {
        let bytes = self.source.as_bytes();
        let mut prev = 0u8;
        while let Some(&c) = bytes.get(self.pos) {
            let exponent_sign = (c == b'+' || c == b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P');
            if !(c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign) {
                break;
            }
            prev = c;
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        let bytes = self.source.as_bytes();
        loop {
            match (bytes.get(self.pos), bytes.get(self.pos + 1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while bytes.get(self.pos).is_some_and(|&c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.pos += 2;
                    match self.source[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => self.pos = bytes.len(),
                    }
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: HostKind, start: usize) -> HostToken<'a> {
        HostToken {
            kind,
            text: &self.source[start..self.pos],
            start,
            end: self.pos,
        }
    }
}

/// The previous significant host token, reduced to what matters for markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Return,
    Assign,
    Define,
    LParen,
    Comma,
    Ident,
    Other,
}

/// Tracks whether the next host token may begin a markup expression.
///
/// Markup is a value, so it is accepted only where Go expects one to start:
/// after `return`, `=`, `:=`, `(` and `,`. After identifiers, literals and
/// closing delimiters a `<` is a comparison.
#[derive(Debug, Clone, Copy)]
pub struct MarkupContext {
    last: Last,
}

impl Default for MarkupContext {
    fn default() -> Self {
        Self { last: Last::Nothing }
    }
}

impl MarkupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permits(&self) -> bool {
        matches!(self.last, Last::Return | Last::Assign | Last::Define | Last::LParen | Last::Comma)
    }

    pub fn observe(&mut self, token: &HostToken<'_>) {
        self.last = match (token.kind, token.text) {
            (HostKind::Eof, _) => self.last,
            (HostKind::Ident, "return") => Last::Return,
            (HostKind::Ident, _) => Last::Ident,
            (HostKind::Op, "=") => Last::Assign,
            (HostKind::Op, ":=") => Last::Define,
            (HostKind::Op, "(") => Last::LParen,
            (HostKind::Op, ",") => Last::Comma,
            _ => Last::Other,
        };
    }

    /// A markup region reads like an identifier to whatever follows it
    pub fn after_markup(&mut self) {
        self.last = Last::Ident;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        let mut scanner = HostScanner::new(source);
        let mut out = Vec::new();
        loop {
            let token = scanner.next();
            if token.kind == HostKind::Eof {
                return out;
            }
            out.push(token.text);
        }
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(texts("a := b <<= c <- ch ... <= x<y"), [
            "a", ":=", "b", "<<=", "c", "<-", "ch", "...", "<=", "x", "<", "y"
        ]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(texts("x // return <a>\n/* ( */ y"), ["x", "y"]);
    }

    #[test]
    fn test_strings_hide_markup() {
        let source = "f(\"<div>\", `<p>\n</p>`, '<')";
        assert_eq!(texts(source), ["f", "(", "\"<div>\"", ",", "`<p>\n</p>`", ",", "'<'", ")"]);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(texts(r#"s := "a\"b" + c"#), ["s", ":=", r#""a\"b""#, "+", "c"]);
    }

    #[test]
    fn test_numbers() {
        let mut scanner = HostScanner::new("5 < 10 1.5e-3 0x1F .5");
        let kinds: Vec<_> = std::iter::from_fn(|| Some(scanner.next()))
            .take_while(|t| t.kind != HostKind::Eof)
            .map(|t| (t.kind, t.text))
            .collect();
        assert_eq!(kinds, [
            (HostKind::Number, "5"),
            (HostKind::Op, "<"),
            (HostKind::Number, "10"),
            (HostKind::Number, "1.5e-3"),
            (HostKind::Number, "0x1F"),
            (HostKind::Number, ".5"),
        ]);
    }

    #[test]
    fn test_offsets_and_resume() {
        let source = "return <b/>, x";
        let mut scanner = HostScanner::starting_at(source, 11);
        let comma = scanner.next();
        assert_eq!((comma.start, comma.end, comma.text), (11, 12, ","));
        assert_eq!(scanner.next().text, "x");
        assert_eq!(scanner.next().kind, HostKind::Eof);
        assert_eq!(scanner.next().kind, HostKind::Eof);
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(texts("héllo := 1"), ["héllo", ":=", "1"]);
    }

    fn context_after(source: &str) -> MarkupContext {
        let mut scanner = HostScanner::new(source);
        let mut context = MarkupContext::new();
        loop {
            let token = scanner.next();
            if token.kind == HostKind::Eof {
                return context;
            }
            context.observe(&token);
        }
    }

    #[test]
    fn test_permitted_contexts() {
        for source in ["return", "x =", "x :=", "f(", "f(a,"] {
            assert!(context_after(source).permits(), "{source}");
        }
    }

    #[test]
    fn test_rejected_contexts() {
        for source in ["", "if 5", "x", "f()", "a[0]", "\"s\"", "x +", "{"] {
            assert!(!context_after(source).permits(), "{source:?}");
        }
    }

    #[test]
    fn test_comments_keep_context() {
        assert!(context_after("return // comment\n /* more */").permits());
    }

    #[test]
    fn test_after_markup_acts_like_identifier() {
        let mut context = context_after("return");
        context.after_markup();
        assert!(!context.permits());
    }
}
