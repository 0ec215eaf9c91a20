use crate::parser::scanner::Span;

/// Which literal was left open at end of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Expression,
}

impl LiteralKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralKind::String => "string literal",
            LiteralKind::Expression => "brace expression",
        }
    }
}

/// Kind of parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected a specific token or character and found something else
    Structural { expected: String, found: String },
    /// `</close>` does not match `<open>`
    MismatchedTag { open: String, close: String },
    /// String or brace expression never closed before end of input
    UnterminatedLiteral(LiteralKind),
    /// The same attribute name appears twice on one tag
    DuplicateAttribute { name: String },
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Structural { .. } => "Unexpected token",
            ErrorKind::MismatchedTag { .. } => "Mismatched close tag",
            ErrorKind::UnterminatedLiteral(_) => "Unterminated literal",
            ErrorKind::DuplicateAttribute { .. } => "Duplicate attribute",
        }
    }
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub related_span: Option<Span>,
    pub related_label: Option<String>,
    pub help: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            related_span: None,
            related_label: None,
            help: None,
        }
    }

    pub fn structural(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        let found = found.into();
        let message = format!("expected {expected}, found {found}");
        Self::new(ErrorKind::Structural { expected, found }, message, span)
    }

    pub fn mismatched_tag(open: &str, close: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::MismatchedTag { open: open.to_string(), close: close.to_string() },
            format!("mismatched closing tag: expected </{open}> but found </{close}>"),
            span,
        )
    }

    pub fn unterminated(literal: LiteralKind, span: Span) -> Self {
        Self::new(
            ErrorKind::UnterminatedLiteral(literal),
            format!("unterminated {}", literal.as_str()),
            span,
        )
    }

    pub fn duplicate_attribute(name: &str, tag: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::DuplicateAttribute { name: name.to_string() },
            format!("attribute \"{name}\" is set twice on <{tag}>"),
            span,
        )
    }

    /// Add a related span (e.g., where the element was opened)
    pub fn with_related(mut self, span: Span) -> Self {
        self.related_span = Some(span);
        self
    }

    /// Set the label for the related span
    pub fn with_related_label(mut self, label: impl Into<String>) -> Self {
        self.related_label = Some(label.into());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Byte offset where the error was detected
    pub fn offset(&self) -> usize {
        self.span.start.byte
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        let line = self.span.start.line + 1;
        let col = self.span.start.col + 1;
        output.push_str(&format!(" {dim}file:{reset} {filename}:{line}:{col}\n"));
        output.push_str(&format!("{red}error:{reset} {}\n", self.message));

        let width = format!("{}", line)
            .len()
            .max(self.related_span.map_or(0, |s| format!("{}", s.start.line + 1).len()))
            .max(2);

        if let Some(source_line) = source.lines().nth(self.span.start.line) {
            output.push_str(&format!("{dim}{:>width$} |{reset}\n", ""));
            output.push_str(&format!("{dim}{:>width$} |{reset} {}\n", line, source_line));
            output.push_str(&format!(
                "{dim}{:>width$} |{reset} {}{red}{}{reset}\n",
                "",
                " ".repeat(self.span.start.col),
                "^".repeat(underline_len(&self.span, source_line)),
            ));
        }

        if let Some(related) = self.related_span {
            if let Some(related_line) = source.lines().nth(related.start.line) {
                let label = self.related_label.as_deref().unwrap_or("opened here");
                output.push_str(&format!(
                    "{dim}{:>width$} |{reset} {}\n",
                    related.start.line + 1,
                    related_line
                ));
                output.push_str(&format!(
                    "{dim}{:>width$} |{reset} {}{dim}{} {}{reset}\n",
                    "",
                    " ".repeat(related.start.col),
                    "^".repeat(underline_len(&related, related_line)),
                    label,
                ));
            }
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {cyan}help:{reset} {}\n", help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

fn underline_len(span: &Span, source_line: &str) -> usize {
    if span.end.line == span.start.line {
        span.end.col.saturating_sub(span.start.col).max(1)
    } else {
        source_line.chars().count().saturating_sub(span.start.col).max(1)
    }
}

/// Generated code rejected by the Go grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("could not load the Go grammar: {0}")]
    Grammar(String),
    #[error("the Go parser produced no tree")]
    Aborted,
    /// 1-indexed line and column in the generated code
    #[error("{line}:{column}: unexpected `{snippet}`")]
    Invalid { line: usize, column: usize, snippet: String },
}

/// Error turning a parsed document into runtime nodes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LowerError {
    #[error("unknown component <{name}>")]
    UnknownComponent { name: String, span: Span },
    #[error("`{name}` is not bound")]
    Unbound { name: String, span: Span },
    #[error("`{expr}` cannot be evaluated here; only plain names are resolved")]
    Unsupported { expr: String, span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::UnknownComponent { span, .. }
            | LowerError::Unbound { span, .. }
            | LowerError::Unsupported { span, .. } => *span,
        }
    }
}

/// Error during compilation (parsing or generation)
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("generated code is not valid Go: {0}")]
    InvalidOutput(#[from] SyntaxError),
    #[error("source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

impl CompileError {
    /// Render the error with source context (no color)
    pub fn render(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render(source, filename),
            other => format!("\n {filename}\nerror: {other}\n\n"),
        }
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render_color(source, filename),
            other => format!("\n {filename}\n\x1b[1;31merror:\x1b[0m {other}\n\n"),
        }
    }
}
