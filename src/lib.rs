//! Transpiler and runtime for gox templates: HTML-like markup embedded in Go.
//!
//! ```text
//! func Hello(name string) gox.Node {
//!     return <p class="greeting">Hello, {name}</p>
//! }
//! ```
//!
//! [`transpile`] rewrites every markup expression into calls on the Go
//! runtime package and copies everything else through. [`parse_markup`] and
//! the [`runtime`] module cover the other direction: markup parsed on its own
//! and rendered to HTML from Rust.

pub mod ast;
pub mod error;
pub mod generate;
pub mod parser;
pub mod runtime;
pub mod syntax;

pub use ast::Document;
pub use error::{CompileError, ErrorKind, LiteralKind, LowerError, ParseError, SyntaxError};
pub use generate::Region;

use generate::{GenerateOptions, Generator, GoGenerator};
use parser::{MarkupParser, Parser};
use runtime::Bindings;
use serde::Serialize;
use tracing::debug;

/// Configuration for transpilation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Go package qualifier for runtime calls (default: "gox")
    pub runtime: String,
    /// Parse the generated code with the Go grammar and fail on syntax errors
    pub verify_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            runtime: "gox".to_string(),
            verify_output: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranspileResult {
    pub code: String,
    /// One entry per markup region, in source order
    pub regions: Vec<Region>,
}

pub fn transpile(source: &str) -> Result<TranspileResult, CompileError> {
    transpile_with(source, Options::default())
}

pub fn transpile_with(source: &str, options: Options) -> Result<TranspileResult, CompileError> {
    let regions = parser::find_markup_regions(source)?;
    debug!(regions = regions.len(), bytes = source.len(), "transpiling");

    let generate_options = GenerateOptions { runtime: options.runtime };
    let result = GoGenerator::new().generate(source, &regions, &generate_options);

    if options.verify_output {
        syntax::check_go(&result.code)?;
    }

    Ok(TranspileResult {
        code: result.code,
        regions: result.regions,
    })
}

/// Byte-in, byte-out form of [`transpile`]
pub fn transpile_bytes(source: &[u8]) -> Result<Vec<u8>, CompileError> {
    let source = std::str::from_utf8(source)?;
    Ok(transpile(source)?.code.into_bytes())
}

/// Parse markup that is not embedded in Go
pub fn parse_markup(source: &str) -> Result<Document, ParseError> {
    MarkupParser::new().parse(source)
}

/// Lower a parsed document against `bindings` and render it to HTML
pub fn render_document(document: &Document, bindings: &Bindings) -> Result<String, LowerError> {
    let nodes = document.to_nodes(bindings)?;
    Ok(runtime::render_all(&nodes))
}
