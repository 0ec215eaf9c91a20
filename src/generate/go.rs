use super::{GenerateOptions, GenerateResult, Generator, Output, Region};
use crate::ast::*;
use crate::parser::MarkupRegion;
use std::fmt::Write as _;

/// Rewrites markup regions into calls on the Go runtime package.
///
/// Host code between regions is copied through untouched. Every region
/// becomes a single expression on one line:
///
/// ```text
/// <a href="/">Home {n}</a>   =>   gox.El("a", gox.Props{"href": "/"}, gox.Text("Home "), gox.Text(n))
/// <Card title={t} />         =>   gox.Component(Card, gox.Props{"title": t})
/// ```
pub struct GoGenerator;

impl GoGenerator {
    pub fn new() -> Self {
        Self
    }

    fn emit_element(&self, el: &Element, rt: &str, output: &mut Output) {
        if el.is_component() {
            output.push(&format!("{rt}.Component({}, ", el.tag));
        } else {
            output.push(&format!("{rt}.El({}, ", go_string(&el.tag)));
        }
        self.emit_props(&el.attributes, rt, output);
        self.emit_children(&el.children, rt, output);
        output.push_char(')');
    }

    fn emit_props(&self, attributes: &[Attribute], rt: &str, output: &mut Output) {
        output.push(rt);
        output.push(".Props{");
        for (i, attr) in attributes.iter().enumerate() {
            if i > 0 {
                output.push(", ");
            }
            output.push(&go_string(&attr.name));
            output.push(": ");
            match &attr.value {
                AttributeValue::Literal(value) => {
                    // Escapes written in the template are already Go escapes
                    output.push_char('"');
                    output.push(&value.replace('\n', "\\n").replace('\r', "\\r"));
                    output.push_char('"');
                }
                AttributeValue::Expression(expr, _) => output.push(expr),
            }
        }
        output.push_char('}');
    }

    /// Children follow the props as variadic arguments. Go only accepts a
    /// spread as the sole variadic argument, so mixed children are gathered
    /// into one slice with `append` first.
    fn emit_children(&self, children: &[Markup], rt: &str, output: &mut Output) {
        let has_spread = children.iter().any(|c| matches!(c, Markup::Spread(_)));
        if !has_spread || children.len() == 1 {
            for child in children {
                output.push(", ");
                self.emit_child(child, rt, output);
            }
            return;
        }

        let segments = segments(children);
        let literal = match segments.first() {
            Some(Segment::Nodes(nodes)) => nodes.as_slice(),
            _ => &[],
        };
        let rest = if literal.is_empty() { &segments[..] } else { &segments[1..] };

        output.push(", ");
        output.push(&"append(".repeat(rest.len()));
        output.push(&format!("[]{rt}.Node{{"));
        for (i, child) in literal.iter().enumerate() {
            if i > 0 {
                output.push(", ");
            }
            self.emit_child(child, rt, output);
        }
        output.push_char('}');
        for segment in rest {
            match segment {
                Segment::Spread(spread) => {
                    output.push(", ");
                    output.push(&spread.expr);
                }
                Segment::Nodes(nodes) => {
                    for child in nodes {
                        output.push(", ");
                        self.emit_child(child, rt, output);
                    }
                }
            }
            output.push_char(')');
        }
        output.push("...");
    }

    fn emit_child(&self, child: &Markup, rt: &str, output: &mut Output) {
        match child {
            Markup::Element(el) => self.emit_element(el, rt, output),
            Markup::Text(text) => output.push(&format!("{rt}.Text({})", go_string(&text.content))),
            Markup::Expression(expr) => output.push(&format!("{rt}.Text({})", expr.expr)),
            Markup::Spread(spread) => output.push(&spread.expr),
        }
    }
}

impl Default for GoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for GoGenerator {
    fn generate(&self, source: &str, regions: &[MarkupRegion], options: &GenerateOptions) -> GenerateResult {
        let mut output = Output::new();
        let mut cursor = 0;

        for region in regions {
            output.push(&source[cursor..region.start]);
            let generated_start = output.position();
            self.emit_element(&region.element, &options.runtime, &mut output);
            output.add_region(Region {
                tag: region.element.tag.clone(),
                source_start: region.start,
                source_end: region.end,
                generated_start,
                generated_end: output.position(),
            });
            cursor = region.end;
        }
        output.push(&source[cursor..]);

        let (code, regions) = output.finish();
        GenerateResult { code, regions }
    }
}

enum Segment<'a> {
    Nodes(Vec<&'a Markup>),
    Spread(&'a ExpressionNode),
}

fn segments(children: &[Markup]) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for child in children {
        match child {
            Markup::Spread(spread) => segments.push(Segment::Spread(spread)),
            other => match segments.last_mut() {
                Some(Segment::Nodes(nodes)) => nodes.push(other),
                _ => segments.push(Segment::Nodes(vec![other])),
            },
        }
    }
    segments
}

/// Quote `text` as a Go interpreted string literal
pub fn go_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(quoted, "\\x{:02x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
