//! Lowering parsed markup documents into runtime nodes.
//!
//! Expressions are not evaluated. A `{name}` interpolation, a `{name...}`
//! spread and an `attr={name}` value each look `name` up in [`Bindings`];
//! anything more complex is rejected.

use super::node::{Node, RenderFn, component_fn, element, text};
use super::value::{Props, Value};
use crate::ast::{self, AttributeValue, Document, Markup, Span};
use crate::error::LowerError;
use std::sync::Arc;

/// Named components and values visible to a standalone document
#[derive(Clone, Default)]
pub struct Bindings {
    components: Vec<(String, RenderFn)>,
    values: Props,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under the tag name used in markup
    pub fn component<F>(self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props, &[Node]) -> Option<Node> + Send + Sync + 'static,
    {
        self.component_fn(name, Arc::new(render))
    }

    pub fn component_fn(mut self, name: impl Into<String>, render: RenderFn) -> Self {
        let name = name.into();
        self.components.retain(|(existing, _)| *existing != name);
        self.components.push((name, render));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name, value);
        self
    }

    fn lookup_component(&self, name: &str) -> Option<&RenderFn> {
        self.components.iter().find(|(key, _)| key == name).map(|(_, render)| render)
    }

    fn lookup(&self, expr: &str, span: Span) -> Result<Value, LowerError> {
        if !is_identifier(expr) {
            return Err(LowerError::Unsupported { expr: expr.to_string(), span });
        }
        self.values
            .get(expr)
            .cloned()
            .ok_or_else(|| LowerError::Unbound { name: expr.to_string(), span })
    }
}

impl Document {
    /// Build runtime nodes for the top-level markup
    pub fn to_nodes(&self, bindings: &Bindings) -> Result<Vec<Node>, LowerError> {
        lower_children(&self.nodes, bindings)
    }
}

fn lower_children(children: &[Markup], bindings: &Bindings) -> Result<Vec<Node>, LowerError> {
    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Markup::Element(el) => nodes.push(lower_element(el, bindings)?),
            Markup::Text(t) => nodes.push(text(t.content.as_str())),
            Markup::Expression(expr) => nodes.push(text(bindings.lookup(&expr.expr, expr.span)?)),
            Markup::Spread(spread) => match bindings.lookup(spread.target(), spread.span)? {
                Value::Nodes(items) => nodes.extend(items),
                other => nodes.push(text(other)),
            },
        }
    }
    Ok(nodes)
}

fn lower_element(el: &ast::Element, bindings: &Bindings) -> Result<Node, LowerError> {
    let mut props = Props::new();
    for attr in &el.attributes {
        let value = match &attr.value {
            AttributeValue::Literal(s) => Value::Str(s.clone()),
            AttributeValue::Expression(expr, span) => bindings.lookup(expr, *span)?,
        };
        props.insert(attr.name.as_str(), value);
    }
    let children = lower_children(&el.children, bindings)?;

    if el.is_component() {
        let render = bindings
            .lookup_component(&el.tag)
            .ok_or_else(|| LowerError::UnknownComponent { name: el.tag.clone(), span: el.tag_span })?;
        Ok(component_fn(render.clone(), props, children))
    } else {
        Ok(element(el.tag.as_str(), props, children))
    }
}

fn is_identifier(expr: &str) -> bool {
    let mut chars = expr.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_markup;
    use crate::runtime::render_all;

    fn render(source: &str, bindings: &Bindings) -> Result<String, LowerError> {
        let document = parse_markup(source).unwrap();
        Ok(render_all(&document.to_nodes(bindings)?))
    }

    #[test]
    fn test_plain_elements() {
        let html = render(r#"<p class="lead">Hi <b>there</b></p>"#, &Bindings::new()).unwrap();
        assert_eq!(html, r#"<p class="lead">Hi<b>there</b></p>"#);
    }

    #[test]
    fn test_values_and_spreads() {
        let bindings = Bindings::new()
            .value("name", "Ada & co")
            .value("items", vec![text("a"), text("b")])
            .value("id", 7);
        let html = render("<ul id={id}>{name}: {items...}</ul>", &bindings).unwrap();
        assert_eq!(html, r#"<ul id="7">Ada &amp; co: ab</ul>"#);
    }

    #[test]
    fn test_registered_component() {
        let bindings = Bindings::new().component("Badge", |props: &Props, children: &[Node]| {
            let label = props.get_str("label").unwrap_or("?").to_string();
            let mut kids = vec![text(label)];
            kids.extend_from_slice(children);
            Some(element("span", Props::new(), kids))
        });
        let html = render(r#"<Badge label="new">!</Badge>"#, &bindings).unwrap();
        assert_eq!(html, "<span>new!</span>");
    }

    #[test]
    fn test_unknown_component() {
        let err = render("<Missing />", &Bindings::new()).unwrap_err();
        assert!(matches!(err, LowerError::UnknownComponent { ref name, .. } if name == "Missing"));
        assert_eq!(err.span().start.byte, 0);
    }

    #[test]
    fn test_unbound_name() {
        let err = render("<p>{who}</p>", &Bindings::new()).unwrap_err();
        assert!(matches!(err, LowerError::Unbound { ref name, .. } if name == "who"));
    }

    #[test]
    fn test_complex_expression_unsupported() {
        let err = render("<p>{user.Name}</p>", &Bindings::new().value("user", "x")).unwrap_err();
        assert!(matches!(err, LowerError::Unsupported { ref expr, .. } if expr == "user.Name"));
    }
}
