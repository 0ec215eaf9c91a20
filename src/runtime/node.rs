use super::value::{Props, Value};
use std::fmt;
use std::sync::Arc;

/// Component render function. Returning `None` renders nothing.
pub type RenderFn = Arc<dyn Fn(&Props, &[Node]) -> Option<Node> + Send + Sync>;

/// Renderable node tree. Immutable once built; cloning is cheap for
/// components since the render function is shared.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(Value),
    Component(Component),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attributes: Props,
    pub children: Vec<Node>,
}

/// Deferred component call, expanded at render time
#[derive(Clone)]
pub struct Component {
    pub render: RenderFn,
    pub props: Props,
    pub children: Vec<Node>,
}

impl Component {
    /// Invoke the render function
    pub fn expand(&self) -> Option<Node> {
        (self.render)(&self.props, &self.children)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("props", &self.props)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// `<tag ...attributes>children</tag>`
pub fn element(tag: impl Into<String>, attributes: impl Into<Props>, children: Vec<Node>) -> Node {
    Node::Element(Element {
        tag: tag.into(),
        attributes: attributes.into(),
        children,
    })
}

/// Escaped text
pub fn text(value: impl Into<Value>) -> Node {
    Node::Text(value.into())
}

pub fn component<F>(render: F, props: impl Into<Props>, children: Vec<Node>) -> Node
where
    F: Fn(&Props, &[Node]) -> Option<Node> + Send + Sync + 'static,
{
    component_fn(Arc::new(render), props, children)
}

/// Like [`component`], for a render function that is already shared
pub fn component_fn(render: RenderFn, props: impl Into<Props>, children: Vec<Node>) -> Node {
    Node::Component(Component {
        render,
        props: props.into(),
        children,
    })
}
