//! Node model and HTML renderer used at template run time.

mod bindings;
mod node;
mod render;
mod value;

pub use bindings::Bindings;
pub use node::{Component, Element, Node, RenderFn, component, component_fn, element, text};
pub use render::{escape_html, render, render_all, render_all_to};
pub use value::{Props, Value};
