//! Serialises node trees to HTML text.
//!
//! Elements always get an explicit closing tag, attributes come out in
//! insertion order, text and attribute values are escaped. Components are
//! expanded here and nowhere else.

use super::node::Node;
use super::value::Value;
use std::fmt;
use std::io;

/// Escape the five HTML metacharacters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing to a String cannot fail
    let _ = write_escaped(&mut escaped, text);
    escaped
}

fn write_escaped<W: fmt::Write + ?Sized>(out: &mut W, text: &str) -> fmt::Result {
    let mut last = 0;
    for (i, b) in text.bytes().enumerate() {
        let entity = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        out.write_str(&text[last..i])?;
        out.write_str(entity)?;
        last = i + 1;
    }
    out.write_str(&text[last..])
}

/// Writer adapter that escapes everything passed through it
struct Escape<'a>(&'a mut dyn fmt::Write);

impl fmt::Write for Escape<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_escaped(&mut *self.0, s)
    }
}

/// `fmt::Write` over an `io::Write` that keeps the first io error
struct IoSink<'a, W: ?Sized> {
    inner: &'a mut W,
    error: Option<io::Error>,
}

impl<W: io::Write + ?Sized> fmt::Write for IoSink<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|err| {
            self.error = Some(err);
            fmt::Error
        })
    }
}

impl Node {
    /// Render into any `fmt::Write`. Fails only if `out` fails.
    pub fn write_to(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            // Nodes wrapped as a text value are markup, not text
            Node::Text(Value::Nodes(nodes)) => nodes.iter().try_for_each(|node| node.write_to(out)),
            Node::Text(value) => value.write_text(&mut Escape(&mut *out)),
            Node::Element(el) => {
                out.write_char('<')?;
                out.write_str(&el.tag)?;
                for (name, value) in el.attributes.iter() {
                    write!(out, " {name}=\"")?;
                    value.write_text(&mut Escape(&mut *out))?;
                    out.write_char('"')?;
                }
                out.write_char('>')?;
                for child in &el.children {
                    child.write_to(out)?;
                }
                write!(out, "</{}>", el.tag)
            }
            Node::Component(component) => match component.expand() {
                Some(node) => node.write_to(out),
                None => Ok(()),
            },
        }
    }

    /// Render into an `io::Write`. The first write error stops rendering
    /// and is returned.
    pub fn render_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        let mut adapter = IoSink { inner: sink, error: None };
        self.write_to(&mut adapter).map_err(|_| {
            adapter
                .error
                .take()
                .unwrap_or_else(|| io::Error::other("formatter error while rendering"))
        })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

pub fn render(node: &Node) -> String {
    node.to_string()
}

/// Render a sequence of root nodes back to back
pub fn render_all(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        // Writing to a String cannot fail
        let _ = node.write_to(&mut out);
    }
    out
}

pub fn render_all_to<W: io::Write + ?Sized>(nodes: &[Node], sink: &mut W) -> io::Result<()> {
    nodes.iter().try_for_each(|node| node.render_to(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Props, component, element, text};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain ünïcode"), "plain ünïcode");
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let node = element("a", Props::new().with("title", r#"say "hi""#), vec![]);
        assert_eq!(render(&node), r#"<a title="say &quot;hi&quot;"></a>"#);
    }

    #[test]
    fn test_nodes_value_in_text_is_markup() {
        let node = text(vec![element("b", Props::new(), vec![text("x")])]);
        assert_eq!(render(&node), "<b>x</b>");
    }

    #[test]
    fn test_nodes_value_in_attribute_is_escaped() {
        let inner = element("b", Props::new(), vec![]);
        let node = element("div", Props::new().with("data-html", inner), vec![]);
        assert_eq!(render(&node), r#"<div data-html="&lt;b&gt;&lt;/b&gt;"></div>"#);
    }

    #[test]
    fn test_func_value_renders_nothing() {
        let f: crate::runtime::RenderFn = std::sync::Arc::new(|_: &Props, _: &[Node]| -> Option<Node> { None });
        let node = element("i", Props::new().with("on", f), vec![]);
        assert_eq!(render(&node), r#"<i on=""></i>"#);
    }

    #[test]
    fn test_float_uses_shortest_form() {
        assert_eq!(render(&text(0.1)), "0.1");
        assert_eq!(render(&text(3.0)), "3");
    }

    #[test]
    fn test_render_all_has_no_separator() {
        let nodes = [text("a"), element("br", Props::new(), vec![]), text("b")];
        assert_eq!(render_all(&nodes), "a<br></br>b");
    }

    #[test]
    fn test_component_returning_component() {
        let inner = component(|_, children| Some(element("em", Props::new(), children.to_vec())), Props::new(), vec![text("deep")]);
        let outer = component(move |_, _| Some(inner.clone()), Props::new(), vec![]);
        assert_eq!(render(&outer), "<em>deep</em>");
    }

    struct FailAfter {
        remaining: usize,
        written: Vec<u8>,
    }

    impl io::Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.remaining -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_stops_rendering() {
        let node = element("p", Props::new(), vec![text("one"), text("two")]);
        let mut sink = FailAfter { remaining: 2, written: Vec::new() };
        let err = node.render_to(&mut sink).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(String::from_utf8(sink.written).unwrap(), "<p");
    }

    #[test]
    fn test_render_to_vec() {
        let mut buf = Vec::new();
        render_all_to(&[text("<"), text(">")], &mut buf).unwrap();
        assert_eq!(buf, b"&lt;&gt;");
    }
}
