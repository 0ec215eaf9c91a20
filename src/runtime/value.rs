use super::node::{Node, RenderFn};
use std::fmt;

/// Dynamically typed prop or text value
#[derive(Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Child nodes passed around as a value
    Nodes(Vec<Node>),
    /// A render function passed as a prop; has no text form
    Func(RenderFn),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Write the unescaped text form of the value
    pub fn write_text(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Value::Str(s) => out.write_str(s),
            Value::Int(n) => write!(out, "{n}"),
            Value::Float(f) => write!(out, "{f}"),
            Value::Bool(b) => write!(out, "{b}"),
            Value::Nodes(nodes) => nodes.iter().try_for_each(|node| node.write_to(out)),
            Value::Func(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Nodes(nodes) => f.debug_tuple("Nodes").field(nodes).finish(),
            Value::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Node>> for Value {
    fn from(nodes: Vec<Node>) -> Self {
        Value::Nodes(nodes)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Nodes(vec![node])
    }
}

impl From<RenderFn> for Value {
    fn from(f: RenderFn) -> Self {
        Value::Func(f)
    }
}

/// Ordered name/value pairs. Order is insertion order and is what the
/// renderer emits.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(String, Value)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`. An existing entry is replaced in place and its old value
    /// returned; otherwise the entry is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry of `other` with [`insert`](Self::insert) semantics
    pub fn merge(&mut self, other: &Props) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    /// Copy of `self` with `other` merged over it
    pub fn merged(&self, other: &Props) -> Props {
        let mut props = self.clone();
        props.merge(other);
        props
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Props {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Absent props behave as empty props
impl From<Option<Props>> for Props {
    fn from(props: Option<Props>) -> Self {
        props.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(props: &Props) -> Vec<&str> {
        props.iter().map(|(key, _)| key).collect()
    }

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut props = Props::new().with("b", 1).with("a", 2);
        let old = props.insert("b", 3);
        assert!(matches!(old, Some(Value::Int(1))));
        assert_eq!(keys(&props), ["b", "a"]);
        assert!(matches!(props.get("b"), Some(Value::Int(3))));
    }

    #[test]
    fn test_merge_appends_new_keys() {
        let base = Props::from([("class", "card")]);
        let merged = base.merged(&Props::from([("id", "layout")]));
        assert_eq!(keys(&merged), ["class", "id"]);
        assert_eq!(merged.get_str("class"), Some("card"));
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn test_merge_overrides_existing() {
        let mut props = Props::from([("class", "card")]);
        props.merge(&Props::from([("class", "wide")]));
        assert_eq!(props.len(), 1);
        assert_eq!(props.get_str("class"), Some("wide"));
    }

    #[test]
    fn test_none_is_empty() {
        let props: Props = None.into();
        assert!(props.is_empty());
    }

    #[test]
    fn test_text_forms() {
        let mut out = String::new();
        for value in [Value::from("s"), Value::from(-42), Value::from(1.5), Value::from(false)] {
            value.write_text(&mut out).unwrap();
            out.push('|');
        }
        assert_eq!(out, "s|-42|1.5|false|");
    }
}
