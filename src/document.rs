//! Jsonnet document model.
//!
//! A [`Document`] is a tree of [`Node`]s describing the libsonnet source to
//! generate. Nodes are built bottom-up and never modified afterwards; turning
//! them into text is the job of [`crate::emit`].
//!
//! Every node carries a name. Depending on where the node is used the name is
//! the object field key, the function parameter name, or the keyword of a
//! named call argument. Anonymous nodes use an empty name.

use std::cmp::Ordering;

/// Key of an object field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// Literal field name, e.g. `resource`.
    Name(String),
    /// Field name computed from a reference at evaluation time, e.g. `[resourceLabel]`.
    Computed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Object {
        key: Key,
        fields: Vec<Node>,
    },
    Function {
        name: String,
        args: Vec<Node>,
        body: Box<Node>,
        /// Render one parameter per line.
        large: bool,
    },
    Call {
        name: String,
        func: String,
        args: Vec<Node>,
    },
    Reference {
        name: String,
        target: String,
    },
    String {
        name: String,
        value: String,
    },
    Null {
        name: String,
    },
    List {
        name: String,
        items: Vec<Node>,
    },
    Conditional {
        name: String,
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Import {
        name: String,
        path: String,
    },
    /// `local <name> = <value>;` binding.
    Local(Box<Node>),
    /// Object field combined with (`+:`) instead of replacing the existing value.
    Merge(Box<Node>),
    /// Function parameter without a default value.
    Required(Box<Node>),
    /// Object field excluded from manifestation (`::`).
    Hidden(Box<Node>),
}

impl Node {
    pub fn object(name: impl Into<String>, fields: Vec<Node>) -> Node {
        Node::Object {
            key: Key::Name(name.into()),
            fields,
        }
    }

    /// Object whose key is the value of `reference` when evaluated.
    pub fn computed_object(reference: impl Into<String>, fields: Vec<Node>) -> Node {
        Node::Object {
            key: Key::Computed(reference.into()),
            fields,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Node>, body: Node) -> Node {
        Node::Function {
            name: name.into(),
            args,
            body: Box::new(body),
            large: false,
        }
    }

    pub fn large_function(name: impl Into<String>, args: Vec<Node>, body: Node) -> Node {
        Node::Function {
            name: name.into(),
            args,
            body: Box::new(body),
            large: true,
        }
    }

    pub fn call(name: impl Into<String>, func: impl Into<String>, args: Vec<Node>) -> Node {
        Node::Call {
            name: name.into(),
            func: func.into(),
            args,
        }
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Node {
        Node::Reference {
            name: name.into(),
            target: target.into(),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Node {
        Node::String {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn null(name: impl Into<String>) -> Node {
        Node::Null { name: name.into() }
    }

    pub fn list(name: impl Into<String>, items: Vec<Node>) -> Node {
        Node::List {
            name: name.into(),
            items,
        }
    }

    pub fn conditional(name: impl Into<String>, cond: Node, then: Node, otherwise: Node) -> Node {
        Node::Conditional {
            name: name.into(),
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn import(name: impl Into<String>, path: impl Into<String>) -> Node {
        Node::Import {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn local(binding: Node) -> Node {
        Node::Local(Box::new(binding))
    }

    pub fn merge(node: Node) -> Node {
        Node::Merge(Box::new(node))
    }

    pub fn required(node: Node) -> Node {
        Node::Required(Box::new(node))
    }

    pub fn hidden(node: Node) -> Node {
        Node::Hidden(Box::new(node))
    }

    /// Name of the node, looking through markers.
    pub fn name(&self) -> &str {
        match self {
            Node::Object { key, .. } => match key {
                Key::Name(name) | Key::Computed(name) => name,
            },
            Node::Function { name, .. }
            | Node::Call { name, .. }
            | Node::Reference { name, .. }
            | Node::String { name, .. }
            | Node::Null { name }
            | Node::List { name, .. }
            | Node::Conditional { name, .. }
            | Node::Import { name, .. } => name,
            Node::Local(inner) | Node::Merge(inner) | Node::Required(inner) | Node::Hidden(inner) => {
                inner.name()
            }
        }
    }

    /// The node with every marker removed.
    pub fn unwrap_markers(&self) -> &Node {
        match self {
            Node::Local(inner) | Node::Merge(inner) | Node::Required(inner) | Node::Hidden(inner) => {
                inner.unwrap_markers()
            }
            node => node,
        }
    }

    pub fn is_required(&self) -> bool {
        self.has_marker(|n| matches!(n, Node::Required(_)))
    }

    pub fn is_hidden(&self) -> bool {
        self.has_marker(|n| matches!(n, Node::Hidden(_)))
    }

    pub fn is_merge(&self) -> bool {
        self.has_marker(|n| matches!(n, Node::Merge(_)))
    }

    fn has_marker(&self, pred: impl Fn(&Node) -> bool + Copy) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Node::Local(inner) | Node::Merge(inner) | Node::Required(inner) | Node::Hidden(inner) => {
                inner.has_marker(pred)
            }
            _ => false,
        }
    }

    /// Direct field of an object node, by name.
    pub fn field(&self, name: &str) -> Option<&Node> {
        match self.unwrap_markers() {
            Node::Object { fields, .. } => fields.iter().find(|f| f.name() == name),
            _ => None,
        }
    }

    /// Fields of an object node, or an empty slice for any other node.
    pub fn fields(&self) -> &[Node] {
        match self.unwrap_markers() {
            Node::Object { fields, .. } => fields,
            _ => &[],
        }
    }
}

/// Ordering applied to object fields and parameter lists.
pub type Comparator = fn(&Node, &Node) -> Ordering;

/// Required nodes first, then by name.
///
/// A leading `#` is ignored so that docsonnet fields sort next to the function
/// they document; between the two the `#` field comes first.
pub fn required_then_name(a: &Node, b: &Node) -> Ordering {
    match (a.is_required(), b.is_required()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let (a_name, b_name) = (a.name(), b.name());
    let (a_bare, b_bare) = (a_name.trim_start_matches('#'), b_name.trim_start_matches('#'));
    a_bare.cmp(b_bare).then_with(|| a_name.cmp(b_name))
}

/// Stable sort of `nodes` by `cmp`.
pub fn sort_nodes(nodes: &mut [Node], cmp: Comparator) {
    nodes.sort_by(cmp);
}

/// A complete libsonnet file: local bindings followed by the root expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub locals: Vec<Node>,
    pub root: Node,
}

impl Document {
    pub fn new(locals: Vec<Node>, root: Node) -> Self {
        Self { locals, root }
    }
}

/// Builders for docsonnet annotations.
pub mod docsonnet {
    use super::Node;

    /// `'#<fn_name>':: d.fn(help=..., args=[])`.
    pub fn func(fn_name: &str, help: String) -> Node {
        Node::hidden(Node::call(
            format!("#{}", fn_name),
            "d.fn",
            vec![Node::string("help", help), Node::list("args", vec![])],
        ))
    }

    /// `'#':: d.pkg(name=..., url=..., help=...)`.
    pub fn pkg(name: &str, url: &str, help: String) -> Node {
        Node::hidden(Node::call(
            "#",
            "d.pkg",
            vec![
                Node::string("name", name),
                Node::string("url", url),
                Node::string("help", help),
            ],
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names_look_through_markers() {
        let node = Node::hidden(Node::merge(Node::null("a")));
        assert_eq!(node.name(), "a");
        assert!(node.is_hidden());
        assert!(node.is_merge());
        assert!(!node.is_required());
        assert_eq!(node.unwrap_markers(), &Node::null("a"));

        let obj = Node::computed_object("resourceLabel", vec![]);
        assert_eq!(obj.name(), "resourceLabel");
    }

    #[test]
    fn test_required_sorts_first() {
        let mut params = vec![
            Node::null("c"),
            Node::null("b"),
            Node::required(Node::null("z")),
            Node::required(Node::null("a")),
        ];
        sort_nodes(&mut params, required_then_name);
        let names: Vec<_> = params.iter().map(Node::name).collect();
        assert_eq!(names, vec!["a", "z", "b", "c"]);
        assert!(params[0].is_required() && params[1].is_required());
    }

    #[test]
    fn test_docs_sort_before_their_function() {
        let mut fields = vec![
            Node::hidden(Node::function("withName", vec![], Node::null(""))),
            docsonnet::func("withName", "help".to_string()),
            Node::hidden(Node::function("new", vec![], Node::null(""))),
            docsonnet::func("new", "help".to_string()),
            docsonnet::func("newAttrs", "help".to_string()),
        ];
        sort_nodes(&mut fields, required_then_name);
        let names: Vec<_> = fields.iter().map(Node::name).collect();
        assert_eq!(names, vec!["#new", "new", "#newAttrs", "#withName", "withName"]);
    }

    #[test]
    fn test_sort_is_independent_of_insertion_order() {
        let a = vec![Node::null("x"), Node::required(Node::null("y")), Node::null("w")];
        let mut b = a.clone();
        b.reverse();
        let mut a = a;
        sort_nodes(&mut a, required_then_name);
        sort_nodes(&mut b, required_then_name);
        assert_eq!(a, b);
    }

    #[test]
    fn test_field_lookup() {
        let obj = Node::object("o", vec![Node::null("a"), Node::hidden(Node::null("b"))]);
        assert!(obj.field("a").is_some());
        assert!(obj.field("b").unwrap().is_hidden());
        assert!(obj.field("c").is_none());
        assert_eq!(obj.fields().len(), 2);
        assert!(Node::null("x").fields().is_empty());
    }
}
