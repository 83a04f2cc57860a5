//! The node model: an arena of immutable nodes owned by a [`SyntaxTree`].

use std::fmt;

use ecow::EcoString;
use id_arena::{Arena, Id};
use serde_json::{Value, json};
use text_size::TextRange;

use crate::grammar::FirstSet;
use crate::syntax_kind::SyntaxKind;
use crate::token_kind::TokenKind;
use crate::visitor::{self, Visitor};

pub type NodeId = Id<NodeData>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    /// Source text of a terminal. Empty for virtual layout tokens.
    Token(EcoString),
    /// What the parser expected where an error node stands.
    Error(FirstSet),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    kind: SyntaxKind,
    range: TextRange,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    payload: Payload,
}

/// Assembles nodes bottom-up. Every node must be adopted by exactly one parent,
/// except the root handed to [`TreeBuilder::finish`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: Arena<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(
        &mut self,
        kind: TokenKind,
        range: TextRange,
        text: impl Into<EcoString>,
    ) -> NodeId {
        self.new_node(kind.into(), range, Vec::new(), Payload::Token(text.into()))
    }

    /// Creates a node owning `children`.
    ///
    /// # Panics
    ///
    /// When a child lies outside `range`, when children overlap or are out of order,
    /// or when a child already has a parent. These are bugs in the caller, never bad input.
    pub fn new_node(
        &mut self,
        kind: SyntaxKind,
        range: TextRange,
        children: Vec<NodeId>,
        payload: Payload,
    ) -> NodeId {
        let id = self.arena.next_id();
        let mut prev_end = range.start();
        for child in &children {
            let data = &mut self.arena[*child];
            assert!(
                range.contains_range(data.range),
                "{} at {:?} does not contain child {} at {:?}",
                kind,
                range,
                data.kind,
                data.range
            );
            assert!(
                prev_end <= data.range.start(),
                "child {} at {:?} overlaps its previous sibling in {}",
                data.kind,
                data.range,
                kind
            );
            assert!(data.parent.is_none(), "{} already has a parent", data.kind);
            data.parent = Some(id);
            prev_end = data.range.end();
        }

        let allocated = self.arena.alloc(NodeData {
            kind,
            range,
            children,
            parent: None,
            payload,
        });
        debug_assert_eq!(allocated, id);
        id
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.arena[id].range
    }

    pub fn finish(self, root: NodeId) -> SyntaxTree {
        assert!(self.arena[root].parent.is_none(), "root node has a parent");
        SyntaxTree {
            arena: self.arena,
            root,
        }
    }
}

/// An immutable tree. `Send + Sync`, so it can be shared between threads as is.
#[derive(Clone)]
pub struct SyntaxTree {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn to_json(&self) -> Value {
        self.root().to_json()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// One line per node, `Kind@start..end`, indented by depth. Tokens show their text.
impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root(), 0)];
        while let Some((node, depth)) = stack.pop() {
            write!(f, "{:indent$}{}@{:?}", "", node.kind(), node.range(), indent = depth * 2)?;
            match &node.data().payload {
                Payload::Token(text) => write!(f, " {text:?}")?,
                Payload::Error(expected) => write!(f, " expected {expected}")?,
                Payload::None => {}
            }
            writeln!(f)?;
            stack.extend(node.children().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}

/// A node together with the tree it lives in.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.arena[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    pub fn payload(&self) -> &'t Payload {
        &self.data().payload
    }

    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeRef<'t>> + ExactSizeIterator + use<'t> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |id| NodeRef { tree, id: *id })
    }

    /// Composite children, skipping tokens.
    pub fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.children().filter(|child| !child.is_token())
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        let tree = self.tree;
        self.data().parent.map(|id| NodeRef { tree, id })
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node and everything below it, in pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        let mut stack = vec![*self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().rev());
            Some(node)
        })
    }

    pub fn is_token(&self) -> bool {
        self.kind().is_token()
    }

    pub fn is_error(&self) -> bool {
        self.kind().is_error()
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        match self.kind() {
            SyntaxKind::Token(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn token_text(&self) -> Option<&'t str> {
        match self.payload() {
            Payload::Token(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn error_expected(&self) -> Option<&'t FirstSet> {
        match self.payload() {
            Payload::Error(expected) => Some(expected),
            _ => None,
        }
    }

    /// First non-trivia token at or below this node.
    pub fn first_token(&self) -> Option<NodeRef<'t>> {
        self.descendants()
            .find(|node| node.is_token() && !node.kind().is_trivia())
    }

    /// Text of every token below this node, which is the source text the node was parsed from.
    pub fn text(&self) -> String {
        self.descendants()
            .filter_map(|node| node.token_text())
            .collect()
    }

    /// Calls the visitor method for this node's kind. Does not recurse.
    pub fn accept<V: Visitor<'t> + ?Sized>(self, visitor: &mut V) {
        visitor::dispatch(self, visitor);
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "kind": self.kind().to_string(),
            "range": [u32::from(self.range().start()), u32::from(self.range().end())],
        });
        match self.payload() {
            Payload::Token(text) => value["text"] = json!(text.as_str()),
            Payload::Error(expected) => value["expected"] = json!(expected.to_string()),
            Payload::None => {}
        }
        if !self.is_token() {
            value["children"] = self.children().map(|child| child.to_json()).collect();
        }
        value
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind(), self.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::T;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    fn qname(builder: &mut TreeBuilder, start: u32, text: &str) -> NodeId {
        let end = start + text.len() as u32;
        let token = builder.token(TokenKind::VarId, range(start, end), text);
        builder.new_node(SyntaxKind::QName, range(start, end), vec![token], Payload::None)
    }

    #[test]
    fn build_and_navigate() {
        let mut builder = TreeBuilder::new();
        let foo = qname(&mut builder, 0, "foo");
        let space = builder.token(TokenKind::Whitespace, range(3, 4), " ");
        let colons = builder.token(T![::], range(4, 6), "::");
        let signature = builder.new_node(
            SyntaxKind::TypeSignature,
            range(0, 6),
            vec![foo, space, colons],
            Payload::None,
        );
        let tree = builder.finish(signature);

        let root = tree.root();
        assert_eq!(root.kind(), SyntaxKind::TypeSignature);
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.text(), "foo ::");
        assert_eq!(root.first_token().and_then(|t| t.token_text()), Some("foo"));

        let qname = root.children().next().unwrap();
        assert_eq!(qname.parent(), Some(root));
        assert_eq!(
            qname.children().next().unwrap().ancestors().collect::<Vec<_>>(),
            vec![qname, root]
        );
        assert_eq!(
            root.descendants().map(|node| node.kind()).collect::<Vec<_>>(),
            vec![
                SyntaxKind::TypeSignature,
                SyntaxKind::QName,
                SyntaxKind::Token(TokenKind::VarId),
                SyntaxKind::Token(TokenKind::Whitespace),
                SyntaxKind::Token(T![::]),
            ]
        );
        assert_eq!(root.child_nodes().count(), 1);
        insta::assert_snapshot!(tree.to_string(), @r#"
        TypeSignature@0..6
          QName@0..3
            VarId@0..3 "foo"
          Whitespace@3..4 " "
          DoubleColon@4..6 "::"
        "#);
    }

    #[test]
    fn zero_width_nodes() {
        let mut builder = TreeBuilder::new();
        let open = builder.token(T!['{'], range(0, 0), "");
        let error = builder.new_node(
            SyntaxKind::Error,
            range(0, 0),
            Vec::new(),
            Payload::Error(FirstSet::token(T!['}'])),
        );
        let close = builder.token(T!['}'], range(0, 0), "");
        let cdecls = builder.new_node(
            SyntaxKind::Cdecls,
            range(0, 0),
            vec![open, error, close],
            Payload::None,
        );
        let tree = builder.finish(cdecls);
        assert_eq!(tree.len(), 4);
        let error = tree.root().children().nth(1).unwrap();
        assert!(error.is_error());
        assert_eq!(error.error_expected(), Some(&FirstSet::token(T!['}'])));
    }

    #[test]
    #[should_panic(expected = "does not contain child")]
    fn child_outside_parent() {
        let mut builder = TreeBuilder::new();
        let foo = qname(&mut builder, 0, "foo");
        builder.new_node(SyntaxKind::Ttype, range(1, 3), vec![foo], Payload::None);
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn children_out_of_order() {
        let mut builder = TreeBuilder::new();
        let b = qname(&mut builder, 4, "b");
        let a = qname(&mut builder, 0, "a");
        builder.new_node(SyntaxKind::Ttype, range(0, 5), vec![b, a], Payload::None);
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn shared_child() {
        let mut builder = TreeBuilder::new();
        let a = qname(&mut builder, 0, "a");
        builder.new_node(SyntaxKind::Ttype, range(0, 1), vec![a], Payload::None);
        builder.new_node(SyntaxKind::SimpleType, range(0, 1), vec![a], Payload::None);
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn repeated_empty_child() {
        let mut builder = TreeBuilder::new();
        let empty = builder.new_node(SyntaxKind::QName, range(1, 1), Vec::new(), Payload::None);
        builder.new_node(SyntaxKind::Ttype, range(0, 2), vec![empty, empty], Payload::None);
    }

    #[test]
    fn json() {
        let mut builder = TreeBuilder::new();
        let a = qname(&mut builder, 0, "a");
        let tree = builder.finish(a);
        assert_eq!(
            tree.to_json(),
            json!({
                "kind": "QName",
                "range": [0, 1],
                "children": [{ "kind": "VarId", "range": [0, 1], "text": "a" }],
            })
        );
    }
}
