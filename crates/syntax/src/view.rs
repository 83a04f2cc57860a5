//! Grammar-derived child access for any registered node kind.

use indexmap::IndexMap;

use crate::error::Error;
use crate::grammar::{Cardinality, CompiledRule};
use crate::syntax_kind::SyntaxKind;
use crate::tree::NodeRef;

/// A read-only projection of one node through the rule it was parsed with.
#[derive(Debug, Clone, Copy)]
pub struct TypedView<'g, 't> {
    node: NodeRef<'t>,
    rule: &'g CompiledRule,
}

/// Result of [`TypedView::get`], shaped by the child's cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessed<'t> {
    Many(Vec<NodeRef<'t>>),
    Opt(Option<NodeRef<'t>>),
    One(NodeRef<'t>),
}

impl<'g, 't> TypedView<'g, 't> {
    pub(crate) fn new(node: NodeRef<'t>, rule: &'g CompiledRule) -> Self {
        debug_assert_eq!(node.kind(), rule.kind());
        Self { node, rule }
    }

    pub fn node(&self) -> NodeRef<'t> {
        self.node
    }

    pub fn accessors(&self) -> &'g IndexMap<SyntaxKind, Cardinality> {
        self.rule.accessors()
    }

    /// Every direct child of kind `child`, in document order.
    pub fn list(&self, child: SyntaxKind) -> Result<Vec<NodeRef<'t>>, Error> {
        self.check(child, Cardinality::ZeroOrMore)?;
        Ok(self.children_of(child).collect())
    }

    pub fn opt(&self, child: SyntaxKind) -> Result<Option<NodeRef<'t>>, Error> {
        self.check(child, Cardinality::ZeroOrOne)?;
        let mut found = self.children_of(child);
        let first = found.next();
        match found.count() {
            0 => Ok(first),
            more => Err(self.violation(child, more + 1)),
        }
    }

    pub fn one(&self, child: SyntaxKind) -> Result<NodeRef<'t>, Error> {
        self.check(child, Cardinality::ExactlyOne)?;
        let mut found = self.children_of(child);
        match (found.next(), found.count()) {
            (Some(node), 0) => Ok(node),
            (None, _) => Err(self.violation(child, 0)),
            (Some(_), more) => Err(self.violation(child, more + 1)),
        }
    }

    /// Accesses `child` with whatever cardinality the rule gives it.
    pub fn get(&self, child: SyntaxKind) -> Result<Accessed<'t>, Error> {
        match self.rule.accessor(child) {
            Some(Cardinality::ExactlyOne) => self.one(child).map(Accessed::One),
            Some(Cardinality::ZeroOrOne) => self.opt(child).map(Accessed::Opt),
            Some(Cardinality::ZeroOrMore | Cardinality::OneOrMore) => {
                self.list(child).map(Accessed::Many)
            }
            None => Err(self.mismatch(child, Cardinality::ZeroOrMore)),
        }
    }

    fn children_of(&self, child: SyntaxKind) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.node.children().filter(move |node| node.kind() == child)
    }

    fn check(&self, child: SyntaxKind, requested: Cardinality) -> Result<(), Error> {
        match self.rule.accessor(child) {
            Some(actual) if actual == requested => Ok(()),
            _ => Err(self.mismatch(child, requested)),
        }
    }

    fn mismatch(&self, child: SyntaxKind, requested: Cardinality) -> Error {
        Error::AccessorMismatch {
            kind: self.node.kind(),
            child,
            requested,
            actual: self.rule.accessor(child),
        }
    }

    fn violation(&self, child: SyntaxKind, found: usize) -> Error {
        Error::StructuralViolation {
            kind: self.node.kind(),
            child,
            range: self.node.range(),
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextRange;

    use super::*;
    use crate::config::ParseConfig;
    use crate::grammar::{Grammar, GrammarBuilder, GrammarRule, node, tok};
    use crate::layout::LayoutMode;
    use crate::syntax_kind::SyntaxKind::{Cdecls, Pragma, QName, Ttype, TypeSignature};
    use crate::token_kind::TokenKind;
    use crate::tree::{NodeId, Payload, SyntaxTree, TreeBuilder};
    use crate::{T, parse_with};

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    fn leaf(builder: &mut TreeBuilder, kind: SyntaxKind, start: u32, text: &str) -> NodeId {
        let end = start + text.len() as u32;
        let token = builder.token(TokenKind::VarId, range(start, end), text);
        builder.new_node(kind, range(start, end), vec![token], Payload::None)
    }

    /// `TypeSignature` holding the given children, built by hand to bypass the parser.
    fn signature(children: &[SyntaxKind]) -> SyntaxTree {
        let mut builder = TreeBuilder::new();
        let ids: Vec<NodeId> = children
            .iter()
            .enumerate()
            .map(|(index, kind)| leaf(&mut builder, *kind, index as u32 * 2, "x"))
            .collect();
        let end = (children.len() as u32 * 2).saturating_sub(1);
        let root = builder.new_node(TypeSignature, range(0, end), ids, Payload::None);
        builder.finish(root)
    }

    #[test]
    fn cdecls_accessors() {
        let config = ParseConfig {
            layout: LayoutMode::None,
            ..ParseConfig::default()
        };
        let text = "{ {-# INLINE f #-}; f :: Int; g :: Bool; ) }";
        let parse = parse_with(text, Cdecls, &config).unwrap();
        let view = Grammar::haskell().view(parse.tree().root()).unwrap();

        assert_eq!(view.list(Pragma).unwrap().len(), 1);
        let signatures = view.list(TypeSignature).unwrap();
        let names: Vec<String> = signatures
            .iter()
            .map(|signature| signature.first_token().unwrap().text())
            .collect();
        assert_eq!(names, ["f", "g"]);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(&text[parse.errors()[0].range], ")");
    }

    #[test]
    fn cardinality_checks() {
        let tree = signature(&[QName, Ttype]);
        let view = Grammar::haskell().view(tree.root()).unwrap();

        assert_eq!(view.list(QName).unwrap().len(), 1);
        assert_eq!(view.one(Ttype).unwrap().kind(), Ttype);
        assert_eq!(
            view.opt(Ttype),
            Err(Error::AccessorMismatch {
                kind: TypeSignature,
                child: Ttype,
                requested: Cardinality::ZeroOrOne,
                actual: Some(Cardinality::ExactlyOne),
            })
        );
        assert_eq!(
            view.list(Pragma),
            Err(Error::AccessorMismatch {
                kind: TypeSignature,
                child: Pragma,
                requested: Cardinality::ZeroOrMore,
                actual: None,
            })
        );
        assert!(matches!(view.get(Ttype), Ok(Accessed::One(node)) if node.kind() == Ttype));
        assert!(matches!(view.get(QName), Ok(Accessed::Many(nodes)) if nodes.len() == 1));
    }

    #[test]
    fn structural_violations() {
        let missing = signature(&[QName]);
        let view = Grammar::haskell().view(missing.root()).unwrap();
        assert_eq!(
            view.one(Ttype),
            Err(Error::StructuralViolation {
                kind: TypeSignature,
                child: Ttype,
                range: range(0, 1),
                found: 0,
            })
        );

        let twice = signature(&[QName, Ttype, Ttype]);
        let view = Grammar::haskell().view(twice.root()).unwrap();
        assert!(matches!(
            view.one(Ttype),
            Err(Error::StructuralViolation { found: 2, .. })
        ));
    }

    #[test]
    fn optional_child() {
        let mut grammar = GrammarBuilder::new();
        grammar
            .register(QName, GrammarRule::new().seq([tok(TokenKind::VarId)]))
            .register(
                TypeSignature,
                GrammarRule::new()
                    .opt([node(QName)])
                    .seq([tok(T![::])]),
            );
        let grammar: Grammar = grammar.build().unwrap();

        let tree = signature(&[QName]);
        let view = grammar.view(tree.root()).unwrap();
        assert_eq!(view.opt(QName).unwrap().map(|node| node.kind()), Some(QName));
        assert_eq!(view.accessors().len(), 1);

        let tree = signature(&[QName, QName]);
        let view = grammar.view(tree.root()).unwrap();
        assert!(matches!(
            view.opt(QName),
            Err(Error::StructuralViolation { found: 2, .. })
        ));
    }

    #[test]
    fn unregistered_kind() {
        let tree = signature(&[]);
        let grammar = GrammarBuilder::new().build().unwrap();
        assert_eq!(
            grammar.view(tree.root()).unwrap_err(),
            Error::UnknownNonTerminal(TypeSignature)
        );
    }
}
