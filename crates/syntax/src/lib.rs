use serde_json::{Value, json};

use crate::ast::AstNode;
use crate::parser::Parser;
use crate::token_stream::Token;

pub mod ast;
pub mod config;
pub mod error;
pub mod grammar;
pub mod layout;
pub mod lexer;
mod parser;
pub mod syntax_kind;
pub mod token_kind;
pub mod token_stream;
pub mod tree;
pub mod view;
pub mod visitor;

pub use crate::config::ParseConfig;
pub use crate::error::{Error, SyntaxError};
pub use crate::grammar::Grammar;
pub use crate::syntax_kind::SyntaxKind;
pub use crate::tree::{NodeRef, SyntaxTree};

#[derive(Debug, Clone)]
pub struct Parse {
    tree: SyntaxTree,
    errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// The root as a typed wrapper, if it has that wrapper's kind.
    pub fn root<'t, N: AstNode<'t>>(&'t self) -> Option<N> {
        N::cast(self.tree.root())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn into_parts(self) -> (SyntaxTree, Vec<SyntaxError>) {
        (self.tree, self.errors)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "tree": self.tree.to_json(),
            "errors": self.errors.iter().map(SyntaxError::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Parses a whole module with the default configuration.
pub fn parse(text: &str) -> Parse {
    let config = ParseConfig::default();
    let tokens = layout::resolve(lexer::tokenize(text), text, config.layout);
    run(tokens, SyntaxKind::Module, Grammar::haskell(), &config)
}

/// Parses `text` as any non-terminal of the Haskell grammar.
pub fn parse_with(text: &str, start: SyntaxKind, config: &ParseConfig) -> Result<Parse, Error> {
    let tokens = layout::resolve(lexer::tokenize(text), text, config.layout);
    parse_tokens(tokens, start, Grammar::haskell(), config)
}

/// Parses an already lexed token stream. Tokens must be in document order and must not
/// overlap. An `Eof` token is appended when missing.
pub fn parse_tokens(
    tokens: Vec<Token>,
    start: SyntaxKind,
    grammar: &Grammar,
    config: &ParseConfig,
) -> Result<Parse, Error> {
    grammar.rule_for(start)?;
    Ok(run(tokens, start, grammar, config))
}

fn run(tokens: Vec<Token>, start: SyntaxKind, grammar: &Grammar, config: &ParseConfig) -> Parse {
    let mut parser = Parser::new(grammar, tokens, config);
    parser.parse(start);
    let (tree, errors) = parser.finish();
    Parse { tree, errors }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use text_size::TextRange;

    use super::*;
    use crate::layout::LayoutMode;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shareable() {
        assert_send_sync::<SyntaxTree>();
        assert_send_sync::<Grammar>();
        assert_send_sync::<Parse>();
    }

    #[test]
    fn unknown_start() {
        let grammar = grammar::GrammarBuilder::new().build().unwrap();
        let result =
            parse_tokens(Vec::new(), SyntaxKind::Module, &grammar, &ParseConfig::default());
        assert_eq!(result.unwrap_err(), Error::UnknownNonTerminal(SyntaxKind::Module));
        let result = parse_with("x", SyntaxKind::Extension(3), &ParseConfig::default());
        assert_eq!(result.unwrap_err(), Error::UnknownNonTerminal(SyntaxKind::Extension(3)));
    }

    #[test]
    fn empty_token_stream() {
        let parse = parse_tokens(
            Vec::new(),
            SyntaxKind::Ttype,
            Grammar::haskell(),
            &ParseConfig::default(),
        )
        .unwrap();
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.tree().root().range(), TextRange::default());
    }

    /// Kinds and structure, without trivia.
    fn shape(node: NodeRef<'_>) -> String {
        let children: Vec<String> = node
            .children()
            .filter(|child| !child.kind().is_trivia())
            .map(shape)
            .collect();
        match node.token_text() {
            Some(text) => format!("{}({text})", node.kind()),
            None => format!("{}[{}]", node.kind(), children.join(" ")),
        }
    }

    const PROGRAM: &str = "\
module Queue (Queue, empty, push) where

import qualified Data.List as L
import Data.Maybe (fromMaybe, Maybe(..))

infixl 5 |>

data Queue a = Queue [a] [a] deriving (Eq, Show)

newtype Wrapped = Wrapped { unwrap :: Int }

type Pair a = (a, a)

class Sized f where
  size :: f a -> Int
  default size :: Foldable f => f a -> Int
  size = length

instance Sized Queue where
  size (Queue f b) = length f + length b

empty :: Queue a
empty = Queue [] []

push :: a -> Queue a -> Queue a
push x (Queue f b) = do
  let b' = x : b
  return (Queue f b')
";

    #[test]
    fn valid_program() {
        let parse = parse(PROGRAM);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let root = parse.tree().root();
        assert_eq!(root.range(), TextRange::up_to(PROGRAM.len().try_into().unwrap()));
        assert!(root.descendants().all(|node| !node.is_error()));
        assert_eq!(root.text(), PROGRAM);
    }

    #[test]
    fn reparse_is_isomorphic() {
        let parse = parse(PROGRAM);
        let config = ParseConfig {
            layout: LayoutMode::None,
            ..ParseConfig::default()
        };
        let kinds = [
            SyntaxKind::ImportDeclaration,
            SyntaxKind::DataDeclaration,
            SyntaxKind::NewtypeDeclaration,
            SyntaxKind::TypeDeclaration,
            SyntaxKind::TypeSignature,
            SyntaxKind::FixityDeclaration,
        ];
        let mut checked = 0;
        for node in parse.tree().root().descendants() {
            if !kinds.contains(&node.kind()) {
                continue;
            }
            let reparsed = parse_with(&node.text(), node.kind(), &config).unwrap();
            assert!(reparsed.errors().is_empty(), "{:?}", reparsed.errors());
            assert_eq!(shape(reparsed.tree().root()), shape(node));
            checked += 1;
        }
        assert_eq!(checked, 10);
    }

    #[test]
    fn stray_closers_keep_later_declarations() {
        for closer in [")", "]", "in"] {
            let text = format!("f :: Int\n{closer}\ng :: Int\nh :: Bool\n");
            let parse = parse(&text);
            let body = parse.root::<ast::Module>().unwrap().body().unwrap();
            assert_eq!(body.type_signature_list().count(), 3, "{closer}");
            assert!(parse.tree().root().child_nodes().all(|node| !node.is_error()));
            if closer != "in" {
                assert_eq!(parse.errors().len(), 1);
                assert_eq!(&text[parse.errors()[0].range], closer);
            }
        }
    }

    fn check_invariants(text: &str, parse: &Parse) -> Result<(), TestCaseError> {
        let root = parse.tree().root();
        prop_assert_eq!(root.range(), TextRange::up_to(text.len().try_into().unwrap()));
        prop_assert_eq!(root.text(), text);

        for node in root.descendants() {
            let mut prev_end = node.range().start();
            for child in node.children() {
                prop_assert!(node.range().contains_range(child.range()));
                prop_assert!(prev_end <= child.range().start());
                prev_end = child.range().end();
            }
        }

        let error_ranges: Vec<TextRange> = root
            .descendants()
            .filter(|node| node.is_error())
            .map(|node| node.range())
            .collect();
        let diagnostic_ranges: Vec<TextRange> =
            parse.errors().iter().map(|error| error.range).collect();
        prop_assert_eq!(error_ranges, diagnostic_ranges);
        Ok(())
    }

    fn fragment() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("module M where\n"),
            Just("import qualified Data.Map as M\n"),
            Just("import A hiding (b, C(..))\n"),
            Just("data T a = A a | B { f :: Int } deriving Show\n"),
            Just("class C a where\n  m :: a\n"),
            Just("instance C Int where\n  m = 0\n"),
            Just("type family F a :: *\n"),
            Just("f :: Int -> Int\n"),
            Just("f x = let y = x in y\n"),
            Just("main = do\n  print 1\n"),
            Just("{-# INLINE f #-}\n"),
            Just("infixr 5 ++\n"),
            Just("("),
            Just(")"),
            Just("]"),
            Just("}"),
            Just("{"),
            Just(" where "),
            Just("\"unterminated\n"),
            Just("'"),
            Just("  "),
            Just("::"),
        ]
    }

    proptest! {
        #[test]
        fn never_panics_and_keeps_invariants(
            fragments in prop::collection::vec(fragment(), 0..24),
        ) {
            let text = fragments.concat();
            let parse = parse(&text);
            check_invariants(&text, &parse)?;
        }

        #[test]
        fn arbitrary_text(text in "[a-zA-Z0-9 \n(){};:=|,.'\"\\-]{0,80}") {
            let parse = parse(&text);
            check_invariants(&text, &parse)?;
        }
    }
}
