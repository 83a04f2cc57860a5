//! Table-driven recursive descent.
//!
//! The parser walks the slots of [`CompiledRule`]s and records `Start`/`Token`/`Finish`
//! events, which [`Parser::finish`] folds into a [`SyntaxTree`]. Alternatives with
//! overlapping first sets are each tried on a window of at most `backtrack_limit` tokens;
//! the one that gets furthest before its first error wins.

use std::cell::Cell;

use ecow::{EcoString, eco_format};
use text_size::{TextRange, TextSize};

use crate::config::ParseConfig;
use crate::error::SyntaxError;
use crate::grammar::{Cardinality, CompiledSlot, Element, FirstSet, Grammar, Pattern};
use crate::syntax_kind::SyntaxKind;
use crate::token_kind::{TokenKind, TokenSet};
use crate::token_stream::Token;
use crate::tree::{NodeId, Payload, SyntaxTree, TreeBuilder};

const MAX_DEPTH: u32 = 100;

#[derive(Debug)]
enum Event {
    Start { kind: SyntaxKind, offset: TextSize },
    Error { expected: FirstSet, offset: TextSize },
    Token { index: usize },
    Finish,
}

#[derive(Debug)]
struct Diagnostic {
    /// Token index the error was reported at.
    pos: usize,
    error: SyntaxError,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    events: usize,
    diagnostics: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    /// Tokens consumed before the first error.
    progress: usize,
    error_free: bool,
}

/// The outcome of a speculative run that the real parse would reproduce exactly.
struct Stash {
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
    pos: usize,
    horizon: Option<usize>,
}

pub(crate) struct Parser<'g> {
    grammar: &'g Grammar,
    tokens: Vec<Token>,
    /// Index of the `Eof` token.
    end: usize,
    pos: usize,
    /// Tokens at or after this index read as `Eof`.
    horizon: usize,
    /// Set when a pretend `Eof` at the horizon was looked at.
    touched: Cell<bool>,
    speculating: u32,
    depth: u32,
    backtrack_limit: usize,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl<'g> Parser<'g> {
    pub(crate) fn new(grammar: &'g Grammar, mut tokens: Vec<Token>, config: &ParseConfig) -> Self {
        match tokens.iter().position(|token| token.kind == TokenKind::Eof) {
            Some(index) => tokens.truncate(index + 1),
            None => {
                let offset = tokens.last().map_or(TextSize::from(0), |token| token.range.end());
                tokens.push(Token::eof(offset));
            }
        }
        let end = tokens.len() - 1;
        Self {
            grammar,
            events: Vec::with_capacity(tokens.len() * 2),
            tokens,
            end,
            pos: 0,
            horizon: end,
            touched: Cell::new(false),
            speculating: 0,
            depth: 0,
            backtrack_limit: config.backtrack_limit.max(1),
            diagnostics: Vec::new(),
        }
    }

    /// Parses the whole input as `start`. Anything left over becomes one trailing error node.
    pub(crate) fn parse(&mut self, start: SyntaxKind) {
        let offset = self.tokens[0].range.start();
        self.events.push(Event::Start { kind: start, offset });
        self.eat_trivia();
        self.rule_body(start, &FirstSet::token(TokenKind::Eof));
        if !self.at_eof() {
            self.skip(&FirstSet::token(TokenKind::Eof), None);
        }
        self.events.push(Event::Finish);
    }

    pub(crate) fn finish(self) -> (SyntaxTree, Vec<SyntaxError>) {
        struct Open {
            kind: SyntaxKind,
            offset: TextSize,
            payload: Payload,
            children: Vec<NodeId>,
        }

        let mut builder = TreeBuilder::new();
        let mut stack: Vec<Open> = Vec::new();
        let mut root = None;
        for event in self.events {
            match event {
                Event::Start { kind, offset } => stack.push(Open {
                    kind,
                    offset,
                    payload: Payload::None,
                    children: Vec::new(),
                }),
                Event::Error { expected, offset } => stack.push(Open {
                    kind: SyntaxKind::Error,
                    offset,
                    payload: Payload::Error(expected),
                    children: Vec::new(),
                }),
                Event::Token { index } => {
                    let token = &self.tokens[index];
                    let id = builder.token(token.kind, token.range, token.text.clone());
                    if let Some(open) = stack.last_mut() {
                        open.children.push(id);
                    }
                }
                Event::Finish => {
                    let Some(open) = stack.pop() else {
                        continue;
                    };
                    let range = match (open.children.first(), open.children.last()) {
                        (Some(first), Some(last)) => TextRange::new(
                            builder.range(*first).start(),
                            builder.range(*last).end(),
                        ),
                        _ => TextRange::empty(open.offset),
                    };
                    let id = builder.new_node(open.kind, range, open.children, open.payload);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(id),
                        None => root = Some(id),
                    }
                }
            }
        }

        let root = root.expect("the start node is always finished");
        let tree = builder.finish(root);
        let errors: Vec<SyntaxError> = self.diagnostics.into_iter().map(|d| d.error).collect();
        tracing::debug!(
            tokens = self.tokens.len(),
            nodes = tree.len(),
            errors = errors.len(),
            "parsed {}",
            tree.root().kind()
        );
        (tree, errors)
    }

    fn current(&self) -> &Token {
        if self.pos >= self.horizon {
            if self.horizon < self.end {
                self.touched.set(true);
            }
            &self.tokens[self.end]
        } else {
            &self.tokens[self.pos]
        }
    }

    fn current_offset(&self) -> TextSize {
        self.tokens[self.pos.min(self.end)].range.start()
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn at(&self, element: &Element) -> bool {
        self.grammar.element_matches(element, self.current())
    }

    fn bump(&mut self) {
        if self.pos >= self.horizon {
            return;
        }
        self.events.push(Event::Token { index: self.pos });
        self.pos += 1;
        self.eat_trivia();
    }

    fn eat_trivia(&mut self) {
        while self.pos < self.horizon && self.tokens[self.pos].kind.is_trivia() {
            self.events.push(Event::Token { index: self.pos });
            self.pos += 1;
        }
    }

    fn node(&mut self, kind: SyntaxKind, recovery: &FirstSet) {
        let offset = self.current_offset();
        self.events.push(Event::Start { kind, offset });
        if self.depth >= MAX_DEPTH {
            if !self.at_eof() {
                let everything: TokenSet = TokenKind::ALL.into_iter().collect();
                self.skip(&FirstSet::new(everything), Some("nesting too deep".into()));
            }
        } else {
            self.depth += 1;
            self.rule_body(kind, recovery);
            self.depth -= 1;
        }
        self.events.push(Event::Finish);
    }

    fn rule_body(&mut self, kind: SyntaxKind, recovery: &FirstSet) {
        let grammar = self.grammar;
        let rule = grammar.rule(kind);
        for slot in rule.slots() {
            let follow = slot.follow().union(recovery);
            match slot.cardinality() {
                Cardinality::ExactlyOne => self.required(slot, &follow),
                Cardinality::ZeroOrOne => self.optional(slot, &follow),
                Cardinality::ZeroOrMore | Cardinality::OneOrMore => self.repeat(slot, &follow),
            }
        }
    }

    fn required(&mut self, slot: &CompiledSlot, follow: &FirstSet) {
        let elements = match slot.pattern() {
            Pattern::Seq(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    let follow = slot.element_follow(index).union(follow);
                    self.expect(element, &follow);
                }
                return;
            }
            Pattern::Choice(elements) => elements,
        };

        if !slot.first().matches(self.current()) && !slot.is_nullable() {
            let stop = slot.first().union(follow);
            if !stop.matches(self.current()) && !self.at_eof() {
                self.skip(&stop, None);
            }
        }
        if !self.choose(elements, follow) {
            self.error_here(slot.first().clone(), eco_format!("expected {}", slot.first()));
        }
    }

    fn expect(&mut self, element: &Element, follow: &FirstSet) {
        if self.at(element) || self.grammar.element_nullable(element) {
            self.element(element, follow);
            return;
        }
        let first = self.grammar.element_first(element);
        let stop = first.union(follow);
        if !stop.matches(self.current()) && !self.at_eof() {
            self.skip(&stop, None);
            if self.at(element) {
                self.element(element, follow);
                return;
            }
        }
        self.error_here(first, eco_format!("expected {element}"));
        if let Element::Node(kind) = element {
            // Keeps exactly-one accessors valid on recovered trees.
            let offset = self.current_offset();
            self.events.push(Event::Start { kind: *kind, offset });
            self.events.push(Event::Finish);
        }
    }

    fn optional(&mut self, slot: &CompiledSlot, follow: &FirstSet) {
        if !slot.first().matches(self.current()) {
            if self.at_eof() || follow.matches(self.current()) {
                return;
            }
            let stop = slot.first().union(follow);
            self.skip(&stop, None);
            if !slot.first().matches(self.current()) {
                return;
            }
        }
        self.once(slot, follow);
    }

    fn repeat(&mut self, slot: &CompiledSlot, follow: &FirstSet) {
        let first = slot.first();
        let separator = slot.separator();
        let mut recovery = follow.union(first);
        if let Some(separator) = separator {
            recovery.insert_all(&FirstSet::token(separator));
        }

        let mut count = 0;
        let mut expecting_item = true;
        loop {
            let token = self.current();
            if token.kind == TokenKind::Eof {
                break;
            }
            if separator == Some(token.kind) && !expecting_item {
                self.bump();
                expecting_item = true;
                continue;
            }
            if first.matches(token) && expecting_item {
                let before = self.pos;
                self.once(slot, &recovery);
                count += 1;
                expecting_item = separator.is_none();
                if self.pos == before {
                    break;
                }
                continue;
            }
            if follow.matches(token) {
                break;
            }
            self.skip(&recovery, None);
        }

        if count == 0 && slot.cardinality() == Cardinality::OneOrMore {
            self.error_here(first.clone(), eco_format!("expected {first}"));
        }
    }

    /// One match of the slot's pattern.
    fn once(&mut self, slot: &CompiledSlot, follow: &FirstSet) {
        match slot.pattern() {
            Pattern::Seq(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    let follow = slot.element_follow(index).union(follow);
                    self.expect(element, &follow);
                }
            }
            Pattern::Choice(elements) => {
                if !self.choose(elements, follow) {
                    self.error_here(slot.first().clone(), eco_format!("expected {}", slot.first()));
                }
            }
        }
    }

    /// Parses the alternative that fits the lookahead, returning false if none does.
    fn choose(&mut self, elements: &[Element], recovery: &FirstSet) -> bool {
        let token = self.current();
        let candidates: Vec<&Element> = elements
            .iter()
            .filter(|element| self.grammar.element_matches(element, token))
            .collect();
        match candidates.as_slice() {
            [] => match elements.iter().find(|e| self.grammar.element_nullable(e)) {
                Some(element) => self.element(element, recovery),
                None => return false,
            },
            [element] => self.element(element, recovery),
            _ => self.speculate(&candidates, recovery),
        }
        true
    }

    fn element(&mut self, element: &Element, recovery: &FirstSet) {
        match element {
            Element::Token(_) | Element::Keyword(_) => self.bump(),
            Element::Node(kind) => self.node(*kind, recovery),
        }
    }

    fn speculate(&mut self, candidates: &[&Element], recovery: &FirstSet) {
        let checkpoint = self.checkpoint();
        let saved_horizon = self.horizon;
        let saved_touched = self.touched.get();
        let limit = self.window_end().min(saved_horizon);

        self.speculating += 1;
        let nested = self.speculating > 1;
        let mut any_touched = false;
        let mut best: Option<(usize, Rank)> = None;
        let mut stash = None;
        for (index, element) in candidates.iter().enumerate() {
            self.horizon = limit;
            self.touched.set(false);
            self.element(element, recovery);

            let rank = self.rank(checkpoint);
            let touched = self.touched.get();
            any_touched |= touched;
            tracing::trace!(
                candidate = %element,
                progress = rank.progress,
                error_free = rank.error_free,
                "speculated"
            );
            if best.is_none_or(|(_, best_rank)| rank > best_rank) {
                best = Some((index, rank));
                // A nested run sees the same horizon the real one would.
                let reusable = (!touched && rank.error_free) || (nested && limit == saved_horizon);
                stash = reusable.then(|| Stash {
                    events: self.events.split_off(checkpoint.events),
                    diagnostics: self.diagnostics.split_off(checkpoint.diagnostics),
                    pos: self.pos,
                    horizon: (self.horizon < limit).then_some(self.horizon),
                });
            }
            self.rewind(checkpoint);
        }
        self.speculating -= 1;
        self.horizon = saved_horizon;
        self.touched.set(saved_touched || any_touched);

        let Some((winner, _)) = best else {
            return;
        };
        tracing::trace!(
            winner = %candidates[winner],
            reused = stash.is_some(),
            "chose alternative"
        );
        match stash {
            Some(stash) => {
                self.events.extend(stash.events);
                self.diagnostics.extend(stash.diagnostics);
                self.pos = stash.pos;
                if let Some(horizon) = stash.horizon {
                    self.horizon = horizon;
                }
            }
            None => self.element(candidates[winner], recovery),
        }
    }

    /// Index of the first token outside the speculation window starting at the current token.
    fn window_end(&self) -> usize {
        let mut seen = 0;
        for index in self.pos..self.end {
            if self.tokens[index].kind.is_trivia() {
                continue;
            }
            if seen == self.backtrack_limit {
                return index;
            }
            seen += 1;
        }
        self.end
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            events: self.events.len(),
            diagnostics: self.diagnostics.len(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.events.truncate(checkpoint.events);
        self.diagnostics.truncate(checkpoint.diagnostics);
    }

    fn rank(&self, checkpoint: Checkpoint) -> Rank {
        let first_error = self.diagnostics[checkpoint.diagnostics..].first();
        let reached = first_error.map_or(self.pos, |diagnostic| diagnostic.pos);
        Rank {
            progress: reached.saturating_sub(checkpoint.pos),
            error_free: first_error.is_none(),
        }
    }

    /// Wraps the current token, and every following one up to a token in `stop`,
    /// in an error node.
    fn skip(&mut self, stop: &FirstSet, message: Option<EcoString>) {
        if self.speculating > 0 {
            // The candidate has failed here. Everything after it reads as `Eof`.
            let error = SyntaxError::new(
                TextRange::empty(self.current_offset()),
                "unexpected token",
                stop.clone(),
            );
            self.diagnostics.push(Diagnostic { pos: self.pos, error });
            self.horizon = self.horizon.min(self.pos);
            return;
        }

        let start = self.pos;
        let offset = self.tokens[start].range.start();
        self.events.push(Event::Error {
            expected: stop.clone(),
            offset,
        });
        let end = loop {
            let token_end = self.tokens[self.pos].range.end();
            self.events.push(Event::Token { index: self.pos });
            self.pos += 1;

            let next = (self.pos..self.end)
                .find(|index| !self.tokens[*index].kind.is_trivia())
                .unwrap_or(self.end);
            if next >= self.horizon || stop.matches(&self.tokens[next]) {
                break token_end;
            }
            for index in self.pos..next {
                self.events.push(Event::Token { index });
            }
            self.pos = next;
        };
        self.events.push(Event::Finish);

        let first = &self.tokens[start];
        let message = message
            .or_else(|| first.error.clone())
            .unwrap_or_else(|| eco_format!("unexpected {}", first.kind));
        tracing::trace!(skipped = self.pos - start, "{message}");
        let error = SyntaxError::new(TextRange::new(offset, end), message, stop.clone());
        self.diagnostics.push(Diagnostic { pos: start, error });
        self.eat_trivia();
    }

    /// Records a zero-width error node where something required is missing.
    fn error_here(&mut self, expected: FirstSet, message: EcoString) {
        if self.diagnostics.last().is_some_and(|d| d.pos == self.pos) {
            return;
        }
        let offset = self.current_offset();
        if self.speculating > 0 {
            self.horizon = self.horizon.min(self.pos);
        }
        self.events.push(Event::Error {
            expected: expected.clone(),
            offset,
        });
        self.events.push(Event::Finish);
        let error = SyntaxError::new(TextRange::empty(offset), message, expected);
        self.diagnostics.push(Diagnostic {
            pos: self.pos,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextRange;

    use crate::config::ParseConfig;
    use crate::grammar::FirstSet;
    use crate::layout::LayoutMode;
    use crate::syntax_kind::SyntaxKind;
    use crate::token_kind::TokenKind;
    use crate::{Parse, T, parse, parse_with};

    fn config() -> ParseConfig {
        ParseConfig {
            layout: LayoutMode::None,
            ..ParseConfig::default()
        }
    }

    fn parse_as(text: &str, start: SyntaxKind) -> Parse {
        parse_with(text, start, &config()).unwrap()
    }

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn trivia_stays_in_innermost_node() {
        let parse = parse_as("{ f :: Int }", SyntaxKind::Cdecls);
        assert!(parse.errors().is_empty());
        insta::assert_snapshot!(parse.tree().to_string(), @r#"
        Cdecls@0..12
          LBrace@0..1 "{"
          Whitespace@1..2 " "
          TypeSignature@2..11
            QName@2..4
              VarId@2..3 "f"
              Whitespace@3..4 " "
            DoubleColon@4..6 "::"
            Whitespace@6..7 " "
            Ttype@7..11
              QName@7..11
                ConId@7..10 "Int"
                Whitespace@10..11 " "
          RBrace@11..12 "}"
        "#);
    }

    #[test]
    fn injected_token_in_repetition() {
        let text = "{ {-# INLINE f #-}; f :: Int; ) ; g :: Bool }";
        let parse = parse_as(text, SyntaxKind::Cdecls);
        let root = parse.tree().root();

        let errors: Vec<_> = root.descendants().filter(|node| node.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].parent(), Some(root));
        assert_eq!(&text[errors[0].range()], ")");

        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].range, errors[0].range());
        assert_eq!(parse.errors()[0].message, "unexpected ')'");

        let kinds: Vec<SyntaxKind> = root.child_nodes().map(|node| node.kind()).collect();
        assert_eq!(
            kinds,
            [
                SyntaxKind::Pragma,
                SyntaxKind::TypeSignature,
                SyntaxKind::Error,
                SyntaxKind::TypeSignature,
            ]
        );
    }

    #[test]
    fn missing_node_gets_placeholder() {
        let parse = parse_as("f ::", SyntaxKind::TypeSignature);
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.range, range(4, 4));
        assert_eq!(error.message, "expected Ttype");

        let kinds: Vec<SyntaxKind> = parse
            .tree()
            .root()
            .child_nodes()
            .map(|node| node.kind())
            .collect();
        assert_eq!(kinds, [SyntaxKind::QName, SyntaxKind::Error, SyntaxKind::Ttype]);
    }

    #[test]
    fn no_cascading_errors() {
        let parse = parse_as("(", SyntaxKind::ImportIdsSpec);
        assert_eq!(parse.errors().len(), 1);
        let error_nodes = parse.tree().root().descendants().filter(|n| n.is_error());
        assert_eq!(error_nodes.count(), 1);
    }

    #[test]
    fn leftover_tokens() {
        let parse = parse_as("f :: Int", SyntaxKind::QName);
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.range, range(2, 8));
        assert_eq!(error.expected, FirstSet::token(TokenKind::Eof));
        assert_eq!(parse.tree().root().range(), range(0, 8));
    }

    #[test]
    fn lexer_errors_become_diagnostics() {
        let parse = parse_as("{ \"abc\n }", SyntaxKind::Cdecls);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].message, "End of line in string literal");
    }

    #[test]
    fn longest_alternative_wins() {
        let parse = parse_as(
            "{ data family F a; type T = Int; type family G a :: *; (+) }",
            SyntaxKind::Cdecls,
        );
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let kinds: Vec<SyntaxKind> = parse
            .tree()
            .root()
            .child_nodes()
            .map(|node| node.kind())
            .collect();
        assert_eq!(
            kinds,
            [
                SyntaxKind::CdeclDataDeclaration,
                SyntaxKind::TypeDeclaration,
                SyntaxKind::TypeFamilyDeclaration,
                SyntaxKind::QName,
            ]
        );
    }

    #[test]
    fn backtrack_limit_bounds_lookahead() {
        let config = ParseConfig {
            backtrack_limit: 1,
            ..config()
        };
        let parse = parse_with("{ f :: Int }", SyntaxKind::Cdecls, &config).unwrap();
        assert!(parse.errors().is_empty());
        let root = parse.tree().root();
        assert!(root.child_nodes().all(|node| node.kind() == SyntaxKind::QName));
        assert!(root.children().any(|node| node.kind() == T![::].into()));
    }

    #[test]
    fn deep_nesting() {
        let text = format!("x = {}{}\n", "(".repeat(400), ")".repeat(400));
        let parse = parse(&text);
        assert!(!parse.errors().is_empty());
        assert!(
            parse
                .errors()
                .iter()
                .any(|error| error.message == "nesting too deep")
        );
        assert_eq!(parse.tree().root().text(), text);
    }

    #[test]
    fn valid_module_has_no_errors() {
        let parse = parse(
            "main :: IO ()\n\
             main = do\n  \
               let xs = [1, 2, 3]\n      \
                   ys = map (* 2) xs\n  \
               print (sum ys)\n  \
               where helper = \"unused\"\n",
        );
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    }
}
