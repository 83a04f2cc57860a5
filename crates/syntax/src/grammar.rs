//! Grammar rules as data.
//!
//! A [`GrammarRule`] is an ordered list of [`Slot`]s. [`GrammarBuilder::build`] validates
//! the rules and computes, once, everything the parser and the typed views need: nullability,
//! first sets, per-slot follow sets and the accessor table of every non-terminal.

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::error::Error;
use crate::syntax_kind::SyntaxKind;
use crate::token_kind::{TokenKind, TokenSet};
use crate::token_stream::Token;
use crate::tree::NodeRef;
use crate::view::TypedView;

pub(crate) mod haskell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Token(TokenKind),
    /// An identifier with fixed text, such as `qualified` or `family`.
    Keyword(&'static str),
    Node(SyntaxKind),
}

pub fn tok(kind: TokenKind) -> Element {
    Element::Token(kind)
}

pub fn kw(text: &'static str) -> Element {
    Element::Keyword(text)
}

pub fn node(kind: SyntaxKind) -> Element {
    Element::Node(kind)
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Token(kind) => write!(f, "{kind}"),
            Element::Keyword(text) => write!(f, "'{text}'"),
            Element::Node(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Every element, in order.
    Seq(Vec<Element>),
    /// Exactly one of the elements.
    Choice(Vec<Element>),
}

impl Pattern {
    pub fn elements(&self) -> &[Element] {
        match self {
            Pattern::Seq(elements) | Pattern::Choice(elements) => elements,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ExactlyOne,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Cardinality {
    pub fn is_repeated(self) -> bool {
        matches!(self, Cardinality::ZeroOrMore | Cardinality::OneOrMore)
    }

    pub fn allows_zero(self) -> bool {
        matches!(self, Cardinality::ZeroOrOne | Cardinality::ZeroOrMore)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cardinality::ExactlyOne => "exactly-one",
            Cardinality::ZeroOrOne => "zero-or-one",
            Cardinality::ZeroOrMore => "zero-or-more",
            Cardinality::OneOrMore => "one-or-more",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub pattern: Pattern,
    pub cardinality: Cardinality,
    /// Token between repetitions. Only meaningful for repeated slots.
    pub separator: Option<TokenKind>,
}

/// Rule of one non-terminal, assembled with the builder methods below.
///
/// ```
/// use haskell_syntax::T;
/// use haskell_syntax::grammar::{GrammarRule, node, tok};
/// use haskell_syntax::syntax_kind::SyntaxKind;
///
/// // ClassDeclaration ::= 'class' Ttype ('where' Cdecls)?
/// let rule = GrammarRule::new()
///     .seq([tok(T![class]), node(SyntaxKind::Ttype)])
///     .opt([tok(T![where]), node(SyntaxKind::Cdecls)]);
/// assert_eq!(rule.slots().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarRule {
    slots: Vec<Slot>,
}

impl GrammarRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    fn push(
        self,
        pattern: Pattern,
        cardinality: Cardinality,
        separator: Option<TokenKind>,
    ) -> Self {
        self.slot(Slot {
            pattern,
            cardinality,
            separator,
        })
    }

    pub fn seq(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Seq(elements.into_iter().collect());
        self.push(pattern, Cardinality::ExactlyOne, None)
    }

    pub fn opt(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Seq(elements.into_iter().collect());
        self.push(pattern, Cardinality::ZeroOrOne, None)
    }

    pub fn choice(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Choice(elements.into_iter().collect());
        self.push(pattern, Cardinality::ExactlyOne, None)
    }

    pub fn opt_choice(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Choice(elements.into_iter().collect());
        self.push(pattern, Cardinality::ZeroOrOne, None)
    }

    /// Any number of the elements, interleaved freely.
    pub fn many(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Choice(elements.into_iter().collect());
        self.push(pattern, Cardinality::ZeroOrMore, None)
    }

    pub fn many1(self, elements: impl IntoIterator<Item = Element>) -> Self {
        let pattern = Pattern::Choice(elements.into_iter().collect());
        self.push(pattern, Cardinality::OneOrMore, None)
    }

    pub fn many_sep(self, element: Element, separator: TokenKind) -> Self {
        let pattern = Pattern::Choice(vec![element]);
        self.push(pattern, Cardinality::ZeroOrMore, Some(separator))
    }

    pub fn many1_sep(self, element: Element, separator: TokenKind) -> Self {
        let pattern = Pattern::Choice(vec![element]);
        self.push(pattern, Cardinality::OneOrMore, Some(separator))
    }
}

/// Token kinds and contextual keywords that may start a construct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FirstSet {
    tokens: TokenSet,
    keywords: Vec<&'static str>,
}

impl FirstSet {
    pub fn new(tokens: TokenSet) -> Self {
        Self {
            tokens,
            keywords: Vec::new(),
        }
    }

    pub fn token(kind: TokenKind) -> Self {
        Self::new(TokenSet::single(kind))
    }

    pub fn keyword(text: &'static str) -> Self {
        Self {
            tokens: TokenSet::EMPTY,
            keywords: vec![text],
        }
    }

    pub fn tokens(&self) -> TokenSet {
        self.tokens
    }

    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.keywords.is_empty()
    }

    pub fn contains(&self, kind: TokenKind) -> bool {
        self.tokens.contains(kind)
    }

    pub fn matches(&self, token: &Token) -> bool {
        self.tokens.contains(token.kind)
            || (token.kind == TokenKind::VarId && self.keywords.contains(&token.text.as_str()))
    }

    /// Adds `other` to `self`, returning whether anything was new.
    pub fn insert_all(&mut self, other: &FirstSet) -> bool {
        let tokens = self.tokens.union(other.tokens);
        let mut changed = tokens != self.tokens;
        self.tokens = tokens;
        for keyword in &other.keywords {
            if !self.keywords.contains(keyword) {
                self.keywords.push(*keyword);
                changed = true;
            }
        }
        changed
    }

    pub fn union(&self, other: &FirstSet) -> FirstSet {
        let mut set = self.clone();
        set.insert_all(other);
        set
    }
}

impl fmt::Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .tokens
            .iter()
            .map(|kind| kind.to_string())
            .chain(self.keywords.iter().map(|text| format!("'{text}'")))
            .collect();
        match names.as_slice() {
            [] => f.write_str("nothing"),
            [single] => f.write_str(single),
            [init @ .., last] => write!(f, "one of {} or {last}", init.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSlot {
    slot: Slot,
    first: FirstSet,
    nullable: bool,
    follow: FirstSet,
    element_follows: Vec<FirstSet>,
}

impl CompiledSlot {
    pub fn pattern(&self) -> &Pattern {
        &self.slot.pattern
    }

    pub fn cardinality(&self) -> Cardinality {
        self.slot.cardinality
    }

    pub fn separator(&self) -> Option<TokenKind> {
        self.slot.separator
    }

    pub fn first(&self) -> &FirstSet {
        &self.first
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Tokens that may follow this slot inside its own rule.
    pub fn follow(&self) -> &FirstSet {
        &self.follow
    }

    /// For a sequence, the tokens that may follow its `index`th element inside the slot.
    pub(crate) fn element_follow(&self, index: usize) -> &FirstSet {
        &self.element_follows[index]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    kind: SyntaxKind,
    slots: Vec<CompiledSlot>,
    first: FirstSet,
    nullable: bool,
    accessors: IndexMap<SyntaxKind, Cardinality>,
}

impl CompiledRule {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn slots(&self) -> &[CompiledSlot] {
        &self.slots
    }

    pub fn first(&self) -> &FirstSet {
        &self.first
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Child kinds the rule permits, in order of first appearance, with the cardinality
    /// of their accessor: `ExactlyOne`, `ZeroOrOne` or `ZeroOrMore`.
    pub fn accessors(&self) -> &IndexMap<SyntaxKind, Cardinality> {
        &self.accessors
    }

    pub fn accessor(&self, child: SyntaxKind) -> Option<Cardinality> {
        self.accessors.get(&child).copied()
    }
}

#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<(SyntaxKind, GrammarRule)>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: SyntaxKind, rule: GrammarRule) -> &mut Self {
        self.rules.push((kind, rule));
        self
    }

    pub fn build(self) -> Result<Grammar, Error> {
        let mut rules = IndexMap::with_capacity(self.rules.len());
        for (kind, rule) in self.rules {
            if rules.insert(kind, rule).is_some() {
                return Err(Error::DuplicateRule(kind));
            }
        }
        for rule in rules.values() {
            for slot in rule.slots() {
                for element in slot.pattern.elements() {
                    if let Element::Node(child) = element
                        && !rules.contains_key(child)
                    {
                        return Err(Error::UnknownNonTerminal(*child));
                    }
                }
            }
        }

        let analysis = Analysis::compute(&rules);
        let rules: IndexMap<_, _> = rules
            .into_iter()
            .map(|(kind, rule)| (kind, analysis.compile(kind, rule)))
            .collect();
        tracing::debug!(rules = rules.len(), "compiled grammar");
        Ok(Grammar { rules })
    }
}

/// Nullability and first sets of every non-terminal, solved to a fixed point.
struct Analysis {
    nullable: IndexMap<SyntaxKind, bool>,
    first: IndexMap<SyntaxKind, FirstSet>,
}

impl Analysis {
    fn compute(rules: &IndexMap<SyntaxKind, GrammarRule>) -> Self {
        let mut analysis = Analysis {
            nullable: rules.keys().map(|kind| (*kind, false)).collect(),
            first: rules
                .keys()
                .map(|kind| (*kind, FirstSet::default()))
                .collect(),
        };
        loop {
            let mut changed = false;
            for (kind, rule) in rules {
                let (first, nullable) = analysis.sequence(rule.slots().iter().map(|slot| {
                    let (first, nullable) = analysis.pattern(&slot.pattern);
                    (first, nullable || slot.cardinality.allows_zero())
                }));
                if nullable && !analysis.nullable[kind] {
                    analysis.nullable[kind] = true;
                    changed = true;
                }
                changed |= analysis.first[kind].insert_all(&first);
            }
            if !changed {
                return analysis;
            }
        }
    }

    fn element(&self, element: &Element) -> (FirstSet, bool) {
        match element {
            Element::Token(kind) => (FirstSet::token(*kind), false),
            Element::Keyword(text) => (FirstSet::keyword(*text), false),
            Element::Node(kind) => (self.first[kind].clone(), self.nullable[kind]),
        }
    }

    fn pattern(&self, pattern: &Pattern) -> (FirstSet, bool) {
        match pattern {
            Pattern::Seq(elements) => {
                self.sequence(elements.iter().map(|element| self.element(element)))
            }
            Pattern::Choice(elements) => {
                let mut first = FirstSet::default();
                let mut nullable = false;
                for element in elements {
                    let (element_first, element_nullable) = self.element(element);
                    first.insert_all(&element_first);
                    nullable |= element_nullable;
                }
                (first, nullable)
            }
        }
    }

    fn sequence(&self, parts: impl Iterator<Item = (FirstSet, bool)>) -> (FirstSet, bool) {
        let mut first = FirstSet::default();
        for (part_first, part_nullable) in parts {
            first.insert_all(&part_first);
            if !part_nullable {
                return (first, false);
            }
        }
        (first, true)
    }

    fn compile(&self, kind: SyntaxKind, rule: GrammarRule) -> CompiledRule {
        let analysed: Vec<(FirstSet, bool)> = rule
            .slots
            .iter()
            .map(|slot| {
                let (first, nullable) = self.pattern(&slot.pattern);
                (first, nullable || slot.cardinality.allows_zero())
            })
            .collect();

        let slots = rule
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                let (first, nullable) = analysed[index].clone();
                let (follow, _) = self.sequence(analysed[index + 1..].iter().cloned());
                let element_follows = match &slot.pattern {
                    Pattern::Seq(elements) => (0..elements.len())
                        .map(|at| {
                            let rest = elements[at + 1..].iter().map(|e| self.element(e));
                            self.sequence(rest).0
                        })
                        .collect(),
                    Pattern::Choice(_) => Vec::new(),
                };
                CompiledSlot {
                    slot,
                    first,
                    nullable,
                    follow,
                    element_follows,
                }
            })
            .collect::<Vec<_>>();

        CompiledRule {
            kind,
            accessors: derive_accessors(&slots),
            slots,
            first: self.first[&kind].clone(),
            nullable: self.nullable[&kind],
        }
    }
}

fn derive_accessors(slots: &[CompiledSlot]) -> IndexMap<SyntaxKind, Cardinality> {
    let mut accessors = IndexMap::new();
    for slot in slots {
        let cardinality = match (slot.cardinality(), slot.pattern()) {
            (cardinality, _) if cardinality.is_repeated() => Cardinality::ZeroOrMore,
            (Cardinality::ZeroOrOne, _) | (_, Pattern::Choice(_)) => Cardinality::ZeroOrOne,
            _ => Cardinality::ExactlyOne,
        };
        for element in slot.pattern().elements() {
            let Element::Node(child) = element else {
                continue;
            };
            accessors
                .entry(*child)
                .and_modify(|existing| *existing = Cardinality::ZeroOrMore)
                .or_insert(cardinality);
        }
    }
    accessors
}

/// An immutable, validated set of rules. Cheap to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: IndexMap<SyntaxKind, CompiledRule>,
}

impl Grammar {
    /// The Haskell grammar, built on first use.
    pub fn haskell() -> &'static Grammar {
        static HASKELL: OnceLock<Grammar> = OnceLock::new();
        HASKELL.get_or_init(|| {
            haskell::builder()
                .build()
                .expect("the Haskell grammar references only registered rules")
        })
    }

    pub fn rule_for(&self, kind: SyntaxKind) -> Result<&CompiledRule, Error> {
        self.rules.get(&kind).ok_or(Error::UnknownNonTerminal(kind))
    }

    /// # Panics
    ///
    /// When `kind` has no rule. Node elements are checked at build time, so this
    /// only happens for kinds the caller never registered.
    pub(crate) fn rule(&self, kind: SyntaxKind) -> &CompiledRule {
        &self.rules[&kind]
    }

    pub fn rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.values()
    }

    pub fn contains(&self, kind: SyntaxKind) -> bool {
        self.rules.contains_key(&kind)
    }

    pub fn view<'g, 't>(&'g self, node: NodeRef<'t>) -> Result<TypedView<'g, 't>, Error> {
        let rule = self.rule_for(node.kind())?;
        Ok(TypedView::new(node, rule))
    }

    pub(crate) fn element_matches(&self, element: &Element, token: &Token) -> bool {
        match element {
            Element::Token(kind) => token.kind == *kind,
            Element::Keyword(text) => {
                token.kind == TokenKind::VarId && token.text.as_str() == *text
            }
            Element::Node(kind) => self.rules[kind].first.matches(token),
        }
    }

    pub(crate) fn element_first(&self, element: &Element) -> FirstSet {
        match element {
            Element::Token(kind) => FirstSet::token(*kind),
            Element::Keyword(text) => FirstSet::keyword(*text),
            Element::Node(kind) => self.rules[kind].first.clone(),
        }
    }

    pub(crate) fn element_nullable(&self, element: &Element) -> bool {
        match element {
            Element::Node(kind) => self.rules[kind].nullable,
            Element::Token(_) | Element::Keyword(_) => false,
        }
    }
}
