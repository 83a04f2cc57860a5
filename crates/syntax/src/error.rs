use std::fmt;

use ecow::EcoString;
use serde_json::{Value, json};
use text_size::TextRange;

use crate::grammar::{Cardinality, FirstSet};
use crate::syntax_kind::SyntaxKind;

/// A recoverable problem in the input. Every one has a matching error node in the tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyntaxError {
    pub range: TextRange,
    pub message: EcoString,
    pub expected: FirstSet,
}

impl SyntaxError {
    pub fn new(range: TextRange, message: impl Into<EcoString>, expected: FirstSet) -> Self {
        Self {
            range,
            message: message.into(),
            expected,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "range": self.range,
            "message": self.message.as_str(),
            "expected": self.expected.to_string(),
        })
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.range, self.message)
    }
}

/// Errors in how the library is used, as opposed to errors in the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no grammar rule for {0}")]
    UnknownNonTerminal(SyntaxKind),
    #[error("grammar rule for {0} registered twice")]
    DuplicateRule(SyntaxKind),
    #[error("{kind}@{range:?} must have exactly one {child} child, found {found}")]
    StructuralViolation {
        kind: SyntaxKind,
        child: SyntaxKind,
        range: TextRange,
        found: usize,
    },
    #[error("{kind} has no {requested} accessor for {child}")]
    AccessorMismatch {
        kind: SyntaxKind,
        child: SyntaxKind,
        requested: Cardinality,
        actual: Option<Cardinality>,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(EcoString),
}
