use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TokenKind {
    // Markers
    Eof,
    Whitespace,
    LineComment,
    BlockComment,
    Error,

    // Names and literals
    VarId,
    ConId,
    QVarId,
    QConId,
    VarSym,
    ConSym,
    Integer,
    Float,
    Char,
    String,
    Pragma,

    // Special
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Backquote,

    // Reserved operators
    DotDot,
    DoubleColon,
    Equals,
    Backslash,
    Pipe,
    LeftArrow,
    Arrow,
    At,
    Tilde,
    DoubleArrow,

    // Reserved identifiers
    Case,
    Class,
    Data,
    Default,
    Deriving,
    Do,
    Else,
    Foreign,
    If,
    Import,
    In,
    Infix,
    Infixl,
    Infixr,
    Instance,
    Let,
    Module,
    Newtype,
    Of,
    Then,
    Type,
    Where,
    Underscore,
}

impl TokenKind {
    pub const ALL: [TokenKind; 58] = {
        let mut all = [TokenKind::Eof; 58];
        let mut i = 0;
        while i < 58 {
            all[i] = TokenKind::from_u8(i as u8);
            i += 1;
        }
        all
    };

    const fn from_u8(raw: u8) -> TokenKind {
        assert!(raw <= TokenKind::Underscore as u8);
        // SAFETY: `TokenKind` is `repr(u8)` with contiguous discriminants and `raw`
        // is bounded by the last variant.
        unsafe { std::mem::transmute::<u8, TokenKind>(raw) }
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    pub fn is_reserved_id(self) -> bool {
        (Self::Case as u8..=Self::Underscore as u8).contains(&(self as u8))
    }

    /// Keywords after which the layout algorithm opens an implicit block.
    pub fn is_layout_keyword(self) -> bool {
        matches!(self, Self::Where | Self::Let | Self::Do | Self::Of)
    }

    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of input",
            Self::Whitespace => "whitespace",
            Self::LineComment | Self::BlockComment => "comment",
            Self::Error => "invalid token",
            Self::VarId => "identifier",
            Self::ConId => "constructor",
            Self::QVarId => "qualified identifier",
            Self::QConId => "qualified constructor",
            Self::VarSym => "operator",
            Self::ConSym => "constructor operator",
            Self::Integer => "integer literal",
            Self::Float => "float literal",
            Self::Char => "character literal",
            Self::String => "string literal",
            Self::Pragma => "pragma",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Semi => "';'",
            Self::Backquote => "'`'",
            Self::DotDot => "'..'",
            Self::DoubleColon => "'::'",
            Self::Equals => "'='",
            Self::Backslash => "'\\'",
            Self::Pipe => "'|'",
            Self::LeftArrow => "'<-'",
            Self::Arrow => "'->'",
            Self::At => "'@'",
            Self::Tilde => "'~'",
            Self::DoubleArrow => "'=>'",
            Self::Case => "'case'",
            Self::Class => "'class'",
            Self::Data => "'data'",
            Self::Default => "'default'",
            Self::Deriving => "'deriving'",
            Self::Do => "'do'",
            Self::Else => "'else'",
            Self::Foreign => "'foreign'",
            Self::If => "'if'",
            Self::Import => "'import'",
            Self::In => "'in'",
            Self::Infix => "'infix'",
            Self::Infixl => "'infixl'",
            Self::Infixr => "'infixr'",
            Self::Instance => "'instance'",
            Self::Let => "'let'",
            Self::Module => "'module'",
            Self::Newtype => "'newtype'",
            Self::Of => "'of'",
            Self::Then => "'then'",
            Self::Type => "'type'",
            Self::Where => "'where'",
            Self::Underscore => "'_'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A set of token kinds, used for first sets and recovery sets.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TokenSet(u128);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    pub const fn new(kinds: &[TokenKind]) -> TokenSet {
        let mut bits = 0u128;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1 << kinds[i] as u8;
            i += 1;
        }
        TokenSet(bits)
    }

    pub const fn single(kind: TokenKind) -> TokenSet {
        TokenSet(1 << kind as u8)
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub const fn with(self, kind: TokenKind) -> TokenSet {
        TokenSet(self.0 | 1 << kind as u8)
    }

    pub const fn contains(self, kind: TokenKind) -> bool {
        self.0 & (1 << kind as u8) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TokenKind> {
        TokenKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<TokenKind> for TokenSet {
    fn from_iter<I: IntoIterator<Item = TokenKind>>(iter: I) -> Self {
        iter.into_iter().fold(TokenSet::EMPTY, TokenSet::with)
    }
}

#[macro_export]
#[allow(non_snake_case)]
macro_rules! T {
    ['('] => {$crate::token_kind::TokenKind::LParen};
    [')'] => {$crate::token_kind::TokenKind::RParen};
    ['['] => {$crate::token_kind::TokenKind::LBracket};
    [']'] => {$crate::token_kind::TokenKind::RBracket};
    ['{'] => {$crate::token_kind::TokenKind::LBrace};
    ['}'] => {$crate::token_kind::TokenKind::RBrace};
    [,] => {$crate::token_kind::TokenKind::Comma};
    [;] => {$crate::token_kind::TokenKind::Semi};
    ['`'] => {$crate::token_kind::TokenKind::Backquote};

    [..] => {$crate::token_kind::TokenKind::DotDot};
    [::] => {$crate::token_kind::TokenKind::DoubleColon};
    [=] => {$crate::token_kind::TokenKind::Equals};
    ['\\'] => {$crate::token_kind::TokenKind::Backslash};
    [|] => {$crate::token_kind::TokenKind::Pipe};
    [<-] => {$crate::token_kind::TokenKind::LeftArrow};
    [->] => {$crate::token_kind::TokenKind::Arrow};
    [@] => {$crate::token_kind::TokenKind::At};
    [~] => {$crate::token_kind::TokenKind::Tilde};
    [=>] => {$crate::token_kind::TokenKind::DoubleArrow};

    [case] => {$crate::token_kind::TokenKind::Case};
    [class] => {$crate::token_kind::TokenKind::Class};
    [data] => {$crate::token_kind::TokenKind::Data};
    [default] => {$crate::token_kind::TokenKind::Default};
    [deriving] => {$crate::token_kind::TokenKind::Deriving};
    [do] => {$crate::token_kind::TokenKind::Do};
    [else] => {$crate::token_kind::TokenKind::Else};
    [foreign] => {$crate::token_kind::TokenKind::Foreign};
    [if] => {$crate::token_kind::TokenKind::If};
    [import] => {$crate::token_kind::TokenKind::Import};
    [in] => {$crate::token_kind::TokenKind::In};
    [infix] => {$crate::token_kind::TokenKind::Infix};
    [infixl] => {$crate::token_kind::TokenKind::Infixl};
    [infixr] => {$crate::token_kind::TokenKind::Infixr};
    [instance] => {$crate::token_kind::TokenKind::Instance};
    [let] => {$crate::token_kind::TokenKind::Let};
    [module] => {$crate::token_kind::TokenKind::Module};
    [newtype] => {$crate::token_kind::TokenKind::Newtype};
    [of] => {$crate::token_kind::TokenKind::Of};
    [then] => {$crate::token_kind::TokenKind::Then};
    [type] => {$crate::token_kind::TokenKind::Type};
    [where] => {$crate::token_kind::TokenKind::Where};
    [_] => {$crate::token_kind::TokenKind::Underscore};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_in_declaration_order() {
        assert_eq!(TokenKind::ALL[0], TokenKind::Eof);
        assert_eq!(TokenKind::ALL[57], TokenKind::Underscore);
        for (i, kind) in TokenKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn token_set() {
        let set = TokenSet::new(&[T![data], T![type]]).with(T![newtype]);
        assert!(set.contains(T![data]));
        assert!(set.contains(T![newtype]));
        assert!(!set.contains(T![class]));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![T![data], T![newtype], T![type]]
        );
        assert!(TokenSet::EMPTY.is_empty());
    }

    #[test]
    fn reserved_ids() {
        assert!(T![where].is_reserved_id());
        assert!(T![_].is_reserved_id());
        assert!(!TokenKind::VarId.is_reserved_id());
        assert!(T![of].is_layout_keyword());
        assert!(!T![case].is_layout_keyword());
    }
}
