use std::ops::Range;

use ecow::EcoString;
use text_size::{TextRange, TextSize};

use crate::token_kind::TokenKind;

/// A source of tokens, such as [`crate::lexer::Lexer`].
pub trait TokenStream {
    fn eat(&mut self) -> TokenKind;

    fn cursor(&self) -> usize;

    fn text(&self, range: Range<usize>) -> &str;

    fn take_error(&mut self) -> Option<EcoString>;
}

/// One token of the parser's input.
///
/// Virtual tokens inserted by the layout resolver are zero-width and carry no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
    pub text: EcoString,
    pub error: Option<EcoString>,
}

impl Token {
    pub fn new(kind: TokenKind, range: TextRange, text: impl Into<EcoString>) -> Self {
        Self {
            kind,
            range,
            text: text.into(),
            error: None,
        }
    }

    pub fn virtual_at(kind: TokenKind, offset: TextSize) -> Self {
        Self::new(kind, TextRange::empty(offset), "")
    }

    pub fn eof(offset: TextSize) -> Self {
        Self::virtual_at(TokenKind::Eof, offset)
    }

    pub fn is_virtual(&self) -> bool {
        self.range.is_empty() && self.kind != TokenKind::Eof
    }
}

/// Drains a token stream into a vector terminated by an `Eof` token.
pub fn collect<T: TokenStream>(mut stream: T) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
        let start = stream.cursor();
        let kind = stream.eat();
        let end = stream.cursor();
        let range = TextRange::new(offset(start), offset(end));
        let mut token = Token::new(kind, range, stream.text(start..end));
        token.error = stream.take_error();
        tokens.push(token);
        if kind == TokenKind::Eof {
            return tokens;
        }
    }
}

pub(crate) fn offset(value: usize) -> TextSize {
    TextSize::try_from(value).expect("source text larger than 4GiB")
}
