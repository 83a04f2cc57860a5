use std::ops::Range;

use ecow::EcoString;
use unscanny::Scanner;

use crate::token_stream::{self, Token, TokenStream};
use crate::{T, token_kind::TokenKind};

#[derive(Debug)]
pub struct Lexer<'a> {
    s: Scanner<'a>,
    error: Option<EcoString>,
}

impl TokenStream for Lexer<'_> {
    fn eat(&mut self) -> TokenKind {
        self.next_token()
    }

    fn cursor(&self) -> usize {
        self.s.cursor()
    }

    fn text(&self, range: Range<usize>) -> &str {
        self.s.get(range)
    }

    fn take_error(&mut self) -> Option<EcoString> {
        self.error.take()
    }
}

/// Lexes `text` into a token vector terminated by `Eof`.
pub fn tokenize(text: &str) -> Vec<Token> {
    token_stream::collect(Lexer::new(text))
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            s: Scanner::new(text),
            error: None,
        }
    }

    fn error(&mut self, msg: impl Into<EcoString>) -> TokenKind {
        self.error = Some(msg.into());
        TokenKind::Error
    }

    fn next_token(&mut self) -> TokenKind {
        let start = self.s.cursor();
        match self.s.eat() {
            Some(c) if c.is_whitespace() => self.whitespace(),
            Some('-') if self.at_line_comment() => self.line_comment(),
            Some('{') if self.s.eat_if("-#") => self.pragma(),
            Some('{') if self.s.eat_if('-') => self.block_comment(),

            Some(c) if c.is_ascii_digit() => self.number(c),
            Some(c) if c.is_uppercase() => self.qualified_name(start),
            Some(c) if c.is_lowercase() || c == '_' => self.identifier(start),
            Some('"') => self.string(),
            Some('\'') => self.char(),

            Some('(') => T!['('],
            Some(')') => T![')'],
            Some('[') => T!['['],
            Some(']') => T![']'],
            Some('{') => T!['{'],
            Some('}') => T!['}'],
            Some(',') => T![,],
            Some(';') => T![;],
            Some('`') => T!['`'],

            Some(c) if is_symbol(c) => self.symbol(start),
            None => TokenKind::Eof,
            _ => self.error("Unexpected character"),
        }
    }

    fn whitespace(&mut self) -> TokenKind {
        self.s.eat_while(char::is_whitespace);
        TokenKind::Whitespace
    }

    // `--` followed by more dashes starts a comment unless the run continues as an operator.
    fn at_line_comment(&self) -> bool {
        let rest = self.s.after();
        let dashes = rest.chars().take_while(|&c| c == '-').count();
        dashes >= 1 && !rest[dashes..].chars().next().is_some_and(is_symbol)
    }

    fn line_comment(&mut self) -> TokenKind {
        self.s.eat_until(is_newline);
        TokenKind::LineComment
    }

    fn block_comment(&mut self) -> TokenKind {
        let mut depth = 1;
        while depth > 0 {
            if self.s.eat_if("{-") {
                depth += 1;
            } else if self.s.eat_if("-}") {
                depth -= 1;
            } else if self.s.eat().is_none() {
                return self.error("Unterminated block comment");
            }
        }
        TokenKind::BlockComment
    }

    fn pragma(&mut self) -> TokenKind {
        self.s.eat_until("#-}");
        if self.s.eat_if("#-}") {
            TokenKind::Pragma
        } else {
            self.error("Unterminated pragma")
        }
    }

    fn number(&mut self, c: char) -> TokenKind {
        if c == '0' {
            let radix = match self.s.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.s.eat();
                if self.s.eat_while(|c: char| c.is_digit(radix) || c == '_').is_empty() {
                    return self.error("Missing digits after radix prefix");
                }
                return TokenKind::Integer;
            }
        }

        self.s.eat_while(|c: char| c.is_ascii_digit() || c == '_');
        let mut kind = TokenKind::Integer;

        // `1..10` is a range, not a float
        if self.s.at('.') && !self.s.after().starts_with("..") {
            let fraction = self.s.cursor();
            self.s.eat();
            if self.s.eat_while(|c: char| c.is_ascii_digit()).is_empty() {
                self.s.jump(fraction);
            } else {
                kind = TokenKind::Float;
            }
        }

        if self.s.at(['e', 'E']) {
            let exponent = self.s.cursor();
            self.s.eat();
            self.s.eat_if(['+', '-']);
            if self.s.eat_while(|c: char| c.is_ascii_digit()).is_empty() {
                self.s.jump(exponent);
            } else {
                kind = TokenKind::Float;
            }
        }

        kind
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        self.s.eat_while(is_identifier_continue);
        let ident = self.s.from(start);

        match ident {
            "case" => T![case],
            "class" => T![class],
            "data" => T![data],
            "default" => T![default],
            "deriving" => T![deriving],
            "do" => T![do],
            "else" => T![else],
            "foreign" => T![foreign],
            "if" => T![if],
            "import" => T![import],
            "in" => T![in],
            "infix" => T![infix],
            "infixl" => T![infixl],
            "infixr" => T![infixr],
            "instance" => T![instance],
            "let" => T![let],
            "module" => T![module],
            "newtype" => T![newtype],
            "of" => T![of],
            "then" => T![then],
            "type" => T![type],
            "where" => T![where],
            "_" => T![_],
            _ => TokenKind::VarId,
        }
    }

    // ConId ( "." ConId )* ( "." ( VarId | Symbol ) )?
    fn qualified_name(&mut self, start: usize) -> TokenKind {
        self.s.eat_while(is_identifier_continue);
        let mut kind = TokenKind::ConId;

        loop {
            let dot = self.s.cursor();
            if !self.s.eat_if('.') {
                break;
            }
            match self.s.peek() {
                Some(c) if c.is_uppercase() => {
                    self.s.eat_while(is_identifier_continue);
                    kind = TokenKind::QConId;
                }
                Some(c) if c.is_lowercase() || c == '_' => {
                    let name = self.s.cursor();
                    self.s.eat_while(is_identifier_continue);
                    if self.s.from(name) == "_" || is_reserved_word(self.s.from(name)) {
                        self.s.jump(dot);
                        break;
                    }
                    return TokenKind::QVarId;
                }
                Some(c) if is_symbol(c) => {
                    self.s.eat_while(is_symbol);
                    return if self.s.from(dot + 1).starts_with(':') {
                        TokenKind::ConSym
                    } else {
                        TokenKind::VarSym
                    };
                }
                _ => {
                    self.s.jump(dot);
                    break;
                }
            }
        }

        debug_assert!(self.s.cursor() > start);
        kind
    }

    fn string(&mut self) -> TokenKind {
        let mut escaped = false;
        loop {
            match self.s.eat() {
                Some('\\') if !escaped => {
                    if self.s.peek().is_some_and(char::is_whitespace) {
                        // string gap
                        self.s.eat_while(char::is_whitespace);
                        if !self.s.eat_if('\\') {
                            return self.error("Unterminated string gap");
                        }
                    } else {
                        escaped = true;
                    }
                }
                Some('"') if !escaped => break,
                Some('\r') | Some('\n') => return self.error("End of line in string literal"),
                None => return self.error("End of file in string literal"),
                _ => escaped = false,
            }
        }

        TokenKind::String
    }

    fn char(&mut self) -> TokenKind {
        match self.s.eat() {
            Some('\\') => {
                self.s.eat();
                self.s.eat_while(|c: char| c != '\'' && !is_newline(c));
            }
            Some('\'') | Some('\r') | Some('\n') | None => {
                return self.error("Empty character literal");
            }
            Some(_) => {}
        }

        if self.s.eat_if('\'') {
            TokenKind::Char
        } else {
            self.error("Unterminated character literal")
        }
    }

    fn symbol(&mut self, start: usize) -> TokenKind {
        self.s.eat_while(is_symbol);

        match self.s.from(start) {
            ".." => T![..],
            "::" => T![::],
            "=" => T![=],
            "\\" => T!['\\'],
            "|" => T![|],
            "<-" => T![<-],
            "->" => T![->],
            "@" => T![@],
            "~" => T![~],
            "=>" => T![=>],
            sym if sym.starts_with(':') => TokenKind::ConSym,
            _ => TokenKind::VarSym,
        }
    }
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn is_symbol(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '$' | '%' | '&' | '*' | '+' | '.' | '/' | '<' | '=' | '>' | '?' | '@' | '\\'
            | '^' | '|' | '-' | '~' | ':'
    )
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

fn is_reserved_word(text: &str) -> bool {
    let mut lexer = Lexer::new(text);
    lexer.eat().is_reserved_id() && lexer.cursor() == text.len()
}
