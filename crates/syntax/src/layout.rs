//! Layout resolution: turns indentation into explicit block structure.
//!
//! The grammar only knows about `{`, `;` and `}`. Blocks opened by `where`, `let`, `do` and
//! `of` without an explicit brace get virtual (zero-width) delimiters here, following the
//! Haskell 2010 layout algorithm with the usual simplifications: `in` closes the innermost
//! implicit `let` block and closing brackets close implicit blocks opened inside them.

use serde::{Deserialize, Serialize};
use text_size::TextSize;

use crate::T;
use crate::token_kind::TokenKind;
use crate::token_stream::Token;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    /// A whole module: the top level is a block unless it starts with `module` or `{`.
    #[default]
    Module,
    /// The input is the body of a block.
    Block,
    /// No implicit block at the start of the input.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Implicit { column: usize, is_let: bool },
    Explicit,
}

struct Resolver<'a> {
    source: &'a str,
    output: Vec<Token>,
    stack: Vec<Context>,
    pending: Option<bool>,
    prev_end: Option<TextSize>,
    // Byte offset up to which `column` has been tracked.
    cursor: usize,
    column: usize,
}

/// Inserts virtual layout tokens into `tokens`, which must come from `source`.
pub fn resolve(tokens: Vec<Token>, source: &str, mode: LayoutMode) -> Vec<Token> {
    let mut resolver = Resolver {
        source,
        output: Vec::with_capacity(tokens.len() + tokens.len() / 4),
        stack: Vec::new(),
        pending: (mode == LayoutMode::Block).then_some(false),
        prev_end: None,
        cursor: 0,
        column: 0,
    };
    let mut module_start = mode == LayoutMode::Module;

    for token in tokens {
        if token.kind.is_trivia() {
            resolver.output.push(token);
            continue;
        }
        if token.kind == TokenKind::Eof {
            if module_start {
                resolver.pending = Some(false);
            }
            resolver.finish(token);
            break;
        }
        if module_start && token.kind != TokenKind::Pragma {
            module_start = false;
            if token.kind != T![module] {
                resolver.pending = Some(false);
            }
        }
        resolver.token(token);
    }

    resolver.output
}

impl Resolver<'_> {
    fn token(&mut self, token: Token) {
        let start = token.range.start();
        let column = self.column_at(start.into());
        let mut just_opened = false;

        if let Some(is_let) = self.pending.take() {
            if token.kind != T!['{'] {
                if column as isize > self.enclosing_column() {
                    self.emit(T!['{'], start);
                    self.stack.push(Context::Implicit { column, is_let });
                    just_opened = true;
                } else {
                    self.emit(T!['{'], start);
                    self.emit(T!['}'], start);
                }
            }
        }

        if !just_opened && self.starts_line(start) {
            self.new_line(column, start);
        }
        match token.kind {
            T![in] => self.close_let(start),
            T![')'] | T![']'] | T!['}'] => self.close_bracket(start),
            _ => {}
        }

        let kind = token.kind;
        self.prev_end = Some(token.range.end());
        self.output.push(token);

        if matches!(kind, T!['('] | T!['['] | T!['{']) {
            self.stack.push(Context::Explicit);
        }
        if kind.is_layout_keyword() {
            self.pending = Some(kind == T![let]);
        }
    }

    fn finish(&mut self, eof: Token) {
        let end = eof.range.start();
        if self.pending.take().is_some() {
            self.emit(T!['{'], end);
            self.emit(T!['}'], end);
        }
        while let Some(context) = self.stack.pop() {
            if let Context::Implicit { .. } = context {
                self.emit(T!['}'], end);
            }
        }
        self.output.push(eof);
    }

    fn new_line(&mut self, column: usize, at: TextSize) {
        while let Some(Context::Implicit { column: indent, .. }) = self.stack.last().copied() {
            if column == indent {
                self.emit(T![;], at);
                break;
            } else if column < indent {
                self.emit(T!['}'], at);
                self.stack.pop();
            } else {
                break;
            }
        }
    }

    // Closes through the innermost implicit `let` block. A stray `in` leaves the stack alone.
    fn close_let(&mut self, at: TextSize) {
        let innermost = self.stack.iter().rposition(|context| {
            matches!(context, Context::Explicit | Context::Implicit { is_let: true, .. })
        });
        if let Some(index) = innermost.filter(|&index| self.stack[index] != Context::Explicit) {
            self.close_from(index, at);
        }
    }

    // Closes the implicit blocks opened inside the innermost bracket, and the bracket itself. A
    // stray closing bracket leaves the stack alone.
    fn close_bracket(&mut self, at: TextSize) {
        if let Some(index) = self.stack.iter().rposition(|context| *context == Context::Explicit) {
            self.close_from(index, at);
        }
    }

    fn close_from(&mut self, index: usize, at: TextSize) {
        for context in self.stack.drain(index..).rev() {
            if let Context::Implicit { .. } = context {
                self.output.push(Token::virtual_at(T!['}'], at));
            }
        }
    }

    // Explicit contexts accept any indentation.
    fn enclosing_column(&self) -> isize {
        match self.stack.last() {
            Some(Context::Implicit { column, .. }) => *column as isize,
            Some(Context::Explicit) | None => -1,
        }
    }

    fn starts_line(&self, start: TextSize) -> bool {
        match self.prev_end {
            Some(end) => self.source[usize::from(end)..usize::from(start)].contains('\n'),
            None => true,
        }
    }

    /// 0-indexed column, in characters, of `offset`. Offsets must not decrease between calls.
    fn column_at(&mut self, offset: usize) -> usize {
        let skipped = &self.source[self.cursor..offset];
        match skipped.rfind('\n') {
            Some(newline) => self.column = skipped[newline + 1..].chars().count(),
            None => self.column += skipped.chars().count(),
        }
        self.cursor = offset;
        self.column
    }

    fn emit(&mut self, kind: TokenKind, at: TextSize) {
        self.output.push(Token::virtual_at(kind, at));
    }
}
