//! The structural (diet) parser, the lazy body/statement parser, and the
//! recovery frame machinery they share.

pub(crate) mod body;
pub(crate) mod recovery;
pub(crate) mod structure;

use quarry_core::TextRange;

use crate::lexer::{Token, TokenKind};

/// A cursor over the significant (trivia-stripped) token buffer.
///
/// Supports mark/reset so header classification can be speculative: the
/// recovery engine's checkpoint granularity is exactly one candidate header,
/// re-read from the mark once its shape is known.
pub(crate) struct Cursor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    limit: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        let limit = tokens.len();
        Self {
            source,
            tokens,
            pos: 0,
            limit,
        }
    }

    /// A cursor restricted to `tokens[start..end)`, used for body ranges.
    pub(crate) fn slice(source: &'a str, tokens: &'a [Token], start: usize, end: usize) -> Self {
        Self {
            source,
            tokens,
            pos: start.min(tokens.len()),
            limit: end.min(tokens.len()),
        }
    }

    pub(crate) fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    fn eof_token(&self) -> Token {
        let offset = self
            .tokens
            .get(self.limit)
            .map(|t| t.range.start)
            .unwrap_or(self.source.len() as u32);
        Token {
            kind: TokenKind::Eof,
            range: TextRange::empty(offset),
        }
    }

    pub(crate) fn current(&self) -> Token {
        if self.pos < self.limit {
            self.tokens[self.pos]
        } else {
            self.eof_token()
        }
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.nth_token(n).kind
    }

    pub(crate) fn nth_token(&self, n: usize) -> Token {
        let idx = self.pos + n;
        if idx < self.limit {
            self.tokens[idx]
        } else {
            self.eof_token()
        }
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.limit {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        debug_assert!(mark <= self.limit);
        self.pos = mark;
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.limit
    }

    /// End offset of the last consumed token; start of the buffer if none.
    pub(crate) fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].range.end
        }
    }

    pub(crate) fn text(&self, token: Token) -> &'a str {
        token.range.text(self.source)
    }

    /// Whether two neighbouring tokens are textually adjacent, used to fold
    /// `>` `>` pairs back into shift operators.
    pub(crate) fn adjacent(&self, a: Token, b: Token) -> bool {
        a.range.end == b.range.start
    }
}
