//! Lossless Java tokenizer.
//!
//! Tokens carry byte ranges into the original buffer; trivia (whitespace and
//! comments) is kept in the stream so downstream consumers can reconstruct
//! exact source positions. Lexical errors (unterminated literals/comments)
//! are reported out of band and never truncate the token stream.

use quarry_core::TextRange;
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

use crate::SourceLevel;

/// Kinds of lexical tokens.
///
/// Keyword variants use the `*Kw` suffix; separators and operators are named
/// after their glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u16)]
pub enum TokenKind {
    // Trivia
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,

    Identifier,

    // Literals
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,

    // Keywords
    AbstractKw,
    AssertKw,
    BooleanKw,
    BreakKw,
    ByteKw,
    CaseKw,
    CatchKw,
    CharKw,
    ClassKw,
    ConstKw,
    ContinueKw,
    DefaultKw,
    DoKw,
    DoubleKw,
    ElseKw,
    EnumKw,
    ExtendsKw,
    FalseKw,
    FinalKw,
    FinallyKw,
    FloatKw,
    ForKw,
    GotoKw,
    IfKw,
    ImplementsKw,
    ImportKw,
    InstanceofKw,
    IntKw,
    InterfaceKw,
    LongKw,
    NativeKw,
    NewKw,
    NullKw,
    PackageKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReturnKw,
    ShortKw,
    StaticKw,
    StrictfpKw,
    SuperKw,
    SwitchKw,
    SynchronizedKw,
    ThisKw,
    ThrowKw,
    ThrowsKw,
    TransientKw,
    TrueKw,
    TryKw,
    VoidKw,
    VolatileKw,
    WhileKw,

    // Separators
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    At,

    // Operators
    Eq,
    Gt,
    Lt,
    Bang,
    Tilde,
    Question,
    Colon,
    EqEq,
    LtEq,
    GtEq,
    BangEq,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    Pipe,
    Caret,
    Percent,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    AmpEq,
    PipeEq,
    CaretEq,
    PercentEq,
    ShlEq,
    ShrEq,
    UshrEq,

    /// A character the lexer could not form a token from.
    Error,
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }

    pub fn is_keyword(self) -> bool {
        (self as u16) >= (TokenKind::AbstractKw as u16)
            && (self as u16) <= (TokenKind::WhileKw as u16)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::TrueKw
                | TokenKind::FalseKw
                | TokenKind::NullKw
        )
    }

    /// Keywords that may open a modifier list.
    pub fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::PublicKw
                | TokenKind::PrivateKw
                | TokenKind::ProtectedKw
                | TokenKind::StaticKw
                | TokenKind::FinalKw
                | TokenKind::AbstractKw
                | TokenKind::NativeKw
                | TokenKind::SynchronizedKw
                | TokenKind::TransientKw
                | TokenKind::VolatileKw
                | TokenKind::StrictfpKw
        )
    }

    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::BooleanKw
                | TokenKind::ByteKw
                | TokenKind::CharKw
                | TokenKind::DoubleKw
                | TokenKind::FloatKw
                | TokenKind::IntKw
                | TokenKind::LongKw
                | TokenKind::ShortKw
        )
    }

    /// Keywords that introduce a type declaration.
    pub fn is_type_decl_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw
        )
    }
}

/// A lexical token: a kind plus the byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.range.text(source)
    }
}

/// A non-fatal lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub range: TextRange,
}

/// Tokenize `source` at the default source level.
pub fn lex(source: &str) -> Vec<Token> {
    lex_with_errors(source, SourceLevel::default()).0
}

/// Tokenize `source`, reporting lexical errors alongside the tokens.
pub fn lex_with_errors(source: &str, level: SourceLevel) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source, level);
    let mut tokens = Vec::with_capacity(source.len() / 4 + 8);
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, lexer.errors)
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    level: SourceLevel,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, level: SourceLevel) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            level,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, n: usize) -> u8 {
        self.bytes.get(self.pos + n).copied().unwrap_or(0)
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors.push(LexError {
            message: message.into(),
            range: TextRange::new(start as u32, self.pos as u32),
        });
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            range: TextRange::new(start as u32, self.pos as u32),
        }
    }

    pub fn next_token(&mut self) -> Token {
        let start = self.pos;
        if self.pos >= self.bytes.len() {
            return self.token(TokenKind::Eof, start);
        }
        let c = self.peek();
        match c {
            b' ' | b'\t' | b'\r' | b'\n' | 0x0c => {
                while matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\n' | 0x0c)
                    && self.pos < self.bytes.len()
                {
                    self.pos += 1;
                }
                self.token(TokenKind::Whitespace, start)
            }
            b'/' => match self.peek_at(1) {
                b'/' => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() && !matches!(self.peek(), b'\n' | b'\r') {
                        self.pos += 1;
                    }
                    self.token(TokenKind::LineComment, start)
                }
                b'*' => self.block_comment(start),
                b'=' => {
                    self.pos += 2;
                    self.token(TokenKind::SlashEq, start)
                }
                _ => {
                    self.pos += 1;
                    self.token(TokenKind::Slash, start)
                }
            },
            b'"' => self.string_literal(start),
            b'\'' => self.char_literal(start),
            b'0'..=b'9' => self.number(start),
            b'.' => {
                if self.peek_at(1).is_ascii_digit() {
                    self.number(start)
                } else if self.peek_at(1) == b'.' && self.peek_at(2) == b'.' {
                    self.pos += 3;
                    self.token(TokenKind::Ellipsis, start)
                } else {
                    self.pos += 1;
                    self.token(TokenKind::Dot, start)
                }
            }
            _ if is_ident_start(self.char_at(self.pos)) => self.identifier_or_keyword(start),
            _ => self.operator_or_separator(start),
        }
    }

    fn char_at(&self, pos: usize) -> char {
        self.source[pos..].chars().next().unwrap_or('\0')
    }

    fn block_comment(&mut self, start: usize) -> Token {
        // `/** ... */` is a doc comment; `/**/` is not.
        let doc = self.peek_at(2) == b'*' && self.peek_at(3) != b'/';
        self.pos += 2;
        let mut terminated = false;
        while self.pos < self.bytes.len() {
            if self.peek() == b'*' && self.peek_at(1) == b'/' {
                self.pos += 2;
                terminated = true;
                break;
            }
            self.pos += 1;
        }
        if !terminated {
            self.error("unterminated block comment", start);
        }
        self.token(
            if doc {
                TokenKind::DocComment
            } else {
                TokenKind::BlockComment
            },
            start,
        )
    }

    fn string_literal(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            match self.peek() {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' if self.pos + 1 < self.bytes.len() => self.pos += 2,
                b'\n' | b'\r' | 0 => {
                    self.error("unterminated string literal", start);
                    break;
                }
                _ => self.pos += 1,
            }
            if self.pos >= self.bytes.len() {
                self.error("unterminated string literal", start);
                break;
            }
        }
        self.token(TokenKind::StringLiteral, start)
    }

    fn char_literal(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            match self.peek() {
                b'\'' => {
                    self.pos += 1;
                    break;
                }
                b'\\' if self.pos + 1 < self.bytes.len() => self.pos += 2,
                b'\n' | b'\r' | 0 => {
                    self.error("unterminated character literal", start);
                    break;
                }
                _ => self.pos += 1,
            }
            if self.pos >= self.bytes.len() {
                self.error("unterminated character literal", start);
                break;
            }
        }
        self.token(TokenKind::CharLiteral, start)
    }

    fn number(&mut self, start: usize) -> Token {
        let mut kind = TokenKind::IntLiteral;
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.pos += 2;
            while self.peek().is_ascii_hexdigit() || self.peek() == b'_' {
                self.pos += 1;
            }
        } else if self.peek() == b'0' && matches!(self.peek_at(1), b'b' | b'B') {
            self.pos += 2;
            while matches!(self.peek(), b'0' | b'1' | b'_') {
                self.pos += 1;
            }
        } else {
            while self.peek().is_ascii_digit() || self.peek() == b'_' {
                self.pos += 1;
            }
            if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
                kind = TokenKind::DoubleLiteral;
                self.pos += 1;
                while self.peek().is_ascii_digit() || self.peek() == b'_' {
                    self.pos += 1;
                }
            } else if self.peek() == b'.'
                && !matches!(self.peek_at(1), b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | b'.')
            {
                // Trailing-dot double such as `1.`; `1.foo()` keeps its dot.
                kind = TokenKind::DoubleLiteral;
                self.pos += 1;
            }
            if matches!(self.peek(), b'e' | b'E')
                && (self.peek_at(1).is_ascii_digit()
                    || (matches!(self.peek_at(1), b'+' | b'-') && self.peek_at(2).is_ascii_digit()))
            {
                kind = TokenKind::DoubleLiteral;
                self.pos += 1;
                if matches!(self.peek(), b'+' | b'-') {
                    self.pos += 1;
                }
                while self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }
        match self.peek() {
            b'l' | b'L' => {
                self.pos += 1;
                kind = TokenKind::LongLiteral;
            }
            b'f' | b'F' => {
                self.pos += 1;
                kind = TokenKind::FloatLiteral;
            }
            b'd' | b'D' => {
                self.pos += 1;
                kind = TokenKind::DoubleLiteral;
            }
            _ => {}
        }
        self.token(kind, start)
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Token {
        let mut iter = self.source[start..].char_indices();
        iter.next();
        let mut end = self.source.len();
        for (i, ch) in iter {
            if !is_ident_continue(ch) {
                end = start + i;
                break;
            }
        }
        self.pos = end;
        let text = &self.source[start..end];
        self.token(keyword_kind(text, self.level).unwrap_or(TokenKind::Identifier), start)
    }

    fn operator_or_separator(&mut self, start: usize) -> Token {
        macro_rules! op {
            ($len:expr, $kind:ident) => {{
                self.pos += $len;
                return self.token(TokenKind::$kind, start);
            }};
        }
        let (a, b, c, d) = (
            self.peek(),
            self.peek_at(1),
            self.peek_at(2),
            self.peek_at(3),
        );
        match a {
            b'(' => op!(1, LParen),
            b')' => op!(1, RParen),
            b'{' => op!(1, LBrace),
            b'}' => op!(1, RBrace),
            b'[' => op!(1, LBracket),
            b']' => op!(1, RBracket),
            b';' => op!(1, Semicolon),
            b',' => op!(1, Comma),
            b'@' => op!(1, At),
            b'=' if b == b'=' => op!(2, EqEq),
            b'=' => op!(1, Eq),
            b'<' if b == b'=' => op!(2, LtEq),
            b'<' if b == b'<' && c == b'=' => op!(3, ShlEq),
            b'<' => op!(1, Lt),
            b'>' if b == b'=' => op!(2, GtEq),
            // Plain shifts are lexed as adjacent angle tokens so generic
            // argument lists close one level at a time; the expression parser
            // folds adjacent angles back into shift operators.
            b'>' if b == b'>' && c == b'>' && d == b'=' => op!(4, UshrEq),
            b'>' if b == b'>' && c == b'=' => op!(3, ShrEq),
            b'>' => op!(1, Gt),
            b'!' if b == b'=' => op!(2, BangEq),
            b'!' => op!(1, Bang),
            b'~' => op!(1, Tilde),
            b'?' => op!(1, Question),
            b':' => op!(1, Colon),
            b'&' if b == b'&' => op!(2, AmpAmp),
            b'&' if b == b'=' => op!(2, AmpEq),
            b'&' => op!(1, Amp),
            b'|' if b == b'|' => op!(2, PipePipe),
            b'|' if b == b'=' => op!(2, PipeEq),
            b'|' => op!(1, Pipe),
            b'+' if b == b'+' => op!(2, PlusPlus),
            b'+' if b == b'=' => op!(2, PlusEq),
            b'+' => op!(1, Plus),
            b'-' if b == b'-' => op!(2, MinusMinus),
            b'-' if b == b'=' => op!(2, MinusEq),
            b'-' => op!(1, Minus),
            b'*' if b == b'=' => op!(2, StarEq),
            b'*' => op!(1, Star),
            b'^' if b == b'=' => op!(2, CaretEq),
            b'^' => op!(1, Caret),
            b'%' if b == b'=' => op!(2, PercentEq),
            b'%' => op!(1, Percent),
            _ => {
                let ch = self.char_at(self.pos);
                self.pos += ch.len_utf8().max(1);
                self.token(TokenKind::Error, start)
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

fn keyword_kind(text: &str, level: SourceLevel) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match text {
        "abstract" => AbstractKw,
        "assert" if level >= SourceLevel::Jdk1_4 => AssertKw,
        "boolean" => BooleanKw,
        "break" => BreakKw,
        "byte" => ByteKw,
        "case" => CaseKw,
        "catch" => CatchKw,
        "char" => CharKw,
        "class" => ClassKw,
        "const" => ConstKw,
        "continue" => ContinueKw,
        "default" => DefaultKw,
        "do" => DoKw,
        "double" => DoubleKw,
        "else" => ElseKw,
        "enum" if level >= SourceLevel::Jdk5 => EnumKw,
        "extends" => ExtendsKw,
        "false" => FalseKw,
        "final" => FinalKw,
        "finally" => FinallyKw,
        "float" => FloatKw,
        "for" => ForKw,
        "goto" => GotoKw,
        "if" => IfKw,
        "implements" => ImplementsKw,
        "import" => ImportKw,
        "instanceof" => InstanceofKw,
        "int" => IntKw,
        "interface" => InterfaceKw,
        "long" => LongKw,
        "native" => NativeKw,
        "new" => NewKw,
        "null" => NullKw,
        "package" => PackageKw,
        "private" => PrivateKw,
        "protected" => ProtectedKw,
        "public" => PublicKw,
        "return" => ReturnKw,
        "short" => ShortKw,
        "static" => StaticKw,
        "strictfp" => StrictfpKw,
        "super" => SuperKw,
        "switch" => SwitchKw,
        "synchronized" => SynchronizedKw,
        "this" => ThisKw,
        "throw" => ThrowKw,
        "throws" => ThrowsKw,
        "transient" => TransientKw,
        "true" => TrueKw,
        "try" => TryKw,
        "void" => VoidKw,
        "volatile" => VolatileKw,
        "while" => WhileKw,
        _ => return None,
    };
    Some(kind)
}
