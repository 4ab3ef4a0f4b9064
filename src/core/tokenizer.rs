// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line tokenizer with source spans.
//!
//! The tokenizer knows no CPU. Each family passes a [`RegisterChecker`] so
//! `D0`, `X` or `V5` become register tokens only for the family that owns
//! them. `.` is always its own token, so `MOVE.L` and `D1.W` split into
//! name, dot and suffix.

use std::fmt;
use std::sync::Arc;

use crate::core::text_utils::{is_ident_char, is_ident_start, is_space};

/// Decides whether an (uppercased) identifier names a register.
pub type RegisterChecker = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub fn register_checker_none() -> RegisterChecker {
    Arc::new(|_: &str| false)
}

pub fn register_checker_from_fn(func: fn(&str) -> bool) -> RegisterChecker {
    Arc::new(func)
}

/// Line and 1-based column range of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    /// Span from 0-based byte offsets.
    pub(crate) fn new(line: u32, start: usize, end: usize) -> Self {
        Self {
            line,
            col_start: start + 1,
            col_end: end + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    Register(String),
    Number(NumberLiteral),
    String(StringLiteral),
    Comma,
    Colon,
    Dollar,
    Dot,
    Hash,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Operator(OperatorKind),
    End,
}

impl TokenKind {
    /// Single-character punctuation.
    fn punctuation(c: u8) -> Option<Self> {
        let kind = match c {
            b',' => Self::Comma,
            b':' => Self::Colon,
            b'.' => Self::Dot,
            b'#' => Self::Hash,
            b'[' => Self::OpenBracket,
            b']' => Self::CloseBracket,
            b'{' => Self::OpenBrace,
            b'}' => Self::CloseBrace,
            b'(' => Self::OpenParen,
            b')' => Self::CloseParen,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a token of this kind can end an operand, which makes a
    /// following `%` the modulo operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_)
                | Self::Register(_)
                | Self::Number(_)
                | Self::String(_)
                | Self::CloseParen
                | Self::CloseBracket
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    /// Source text, prefix and suffix included.
    pub text: String,
    pub base: u32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    /// Source text with quotes and escapes.
    pub raw: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    Shl,
    Shr,
    BitNot,
    LogicNot,
    BitAnd,
    BitOr,
    BitXor,
    LogicAnd,
    LogicOr,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl OperatorKind {
    /// Operator starting with `c` and its length, given the byte after it.
    fn scan(c: u8, next: u8) -> Option<(Self, usize)> {
        use OperatorKind::*;
        let op = match (c, next) {
            (b'<', b'<') => (Shl, 2),
            (b'>', b'>') => (Shr, 2),
            (b'<', b'=') => (Le, 2),
            (b'>', b'=') => (Ge, 2),
            (b'<', b'>') | (b'!', b'=') => (Ne, 2),
            (b'=', b'=') => (Eq, 2),
            (b'&', b'&') => (LogicAnd, 2),
            (b'|', b'|') => (LogicOr, 2),
            (b'+', _) => (Plus, 1),
            (b'-', _) => (Minus, 1),
            (b'*', _) => (Multiply, 1),
            (b'/', _) => (Divide, 1),
            (b'%', _) => (Mod, 1),
            (b'~', _) => (BitNot, 1),
            (b'!', _) => (LogicNot, 1),
            (b'&', _) => (BitAnd, 1),
            (b'|', _) => (BitOr, 1),
            (b'^', _) => (BitXor, 1),
            (b'=', _) => (Eq, 1),
            (b'<', _) => (Lt, 1),
            (b'>', _) => (Gt, 1),
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Mod => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitNot => "~",
            Self::LogicNot => "!",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LogicAnd => "&&",
            Self::LogicOr => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Source form of the token, for diagnostics.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match &self.kind {
            TokenKind::Identifier(name) | TokenKind::Register(name) => name.as_str(),
            TokenKind::Number(num) => num.text.as_str(),
            TokenKind::String(lit) => lit.raw.as_str(),
            TokenKind::Operator(op) => op.symbol(),
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dollar => "$",
            TokenKind::Dot => ".",
            TokenKind::Hash => "#",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::End => "",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct TokenizeError {
    pub message: String,
    pub span: Span,
}

pub struct Tokenizer<'a> {
    line_num: u32,
    input: &'a [u8],
    pos: usize,
    is_register: RegisterChecker,
    after_operand: bool,
}

impl<'a> Tokenizer<'a> {
    /// Tokenizer that reports no registers.
    #[must_use]
    pub fn new(line: &'a str, line_num: u32) -> Self {
        Self::with_register_checker(line, line_num, register_checker_none())
    }

    #[must_use]
    pub fn with_register_checker(
        line: &'a str,
        line_num: u32,
        is_register: RegisterChecker,
    ) -> Self {
        Self {
            line_num,
            input: line.as_bytes(),
            pos: 0,
            is_register,
            after_operand: false,
        }
    }

    /// Next token; a `;` comment or the end of the line yields
    /// [`TokenKind::End`].
    pub fn next_token(&mut self) -> Result<Token, TokenizeError> {
        while is_space(self.peek(0)) {
            self.pos += 1;
        }
        let start = self.pos;
        let c = self.peek(0);
        let kind = match c {
            0 | b';' => {
                self.pos = self.input.len();
                return Ok(self.token(TokenKind::End, start, start));
            }
            _ if is_ident_start(c) => self.identifier(start),
            _ if c.is_ascii_digit() => self.number(start)?,
            b'"' | b'\'' => self.string(start, c)?,
            b'$' if self.peek(1).is_ascii_hexdigit() || self.peek(1) == b'_' => {
                self.prefixed(start, 16)?
            }
            b'$' => {
                self.pos += 1;
                TokenKind::Dollar
            }
            b'%' if is_bin_digit(self.peek(1)) && self.binary_allowed(start) => {
                self.prefixed(start, 2)?
            }
            _ => {
                if let Some(kind) = TokenKind::punctuation(c) {
                    self.pos += 1;
                    kind
                } else if let Some((op, len)) = OperatorKind::scan(c, self.peek(1)) {
                    self.pos += len;
                    TokenKind::Operator(op)
                } else {
                    self.pos += 1;
                    return Err(self.error("Illegal character".to_string(), start));
                }
            }
        };
        self.after_operand = kind.ends_operand();
        Ok(self.token(kind, start, self.pos))
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            span: Span::new(self.line_num, start, end),
        }
    }

    fn error(&self, message: String, start: usize) -> TokenizeError {
        TokenizeError {
            message,
            span: Span::new(self.line_num, start, self.pos),
        }
    }

    fn peek(&self, offset: usize) -> u8 {
        self.input.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn text(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// `%1010` is a binary literal unless it directly follows an operand
    /// (`x%10` is modulo). Whitespace before the `%` also makes it a literal.
    fn binary_allowed(&self, start: usize) -> bool {
        !self.after_operand || (start > 0 && is_space(self.input[start - 1]))
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        while is_ident_char(self.peek(0)) {
            self.pos += 1;
        }
        let text = self.text(start);
        if (self.is_register)(&text.to_ascii_uppercase()) {
            TokenKind::Register(text)
        } else {
            TokenKind::Identifier(text)
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, TokenizeError> {
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'_' {
            self.pos += 1;
        }
        let text = self.text(start);
        let upper = text.to_ascii_uppercase();
        let (digits, base) = split_radix(&upper);
        match parse_digits(digits, base) {
            Some(value) => Ok(TokenKind::Number(NumberLiteral { text, base, value })),
            None => Err(self.error(format!("Illegal character in constant: {text}"), start)),
        }
    }

    /// `$hex` or `%binary`; the cursor is on the prefix.
    fn prefixed(&mut self, start: usize, base: u32) -> Result<TokenKind, TokenizeError> {
        self.pos += 1;
        while self.peek(0) == b'_' || char::from(self.peek(0)).is_digit(base) {
            self.pos += 1;
        }
        let text = self.text(start);
        match parse_digits(&text[1..], base) {
            Some(value) => Ok(TokenKind::Number(NumberLiteral { text, base, value })),
            None => Err(self.error(format!("Illegal character in constant: {text}"), start)),
        }
    }

    fn string(&mut self, start: usize, quote: u8) -> Result<TokenKind, TokenizeError> {
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek(0) {
                0 => {
                    let rest = self.text(start);
                    return Err(self.error(format!("Unterminated string: {rest}"), start));
                }
                c if c == quote => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    let escaped = self.escape(start)?;
                    bytes.push(escaped);
                }
                c => {
                    bytes.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(TokenKind::String(StringLiteral {
            raw: self.text(start),
            bytes,
        }))
    }

    /// Decode the escape sequence at the cursor (`\n`, `\r`, `\t`, `\0`,
    /// `\xHH`, or the escaped character itself).
    fn escape(&mut self, start: usize) -> Result<u8, TokenizeError> {
        let esc = self.peek(1);
        if esc == 0 {
            self.pos = self.input.len();
            let rest = self.text(start);
            return Err(self.error(format!("Unterminated string: {rest}"), start));
        }
        self.pos += 2;
        let value = match esc {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'0' => 0,
            b'x' => {
                let hex = self
                    .input
                    .get(self.pos..self.pos + 2)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                let Some(value) = hex else {
                    return Err(self.error("Bad hex escape in string".to_string(), start));
                };
                self.pos += 2;
                value
            }
            other => other,
        };
        Ok(value)
    }
}

/// Tokenize a whole source line; the returned vector always ends with
/// [`TokenKind::End`].
pub fn tokenize_line(
    line: &str,
    line_num: u32,
    is_register: RegisterChecker,
) -> Result<Vec<Token>, TokenizeError> {
    let mut tokenizer = Tokenizer::with_register_checker(line, line_num, is_register);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        let done = token.kind == TokenKind::End;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Digits and radix of an uppercased literal that starts with a digit:
/// `0x` and `0b` prefixes, `H`, `B`, `O`/`Q` and `D` suffixes.
fn split_radix(upper: &str) -> (&str, u32) {
    if let Some(hex) = upper.strip_prefix("0X") {
        return (hex, 16);
    }
    if let Some(bin) = upper
        .strip_prefix("0B")
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|c| is_bin_digit(c) || c == b'_'))
    {
        return (bin, 2);
    }
    let (body, suffix) = upper.split_at(upper.len() - 1);
    match suffix {
        "H" => (body, 16),
        "B" => (body, 2),
        "O" | "Q" => (body, 8),
        "D" => (body, 10),
        _ => (upper, 10),
    }
}

/// Digits with optional `_` separators; `None` when empty, malformed or
/// wider than 32 bits.
fn parse_digits(digits: &str, base: u32) -> Option<u32> {
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    u32::from_str_radix(&cleaned, base).ok()
}

fn is_bin_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        let regs = register_checker_from_fn(|name| matches!(name, "A" | "D1"));
        tokenize_line(line, 1, regs)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn number(text: &str) -> u32 {
        match Tokenizer::new(text, 1).next_token().unwrap().kind {
            TokenKind::Number(num) => num.value,
            other => panic!("expected number, got {other:?}"),
        }
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn registers_come_from_the_checker() {
        assert_eq!(
            kinds("SET a, b"),
            vec![
                ident("SET"),
                TokenKind::Register("a".to_string()),
                TokenKind::Comma,
                ident("b"),
                TokenKind::End
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(number("0A6h"), 0xA6);
        assert_eq!(number("0x1F"), 0x1F);
        assert_eq!(number("0b101"), 5);
        assert_eq!(number("101b"), 5);
        assert_eq!(number("17o"), 15);
        assert_eq!(number("99d"), 99);
        assert_eq!(number("$FFFF_FFFF"), 0xFFFF_FFFF);
        assert_eq!(number("%1010"), 10);
        assert_eq!(number("32768"), 32768);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(Tokenizer::new("$1_0000_0000", 1).next_token().is_err());
        assert!(Tokenizer::new("12G", 1).next_token().is_err());
        assert!(Tokenizer::new("65C02", 1).next_token().is_err());
        assert!(Tokenizer::new("$_", 1).next_token().is_err());
    }

    #[test]
    fn size_suffixes_are_separate_tokens() {
        let kinds = kinds("MOVE.L D1.W");
        assert_eq!(kinds[0], ident("MOVE"));
        assert_eq!(kinds[1], TokenKind::Dot);
        assert_eq!(kinds[2], ident("L"));
        assert_eq!(kinds[3], TokenKind::Register("D1".to_string()));
        assert_eq!(kinds[4], TokenKind::Dot);
        assert_eq!(kinds[5], ident("W"));
    }

    #[test]
    fn percent_is_binary_or_modulo_by_context() {
        assert!(matches!(kinds("#%101")[1], TokenKind::Number(_)));
        assert!(matches!(kinds("DC.B %11")[3], TokenKind::Number(_)));
        assert_eq!(kinds("x%10")[1], TokenKind::Operator(OperatorKind::Mod));
        assert_eq!(kinds("(x)%10")[3], TokenKind::Operator(OperatorKind::Mod));
    }

    #[test]
    fn two_character_operators() {
        assert_eq!(
            kinds("<< >> <= >= <> != == && || < ="),
            vec![
                TokenKind::Operator(OperatorKind::Shl),
                TokenKind::Operator(OperatorKind::Shr),
                TokenKind::Operator(OperatorKind::Le),
                TokenKind::Operator(OperatorKind::Ge),
                TokenKind::Operator(OperatorKind::Ne),
                TokenKind::Operator(OperatorKind::Ne),
                TokenKind::Operator(OperatorKind::Eq),
                TokenKind::Operator(OperatorKind::LogicAnd),
                TokenKind::Operator(OperatorKind::LogicOr),
                TokenKind::Operator(OperatorKind::Lt),
                TokenKind::Operator(OperatorKind::Eq),
                TokenKind::End
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let kinds = kinds(r#"DB "A\n\x41\"", 'b'"#);
        let TokenKind::String(lit) = &kinds[1] else {
            panic!("expected string, got {:?}", kinds[1]);
        };
        assert_eq!(lit.bytes, vec![b'A', b'\n', 0x41, b'"']);
        assert_eq!(lit.raw, r#""A\n\x41\"""#);
        assert!(matches!(&kinds[3], TokenKind::String(lit) if lit.bytes == b"b"));
    }

    #[test]
    fn broken_strings_are_errors() {
        assert!(Tokenizer::new("\"open", 1).next_token().is_err());
        assert!(Tokenizer::new("\"bad \\xZZ\"", 1).next_token().is_err());
        assert!(Tokenizer::new("\"trailing\\", 1).next_token().is_err());
    }

    #[test]
    fn comment_ends_the_line() {
        assert_eq!(kinds("  NOP ; ignored ,"), vec![ident("NOP"), TokenKind::End]);
    }

    #[test]
    fn spans_are_one_based_columns() {
        let tokens = tokenize_line("  RTS", 7, register_checker_none()).unwrap();
        assert_eq!(
            tokens[0].span,
            Span {
                line: 7,
                col_start: 3,
                col_end: 6
            }
        );
    }

    #[test]
    fn display_gives_source_text() {
        let tokens = tokenize_line("$1f <= 'x'", 1, register_checker_none()).unwrap();
        let text: Vec<String> = tokens.iter().map(Token::to_string).collect();
        assert_eq!(text, vec!["$1f", "<=", "'x'", ""]);
    }

    #[test]
    fn illegal_character() {
        let err = Tokenizer::new("  @", 1).next_token().unwrap_err();
        assert_eq!(err.message, "Illegal character");
        assert_eq!(err.span.col_start, 3);
    }
}
