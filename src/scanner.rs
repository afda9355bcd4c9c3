//! Module `scanner` implements a one‑pass streaming lexer for Pron source text.
//!
//! It transforms a `&str` into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `Eof` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters and
//! handed straight to [`crate::parser::Parser::new`].
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `( ) { } [ ] , ; : . * %`.
//! - Two‑character operators: `== != ++ --`.
//! - String literals: `"` … `"`, multi‑line allowed, no escapes.
//! - Numeric literals: `INT` (`42`) or `REAL` (`4.5`).
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a
//!   perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line and `/* … */` blocks, both skipped with
//!   `memchr` searches instead of byte-by-byte loops.
//!
//! Lexing never fails: unknown bytes and unterminated strings become
//! `Illegal` tokens and the parser reports them.

use crate::token::{Token, TokenKind};
use log::{debug, info};
use memchr::{memchr, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "func"   => TokenKind::Function,
    "var"    => TokenKind::Var,
    "true"   => TokenKind::True,
    "false"  => TokenKind::False,
    "if"     => TokenKind::If,
    "else"   => TokenKind::Else,
    "elif"   => TokenKind::Elif,
    "return" => TokenKind::Return,
    "for"    => TokenKind::For,
    "from"   => TokenKind::From,
    "to"     => TokenKind::To,
    "in"     => TokenKind::In,
    "class"  => TokenKind::Class,
    "Init"   => TokenKind::Init,
    "this"   => TokenKind::This,
    "new"    => TokenKind::New,
};

/// Returns the keyword kind for `ident`, or `Ident` for user names.
pub fn lookup_ident(ident: &str) -> TokenKind {
    KEYWORDS.get(ident).copied().unwrap_or(TokenKind::Ident)
}

/// A single pass **scanner** that converts source text into [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,               // entire source unit
    start: usize,               // byte index of the *first* byte of the current lexeme
    curr: usize,                // byte index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenKind>, // recognised token kind waiting to be emitted
    literal: Option<String>,    // literal override (string contents)
}

impl<'a> Scanner<'a> {
    /// Create a new scanner over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            literal: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.bytes()[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    fn count_lines(&mut self, from: usize, to: usize) {
        self.line += self.bytes()[from..to].iter().filter(|&&b| b == b'\n').count();
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`. Whitespace and comments
    /// leave `pending` unset.
    fn scan_token(&mut self) {
        let b = self.advance();

        let kind = match b {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'*' => TokenKind::Asterisk,
            b'%' => TokenKind::Modulo,

            b'+' if self.match_byte(b'+') => TokenKind::Increment,
            b'+' => TokenKind::Plus,
            b'-' if self.match_byte(b'-') => TokenKind::Decrement,
            b'-' => TokenKind::Minus,
            b'!' if self.match_byte(b'=') => TokenKind::NotEq,
            b'!' => TokenKind::Bang,
            b'=' if self.match_byte(b'=') => TokenKind::Eq,
            b'=' => TokenKind::Assign,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,

            b' ' | b'\r' | b'\t' => return,

            b'\n' => {
                self.line += 1;
                return;
            }

            b'/' => {
                if self.match_byte(b'/') {
                    match memchr(b'\n', &self.bytes()[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }
                    return;
                }

                if self.match_byte(b'*') {
                    let end = match memmem::find(&self.bytes()[self.curr..], b"*/") {
                        Some(pos) => self.curr + pos + 2,
                        None => self.src.len(),
                    };
                    self.count_lines(self.curr, end);
                    self.curr = end;
                    return;
                }

                TokenKind::Slash
            }

            b'"' => self.string(),

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // keep multi-byte characters whole so the literal stays valid UTF-8
                while !self.is_at_end() && self.peek() & 0xC0 == 0x80 {
                    self.curr += 1;
                }
                debug!(
                    "Unexpected character {:?} on line {}",
                    &self.src[self.start..self.curr],
                    self.line
                );
                TokenKind::Illegal
            }
        };

        self.pending = Some(kind);
    }

    /// Double‑quoted string literal; `self.start` still points to the opening `"`.
    fn string(&mut self) -> TokenKind {
        let body_start = self.curr;

        match memchr(b'"', &self.bytes()[self.curr..]) {
            Some(pos) => {
                let body_end = self.curr + pos;
                self.count_lines(body_start, body_end);
                self.curr = body_end + 1;
                self.literal = Some(self.src[body_start..body_end].to_owned());
                TokenKind::Str
            }

            None => {
                self.count_lines(body_start, self.src.len());
                self.curr = self.src.len();
                TokenKind::Illegal
            }
        }
    }

    /// Numeric literal: `INT` unless a fractional part follows.
    fn number(&mut self) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;

            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }

            return TokenKind::Real;
        }

        TokenKind::Int
    }

    fn identifier(&mut self) -> TokenKind {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.curr += 1;
        }

        lookup_ident(&self.src[self.start..self.curr])
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.src.len() {
            // EOF guard: emit exactly one EOF then terminate.
            if self.curr == self.src.len() {
                self.curr += 1;
                return Some(Token::eof(self.line));
            }

            self.start = self.curr;
            self.pending = None;
            self.literal = None;

            let line = self.line;
            self.scan_token();

            if let Some(kind) = self.pending.take() {
                let literal = self
                    .literal
                    .take()
                    .unwrap_or_else(|| self.src[self.start..self.curr].to_owned());
                debug!("Scanned token ({:?}) on line {}", kind, line);

                return Some(Token::new(kind, literal, line));
            }
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
