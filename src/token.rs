use log::trace;
use serde::Serialize;
use std::fmt;

/// The different kinds of tokens recognized by the Pron scanner.
///
/// Literal-carrying kinds keep their text in [`Token::literal`]; the kind
/// itself is a plain tag so it can be used as a dispatch key by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Any byte the scanner does not understand, or an unterminated string.
    Illegal,

    /// End-of-input marker
    Eof,

    /// A user-defined identifier
    Ident,

    /// Integer literal (`42`)
    Int,

    /// Real literal (`4.5`)
    Real,

    /// String literal (contents without quotes)
    Str,

    /// '='
    Assign,

    /// '+'
    Plus,

    /// '-'
    Minus,

    /// '!'
    Bang,

    /// '*'
    Asterisk,

    /// '/'
    Slash,

    /// '%'
    Modulo,

    /// '=='
    Eq,

    /// '!='
    NotEq,

    /// '++'
    Increment,

    /// '--'
    Decrement,

    /// '<'
    Lt,

    /// '>'
    Gt,

    /// ','
    Comma,

    /// ';'
    Semicolon,

    /// ':'
    Colon,

    /// '.'
    Dot,

    /// '('
    LParen,

    /// ')'
    RParen,

    /// '{'
    LBrace,

    /// '}'
    RBrace,

    /// '['
    LBracket,

    /// ']'
    RBracket,

    /// 'func'
    Function,

    /// 'var'
    Var,

    /// 'true'
    True,

    /// 'false'
    False,

    /// 'if'
    If,

    /// 'else'
    Else,

    /// 'elif'
    Elif,

    /// 'return'
    Return,

    /// 'for'
    For,

    /// 'from'
    From,

    /// 'to'
    To,

    /// 'in'
    In,

    /// 'class'
    Class,

    /// 'Init'
    Init,

    /// 'this'
    This,

    /// 'new'
    New,
}

impl TokenKind {
    /// Name used when the kind shows up in a parser diagnostic.
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Real => "REAL",
            TokenKind::Str => "STRING",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Modulo => "%",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Function => "FUNCTION",
            TokenKind::Var => "VAR",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Elif => "ELIF",
            TokenKind::Return => "RETURN",
            TokenKind::For => "FOR",
            TokenKind::From => "FROM",
            TokenKind::To => "TO",
            TokenKind::In => "IN",
            TokenKind::Class => "CLASS",
            TokenKind::Init => "INIT",
            TokenKind::This => "THIS",
            TokenKind::New => "NEW",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scanned token: its kind, the literal source text, and the line where
/// it was found.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Token {
    /// The category of this token.
    pub kind: TokenKind,

    /// Source text of the token; for strings, the contents without quotes.
    pub literal: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given kind, literal text and line.
    pub fn new<S: Into<String>>(kind: TokenKind, literal: S, line: usize) -> Self {
        let literal: String = literal.into();

        trace!(
            "Creating new token: kind={:?}, literal={}, line={}",
            kind,
            literal,
            line
        );

        Self {
            kind,
            literal,
            line,
        }
    }

    /// End-of-input token used once the underlying stream is exhausted.
    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "", line)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // e.g. `IDENT five 1`, `INT 5 1`, `EOF  3`
        write!(f, "{} {} {}", self.kind, self.literal, self.line)
    }
}
