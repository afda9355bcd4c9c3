/*!
Parser for Pron source: token stream in, [`Program`] out.

Grammar (condensed)
-------------------

```text
program     → statement* EOF ;
statement   → varStmt | returnStmt | funcStmt | classStmt | exprStmt ;
varStmt     → "var" IDENT ( "=" expression )? ";"? ;
returnStmt  → "return" expression? ";"? ;
funcStmt    → "func" IDENT "(" params? ")" block ";"? ;
classStmt   → "class" IDENT "{" ( varStmt | funcStmt | init | ";" )* "}" ;
init        → "Init" "(" ( initParam ( "," initParam )* )? ")" block ;
initParam   → "this" "." IDENT | IDENT ;
exprStmt    → expression ";"? ;
block       → "{" statement* "}" ;
```

Expressions use **Pratt (precedence‑climbing)** parsing: every token kind that
may start an expression has a prefix handler, every kind that may continue
one has an infix handler plus a binding power (see [`Precedence`]).

Error policy
------------

The parser never aborts. A failed expectation records
`expected next token to be X, got Y instead`, a token with no prefix handler
records `no prefix parse function for X found`, and the construct is replaced
by a `Null` placeholder (or dropped, at statement level) so later errors in
the same input are still reported.
*/

use log::{debug, info};

use crate::ast::{
    BlockStatement, ClassStatement, ConditionalBranch, Constructor, Expression, FieldDeclaration,
    FunctionDeclaration, FunctionLiteral, Identifier, InfixOperator, InitParam, PrefixOperator,
    Program, Statement,
};
use crate::token::{Token, TokenKind};
use std::rc::Rc;

/// Binding power of infix operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `=` `==` `!=`
    Equals,
    /// `<` `>`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/` `%`
    Product,
    /// `-x` `!x`
    Prefix,
    /// `f(x)`
    Call,
    /// `a[i]`
    Index,
}

impl Precedence {
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Assign | TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Slash | TokenKind::Asterisk | TokenKind::Modulo => Precedence::Product,
            TokenKind::LParen => Precedence::Call,
            TokenKind::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

type PrefixParseFn<I> = fn(&mut Parser<I>) -> Option<Expression>;
type InfixParseFn<I> = fn(&mut Parser<I>, Expression) -> Option<Expression>;

/// Parse a whole token stream, returning the program and every syntax error
/// found along the way.
pub fn parse<T>(tokens: T) -> (Program, Vec<String>)
where
    T: IntoIterator<Item = Token>,
{
    let mut parser = Parser::new(tokens.into_iter());
    let program = parser.parse_program();
    (program, parser.into_errors())
}

/// Two-token-lookahead parser over any token iterator.
pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    errors: Vec<String>,
    cur: Token,
    peek: Token,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    /// Construct a new parser and prime `cur`/`peek`.
    pub fn new(tokens: I) -> Self {
        let mut parser = Self {
            tokens,
            errors: Vec::new(),
            cur: Token::eof(1),
            peek: Token::eof(1),
        };

        parser.next_token();
        parser.next_token();

        info!("Parser created, first token: {}", parser.cur);

        parser
    }

    // ───────────────────────── public API ─────────────────────────

    /// Syntax errors recorded so far, in source order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Parse statements until the end of the token stream.
    pub fn parse_program(&mut self) -> Program {
        info!("Beginning parse phase");

        let mut program = Program::default();

        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            program.statements.len(),
            self.errors.len()
        );

        program
    }

    // ──────────────────────── statement rules ─────────────────────

    fn parse_statement(&mut self) -> Option<Statement> {
        debug!("Entering statement at {}", self.cur);

        match self.cur.kind {
            TokenKind::Var => self
                .parse_var_binding()
                .map(|(name, value)| Statement::Var { name, value }),
            TokenKind::Return => Some(self.parse_return_statement()),
            TokenKind::Function if self.peek_is(TokenKind::Ident) => self
                .parse_function_declaration()
                .map(Statement::Function),
            TokenKind::Class => self
                .parse_class_statement()
                .map(|class| Statement::Class(Rc::new(class))),
            _ => Some(self.parse_expression_statement()),
        }
    }

    /// `var name (= value)?` with the trailing `;` optional.
    fn parse_var_binding(&mut self) -> Option<(Identifier, Expression)> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let name = Identifier::new(self.cur.literal.clone());

        let value = if self.peek_is(TokenKind::Assign) {
            self.next_token();
            self.next_token();
            self.parse_expression(Precedence::Lowest)
                .unwrap_or(Expression::Null)
        } else {
            Expression::Null
        };

        self.skip_semicolon();

        Some((name, value))
    }

    fn parse_return_statement(&mut self) -> Statement {
        let value = if matches!(
            self.peek.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            Expression::Null
        } else {
            self.next_token();
            self.parse_expression(Precedence::Lowest)
                .unwrap_or(Expression::Null)
        };

        self.skip_semicolon();

        Statement::Return(value)
    }

    fn parse_expression_statement(&mut self) -> Statement {
        let expr = self
            .parse_expression(Precedence::Lowest)
            .unwrap_or(Expression::Null);

        // lets `5 + 5` work in the REPL without a trailing `;`
        self.skip_semicolon();

        Statement::Expression(expr)
    }

    /// `func Name(params) { … }`, entered with `cur` on `func`.
    fn parse_function_declaration(&mut self) -> Option<FunctionDeclaration> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let name = Identifier::new(self.cur.literal.clone());
        let is_public = name
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase());

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        let body = self.parse_block_statement();

        self.skip_semicolon();

        Some(FunctionDeclaration {
            name,
            function: Rc::new(FunctionLiteral { parameters, body }),
            is_public,
        })
    }

    fn parse_class_statement(&mut self) -> Option<ClassStatement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let name = Identifier::new(self.cur.literal.clone());

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        self.next_token();

        let mut class = ClassStatement {
            name,
            fields: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        };

        while !self.cur_is(TokenKind::RBrace) {
            match self.cur.kind {
                TokenKind::Eof => {
                    self.errors.push(format!(
                        "expected next token to be {}, got {} instead",
                        TokenKind::RBrace,
                        TokenKind::Eof
                    ));
                    return None;
                }

                TokenKind::Var => {
                    if let Some((name, value)) = self.parse_var_binding() {
                        class.fields.push(FieldDeclaration { name, value });
                    }
                }

                TokenKind::Function => {
                    if let Some(method) = self.parse_function_declaration() {
                        class.methods.push(method);
                    }
                }

                TokenKind::Init => {
                    if class.constructor.is_some() {
                        self.errors
                            .push(format!("class {} declares Init more than once", class.name));
                    }
                    if let Some(init) = self.parse_constructor() {
                        class.constructor = Some(Rc::new(init));
                    }
                }

                TokenKind::Semicolon => {}

                other => {
                    self.errors.push(format!(
                        "unexpected {} in body of class {}",
                        other, class.name
                    ));
                }
            }

            self.next_token();
        }

        info!(
            "Parsed class {} ({} fields, {} methods, constructor: {})",
            class.name,
            class.fields.len(),
            class.methods.len(),
            class.constructor.is_some()
        );

        Some(class)
    }

    /// `Init(this.a, b) { … }`, entered with `cur` on `Init`.
    fn parse_constructor(&mut self) -> Option<Constructor> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let mut parameters = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
        } else {
            self.next_token();
            parameters.push(self.parse_init_param()?);

            while self.peek_is(TokenKind::Comma) {
                self.next_token();
                self.next_token();
                parameters.push(self.parse_init_param()?);
            }

            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        let body = self.parse_block_statement();

        Some(Constructor { parameters, body })
    }

    fn parse_init_param(&mut self) -> Option<InitParam> {
        match self.cur.kind {
            TokenKind::This => {
                if !self.expect_peek(TokenKind::Dot) || !self.expect_peek(TokenKind::Ident) {
                    return None;
                }

                Some(InitParam {
                    name: Identifier::new(self.cur.literal.clone()),
                    this_bound: true,
                })
            }

            TokenKind::Ident => Some(InitParam {
                name: Identifier::new(self.cur.literal.clone()),
                this_bound: false,
            }),

            other => {
                self.errors.push(format!(
                    "expected next token to be {}, got {} instead",
                    TokenKind::Ident,
                    other
                ));
                None
            }
        }
    }

    /// `{ statement* }`, entered with `cur` on `{` and left on `}`.
    fn parse_block_statement(&mut self) -> BlockStatement {
        let mut block = BlockStatement::default();

        self.next_token();

        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        if self.cur_is(TokenKind::Eof) {
            self.errors.push(format!(
                "expected next token to be {}, got {} instead",
                TokenKind::RBrace,
                TokenKind::Eof
            ));
        }

        block
    }

    // ─────────────────────── expression rules (Pratt) ─────────────

    fn prefix_parse_fn(kind: TokenKind) -> Option<PrefixParseFn<I>> {
        let parse: PrefixParseFn<I> = match kind {
            TokenKind::Ident => Self::parse_identifier,
            TokenKind::This => Self::parse_this_identifier,
            TokenKind::Int => Self::parse_integer_literal,
            TokenKind::Real => Self::parse_real_literal,
            TokenKind::Str => Self::parse_string_literal,
            TokenKind::True | TokenKind::False => Self::parse_boolean,
            TokenKind::Bang | TokenKind::Minus => Self::parse_prefix_expression,
            TokenKind::LParen => Self::parse_grouped_expression,
            TokenKind::If => Self::parse_if_expression,
            TokenKind::Function => Self::parse_function_literal,
            TokenKind::LBracket => Self::parse_array_literal,
            TokenKind::LBrace => Self::parse_hash_literal,
            TokenKind::For => Self::parse_for_expression,
            TokenKind::New => Self::parse_object_initialization,
            _ => return None,
        };

        Some(parse)
    }

    fn infix_parse_fn(kind: TokenKind) -> Option<InfixParseFn<I>> {
        let parse: InfixParseFn<I> = match kind {
            TokenKind::Assign
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Modulo
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt => Self::parse_infix_expression,
            TokenKind::LParen => Self::parse_call_expression,
            TokenKind::LBracket => Self::parse_index_expression,
            _ => return None,
        };

        Some(parse)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(prefix) = Self::prefix_parse_fn(self.cur.kind) else {
            self.errors.push(format!(
                "no prefix parse function for {} found",
                self.cur.kind
            ));
            return None;
        };

        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some(infix) = Self::infix_parse_fn(self.peek.kind) else {
                return Some(left);
            };

            self.next_token();

            left = infix(self, left)?;
        }

        Some(left)
    }

    /// A plain name, or one of the name-led forms `x++`, `x--`, `obj.m(…)`.
    fn parse_identifier(&mut self) -> Option<Expression> {
        let ident = Identifier::new(self.cur.literal.clone());

        match self.peek.kind {
            TokenKind::Dot => self.parse_method_call(ident),
            TokenKind::Increment => {
                self.next_token();
                Some(Expression::Increment(ident))
            }
            TokenKind::Decrement => {
                self.next_token();
                Some(Expression::Decrement(ident))
            }
            _ => Some(Expression::Identifier(ident)),
        }
    }

    fn parse_method_call(&mut self, object: Identifier) -> Option<Expression> {
        self.next_token();

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let method = Identifier::new(self.cur.literal.clone());

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let arguments = self.parse_expression_list(TokenKind::RParen)?;

        Some(Expression::MethodCall {
            object,
            method,
            arguments,
        })
    }

    fn parse_this_identifier(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::Dot) || !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        Some(Expression::Identifier(Identifier::this_prefixed(
            self.cur.literal.clone(),
        )))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse {:?} as integer",
                    self.cur.literal
                ));
                None
            }
        }
    }

    fn parse_real_literal(&mut self) -> Option<Expression> {
        match self.cur.literal.parse::<f64>() {
            Ok(value) => Some(Expression::Real(value)),
            Err(_) => {
                self.errors
                    .push(format!("could not parse {:?} as real", self.cur.literal));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::Str(self.cur.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.cur_is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.cur.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };

        self.next_token();

        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match self.cur.kind {
            TokenKind::Assign => InfixOperator::Assign,
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Asterisk => InfixOperator::Multiply,
            TokenKind::Slash => InfixOperator::Divide,
            TokenKind::Modulo => InfixOperator::Modulo,
            TokenKind::Eq => InfixOperator::Eq,
            TokenKind::NotEq => InfixOperator::NotEq,
            TokenKind::Lt => InfixOperator::Lt,
            _ => InfixOperator::Gt,
        };

        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expr = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(expr)
    }

    /// `( condition ) { … }` following `if` or `elif`.
    fn parse_conditional_branch(&mut self) -> Option<ConditionalBranch> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) || !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        let consequence = self.parse_block_statement();

        Some(ConditionalBranch {
            condition,
            consequence,
        })
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let mut branches = vec![self.parse_conditional_branch()?];

        while self.peek_is(TokenKind::Elif) {
            self.next_token();
            branches.push(self.parse_conditional_branch()?);
        }

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();

            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }

            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expression::If {
            branches,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }

        let body = self.parse_block_statement();

        Some(Expression::Function(Rc::new(FunctionLiteral {
            parameters,
            body,
        })))
    }

    /// Parameter names after `(`, consuming the closing `)`.
    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut identifiers = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(identifiers);
        }

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        identifiers.push(Identifier::new(self.cur.literal.clone()));

        while self.peek_is(TokenKind::Comma) {
            self.next_token();

            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            identifiers.push(Identifier::new(self.cur.literal.clone()));
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }

        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;

        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    /// Comma separated expressions up to and including `end`.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;

        Some(Expression::Array(elements))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();

        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }

        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }

            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }

        Some(Expression::Hash(pairs))
    }

    /// `for (i from A to B) {…}` or `for (i in xs) {…}`; the token after the
    /// loop variable decides which.
    fn parse_for_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) || !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let variable = Identifier::new(self.cur.literal.clone());

        match self.peek.kind {
            TokenKind::From => {
                self.next_token();
                self.next_token();
                let from = self.parse_expression(Precedence::Lowest)?;

                if !self.expect_peek(TokenKind::To) {
                    return None;
                }

                self.next_token();
                let to = self.parse_expression(Precedence::Lowest)?;

                if !self.expect_peek(TokenKind::RParen) || !self.expect_peek(TokenKind::LBrace) {
                    return None;
                }

                let body = self.parse_block_statement();

                Some(Expression::RangeFor {
                    variable,
                    from: Box::new(from),
                    to: Box::new(to),
                    body,
                })
            }

            TokenKind::In => {
                self.next_token();

                if !self.expect_peek(TokenKind::Ident) {
                    return None;
                }

                let collection = Identifier::new(self.cur.literal.clone());

                if !self.expect_peek(TokenKind::RParen) || !self.expect_peek(TokenKind::LBrace) {
                    return None;
                }

                let body = self.parse_block_statement();

                Some(Expression::CollectionFor {
                    variable,
                    collection,
                    body,
                })
            }

            other => {
                self.errors.push(format!(
                    "expected next token to be {} or {}, got {} instead",
                    TokenKind::From,
                    TokenKind::In,
                    other
                ));
                None
            }
        }
    }

    fn parse_object_initialization(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }

        let class = Identifier::new(self.cur.literal.clone());

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }

        let arguments = self.parse_expression_list(TokenKind::RParen)?;

        Some(Expression::New { class, arguments })
    }

    // ────────────────────── utility helpers ───────────────────────

    fn next_token(&mut self) {
        let next = match self.tokens.next() {
            Some(token) => token,
            None => Token::eof(self.peek.line),
        };

        self.cur = std::mem::replace(&mut self.peek, next);
    }

    #[inline(always)]
    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    #[inline(always)]
    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    /// Advance iff the next token has the expected kind; otherwise record the
    /// mismatch.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            return true;
        }

        self.peek_error(kind);
        false
    }

    fn peek_error(&mut self, kind: TokenKind) {
        let msg = format!(
            "expected next token to be {}, got {} instead",
            kind, self.peek.kind
        );
        debug!("Parse error on line {}: {}", self.peek.line, msg);
        self.errors.push(msg);
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek.kind)
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur.kind)
    }
}
