//! Abstract syntax tree for Pron programs.
//!
//! The tree is built once by [`crate::parser::Parser`] and only read by the
//! evaluator afterwards. Function, method and constructor bodies sit behind
//! `Rc` so runtime function values can share them with the tree instead of
//! cloning them (a class body is re-read for every `new`).
//!
//! Every node renders to a canonical, fully parenthesised string through
//! `Display`; `"a + b * c"` renders as `"(a + (b * c))"`.

use serde::Serialize;
use std::fmt;
use std::rc::Rc;

use crate::value::format_real;

/// Root of the AST.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A name, optionally written as `this.name`.
///
/// The flag changes which environment frame is consulted: `this.`-prefixed
/// names always resolve in the outermost frame (the instance's own fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
    pub this_prefixed: bool,
}

impl Identifier {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            this_prefixed: false,
        }
    }

    pub fn this_prefixed<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            this_prefixed: true,
        }
    }
}

/// Braced sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// `var name = value`; an omitted initializer is an explicit `Null`.
    Var { name: Identifier, value: Expression },

    /// `return value`
    Return(Expression),

    /// A bare expression (legal at top level, which makes the REPL work).
    Expression(Expression),

    /// `func Name(params) { … }`
    Function(FunctionDeclaration),

    /// `class Name { … }`
    Class(Rc<ClassStatement>),
}

/// Named function, as written at statement level or inside a class body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub function: Rc<FunctionLiteral>,

    /// Public iff the first letter of the name is upper-case.
    pub is_public: bool,
}

/// Parameters plus body of any function value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionLiteral {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDeclaration {
    pub name: Identifier,
    pub value: Expression,
}

/// Constructor parameter; `this_bound` when written as `this.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitParam {
    pub name: Identifier,
    pub this_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constructor {
    pub parameters: Vec<InitParam>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStatement {
    pub name: Identifier,
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<FunctionDeclaration>,
    pub constructor: Option<Rc<Constructor>>,
}

/// One `if (…) { … }` or `elif (…) { … }` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalBranch {
    pub condition: Expression,
    pub consequence: BlockStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfixOperator {
    Assign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Identifier(Identifier),

    /// Placeholder for omitted initializers and for constructs that failed
    /// to parse.
    Null,

    Integer(i64),
    Real(f64),
    Str(String),
    Boolean(bool),

    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },

    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },

    /// `if` with any number of `elif` arms and an optional `else`.
    If {
        branches: Vec<ConditionalBranch>,
        alternative: Option<BlockStatement>,
    },

    Function(Rc<FunctionLiteral>),

    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },

    Array(Vec<Expression>),

    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },

    /// Key/value pairs in source order.
    Hash(Vec<(Expression, Expression)>),

    /// `for (i from A to B) { … }`
    RangeFor {
        variable: Identifier,
        from: Box<Expression>,
        to: Box<Expression>,
        body: BlockStatement,
    },

    /// `for (i in array) { … }`; the collection must be a plain name.
    CollectionFor {
        variable: Identifier,
        collection: Identifier,
        body: BlockStatement,
    },

    /// `new Name(args)`
    New {
        class: Identifier,
        arguments: Vec<Expression>,
    },

    /// `object.method(args)`
    MethodCall {
        object: Identifier,
        method: Identifier,
        arguments: Vec<Expression>,
    },

    Increment(Identifier),
    Decrement(Identifier),
}

// ───────────────────────── canonical rendering ─────────────────────────

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.this_prefixed {
            write!(f, "this.{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Var { name, value } => write!(f, "var {} = {};", name, value),
            Statement::Return(value) => write!(f, "return {};", value),
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Function(decl) => write!(f, "{}", decl),
            Statement::Class(class) => write!(f, "{}", class),
        }
    }
}

impl fmt::Display for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "func {}({}) {{{}}}",
            self.name,
            join(&self.function.parameters),
            self.function.body
        )
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func({}) {{{}}}", join(&self.parameters), self.body)
    }
}

impl fmt::Display for InitParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.this_bound {
            write!(f, "this.{}", self.name.name)
        } else {
            f.write_str(&self.name.name)
        }
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Init({}) {{{}}}", join(&self.parameters), self.body)
    }
}

impl fmt::Display for ClassStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {} {{", self.name)?;
        for field in &self.fields {
            write!(f, "var {} = {};", field.name, field.value)?;
        }
        if let Some(init) = &self.constructor {
            write!(f, "{}", init)?;
        }
        for method in &self.methods {
            write!(f, "{}", method)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOperator::Bang => "!",
            PrefixOperator::Minus => "-",
        })
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOperator::Assign => "=",
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Modulo => "%",
            InfixOperator::Eq => "==",
            InfixOperator::NotEq => "!=",
            InfixOperator::Lt => "<",
            InfixOperator::Gt => ">",
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Null => f.write_str("null"),
            Expression::Integer(n) => write!(f, "{}", n),
            Expression::Real(r) => f.write_str(&format_real(*r)),
            Expression::Str(s) => write!(f, "\"{}\"", s),
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),

            Expression::If {
                branches,
                alternative,
            } => {
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { " elif" };
                    write!(
                        f,
                        "{} ({}) {{{}}}",
                        keyword, branch.condition, branch.consequence
                    )?;
                }
                if let Some(alt) = alternative {
                    write!(f, " else {{{}}}", alt)?;
                }
                Ok(())
            }

            Expression::Function(literal) => write!(f, "{}", literal),
            Expression::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments)),
            Expression::Array(elements) => write!(f, "[{}]", join(elements)),
            Expression::Index { left, index } => write!(f, "({}[{}])", left, index),

            Expression::Hash(pairs) => {
                let rendered: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }

            Expression::RangeFor {
                variable,
                from,
                to,
                body,
            } => write!(f, "for ({} from {} to {}) {{{}}}", variable, from, to, body),
            Expression::CollectionFor {
                variable,
                collection,
                body,
            } => write!(f, "for ({} in {}) {{{}}}", variable, collection, body),
            Expression::New { class, arguments } => {
                write!(f, "new {}({})", class, join(arguments))
            }
            Expression::MethodCall {
                object,
                method,
                arguments,
            } => write!(f, "{}.{}({})", object, method, join(arguments)),
            Expression::Increment(ident) => write!(f, "{}++", ident),
            Expression::Decrement(ident) => write!(f, "{}--", ident),
        }
    }
}
