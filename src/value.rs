//! Runtime values.
//!
//! A [`Value`] is a shared handle to an [`Object`]; binding a value to a
//! second name aliases it. Integers carry a `Cell` so `i++` is visible
//! through every alias, matching the language's in-place mutation rules.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Constructor, FunctionLiteral};
use crate::environment::Env;
use crate::interpreter::IResult;

pub type Value = Rc<Object>;

/// Signature shared by every entry of the builtin registry.
pub type BuiltinFn = fn(&[Value]) -> IResult<Value>;

pub enum Object {
    Integer(Cell<i64>),
    Real(f64),
    Str(String),
    Boolean(bool),
    Null,
    Array(Vec<Value>),
    Hash(RefCell<BTreeMap<HashKey, HashPair>>),
    Function(Function),
    Builtin(Builtin),
    /// Both class descriptors and the objects built from them.
    Instance(ClassInstance),
    Init(InitFunction),
}

/// User function. Methods get one `Function` per instance, each closing
/// over that instance's frame; the literal itself is shared.
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub env: Env,
    pub is_public: bool,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

pub struct ClassInstance {
    pub name: String,
    pub env: Env,
}

/// A class constructor, stored in the class environment under `Init`.
pub struct InitFunction {
    pub constructor: Rc<Constructor>,
    pub env: Env,
}

/// Tag-plus-content key: `1`, `"1"` and `true` never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    Str(String),
}

/// The original key is kept next to the value so `inspect` can print it.
#[derive(Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

thread_local! {
    static NULL: Value = Rc::new(Object::Null);
    static TRUE: Value = Rc::new(Object::Boolean(true));
    static FALSE: Value = Rc::new(Object::Boolean(false));
}

impl Object {
    pub fn integer(n: i64) -> Value {
        Rc::new(Object::Integer(Cell::new(n)))
    }

    pub fn real(r: f64) -> Value {
        Rc::new(Object::Real(r))
    }

    pub fn string<S: Into<String>>(s: S) -> Value {
        Rc::new(Object::Str(s.into()))
    }

    /// Shared `true`/`false` singletons.
    pub fn boolean(b: bool) -> Value {
        if b {
            TRUE.with(Rc::clone)
        } else {
            FALSE.with(Rc::clone)
        }
    }

    pub fn null() -> Value {
        NULL.with(Rc::clone)
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Rc::new(Object::Array(elements))
    }

    pub fn hash(pairs: BTreeMap<HashKey, HashPair>) -> Value {
        Rc::new(Object::Hash(RefCell::new(pairs)))
    }

    /// Name used in diagnostics, e.g. `type mismatch: INTEGER + STRING`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Real(_) => "REAL",
            Object::Str(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Instance(_) => "CLASS_INSTANCE",
            Object::Init(_) => "INIT_FUNCTION",
        }
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(n.get()),
            _ => None,
        }
    }

    /// `None` for values that cannot be used as hash keys.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(HashKey::Integer(n.get())),
            Object::Boolean(b) => Some(HashKey::Boolean(*b)),
            Object::Str(s) => Some(HashKey::Str(s.clone())),
            _ => None,
        }
    }

    /// Human readable rendering used by the REPL, `print` and diagnostics.
    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

/// Shortest decimal form that still reads as a real: `3.0`, `0.5`.
pub fn format_real(r: f64) -> String {
    let mut s = r.to_string();
    if r.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => f.write_str(itoa::Buffer::new().format(n.get())),
            Object::Real(r) => f.write_str(&format_real(*r)),
            Object::Str(s) => f.write_str(s),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Null => f.write_str("null"),
            Object::Array(elements) => {
                write!(f, "[{}]", join(elements.iter().map(|e| e.inspect())))
            }
            Object::Hash(pairs) => {
                let pairs = pairs.borrow();
                let rendered = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()));
                write!(f, "{{{}}}", join(rendered))
            }
            Object::Function(func) => write!(f, "{}", func.literal),
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::Instance(instance) => write!(f, "<{} instance>", instance.name),
            Object::Init(init) => write!(f, "{}", init.constructor),
        }
    }
}

// Environments may hold the function values that capture them, so Debug
// output stops at the value level instead of walking the scope chain.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Str(s) => write!(f, "Str({:?})", s),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}
