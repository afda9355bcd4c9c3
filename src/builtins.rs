//! Native functions consulted after an identifier misses in every scope.

use std::rc::Rc;

use log::debug;

use crate::interpreter::{IResult, InterpretError};
use crate::value::{Builtin, HashPair, Object, Value};

static BUILTINS: &[Builtin] = &[
    Builtin { name: "len", func: len },
    Builtin { name: "first", func: first },
    Builtin { name: "last", func: last },
    Builtin { name: "rest", func: rest },
    Builtin { name: "add", func: add },
    Builtin { name: "remove", func: remove },
    Builtin { name: "print", func: print },
];

/// Builtin value bound to `name`, if any.
pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS
        .iter()
        .find(|builtin| builtin.name == name)
        .map(|builtin| Rc::new(Object::Builtin(*builtin)))
}

fn error<T>(msg: String) -> IResult<T> {
    Err(InterpretError::RuntimeError(msg))
}

fn expect_args(args: &[Value], want: usize) -> IResult<()> {
    if args.len() != want {
        return error(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        ));
    }
    Ok(())
}

fn array_arg<'a>(name: &str, arg: &'a Value) -> IResult<&'a [Value]> {
    match arg.as_ref() {
        Object::Array(elements) => Ok(elements),
        other => error(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        )),
    }
}

fn len(args: &[Value]) -> IResult<Value> {
    expect_args(args, 1)?;

    let n = match args[0].as_ref() {
        Object::Array(elements) => elements.len(),
        Object::Hash(pairs) => pairs.borrow().len(),
        Object::Str(s) => s.len(),
        other => {
            return error(format!(
                "argument to `len` not supported, got {}",
                other.type_name()
            ))
        }
    };

    Ok(Object::integer(n as i64))
}

fn first(args: &[Value]) -> IResult<Value> {
    expect_args(args, 1)?;
    let elements = array_arg("first", &args[0])?;

    Ok(elements.first().cloned().unwrap_or_else(Object::null))
}

fn last(args: &[Value]) -> IResult<Value> {
    expect_args(args, 1)?;
    let elements = array_arg("last", &args[0])?;

    Ok(elements.last().cloned().unwrap_or_else(Object::null))
}

fn rest(args: &[Value]) -> IResult<Value> {
    expect_args(args, 1)?;
    let elements = array_arg("rest", &args[0])?;

    match elements.split_first() {
        Some((_, tail)) => Ok(Object::array(tail.to_vec())),
        None => Ok(Object::null()),
    }
}

fn add(args: &[Value]) -> IResult<Value> {
    let Some(target) = args.first() else {
        return error("wrong number of arguments. got=0, want=2".to_string());
    };

    match target.as_ref() {
        Object::Array(elements) => {
            expect_args(args, 2)?;

            let mut elements = elements.clone();
            elements.push(Rc::clone(&args[1]));

            Ok(Object::array(elements))
        }

        Object::Hash(pairs) => {
            expect_args(args, 3)?;

            let Some(key) = args[1].hash_key() else {
                return error(format!("unusable as hash key: {}", args[1].type_name()));
            };

            let mut pairs = pairs.borrow().clone();
            pairs.insert(
                key,
                HashPair {
                    key: Rc::clone(&args[1]),
                    value: Rc::clone(&args[2]),
                },
            );

            Ok(Object::hash(pairs))
        }

        other => error(format!(
            "argument to `add` must be ARRAY or HASH, got {}",
            other.type_name()
        )),
    }
}

fn remove(args: &[Value]) -> IResult<Value> {
    let Some(target) = args.first() else {
        return error("wrong number of arguments. got=0, want=2".to_string());
    };

    expect_args(args, 2)?;

    match target.as_ref() {
        Object::Array(elements) => {
            if elements.is_empty() {
                return error("length of array must be greater than 0".to_string());
            }

            let index = match args[1].as_integer() {
                Some(i) if i >= 0 && (i as usize) < elements.len() => i as usize,
                Some(_) => {
                    return error(
                        "index parameter must be between 0 and length of arr - 1".to_string(),
                    )
                }
                None => {
                    return error(format!(
                        "index parameter must be INTEGER, got {}",
                        args[1].type_name()
                    ))
                }
            };

            let mut elements = elements.clone();
            elements.remove(index);

            Ok(Object::array(elements))
        }

        Object::Hash(pairs) => {
            if pairs.borrow().is_empty() {
                return error("cannot remove from empty hash".to_string());
            }

            let Some(key) = args[1].hash_key() else {
                return error(format!("unusable as hash key: {}", args[1].type_name()));
            };

            if pairs.borrow_mut().remove(&key).is_none() {
                return error("key not found in hash".to_string());
            }

            Ok(Rc::clone(target))
        }

        other => error(format!(
            "argument to `remove` must be ARRAY or HASH, got {}",
            other.type_name()
        )),
    }
}

fn print(args: &[Value]) -> IResult<Value> {
    debug!("print called with {} argument(s)", args.len());

    for arg in args {
        println!("{}", arg.inspect());
    }

    Ok(Object::null())
}
