use crate::value::{Function, HashPair, Object, Value};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a scope frame.
pub type Env = Rc<RefCell<Environment>>;

/// One lexical scope frame: local bindings plus an optional parent.
///
/// The parent link is fixed at construction; frames form a tree.
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh root frame behind a shared handle.
    pub fn new_env() -> Env {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// A fresh child frame of `enclosing` behind a shared handle.
    pub fn enclosed(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Look `name` up locally, then in each ancestor.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(Rc::clone(value))
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn set(&mut self, name: &str, value: Value) {
        debug!("set {} = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Rebind `name` in the nearest frame that already defines it.
    /// Returns `false` when no frame does.
    pub fn update(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            debug!("update {} = {}", name, value);
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().update(name, value)
        } else {
            false
        }
    }

    /// Resolve `name` in the root ancestor only (`this.name`).
    pub fn get_outermost(&self, name: &str) -> Option<Value> {
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_outermost(name),
            None => self.values.get(name).cloned(),
        }
    }

    /// Rebind `name` in the root ancestor only. Returns `false` when the root
    /// does not define it.
    pub fn update_outermost(&mut self, name: &str, value: Value) -> bool {
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().update_outermost(name, value),
            None => self.update(name, value),
        }
    }

    pub fn is_root(&self) -> bool {
        self.enclosing.is_none()
    }

    /// Copy of the local bindings in a new parentless frame.
    ///
    /// Integers and containers are duplicated, element by element, so two
    /// snapshots of one class never share field storage. Functions and
    /// instances stay shared.
    pub fn detached_copy(&self) -> Environment {
        let values = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), fresh_storage(value)))
            .collect();

        Environment {
            values,
            enclosing: None,
        }
    }
}

/// Builds an instance frame from a class frame.
///
/// Every function closing over `template` is replaced by its own copy
/// closing over the new frame, so a method reached through a plain call
/// such as `helper()` still sees the instance it runs for.
pub fn instantiate(template: &Env) -> Env {
    let instance = Rc::new(RefCell::new(template.borrow().detached_copy()));

    {
        let mut frame = instance.borrow_mut();
        for value in frame.values.values_mut() {
            let rebound = match value.as_ref() {
                Object::Function(func) if Rc::ptr_eq(&func.env, template) => {
                    Some(Rc::new(Object::Function(Function {
                        literal: Rc::clone(&func.literal),
                        env: Rc::clone(&instance),
                        is_public: func.is_public,
                    })))
                }
                _ => None,
            };

            if let Some(rebound) = rebound {
                *value = rebound;
            }
        }
    }

    instance
}

/// Root frame of the chain `env` belongs to.
pub fn root_of(env: &Env) -> Env {
    let mut current = Rc::clone(env);
    loop {
        let parent = current.borrow().enclosing.clone();
        match parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

fn fresh_storage(value: &Value) -> Value {
    match value.as_ref() {
        Object::Integer(n) => Object::integer(n.get()),
        Object::Array(elements) => Object::array(elements.iter().map(fresh_storage).collect()),
        Object::Hash(pairs) => Object::hash(
            pairs
                .borrow()
                .iter()
                .map(|(key, pair)| {
                    let pair = HashPair {
                        key: fresh_storage(&pair.key),
                        value: fresh_storage(&pair.value),
                    };
                    (key.clone(), pair)
                })
                .collect(),
        ),
        _ => Rc::clone(value),
    }
}

// Bindings can hold closures over this very frame; print names only.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
