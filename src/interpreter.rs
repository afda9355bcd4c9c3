use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::ast::{
    BlockStatement, ClassStatement, Expression, FunctionDeclaration, Identifier, InfixOperator,
    PrefixOperator, Program, Statement,
};
use crate::builtins;
use crate::environment::{instantiate, root_of, Env, Environment};
use crate::loader::{FsLoader, SourceLoader};
use crate::value::{ClassInstance, Function, HashPair, InitFunction, Object, Value};

/// Name the constructor is bound under inside a class environment.
pub const INIT_BINDING: &str = "Init";

/// Non-local outcome of evaluating a node.
///
/// A `return` travels outward as `ReturnSignal` until a function call (or
/// the program) unwraps it; a `RuntimeError` travels all the way up.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("ERROR: {0}")]
    RuntimeError(String),

    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),
}

impl InterpretError {
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        InterpretError::RuntimeError(msg.into())
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

fn fail<T, S: Into<String>>(msg: S) -> IResult<T> {
    Err(InterpretError::runtime(msg))
}

/// Tree-walking evaluator.
///
/// Holds no program state itself; every binding lives in the [`Env`] passed
/// in, so one environment can be threaded through many calls (the REPL does
/// exactly that).
pub struct Evaluator {
    loader: Box<dyn SourceLoader>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Evaluator that loads missing classes from the working directory.
    pub fn new() -> Self {
        Self::with_loader(FsLoader::default())
    }

    pub fn with_loader<L: SourceLoader + 'static>(loader: L) -> Self {
        info!("Initializing Evaluator");

        Self {
            loader: Box::new(loader),
        }
    }

    /// Runs a program. A top-level `return` ends it early with its value.
    pub fn eval_program(&self, program: &Program, env: &Env) -> IResult<Value> {
        debug!("Evaluating {} statements", program.statements.len());

        let mut result = Object::null();

        for stmt in &program.statements {
            match self.eval_statement(stmt, env) {
                Ok(value) => result = value,
                Err(InterpretError::ReturnSignal(value)) => return Ok(value),
                Err(e) => return Err(e),
            }
        }

        info!("Program evaluated to: {}", result);
        Ok(result)
    }

    /// Runs statements in `env` without opening a new frame. The value is
    /// the last statement's.
    pub fn eval_block(&self, block: &BlockStatement, env: &Env) -> IResult<Value> {
        let mut result = Object::null();

        for stmt in &block.statements {
            result = self.eval_statement(stmt, env)?;
        }

        Ok(result)
    }

    pub fn eval_statement(&self, stmt: &Statement, env: &Env) -> IResult<Value> {
        match stmt {
            Statement::Var { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.borrow_mut().set(&name.name, value);
                Ok(Object::null())
            }

            Statement::Return(expr) => {
                let value = self.eval_expression(expr, env)?;
                debug!("Return signal with value: {}", value);
                Err(InterpretError::ReturnSignal(value))
            }

            Statement::Expression(expr) => self.eval_expression(expr, env),

            Statement::Function(decl) => {
                debug!("Defining function '{}'", decl.name);
                let function = make_function(decl, env);
                env.borrow_mut().set(&decl.name.name, function);
                Ok(Object::null())
            }

            Statement::Class(class) => {
                self.eval_class_statement(class, env)?;
                Ok(Object::null())
            }
        }
    }

    pub fn eval_expression(&self, expr: &Expression, env: &Env) -> IResult<Value> {
        match expr {
            Expression::Identifier(ident) => eval_identifier(ident, env),

            Expression::Null => Ok(Object::null()),
            Expression::Integer(n) => Ok(Object::integer(*n)),
            Expression::Real(r) => Ok(Object::real(*r)),
            Expression::Str(s) => Ok(Object::string(s.as_str())),
            Expression::Boolean(b) => Ok(Object::boolean(*b)),

            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right, env)?;
                eval_prefix(*operator, &right)
            }

            Expression::Infix {
                left,
                operator: InfixOperator::Assign,
                right,
            } => self.eval_assignment(left, right, env),

            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                eval_infix(*operator, &left, &right)
            }

            Expression::If {
                branches,
                alternative,
            } => {
                for branch in branches {
                    let condition = self.eval_expression(&branch.condition, env)?;
                    if condition.is_truthy() {
                        return self.eval_block(&branch.consequence, env);
                    }
                }

                match alternative {
                    Some(block) => self.eval_block(block, env),
                    None => Ok(Object::null()),
                }
            }

            Expression::Function(literal) => Ok(Rc::new(Object::Function(Function {
                literal: Rc::clone(literal),
                env: Rc::clone(env),
                is_public: true,
            }))),

            Expression::Call {
                function,
                arguments,
            } => {
                let function = self.eval_expression(function, env)?;
                let args = self.eval_expressions(arguments, env)?;
                self.apply_function(&function, args)
            }

            Expression::Array(elements) => {
                let elements = self.eval_expressions(elements, env)?;
                Ok(Object::array(elements))
            }

            Expression::Index { left, index } => {
                let left = self.eval_expression(left, env)?;
                let index = self.eval_expression(index, env)?;
                eval_index(&left, &index)
            }

            Expression::Hash(pairs) => self.eval_hash_literal(pairs, env),

            Expression::RangeFor {
                variable,
                from,
                to,
                body,
            } => {
                let from = self.loop_bound("from", from, env)?;
                let to = self.loop_bound("to", to, env)?;

                debug!("Counting loop from {} to {}", from, to);

                if from < to {
                    self.run_loop(variable, (from..to).map(Object::integer), body, env)
                } else {
                    // downward: `from` included, `to` excluded
                    let values = (to..from).rev().map(|i| Object::integer(i + 1));
                    self.run_loop(variable, values, body, env)
                }
            }

            Expression::CollectionFor {
                variable,
                collection,
                body,
            } => {
                let target = env.borrow().get(&collection.name);
                let Some(target) = target else {
                    return fail(format!("{} is not defined", collection.name));
                };

                let Object::Array(elements) = target.as_ref() else {
                    return fail(format!(
                        "'in' target of forloop was not ARRAY. got={}",
                        target.type_name()
                    ));
                };

                self.run_loop(variable, elements.iter().cloned(), body, env)
            }

            Expression::New { class, arguments } => self.eval_new(class, arguments, env),

            Expression::MethodCall {
                object,
                method,
                arguments,
            } => self.eval_method_call(object, method, arguments, env),

            Expression::Increment(ident) => step_integer(ident, env, 1),
            Expression::Decrement(ident) => step_integer(ident, env, -1),
        }
    }

    /// Evaluate left to right, stopping at the first failure.
    fn eval_expressions(&self, exprs: &[Expression], env: &Env) -> IResult<Vec<Value>> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    /// Calls a function or builtin with already evaluated arguments.
    pub fn apply_function(&self, function: &Value, args: Vec<Value>) -> IResult<Value> {
        match function.as_ref() {
            Object::Function(func) => {
                let params = &func.literal.parameters;

                if params.len() != args.len() {
                    return fail(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        params.len()
                    ));
                }

                let call_env = Environment::enclosed(&func.env);

                for (param, arg) in params.iter().zip(args) {
                    call_env.borrow_mut().set(&param.name, arg);
                }

                match self.eval_block(&func.literal.body, &call_env) {
                    Err(InterpretError::ReturnSignal(value)) => Ok(value),
                    other => other,
                }
            }

            Object::Builtin(builtin) => {
                debug!("Calling builtin '{}'", builtin.name);
                (builtin.func)(&args)
            }

            other => fail(format!("not a function: {}", other.type_name())),
        }
    }

    fn eval_assignment(&self, left: &Expression, right: &Expression, env: &Env) -> IResult<Value> {
        let Expression::Identifier(ident) = left else {
            return fail(format!(
                "left side of assignment is not an identifier. got={}",
                left
            ));
        };

        let value = self.eval_expression(right, env)?;

        if ident.this_prefixed {
            if !env
                .borrow_mut()
                .update_outermost(&ident.name, Rc::clone(&value))
            {
                return fail(format!(
                    "{} is not defined. Try to remove 'this.'",
                    ident.name
                ));
            }
        } else if !env.borrow_mut().update(&ident.name, Rc::clone(&value)) {
            return fail(format!("{} is not defined", ident.name));
        }

        Ok(value)
    }

    fn eval_hash_literal(&self, pairs: &[(Expression, Expression)], env: &Env) -> IResult<Value> {
        let mut map = BTreeMap::new();

        for (key_expr, value_expr) in pairs {
            let key = self.eval_expression(key_expr, env)?;

            let Some(hash_key) = key.hash_key() else {
                return fail(format!("unusable as hash key: {}", key.type_name()));
            };

            let value = self.eval_expression(value_expr, env)?;

            map.insert(hash_key, HashPair { key, value });
        }

        Ok(Object::hash(map))
    }

    fn loop_bound(&self, which: &str, expr: &Expression, env: &Env) -> IResult<i64> {
        let value = self.eval_expression(expr, env)?;

        match value.as_integer() {
            Some(n) => Ok(n),
            None => fail(format!(
                "'{}' expression in forloop was not integer. got={}",
                which,
                value.type_name()
            )),
        }
    }

    /// Runs `body` once per value, rebinding `variable` in one child frame
    /// shared by every iteration.
    fn run_loop<V>(
        &self,
        variable: &Identifier,
        values: V,
        body: &BlockStatement,
        env: &Env,
    ) -> IResult<Value>
    where
        V: Iterator<Item = Value>,
    {
        let loop_env = Environment::enclosed(env);
        loop_env.borrow_mut().set(&variable.name, Object::null());

        let mut result = Object::null();

        for value in values {
            loop_env.borrow_mut().set(&variable.name, value);
            result = self.eval_block(body, &loop_env)?;
        }

        Ok(result)
    }

    // ───────────────────────── classes and objects ─────────────────────────

    /// Builds the class descriptor and binds it in the declaring scope.
    fn eval_class_statement(&self, class: &ClassStatement, env: &Env) -> IResult<Value> {
        let class_env = Environment::new_env();

        for field in &class.fields {
            let value = self.eval_expression(&field.value, &class_env)?;
            class_env.borrow_mut().set(&field.name.name, value);
        }

        for method in &class.methods {
            let function = make_function(method, &class_env);
            class_env.borrow_mut().set(&method.name.name, function);
        }

        if let Some(constructor) = &class.constructor {
            let init = Rc::new(Object::Init(InitFunction {
                constructor: Rc::clone(constructor),
                env: Rc::clone(&class_env),
            }));
            class_env.borrow_mut().set(INIT_BINDING, init);
        }

        let descriptor = Rc::new(Object::Instance(ClassInstance {
            name: class.name.name.clone(),
            env: class_env,
        }));

        env.borrow_mut()
            .set(&class.name.name, Rc::clone(&descriptor));

        info!(
            "Registered class {} ({} fields, {} methods)",
            class.name,
            class.fields.len(),
            class.methods.len()
        );

        Ok(descriptor)
    }

    /// Resolves `name` through the source loader by evaluating the unit
    /// that defines it in `env`.
    fn load_class(&self, name: &str, env: &Env) -> IResult<Value> {
        let missing = || format!("There is no Class called: {}", name);

        let source = match self.loader.load(name) {
            Ok(source) => source,
            Err(e) => {
                debug!("Loading class {} failed: {}", name, e);
                return fail(missing());
            }
        };

        info!("Loading class {} from its source unit", name);

        let (program, errors) = crate::parse_source(&source);
        for msg in &errors {
            warn!("parser error in unit {}: {}", name, msg);
        }

        self.eval_program(&program, env)?;

        let resolved = env.borrow().get(name);
        resolved.ok_or_else(|| InterpretError::runtime(missing()))
    }

    fn eval_new(&self, class: &Identifier, arguments: &[Expression], env: &Env) -> IResult<Value> {
        let found = env.borrow().get(&class.name);

        let descriptor = match found {
            Some(value) => value,
            None => self.load_class(&class.name, env)?,
        };

        let Object::Instance(template) = descriptor.as_ref() else {
            return fail(format!("{} is not a class", class.name));
        };

        let instance_env = instantiate(&template.env);

        let init = instance_env.borrow().get(INIT_BINDING);

        let Some(init) = init else {
            if !arguments.is_empty() {
                return fail(format!(
                    "Number of arguments in {} should be 0. got {}",
                    class.name,
                    arguments.len()
                ));
            }

            debug!("Created {} instance without constructor", class.name);
            return Ok(new_instance(&template.name, instance_env));
        };

        let Object::Init(init) = init.as_ref() else {
            return fail(format!("{} of {} is not a constructor", INIT_BINDING, class.name));
        };

        let params = &init.constructor.parameters;

        if params.len() != arguments.len() {
            return fail(format!(
                "wrong number of arguments. got={}, want={}",
                arguments.len(),
                params.len()
            ));
        }

        let frame = Environment::enclosed(&instance_env);

        for (param, arg) in params.iter().zip(arguments) {
            if param.this_bound {
                let value = self.eval_expression(arg, &instance_env)?;

                if !instance_env.borrow_mut().update(&param.name.name, value) {
                    return fail(format!(
                        "{} is not a field of {}",
                        param.name.name, class.name
                    ));
                }
            } else {
                let value = self.eval_expression(arg, env)?;
                frame.borrow_mut().set(&param.name.name, value);
            }
        }

        match self.eval_block(&init.constructor.body, &frame) {
            Ok(_) | Err(InterpretError::ReturnSignal(_)) => {}
            Err(e) => return Err(e),
        }

        debug!("Constructed {} instance", class.name);

        Ok(new_instance(&template.name, instance_env))
    }

    fn eval_method_call(
        &self,
        object: &Identifier,
        method: &Identifier,
        arguments: &[Expression],
        env: &Env,
    ) -> IResult<Value> {
        let target = env.borrow().get(&object.name);
        let Some(target) = target else {
            return fail(format!("{} is not defined", object.name));
        };

        let Object::Instance(instance) = target.as_ref() else {
            return fail(format!(
                "{} is not an object. got={}",
                object.name,
                target.type_name()
            ));
        };

        let found = instance.env.borrow().get(&method.name);
        let Some(function) = found else {
            return fail(format!("{} is not a defined method", method.name));
        };

        let Object::Function(func) = function.as_ref() else {
            return fail(format!(
                "{} is not a defined method. got={}",
                method.name,
                function.type_name()
            ));
        };

        if !func.is_public && !Rc::ptr_eq(&root_of(env), &instance.env) {
            return fail(format!(
                "{} is not a public function in {}",
                method.name, object.name
            ));
        }

        let args = self.eval_expressions(arguments, &instance.env)?;

        self.apply_function(&function, args)
    }
}

fn make_function(decl: &FunctionDeclaration, env: &Env) -> Value {
    Rc::new(Object::Function(Function {
        literal: Rc::clone(&decl.function),
        env: Rc::clone(env),
        is_public: decl.is_public,
    }))
}

fn new_instance(name: &str, env: Env) -> Value {
    Rc::new(Object::Instance(ClassInstance {
        name: name.to_string(),
        env,
    }))
}

fn eval_identifier(ident: &Identifier, env: &Env) -> IResult<Value> {
    if ident.this_prefixed {
        let found = env.borrow().get_outermost(&ident.name);
        return found.ok_or_else(|| {
            InterpretError::runtime(format!(
                "identifier not found: '{}'. Try to remove 'this.'",
                ident.name
            ))
        });
    }

    let found = env.borrow().get(&ident.name);

    found
        .or_else(|| builtins::lookup(&ident.name))
        .ok_or_else(|| InterpretError::runtime(format!("identifier not found: {}", ident.name)))
}

/// `i++` / `i--`: mutates the bound integer in place and returns it.
fn step_integer(ident: &Identifier, env: &Env, delta: i64) -> IResult<Value> {
    let found = env.borrow().get(&ident.name);
    let Some(value) = found else {
        return fail(format!("{} is not defined", ident.name));
    };

    let Object::Integer(cell) = value.as_ref() else {
        let op = if delta > 0 { "++" } else { "--" };
        return fail(format!("unknown operator: {}{}", value.type_name(), op));
    };

    cell.set(cell.get().wrapping_add(delta));
    env.borrow_mut().update(&ident.name, Rc::clone(&value));

    Ok(value)
}

fn eval_prefix(operator: PrefixOperator, right: &Value) -> IResult<Value> {
    match operator {
        PrefixOperator::Bang => Ok(Object::boolean(match right.as_ref() {
            Object::Boolean(b) => !b,
            Object::Null => true,
            _ => false,
        })),

        PrefixOperator::Minus => match right.as_ref() {
            Object::Integer(n) => Ok(Object::integer(n.get().wrapping_neg())),
            Object::Real(r) => Ok(Object::real(-r)),
            other => fail(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn as_real(value: &Object) -> Option<f64> {
    match value {
        Object::Integer(n) => Some(n.get() as f64),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn eval_infix(operator: InfixOperator, left: &Value, right: &Value) -> IResult<Value> {
    match (left.as_ref(), right.as_ref()) {
        (Object::Str(l), Object::Str(r)) => eval_string_infix(operator, l, r),

        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, l.get(), r.get()),

        (l, r) => {
            // any Integer/Real mix promotes to real arithmetic
            if let (Some(l), Some(r)) = (as_real(l), as_real(r)) {
                return eval_real_infix(operator, l, r);
            }

            if l.type_name() != r.type_name() {
                return fail(format!(
                    "type mismatch: {} {} {}",
                    l.type_name(),
                    operator,
                    r.type_name()
                ));
            }

            match operator {
                InfixOperator::Eq => Ok(Object::boolean(same_object(left, right))),
                InfixOperator::NotEq => Ok(Object::boolean(!same_object(left, right))),
                _ => fail(format!(
                    "unknown operator: {} {} {}",
                    l.type_name(),
                    operator,
                    r.type_name()
                )),
            }
        }
    }
}

/// Booleans and nulls compare by value, everything else by identity.
fn same_object(left: &Value, right: &Value) -> bool {
    match (left.as_ref(), right.as_ref()) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        _ => Rc::ptr_eq(left, right),
    }
}

fn eval_string_infix(operator: InfixOperator, l: &str, r: &str) -> IResult<Value> {
    match operator {
        InfixOperator::Plus => Ok(Object::string(format!("{}{}", l, r))),
        InfixOperator::Eq => Ok(Object::boolean(l == r)),
        InfixOperator::NotEq => Ok(Object::boolean(l != r)),
        _ => fail(format!("unknown operator: STRING {} STRING", operator)),
    }
}

fn eval_integer_infix(operator: InfixOperator, l: i64, r: i64) -> IResult<Value> {
    let value = match operator {
        InfixOperator::Plus => Object::integer(l.wrapping_add(r)),
        InfixOperator::Minus => Object::integer(l.wrapping_sub(r)),
        InfixOperator::Multiply => Object::integer(l.wrapping_mul(r)),
        InfixOperator::Divide | InfixOperator::Modulo if r == 0 => {
            return fail(format!("division by zero: {} {} {}", l, operator, r));
        }
        InfixOperator::Divide => Object::integer(l.wrapping_div(r)),
        InfixOperator::Modulo => Object::integer(l.wrapping_rem(r)),
        InfixOperator::Lt => Object::boolean(l < r),
        InfixOperator::Gt => Object::boolean(l > r),
        InfixOperator::Eq => Object::boolean(l == r),
        InfixOperator::NotEq => Object::boolean(l != r),
        InfixOperator::Assign => {
            return fail(format!("unknown operator: INTEGER {} INTEGER", operator));
        }
    };

    Ok(value)
}

fn eval_real_infix(operator: InfixOperator, l: f64, r: f64) -> IResult<Value> {
    let value = match operator {
        InfixOperator::Plus => Object::real(l + r),
        InfixOperator::Minus => Object::real(l - r),
        InfixOperator::Multiply => Object::real(l * r),
        InfixOperator::Divide => Object::real(l / r),
        InfixOperator::Modulo => Object::real(l % r),
        InfixOperator::Lt => Object::boolean(l < r),
        InfixOperator::Gt => Object::boolean(l > r),
        InfixOperator::Eq => Object::boolean(l == r),
        InfixOperator::NotEq => Object::boolean(l != r),
        InfixOperator::Assign => {
            return fail(format!("unknown operator: REAL {} REAL", operator));
        }
    };

    Ok(value)
}

fn eval_index(left: &Value, index: &Value) -> IResult<Value> {
    match (left.as_ref(), index.as_ref()) {
        (Object::Array(elements), Object::Integer(i)) => {
            let element = usize::try_from(i.get())
                .ok()
                .and_then(|i| elements.get(i))
                .cloned();
            Ok(element.unwrap_or_else(Object::null))
        }

        (Object::Hash(pairs), _) => {
            let Some(key) = index.hash_key() else {
                return fail(format!("unusable as hash key: {}", index.type_name()));
            };

            let value = pairs.borrow().get(&key).map(|pair| Rc::clone(&pair.value));
            Ok(value.unwrap_or_else(Object::null))
        }

        (other, _) => fail(format!("index operator not supported: {}", other.type_name())),
    }
}
