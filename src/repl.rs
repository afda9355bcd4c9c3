//! Line-oriented read–eval–print loop.
//!
//! Every line is parsed and evaluated against one shared top-level
//! environment, so bindings survive from line to line. Generic over its
//! input and output so tests can drive it with in-memory buffers.

use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::environment::{Env, Environment};
use crate::interpreter::{Evaluator, InterpretError};

pub const PROMPT: &str = ">> ";

/// Input line that ends the session.
pub const QUIT: &str = "quit";

/// Write parser errors under the ` parser errors:` header, one per line.
pub fn print_parser_errors<W: Write>(out: &mut W, errors: &[String]) -> io::Result<()> {
    writeln!(out, " parser errors:")?;
    for msg in errors {
        writeln!(out, "\t- {}", msg)?;
    }
    Ok(())
}

pub struct Repl {
    evaluator: Evaluator,
    env: Env,
}

impl Repl {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            env: Environment::new_env(),
        }
    }

    /// The session's top-level environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Reads lines until EOF or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        info!("REPL started");

        let mut lines = input.lines();

        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            if line.trim() == QUIT {
                break;
            }

            self.eval_line(&line, out)?;
        }

        info!("REPL finished");
        Ok(())
    }

    /// Evaluates one line, echoing its result unless it is `null`.
    pub fn eval_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<()> {
        let (program, errors) = crate::parse_source(line);

        if !errors.is_empty() {
            debug!("Skipping line with {} parser error(s)", errors.len());
            return print_parser_errors(out, &errors);
        }

        match self.evaluator.eval_program(&program, &self.env) {
            Ok(value) if value.is_null() => Ok(()),
            Ok(value) => writeln!(out, "{}", value.inspect()),
            Err(e @ InterpretError::RuntimeError(_)) => writeln!(out, "{}", e),
            Err(InterpretError::ReturnSignal(value)) => writeln!(out, "{}", value.inspect()),
        }
    }
}
