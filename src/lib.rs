pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod parser;
pub mod repl;
pub mod scanner;
pub mod token;
pub mod value;

use ast::Program;
use scanner::Scanner;

/// Scan and parse `source` in one go.
pub fn parse_source(source: &str) -> (Program, Vec<String>) {
    parser::parse(Scanner::new(source))
}
