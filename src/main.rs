use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use pron::environment::Environment;
use pron::interpreter::{Evaluator, InterpretError};
use pron::loader::{check_source_path, FsLoader};
use pron::repl::{print_parser_errors, Repl};
use pron::scanner::Scanner;
use pron::token::TokenKind;

#[derive(ClapParser, Debug)]
#[command(version, about = "Pron language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is given
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,

    /// Directory searched for `<Class>.pron` units
    #[arg(long, global = true, default_value = ".")]
    class_path: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a .pron program and prints its result
    Run { filename: PathBuf },

    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file and prints its AST
    Parse {
        filename: PathBuf,

        /// Print the AST as JSON instead of source form
        #[arg(long)]
        json: bool,
    },

    /// Starts the interactive prompt (the default)
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // `[module:line] - message`, one record per line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("pron::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn run(filename: &Path, class_path: &Path) -> Result<()> {
    if let Err(e) = check_source_path(filename) {
        debug!("Rejected source path: {}", e);
        println!("ERROR: {}", e);
        std::process::exit(65);
    }

    let source = read_file(filename)?;
    let (program, errors) = pron::parse_source(&source);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !errors.is_empty() {
        // evaluation still proceeds on the partial tree
        print_parser_errors(&mut out, &errors)?;
    }

    let evaluator = Evaluator::with_loader(FsLoader::new(class_path));
    let env = Environment::new_env();

    match evaluator.eval_program(&program, &env) {
        Ok(value) => {
            if !value.is_null() {
                writeln!(out, "{}", value.inspect())?;
            }
            info!("Program executed successfully");
        }

        Err(InterpretError::ReturnSignal(value)) => {
            writeln!(out, "{}", value.inspect())?;
        }

        Err(e) => {
            debug!("Runtime debug: {}", e);
            writeln!(out, "{}", e)?;
            out.flush()?;
            std::process::exit(70);
        }
    }

    Ok(())
}

fn tokenize(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        if token.is(TokenKind::Illegal) {
            tokenized = false;
            eprintln!("[line {}] Error: Unexpected token: {}", token.line, token.literal);
            continue;
        }

        println!("{}", token);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let (program, errors) = pron::parse_source(&source);

    if json {
        let rendered =
            serde_json::to_string_pretty(&program).context("Failed to serialize the AST")?;
        println!("{}", rendered);
    } else {
        println!("{}", program);
    }

    if !errors.is_empty() {
        let stderr = io::stderr();
        print_parser_errors(&mut stderr.lock(), &errors)?;
        std::process::exit(65);
    }

    Ok(())
}

fn repl(class_path: &Path) -> Result<()> {
    let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
    println!("Hello {}! Welcome to Pron-Lang", user);

    let mut repl = Repl::new(Evaluator::with_loader(FsLoader::new(class_path)));

    let stdin = io::stdin();
    let stdout = io::stdout();

    repl.run(stdin.lock(), &mut stdout.lock())
        .context("REPL I/O failed")
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands.unwrap_or(Commands::Repl) {
        Commands::Run { filename } => run(&filename, &args.class_path),
        Commands::Tokenize { filename } => tokenize(&filename),
        Commands::Parse { filename, json } => parse(&filename, json),
        Commands::Repl => repl(&args.class_path),
    }
}
