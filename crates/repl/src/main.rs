//! benzl - interpreter CLI and REPL
//!
//! Usage:
//!   benzl                      # start the REPL
//!   benzl program.benzl a b    # run a program; "a" and "b" become
//!                              # the `launch-args` list
//!
//! Each REPL line is parsed as an expression list and evaluated as one
//! expression; results print back (errors with their trace). A script
//! runs through the `load` builtin and exits 0 on success, 1 on error.

use benzl_runtime::{Session, error_report};
use clap::Parser as ClapParser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "benzl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "benzl - a small S-expression language", long_about = None)]
struct Cli {
    /// benzl source file to run (starts the REPL when omitted)
    file: Option<PathBuf>,

    /// Extra arguments exposed to the program as `launch-args`
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut session = match Session::new() {
        Ok(session) => session,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    match cli.file {
        Some(file) => process::exit(run_script(&mut session, &file, &cli.args)),
        None => run_repl(&mut session),
    }
}

fn run_script(session: &mut Session, file: &std::path::Path, args: &[String]) -> i32 {
    session.bind_launch_args(args);
    let result = session.load_file(&file.to_string_lossy());
    if result.is_err() {
        eprintln!("{}", error_report(&result));
        return 1;
    }
    0
}

fn run_repl(session: &mut Session) {
    println!(
        "--\nbenzl v{}\nType 'help' for examples of things to try, or 'quit' to exit\n--",
        env!("CARGO_PKG_VERSION")
    );

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to start line editor: {}", e);
            process::exit(1);
        }
    };

    loop {
        match editor.readline("benzl> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                let result = session.eval_line(&line);
                if result.is_err() {
                    println!("{}", error_report(&result));
                } else if !Session::is_silent(&result) {
                    println!("{}", result);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }
}
