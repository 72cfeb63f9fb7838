#![deny(clippy::expect_used)]
//! BraidLang command-line interface
//!
//! Usage:
//!   braid                 # Start interactive REPL
//!   braid file.br         # Execute a Braid file
//!   braid -e "code"       # Execute a code string
//!   braid --emit-cst file # Dump the parsed CST as JSON

use std::env;
use std::fs;

use braid_lang::repl::editor::colors;
use braid_lang::repl::{history_path, BraidHelper, ReplSession};

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => run_repl(),
        Some("--version") | Some("-V") => println!("braid {}", VERSION),
        Some("--help") | Some("-h") => print_usage(),
        Some("-e") => match args.get(1) {
            Some(code) => run_code(code),
            None => {
                eprintln!("Error: -e requires a code argument");
                std::process::exit(2);
            }
        },
        Some("--emit-cst") => match args.get(1) {
            Some(path) => emit_cst(path),
            None => {
                eprintln!("Error: --emit-cst requires a file argument");
                std::process::exit(2);
            }
        },
        Some(path) => run_file(path),
    }
}

fn print_usage() {
    println!("BraidLang v{}", VERSION);
    println!();
    println!("Usage:");
    println!("  braid                 Start interactive REPL");
    println!("  braid file.br         Execute a Braid file");
    println!("  braid -e \"code\"       Execute a code string");
    println!("  braid --emit-cst file Dump the parsed CST as JSON");
}

fn read_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        std::process::exit(1);
    })
}

fn run_file(path: &str) {
    let source = read_source(path);
    let mut session = ReplSession::new();
    let result = session.eval(&source);
    print!("{}", result.output);
    match result.error {
        Some(error) => {
            eprintln!("{}ERROR:{} {}", colors::ERROR, colors::RESET, error);
            std::process::exit(1);
        }
        None => {
            if let Some(value) = result.value {
                if value != "nil" {
                    println!("{}", value);
                }
            }
        }
    }
}

fn run_code(code: &str) {
    let mut session = ReplSession::new();
    let result = session.eval(code);
    print!("{}", result.output);
    match result.error {
        Some(error) => {
            eprintln!("{}ERROR:{} {}", colors::ERROR, colors::RESET, error);
            std::process::exit(1);
        }
        None => {
            if let Some(value) = result.value {
                println!("{}", value);
            }
        }
    }
}

fn emit_cst(path: &str) {
    let source = read_source(path);
    match braid_lang_parser::parse(&source) {
        Ok(forms) => match serde_json::to_string_pretty(&forms) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing CST: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Parse error: {}", e);
            eprintln!("{}", e.format_with_context(&source));
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  exit, quit     Leave the REPL");
    println!("  reset          Discard session state");
    println!("  vars           List global bindings");
    println!("  ?, help        Show this help");
    println!();
    println!("Multi-line input continues until brackets balance.");
    println!("The last result is bound to `ans`.");
}

fn run_repl() {
    println!("  BraidLang v{} - interactive REPL", VERSION);
    println!("  Type \"?\" for help, \"exit\" to exit.\n");

    let mut session = ReplSession::new();

    let config = Config::builder().bracketed_paste(true).build();
    let mut rl: Editor<BraidHelper, DefaultHistory> = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error: failed to create REPL editor: {}", e);
            std::process::exit(1);
        }
    };
    let helper = BraidHelper::new();
    helper.set_candidates(session.completion_candidates(""));
    rl.set_helper(Some(helper));

    let history_path = history_path();
    if let Some(ref path) = history_path {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline("braid> ") {
            Ok(input) => {
                let trimmed = input.trim();
                match trimmed {
                    "" => continue,
                    "exit" | "quit" | "(exit)" | "(quit)" => break,
                    "?" | "help" => {
                        print_help();
                        continue;
                    }
                    "reset" => {
                        session.reset();
                        println!("Session reset.\n");
                        continue;
                    }
                    "vars" => {
                        for name in session.variable_names() {
                            println!("  {}", name);
                        }
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(&input);

                let result = session.eval(&input);
                if !result.output.is_empty() {
                    print!("{}", result.output);
                }
                match result.error {
                    Some(error) => {
                        eprintln!("{}ERROR:{} {}", colors::ERROR, colors::RESET, error)
                    }
                    None => {
                        if let Some(value) = result.value {
                            println!("{}", value);
                        }
                    }
                }

                if let Some(helper) = rl.helper_mut() {
                    helper.set_candidates(session.completion_candidates(""));
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Editor error: {}", e);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = rl.save_history(path);
    }
}
