mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use mumu_lang::dynamics::eval::InterpreterOptions;
use mumu_lang::mumu;
use mumu_lang::statics::default_typing_context;
use std::io::Read;
use std::path::PathBuf;

fn main() {
    let code = match Cli::parse().command {
        Commands::Run { file, types, quiet } => drive(file, false, types, quiet),
        Commands::Check { file } => drive(file, true, false, false),
    };
    std::process::exit(code);
}

fn drive(file: Option<PathBuf>, dry_run: bool, types: bool, quiet: bool) -> i32 {
    let input = match read_input(file) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Error reading program:");
            eprintln!("{}", err);
            return 1;
        }
    };
    let mut ctx = default_typing_context();
    let mut parsed = match mumu::parse(&input, &mut ctx) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("Error parsing program:");
            eprintln!("Parse error: {}", err);
            return 1;
        }
    };
    if let Err(err) = mumu::typecheck(&mut parsed, &mut ctx) {
        eprintln!("Error typing program:");
        eprintln!("Type error: {}", err);
        return 2;
    }
    if dry_run {
        return 0;
    }
    let options = if quiet {
        InterpreterOptions { print_results: true, ..Default::default() }
    } else {
        InterpreterOptions {
            print_definitions: true,
            print_start: true,
            print_intermediate: true,
            print_results: true,
            print_info: true,
            print_types: types,
        }
    };
    let mut out = std::io::stdout();
    if let Err(err) = mumu::run(parsed, &ctx, options, &mut out) {
        eprintln!("Error running program:");
        eprintln!("Interpreter error: {}", err);
        return 3;
    }
    0
}

fn read_input(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|err| format!("{}: {}", path.display(), err)),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|err| err.to_string())?;
            Ok(buf)
        }
    }
}
