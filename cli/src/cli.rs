use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse, typecheck and run a program
    Run {
        /// Path to the program (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
        /// Print types in definitions and initial statements
        #[arg(short, long, default_value_t = false)]
        types: bool,
        /// Only print results, not the reduction trace
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },
    /// Parse and typecheck a program
    Check {
        /// Path to the program (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}
