use std::path::PathBuf;

use clap::Parser;

/// Run post office input through the update loop and print the final state.
///
/// Input is one command per line:
/// `letter <city> <content...>`, `retrieve <city>`, `cancel <city>`, `clock`.
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Parser)]
#[command(name = "postbox", version, about)]
pub struct Cli {
    /// Config file (default: ~/.config/postbox/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read input from this file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Include every reducer transition in the output
    #[arg(long)]
    pub transcript: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
