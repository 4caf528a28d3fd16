use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{apply, config, preview, scan, session, tokens};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "tokenswap")]
#[command(version = VERSION)]
#[command(about = "Bulk find/replace for design-token bindings")]
struct Cli {
    /// Use this tokenswap.json instead of the global one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect token bindings under the selection (or --root nodes)
    Scan(scan::ScanArgs),
    /// List the tokens of one group
    Tokens(tokens::TokensArgs),
    /// Preview a find/replace over bound token names
    Preview(preview::PreviewArgs),
    /// Apply a find/replace and rebind matching nodes
    Apply(apply::ApplyArgs),
    /// Replay a script of session events (scan, preview, apply, undo, redo)
    Session(session::SessionArgs),
    /// Show tokenswap configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
