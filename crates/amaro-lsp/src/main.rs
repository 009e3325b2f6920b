// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Amaro language server.
//!
//! With no subcommand, speaks LSP over stdio: diagnostics on open/change and
//! a block/struct/field outline. `check` runs the same analysis over files
//! from the command line. Logs go to stderr so they never mix with the
//! protocol stream.

mod backend;
mod check;
mod convert;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tower_lsp::{LspService, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use backend::Backend;

#[derive(Parser)]
#[command(name = "amaro-lsp", version, about = "Language server for Amaro routing descriptions")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze files and print their diagnostics
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn serve() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        info!(version = env!("CARGO_PKG_VERSION"), "starting language server on stdio");
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let (service, socket) = LspService::new(Backend::new);
        Server::new(stdin, stdout, socket).serve(service).await;
    });
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Command::Check { files, format }) => check::run(&files, format).exit_code(),
        None => serve(),
    }
}
