#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod cli;
mod commands;
mod manifests;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use commands::handle_command;
use nic2gw_core::instrumentation::init_instrumentation;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_instrumentation(cli.verbose);

    handle_command(&cli)
}
