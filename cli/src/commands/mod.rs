pub mod convert;

use anyhow::Result;
use nic2gw_core::ConversionOptions;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};
use crate::commands::convert::{ConvertArgs, handle_convert_command};

/// Main command dispatcher
pub fn handle_command(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Convert {
            files,
            output,
            fail_on,
            gateway_class,
            http_port,
            https_port,
        } => {
            let args = ConvertArgs {
                files,
                output: *output,
                fail_on: *fail_on,
                options: ConversionOptions::builder()
                    .gateway_class(gateway_class.as_str())
                    .http_port(*http_port)
                    .https_port(*https_port)
                    .build(),
            };
            let failed =
                handle_convert_command(&args, &mut std::io::stdout().lock(), &mut std::io::stderr().lock())?;
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}
