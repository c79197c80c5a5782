use crate::cli::{FailOn, OutputFormat};
use crate::manifests::Manifests;
use crate::output::{render, write_report};
use anyhow::{Context, Result};
use nic2gw_core::notifications::Severity;
use nic2gw_core::{ConversionOptions, convert};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct ConvertArgs<'a> {
    pub files: &'a [PathBuf],
    pub output: OutputFormat,
    pub fail_on: FailOn,
    pub options: ConversionOptions,
}

/// Returns whether the run reached the `--fail-on` threshold.
pub fn handle_convert_command(
    args: &ConvertArgs<'_>,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<bool> {
    let mut manifests = Manifests::default();
    for file in args.files {
        manifests.read_file(file)?;
    }
    let input = manifests.into_input();
    info!(
        "Loaded {} VirtualServers, {} VirtualServerRoutes and {} TransportServers",
        input.virtual_servers().len(),
        input.virtual_server_routes().len(),
        input.transport_servers().len()
    );

    let (ir, notifications) = convert(&input, &args.options).into_parts();

    for (key, extension) in ir.extensions() {
        info!("Route {} carries NGINX upstream settings with no Gateway API field", key);
        debug!(route = %key, ?extension, "Upstream settings");
    }

    let rendered = render(&ir, args.output).context("rendering converted objects")?;
    stdout.write_all(rendered.as_bytes())?;
    write_report(&notifications, stderr)?;

    info!(
        "{} errors, {} warnings, {} infos",
        notifications.count(Severity::Error),
        notifications.count(Severity::Warning),
        notifications.count(Severity::Info)
    );

    Ok(args.fail_on.is_reached(notifications.max_severity()))
}
