use clap::{Parser, Subcommand};
use nic2gw_api::constants::{DEFAULT_GATEWAY_CLASS, DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT};
use nic2gw_core::notifications::Severity;
use std::path::PathBuf;
use strum::Display;

#[derive(Parser)]
#[command(
    name = "nic2gw",
    about = "Convert NGINX Ingress Controller resources to Gateway API resources",
    version,
    long_about = "Reads VirtualServer, VirtualServerRoute, TransportServer and GlobalConfiguration \
                  manifests and prints the equivalent Gateway API objects, along with a report of \
                  everything that could not be converted."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Lowest notification severity that makes the command exit non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailOn {
    Never,
    Warning,
    Error,
}

impl FailOn {
    pub fn is_reached(self, highest: Option<Severity>) -> bool {
        let threshold = match self {
            FailOn::Never => return false,
            FailOn::Warning => Severity::Warning,
            FailOn::Error => Severity::Error,
        };
        highest.is_some_and(|severity| severity >= threshold)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert NGINX manifests to Gateway API manifests
    Convert {
        /// Manifest files to read; `-` reads standard input
        #[arg(short = 'f', long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "yaml")]
        output: OutputFormat,

        /// Exit non-zero when a notification of this severity or higher is reported
        #[arg(long, default_value = "never")]
        fail_on: FailOn,

        /// GatewayClass used when no VirtualServer names an ingress class
        #[arg(long, env = "NIC2GW_GATEWAY_CLASS", default_value = DEFAULT_GATEWAY_CLASS)]
        gateway_class: String,

        /// Port of generated HTTP listeners
        #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
        http_port: u16,

        /// Port of generated HTTPS listeners
        #[arg(long, default_value_t = DEFAULT_HTTPS_PORT)]
        https_port: u16,
    },
}
