use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global tracing subscriber. Logs go to stderr so converted
/// manifests on stdout stay clean. `RUST_LOG` wins over `verbose`.
pub fn init_instrumentation(verbose: bool) {
    INIT.call_once(|| {
        let default_directive = if verbose { "debug" } else { "info" };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_directive)),
            )
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {error}");
        }
    });
}
