use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "taskpool=info,taskpool_sync=info,taskpool_core=info";

/// Log to stderr; stdout is reserved for task output. `RUST_LOG` overrides
/// the default filter, `--verbose` bumps the engine crates to debug.
pub fn init(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) if verbose => EnvFilter::new("taskpool=debug,taskpool_sync=debug,taskpool_core=debug"),
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
