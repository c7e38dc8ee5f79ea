//! Log setup: `tracing` events go to stderr so stdout stays clean for output.

use tracing_subscriber::EnvFilter;

/// Level for this workspace's crates given the number of `-v` flags.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` wins when set; otherwise dependencies log at `warn` and argmap
/// crates at the `-v` level.
pub fn filter_for(verbosity: u8, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|s| !s.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    let level = level_for(verbosity);
    EnvFilter::new(format!("warn,argmap={level},argmap_kialo={level}"))
}

pub fn init(verbosity: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = filter_for(verbosity, rust_log.as_deref());
    // A subscriber may already be installed (tests); keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
