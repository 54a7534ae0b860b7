use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TASKSYNC_LOG";

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// `TASKSYNC_LOG` wins when it parses; otherwise `-v` flags pick the level.
pub fn filter_for(verbosity: u8, env_value: Option<&str>) -> EnvFilter {
    env_value
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)))
}

/// Installs the stderr subscriber. Stdout is reserved for command output.
pub fn init(verbosity: u8) {
    let env_value = std::env::var(LOG_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity, env_value.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
