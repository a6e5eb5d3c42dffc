//! Logging init: structured `tracing` output on stderr.
//!
//! Console report lines go to stdout through [`output`](crate::output); the
//! log is diagnostics only and stays quiet unless asked.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `wallname=debug`.
pub const LOG_ENV: &str = "WALLNAME_LOG";

/// Default filter for a `-v` count: `warn`, then `info`, then `debug`.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,wallname=info",
        _ => "info,wallname=debug",
    }
}

/// Install the global subscriber. `WALLNAME_LOG` wins over `verbosity`.
pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "warn,wallname=info");
        assert_eq!(default_directive(2), "info,wallname=debug");
        assert_eq!(default_directive(9), "info,wallname=debug");
    }

    #[test]
    fn default_directives_parse() {
        for v in 0..3 {
            assert!(default_directive(v).parse::<EnvFilter>().is_ok());
        }
    }
}
