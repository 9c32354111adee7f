//! Logging setup.
//!
//! Records go through the `log` facade to an `env_logger` backend on stderr.
//! `RUST_LOG` wins when set; otherwise the level comes from the flags:
//!
//! | flags | level |
//! |-------|-------|
//! | `-q`  | error |
//! | none  | info  |
//! | `-v`  | debug |
//! | `-vv` | trace |
//!
//! Debug builds prefix each line with a timestamp and the module path.
//! Release builds print the level and the message only.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Install the global logger.
///
/// Calling it again is harmless: later calls keep the first logger and
/// return false.
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let mut builder = Builder::new();
    let from_env = env::var_os("RUST_LOG").is_some();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    let detailed = cfg!(debug_assertions);
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if detailed {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!(
            "Logging at {} (from {})",
            log::max_level(),
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
    installed
}

/// Level selected by `-v` / `-q`. Quiet wins.
#[must_use]
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}
