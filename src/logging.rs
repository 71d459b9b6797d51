use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the logger with elapsed-time prefixes.
///
/// Verbosity 0 logs warnings, 1 (`-v`) adds progress, 2+ (`-vv`) adds timings.
/// `RUST_LOG` is applied on top of the level chosen here.
/// Output format: [HH:MM:SS] LEVEL: message, on stderr.
pub fn init_logger(verbosity: u8) {
    let start = *START_TIME.get_or_init(Instant::now);

    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                format_elapsed(start.elapsed()),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Log how long a named stage took, at debug level.
pub fn log_timing(label: &str, elapsed: Duration) {
    log::debug!("[timing] {}: {:.3} ms", label, elapsed.as_secs_f64() * 1000.0);
}
