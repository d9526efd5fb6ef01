//! Logging initialization for flatstore-daemon.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `FlatstoreConfig`. `RUST_LOG` takes precedence over the configured level.
//!
//! The configured level applies to the flatstore crates. Other targets, such as
//! the object store HTTP clients and the Parquet encoder, are capped at `warn`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flatstore_core::config::GeneralConfig;

/// Crate targets that follow `general.log_level`.
const FLATSTORE_TARGETS: [&str; 3] = ["flatstore_core", "flatstore_parquet_sink", "flatstore_daemon"];

/// Level for every target outside [`FLATSTORE_TARGETS`].
const DEPENDENCY_LEVEL: &str = "warn";

/// Build the filter directives used when `RUST_LOG` is unset.
///
/// `error` and `off` also apply to dependencies so they are never louder
/// than the flatstore crates.
pub fn default_directives(level: &str) -> String {
    let base = match level {
        "error" | "off" => level,
        _ => DEPENDENCY_LEVEL,
    };
    let mut directives = base.to_owned();
    for target in FLATSTORE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default)
/// * `"pretty"` - Human-readable output for development
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    // 로그는 stderr로 보냅니다. stdout은 입력/출력 파이프에 쓰일 수 있습니다.
    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
                })?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    }

    Ok(())
}
