//! CLI argument definitions for flatstore-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use flatstore_core::config::FlatstoreConfig;

/// Flatstore event archiving daemon.
///
/// Reads newline-delimited JSON events, flattens them into Parquet rows,
/// and uploads rotated batches to blob storage.
#[derive(Parser, Debug)]
#[command(name = "flatstore-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to flatstore.toml configuration file.
    ///
    /// Without it, defaults and environment variables are used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input file with one JSON event per line (`-` for stdin).
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Convert the input into a single local Parquet file instead of
    /// rotating and uploading batches.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Upload the open batch when the input ends.
    #[arg(long)]
    pub flush_on_shutdown: bool,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut FlatstoreConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if self.flush_on_shutdown {
            config.batch.flush_on_shutdown = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        DaemonCli::command().debug_assert();
    }

    #[test]
    fn defaults_read_stdin() {
        let cli = DaemonCli::parse_from(["flatstore-daemon"]);
        assert_eq!(cli.input, "-");
        assert!(cli.config.is_none());
        assert!(cli.output_file.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn overrides_take_precedence() {
        let cli = DaemonCli::parse_from([
            "flatstore-daemon",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--flush-on-shutdown",
        ]);
        let mut config = FlatstoreConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "pretty");
        assert!(config.batch.flush_on_shutdown);
    }

    #[test]
    fn absent_overrides_keep_config() {
        let cli = DaemonCli::parse_from(["flatstore-daemon", "-i", "events.ndjson"]);
        let mut config = FlatstoreConfig::default();
        config.batch.flush_on_shutdown = true;
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.log_level, "info");
        assert!(config.batch.flush_on_shutdown);
        assert_eq!(cli.input, "events.ndjson");
    }
}
