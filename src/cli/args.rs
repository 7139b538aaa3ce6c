//! Command-line argument definitions
//!
//! Subcommands for the three payload kinds plus global flags that override
//! the loaded configuration.

use crate::config::{AquamonConfig, MalformedCoordinatePolicy};
use crate::models::Measurement;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aquamon")]
#[command(about = "Normalize sensor coordinates to GeoJSON and downsample sensor series for charting")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum payload files processed at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors, no progress bar
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write compact JSON instead of pretty-printed output
    #[arg(long, global = true)]
    pub compact: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert sensor record arrays into GeoJSON feature collections
    Normalize {
        #[command(flatten)]
        io: IoArgs,

        /// Handling of malformed coordinate strings
        #[arg(long, value_enum)]
        policy: Option<MalformedCoordinatePolicy>,
    },

    /// Downsample `{rawData, config}` series payloads
    Sample {
        #[command(flatten)]
        io: IoArgs,

        /// Window size, overriding the payload's SAMPLING_INTERVAL
        #[arg(long, allow_negative_numbers = true)]
        interval: Option<i64>,
    },

    /// Pull one measurement out of sensor records and downsample it
    Extract {
        #[command(flatten)]
        io: IoArgs,

        /// Measurement to chart
        #[arg(long, value_enum)]
        measurement: Measurement,

        /// Window size (defaults to the configured sampling interval)
        #[arg(long, allow_negative_numbers = true)]
        interval: Option<i64>,
    },
}

#[derive(clap::Args, Debug)]
pub struct IoArgs {
    /// Payload file or directory of payload files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory (defaults to INPUT/processed)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Load the configuration file and apply flag overrides
    pub fn resolve_config(&self) -> Result<AquamonConfig> {
        let mut config =
            AquamonConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(workers) = self.concurrency {
            config = config.with_max_concurrent_workers(workers);
        }
        if self.compact {
            config = config.with_compact_output();
        }
        if let Command::Normalize {
            policy: Some(policy),
            ..
        } = &self.command
        {
            config = config.with_coordinate_policy(*policy);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sample_command() {
        let args = Args::try_parse_from([
            "aquamon", "sample", "data/", "--interval", "5", "-o", "out/", "--verbose",
        ])
        .unwrap();

        assert_eq!(args.get_log_level(), "debug");
        match args.command {
            Command::Sample { io, interval } => {
                assert_eq!(io.input, PathBuf::from("data/"));
                assert_eq!(io.output, Some(PathBuf::from("out/")));
                assert_eq!(interval, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_extract_command() {
        let args = Args::try_parse_from([
            "aquamon",
            "extract",
            "records.json",
            "--measurement",
            "accel-x",
        ])
        .unwrap();

        match args.command {
            Command::Extract { measurement, .. } => assert_eq!(measurement, Measurement::AccelX),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_normalize_flags_and_missing_config() {
        let args = Args::try_parse_from([
            "aquamon",
            "normalize",
            "records.json",
            "--policy",
            "sentinel",
            "--concurrency",
            "3",
            "--config",
            "/nonexistent/config.json",
        ])
        .unwrap();

        // Explicit missing config file is an error
        assert!(args.resolve_config().is_err());

        let args = Args::try_parse_from([
            "aquamon", "normalize", "records.json", "--policy", "skip", "--concurrency", "3",
        ])
        .unwrap();
        match args.command {
            Command::Normalize { policy, .. } => {
                assert_eq!(policy, Some(MalformedCoordinatePolicy::Skip))
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.concurrency, Some(3));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["aquamon", "-q", "-v", "sample", "x.json"]).is_err());
    }

    #[test]
    fn test_compact_flag_disables_pretty_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        let config_path = file.path().to_string_lossy().into_owned();

        let args = Args::try_parse_from([
            "aquamon",
            "normalize",
            "records.json",
            "--config",
            config_path.as_str(),
        ])
        .unwrap();
        assert!(args.resolve_config().unwrap().pretty_output);

        let args = Args::try_parse_from([
            "aquamon",
            "--compact",
            "normalize",
            "records.json",
            "--config",
            config_path.as_str(),
        ])
        .unwrap();
        assert!(!args.resolve_config().unwrap().pretty_output);
    }
}
