use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

/// LP — load, check, and format LED plan descriptors.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Raise logging to debug (`-v`) or trace (`-vv`), overriding --log-level.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter; `RUST_LOG` still overrides it at init.
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => self.log_level.parse().unwrap_or(LevelFilter::Warn),
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a descriptor and report lint diagnostics.
    Check {
        file: PathBuf,
        /// Reject data lines with fewer than twelve fields.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the loaded table.
    Dump {
        file: PathBuf,
        /// Emit JSON instead of a text table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the descriptor in canonical form.
    Fmt { file: PathBuf },
}
