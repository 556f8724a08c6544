//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for fbaudit using clap.
//! The tool takes exactly one positional argument, the configuration file.

pub mod commands;

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;

/// Exit code of a completed run, including runs where some targets failed
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of a run aborted by a fatal pre-condition failure
pub const EXIT_FATAL: i32 = -1;

/// Printed to stdout when the arguments are wrong
pub const USAGE: &str = "usage: \nfbaudit <conf file>\n";

/// fbaudit - FlashBlade audit-log collector
#[derive(Parser, Debug)]
#[command(name = "fbaudit")]
#[command(version, about, long_about = None)]
#[command(author = "fbaudit Contributors")]
pub struct Cli {
    /// Collection run arguments
    #[command(flatten)]
    pub collect: commands::collect::CollectArgs,
}

/// What the command line asks for
#[derive(Debug)]
pub enum Invocation {
    /// Run a collection
    Run(Cli),
    /// Wrong arguments: print [`USAGE`] and exit successfully
    Usage,
    /// `--help` or `--version`: let clap print it
    Display(clap::Error),
}

/// Parse command-line arguments
pub fn parse_args<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Invocation::Display(e),
            _ => Invocation::Usage,
        },
    }
}
