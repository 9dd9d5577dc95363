//! The kscene command line tool
//!
//! Checks scene files for errors, prints their contents and looks up the assets they reference.

use clap::{ArgAction, Parser, Subcommand};
use commands::{check::CheckCommand, dump::DumpCommand, resolve::ResolveCommand};
use kscene::LoaderConfig;
use kscene_utils::{ok, AnyResult, AnyhowResultExt};
use log::LevelFilter;
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loader configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print more log output, may be repeated
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: CliCommand,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn loader_config(&self) -> AnyResult<LoaderConfig> {
        match &self.config {
            Some(path) => LoaderConfig::from_file(path)
                .otherwise(format!("couldn't load config `{}`", path.display())),
            None => Ok(LoaderConfig::default()),
        }
    }
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Loads scene files and reports any errors
    Check(CheckCommand),
    /// Prints the contents of a scene file
    Dump(DumpCommand),
    /// Looks up every asset referenced by a scene in its search paths
    Resolve(ResolveCommand),
}

pub trait Command {
    fn run(self, config: &LoaderConfig) -> AnyResult;
}

/// Runs the tool as if it was ran from the command line.
pub fn run(cli: Cli) -> AnyResult {
    let config = cli.loader_config()?;
    match cli.command {
        CliCommand::Check(c) => c.run(&config)?,
        CliCommand::Dump(c) => c.run(&config)?,
        CliCommand::Resolve(c) => c.run(&config)?,
    }
    ok()
}
