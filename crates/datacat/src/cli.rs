use clap::{Parser, Subcommand};

use crate::commands::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
pub(crate) struct Args {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    #[clap(
        short = 'j',
        long,
        env = "DATACAT_NUM_JOBS",
        hide_env_values = true
    )]
    pub(crate) num_jobs: Option<usize>,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Completions(Completions),
    Config(Config),
    Duplicates(Duplicates),
    Export(Export),
    #[clap(alias = "new")]
    Init(Init),
    #[clap(alias = "ls")]
    List(List),
    Search(Search),
    Serve(Serve),
}

impl Command {
    /// Returns whether the command runs verbosely.
    pub(crate) fn verbose(&self) -> bool {
        match self {
            Self::Completions(_) | Self::Config(_) => false,
            Self::Duplicates(cmd) => cmd.verbose,
            Self::Export(cmd) => cmd.verbose,
            Self::Init(cmd) => cmd.verbose,
            Self::List(cmd) => cmd.verbose,
            Self::Search(cmd) => cmd.verbose,
            Self::Serve(cmd) => cmd.verbose,
        }
    }
}
