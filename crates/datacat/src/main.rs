use std::process;

use clap::Parser;
use cli::{Args, Command};
use datacat::Datacat;
use env_logger::Env;
use error::DatacatResult;
use rayon::ThreadPoolBuilder;

pub(crate) mod prelude {
    pub(crate) use crate::datacat::Datacat;
    pub(crate) use crate::error::{bail, DatacatError, DatacatResult};
    pub(crate) use crate::render::OutputFormat;
    pub(crate) use crate::source::{DedupArgs, Service, SourceArgs};
}

mod cli;
mod commands;
mod datacat;
mod error;
mod progress;
mod render;
mod source;

fn num_threads(args: &Args) -> usize {
    if let Some(num_threads) = args.num_jobs {
        return num_threads;
    }

    if let Ok(config) = Datacat::discover().and_then(|dc| dc.config()) {
        if let Some(runtime) = config.runtime {
            if let Some(num_threads) = runtime.num_jobs {
                return num_threads;
            }
        }
    }

    0
}

async fn run(args: Args) -> DatacatResult<()> {
    match args.cmd {
        Command::Completions(cmd) => cmd.execute(),
        Command::Config(cmd) => cmd.execute(),
        Command::Duplicates(cmd) => cmd.execute().await,
        Command::Export(cmd) => cmd.execute().await,
        Command::Init(cmd) => cmd.execute(),
        Command::List(cmd) => cmd.execute().await,
        Command::Search(cmd) => cmd.execute().await,
        Command::Serve(cmd) => cmd.execute().await,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.cmd.verbose() { "info" } else { "warn" };
    let env = Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).init();

    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(num_threads(&args))
        .build_global()
    {
        eprintln!("error: {e:#}");
        process::exit(1);
    }

    match run(args).await {
        Ok(()) => process::exit(0),
        Err(e) if e.is_broken_pipe() => process::exit(0),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
