use std::io::stdout;

use catalog::service::SearchOptions;
use clap::Parser;

use crate::prelude::*;
use crate::render::{write_json, write_sections};

/// Search the titles and descriptions of all datasets.
///
/// A dataset matches if the query (ignoring case) is contained in its
/// title or description. An empty query matches nothing.
#[derive(Debug, Parser)]
pub(crate) struct Search {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    dedup: DedupArgs,

    #[arg(long, short, value_enum, default_value_t)]
    format: OutputFormat,

    /// The search query.
    query: String,
}

impl Search {
    pub(crate) async fn execute(self) -> DatacatResult<()> {
        let config = Datacat::config_or_default()?;
        let mut service = self.source.load(config, self.quiet).await?;

        let options = SearchOptions {
            deduplicate: self.dedup.deduplicate(),
        };

        let response = service.search(&self.query, options);
        if response.total_results == 0 && !self.quiet {
            eprintln!("No datasets match '{}'.", self.query.trim());
        }

        match self.format {
            OutputFormat::Json => {
                write_json(stdout().lock(), &response)
            }
            OutputFormat::Text => write_sections(
                stdout().lock(),
                &response.sections,
                &response.metadata,
                service.date_display(),
            ),
        }
    }
}
