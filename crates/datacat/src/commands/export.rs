use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use catalog::export::{export, ExportFormat};
use clap::{Parser, ValueEnum};

use crate::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    #[default]
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

/// Export the datasets of the catalog.
///
/// The export contains the active view, i.e. if deduplication is
/// enabled, datasets removed as duplicates are left out.
#[derive(Debug, Parser)]
pub(crate) struct Export {
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
    format: Format,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,
}

impl Export {
    pub(crate) async fn execute(self) -> DatacatResult<()> {
        let mut config = Datacat::config_or_default()?;
        self.dedup.apply(&mut config);

        let service = self.source.load(config, self.quiet).await?;
        let wtr: Box<dyn Write> = match self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(stdout().lock()),
        };

        export(service.index().datasets(), self.format.into(), wtr)?;
        Ok(())
    }
}
