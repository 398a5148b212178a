use std::io::{stdout, Write};

use chrono::Utc;
use clap::Parser;

use crate::prelude::*;
use crate::render::{duplicates_table, write_json};

/// Show the datasets removed by deduplication, together with the
/// dataset kept instead.
#[derive(Debug, Parser)]
pub(crate) struct Duplicates {
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

    #[arg(long, short, value_enum, default_value_t)]
    format: OutputFormat,
}

impl Duplicates {
    pub(crate) async fn execute(self) -> DatacatResult<()> {
        let mut config = Datacat::config_or_default()?;
        config.deduplication.enabled = true;

        let service = self.source.load(config, self.quiet).await?;
        let metadata = service.index().deduplication_metadata();

        match self.format {
            OutputFormat::Json => write_json(stdout().lock(), metadata),
            OutputFormat::Text => {
                let mut wtr = stdout().lock();

                if !metadata.removed_duplicates.is_empty() {
                    let table = duplicates_table(
                        &metadata.removed_duplicates,
                        service.date_display(),
                        Utc::now(),
                    );
                    writeln!(wtr, "{table}\n")?;
                }

                writeln!(
                    wtr,
                    "{} duplicates in {} groups ({} datasets)",
                    metadata.duplicates_removed,
                    metadata.duplicates_found,
                    service.index().original_datasets().len()
                )?;
                wtr.flush()?;
                Ok(())
            }
        }
    }
}
