use std::io::stdout;

use catalog::display::DateDisplay;
use catalog::service::Browse;
use clap::Parser;

use crate::prelude::*;
use crate::render::{write_json, write_sections};

/// List all datasets of the catalog, grouped by section.
#[derive(Debug, Parser)]
pub(crate) struct List {
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

    /// Only list the datasets of the given section.
    #[arg(long, short)]
    section: Option<String>,

    /// How timestamps are rendered (relative, absolute or iso).
    /// Overrides the `display.dates` option.
    #[arg(long)]
    dates: Option<DateDisplay>,

    #[arg(long, short, value_enum, default_value_t)]
    format: OutputFormat,
}

/// Restricts a view to a single section. An unknown section yields an
/// empty view.
pub(crate) fn select_section(
    browse: &mut Browse,
    section: Option<&str>,
) {
    if let Some(section) = section {
        browse.sections.retain(|name, _| name == section);
    }
}

impl List {
    pub(crate) async fn execute(self) -> DatacatResult<()> {
        let mut config = Datacat::config_or_default()?;
        self.dedup.apply(&mut config);

        let mut service = self.source.load(config, self.quiet).await?;
        if let Some(dates) = self.dates {
            service.set_date_display(dates);
        }

        let mut browse = service.browse();
        select_section(&mut browse, self.section.as_deref());

        match self.format {
            OutputFormat::Json => write_json(stdout().lock(), &browse),
            OutputFormat::Text => write_sections(
                stdout().lock(),
                &browse.sections,
                &browse.metadata,
                service.date_display(),
            ),
        }
    }
}
