//! Text rendering of catalog views.

use std::io::Write;

use catalog::prelude::*;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use comfy_table::{presets, Row, Table};
use serde::Serialize;

use crate::error::DatacatResult;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Writes `value` as pretty-printed JSON.
pub(crate) fn write_json<W, T>(
    mut wtr: W,
    value: &T,
) -> DatacatResult<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut wtr, value)?;
    writeln!(wtr)?;
    wtr.flush()?;
    Ok(())
}

fn total_size(dataset: &Dataset) -> Option<u64> {
    let sizes: Vec<u64> = dataset
        .distribution
        .iter()
        .filter_map(|d| d.content_size)
        .collect();

    if sizes.is_empty() {
        None
    } else {
        Some(sizes.iter().sum())
    }
}

/// Labels invalid datasets and the datasets kept for a group of
/// duplicates.
fn status(dataset: &Dataset) -> &'static str {
    if !dataset.is_valid {
        return "invalid";
    }

    match dataset.deduplication_info {
        Some(ref info) if info.duplicate_count > 1 => "kept",
        _ => "",
    }
}

/// Renders one section as a table.
pub(crate) fn section_table(
    datasets: &[Dataset],
    dates: DateDisplay,
    now: DateTime<Utc>,
) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec![
        "title", "id", "modified", "files", "size", "status",
    ]));

    for dataset in datasets {
        table.add_row(vec![
            dataset.title.clone(),
            dataset.id.clone(),
            format_date(dataset.last_modified, dates, now),
            dataset.distribution.len().to_string(),
            total_size(dataset).map(format_size).unwrap_or("-".into()),
            status(dataset).to_string(),
        ]);
    }

    table
}

/// Writes every section followed by a one-line summary.
pub(crate) fn write_sections<W: Write>(
    mut wtr: W,
    sections: &Sections,
    summary: &Summary,
    dates: DateDisplay,
) -> DatacatResult<()> {
    let now = Utc::now();

    for (name, datasets) in sections.iter() {
        writeln!(wtr, "{name} ({})", datasets.len())?;
        writeln!(wtr, "{}\n", section_table(datasets, dates, now))?;
    }

    writeln!(wtr, "{}", summary_line(summary))?;
    wtr.flush()?;
    Ok(())
}

pub(crate) fn summary_line(summary: &Summary) -> String {
    let mut line = format!(
        "{} datasets in {} sections",
        summary.total_datasets, summary.sections
    );

    if summary.invalid_datasets > 0 {
        let invalid = summary.invalid_datasets;
        line.push_str(&format!(", {invalid} invalid"));
    }

    let dedup = &summary.deduplication;
    if dedup.enabled {
        line.push_str(&format!(
            ", {} duplicates removed ({} originals)",
            dedup.duplicates_removed, summary.original_total
        ));
    }

    line
}

/// Renders the removed duplicates together with their survivors.
pub(crate) fn duplicates_table(
    removed: &[RemovedDuplicate],
    dates: DateDisplay,
    now: DateTime<Utc>,
) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec![
        "title", "removed", "section", "modified", "kept",
    ]));

    for duplicate in removed {
        table.add_row(vec![
            duplicate.title.clone(),
            duplicate.id.clone(),
            duplicate.section.clone(),
            format_date(duplicate.last_modified, dates, now),
            duplicate.kept_instead_id.clone(),
        ]);
    }

    table
}
