use std::fmt::{self, Display};
use std::io::Write;
use std::str::FromStr;

use chrono::SecondsFormat;
use csv::WriterBuilder;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{bail, CatalogError, CatalogResult};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => bail!("unsupported export format '{s}'"),
        }
    }
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    section: &'a str,
    title: &'a str,
    description: &'a str,
    creator: &'a str,
    date_created: &'a str,
    last_modified: String,
    is_valid: bool,
    is_duplicate: bool,
    duplicate_count: usize,
    kept_instead_id: &'a str,
    distributions: String,
}

impl<'a> From<&'a Dataset> for Row<'a> {
    fn from(dataset: &'a Dataset) -> Self {
        let info = dataset.deduplication_info.as_ref();

        Row {
            id: &dataset.id,
            section: dataset.section_key(),
            title: &dataset.title,
            description: &dataset.description,
            creator: dataset.creator.as_deref().unwrap_or_default(),
            date_created: dataset
                .date_created
                .as_deref()
                .unwrap_or_default(),
            last_modified: dataset
                .last_modified
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            is_valid: dataset.is_valid,
            is_duplicate: info.map(|i| i.is_duplicate).unwrap_or(false),
            duplicate_count: info
                .map(|i| i.duplicate_count)
                .unwrap_or(1),
            kept_instead_id: info
                .and_then(|i| i.kept_instead_id.as_deref())
                .unwrap_or_default(),
            distributions: dataset
                .distribution
                .iter()
                .filter_map(|d| d.content_url.as_deref())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Writes `datasets` to `writer` in the given format.
pub fn export<'a, I, W>(
    datasets: I,
    format: ExportFormat,
    mut writer: W,
) -> CatalogResult<()>
where
    I: IntoIterator<Item = &'a Dataset>,
    W: Write,
{
    match format {
        ExportFormat::Csv => {
            let mut writer = WriterBuilder::new().from_writer(writer);
            for dataset in datasets {
                writer.serialize(Row::from(dataset))?;
            }

            writer.flush()?;
        }
        ExportFormat::Json => {
            let datasets: Vec<_> = datasets.into_iter().collect();
            serde_json::to_writer_pretty(&mut writer, &datasets)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}
