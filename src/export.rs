use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::models::job::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// Flat formats need a fixed column set; absent fields become empty cells.
const COLUMNS: [&str; 10] = [
    "title",
    "organization",
    "location",
    "closing_date",
    "posting_date",
    "salary_min",
    "salary_max",
    "url",
    "source",
    "description",
];

fn field_values(record: &JobRecord) -> [String; 10] {
    [
        record.title.clone(),
        record.organization.clone().unwrap_or_default(),
        record.location.clone().unwrap_or_default(),
        record.closing_date.clone().unwrap_or_default(),
        record.posting_date.clone().unwrap_or_default(),
        record.salary_min.map(|v| v.to_string()).unwrap_or_default(),
        record.salary_max.map(|v| v.to_string()).unwrap_or_default(),
        record.url.clone(),
        record.source.clone(),
        record.description.clone().unwrap_or_default(),
    ]
}

/// Write the run's primary artifact as `jobs_<timestamp>.<ext>`.
/// An empty result set produces no file.
pub fn write(
    records: &[JobRecord],
    format: ExportFormat,
    dir: &Path,
) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        tracing::warn!("No results to export");
        return Ok(None);
    }
    let stem = format!("jobs_{}", Local::now().format("%Y%m%d_%H%M%S"));
    write_named(records, format, dir, &stem).map(Some)
}

/// Write records under an explicit file stem (used by on-demand
/// re-exports, named `export_<task_id>_<timestamp>`).
pub fn write_named(
    records: &[JobRecord],
    format: ExportFormat,
    dir: &Path,
    stem: &str,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{stem}.{}", format.extension()));

    match format {
        ExportFormat::Csv => write_csv(records, &path)?,
        ExportFormat::Json => write_json(records, &path)?,
        ExportFormat::Excel => write_xlsx(records, &path)?,
    }

    tracing::info!("Exported {} jobs to {}", records.len(), path.display());
    Ok(path)
}

fn write_csv(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(field_values(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, records)?;
    Ok(())
}

fn write_xlsx(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write(0, col as u16, *name)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, value) in field_values(record).iter().enumerate() {
            worksheet.write(row as u32 + 1, col as u16, value.as_str())?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
