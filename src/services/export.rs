//! Workbook export
//!
//! A report becomes one `.xlsx` workbook with a sheet per table. Counts are
//! written as numbers so spreadsheet formulas keep working; change rates are
//! written as their display text.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::types::{DisplayCell, Report, ReportError, ReportTable, Result, RowKind};

/// MIME type of the exported artifact
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const USAGE_SHEET: &str = "AI usage";
pub const SESSION_SHEET: &str = "Sessions";

/// Period columns that fit beside the label column
const MAX_PERIOD_COLUMNS: usize = 16_383;

const HEADER_LABEL: &str = "Service";

fn xlsx_error(err: XlsxError) -> ReportError {
    ReportError::Export(err.to_string())
}

fn write_sheet(sheet: &mut Worksheet, table: &ReportTable) -> Result<()> {
    let bold = Format::new().set_bold();

    sheet
        .write_string_with_format(0, 0, HEADER_LABEL, &bold)
        .map_err(xlsx_error)?;
    for (idx, period) in table.columns().iter().enumerate() {
        sheet
            .write_string_with_format(0, idx as u16 + 1, period, &bold)
            .map_err(xlsx_error)?;
    }

    for (offset, row) in table.display_rows().iter().enumerate() {
        let r = offset as u32 + 1;
        let label_format = match row.kind {
            RowKind::Category => None,
            RowKind::Total | RowKind::Change => Some(&bold),
        };
        match label_format {
            Some(format) => sheet.write_string_with_format(r, 0, row.label, format),
            None => sheet.write_string(r, 0, row.label),
        }
        .map_err(xlsx_error)?;

        for (idx, cell) in row.cells.iter().enumerate() {
            let c = idx as u16 + 1;
            match cell {
                DisplayCell::Count(n) => sheet.write_number(r, c, *n as f64),
                DisplayCell::Rate(rate) => sheet.write_string(r, c, rate.to_string()),
            }
            .map_err(xlsx_error)?;
        }
    }

    sheet.set_column_width(0, 18).map_err(xlsx_error)?;
    Ok(())
}

/// Serialize a report as an `.xlsx` workbook
pub fn workbook_bytes(report: &Report) -> Result<Vec<u8>> {
    let width = report.usage.columns().len();
    if width > MAX_PERIOD_COLUMNS {
        return Err(ReportError::Export(format!(
            "{} periods exceed the sheet limit of {} columns",
            width, MAX_PERIOD_COLUMNS
        )));
    }

    let mut workbook = Workbook::new();
    for (name, table) in [(USAGE_SHEET, &report.usage), (SESSION_SHEET, &report.session)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(xlsx_error)?;
        write_sheet(sheet, table)?;
    }
    workbook.save_to_buffer().map_err(xlsx_error)
}

/// Replace characters that are unsafe in file names
fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// `<name>_<id>_<kind>_<YYYYMMDD>.xlsx`
pub fn artifact_name(report: &Report) -> String {
    format!(
        "{}_{}_{}_{}.xlsx",
        sanitize(&report.institution_name),
        sanitize(&report.institution_id),
        report.granularity.kind(),
        report.generated_on.format("%Y%m%d")
    )
}

/// Writes workbooks into a directory
#[derive(Debug, Clone)]
pub struct WorkbookExporter {
    dir: PathBuf,
}

impl WorkbookExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the workbook and return its path. A same-day re-export of the
    /// same report replaces the earlier file; a failed write leaves it intact.
    pub fn export(&self, report: &Report) -> Result<PathBuf> {
        let bytes = workbook_bytes(report)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(artifact_name(report));
        let temp = temp_path(&path);

        if let Err(e) = write_synced(&temp, &bytes) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        FileExt::lock_exclusive(&target)?;
        let renamed = fs::rename(&temp, &path);
        let _ = FileExt::unlock(&target);
        if let Err(e) = renamed {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "exported workbook");
        Ok(path)
    }
}

/// Sibling scratch file for `path`, unique per process
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
