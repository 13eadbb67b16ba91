use std::fs::File;
use std::io::Write;
use std::path::Path;
use sweep_core::{ConfigError, REPORT_HEADER};

/// Report table writer. The header row is written on open.
pub struct ReportWriter<W: Write = File> {
    pub(crate) wtr: csv::Writer<W>,
    pub(crate) rows: usize,
}

impl ReportWriter<File> {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: &Path) -> Result<Self, ConfigError> {
        let unwritable = |source| ConfigError::ReportUnwritable { path: path.to_path_buf(), source };
        let file = File::create(path).map_err(unwritable)?;
        ReportWriter::from_writer(file).map_err(unwritable)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn from_writer(w: W) -> std::io::Result<Self> {
        let mut wtr = csv::Writer::from_writer(w);
        wtr.write_record(REPORT_HEADER)?;
        Ok(ReportWriter { wtr, rows: 0 })
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize { self.rows }

    pub fn into_inner(self) -> std::io::Result<W> {
        self.wtr.into_inner().map_err(|e| e.into_error())
    }
}
