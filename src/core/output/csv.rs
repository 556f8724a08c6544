//! CSV row formatting and append-only sink
//!
//! Rows are joined with `", "` and written without quoting or escaping;
//! downstream ingestion expects exactly this layout.

use crate::config::RunMode;
use crate::domain::{ArrayIdentity, AuditRecord, FbAuditError, Result};
use crate::logging::TIMESTAMP_FORMAT;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FIELD_SEPARATOR: &str = ", ";

const LEGACY_HEADER: &str =
    "date_time, user, command, sub_command, arguments, ip_address, user_interface, user_agent";

const ANNOTATED_HEADER: &str = "date_time, array_name, array_id, array_version, user, command, \
     sub_command, arguments, ip_address, user_interface, user_agent";

/// Column layout of the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// Record fields only
    Legacy,
    /// Array name, id and version inserted after `date_time`
    Annotated,
}

impl CsvLayout {
    /// Legacy configs keep the columns they always had
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Legacy => Self::Legacy,
            RunMode::MultiArray => Self::Annotated,
        }
    }

    /// Header row, without line terminator
    pub fn header(self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_HEADER,
            Self::Annotated => ANNOTATED_HEADER,
        }
    }

    /// Format one record as a row, without line terminator
    ///
    /// `identity` is only read by the annotated layout; a missing identity
    /// leaves the three array columns empty.
    pub fn format_row(self, record: &AuditRecord, identity: Option<&ArrayIdentity>) -> String {
        let date_time = format_date_time(record);
        let mut fields: Vec<&str> = Vec::with_capacity(11);
        fields.push(&date_time);

        if self == Self::Annotated {
            match identity {
                Some(identity) => {
                    fields.extend([
                        identity.name.as_str(),
                        identity.id.as_str(),
                        identity.version.as_str(),
                    ]);
                }
                None => fields.extend(["", "", ""]),
            }
        }

        fields.extend([
            record.user.as_str(),
            record.command.as_str(),
            record.subcommand.as_str(),
            record.arguments.as_str(),
            record.ip_address.as_str(),
            record.user_interface.as_str(),
            record.user_agent_or_placeholder(),
        ]);

        fields.join(FIELD_SEPARATOR)
    }
}

fn format_date_time(record: &AuditRecord) -> String {
    match record.local_time() {
        Some(time) => time.format(TIMESTAMP_FORMAT).to_string(),
        None => record.time_ms.to_string(),
    }
}

/// Append-only CSV file
///
/// The file is created if missing; parent directories are not.
pub struct CsvSink {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl CsvSink {
    /// Open `path` for appending
    ///
    /// # Errors
    ///
    /// Returns an output error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                FbAuditError::Output(format!(
                    "Failed to open output file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Write the header row
    pub fn write_header(&mut self, layout: CsvLayout) -> Result<()> {
        self.write_line(layout.header())
    }

    /// Write one record row
    pub fn write_record(
        &mut self,
        layout: CsvLayout,
        record: &AuditRecord,
        identity: Option<&ArrayIdentity>,
    ) -> Result<()> {
        let row = layout.format_row(record, identity);
        self.write_line(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to disk and return how many records were written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().map_err(|e| self.output_error(e))?;
        Ok(self.rows)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").map_err(|e| self.output_error(e))
    }

    fn output_error(&self, e: std::io::Error) -> FbAuditError {
        FbAuditError::Output(format!(
            "Failed to write output file {}: {}",
            self.path.display(),
            e
        ))
    }
}

/// Append `records` to `path`, preceded by the header when `with_header` is set
///
/// Every row is flushed before this returns.
///
/// # Returns
///
/// The number of record rows written (the header is not counted).
///
/// # Errors
///
/// Returns an output error if the file cannot be opened or written.
pub fn append_records(
    path: &Path,
    layout: CsvLayout,
    with_header: bool,
    records: &[AuditRecord],
    identity: Option<&ArrayIdentity>,
) -> Result<usize> {
    let mut sink = CsvSink::open(path)?;

    if with_header {
        sink.write_header(layout)?;
    }
    for record in records {
        sink.write_record(layout, record, identity)?;
    }

    sink.finish()
}
