//! CSV log file writer.
//!
//! Each file starts with the schema header and the version tag, followed by
//! one record per emission tick. Files are only ever touched by the
//! emission worker, so no locking is needed here.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use n2k_common::{Row, COLUMN_NAMES, FORMAT_VERSION};
use tracing::info;

use crate::error::TickError;

/// Attempts at finding an unused file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Render a strftime pattern, failing instead of panicking on bad specifiers.
pub fn render_filename<Tz>(format: &str, now: &DateTime<Tz>) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut name = String::new();
    write!(name, "{}", now.format(format)).ok()?;
    (!name.is_empty()).then_some(name)
}

/// First path derived from `dir/name` that does not exist yet.
///
/// `2024Jun01_120000.csv` becomes `2024Jun01_120000-1.csv`, `-2`, … when taken.
fn unique_path(dir: &Path, name: &str) -> Result<PathBuf, TickError> {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    for n in 1..MAX_NAME_ATTEMPTS {
        let numbered = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        let candidate = dir.join(numbered);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(TickError::NameExhausted(dir.join(name), MAX_NAME_ATTEMPTS))
}

/// An open CSV log file.
pub struct LogFile {
    path: PathBuf,
    writer: csv::Writer<File>,
    opened_at: Instant,
    rows: u64,
}

impl LogFile {
    /// Create a new file in `dir` named by `filename_format` and write both header lines.
    pub fn create<Tz>(
        dir: &Path,
        filename_format: &str,
        now: &DateTime<Tz>,
    ) -> Result<Self, TickError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let name = render_filename(filename_format, now)
            .ok_or_else(|| TickError::FilenameFormat(filename_format.to_string()))?;
        let path = unique_path(dir, &name)?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| TickError::Open {
                path: path.clone(),
                source: e,
            })?;

        let writer = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        let mut log = Self {
            path,
            writer,
            opened_at: Instant::now(),
            rows: 0,
        };
        log.write_header()?;
        info!(path = %log.path.display(), "opened log file");
        Ok(log)
    }

    fn write_header(&mut self) -> Result<(), TickError> {
        self.writer
            .write_record(COLUMN_NAMES)
            .and_then(|()| self.writer.write_record([FORMAT_VERSION]))
            .map_err(|e| TickError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        self.flush()
    }

    /// Append one data row.
    pub fn write_row(&mut self, row: &Row) -> Result<(), TickError> {
        let written: csv::Result<()> = row
            .fields()
            .try_for_each(|field| self.writer.write_field(field.as_bytes()))
            .and_then(|()| self.writer.write_record(None::<&[u8]>));
        written.map_err(|e| TickError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Push buffered rows to the operating system.
    pub fn flush(&mut self) -> Result<(), TickError> {
        self.writer.flush().map_err(|e| TickError::Flush {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Flush and sync to disk, consuming the file.
    pub fn close(mut self) -> Result<(), TickError> {
        self.flush()?;
        let rows = self.rows;
        let path = self.path.clone();
        let file = self.writer.into_inner().map_err(|e| TickError::Flush {
            path: path.clone(),
            source: io::Error::new(e.error().kind(), e.error().to_string()),
        })?;
        file.sync_all().map_err(|e| TickError::Flush {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), rows, "closed log file");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}
