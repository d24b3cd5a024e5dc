use super::LedgerError;
use super::record::{MetricValue, Record};
use super::schema::Schema;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An append-only CSV table bound to a fixed [`Schema`].
///
/// The table is the only writer of its file. Rows are written one at a time and
/// flushed before [`append`](Self::append) returns, so the file on disk always
/// reflects every row appended so far, in order.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    schema: Schema,
}

impl Table {
    /// Opens a table, creating the file with its header if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the CSV file.
    /// * `schema` - The columns the file must carry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::HeaderMismatch`] if an existing file carries a
    /// different header, and an I/O or CSV error if the file cannot be created or read.
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let table = Self { path, schema };

        let is_empty = match std::fs::metadata(&table.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(table.io_error(e)),
        };

        if is_empty {
            debug!(table = schema.name, path = %table.path.display(), "Creating table with header.");
            let file = File::create(&table.path).map_err(|e| table.io_error(e))?;
            let mut writer = csv::Writer::from_writer(file);
            writer
                .write_record(schema.columns)
                .map_err(|e| table.csv_error(e))?;
            writer.flush().map_err(|e| table.io_error(e))?;
        } else {
            table.verify_header()?;
        }

        Ok(table)
    }

    /// Opens a table only if its file is already there. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::HeaderMismatch`] if the file carries a different header.
    pub fn open_existing(path: impl AsRef<Path>, schema: Schema) -> Result<Option<Self>, LedgerError> {
        let table = Self {
            path: path.as_ref().to_path_buf(),
            schema,
        };
        match std::fs::metadata(&table.path) {
            Ok(meta) if meta.len() == 0 => Ok(Some(table)),
            Ok(_) => {
                table.verify_header()?;
                Ok(Some(table))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(table.io_error(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SchemaViolation`] without touching the file if the
    /// record's columns are not exactly the schema's columns in order.
    pub fn append(&self, record: &Record) -> Result<(), LedgerError> {
        if !record.columns().eq(self.schema.columns.iter().copied()) {
            return Err(LedgerError::SchemaViolation {
                table: self.schema.name,
                expected: self.schema.columns.iter().map(|c| c.to_string()).collect(),
                found: record.columns().map(str::to_string).collect(),
            });
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(record.values().map(MetricValue::to_string))
            .map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Reads every row back, in the order they were appended.
    pub fn rows(&self) -> Result<Vec<Record>, LedgerError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        let mut rows = Vec::new();
        for result in reader.records() {
            let raw = result.map_err(|e| self.csv_error(e))?;
            let mut record = Record::new();
            for (column, cell) in self.schema.columns.iter().zip(raw.iter()) {
                record.push(*column, MetricValue::parse(cell));
            }
            rows.push(record);
        }
        Ok(rows)
    }

    pub fn row_count(&self) -> Result<usize, LedgerError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        let mut count = 0;
        for result in reader.records() {
            result.map_err(|e| self.csv_error(e))?;
            count += 1;
        }
        Ok(count)
    }

    /// The set of design names that appear in at least one row.
    pub fn distinct_designs(&self) -> Result<BTreeSet<String>, LedgerError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        let mut names = BTreeSet::new();
        for result in reader.records() {
            let raw = result.map_err(|e| self.csv_error(e))?;
            if let Some(name) = raw.get(0).filter(|n| !n.is_empty()) {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    fn verify_header(&self) -> Result<(), LedgerError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        let header = reader.headers().map_err(|e| self.csv_error(e))?;
        if !header.iter().eq(self.schema.columns.iter().copied()) {
            return Err(LedgerError::HeaderMismatch {
                table: self.schema.name,
                path: self.path.to_string_lossy().to_string(),
                expected: self.schema.columns.iter().map(|c| c.to_string()).collect(),
                found: header.iter().map(str::to_string).collect(),
            });
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.to_string_lossy().to_string(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> LedgerError {
        LedgerError::Csv {
            path: self.path.to_string_lossy().to_string(),
            source,
        }
    }
}
