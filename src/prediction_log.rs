//! Append-only CSV log of every prediction served.
//!
//! Serial numbers are not stored anywhere else: the next one is always the
//! current number of data rows plus one. The count-then-append sequence runs
//! under a mutex so a single process never hands out the same serial twice.
//! Several processes appending to the same file are not supported.

use crate::error::LogError;
use crate::types::prediction::{PredictionRecord, Verdict};
use crate::types::reading::MachineReading;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error};

/// Append-only prediction log backed by a CSV file
pub struct PredictionLog {
    path: PathBuf,
    writer_lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            writer_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows (header excluded); 0 if the file does not exist
    pub fn row_count(&self) -> Result<u64, LogError> {
        match self.open_reader()? {
            Some(mut reader) => {
                let mut count = 0;
                for record in reader.records() {
                    record.map_err(|e| LogError::csv(&self.path, e))?;
                    count += 1;
                }
                Ok(count)
            }
            None => Ok(0),
        }
    }

    /// Append one prediction and return the serial number it was given.
    ///
    /// The header is written first when the file is missing or empty. Header
    /// and row are encoded up front, so an encoding failure leaves the file
    /// untouched. A failed write is truncated back to the previous length.
    pub fn append(&self, reading: &MachineReading, verdict: Verdict) -> Result<u64, LogError> {
        let _guard = self
            .writer_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let needs_header = self.is_absent_or_empty()?;
        let serial_no = if needs_header { 1 } else { self.row_count()? + 1 };

        let record = PredictionRecord::new(serial_no, reading, verdict);
        let bytes = self.encode(&record, needs_header)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LogError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LogError::io(&self.path, e))?;
        self.commit(&mut file, &bytes, |file, bytes| file.write_all(bytes))?;

        debug!(
            path = %self.path.display(),
            serial_no = serial_no,
            header = needs_header,
            "Prediction appended"
        );

        Ok(serial_no)
    }

    /// Read every record in the log; empty if the file does not exist
    pub fn read_all(&self) -> Result<Vec<PredictionRecord>, LogError> {
        match self.open_reader()? {
            Some(mut reader) => reader
                .deserialize()
                .map(|row| row.map_err(|e| LogError::csv(&self.path, e)))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Write `bytes` at the end of `file` and sync it. On failure the file is
    /// cut back to its prior length so no partial row survives.
    fn commit<W>(&self, file: &mut File, bytes: &[u8], write: W) -> Result<(), LogError>
    where
        W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let original_len = file
            .metadata()
            .map_err(|e| LogError::io(&self.path, e))?
            .len();

        if let Err(e) = write(&mut *file, bytes).and_then(|_| file.sync_data()) {
            if let Err(rollback) = file.set_len(original_len).and_then(|_| file.sync_data()) {
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial prediction row"
                );
            }
            return Err(LogError::io(&self.path, e));
        }

        Ok(())
    }

    fn open_reader(&self) -> Result<Option<csv::Reader<File>>, LogError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(csv::ReaderBuilder::new().has_headers(true).from_reader(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LogError::io(&self.path, e)),
        }
    }

    fn is_absent_or_empty(&self) -> Result<bool, LogError> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() => Err(LogError::io(
                &self.path,
                io::Error::new(io::ErrorKind::Other, "log path is a directory"),
            )),
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(LogError::io(&self.path, e)),
        }
    }

    fn encode(&self, record: &PredictionRecord, with_header: bool) -> Result<Vec<u8>, LogError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(with_header)
            .from_writer(Vec::new());
        writer
            .serialize(record)
            .map_err(|e| LogError::csv(&self.path, e))?;
        writer
            .into_inner()
            .map_err(|e| LogError::io(&self.path, io::Error::new(e.error().kind(), e.error().to_string())))
    }
}
