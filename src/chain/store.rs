use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::chain::record::Record;
use crate::error::StoreError;

use serde_json::{from_str, to_string};
use tracing::debug;

/// Append-only record store backed by a JSON Lines file.
///
/// Every line is one page: the JSON array of records produced by one
/// successful fetch. The store is opened for the duration of a single
/// read or write pass and closed again; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        return Self {
            path: path.as_ref().to_path_buf(),
        };
    }

    pub fn path(&self) -> &Path {
        return &self.path;
    }

    pub fn exists(&self) -> bool {
        return self.path.is_file();
    }

    /// Appends one page to the end of the store.
    ///
    /// # Parameters
    /// - `records`: The page as returned by a single fetch call. Empty pages are written too.
    ///
    /// # Returns
    /// A `Result` that is an error only if the page could not be encoded or written.
    pub fn append_page(&self, records: &[Record]) -> Result<(), StoreError> {
        let line: String = to_string(records)?;
        self.ensure_parent()?;

        let mut file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{}", line).map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), records = records.len(), "page appended");
        return Ok(());
    }

    /// Reads every page in order and concatenates them into one flat list.
    ///
    /// # Returns
    /// All records in storage order, or an error if the file is missing,
    /// unreadable, or holds a line that is not a valid page.
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let file: File = File::open(&self.path).map_err(|source| self.io_error(source))?;
        let reader: BufReader<File> = BufReader::new(file);
        let mut records: Vec<Record> = Vec::new();
        let mut pages: usize = 0;

        for (number, line) in reader.lines().enumerate() {
            let line: String = line.map_err(|source| self.io_error(source))?;
            if line.trim().is_empty() {
                continue;
            }
            let page: Vec<Record> = from_str(&line).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                line: number + 1,
                source,
            })?;
            records.extend(page);
            pages += 1;
        }

        debug!(path = %self.path.display(), pages, records = records.len(), "store loaded");
        return Ok(records);
    }

    /// Replaces the whole store with `records`, written as a single page.
    ///
    /// The new contents go to a sibling temporary file which is then renamed
    /// over the store, so an interrupted rewrite leaves the old pages intact.
    pub fn rewrite(&self, records: &[Record]) -> Result<(), StoreError> {
        let line: String = to_string(records)?;
        self.ensure_parent()?;

        let mut tmp_name: OsString = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path: PathBuf = PathBuf::from(tmp_name);

        {
            let mut file: File = File::create(&tmp_path).map_err(|source| self.io_error(source))?;
            writeln!(file, "{}", line).map_err(|source| self.io_error(source))?;
            file.sync_all().map_err(|source| self.io_error(source))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), records = records.len(), "store rewritten");
        return Ok(());
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        return Ok(());
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        return StoreError::Io {
            path: self.path.clone(),
            source,
        };
    }
}
