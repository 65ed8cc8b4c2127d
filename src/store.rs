// Store module: one flat file per record type, one record per line.
//
// Reads skip blank lines and `#` comments. Appends go to the end of the
// file; updates and deletes read the whole file, splice one line and
// write the result through a temporary file that is renamed over the
// original, so a failed write never leaves a truncated store behind.

use crate::record::{decode, encode, line_record_number, FieldError, Record};
use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    InvalidField(#[from] FieldError),
    #[error("{} already holds the highest record number (4294967295)", path.display())]
    NumbersExhausted { path: PathBuf },
}

/// Result of an update or delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    Applied,
    NotFound,
}

/// Whether a raw line holds a record rather than a blank or a comment.
pub fn is_record_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

/// Flat-file store for one record type.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    path: PathBuf,
    _record: PhantomData<R>,
}

impl<R: Record> RecordStore<R> {
    /// Open the store backed by `path`. The file must already exist and
    /// be readable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        fs::File::open(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        debug!("opened {} store at {}", R::KIND, path.display());
        Ok(RecordStore {
            path,
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })
    }

    /// Record lines in file order, trimmed, without blanks or comments.
    pub fn load(&self) -> Result<Vec<String>, StoreError> {
        let content = self.read_all()?;
        let lines: Vec<String> = content
            .lines()
            .filter(|line| is_record_line(line))
            .map(|line| line.trim().to_string())
            .collect();
        debug!("loaded {} lines from {}", lines.len(), self.path.display());
        Ok(lines)
    }

    fn decode_lines<'a, I>(&self, lines: I) -> Vec<R>
    where
        I: IntoIterator<Item = &'a String>,
    {
        lines
            .into_iter()
            .filter_map(|line| match decode::<R>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping malformed line in {}: {} ({})", self.path.display(), line, e);
                    None
                }
            })
            .collect()
    }

    /// Every record in file order.
    pub fn records(&self) -> Result<Vec<R>, StoreError> {
        self.search("")
    }

    /// Records whose stored line contains `text`, ignoring case. An empty
    /// `text` matches everything.
    pub fn search(&self, text: &str) -> Result<Vec<R>, StoreError> {
        let needle = text.to_lowercase();
        let lines = self.load()?;
        let hits = lines
            .iter()
            .filter(|line| line.to_lowercase().contains(&needle));
        Ok(self.decode_lines(hits))
    }

    /// The first record numbered `record_number`, if any.
    pub fn find(&self, record_number: u32) -> Result<Option<R>, StoreError> {
        let lines = self.load()?;
        let hits = lines
            .iter()
            .filter(|line| line_record_number(line) == Some(record_number));
        Ok(self.decode_lines(hits).into_iter().next())
    }

    /// One more than the highest record number in the file, or 1 when the
    /// file holds no records.
    pub fn next_record_number(&self) -> Result<u32, StoreError> {
        let highest = self
            .load()?
            .iter()
            .filter_map(|line| line_record_number(line))
            .max()
            .unwrap_or(0);
        highest
            .checked_add(1)
            .ok_or_else(|| StoreError::NumbersExhausted {
                path: self.path.clone(),
            })
    }

    /// Write `record` as a new last line.
    pub fn append(&self, record: &R) -> Result<(), StoreError> {
        record.validate()?;
        let line = encode(record);
        self.append_line(&line).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "appended {} {} to {}",
            R::KIND,
            record.record_number(),
            self.path.display()
        );
        Ok(())
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;

        // Start on a fresh line if the last one was left unterminated.
        let len = file.metadata()?.len();
        let mut buf = String::with_capacity(line.len() + 2);
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                buf.push('\n');
            }
        }
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())?;
        file.flush()
    }

    /// Replace the line holding `record.record_number()` with `record`.
    pub fn update(&self, record: &R) -> Result<Change, StoreError> {
        record.validate()?;
        let number = record.record_number();
        let content = self.read_all()?;
        let Some((start, end)) = locate::<R>(&content, number) else {
            debug!("no {} {} in {}", R::KIND, number, self.path.display());
            return Ok(Change::NotFound);
        };

        // Everything around the old line is written back byte for byte.
        let mut rewritten = String::with_capacity(content.len());
        rewritten.push_str(&content[..start]);
        rewritten.push_str(&encode(record));
        rewritten.push('\n');
        rewritten.push_str(&content[end..]);
        self.replace_contents(&rewritten)?;
        info!("updated {} {} in {}", R::KIND, number, self.path.display());
        Ok(Change::Applied)
    }

    /// Remove the line holding `record_number`.
    pub fn delete(&self, record_number: u32) -> Result<Change, StoreError> {
        let content = self.read_all()?;
        let Some((start, end)) = locate::<R>(&content, record_number) else {
            debug!("no {} {} in {}", R::KIND, record_number, self.path.display());
            return Ok(Change::NotFound);
        };

        let rewritten = [&content[..start], &content[end..]].concat();
        self.replace_contents(&rewritten)?;
        info!(
            "deleted {} {} from {}",
            R::KIND,
            record_number,
            self.path.display()
        );
        Ok(Change::Applied)
    }

    fn replace_contents(&self, contents: &str) -> Result<(), StoreError> {
        self.write_atomic(contents)
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    // The temp file lives next to the store so the rename stays on one
    // filesystem. It is removed on drop if anything fails before persist.
    fn write_atomic(&self, contents: &str) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        replace_file(&self.path, dir, contents)
    }
}

// Write `contents` to a scratch file in `dir`, flush it to disk, then
// rename it over `path`. The scratch file is deleted on drop if any step
// fails, and `path` keeps its old bytes.
fn replace_file(path: &Path, dir: &Path, contents: &str) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    // Keep the store's permissions rather than the scratch file's 0600.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Byte range, terminator included, of the first line that decodes as an
/// `R` numbered `record_number`. Lines `find` would skip are skipped here
/// too, so an update or delete never lands on a malformed line.
fn locate<R: Record>(content: &str, record_number: u32) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if is_record_line(line)
            && line_record_number(line) == Some(record_number)
            && decode::<R>(line.trim()).is_ok()
        {
            return Some((start, offset));
        }
    }
    None
}
