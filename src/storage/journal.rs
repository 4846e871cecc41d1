use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::QueueError;
use super::record::QueueRecord;

/// Ordered record store behind one storage tier.
///
/// Lines come back as raw bytes: validating them is the queue's job, so a
/// corrupt line can still be removed and counted.
pub trait Journal {
    fn append(&mut self, record: &QueueRecord) -> Result<(), QueueError>;
    fn len(&self) -> Result<usize, QueueError>;
    fn peek_front(&self) -> Result<Option<Vec<u8>>, QueueError>;
    fn pop_front(&mut self) -> Result<Option<Vec<u8>>, QueueError>;
    fn clear(&mut self) -> Result<(), QueueError>;

    /// `None` for tiers bounded only by their medium.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Newline-delimited journal file on a persistent medium.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl FileJournal {
    /// Opens (or creates) `dir/file_name`. With `create_dir` unset the
    /// directory must already exist, which is how a missing removable medium
    /// shows up.
    pub fn open(dir: &Path, file_name: &str, create_dir: bool) -> Result<Self, QueueError> {
        if create_dir {
            fs::create_dir_all(dir)?;
        } else if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not mounted", dir.display()),
            )
            .into());
        }

        let path = dir.join(file_name);
        let tmp_path = dir.join(format!("{file_name}.tmp"));

        // Writability probe; also leaves an empty journal behind.
        let file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;
        terminate_torn_tail(file, &path)?;

        // A leftover from an interrupted rewrite is stale: the rename never
        // happened, so the journal itself is still whole.
        if tmp_path.exists() {
            warn!("journal: removing stale {}", tmp_path.display());
            fs::remove_file(&tmp_path)?;
        }

        Ok(Self { path, tmp_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<u8>, QueueError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn rewrite(&self, rest: &[u8]) -> Result<(), QueueError> {
        {
            let mut tmp = File::create(&self.tmp_path)?;
            tmp.write_all(rest)?;
            tmp.sync_all()?;
        }
        fs::rename(&self.tmp_path, &self.path)?;
        Ok(())
    }
}

/// A crash mid-append leaves the last line without its newline. Closing it
/// here keeps the next append on a line of its own, so only the fragment is
/// lost.
fn terminate_torn_tail(mut file: File, path: &Path) -> Result<(), QueueError> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        warn!("journal: {} ends in a partial record, closing it", path.display());
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}

/// Splits off the first non-blank line. Returns the line and the remainder.
fn split_first_line(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut rest = bytes;
    while !rest.is_empty() {
        let (line, tail) = match rest.iter().position(|&b| b == b'\n') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, &rest[rest.len()..]),
        };
        if !line.iter().all(|b| b.is_ascii_whitespace()) {
            return Some((line, tail));
        }
        rest = tail;
    }
    None
}

impl Journal for FileJournal {
    fn append(&mut self, record: &QueueRecord) -> Result<(), QueueError> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut line = Vec::with_capacity(record.len() + 1);
        line.extend_from_slice(record.as_str().as_bytes());
        line.push(b'\n');
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    fn len(&self) -> Result<usize, QueueError> {
        let bytes = self.read_all()?;
        Ok(bytes
            .split(|&b| b == b'\n')
            .filter(|line| !line.iter().all(|b| b.is_ascii_whitespace()))
            .count())
    }

    fn peek_front(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let bytes = self.read_all()?;
        Ok(split_first_line(&bytes).map(|(line, _)| line.to_vec()))
    }

    fn pop_front(&mut self) -> Result<Option<Vec<u8>>, QueueError> {
        let bytes = self.read_all()?;
        let Some((line, rest)) = split_first_line(&bytes) else {
            return Ok(None);
        };
        let line = line.to_vec();
        self.rewrite(rest)?;
        debug!("journal: popped {} bytes from {}", line.len(), self.path.display());
        Ok(Some(line))
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
