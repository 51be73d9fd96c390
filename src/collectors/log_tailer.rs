use crate::error::TailError;
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Incremental reader over an append-only security log
///
/// The tailer keeps a byte offset into the log file. Each call to
/// [`poll`](LogTailer::poll) seeks to that offset, reads to the current end
/// of file and returns the complete lines written since the previous call.
/// The offset lives only in memory: a restarted process re-reads the file
/// from the start.
pub struct LogTailer {
    /// Path of the tailed log file
    path: PathBuf,
    /// Byte offset of the first unread byte; monotonically non-decreasing
    /// except for the rotation reset
    offset: u64,
}

impl LogTailer {
    /// Create a tailer over the given log file
    ///
    /// If the file does not exist it is created empty, so a fresh endpoint
    /// with no security log yet is not an error. Creation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `TailError::CreateFailed` if the file or its parent
    /// directory cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, TailError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        TailError::CreateFailed(format!("{}: {}", parent.display(), e))
                    })?;
                }
            }
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .map_err(|e| TailError::CreateFailed(format!("{}: {}", path.display(), e)))?;
            debug!("Created empty security log at {}", path.display());
        }

        Ok(Self { path, offset: 0 })
    }

    /// Read all complete lines appended since the last poll
    ///
    /// Only fully written lines (terminated by a newline) are returned; a
    /// trailing partial line stays unconsumed and is picked up once its
    /// newline arrives. Blank lines are skipped. The offset advances past
    /// every consumed byte whether or not the line later parses as a valid
    /// record.
    ///
    /// If the file has shrunk below the stored offset (rotation or
    /// truncation), the offset is reset to 0 and reading restarts from the
    /// beginning of the new file.
    ///
    /// # Errors
    ///
    /// Returns `TailError::IoError` if the file cannot be read. A missing
    /// file yields zero lines rather than an error.
    pub fn poll(&mut self) -> Result<Vec<String>, TailError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();

        if len < self.offset {
            warn!(
                "Security log {} shrank from offset {} to {} bytes, assuming rotation and re-reading from start",
                self.path.display(),
                self.offset,
                len
            );
            self.offset = 0;
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        // Consume only up to the last newline; a partial trailing line is
        // still being written.
        let consumed = match buffer.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => return Ok(Vec::new()),
        };

        let lines: Vec<String> = String::from_utf8_lossy(&buffer[..consumed])
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();

        self.offset += consumed as u64;
        debug!(
            "Tailed {} new lines from {} (offset now {})",
            lines.len(),
            self.path.display(),
            self.offset
        );

        Ok(lines)
    }

    /// Current byte offset into the log file
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
