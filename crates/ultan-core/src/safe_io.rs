//! Safe file I/O utilities: atomic replacement, single-write appends and
//! advisory locking.
//!
//! - [`atomic_write()`] / [`atomic_write_text()`] - temp sibling + rename
//! - [`append_line()`] - one buffered write in append mode
//! - [`FileLock`] - RAII exclusive lock using fs2
//!
//! Every document that gets replaced (codex, fresh session files, quarantined
//! output) goes through [`atomic_write()`], so a reader sees either the old
//! file or the new one, never a prefix of it.

use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary sibling used while replacing `path`: `codex.md` -> `codex.md.tmp`.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically write bytes to a file.
///
/// Writes to a `.tmp` sibling, fsyncs it, then renames over the target.
/// Parent directories are created if needed.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, synced,
/// or renamed. On failure the temporary file is removed on a best-effort basis
/// and the target is left as it was.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_sibling(path);
    let result = write_and_rename(&tmp_path, path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }

    // Sync to disk before rename
    file.sync_all()?;

    // Atomic rename (on same filesystem)
    fs::rename(tmp_path, path)
}

/// Atomically write text to a file (UTF-8).
pub fn atomic_write_text(path: &Path, text: &str) -> io::Result<()> {
    atomic_write(path, text.as_bytes())
}

/// Append `line` to an existing file with a single `write_all`, then flush.
///
/// The file must already exist; `NotFound` is returned otherwise. The caller
/// supplies the trailing newline.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()
}

/// RAII file lock using fs2 exclusive locking.
///
/// The lock is acquired when created and released when dropped. Advisory
/// only: processes must cooperate by locking the same path.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on `lock_path`, blocking until it is free.
    ///
    /// Creates the lock file (and its parent directories) if needed.
    pub fn acquire(lock_path: &Path) -> io::Result<Self> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        file.lock_exclusive()?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Ignore errors during drop
        let _ = FileExt::unlock(&self.file);
    }
}
