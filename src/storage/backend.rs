//! # Byte-I/O Backend
//!
//! The engine never touches the filesystem directly; every byte goes
//! through [`FileBackend`]. The trait is deliberately shaped like the C
//! stdio surface the engine grew up with (`fopen`/`fseek`/`ftell`/`fread`/
//! `fwrite`), so an embedded port wraps its filesystem library in a few
//! dozen lines. The three open modes correspond to the classic mode
//! strings:
//!
//! | Mode                  | Token   | Behavior                          |
//! |-----------------------|---------|-----------------------------------|
//! | [`OpenMode::Read`]      | `"rb"`  | read-only, fails if absent        |
//! | [`OpenMode::ReadWrite`] | `"rb+"` | read-write, fails if absent       |
//! | [`OpenMode::Truncate`]  | `"wb+"` | read-write, creates or truncates  |
//!
//! A backend owns at most one open file; opening a new name implicitly
//! closes the previous one. `read` may return fewer bytes than requested
//! (short read); whether that is an error is the caller's decision. The
//! index treats a short read as recoverable only on the final, partially
//! filled page.
//!
//! [`StdFileBackend`] is the `std::fs` implementation, rooted at a base
//! directory so the engine can keep using bare 8.3-style names.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use eyre::{ensure, eyre, Result, WrapErr};

/// File open mode, mirroring the `"rb"` / `"rb+"` / `"wb+"` stdio tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; opening a nonexistent file fails.
    Read,
    /// Read-write on an existing file; opening a nonexistent file fails.
    ReadWrite,
    /// Read-write, creating the file or truncating an existing one.
    Truncate,
}

impl OpenMode {
    /// The classic stdio mode string, kept for diagnostics.
    pub fn token(self) -> &'static str {
        match self {
            OpenMode::Read => "rb",
            OpenMode::ReadWrite => "rb+",
            OpenMode::Truncate => "wb+",
        }
    }
}

/// Synchronous byte-level file access used by the engine for both the log
/// and the index file.
///
/// All offsets are absolute 32-bit byte positions; the engine's file
/// format caps files at 4 GiB by construction.
pub trait FileBackend {
    /// Opens `name` in the given mode, implicitly closing any previously
    /// open file.
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<()>;

    /// Closes the current file. Idempotent.
    fn close(&mut self);

    /// Seeks to an absolute byte offset.
    fn seek(&mut self, offset: u32) -> Result<()>;

    /// Seeks to the end of the file.
    fn seek_to_end(&mut self) -> Result<()>;

    /// Returns the current byte position.
    fn tell(&mut self) -> Result<u32>;

    /// Reads up to `buf.len()` bytes, returning the count actually read.
    /// A short count means end-of-file was reached.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes `buf`, returning the count actually written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
}

/// [`FileBackend`] over `std::fs`, rooted at a base directory.
#[derive(Debug)]
pub struct StdFileBackend {
    base: PathBuf,
    file: Option<File>,
}

impl StdFileBackend {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
            file: None,
        }
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or_else(|| eyre!("no file open"))
    }
}

impl FileBackend for StdFileBackend {
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<()> {
        self.close();
        let path = self.base.join(name);

        let file = match mode {
            OpenMode::Read => OpenOptions::new().read(true).open(&path),
            OpenMode::ReadWrite => OpenOptions::new().read(true).write(true).open(&path),
            OpenMode::Truncate => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path),
        }
        .wrap_err_with(|| {
            format!(
                "failed to open '{}' in {} mode",
                path.display(),
                mode.token()
            )
        })?;

        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn seek(&mut self, offset: u32) -> Result<()> {
        self.file()?
            .seek(SeekFrom::Start(u64::from(offset)))
            .wrap_err("seek failed")?;
        Ok(())
    }

    fn seek_to_end(&mut self) -> Result<()> {
        self.file()?
            .seek(SeekFrom::End(0))
            .wrap_err("seek to end failed")?;
        Ok(())
    }

    fn tell(&mut self) -> Result<u32> {
        let pos = self.file()?.stream_position().wrap_err("tell failed")?;
        ensure!(pos <= u64::from(u32::MAX), "file position {} exceeds u32", pos);
        Ok(pos as u32)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let file = self.file()?;
        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).wrap_err("read failed"),
            }
        }
        Ok(total)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let file = self.file()?;
        let mut total = 0;
        while total < buf.len() {
            match file.write(&buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).wrap_err("write failed"),
            }
        }
        Ok(total)
    }
}
