//! Process-wide log target shared by the host and the engine.
//!
//! The engine logs through a single global target, so this module keeps one
//! too: [`TARGET`] holds the open log file, and every [`LogWriter`] handed out
//! writes into it a whole line at a time. The `log` facade is routed to the
//! same target by [`install_logger`].

use crate::error::log_sink::LogSinkError;

use common::ErrorLocation;

use std::fs::{File, OpenOptions};
use std::io::{Result as IoResult, Write};
use std::mem::{replace, take};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use fern::Dispatch;
use humantime::format_rfc3339_micros;
use log::{LevelFilter, debug};

/// The target every component in the process logs to.
pub static TARGET: LogTarget = LogTarget::new();

/// Whether the process logger has been installed.
static LOGGER: LoggerSlot = LoggerSlot::new();

/// Tag written at the start of every line; replaced on each install.
static LOG_PREFIX: RwLock<String> = RwLock::new(String::new());

struct OpenTarget {
    path: PathBuf,
    file: File,
}

pub struct LogTarget {
    inner: Mutex<Option<OpenTarget>>,
}

impl LogTarget {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Open `path` for appending, creating it if needed, and route all
    /// writers to it. A previously opened file is closed.
    #[track_caller]
    pub fn open_file(&self, path: &Path) -> Result<(), LogSinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LogSinkError::Open {
                path: path.to_path_buf(),
                location: ErrorLocation::caller(),
                source: e,
            })?;

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *inner = Some(OpenTarget {
            path: path.to_path_buf(),
            file,
        });
        Ok(())
    }

    /// Drop the file handle. Writes are discarded until the next `open_file`.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut open) = inner.take() {
            let _ = open.file.flush();
        }
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|open| open.path.clone())
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// A new line-buffered writer into this target.
    pub fn writer(&'static self) -> LogWriter {
        LogWriter {
            target: self,
            pending: Vec::new(),
        }
    }

    fn write_chunk(&self, chunk: &[u8]) -> IoResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.as_mut() {
            Some(open) => open.file.write_all(chunk),
            None => Ok(()),
        }
    }
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer handle into a [`LogTarget`].
///
/// Bytes are held until a newline arrives; each complete line then goes to
/// the file in one locked write.
pub struct LogWriter {
    target: &'static LogTarget,
    pending: Vec<u8>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.pending.extend_from_slice(buf);

        if let Some(end) = self.pending.iter().rposition(|b| *b == b'\n') {
            let rest = self.pending.split_off(end + 1);
            let lines = replace(&mut self.pending, rest);
            self.target.write_chunk(&lines)?;
        }

        Ok(buf.len())
    }

    /// Writes out a trailing partial line, if any.
    fn flush(&mut self) -> IoResult<()> {
        if !self.pending.is_empty() {
            let partial = take(&mut self.pending);
            self.target.write_chunk(&partial)?;
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Install-once slot that only remembers a successful install.
///
/// A failed install leaves the slot empty, so the next caller tries again
/// and sees the failure itself.
pub(crate) struct LoggerSlot {
    installed: Mutex<bool>,
}

impl LoggerSlot {
    pub(crate) const fn new() -> Self {
        Self {
            installed: Mutex::new(false),
        }
    }

    /// Run `install` unless a previous run succeeded. Returns whether it ran.
    pub(crate) fn install_with(
        &self,
        install: impl FnOnce() -> Result<(), LogSinkError>,
    ) -> Result<bool, LogSinkError> {
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        if *installed {
            return Ok(false);
        }

        install()?;
        *installed = true;
        Ok(true)
    }
}

/// Route the `log` facade to [`TARGET`].
///
/// The global logger can only be set once per process. Later calls replace
/// the prefix and level and return Ok.
///
/// # Errors
///
/// Returns [`LogSinkError::Install`] if another logger was already installed
/// by someone else. Every later call fails the same way.
pub fn install_logger(prefix: &str, level: LevelFilter) -> Result<(), LogSinkError> {
    *LOG_PREFIX.write().unwrap_or_else(PoisonError::into_inner) = prefix.to_string();

    let fresh = LOGGER.install_with(install_internal)?;
    log::set_max_level(level);

    if !fresh {
        debug!("Logger already installed, level set to {level:?}");
    }
    Ok(())
}

fn install_internal() -> Result<(), LogSinkError> {
    let target: Box<dyn Write + Send> = Box::new(TARGET.writer());

    Dispatch::new()
        .level(LevelFilter::Trace)
        .format(|out, message, record| {
            let prefix = LOG_PREFIX.read().unwrap_or_else(PoisonError::into_inner);
            out.finish(format_args!(
                "{prefix}[{date} - {level}] {message}",
                prefix = prefix.as_str(),
                date = format_rfc3339_micros(SystemTime::now()),
                level = record.level(),
                message = message,
            ))
        })
        .chain(target)
        .apply()
        .map_err(|e| LogSinkError::Install {
            message: format!("Failed to install logger: {e}"),
            location: ErrorLocation::caller(),
        })?;

    Ok(())
}
