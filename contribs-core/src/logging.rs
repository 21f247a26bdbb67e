//! Log tee
//!
//! Every line the run prints is duplicated to an append-only log file. The
//! tee is acquired once at startup and installed as the tracing subscriber's
//! writer; nothing else in the pipeline touches the log file directly.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::EnvFilter;

/// `MakeWriter` that duplicates every write to stdout and a shared
/// append-only file.
#[derive(Clone)]
pub struct TeeWriter {
    file: Arc<Mutex<File>>,
}

impl TeeWriter {
    /// Open `path` for appending, creating it if needed.
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl<'a> MakeWriter<'a> for TeeWriter {
    type Writer = TeeGuard;

    fn make_writer(&'a self) -> Self::Writer {
        TeeGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// One write handle handed out per event.
pub struct TeeGuard {
    file: Arc<Mutex<File>>,
}

impl Write for TeeGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Ok(mut file) = self.file.lock() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Ok(mut file) = self.file.lock() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global subscriber: `level`-filtered, plain lines (no ANSI —
/// the same bytes land in the log file), mirrored to `log_path`.
pub fn init(log_path: &Path, level: &str) -> Result<()> {
    let tee = TeeWriter::append(log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .with_ansi(false)
        .with_writer(tee)
        .init();

    Ok(())
}
