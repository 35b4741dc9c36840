use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::SweepResult;
use crate::trace::trace::SweepEvent;

/// JSONL sink for `SweepEvent`s.
///
/// A trace that cannot be written is reported through `tracing` and
/// otherwise ignored; the sweep carries on without it.
pub struct TraceLogger {
    sink: Option<TraceSink>,
}

struct TraceSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

struct SinkState {
    writer: BufWriter<File>,
    lines: u64,
}

impl TraceSink {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("trace sink lock poisoned"))?;
        writeln!(state.writer, "{}", line)?;
        state.lines += 1;
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("trace sink lock poisoned"))?;
        state.writer.flush()
    }

    fn lines(&self) -> u64 {
        self.state.lock().map(|s| s.lines).unwrap_or(0)
    }
}

impl TraceLogger {
    /// Open `path` for appending, creating missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> SweepResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "trace file opened");
        Ok(Self {
            sink: Some(TraceSink {
                path: path.to_path_buf(),
                state: Mutex::new(SinkState {
                    writer: BufWriter::new(file),
                    lines: 0,
                }),
            }),
        })
    }

    /// Like `open`, but falls back to a disabled logger.
    pub fn new(path: &str) -> Self {
        Self::open(path).unwrap_or_else(|e| {
            warn!(path, error = %e, "could not open trace file, tracing disabled");
            Self::disabled()
        })
    }

    /// A logger that writes nothing.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    /// Events written since the logger was opened.
    pub fn lines_written(&self) -> u64 {
        self.sink.as_ref().map(TraceSink::lines).unwrap_or(0)
    }

    pub fn record(&self, event: &SweepEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(phase = ?event.phase, error = %e, "trace event not serializable");
                return;
            }
        };
        if let Err(e) = sink.append(&line) {
            warn!(path = %sink.path.display(), error = %e, "trace event not written");
        }
    }

    pub fn flush(&self) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.flush() {
                warn!(path = %sink.path.display(), error = %e, "trace file not flushed");
            }
        }
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
