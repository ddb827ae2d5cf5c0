use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;

/// The currently open day's stream. `writer` is only `Some` while `date` is `Some`.
#[derive(Default)]
struct FileState {
    date: Option<String>,
    writer: Option<BufWriter<File>>,
}

/// Appends plain access-log lines to `<folder>/<YYYY-MM-DD>.log`.
///
/// The stream is opened lazily on the first write of a UTC calendar day. When a write
/// arrives for a different day the stale stream is flushed and closed before the new
/// one is opened.
pub struct DailyFileSink {
    folder: PathBuf,
    state: Mutex<FileState>,
}

impl DailyFileSink {
    /// Create a sink for `folder`. Nothing touches the filesystem until the first write.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            state: Mutex::new(FileState::default()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name used for the day containing `time`.
    pub fn file_name(time: &DateTime<Utc>) -> String {
        format!("{}.log", Self::date_key(time))
    }

    /// Path of the file that a write at `time` lands in.
    pub fn path_for(&self, time: &DateTime<Utc>) -> PathBuf {
        self.folder.join(Self::file_name(time))
    }

    /// UTC date of the open stream, if any.
    pub fn current_date(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.date.clone())
    }

    /// Append `line` to the file for `time`'s UTC date, rotating if the date changed.
    pub fn write(&self, time: &DateTime<Utc>, line: &str) -> io::Result<()> {
        let date = Self::date_key(time);
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("file sink lock poisoned"))?;

        if state.date.as_deref() != Some(date.as_str()) || state.writer.is_none() {
            Self::close_state(&mut state)?;

            fs::create_dir_all(&self.folder)?;
            let path = self.folder.join(format!("{}.log", date));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            debug!(path = %path.display(), "opened access log file");

            state.writer = Some(BufWriter::new(file));
            state.date = Some(date);
        }

        if let Some(writer) = state.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and close the open stream. The next write reopens lazily.
    pub fn close(&self) -> io::Result<()> {
        match self.state.lock() {
            Ok(mut state) => Self::close_state(&mut state),
            Err(_) => Ok(()),
        }
    }

    fn close_state(state: &mut FileState) -> io::Result<()> {
        state.date = None;
        if let Some(mut writer) = state.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn date_key(time: &DateTime<Utc>) -> String {
        time.format("%Y-%m-%d").to_string()
    }
}

impl Drop for DailyFileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for DailyFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyFileSink")
            .field("folder", &self.folder)
            .field("current_date", &self.current_date())
            .finish()
    }
}
