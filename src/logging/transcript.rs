//! Operator transcript
//!
//! Every line shown to the operator can be mirrored into an append-only file,
//! each prefixed with a local timestamp.

use crate::domain::context::ResultExt;
use crate::domain::Result;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Console output plus an optional append-only mirror
pub struct Transcript {
    echo: bool,
    file: Option<(PathBuf, File)>,
}

impl Transcript {
    /// Prints to stdout only
    pub fn stdout() -> Self {
        Self {
            echo: true,
            file: None,
        }
    }

    /// Prints nothing; used by tests and embedding callers
    pub fn quiet() -> Self {
        Self {
            echo: false,
            file: None,
        }
    }

    /// Also appends every line to `path`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened for appending.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        self.file = Some((path, file));
        Ok(self)
    }

    /// Emits one line
    ///
    /// A failing mirror write is logged once and the mirror is dropped; the
    /// run itself is never interrupted by it.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if self.echo {
            println!("{text}");
        }

        if let Some((path, file)) = self.file.as_mut() {
            let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            if let Err(e) = writeln!(file, "{stamp} {text}") {
                tracing::warn!(path = %path.display(), error = %e, "Log file write failed, mirror disabled");
                self.file = None;
            }
        }
    }

    /// Emits several lines in order
    pub fn lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_mirror_appends_with_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "existing\n").unwrap();

        let mut transcript = Transcript::quiet().with_file(&path).unwrap();
        transcript.line("first");
        transcript.lines(["second", "third"]);
        drop(transcript);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "existing");
        assert!(lines[1].ends_with(" first"));
        assert!(lines[3].ends_with(" third"));
        // "YYYY-MM-DD HH:MM:SS.mmm " prefix
        assert_eq!(lines[1].len(), "2024-01-01 00:00:00.000 first".len());
    }

    #[test]
    fn test_with_file_bad_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir").join("run.log");
        assert!(Transcript::quiet().with_file(missing).is_err());
    }
}
