//! GitHub Actions workflow commands and step outputs.
//!
//! Annotations and log groups are plain lines on stdout; step outputs are
//! appended to the file named by `GITHUB_OUTPUT`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

pub fn error(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "::error::{}", escape_data(message))
}

pub fn warning(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "::warning::{}", escape_data(message))
}

/// Writes `lines` inside a collapsible log group.
pub fn group<'a, I>(out: &mut dyn Write, title: &str, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    writeln!(out, "::group::{}", title)?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    writeln!(out, "::endgroup::")
}

// Workflow commands end at the first newline, so multi-line messages must be encoded.
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Step output file (`GITHUB_OUTPUT`).
#[derive(Debug, Clone)]
pub struct StepOutputs {
    path: PathBuf,
}

impl StepOutputs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one `key=value` line per pair, creating the file if needed.
    pub fn append(&self, pairs: &[(&str, &str)]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buffer = String::new();
        for (key, value) in pairs {
            buffer.push_str(&format_output(key, value));
        }
        file.write_all(buffer.as_bytes())?;

        debug!(path = %self.path.display(), count = pairs.len(), "Appended step outputs");
        Ok(())
    }
}

fn format_output(key: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{key}={value}\n")
    }
}
