pub mod commands;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::MergedPullRequest;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write step output file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Output '{name}' contains the delimiter '{delimiter}'")]
    DelimiterCollision { name: String, delimiter: String },
}

/// Destination for named step outputs.
pub trait OutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError>;
}

/// Step outputs for a resolved pull request.
///
/// `labels` and `assignees` are newline-joined and stay `None` when the
/// pull request has none, so the output is left unset rather than empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub title: String,
    pub body: String,
    pub number: u64,
    pub labels: Option<String>,
    pub assignees: Option<String>,
    pub author: String,
}

impl Outputs {
    pub fn from_pull_request(pr: &MergedPullRequest) -> Self {
        Outputs {
            title: pr.title.clone(),
            body: pr.body.clone().unwrap_or_default(),
            number: pr.number,
            labels: join_lines(&pr.labels),
            assignees: join_lines(&pr.assignees),
            author: pr.author.clone(),
        }
    }

    /// Name/value pairs in publication order, skipping absent values.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("title", self.title.clone()),
            ("body", self.body.clone()),
            ("number", self.number.to_string()),
        ];
        if let Some(labels) = &self.labels {
            entries.push(("labels", labels.clone()));
        }
        if let Some(assignees) = &self.assignees {
            entries.push(("assignees", assignees.clone()));
        }
        entries.push(("author", self.author.clone()));
        entries
    }

    #[instrument(skip_all, fields(pr = self.number))]
    pub fn publish(&self, sink: &mut dyn OutputSink) -> Result<(), OutputError> {
        for (name, value) in self.entries() {
            debug!(name, "setting output");
            sink.set_output(name, &value)?;
        }
        Ok(())
    }
}

fn join_lines(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join("\n"))
    }
}

/// Appends outputs to the file named by `GITHUB_OUTPUT` using the
/// multi-line `name<<DELIMITER` form.
#[derive(Debug)]
pub struct GithubOutputFile {
    path: PathBuf,
}

impl GithubOutputFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for GithubOutputFile {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
        if name.contains(&delimiter) || value.contains(&delimiter) {
            return Err(OutputError::DelimiterCollision {
                name: name.to_string(),
                delimiter,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")?;
        Ok(())
    }
}

/// Emits legacy `::set-output` commands on stdout, for runners without
/// `GITHUB_OUTPUT` and for local runs.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        println!("{}", commands::format_command("set-output", &[("name", name)], value));
        Ok(())
    }
}

/// Pick the sink the runner expects.
pub fn sink_from_env() -> Box<dyn OutputSink> {
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(path) if !path.is_empty() => Box::new(GithubOutputFile::new(path)),
        _ => Box::new(StdoutSink),
    }
}
