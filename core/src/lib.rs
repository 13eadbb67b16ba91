//! Core types shared by the serial sweep crates.

use std::fmt;
use std::io;

pub mod error;

pub use error::ConfigError;

/// Placeholder written when a well-formed response carries no `sn` field.
pub const SN_NOT_FOUND: &str = "SN_NOT_FOUND";

/// Header of the report table.
pub const REPORT_HEADER: [&str; 2] = ["Server Address", "Serial Number"];

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Host identifier (hostname or address). Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(pub String);

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target(s.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Basic Auth pair shared by every query of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Classified result of querying one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Success(String),
    TransportFailure { signal: String, detail: String },
    EmptyResponse,
    MalformedResponse(String),
    ToolingFailure(String),
}

impl QueryOutcome {
    /// Short kind tag, used for logging and run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOutcome::Success(_) => "success",
            QueryOutcome::TransportFailure { .. } => "transport",
            QueryOutcome::EmptyResponse => "empty",
            QueryOutcome::MalformedResponse(_) => "malformed",
            QueryOutcome::ToolingFailure(_) => "tooling",
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Success(sn) => f.write_str(sn),
            QueryOutcome::TransportFailure { signal, detail } => write!(f, "TRANSPORT ERROR ({}): {}", signal, detail),
            QueryOutcome::EmptyResponse => f.write_str("EMPTY RESPONSE: no API response received (might be empty or timeout)."),
            QueryOutcome::MalformedResponse(body) => write!(f, "UNEXPECTED RESPONSE: {}", body),
            QueryOutcome::ToolingFailure(detail) => write!(f, "TOOLING ERROR: {}", detail),
        }
    }
}

/// One line of the report: the target and its flattened outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub target: Target,
    pub rendered: String,
}

impl ReportRow {
    pub fn new(target: Target, outcome: &QueryOutcome) -> Self {
        ReportRow { target, rendered: outcome.to_string() }
    }
}

/// Destination for report rows, written in target order.
pub trait ReportSink {
    fn write_row(&mut self, row: &ReportRow) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ReportSink for Vec<ReportRow> {
    fn write_row(&mut self, row: &ReportRow) -> io::Result<()> {
        self.push(row.clone());
        Ok(())
    }
}
