//! Query, classify and aggregate the `systeminfo` serial number of a list of hosts.

mod classify;
mod client;
mod sweep;

pub use classify::{classify, extract_serial, looks_like_json};
pub use client::{systeminfo_url, HttpGet, QueryOptions, SystemInfoClient, Transport, SYSTEMINFO_PATH};
pub use sweep::{sweep, SweepOptions, SweepSummary, MAX_CONCURRENCY};
