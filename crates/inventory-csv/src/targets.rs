use std::path::Path;
use sweep_core::{ConfigError, Target};

/// Read the first column of every record in a comma-delimited table.
/// Blank first fields and `#` comment rows are skipped; order and duplicates are kept.
pub fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    let file = std::fs::File::open(path)
        .map_err(|source| ConfigError::TargetsUnreadable { path: path.to_path_buf(), source })?;
    let targets = read_targets(file).map_err(|e| ConfigError::TargetsMalformed { path: path.to_path_buf(), message: e.to_string() })?;
    if targets.is_empty() {
        return Err(ConfigError::TargetsEmpty { path: path.to_path_buf() });
    }
    log::debug!("loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

pub fn read_targets<R: std::io::Read>(rdr: R) -> Result<Vec<Target>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(first) = record.get(0) else { continue };
        let t = first.trim_start_matches('\u{feff}').trim();
        if t.is_empty() || t.starts_with('#') { continue; }
        out.push(Target(t.to_string()));
    }
    Ok(out)
}

/// Sample host list written by `serials init`.
pub const TEMPLATE: &str = "192.168.0.122\napi.example.com\nnonexistent-server.local\n";

/// Write the sample host list unless a file already exists. Returns whether it was created.
pub fn write_template(path: &Path) -> anyhow::Result<bool> {
    if path.exists() { return Ok(false); }
    std::fs::write(path, TEMPLATE)?;
    Ok(true)
}
