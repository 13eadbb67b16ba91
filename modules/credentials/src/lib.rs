//! Loads the shared Basic Auth credential from a two-line secret file.

use std::path::Path;
use sweep_core::{ConfigError, Credential};

/// Read `path`: line 1 is the username, line 2 the password. Both are trimmed.
pub fn load_credential(path: &Path) -> Result<Credential, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::CredentialsUnreadable { path: path.to_path_buf(), source })?;
    let cred = parse_credential(path, &content)?;
    log::debug!("loaded credential for user '{}' from {}", cred.username, path.display());
    Ok(cred)
}

pub fn parse_credential(path: &Path, content: &str) -> Result<Credential, ConfigError> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 {
        return Err(ConfigError::CredentialsTooShort { path: path.to_path_buf() });
    }
    let username = lines[0].trim();
    let password = lines[1].trim();
    if username.is_empty() { return Err(ConfigError::UsernameEmpty { path: path.to_path_buf() }); }
    if password.is_empty() { return Err(ConfigError::PasswordEmpty { path: path.to_path_buf() }); }
    Ok(Credential { username: username.to_string(), password: password.to_string() })
}

/// Placeholder secret written by `serials init`.
pub const TEMPLATE: &str = "your_username_here\nyour_secure_password_here\n";

/// Write the template secret unless a file already exists. Returns whether it was created.
pub fn write_template(path: &Path) -> anyhow::Result<bool> {
    if path.exists() { return Ok(false); }
    std::fs::write(path, TEMPLATE)?;
    Ok(true)
}
