use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any target is queried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("credential file '{path}' could not be read: {source}")]
    CredentialsUnreadable { path: PathBuf, #[source] source: std::io::Error },
    #[error("credential file '{path}' must contain at least two lines (username then password)")]
    CredentialsTooShort { path: PathBuf },
    #[error("the first line (username) in '{path}' is empty")]
    UsernameEmpty { path: PathBuf },
    #[error("the second line (password) in '{path}' is empty")]
    PasswordEmpty { path: PathBuf },
    #[error("target file '{path}' could not be read: {source}")]
    TargetsUnreadable { path: PathBuf, #[source] source: std::io::Error },
    #[error("target file '{path}' is not a readable table: {message}")]
    TargetsMalformed { path: PathBuf, message: String },
    #[error("target file '{path}' is empty or contains no valid server addresses")]
    TargetsEmpty { path: PathBuf },
    #[error("report '{path}' could not be opened for writing: {source}")]
    ReportUnwritable { path: PathBuf, #[source] source: std::io::Error },
    #[error("config file '{path}' is invalid: {message}")]
    ConfigInvalid { path: PathBuf, message: String },
}
