//! Install error types

use serde::Serialize;
use thiserror::Error;

/// HTTP-like status attached to every install error
pub const ERROR_STATUS: u16 = 400;

/// Structured error returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct InstallError {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// HTTP-like status
    pub status: u16,
}

impl InstallError {
    /// Create an error with the default status
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: ERROR_STATUS,
        }
    }

    /// No usable plugin identifiers were supplied
    pub fn missing_plugins() -> Self {
        Self::new("missing_plugins", "No plugins found.")
    }

    /// A requested slug already matches an installed plugin
    pub fn already_installed() -> Self {
        Self::new("plugin_already_installed", "The plugin is already installed")
    }

    /// The plugin directory could not be queried or answered with an error
    pub fn directory_failed(message: impl Into<String>) -> Self {
        Self::new("plugins_api_failed", message)
    }

    /// The plugin directory did not answer in time
    pub fn directory_timeout() -> Self {
        Self::new("plugins_api_timeout", "The plugin directory did not respond in time.")
    }

    /// Install failure with a classified reason
    pub fn install_failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(kind.code(), message)
    }
}

/// Why a package install failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Unrecognised failure
    Generic,
    /// The plugins directory could not be accessed
    FilesystemUnavailable,
    /// A directory or file could not be created
    FilesystemFull,
    /// The destination plugin folder already exists
    FolderExists,
    /// The package could not be downloaded
    PackageNotAvailable,
    /// The install did not finish in time
    Timeout,
}

impl FailureKind {
    /// Stable error code reported to callers
    pub fn code(self) -> &'static str {
        match self {
            Self::Generic => "install_error",
            Self::FilesystemUnavailable => "install_error_fs_unavailable",
            Self::FilesystemFull => "install_error_filesystem_full",
            Self::FolderExists => "install_error_folder_exists",
            Self::PackageNotAvailable => "install_error_package_not_available",
            Self::Timeout => "install_error_timeout",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_with_status() {
        let err = InstallError::already_installed();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "plugin_already_installed");
        assert_eq!(json["status"], 400);
    }

    #[test]
    fn test_install_failed_uses_kind_code() {
        let err = InstallError::install_failed(FailureKind::FolderExists, "Plugin install failed.");
        assert_eq!(err.code, "install_error_folder_exists");
        assert_eq!(err.to_string(), "install_error_folder_exists: Plugin install failed.");
    }
}
