//! Request and report types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::InstallError;

/// Plugins to install and how failures are handled.
///
/// A request body that leaves out `bulk` is a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InstallRequest {
    /// Plugin slugs, in install order
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Record item failures instead of aborting
    #[serde(default = "default_bulk")]
    pub bulk: bool,
}

fn default_bulk() -> bool {
    true
}

impl InstallRequest {
    /// Non-bulk request for one slug
    pub fn single(slug: impl Into<String>) -> Self {
        Self {
            plugins: vec![slug.into()],
            bulk: false,
        }
    }

    /// Bulk request for several slugs
    pub fn bulk(plugins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            plugins: plugins.into_iter().map(Into::into).collect(),
            bulk: true,
        }
    }
}

/// Download URLs resolved during validation, keyed by slug
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPackages {
    links: HashMap<String, String>,
}

impl ResolvedPackages {
    pub fn insert(&mut self, slug: impl Into<String>, download_link: impl Into<String>) {
        self.links.insert(slug.into(), download_link.into());
    }

    pub fn get(&self, slug: &str) -> Option<&str> {
        self.links.get(slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Log of one plugin's install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallLogEntry {
    /// Raw installer diagnostics, in emission order
    pub messages: Vec<String>,
    /// Classified error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallLogEntry {
    /// Record an error, replacing any earlier one
    pub fn fail(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.error_code = Some(code.into());
        self.error = Some(message.into());
    }

    pub fn is_failed(&self) -> bool {
        self.error_code.is_some()
    }

    /// The recorded error as an [`InstallError`]
    pub fn to_error(&self) -> Option<InstallError> {
        let code = self.error_code.as_ref()?;
        Some(InstallError::new(code.clone(), self.error.clone().unwrap_or_default()))
    }
}

/// Successful install response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Requested plugins; slugs that resolved are replaced by canonical ids
    pub plugins: Vec<String>,
    /// Per-plugin log keyed by canonical id (or slug if it did not resolve)
    pub log: BTreeMap<String, InstallLogEntry>,
}

/// Result of an install call
pub type InstallResult = Result<InstallReport, InstallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize_defaults_to_bulk() {
        let request: InstallRequest = serde_json::from_str(r#"{"plugins": ["akismet"]}"#).unwrap();
        assert_eq!(request, InstallRequest::bulk(["akismet"]));

        let request: InstallRequest = serde_json::from_str(r#"{"plugins": ["akismet"], "bulk": false}"#).unwrap();
        assert_eq!(request, InstallRequest::single("akismet"));

        let request: InstallRequest = serde_json::from_str("{}").unwrap();
        assert!(request.plugins.is_empty());
    }

    #[test]
    fn test_log_entry_error() {
        let mut entry = InstallLogEntry::default();
        assert!(entry.to_error().is_none());

        entry.fail("install_error", "first");
        entry.fail("install_error_fs_unavailable", "Could not access filesystem.");
        let err = entry.to_error().unwrap();
        assert_eq!(err.code, "install_error_fs_unavailable");
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_report_serialization_skips_empty_errors() {
        let mut report = InstallReport {
            plugins: vec!["hello-dolly/hello.php".to_string()],
            ..Default::default()
        };
        report.log.insert(
            "hello-dolly/hello.php".to_string(),
            InstallLogEntry {
                messages: vec!["Plugin installed successfully.".to_string()],
                ..Default::default()
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["plugins"][0], "hello-dolly/hello.php");
        assert!(json["log"]["hello-dolly/hello.php"].get("error").is_none());
    }
}
