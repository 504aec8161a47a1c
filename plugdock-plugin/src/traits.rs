//! Collaborator traits
//!
//! The install service only talks to the outside world through these seams:
//! a remote plugin directory, the site's installed-plugin registry and the
//! package installer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FailureKind, InstallError};

/// Plugin metadata returned by a directory lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Plugin slug
    #[serde(default)]
    pub slug: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Latest version
    #[serde(default)]
    pub version: Option<String>,
    /// Package download URL
    #[serde(default)]
    pub download_link: Option<String>,
}

/// Header data of an installed plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstalledPlugin {
    /// Plugin name from the header
    pub name: String,
    /// Plugin version from the header
    pub version: Option<String>,
}

/// Whether installer diagnostics should go through translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticText {
    /// Translate with the installer's catalog
    #[default]
    Localized,
    /// Emit the source phrases untouched
    Untranslated,
}

/// Result signal of one install call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// Package installed
    Installed,
    /// Definitive error
    Error(InstallError),
    /// Install did not happen; the kind is known only when the installer can tell
    Failed(Option<FailureKind>),
}

/// Outcome of one install call, with the diagnostics emitted along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub status: InstallStatus,
    pub messages: Vec<String>,
}

impl InstallOutcome {
    pub fn installed(messages: Vec<String>) -> Self {
        Self { status: InstallStatus::Installed, messages }
    }

    pub fn failed(kind: Option<FailureKind>, messages: Vec<String>) -> Self {
        Self { status: InstallStatus::Failed(kind), messages }
    }

    pub fn error(error: InstallError, messages: Vec<String>) -> Self {
        Self { status: InstallStatus::Error(error), messages }
    }
}

/// Remote plugin directory
#[async_trait]
pub trait PluginDirectory: Send + Sync {
    /// Fetch metadata for a slug. Errors are reported to the caller verbatim.
    async fn plugin_information(&self, slug: &str) -> Result<PluginMetadata, InstallError>;
}

/// Installed-plugin registry of a site
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// All installed plugins keyed by canonical id (`slug/file.php`)
    async fn installed_plugins(&self) -> BTreeMap<String, InstalledPlugin>;

    /// First canonical id containing `slug`
    async fn find_by_slug(&self, slug: &str) -> Option<String> {
        self.installed_plugins()
            .await
            .into_keys()
            .find(|id| id.contains(slug))
    }
}

/// Package install mechanism
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install the package found at `package`
    async fn install(&self, package: &str, text: DiagnosticText) -> InstallOutcome;
}

/// Maps unstructured install diagnostics to a failure kind
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, last: Option<&str>, messages: &[String]) -> FailureKind;
}
