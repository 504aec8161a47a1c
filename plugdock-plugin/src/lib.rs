//! Plugdock Plugin Installer
//!
//! Resolves plugin slugs against a remote directory, installs the packages
//! into a site's plugins directory and reports per-item results.

mod classifier;
mod diagnostics;
mod directory;
mod error;
mod package;
mod registry;
mod request;
mod service;
#[cfg(test)]
mod testing;
mod traits;
mod validator;

pub use classifier::{classify_message, MessageClassifier};
pub use diagnostics::MessageCatalog;
pub use directory::HttpPluginDirectory;
pub use error::{FailureKind, InstallError};
pub use package::ZipPackageInstaller;
pub use registry::FsPluginRegistry;
pub use request::{InstallLogEntry, InstallReport, InstallRequest, InstallResult, ResolvedPackages};
pub use service::InstallService;
pub use traits::{
    DiagnosticText, FailureClassifier, InstallOutcome, InstallStatus, InstalledPlugin,
    PackageInstaller, PluginDirectory, PluginMetadata, PluginRegistry,
};
pub use validator::Validator;
