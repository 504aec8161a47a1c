//! Request validation

use crate::error::InstallError;
use crate::request::ResolvedPackages;
use crate::traits::{PluginDirectory, PluginRegistry};

/// Checks requested slugs and resolves their download links
pub struct Validator<'a> {
    directory: &'a dyn PluginDirectory,
    registry: &'a dyn PluginRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(directory: &'a dyn PluginDirectory, registry: &'a dyn PluginRegistry) -> Self {
        Self { directory, registry }
    }

    /// Resolve every slug or fail the whole request.
    ///
    /// A slug is rejected as already installed before the directory is asked
    /// about it. Directory errors are passed through unchanged.
    pub async fn validate(&self, plugins: &[String]) -> Result<ResolvedPackages, InstallError> {
        if plugins.is_empty() || !plugins.iter().all(|slug| is_valid_slug(slug)) {
            return Err(InstallError::missing_plugins());
        }

        let mut packages = ResolvedPackages::default();

        for slug in plugins {
            if let Some(id) = self.registry.find_by_slug(slug).await {
                tracing::debug!("{} is already installed as {}", slug, id);
                return Err(InstallError::already_installed());
            }

            let metadata = self.directory.plugin_information(slug).await?;
            let download_link = metadata
                .download_link
                .filter(|link| !link.is_empty())
                .ok_or_else(|| {
                    InstallError::directory_failed(format!("No download link is available for {}.", slug))
                })?;

            tracing::debug!("Resolved {} to {}", slug, download_link);
            packages.insert(slug.clone(), download_link);
        }

        Ok(packages)
    }
}

/// Directory slugs are lowercase ASCII letters, digits and hyphens
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
