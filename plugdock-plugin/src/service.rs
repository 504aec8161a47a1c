//! Install orchestration

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use plugdock_core::config::{PlugdockConfig, SiteConfig};

use crate::classifier::MessageClassifier;
use crate::diagnostics::MessageCatalog;
use crate::directory::HttpPluginDirectory;
use crate::error::{FailureKind, InstallError};
use crate::package::ZipPackageInstaller;
use crate::registry::FsPluginRegistry;
use crate::request::{InstallLogEntry, InstallReport, InstallRequest, InstallResult, ResolvedPackages};
use crate::traits::{
    DiagnosticText, FailureClassifier, InstallOutcome, InstallStatus, InstalledPlugin,
    PackageInstaller, PluginDirectory, PluginRegistry,
};
use crate::validator::Validator;

const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Recorded when a plugin cannot be found in the registry after its install
const NOT_INSTALLED_MESSAGE: &str = "There was an error installing your plugin";

/// Recorded when an install fails without leaving any diagnostics
const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred during installation";

/// Installs plugins for one site
pub struct InstallService {
    directory: Arc<dyn PluginDirectory>,
    registry: Arc<dyn PluginRegistry>,
    installer: Arc<dyn PackageInstaller>,
    classifier: Arc<dyn FailureClassifier>,
    install_timeout: Duration,
}

impl InstallService {
    /// Create a service using the phrase-table classifier
    pub fn new(
        directory: Arc<dyn PluginDirectory>,
        registry: Arc<dyn PluginRegistry>,
        installer: Arc<dyn PackageInstaller>,
    ) -> Self {
        Self {
            directory,
            registry,
            installer,
            classifier: Arc::new(MessageClassifier),
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }

    /// Build the default stack for a configured site
    pub fn for_site(config: &PlugdockConfig, site: &SiteConfig) -> plugdock_core::Result<Self> {
        let directory = HttpPluginDirectory::new(&config.directory)?;
        let registry = FsPluginRegistry::new(&site.plugins_dir);
        let installer = ZipPackageInstaller::new(
            &site.plugins_dir,
            MessageCatalog::new(config.install.translations.clone()),
        );

        Ok(Self::new(Arc::new(directory), Arc::new(registry), Arc::new(installer))
            .with_install_timeout(Duration::from_secs(config.install.timeout_secs)))
    }

    /// Replace the failure classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Bound each package install
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// Validate the request without installing anything
    pub async fn validate(&self, plugins: &[String]) -> Result<ResolvedPackages, InstallError> {
        Validator::new(self.directory.as_ref(), self.registry.as_ref())
            .validate(plugins)
            .await
    }

    /// Validate and install every requested plugin
    pub async fn install_plugins(&self, mut request: InstallRequest) -> InstallResult {
        let mut seen = HashSet::new();
        request.plugins.retain(|slug| seen.insert(slug.clone()));

        tracing::info!(
            "Installing {} plugin(s) (bulk: {})",
            request.plugins.len(),
            request.bulk
        );

        let packages = self.validate(&request.plugins).await?;
        let result = self.install(request, &packages).await;

        match &result {
            Ok(report) => tracing::info!("Install finished: {}", report.plugins.join(", ")),
            Err(err) => tracing::warn!("Install failed: {}", err),
        }
        result
    }

    /// Install validated packages.
    ///
    /// Non-bulk requests stop at the first item that records an error and
    /// return it. Bulk requests record errors per item and keep going.
    async fn install(&self, request: InstallRequest, packages: &ResolvedPackages) -> InstallResult {
        let InstallRequest { mut plugins, bulk } = request;
        let mut log: BTreeMap<String, InstallLogEntry> = BTreeMap::new();

        for index in 0..plugins.len() {
            let slug = plugins[index].clone();
            let package = packages.get(&slug).ok_or_else(|| {
                InstallError::install_failed(FailureKind::Generic, format!("No package was resolved for {}.", slug))
            })?;

            let before = self.registry.installed_plugins().await;
            let outcome = self.run_installer(package).await;
            let plugin_id = self.new_plugin_id(&slug, &before, &log).await;

            let mut entry = InstallLogEntry::default();
            if plugin_id.is_none() {
                entry.fail(FailureKind::Generic.code(), NOT_INSTALLED_MESSAGE);
            }

            match outcome.status {
                InstallStatus::Installed => {}
                InstallStatus::Error(err) => {
                    if !bulk {
                        return Err(err);
                    }
                    entry.fail(err.code, err.message);
                }
                InstallStatus::Failed(kind) => {
                    let last = outcome.messages.last().map(String::as_str);
                    let kind = kind.unwrap_or_else(|| self.classifier.classify(last, &outcome.messages));
                    let message = last
                        .filter(|message| !message.is_empty())
                        .unwrap_or(UNKNOWN_ERROR_MESSAGE);
                    entry.fail(kind.code(), message);
                }
            }

            entry.messages = outcome.messages;

            if let Some(err) = entry.to_error() {
                tracing::warn!("{} failed to install: {}", slug, err);
                if !bulk {
                    return Err(err);
                }
            }

            let key = match plugin_id {
                Some(id) => {
                    tracing::debug!("{} installed as {}", slug, id);
                    plugins[index] = id.clone();
                    id
                }
                None => slug,
            };
            log.insert(key, entry);
        }

        Ok(InstallReport { plugins, log })
    }

    /// Canonical id for `slug` among the plugins that appeared during its
    /// install. Ids present beforehand or already reported in this batch
    /// belong to other items.
    async fn new_plugin_id(
        &self,
        slug: &str,
        before: &BTreeMap<String, InstalledPlugin>,
        log: &BTreeMap<String, InstallLogEntry>,
    ) -> Option<String> {
        self.registry
            .installed_plugins()
            .await
            .into_keys()
            .find(|id| id.contains(slug) && !before.contains_key(id) && !log.contains_key(id))
    }

    async fn run_installer(&self, package: &str) -> InstallOutcome {
        let install = self.installer.install(package, DiagnosticText::Untranslated);

        match tokio::time::timeout(self.install_timeout, install).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let message = format!(
                    "Installation timed out after {} seconds.",
                    self.install_timeout.as_secs()
                );
                InstallOutcome::failed(Some(FailureKind::Timeout), vec![message])
            }
        }
    }
}
