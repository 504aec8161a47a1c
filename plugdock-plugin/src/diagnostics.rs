//! Installer diagnostic phrases and their translation

use std::collections::HashMap;

use crate::traits::DiagnosticText;

pub const FS_UNAVAILABLE: &str = "Could not access filesystem.";
pub const COULD_NOT_CREATE: &str = "Could not create";
pub const COULD_NOT_CREATE_DIR: &str = "Could not create directory.";
pub const COULD_NOT_COPY: &str = "Could not copy file.";
pub const INSTALL_FAILED: &str = "Plugin install failed.";
pub const FOLDER_EXISTS: &str = "Destination folder already exists.";
pub const PACKAGE_NOT_AVAILABLE: &str = "Install package not available.";
pub const INCOMPATIBLE_ARCHIVE: &str = "Incompatible Archive.";
pub const NO_PLUGIN_FOLDER: &str = "The package could not be installed. No valid plugins were found.";
pub const DOWNLOADING: &str = "Downloading install package from";
pub const UNPACKING: &str = "Unpacking the package…";
pub const INSTALLING: &str = "Installing the plugin…";
pub const INSTALLED: &str = "Plugin installed successfully.";

/// Translation catalog keyed by source phrase
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    translations: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new(translations: HashMap<String, String>) -> Self {
        Self { translations }
    }

    /// Render `phrase`, translating it unless `text` asks for source phrases
    pub fn render(&self, phrase: &str, text: DiagnosticText) -> String {
        match text {
            DiagnosticText::Untranslated => phrase.to_string(),
            DiagnosticText::Localized => self
                .translations
                .get(phrase)
                .cloned()
                .unwrap_or_else(|| phrase.to_string()),
        }
    }
}

/// Diagnostics collected during one install call
pub(crate) struct Feedback<'a> {
    catalog: &'a MessageCatalog,
    text: DiagnosticText,
    messages: Vec<String>,
}

impl<'a> Feedback<'a> {
    pub(crate) fn new(catalog: &'a MessageCatalog, text: DiagnosticText) -> Self {
        Self {
            catalog,
            text,
            messages: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, phrase: &str) {
        let message = self.catalog.render(phrase, self.text);
        tracing::debug!("installer: {}", message);
        self.messages.push(message);
    }

    /// Push a phrase followed by a detail that is never translated
    pub(crate) fn push_with(&mut self, phrase: &str, detail: impl std::fmt::Display) {
        let message = format!("{} {}", self.catalog.render(phrase, self.text), detail);
        tracing::debug!("installer: {}", message);
        self.messages.push(message);
    }

    pub(crate) fn into_messages(self) -> Vec<String> {
        self.messages
    }
}
