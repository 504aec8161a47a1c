//! Install failure classification from diagnostic text
//!
//! Installers that cannot report a [`FailureKind`] leave only human-readable
//! diagnostics behind. These are matched against the known upgrader phrases;
//! anything unrecognised degrades to [`FailureKind::Generic`].

use crate::diagnostics::{COULD_NOT_CREATE, FS_UNAVAILABLE, INSTALL_FAILED, PACKAGE_NOT_AVAILABLE};
use crate::error::FailureKind;
use crate::traits::FailureClassifier;

/// Prefix of the "destination exists" diagnostic; the full text carries a path
const FOLDER_EXISTS_PREFIX: &str = "Destination folder already exists";

/// Phrase-table classifier for upgrader diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl FailureClassifier for MessageClassifier {
    fn classify(&self, last: Option<&str>, messages: &[String]) -> FailureKind {
        classify_message(last, messages)
    }
}

/// Classify the most recent diagnostic `last`, looking back into `messages`
/// where the last phrase alone is not conclusive.
pub fn classify_message(last: Option<&str>, messages: &[String]) -> FailureKind {
    let message = last.unwrap_or_default();
    let message = if message.starts_with(COULD_NOT_CREATE) {
        COULD_NOT_CREATE
    } else {
        message
    };

    match message {
        FS_UNAVAILABLE => FailureKind::FilesystemUnavailable,
        COULD_NOT_CREATE => FailureKind::FilesystemFull,
        INSTALL_FAILED => {
            let previous = messages
                .len()
                .checked_sub(2)
                .and_then(|index| messages.get(index))
                .map(String::as_str)
                .unwrap_or_default();

            if previous.starts_with(FOLDER_EXISTS_PREFIX) {
                FailureKind::FolderExists
            } else {
                FailureKind::Generic
            }
        }
        PACKAGE_NOT_AVAILABLE => FailureKind::PackageNotAvailable,
        _ => FailureKind::Generic,
    }
}
