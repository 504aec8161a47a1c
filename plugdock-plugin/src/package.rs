//! Zip package installer

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::diagnostics::{
    Feedback, MessageCatalog, COULD_NOT_COPY, COULD_NOT_CREATE_DIR, DOWNLOADING, FOLDER_EXISTS,
    FS_UNAVAILABLE, INCOMPATIBLE_ARCHIVE, INSTALLED, INSTALLING, INSTALL_FAILED, NO_PLUGIN_FOLDER,
    PACKAGE_NOT_AVAILABLE, UNPACKING,
};
use crate::error::FailureKind;
use crate::traits::{DiagnosticText, InstallOutcome, PackageInstaller};

/// Package unpacking errors
#[derive(Debug, Error)]
enum UnpackError {
    #[error("incompatible archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("could not create {}", .0.display())]
    Create(PathBuf, #[source] std::io::Error),

    #[error("could not copy {}", .0.display())]
    Copy(PathBuf, #[source] std::io::Error),
}

/// Installs zip packages into a plugins directory.
///
/// Packages are fetched over HTTP(S) or read from a local path (optionally
/// as a `file://` URL), unpacked into a staging directory inside the plugins
/// directory and then moved into place. An existing plugin folder is never
/// overwritten.
pub struct ZipPackageInstaller {
    plugins_dir: PathBuf,
    client: reqwest::Client,
    catalog: MessageCatalog,
}

impl ZipPackageInstaller {
    pub fn new(plugins_dir: impl AsRef<Path>, catalog: MessageCatalog) -> Self {
        Self {
            plugins_dir: plugins_dir.as_ref().to_path_buf(),
            client: reqwest::Client::new(),
            catalog,
        }
    }

    /// Make sure the plugins directory exists and is writable
    async fn connect_filesystem(&self) -> bool {
        if tokio::fs::create_dir_all(&self.plugins_dir).await.is_err() {
            return false;
        }

        match tokio::fs::metadata(&self.plugins_dir).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    async fn fetch(&self, package: &str) -> Result<Vec<u8>, String> {
        if package.starts_with("http://") || package.starts_with("https://") {
            let response = self
                .client
                .get(package)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| e.to_string())?;
            let bytes = response.bytes().await.map_err(|e| e.to_string())?;
            return Ok(bytes.to_vec());
        }

        let path = package.strip_prefix("file://").unwrap_or(package);
        tokio::fs::read(path).await.map_err(|e| format!("{}: {}", path, e))
    }
}

#[async_trait]
impl PackageInstaller for ZipPackageInstaller {
    async fn install(&self, package: &str, text: DiagnosticText) -> InstallOutcome {
        let mut feedback = Feedback::new(&self.catalog, text);

        if !self.connect_filesystem().await {
            tracing::warn!("Plugins directory {} is not writable", self.plugins_dir.display());
            feedback.push(FS_UNAVAILABLE);
            return InstallOutcome::failed(Some(FailureKind::FilesystemUnavailable), feedback.into_messages());
        }

        feedback.push_with(DOWNLOADING, format!("{}…", package));
        let bytes = match self.fetch(package).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to fetch package {}: {}", package, e);
                feedback.push(PACKAGE_NOT_AVAILABLE);
                return InstallOutcome::failed(Some(FailureKind::PackageNotAvailable), feedback.into_messages());
            }
        };

        feedback.push(UNPACKING);
        let staging = match tempfile::Builder::new()
            .prefix(".plugdock-")
            .tempdir_in(&self.plugins_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Failed to create staging directory: {}", e);
                feedback.push(COULD_NOT_CREATE_DIR);
                return InstallOutcome::failed(Some(FailureKind::FilesystemFull), feedback.into_messages());
            }
        };

        // The staging dir travels with the unpack task. If this install is
        // cancelled, the dir is removed once extraction stops writing to it.
        let unpacked = tokio::task::spawn_blocking(move || {
            let result = unpack(bytes, staging.path());
            (staging, result)
        })
        .await;
        let (staging, unpacked) = match unpacked {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("Unpack task failed: {}", e);
                return InstallOutcome::failed(None, feedback.into_messages());
            }
        };

        if let Err(e) = unpacked {
            tracing::warn!("Failed to unpack {}: {}", package, e);
            let kind = match &e {
                UnpackError::Archive(_) => {
                    feedback.push(INCOMPATIBLE_ARCHIVE);
                    FailureKind::Generic
                }
                UnpackError::Create(..) => {
                    feedback.push(COULD_NOT_CREATE_DIR);
                    FailureKind::FilesystemFull
                }
                UnpackError::Copy(_, io) => {
                    feedback.push(COULD_NOT_COPY);
                    if io.kind() == std::io::ErrorKind::StorageFull {
                        FailureKind::FilesystemFull
                    } else {
                        FailureKind::Generic
                    }
                }
            };
            return InstallOutcome::failed(Some(kind), feedback.into_messages());
        }

        feedback.push(INSTALLING);
        let Some(source) = plugin_folder(staging.path()).await else {
            feedback.push(NO_PLUGIN_FOLDER);
            feedback.push(INSTALL_FAILED);
            return InstallOutcome::failed(Some(FailureKind::Generic), feedback.into_messages());
        };

        let Some(folder) = source.file_name() else {
            feedback.push(NO_PLUGIN_FOLDER);
            feedback.push(INSTALL_FAILED);
            return InstallOutcome::failed(Some(FailureKind::Generic), feedback.into_messages());
        };
        let destination = self.plugins_dir.join(folder);

        if tokio::fs::try_exists(&destination).await.unwrap_or(true) {
            feedback.push_with(FOLDER_EXISTS, destination.display());
            feedback.push(INSTALL_FAILED);
            return InstallOutcome::failed(Some(FailureKind::FolderExists), feedback.into_messages());
        }

        if let Err(e) = tokio::fs::rename(&source, &destination).await {
            tracing::warn!("Failed to move {} into place: {}", destination.display(), e);
            feedback.push(COULD_NOT_COPY);
            feedback.push(INSTALL_FAILED);
            return InstallOutcome::failed(Some(FailureKind::Generic), feedback.into_messages());
        }

        tracing::info!("Installed package into {}", destination.display());
        feedback.push(INSTALLED);
        InstallOutcome::installed(feedback.into_messages())
    }
}

/// Extract a zip archive below `target`
fn unpack(bytes: Vec<u8>, target: &Path) -> Result<(), UnpackError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let Some(relative) = file.enclosed_name().map(Path::to_path_buf) else {
            return Err(UnpackError::Archive(zip::result::ZipError::InvalidArchive(
                "entry escapes the archive root",
            )));
        };
        let out = target.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| UnpackError::Create(out.clone(), e))?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| UnpackError::Create(parent.to_path_buf(), e))?;
        }
        let mut dst = std::fs::File::create(&out).map_err(|e| UnpackError::Copy(out.clone(), e))?;
        std::io::copy(&mut file, &mut dst).map_err(|e| UnpackError::Copy(out.clone(), e))?;
    }

    Ok(())
}

/// The single top-level folder of an unpacked package
async fn plugin_folder(staging: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(staging).await.ok()?;
    let mut folder = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("__MACOSX") {
            continue;
        }
        if folder.is_some() || !entry.file_type().await.ok()?.is_dir() {
            return None;
        }
        folder = Some(entry.path());
    }

    folder
}
