//! In-memory collaborators for unit tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::InstallError;
use crate::traits::{
    DiagnosticText, InstallOutcome, InstalledPlugin, PackageInstaller, PluginDirectory,
    PluginMetadata, PluginRegistry,
};

/// Write a zip package containing `files`
pub fn write_package(path: &Path, files: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn package_url(slug: &str) -> String {
    format!("https://downloads.example.org/plugin/{slug}.zip")
}

#[derive(Default)]
pub struct MockDirectory {
    plugins: HashMap<String, PluginMetadata>,
    lookups: AtomicUsize,
}

impl MockDirectory {
    pub fn with_plugin(self, slug: &str) -> Self {
        let link = package_url(slug);
        self.with_metadata(slug, Some(&link))
    }

    pub fn with_metadata(mut self, slug: &str, download_link: Option<&str>) -> Self {
        self.plugins.insert(
            slug.to_string(),
            PluginMetadata {
                slug: slug.to_string(),
                name: slug.to_string(),
                version: Some("1.0.0".to_string()),
                download_link: download_link.map(str::to_string),
            },
        );
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginDirectory for MockDirectory {
    async fn plugin_information(&self, slug: &str) -> Result<PluginMetadata, InstallError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.plugins
            .get(slug)
            .cloned()
            .ok_or_else(|| InstallError::directory_failed("Plugin not found."))
    }
}

#[derive(Default)]
pub struct MockRegistry {
    installed: Mutex<BTreeMap<String, InstalledPlugin>>,
}

impl MockRegistry {
    pub fn with_installed(ids: &[&str]) -> Self {
        let registry = Self::default();
        for id in ids {
            registry.add(id);
        }
        registry
    }

    pub fn add(&self, id: &str) {
        self.installed.lock().unwrap().insert(
            id.to_string(),
            InstalledPlugin {
                name: id.to_string(),
                version: None,
            },
        );
    }
}

#[async_trait]
impl PluginRegistry for MockRegistry {
    async fn installed_plugins(&self) -> BTreeMap<String, InstalledPlugin> {
        self.installed.lock().unwrap().clone()
    }
}

struct Script {
    outcome: InstallOutcome,
    lands_as: Option<String>,
}

/// Installer that replays scripted outcomes and registers the plugin on success
pub struct MockInstaller {
    registry: Arc<MockRegistry>,
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(String, DiagnosticText)>>,
    delay: Option<Duration>,
}

impl MockInstaller {
    pub fn new(registry: Arc<MockRegistry>) -> Self {
        Self {
            registry,
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Script the outcome for `slug`; `lands_as` is registered when the call runs
    pub fn script(mut self, slug: &str, outcome: InstallOutcome, lands_as: Option<&str>) -> Self {
        self.scripts.insert(
            package_url(slug),
            Script {
                outcome,
                lands_as: lands_as.map(str::to_string),
            },
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, DiagnosticText)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageInstaller for MockInstaller {
    async fn install(&self, package: &str, text: DiagnosticText) -> InstallOutcome {
        self.calls.lock().unwrap().push((package.to_string(), text));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(script) = self.scripts.get(package) else {
            return InstallOutcome::failed(None, Vec::new());
        };

        if let Some(id) = &script.lands_as {
            self.registry.add(id);
        }
        script.outcome.clone()
    }
}

/// Canned HTTP response served by [`spawn_http_stub`]
#[derive(Clone)]
pub struct StubResponse {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn zip(body: Vec<u8>) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/zip",
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serve `response` to every connection; returns `http://<addr>`
pub async fn spawn_http_stub(response: StubResponse) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                if stream.read(&mut buf).await.unwrap_or(0) == 0 {
                    return;
                }
                tokio::time::sleep(response.delay).await;

                let head = format!(
                    "HTTP/1.1 {}\r\n\
                     Content-Type: {}\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n",
                    response.status,
                    response.content_type,
                    response.body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&response.body).await;
            });
        }
    });

    format!("http://{}", addr)
}
