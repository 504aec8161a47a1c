//! Installed-plugin registry backed by a plugins directory

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::traits::{InstalledPlugin, PluginRegistry};

/// Only the start of a plugin file is searched for its header
const HEADER_BYTES: usize = 8 * 1024;

/// Registry that scans a plugins directory.
///
/// A plugin is any `.php` file carrying a `Plugin Name:` header, either
/// directly in the plugins directory (`hello.php`) or one level down
/// (`akismet/akismet.php`).
pub struct FsPluginRegistry {
    root: PathBuf,
}

impl FsPluginRegistry {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    async fn scan(&self) -> std::io::Result<BTreeMap<String, InstalledPlugin>> {
        let mut plugins = BTreeMap::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type().await?;
            if file_type.is_file() {
                if let Some(plugin) = read_plugin_file(&path).await {
                    plugins.insert(name, plugin);
                }
            } else if file_type.is_dir() {
                let Ok(mut children) = tokio::fs::read_dir(&path).await else {
                    continue;
                };
                while let Ok(Some(child)) = children.next_entry().await {
                    let child_path = child.path();
                    let Some(file) = child_path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if let Some(plugin) = read_plugin_file(&child_path).await {
                        plugins.insert(format!("{}/{}", name, file), plugin);
                    }
                }
            }
        }

        Ok(plugins)
    }
}

#[async_trait]
impl PluginRegistry for FsPluginRegistry {
    async fn installed_plugins(&self) -> BTreeMap<String, InstalledPlugin> {
        match self.scan().await {
            Ok(plugins) => plugins,
            Err(e) => {
                tracing::warn!("Failed to scan plugins directory {}: {}", self.root.display(), e);
                BTreeMap::new()
            }
        }
    }
}

async fn read_plugin_file(path: &Path) -> Option<InstalledPlugin> {
    if path.extension().and_then(|e| e.to_str()) != Some("php") {
        return None;
    }

    let file = tokio::fs::File::open(path).await.ok()?;
    let mut head = Vec::with_capacity(HEADER_BYTES);
    file.take(HEADER_BYTES as u64).read_to_end(&mut head).await.ok()?;
    parse_plugin_header(&String::from_utf8_lossy(&head))
}

/// Parse the `Plugin Name:` / `Version:` header of a plugin file
pub(crate) fn parse_plugin_header(content: &str) -> Option<InstalledPlugin> {
    let name = header_value(content, "Plugin Name")?;
    Some(InstalledPlugin {
        name,
        version: header_value(content, "Version"),
    })
}

fn header_value(content: &str, field: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim_start().trim_start_matches(['*', '#', '/']).trim_start();
        let value = line.strip_prefix(field)?.trim_start().strip_prefix(':')?;
        let value = value.trim().trim_end_matches("*/").trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AKISMET: &str = "<?php\n/**\n * Plugin Name: Akismet Anti-spam: Spam Protection\n * Version: 5.3\n */\n";

    #[test]
    fn test_parse_plugin_header() {
        let plugin = parse_plugin_header(AKISMET).unwrap();
        assert_eq!(plugin.name, "Akismet Anti-spam: Spam Protection");
        assert_eq!(plugin.version.as_deref(), Some("5.3"));
    }

    #[test]
    fn test_parse_header_single_line_comment() {
        let plugin = parse_plugin_header("<?php\n/* Plugin Name: Hello Dolly */\n").unwrap();
        assert_eq!(plugin.name, "Hello Dolly");
        assert!(plugin.version.is_none());
        assert!(parse_plugin_header("<?php\necho 'hi';\n").is_none());
    }

    #[tokio::test]
    async fn test_scan_plugins_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("akismet")).unwrap();
        std::fs::write(root.join("akismet/akismet.php"), AKISMET).unwrap();
        std::fs::write(root.join("akismet/class.akismet.php"), "<?php\nclass Akismet {}\n").unwrap();
        std::fs::write(root.join("hello.php"), "<?php\n/*\nPlugin Name: Hello Dolly\n*/\n").unwrap();
        std::fs::write(root.join("readme.txt"), "Plugin Name: Not a plugin").unwrap();
        std::fs::create_dir(root.join(".staging")).unwrap();
        std::fs::write(root.join(".staging/x.php"), AKISMET).unwrap();

        let registry = FsPluginRegistry::new(root);
        let plugins = registry.installed_plugins().await;

        assert_eq!(
            plugins.keys().cloned().collect::<Vec<_>>(),
            vec!["akismet/akismet.php".to_string(), "hello.php".to_string()]
        );
        assert_eq!(registry.find_by_slug("akismet").await.as_deref(), Some("akismet/akismet.php"));
        assert_eq!(registry.find_by_slug("hello").await.as_deref(), Some("hello.php"));
        assert!(registry.find_by_slug("jetpack").await.is_none());
    }

    #[tokio::test]
    async fn test_header_past_read_window_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("late")).unwrap();
        let padding = "// filler\n".repeat(HEADER_BYTES / 10 + 1);
        std::fs::write(
            dir.path().join("late/late.php"),
            format!("<?php\n{}/* Plugin Name: Late Header */\n", padding),
        )
        .unwrap();
        std::fs::write(dir.path().join("early.php"), format!("{}{}", AKISMET, padding)).unwrap();

        let plugins = FsPluginRegistry::new(dir.path()).installed_plugins().await;
        assert_eq!(plugins.keys().cloned().collect::<Vec<_>>(), vec!["early.php".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let registry = FsPluginRegistry::new("/nonexistent/plugdock/plugins");
        assert!(registry.installed_plugins().await.is_empty());
    }
}
