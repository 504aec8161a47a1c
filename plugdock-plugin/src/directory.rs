//! Remote plugin directory client

use async_trait::async_trait;
use std::time::Duration;

use plugdock_core::config::DirectoryConfig;

use crate::error::InstallError;
use crate::traits::{PluginDirectory, PluginMetadata};

/// Client for a WordPress.org style plugin information API (JSON form)
pub struct HttpPluginDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPluginDirectory {
    pub fn new(config: &DirectoryConfig) -> plugdock_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("plugdock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| plugdock_core::Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PluginDirectory for HttpPluginDirectory {
    async fn plugin_information(&self, slug: &str) -> Result<PluginMetadata, InstallError> {
        tracing::debug!("Looking up {} in {}", slug, self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("action", "plugin_information"), ("request[slug]", slug)])
            .send()
            .await
            .map_err(request_error)?;

        // Unknown plugins come back as 404 with an `error` body, so the body
        // is inspected before the status.
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        parse_plugin_information(&body).map_err(|err| {
            tracing::debug!("Directory lookup for {} failed ({}): {}", slug, status, err);
            err
        })
    }
}

fn request_error(err: reqwest::Error) -> InstallError {
    if err.is_timeout() {
        InstallError::directory_timeout()
    } else {
        InstallError::directory_failed(format!("Plugin directory request failed: {}", err))
    }
}

/// Decode a plugin information response body
pub(crate) fn parse_plugin_information(body: &str) -> Result<PluginMetadata, InstallError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| InstallError::directory_failed("Invalid response from the plugin directory."))?;

    if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
        return Err(InstallError::directory_failed(message));
    }

    serde_json::from_value(value)
        .map_err(|e| InstallError::directory_failed(format!("Invalid plugin information: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_http_stub, StubResponse};

    #[test]
    fn test_parse_plugin_information() {
        let body = r#"{
            "name": "Hello Dolly",
            "slug": "hello-dolly",
            "version": "1.7.2",
            "author": "<a href=\"http://ma.tt/\">Matt Mullenweg</a>",
            "download_link": "https://downloads.wordpress.org/plugin/hello-dolly.1.7.2.zip"
        }"#;
        let metadata = parse_plugin_information(body).unwrap();
        assert_eq!(metadata.slug, "hello-dolly");
        assert_eq!(
            metadata.download_link.as_deref(),
            Some("https://downloads.wordpress.org/plugin/hello-dolly.1.7.2.zip")
        );
    }

    #[test]
    fn test_parse_error_body() {
        let err = parse_plugin_information(r#"{"error": "Plugin not found."}"#).unwrap_err();
        assert_eq!(err, InstallError::directory_failed("Plugin not found."));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_plugin_information("<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.code, "plugins_api_failed");
    }

    fn directory(base_url: &str, timeout_secs: u64) -> HttpPluginDirectory {
        HttpPluginDirectory::new(&DirectoryConfig {
            base_url: format!("{}/plugins/info/1.2/", base_url),
            timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_over_http() {
        let body = r#"{"name": "Hello Dolly", "slug": "hello-dolly", "version": "1.7.2",
            "download_link": "https://downloads.wordpress.org/plugin/hello-dolly.1.7.2.zip"}"#;
        let url = spawn_http_stub(StubResponse::json("200 OK", body)).await;

        let metadata = directory(&url, 5).plugin_information("hello-dolly").await.unwrap();
        assert_eq!(metadata.name, "Hello Dolly");
        assert_eq!(metadata.version.as_deref(), Some("1.7.2"));
    }

    #[tokio::test]
    async fn test_not_found_body_over_http() {
        let url = spawn_http_stub(StubResponse::json("404 Not Found", r#"{"error":"Plugin not found."}"#)).await;

        let err = directory(&url, 5).plugin_information("no-such-plugin").await.unwrap_err();
        assert_eq!(err, InstallError::directory_failed("Plugin not found."));
    }

    #[tokio::test]
    async fn test_slow_directory_times_out() {
        let response = StubResponse::json("200 OK", "{}").delayed(Duration::from_secs(5));
        let url = spawn_http_stub(response).await;

        let err = directory(&url, 1).plugin_information("akismet").await.unwrap_err();
        assert_eq!(err, InstallError::directory_timeout());
        assert_eq!(err.code, "plugins_api_timeout");
    }

    #[tokio::test]
    async fn test_unreachable_directory() {
        let err = directory("http://127.0.0.1:1", 1).plugin_information("akismet").await.unwrap_err();
        assert_eq!(err.code, "plugins_api_failed");
    }

    #[test]
    fn test_new_client() {
        let directory = HttpPluginDirectory::new(&DirectoryConfig::default()).unwrap();
        assert_eq!(directory.base_url, "https://api.wordpress.org/plugins/info/1.2/");
    }
}
