//! API request handlers

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use plugdock_core::config::PlugdockConfig;
use plugdock_plugin::{InstallError, InstallRequest, InstallService};

use crate::auth::ApiKeyAuth;
use crate::routes::{ApiRouter, Route};

/// Shared state of the API server
pub struct ApiState {
    auth: Option<ApiKeyAuth>,
    services: HashMap<String, Arc<InstallService>>,
    router: ApiRouter,
}

impl ApiState {
    /// Create state from prepared install services keyed by site id
    pub fn new(auth: Option<ApiKeyAuth>, services: HashMap<String, Arc<InstallService>>) -> Self {
        Self {
            auth,
            services,
            router: ApiRouter::new(),
        }
    }

    /// Build one install service per configured site
    pub fn from_config(config: &PlugdockConfig) -> plugdock_core::Result<Self> {
        let mut services = HashMap::new();
        for site in &config.sites {
            let service = InstallService::for_site(config, site)?;
            tracing::info!("Site {} -> {}", site.id, site.plugins_dir.display());
            services.insert(site.id.clone(), Arc::new(service));
        }

        let auth = config.api.api_key.as_deref().map(ApiKeyAuth::new);
        if auth.is_none() {
            tracing::warn!("No API key configured, install requests are not authenticated");
        }

        Ok(Self::new(auth, services))
    }

    /// Handle a request whose body has already been read
    pub async fn handle(
        &self,
        method: &Method,
        path: &str,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Response<Full<Bytes>> {
        let Some(route) = self.router.resolve(path) else {
            return error_response(StatusCode::NOT_FOUND, "not_found", "Not Found");
        };

        let (site, request) = match route {
            Route::Health => {
                if *method != Method::GET {
                    return method_not_allowed();
                }
                return json_response(StatusCode::OK, &json!({ "status": "healthy" }));
            }
            Route::InstallOne { site, slug } => (site, InstallRequest::single(slug)),
            Route::InstallMany { site } => (site, parse_install_body(body)),
        };

        if *method != Method::POST {
            return method_not_allowed();
        }

        if let Some(auth) = &self.auth {
            if !auth.authorize(authorization) {
                tracing::warn!("Rejected unauthenticated install request for site {}", site);
                return error_response(
                    StatusCode::FORBIDDEN,
                    "unauthorized",
                    "Sorry, you are not allowed to install plugins on this site.",
                );
            }
        }

        let Some(service) = self.services.get(&site) else {
            return error_response(StatusCode::NOT_FOUND, "unknown_site", &format!("Unknown site: {}", site));
        };

        match service.install_plugins(request).await {
            Ok(report) => json_response(StatusCode::OK, &report),
            Err(err) => install_error_response(&err),
        }
    }
}

/// Read `{"plugins": [...], "bulk": bool}`. A body that does not decode
/// yields an empty request, which validation rejects.
fn parse_install_body(body: &[u8]) -> InstallRequest {
    serde_json::from_slice(body).unwrap_or_default()
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &json!({ "code": code, "message": message, "status": status.as_u16() }),
    )
}

fn install_error_response(err: &InstallError) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_REQUEST);
    json_response(status, err)
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method Not Allowed")
}
