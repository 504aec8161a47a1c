//! API route definitions

use matchit::Router;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Health,
    InstallOne,
    InstallMany,
}

/// A resolved API route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /health`
    Health,
    /// `POST /sites/{site}/plugins/{slug}/install`
    InstallOne { site: String, slug: String },
    /// `POST /sites/{site}/plugins/install`
    InstallMany { site: String },
}

/// API Router
pub struct ApiRouter {
    router: Router<RouteKind>,
}

impl ApiRouter {
    /// Create a new API router
    pub fn new() -> Self {
        let mut router = Router::new();
        let routes = [
            ("/health", RouteKind::Health),
            ("/sites/{site}/plugins/install", RouteKind::InstallMany),
            ("/sites/{site}/plugins/{slug}/install", RouteKind::InstallOne),
        ];

        for (path, kind) in routes {
            if let Err(e) = router.insert(path, kind) {
                tracing::warn!("Failed to insert route {}: {}", path, e);
            }
        }

        Self { router }
    }

    /// Resolve a request path
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        let matched = self.router.at(path).ok()?;
        let param = |name: &str| matched.params.get(name).map(str::to_string);

        match *matched.value {
            RouteKind::Health => Some(Route::Health),
            RouteKind::InstallMany => Some(Route::InstallMany { site: param("site")? }),
            RouteKind::InstallOne => Some(Route::InstallOne {
                site: param("site")?,
                slug: param("slug")?,
            }),
        }
    }
}

impl Default for ApiRouter {
    fn default() -> Self {
        Self::new()
    }
}
