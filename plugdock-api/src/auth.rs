//! API authentication

/// API key authentication
pub struct ApiKeyAuth {
    key: String,
}

impl ApiKeyAuth {
    /// Create new API key auth
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Validate an API key
    pub fn validate(&self, provided: &str) -> bool {
        // Constant-time comparison
        self.key.len() == provided.len()
            && self
                .key
                .bytes()
                .zip(provided.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Validate an `Authorization: Bearer <key>` header value
    pub fn authorize(&self, header: Option<&str>) -> bool {
        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| self.validate(token.trim()))
            .unwrap_or(false)
    }
}
