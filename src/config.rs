//! Client configuration: API keys by backend name, transport options and
//! the retry policy.

use std::collections::HashMap;
use std::time::Duration;

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for SecretString {
    fn from(secret: &str) -> Self {
        Self::new(secret.to_string())
    }
}

/// Transport options shared by every HTTP-backed adapter.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Connect deadline, 10s by default.
    pub connect_timeout: Duration,
    /// Read/write deadline for the whole exchange, 30s by default.
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            proxy: None,
            extra_headers: None,
        }
    }
}

impl HttpOptions {
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Retry policy for transient backend failures.
///
/// Applies only to server-side (5xx) and timeout failures of non-streaming
/// completions; streaming is never retried. The default of zero retries
/// leaves transient-failure handling entirely to the caller.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Shared, read-only configuration handed to adapter factories.
///
/// An explicit value rather than process-global state, so multiple
/// independently configured clients can coexist in one process.
#[derive(Debug, Clone, Default)]
pub struct Config {
    api_keys: HashMap<String, SecretString>,
    base_urls: HashMap<String, String>,
    pub http: HttpOptions,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration populated from `<BACKEND>_API_KEY` environment
    /// variables for every built-in backend.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        for backend in ["openai"] {
            let var = format!("{}_API_KEY", backend.to_uppercase());
            if let Ok(key) = std::env::var(&var) {
                config.api_keys.insert(backend.to_string(), key.into());
            }
        }
        config
    }

    pub fn with_api_key(
        mut self,
        backend: impl Into<String>,
        key: impl Into<SecretString>,
    ) -> Self {
        self.api_keys.insert(backend.into(), key.into());
        self
    }

    /// Override a backend's endpoint base URL.
    pub fn with_base_url(mut self, backend: impl Into<String>, url: impl Into<String>) -> Self {
        self.base_urls.insert(backend.into(), url.into());
        self
    }

    pub fn with_http(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// API key for a backend name, if configured.
    pub fn api_key(&self, backend: &str) -> Option<&SecretString> {
        self.api_keys.get(backend)
    }

    pub fn base_url(&self, backend: &str) -> Option<&str> {
        self.base_urls.get(backend).map(String::as_str)
    }
}
