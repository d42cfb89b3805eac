//! Server configuration
//!
//! Everything the service needs is passed in explicitly; nothing is read from
//! the environment here. The binary maps its CLI arguments onto this type.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderName;
use mxchart_render::ChromeRasterizer;
use thiserror::Error;

/// Default header carrying the shared secret
pub const DEFAULT_SECRET_HEADER: &str = "x-api-key";

/// Default overall render timeout
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shared secret must not be empty")]
    EmptySecret,

    #[error("invalid secret header name '{0}'")]
    InvalidHeader(String),

    #[error("render timeout must be greater than zero")]
    ZeroTimeout,
}

/// The expected access token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// HTTP service configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Expected value of the secret header
    pub secret: SharedSecret,
    /// Request header carrying the secret
    pub secret_header: HeaderName,
    /// Overall bound for one rasterization
    pub render_timeout: Duration,
    /// Return the PNG base64-encoded (for text-only transports)
    pub base64_body: bool,
    /// Chrome/Chromium binary; autodetected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox
    pub sandbox: bool,
}

impl ServerConfig {
    pub fn new(addr: SocketAddr, secret: SharedSecret) -> Self {
        Self {
            addr,
            secret,
            secret_header: HeaderName::from_static(DEFAULT_SECRET_HEADER),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            base64_body: false,
            chrome_path: None,
            sandbox: true,
        }
    }

    /// Set the secret header by name
    pub fn secret_header(mut self, name: &str) -> Result<Self, ConfigError> {
        self.secret_header = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(name.to_string()))?;
        Ok(self)
    }

    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn base64_body(mut self, enabled: bool) -> Self {
        self.base64_body = enabled;
        self
    }

    pub fn chrome_path(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_path = path;
        self
    }

    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.sandbox = enabled;
        self
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.render_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Browser rasterizer matching this configuration. The render timeout is
    /// applied per request as a deadline.
    pub fn rasterizer(&self) -> ChromeRasterizer {
        let mut rasterizer = ChromeRasterizer::new();
        if let Some(path) = &self.chrome_path {
            rasterizer = rasterizer.chrome_path(path.clone());
        }
        if !self.sandbox {
            rasterizer = rasterizer.no_sandbox();
        }
        rasterizer
    }
}
