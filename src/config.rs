//! Configuration for the upload server and the upload client.
//!
//! [`ServerConfig`] is built through [`ServerConfigBuilder`], which validates
//! on [`ServerConfigBuilder::build`]. [`ClientConfig`] is a plain struct with
//! defaults matching a server on `localhost:5000`.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// 10 MiB, shared by the server body limit default and the client check.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the HTTP upload server.
///
/// # Example
/// ```rust
/// use docconv::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(8080)
///     .upload_dir("/var/tmp/docconv")
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 5000.
    pub port: u16,

    /// Directory receiving transient uploads. Created on startup. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Maximum request body size in bytes. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Allow cross-origin requests from any origin. Default: true.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// `host:port` as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConvertError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConvertError::InvalidConfig(format!("bad bind address: {e}")))
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn cors_permissive(mut self, v: bool) -> Self {
        self.config.cors_permissive = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, ConvertError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.upload_dir.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "upload_dir must not be empty".into(),
            ));
        }
        c.bind_addr()?;
        Ok(self.config)
    }
}

/// Configuration for [`crate::client::UploadClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL of the upload endpoint.
    pub server_url: String,

    /// Whole-request timeout in seconds. Default: 120.
    pub timeout_secs: u64,

    /// Where converted results are saved. Default: current directory.
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000/api/upload".to_string(),
            timeout_secs: 120,
            output_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 5000);
        assert_eq!(c.max_upload_bytes, 10_485_760);
        assert_eq!(c.bind_addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn builder_sets_fields() {
        let c = ServerConfig::builder()
            .host("127.0.0.1")
            .port(8081)
            .upload_dir("/tmp/up")
            .max_upload_bytes(42)
            .cors_permissive(false)
            .build()
            .unwrap();
        assert_eq!(c.bind_addr().unwrap().to_string(), "127.0.0.1:8081");
        assert_eq!(c.upload_dir, PathBuf::from("/tmp/up"));
        assert_eq!(c.max_upload_bytes, 42);
        assert!(!c.cors_permissive);
    }

    #[test]
    fn zero_limit_rejected() {
        let err = ServerConfig::builder().max_upload_bytes(0).build().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn bad_host_rejected() {
        assert!(ServerConfig::builder().host("not a host").build().is_err());
    }
}
