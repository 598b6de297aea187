use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload per input, in MiB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    2048
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.max_upload_mb, 2048);
        assert_eq!(config.engine.ffmpeg_path.to_str().unwrap(), "ffmpeg");
        assert!(config.engine.assets.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
max_upload_mb = 64

[engine]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
ffprobe_path = "/opt/ffmpeg/bin/ffprobe"
log_level = "warning"
exec_timeout_secs = 600

[engine.assets]
base_url = "https://cdn.example.com/ffmpeg/6.1"
fetch_timeout_secs = 30

[logging]
json = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.engine.log_level, "warning");
        assert_eq!(config.engine.exec_timeout_secs, Some(600));

        let assets = config.engine.assets.as_ref().unwrap();
        assert_eq!(assets.base_url, "https://cdn.example.com/ffmpeg/6.1");
        assert_eq!(assets.fetch_timeout_secs, 30);
        assert!(assets.ffmpeg_sha256.is_none());
        assert!(config.logging.json);
    }

    #[test]
    fn test_assets_require_base_url() {
        let toml = r#"
[engine.assets]
fetch_timeout_secs = 30
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
