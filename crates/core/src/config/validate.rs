use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload limit is not 0
/// - Engine binary paths are not empty
/// - Remote assets use an http(s) base URL, well-formed SHA-256 pins and a
///   non-zero fetch timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }
    if config.server.max_upload_mb == 0 {
        return Err(invalid("server.max_upload_mb cannot be 0"));
    }

    // Engine validation
    let engine = &config.engine;
    if engine.ffmpeg_path.as_os_str().is_empty() {
        return Err(invalid("engine.ffmpeg_path cannot be empty"));
    }
    if engine.ffprobe_path.as_os_str().is_empty() {
        return Err(invalid("engine.ffprobe_path cannot be empty"));
    }
    if engine.exec_timeout_secs == Some(0) {
        return Err(invalid("engine.exec_timeout_secs cannot be 0"));
    }

    if let Some(assets) = &engine.assets {
        if !(assets.base_url.starts_with("https://") || assets.base_url.starts_with("http://")) {
            return Err(invalid(format!(
                "engine.assets.base_url must be an http(s) URL, got '{}'",
                assets.base_url
            )));
        }
        if assets.fetch_timeout_secs == 0 {
            return Err(invalid("engine.assets.fetch_timeout_secs cannot be 0"));
        }
        for (key, pin) in [
            ("ffmpeg_sha256", &assets.ffmpeg_sha256),
            ("ffprobe_sha256", &assets.ffprobe_sha256),
        ] {
            if let Some(pin) = pin {
                if !is_sha256_hex(pin) {
                    return Err(invalid(format!(
                        "engine.assets.{} must be 64 hex characters",
                        key
                    )));
                }
            }
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
