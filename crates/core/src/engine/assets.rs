//! Engine asset resolution.
//!
//! The engine needs two binaries: `ffmpeg` to transcode and `ffprobe` to
//! inspect inputs. They come either from local paths or from a versioned
//! remote location, in which case they are downloaded once into a cache
//! directory and handed to the engine as local paths.

use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::{EngineConfig, RemoteAssetsConfig};
use super::error::EngineError;

/// Local paths of the engine binaries, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBinaries {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// One of the two engine binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAsset {
    Ffmpeg,
    Ffprobe,
}

impl EngineAsset {
    pub const ALL: [EngineAsset; 2] = [EngineAsset::Ffmpeg, EngineAsset::Ffprobe];

    /// File name of the asset on this platform.
    pub fn file_name(&self) -> String {
        let stem = match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
        };
        format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
    }

    fn pinned_digest<'a>(&self, config: &'a RemoteAssetsConfig) -> Option<&'a str> {
        match self {
            Self::Ffmpeg => config.ffmpeg_sha256.as_deref(),
            Self::Ffprobe => config.ffprobe_sha256.as_deref(),
        }
    }
}

/// Downloads engine binaries from a remote base URL into a local cache.
pub struct AssetFetcher {
    client: Client,
    config: RemoteAssetsConfig,
}

impl AssetFetcher {
    pub fn new(config: RemoteAssetsConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| EngineError::asset_fetch(&config.base_url, e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Remote URL of an asset.
    pub fn asset_url(&self, asset: EngineAsset) -> String {
        format!("{}/{}", self.base_url(), asset.file_name())
    }

    /// Cache location of an asset.
    pub fn cached_path(&self, asset: EngineAsset) -> PathBuf {
        self.config.cache_dir.join(asset.file_name())
    }

    /// Ensures both binaries are present in the cache and returns their paths.
    pub async fn fetch(&self) -> Result<EngineBinaries, EngineError> {
        fs::create_dir_all(&self.config.cache_dir).await?;
        Ok(EngineBinaries {
            ffmpeg: self.fetch_one(EngineAsset::Ffmpeg).await?,
            ffprobe: self.fetch_one(EngineAsset::Ffprobe).await?,
        })
    }

    async fn fetch_one(&self, asset: EngineAsset) -> Result<PathBuf, EngineError> {
        let path = self.cached_path(asset);
        let pinned = asset.pinned_digest(&self.config);

        if self.is_cached(&path, pinned).await? {
            debug!(asset = %asset.file_name(), path = %path.display(), "Using cached engine asset");
            return Ok(path);
        }

        let url = self.asset_url(asset);
        info!(url = %url, "Fetching engine asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::asset_fetch(&url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::asset_fetch(&url, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EngineError::asset_fetch(&url, e.to_string()))?;

        if let Some(expected) = pinned {
            verify_digest(&asset.file_name(), &bytes, expected)?;
        }

        // Unique per fetch; both workflows may load their engines at once
        let partial = path.with_extension(format!("{}.part", Uuid::new_v4().simple()));
        fs::write(&partial, &bytes).await?;
        make_executable(&partial).await?;
        fs::rename(&partial, &path).await?;

        info!(
            asset = %asset.file_name(),
            size_bytes = bytes.len(),
            path = %path.display(),
            "Engine asset cached"
        );
        Ok(path)
    }

    async fn is_cached(&self, path: &Path, pinned: Option<&str>) -> Result<bool, EngineError> {
        if !fs::try_exists(path).await? {
            return Ok(false);
        }
        match pinned {
            Some(expected) => {
                let bytes = fs::read(path).await?;
                Ok(hex_digest(&bytes) == expected.to_ascii_lowercase())
            }
            None => Ok(true),
        }
    }
}

/// Resolves the engine binaries for a configuration, fetching them if remote.
pub async fn resolve_binaries(config: &EngineConfig) -> Result<EngineBinaries, EngineError> {
    match &config.assets {
        Some(remote) => AssetFetcher::new(remote.clone())?.fetch().await,
        None => Ok(EngineBinaries {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
        }),
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn verify_digest(asset: &str, bytes: &[u8], expected: &str) -> Result<(), EngineError> {
    let actual = hex_digest(bytes);
    if actual != expected.to_ascii_lowercase() {
        return Err(EngineError::ChecksumMismatch {
            asset: asset.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), EngineError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // SHA-256 of the ASCII string "abc".
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn fetcher(base_url: &str, cache_dir: &Path) -> AssetFetcher {
        let mut config = RemoteAssetsConfig::new(base_url);
        config.cache_dir = cache_dir.to_path_buf();
        config.fetch_timeout_secs = 2;
        AssetFetcher::new(config).unwrap()
    }

    #[test]
    fn test_asset_url_strips_trailing_slash() {
        let cache = TempDir::new().unwrap();
        let fetcher = fetcher("https://cdn.example.com/ffmpeg/7.1/", cache.path());
        let expected = format!(
            "https://cdn.example.com/ffmpeg/7.1/ffmpeg{}",
            std::env::consts::EXE_SUFFIX
        );
        assert_eq!(fetcher.asset_url(EngineAsset::Ffmpeg), expected);
    }

    #[test]
    fn test_verify_digest() {
        assert!(verify_digest("ffmpeg", b"abc", ABC_SHA256).is_ok());
        assert!(verify_digest("ffmpeg", b"abc", &ABC_SHA256.to_uppercase()).is_ok());
        let err = verify_digest("ffmpeg", b"abd", ABC_SHA256).unwrap_err();
        assert!(matches!(err, EngineError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn test_cached_asset_is_reused_without_network() {
        let cache = TempDir::new().unwrap();
        // Port 9 (discard) on loopback: any request would fail.
        let fetcher = fetcher("http://127.0.0.1:9/engine", cache.path());
        for asset in EngineAsset::ALL {
            std::fs::write(fetcher.cached_path(asset), b"abc").unwrap();
        }

        let binaries = fetcher.fetch().await.unwrap();
        assert_eq!(binaries.ffmpeg, fetcher.cached_path(EngineAsset::Ffmpeg));
        assert_eq!(binaries.ffprobe, fetcher.cached_path(EngineAsset::Ffprobe));
    }

    #[tokio::test]
    async fn test_cache_mismatching_pin_is_refetched() {
        let cache = TempDir::new().unwrap();
        let mut config = RemoteAssetsConfig::new("http://127.0.0.1:9/engine");
        config.cache_dir = cache.path().to_path_buf();
        config.fetch_timeout_secs = 2;
        config.ffmpeg_sha256 = Some(ABC_SHA256.to_string());
        let fetcher = AssetFetcher::new(config).unwrap();

        std::fs::write(fetcher.cached_path(EngineAsset::Ffmpeg), b"stale").unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, EngineError::AssetFetch { .. }));
    }

    #[tokio::test]
    async fn test_local_binaries_when_no_assets() {
        let config = EngineConfig::with_paths(
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffprobe"),
        );
        let binaries = resolve_binaries(&config).await.unwrap();
        assert_eq!(binaries.ffmpeg, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(binaries.ffprobe, PathBuf::from("/usr/bin/ffprobe"));
    }
}
