use std::path::PathBuf;

use async_trait::async_trait;
use image::DynamicImage;

/// Resolves an image URI to a decoded bitmap
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, uri: &str) -> Result<DynamicImage, ImageLoadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("Unsupported image URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Remote file URI host not supported: {0}")]
    UnsupportedHost(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Loads `file://` URIs and plain filesystem paths
#[derive(Debug, Clone, Default)]
pub struct FsImageSource;

impl FsImageSource {
    pub fn resolve(uri: &str) -> Result<PathBuf, ImageLoadError> {
        if let Some(rest) = uri.strip_prefix("file://") {
            // file://<host>/<path>; only the local host names are readable
            let (host, path) = match rest.find('/') {
                Some(slash) => rest.split_at(slash),
                None => (rest, ""),
            };
            return match host {
                "" | "localhost" => Ok(PathBuf::from(path)),
                _ => Err(ImageLoadError::UnsupportedHost(host.to_string())),
            };
        }

        match uri.split_once("://") {
            Some((scheme, _)) => Err(ImageLoadError::UnsupportedScheme(scheme.to_string())),
            None => Ok(PathBuf::from(uri)),
        }
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn load(&self, uri: &str) -> Result<DynamicImage, ImageLoadError> {
        let path = Self::resolve(uri)?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ImageLoadError::Io {
                path: path.clone(),
                source,
            })?;

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| ImageLoadError::Decode(format!("decode task failed: {}", e)))?
            .map_err(|e| ImageLoadError::Decode(e.to_string()))?;

        tracing::debug!("Loaded bitmap {}x{} from {}", image.width(), image.height(), path.display());
        Ok(image)
    }
}
