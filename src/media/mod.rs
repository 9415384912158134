mod backend;
mod error;
mod locks;
mod normalize;
mod output;
mod types;
mod ytdlp;

#[cfg(test)]
pub(crate) mod testing;

pub use error::MediaError;
pub use types::MediaInfo;
pub use ytdlp::YtDlpBackend;

#[cfg(test)]
pub use error::BackendError;

use backend::ExtractionBackend;
use locks::PathLocks;
use output::OutputTarget;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};
use url::Url;

/// Analyzes sources and materializes chosen encodings under a fixed storage root.
pub struct MediaService {
    backend: Arc<dyn ExtractionBackend>,
    storage_root: PathBuf,
    locks: PathLocks,
}

impl MediaService {
    pub fn new(backend: Arc<dyn ExtractionBackend>, storage_root: PathBuf) -> Self {
        info!(
            "Media service initialized - backend {}, storage root {}",
            backend.name(),
            storage_root.display()
        );

        Self {
            backend,
            storage_root,
            locks: PathLocks::new(),
        }
    }

    pub async fn analyze(&self, url: &Url) -> Result<MediaInfo, MediaError> {
        info!("Analyzing URL: {}", url);

        let raw = self.backend.resolve_metadata(url).await?;
        let info = normalize::media_info(raw, url);

        info!(
            "Resolved {} ({}) with {} formats",
            info.id,
            info.title,
            info.formats.len()
        );
        Ok(info)
    }

    /// Downloads one encoding and returns the verified path of the written file.
    pub async fn download(
        &self,
        url: &Url,
        format_id: &str,
        subfolder: Option<&str>,
        filename: Option<&str>,
    ) -> Result<PathBuf, MediaError> {
        let target = OutputTarget::resolve(&self.storage_root, subfolder, filename).await?;

        let _guard = self.locks.acquire(&target.lock_key()).await;

        let raw = self.backend.materialize(url, format_id, &target).await?;

        let reported = raw
            .reported_path()
            .ok_or_else(|| MediaError::FileMissing(target.directory()))?;
        let path = self.verify_download(&reported).await?;

        info!("Downloaded format {} of {} to {}", format_id, url, path.display());
        Ok(path)
    }

    /// The backend's word is not enough: the file has to exist and live under
    /// the storage root.
    async fn verify_download(&self, reported: &Path) -> Result<PathBuf, MediaError> {
        let path = match tokio::fs::canonicalize(reported).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Reported download {} is not readable: {}", reported.display(), e);
                return Err(MediaError::FileMissing(reported.to_path_buf()));
            }
        };

        let root = tokio::fs::canonicalize(&self.storage_root).await?;
        if !path.starts_with(&root) {
            warn!(
                "Reported download {} is outside the storage root {}",
                path.display(),
                root.display()
            );
            return Err(MediaError::FileMissing(reported.to_path_buf()));
        }

        if !tokio::fs::metadata(&path).await?.is_file() {
            return Err(MediaError::FileMissing(reported.to_path_buf()));
        }

        Ok(path)
    }

    pub async fn test_setup(&self) -> anyhow::Result<()> {
        info!("Testing extraction backend setup...");

        if self.backend.test_availability().await {
            info!("✅ {} is available", self.backend.name());
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Extraction backend {} is not available. Please install it.",
                self.backend.name()
            ))
        }
    }
}
