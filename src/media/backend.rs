use super::{error::BackendError, output::OutputTarget, types::RawInfo};
use async_trait::async_trait;
use url::Url;

/// External extraction backend. It understands source-specific protocols and
/// does the actual network retrieval; this crate only drives it.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &'static str;

    /// Describe the source and its encodings without downloading any content
    async fn resolve_metadata(&self, url: &Url) -> Result<RawInfo, BackendError>;

    /// Download one encoding to the given target. The returned info reports
    /// where the file was written.
    async fn materialize(
        &self,
        url: &Url,
        format_id: &str,
        target: &OutputTarget,
    ) -> Result<RawInfo, BackendError>;

    /// Check that the backend can run on this system
    async fn test_availability(&self) -> bool;
}
