// VideoSource trait definition

use async_trait::async_trait;

use crate::errors::DownloadError;
use crate::models::{FetchWindow, ProfileInfo, Subject, VideoRecord};

/// A metadata service that can list videos for a subject
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Up to `window` records in the source's own order. Fails with
    /// `SourceUnavailable` when the service refuses; never retries.
    async fn fetch(
        &self,
        subject: &Subject,
        window: FetchWindow,
    ) -> Result<Vec<VideoRecord>, DownloadError>;

    /// Account statistics; `None` for subjects that have no profile
    /// (hashtags)
    async fn profile(&self, subject: &Subject) -> Result<Option<ProfileInfo>, DownloadError>;
}
