// LinkResolver trait definition

use async_trait::async_trait;

use crate::errors::DownloadError;
use crate::models::VideoRecord;

/// Resolves a video's public page URL into a direct, fetchable media
/// URL through an external converter
#[async_trait]
pub trait LinkResolver: Send {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    /// Produce a direct download URL for the record. Fails with
    /// `ResolutionTimeout` when the converter never yields a link
    /// within the bounded wait.
    async fn resolve(&mut self, record: &VideoRecord) -> Result<String, DownloadError>;

    /// Tear down any live converter session
    async fn shutdown(&mut self);
}
