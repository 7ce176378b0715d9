//! Media type retrieval: the sniffing cascade over hints and content.

use std::path::Path;

use url::Url;

use crate::archive::{ArchiveOpener, DirectoryContainer, ZipArchiveOpener};
use crate::config::SniffingLimits;
use crate::content::{ContainerContext, Resource, ResourceContext, SnifferContent};
use crate::error::{ContentError, ContentResult, Result, SnifferError};
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::resource::{FileResource, HttpResource};
use crate::sniffer::{CompositeSniffer, Sniffer};
use crate::system::{SystemMimeTable, SystemSniffer};

/// Resolves the media type of an asset from its hints and content.
///
/// Retrieval goes through five stages, the first answer wins:
///
/// 1. the media type hints alone,
/// 2. the media type and file extension hints,
/// 3. the content, resource or container,
/// 4. the system MIME table,
/// 5. the first media type hint, taken as is.
///
/// Stages 1 and 2 never touch the content, so a trustworthy hint saves
/// opening an archive or downloading a file.
///
/// # Examples
///
/// ```no_run
/// # use publication_sniffer::{Hints, MediaType, MediaTypeRetriever};
/// # use publication_sniffer::resource::BytesResource;
/// # async fn example() -> publication_sniffer::error::Result<()> {
/// let retriever = MediaTypeRetriever::new();
///
/// let media_type = retriever.retrieve_hints(&Hints::from_file_extension("epub"));
/// assert_eq!(media_type, Some(MediaType::EPUB));
///
/// let resource = BytesResource::new(&b"%PDF-1.7"[..]);
/// let media_type = retriever.retrieve_resource(&Hints::default(), &resource).await?;
/// assert_eq!(media_type, MediaType::PDF);
/// # Ok(())
/// # }
/// ```
pub struct MediaTypeRetriever {
    sniffer: Box<dyn Sniffer>,
    archive_opener: Box<dyn ArchiveOpener>,
    system: SystemSniffer,
    limits: SniffingLimits,
    client: reqwest::Client,
}

impl Default for MediaTypeRetriever {
    fn default() -> Self {
        Self {
            sniffer: Box::new(CompositeSniffer::default()),
            archive_opener: Box::new(ZipArchiveOpener),
            system: SystemSniffer::default(),
            limits: SniffingLimits::default(),
            client: reqwest::Client::new(),
        }
    }
}

impl MediaTypeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the format sniffers, [`CompositeSniffer::default`] otherwise.
    pub fn with_sniffer(mut self, sniffer: impl Sniffer + 'static) -> Self {
        self.sniffer = Box::new(sniffer);
        self
    }

    pub fn with_archive_opener(mut self, opener: impl ArchiveOpener + 'static) -> Self {
        self.archive_opener = Box::new(opener);
        self
    }

    pub fn with_system_table(mut self, table: impl SystemMimeTable + 'static) -> Self {
        self.system = SystemSniffer::new(Box::new(table));
        self
    }

    pub fn with_limits(mut self, limits: SniffingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// HTTP client used by [`retrieve_url`](Self::retrieve_url).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn limits(&self) -> &SniffingLimits {
        &self.limits
    }

    /// Runs the whole cascade over the hints and an already opened content.
    pub async fn retrieve(
        &self,
        hints: &Hints,
        content: Option<SnifferContent<'_>>,
    ) -> Result<MediaType> {
        if let Some(media_type) = self.sniff_light(hints) {
            return Ok(media_type);
        }
        self.sniff_heavy(hints, content).await
    }

    /// Resolves a media type from hints only. Content is never read.
    pub fn retrieve_hints(&self, hints: &Hints) -> Option<MediaType> {
        self.sniff_light(hints)
            .or_else(|| self.system.sniff_hints(hints))
            .or_else(|| hints.media_types.first().cloned())
    }

    /// Resolves the media type of a raw resource.
    ///
    /// The resource is opened as an archive when it is one, and its entries
    /// are sniffed instead of its bytes. The archive is closed before
    /// returning.
    pub async fn retrieve_resource(
        &self,
        hints: &Hints,
        resource: &dyn Resource,
    ) -> Result<MediaType> {
        if let Some(media_type) = self.sniff_light(hints) {
            return Ok(media_type);
        }

        let container = self
            .archive_opener
            .open(resource, &self.limits)
            .await
            .map_err(|err| self.abort(err))?;

        match container {
            Some(container) => {
                let result = self
                    .sniff_heavy(hints, Some(SnifferContent::Container(container.as_ref())))
                    .await;
                container.close().await;
                result
            }
            None => {
                self.sniff_heavy(hints, Some(SnifferContent::Resource(resource)))
                    .await
            }
        }
    }

    /// Resolves the media type of a local file, or of an exploded archive when
    /// `path` is a directory.
    pub async fn retrieve_path<P: AsRef<Path>>(&self, path: P) -> Result<MediaType> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|err| self.abort(err.into()))?;

        let result = if metadata.is_dir() {
            let container = DirectoryContainer::new(path);
            self.retrieve(&Hints::default(), Some(SnifferContent::Container(&container)))
                .await
        } else {
            let resource = FileResource::new(path);
            self.retrieve_resource(&Hints::from_path(path), &resource)
                .await
        };

        if let Ok(media_type) = &result {
            tracing::info!(path = %path.display(), %media_type, "media type retrieved");
        }
        result
    }

    /// Resolves the media type of a remote resource. Hints come from the URL
    /// and the response headers.
    pub async fn retrieve_url(&self, url: &Url) -> Result<MediaType> {
        let resource = HttpResource::with_client(self.client.clone(), url.clone());
        let hints = resource.hints().await.map_err(|err| self.abort(err))?;

        let result = self.retrieve_resource(&hints, &resource).await;
        if let Ok(media_type) = &result {
            tracing::info!(%url, %media_type, "media type retrieved");
        }
        result
    }

    // Stages 1 and 2.
    fn sniff_light(&self, hints: &Hints) -> Option<MediaType> {
        if !hints.media_types.is_empty() {
            if let Some(media_type) = self.sniffer.sniff_hints(&hints.only_media_types()) {
                tracing::debug!(%media_type, "recognized from media type hints");
                return Some(media_type);
            }
        }
        if !hints.file_extensions.is_empty() {
            if let Some(media_type) = self.sniffer.sniff_hints(hints) {
                tracing::debug!(%media_type, "recognized from hints");
                return Some(media_type);
            }
        }
        None
    }

    // Stages 3 to 5.
    async fn sniff_heavy(
        &self,
        hints: &Hints,
        content: Option<SnifferContent<'_>>,
    ) -> Result<MediaType> {
        match content {
            Some(SnifferContent::Resource(resource)) => {
                let context = ResourceContext::new(resource, hints, self.limits);
                if let Some(media_type) =
                    self.recognized(self.sniffer.sniff_resource(&context).await)?
                {
                    return Ok(media_type);
                }
                if let Some(media_type) = self.system.sniff_hints(hints) {
                    return Ok(media_type);
                }
                if let Some(media_type) =
                    self.recognized(self.system.sniff_resource(&context).await)?
                {
                    tracing::debug!(%media_type, "recognized from content signature");
                    return Ok(media_type);
                }
            }
            Some(SnifferContent::Container(container)) => {
                let context = ContainerContext::new(container, hints, self.limits);
                if let Some(media_type) =
                    self.recognized(self.sniffer.sniff_container(&context).await)?
                {
                    return Ok(media_type);
                }
                if let Some(media_type) = self.system.sniff_hints(hints) {
                    return Ok(media_type);
                }
            }
            None => {
                if let Some(media_type) = self.system.sniff_hints(hints) {
                    return Ok(media_type);
                }
            }
        }

        hints
            .media_types
            .first()
            .cloned()
            .ok_or(SnifferError::NotRecognized)
    }

    fn recognized(&self, result: ContentResult<Option<MediaType>>) -> Result<Option<MediaType>> {
        result.map_err(|err| self.abort(err))
    }

    fn abort(&self, err: ContentError) -> SnifferError {
        tracing::warn!(%err, "content error while sniffing");
        SnifferError::Content(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::BytesResource;
    use crate::system::EmptyMimeTable;

    #[test]
    fn test_light_stage_prefers_media_types() {
        // The media type is trusted over a misleading extension.
        let retriever = MediaTypeRetriever::new();
        let hints = Hints::new(["application/pdf"], ["epub"]);
        assert_eq!(retriever.retrieve_hints(&hints), Some(MediaType::PDF));
    }

    #[test]
    fn test_unknown_hint_is_last_resort() {
        let retriever = MediaTypeRetriever::new().with_system_table(EmptyMimeTable);
        let hints = Hints::from_media_type("application/x-custom");
        assert_eq!(
            retriever.retrieve_hints(&hints),
            MediaType::parse("application/x-custom")
        );
        assert_eq!(retriever.retrieve_hints(&Hints::default()), None);
    }

    #[tokio::test]
    async fn test_not_recognized() {
        let retriever = MediaTypeRetriever::new().with_system_table(EmptyMimeTable);
        let result = retriever.retrieve(&Hints::from_file_extension("xyz"), None).await;
        assert!(matches!(result, Err(SnifferError::NotRecognized)));
    }

    #[tokio::test]
    async fn test_plain_text_falls_back_to_hint() {
        let retriever = MediaTypeRetriever::new().with_system_table(EmptyMimeTable);
        let resource = BytesResource::new(&b"just some words"[..]);
        let hints = Hints::from_media_type("text/x-custom");
        let media_type = retriever.retrieve_resource(&hints, &resource).await.unwrap();
        assert_eq!(media_type, MediaType::parse("text/x-custom").unwrap());
    }
}
