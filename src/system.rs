//! System MIME table fallback.
//!
//! Once every format sniffer gave up, the retriever asks a generic
//! extension/MIME table, and a magic number detector for resources:
//! 1. `mime_guess` for media types and file extensions
//! 2. `infer` for the leading bytes of a resource

use futures::future::BoxFuture;

use crate::content::ResourceContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

/// A platform-wide table of media types and their file extensions.
pub trait SystemMimeTable: Send + Sync {
    fn media_type_for_extension(&self, extension: &str) -> Option<MediaType>;

    /// Preferred file extension of a media type, without its dot.
    fn extension_for_media_type(&self, media_type: &MediaType) -> Option<String>;

    /// Guesses a media type from the leading bytes of a content.
    fn media_type_for_bytes(&self, _bytes: &[u8]) -> Option<MediaType> {
        None
    }
}

/// The default table, backed by `mime_guess` and `infer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeGuessTable;

impl SystemMimeTable for MimeGuessTable {
    fn media_type_for_extension(&self, extension: &str) -> Option<MediaType> {
        mime_guess::from_ext(extension)
            .first()
            .and_then(|mime| MediaType::parse(mime.as_ref()))
    }

    fn extension_for_media_type(&self, media_type: &MediaType) -> Option<String> {
        let essence = format!("{}/{}", media_type.type_(), media_type.subtype());
        mime_guess::get_mime_extensions_str(&essence)
            .and_then(|extensions| extensions.first())
            .map(|extension| extension.to_string())
    }

    fn media_type_for_bytes(&self, bytes: &[u8]) -> Option<MediaType> {
        infer::get(bytes).and_then(|kind| MediaType::parse(kind.mime_type()))
    }
}

/// A table that knows nothing, to disable the system fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMimeTable;

impl SystemMimeTable for EmptyMimeTable {
    fn media_type_for_extension(&self, _extension: &str) -> Option<MediaType> {
        None
    }

    fn extension_for_media_type(&self, _media_type: &MediaType) -> Option<String> {
        None
    }
}

/// Sniffs with a [`SystemMimeTable`].
///
/// JSON, XML and ZIP answers are dropped: they are the generic structure of
/// other formats, and a specific sniffer must get the chance to refine them.
pub struct SystemSniffer {
    table: Box<dyn SystemMimeTable>,
    excluded: Vec<MediaType>,
}

impl SystemSniffer {
    pub fn new(table: Box<dyn SystemMimeTable>) -> Self {
        Self {
            table,
            excluded: vec![MediaType::JSON, MediaType::XML, MediaType::ZIP],
        }
    }

    fn allowed(&self, media_type: MediaType) -> Option<MediaType> {
        (!media_type.matches_any(&self.excluded)).then_some(media_type)
    }

    /// The table's preferred media type for the type of `media_type`.
    fn sniff_type(&self, media_type: &MediaType) -> Option<MediaType> {
        let extension = self.table.extension_for_media_type(media_type)?;
        let preferred = self.table.media_type_for_extension(&extension)?;
        self.allowed(preferred)
    }

    fn sniff_extension(&self, extension: &str) -> Option<MediaType> {
        self.allowed(self.table.media_type_for_extension(extension)?)
    }
}

impl Default for SystemSniffer {
    fn default() -> Self {
        Self::new(Box::new(MimeGuessTable))
    }
}

impl Sniffer for SystemSniffer {
    fn name(&self) -> &'static str {
        "system"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hints
            .media_types
            .iter()
            .find_map(|media_type| self.sniff_type(media_type))
            .or_else(|| {
                hints
                    .file_extensions
                    .iter()
                    .find_map(|extension| self.sniff_extension(extension))
            })
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let head = context
                .read(Some(0..context.limits().signature_length))
                .await?;
            Ok(self
                .table
                .media_type_for_bytes(&head)
                .and_then(|media_type| self.allowed(media_type)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SniffingLimits;
    use crate::resource::BytesResource;

    #[test]
    fn test_mime_guess_table() {
        let table = MimeGuessTable;
        assert_eq!(table.media_type_for_extension("png"), Some(MediaType::PNG));
        assert_eq!(
            table.extension_for_media_type(&MediaType::PDF).as_deref(),
            Some("pdf")
        );
        let unknown = MediaType::parse("application/x-totally-unknown").unwrap();
        assert_eq!(table.extension_for_media_type(&unknown), None);
    }

    #[test]
    fn test_hints_use_extension_table() {
        let sniffer = SystemSniffer::default();
        assert_eq!(
            sniffer.sniff_hints(&Hints::from_file_extension("css")),
            Some(MediaType::CSS)
        );
        assert_eq!(
            sniffer.sniff_hints(&Hints::from_media_type("image/svg+xml")),
            Some(MediaType::SVG)
        );
    }

    #[test]
    fn test_generic_structures_are_excluded() {
        let sniffer = SystemSniffer::default();
        assert_eq!(sniffer.sniff_hints(&Hints::from_file_extension("json")), None);
        assert_eq!(sniffer.sniff_hints(&Hints::from_file_extension("zip")), None);
    }

    #[test]
    fn test_empty_table() {
        let sniffer = SystemSniffer::new(Box::new(EmptyMimeTable));
        assert_eq!(sniffer.sniff_hints(&Hints::from_file_extension("css")), None);
    }

    #[tokio::test]
    async fn test_content_signature() {
        let sniffer = SystemSniffer::default();
        let png = BytesResource::new(&b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"[..]);
        let hints = Hints::default();
        let context = ResourceContext::new(&png, &hints, SniffingLimits::default());
        assert_eq!(
            sniffer.sniff_resource(&context).await.unwrap(),
            Some(MediaType::PNG)
        );

        let mut zip_bytes = vec![0x50, 0x4B, 0x03, 0x04];
        zip_bytes.extend_from_slice(&[0; 100]);
        let zip = BytesResource::new(zip_bytes);
        let context = ResourceContext::new(&zip, &hints, SniffingLimits::default());
        assert_eq!(sniffer.sniff_resource(&context).await.unwrap(), None);
    }
}
