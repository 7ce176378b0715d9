//! Fallbacks for the generic structures more specific formats build upon.
//! They must run after every sniffer of a format based on them.

use futures::future::BoxFuture;

use crate::content::{ContainerContext, ResourceContext};
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

/// Any JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSniffer;

impl Sniffer for JsonSniffer {
    fn name(&self) -> &'static str {
        "json"
    }

    // A plain `application/json` hint is deliberately ignored, it would
    // bypass the heavy sniffing of manifests and licenses.
    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hints
            .has_media_type(&["application/problem+json"])
            .then_some(MediaType::JSON_PROBLEM_DETAILS)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            Ok(context
                .content_as_json()
                .await?
                .map(|_| MediaType::JSON))
        })
    }
}

/// Any well-formed XML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSniffer;

impl Sniffer for XmlSniffer {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move { Ok(context.content_as_xml().await?.map(|_| MediaType::XML)) })
    }
}

/// Any ZIP archive. Only recognized from an opened container, a ZIP hint
/// alone would hide the more specific ZIP-based formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipSniffer;

impl Sniffer for ZipSniffer {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            Ok(context
                .archive_media_type()
                .filter(|m| m.matches(&MediaType::ZIP))
                .map(|_| MediaType::ZIP))
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::archive::ZipContainer;
    use crate::config::SniffingLimits;
    use crate::sniffers::testing::{sniff_bytes, sniff_entries};

    #[test]
    fn test_json_hints() {
        assert_eq!(
            JsonSniffer.sniff_hints(&Hints::from_media_type("application/problem+json")),
            Some(MediaType::JSON_PROBLEM_DETAILS)
        );
        assert_eq!(
            JsonSniffer.sniff_hints(&Hints::from_media_type("application/json")),
            None
        );
    }

    #[tokio::test]
    async fn test_json_and_xml_content() {
        assert_eq!(sniff_bytes(&JsonSniffer, "[1, 2]").await, Some(MediaType::JSON));
        assert_eq!(sniff_bytes(&JsonSniffer, "<a/>").await, None);
        assert_eq!(sniff_bytes(&XmlSniffer, "<a><b/></a>").await, Some(MediaType::XML));
        assert_eq!(sniff_bytes(&XmlSniffer, "plain text").await, None);
    }

    #[test]
    fn test_zip_hint_is_not_enough() {
        assert_eq!(ZipSniffer.sniff_hints(&Hints::from_media_type("application/zip")), None);
    }

    #[tokio::test]
    async fn test_zip_container() {
        // Central directory of an empty archive.
        let empty = Bytes::from_static(b"PK\x05\x06\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0");
        let container = ZipContainer::new(empty).unwrap();
        let hints = Hints::default();
        let context = ContainerContext::new(&container, &hints, SniffingLimits::default());
        assert_eq!(
            ZipSniffer.sniff_container(&context).await.unwrap(),
            Some(MediaType::ZIP)
        );

        assert_eq!(sniff_entries(&ZipSniffer, &[("a.txt", "")]).await, None);
    }
}
