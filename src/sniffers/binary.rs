//! Binary formats recognized from their magic number.

use futures::future::BoxFuture;

use super::hinted;
use crate::content::ResourceContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

const PDF_SIGNATURE: &[u8] = b"%PDF-";
// Shared by RAR 4 (followed by 0x00) and RAR 5 (followed by 0x01 0x00).
const RAR_SIGNATURE: &[u8] = b"Rar!\x1a\x07";

async fn starts_with(context: &ResourceContext<'_>, signature: &[u8]) -> ContentResult<bool> {
    let head = context.read(Some(0..signature.len() as u64)).await?;
    Ok(head.as_ref() == signature)
}

/// PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfSniffer;

impl Sniffer for PdfSniffer {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["pdf"], &["application/pdf"]).then_some(MediaType::PDF)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            Ok(starts_with(context, PDF_SIGNATURE)
                .await?
                .then_some(MediaType::PDF))
        })
    }
}

/// RAR archives. Their entries are not listed, so a comic book packaged as
/// RAR is only recognized from its `cbr` hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RarSniffer;

impl Sniffer for RarSniffer {
    fn name(&self) -> &'static str {
        "rar"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(
            hints,
            &["rar"],
            &[
                "application/vnd.rar",
                "application/x-rar",
                "application/x-rar-compressed",
            ],
        )
        .then_some(MediaType::RAR)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            Ok(starts_with(context, RAR_SIGNATURE)
                .await?
                .then_some(MediaType::RAR))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniffers::testing::sniff_bytes;

    #[tokio::test]
    async fn test_pdf_signature() {
        assert_eq!(
            sniff_bytes(&PdfSniffer, "%PDF-1.7\n%...").await,
            Some(MediaType::PDF)
        );
        assert_eq!(sniff_bytes(&PdfSniffer, "%PD").await, None);
        assert_eq!(sniff_bytes(&PdfSniffer, "<html/>").await, None);
    }

    #[tokio::test]
    async fn test_rar_signature() {
        assert_eq!(
            sniff_bytes(&RarSniffer, "Rar!\x1a\x07\x01\x00").await,
            Some(MediaType::RAR)
        );
        assert_eq!(sniff_bytes(&RarSniffer, "PK\x03\x04").await, None);
    }

    #[test]
    fn test_rar_hints() {
        assert_eq!(
            RarSniffer.sniff_hints(&Hints::from_media_type("application/x-rar-compressed")),
            Some(MediaType::RAR)
        );
    }
}
