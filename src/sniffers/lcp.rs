use futures::future::BoxFuture;

use super::hinted;
use crate::content::ResourceContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

/// LCP license documents. Only detected, never decrypted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcpLicenseSniffer;

impl Sniffer for LcpLicenseSniffer {
    fn name(&self) -> &'static str {
        "lcp-license"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(
            hints,
            &["lcpl"],
            &["application/vnd.readium.lcp.license.v1.0+json"],
        )
        .then_some(MediaType::LCP_LICENSE_DOCUMENT)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let is_license = context
                .contains_json_keys(&["id", "issued", "provider", "encryption"])
                .await?;
            Ok(is_license.then_some(MediaType::LCP_LICENSE_DOCUMENT))
        })
    }
}
