use futures::future::BoxFuture;

use crate::content::ResourceContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
const OPDS_ACQUISITION_REL: &str = "http://opds-spec.org/acquisition";

/// OPDS 1 feeds and entries, OPDS 2 feeds and publications, and OPDS
/// authentication documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpdsSniffer;

impl Sniffer for OpdsSniffer {
    fn name(&self) -> &'static str {
        "opds"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        // The entry type is more specific than the catalog one, check it first.
        if hints.has_media_type(&["application/atom+xml;type=entry;profile=opds-catalog"]) {
            return Some(MediaType::OPDS1_ENTRY);
        }
        if hints.has_media_type(&["application/atom+xml;profile=opds-catalog"]) {
            return Some(MediaType::OPDS1);
        }
        if hints.has_media_type(&["application/opds+json"]) {
            return Some(MediaType::OPDS2);
        }
        if hints.has_media_type(&["application/opds-publication+json"]) {
            return Some(MediaType::OPDS2_PUBLICATION);
        }
        if hints.has_media_type(&[
            "application/opds-authentication+json",
            "application/vnd.opds.authentication.v1.0+json",
        ]) {
            return Some(MediaType::OPDS_AUTHENTICATION);
        }
        None
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            if let Some(root) = context.content_as_xml().await? {
                if root.namespace == ATOM_NAMESPACE {
                    match root.name.as_str() {
                        "feed" => return Ok(Some(MediaType::OPDS1)),
                        "entry" => return Ok(Some(MediaType::OPDS1_ENTRY)),
                        _ => {}
                    }
                }
            }

            if let Some(manifest) = context.content_as_rwpm().await? {
                if manifest
                    .self_media_type()
                    .is_some_and(|m| m.matches(&MediaType::OPDS2))
                {
                    return Ok(Some(MediaType::OPDS2));
                }
                let has_acquisition = manifest
                    .links
                    .iter()
                    .any(|link| link.rels.iter().any(|rel| rel.starts_with(OPDS_ACQUISITION_REL)));
                if has_acquisition {
                    return Ok(Some(MediaType::OPDS2_PUBLICATION));
                }
            }

            if context
                .contains_json_keys(&["id", "title", "authentication"])
                .await?
            {
                return Ok(Some(MediaType::OPDS_AUTHENTICATION));
            }

            Ok(None)
        })
    }
}
