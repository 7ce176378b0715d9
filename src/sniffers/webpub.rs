use futures::future::BoxFuture;

use super::hinted;
use crate::content::{ContainerContext, ResourceContext};
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::rwpm::{Manifest, Profile};
use crate::sniffer::Sniffer;

/// Standalone Readium Web Publication Manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPubManifestSniffer;

impl Sniffer for WebPubManifestSniffer {
    fn name(&self) -> &'static str {
        "webpub-manifest"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        if hints.has_media_type(&["application/audiobook+json"]) {
            return Some(MediaType::READIUM_AUDIOBOOK_MANIFEST);
        }
        if hints.has_media_type(&["application/divina+json"]) {
            return Some(MediaType::DIVINA_MANIFEST);
        }
        if hints.has_media_type(&["application/webpub+json"]) {
            return Some(MediaType::READIUM_WEBPUB_MANIFEST);
        }
        None
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let Some(manifest) = context.content_as_rwpm().await? else {
                return Ok(None);
            };
            if manifest.conforms_to(Profile::Audiobook) {
                return Ok(Some(MediaType::READIUM_AUDIOBOOK_MANIFEST));
            }
            if manifest.conforms_to(Profile::Divina) {
                return Ok(Some(MediaType::DIVINA_MANIFEST));
            }
            if is_webpub(&manifest) {
                return Ok(Some(MediaType::READIUM_WEBPUB_MANIFEST));
            }
            Ok(None)
        })
    }
}

/// Packaged Readium Web Publications, protected by LCP or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPubPackageSniffer;

impl Sniffer for WebPubPackageSniffer {
    fn name(&self) -> &'static str {
        "webpub-package"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        if hinted(hints, &["audiobook"], &["application/audiobook+zip"]) {
            return Some(MediaType::READIUM_AUDIOBOOK);
        }
        if hinted(hints, &["divina"], &["application/divina+zip"]) {
            return Some(MediaType::DIVINA);
        }
        if hinted(hints, &["webpub"], &["application/webpub+zip"]) {
            return Some(MediaType::READIUM_WEBPUB);
        }
        if hinted(hints, &["lcpa"], &["application/audiobook+lcp"]) {
            return Some(MediaType::LCP_PROTECTED_AUDIOBOOK);
        }
        if hinted(hints, &["lcpdf"], &["application/pdf+lcp"]) {
            return Some(MediaType::LCP_PROTECTED_PDF);
        }
        None
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let Some(manifest) = context
                .read_json("manifest.json")
                .await?
                .as_ref()
                .and_then(Manifest::from_json)
            else {
                return Ok(None);
            };

            let is_lcp_protected = context.contains("license.lcpl").await?;

            if manifest.conforms_to(Profile::Audiobook) {
                return Ok(Some(if is_lcp_protected {
                    MediaType::LCP_PROTECTED_AUDIOBOOK
                } else {
                    MediaType::READIUM_AUDIOBOOK
                }));
            }
            if manifest.conforms_to(Profile::Divina) {
                return Ok(Some(MediaType::DIVINA));
            }
            if is_lcp_protected && manifest.conforms_to(Profile::Pdf) {
                return Ok(Some(MediaType::LCP_PROTECTED_PDF));
            }
            if is_webpub(&manifest) {
                return Ok(Some(MediaType::READIUM_WEBPUB));
            }
            Ok(None)
        })
    }
}

fn is_webpub(manifest: &Manifest) -> bool {
    manifest
        .self_media_type()
        .is_some_and(|m| m.matches(&MediaType::READIUM_WEBPUB_MANIFEST))
}

/// W3C Web Publication Manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct W3cWpubSniffer;

impl Sniffer for W3cWpubSniffer {
    fn name(&self) -> &'static str {
        "w3c-wpub"
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            // JSON-LD keys are matched as text, the document is not expanded.
            let is_wpub = context.content_as_string().await?.is_some_and(|content| {
                content.contains("@context") && content.contains("https://www.w3.org/ns/wp-context")
            });
            Ok(is_wpub.then_some(MediaType::W3C_WPUB_MANIFEST))
        })
    }
}
