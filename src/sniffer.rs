//! The [`Sniffer`] trait and its composite.

use futures::future::BoxFuture;

use crate::content::{ContainerContext, ResourceContext};
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffers;

/// Recognizes one format, or a family of related formats.
///
/// Each entry point defaults to "not applicable", so a sniffer only
/// implements the strategies that make sense for its format. Sniffers hold no
/// state and may be shared between concurrent retrievals.
pub trait Sniffer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Recognizes the format from hints alone. Never reads content.
    fn sniff_hints(&self, _hints: &Hints) -> Option<MediaType> {
        None
    }

    /// Recognizes the format from the bytes of a single resource.
    fn sniff_resource<'a>(
        &'a self,
        _context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async { Ok(None) })
    }

    /// Recognizes the format from the entries of a container.
    fn sniff_container<'a>(
        &'a self,
        _context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async { Ok(None) })
    }
}

/// An ordered list of sniffers behaving as one: the first sniffer to
/// recognize the asset wins, and the first error stops the search.
pub struct CompositeSniffer {
    sniffers: Vec<Box<dyn Sniffer>>,
}

impl CompositeSniffer {
    pub fn new(sniffers: Vec<Box<dyn Sniffer>>) -> Self {
        Self { sniffers }
    }

    pub fn sniffers(&self) -> &[Box<dyn Sniffer>] {
        &self.sniffers
    }
}

impl Default for CompositeSniffer {
    fn default() -> Self {
        Self::new(sniffers::default_sniffers())
    }
}

impl Sniffer for CompositeSniffer {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        self.sniffers.iter().find_map(|sniffer| {
            let media_type = sniffer.sniff_hints(hints)?;
            tracing::debug!(sniffer = sniffer.name(), %media_type, "recognized from hints");
            Some(media_type)
        })
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            for sniffer in &self.sniffers {
                if let Some(media_type) = sniffer.sniff_resource(context).await? {
                    tracing::debug!(sniffer = sniffer.name(), %media_type, "recognized resource");
                    return Ok(Some(media_type));
                }
            }
            Ok(None)
        })
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            for sniffer in &self.sniffers {
                if let Some(media_type) = sniffer.sniff_container(context).await? {
                    tracing::debug!(sniffer = sniffer.name(), %media_type, "recognized container");
                    return Ok(Some(media_type));
                }
            }
            Ok(None)
        })
    }
}
