use futures::future::BoxFuture;

use super::hinted;
use crate::content::ResourceContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

/// XHTML documents. Must run before [`HtmlSniffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XhtmlSniffer;

impl Sniffer for XhtmlSniffer {
    fn name(&self) -> &'static str {
        "xhtml"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["xht", "xhtml"], &["application/xhtml+xml"]).then_some(MediaType::XHTML)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let Some(root) = context.content_as_xml().await? else {
                return Ok(None);
            };
            let is_xhtml = root.name.eq_ignore_ascii_case("html")
                && root.namespace.to_lowercase().contains("xhtml");
            Ok(is_xhtml.then_some(MediaType::XHTML))
        })
    }
}

/// HTML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSniffer;

const HTML_DOCTYPE: &str = "<!doctype html>";

impl Sniffer for HtmlSniffer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["htm", "html"], &["text/html"]).then_some(MediaType::HTML)
    }

    fn sniff_resource<'a>(
        &'a self,
        context: &'a ResourceContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            if let Some(root) = context.content_as_xml().await? {
                if root.name.eq_ignore_ascii_case("html") {
                    return Ok(Some(MediaType::HTML));
                }
            }

            // Most HTML is not well-formed XML.
            let has_doctype = context.content_as_string().await?.is_some_and(|text| {
                text.trim_start()
                    .get(..HTML_DOCTYPE.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HTML_DOCTYPE))
            });
            Ok(has_doctype.then_some(MediaType::HTML))
        })
    }
}

/// CSS style sheets, from hints only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssSniffer;

impl Sniffer for CssSniffer {
    fn name(&self) -> &'static str {
        "css"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["css"], &["text/css"]).then_some(MediaType::CSS)
    }
}

/// JavaScript sources, from hints only.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptSniffer;

impl Sniffer for JavaScriptSniffer {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["js"], &["text/javascript", "application/javascript"])
            .then_some(MediaType::JAVASCRIPT)
    }
}
