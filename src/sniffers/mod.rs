//! The format sniffers shipped with the crate.
//!
//! Order matters: some formats are refinements of others. XHTML precedes
//! HTML, the Readium manifest sniffer precedes the package sniffer, every
//! JSON-based format precedes plain JSON, and format-specific archive
//! sniffers precede plain ZIP.

mod binary;
mod generic;
mod lcp;
mod markup;
mod media;
mod opds;
mod package;
mod webpub;

pub use binary::{PdfSniffer, RarSniffer};
pub use generic::{JsonSniffer, XmlSniffer, ZipSniffer};
pub use lcp::LcpLicenseSniffer;
pub use markup::{CssSniffer, HtmlSniffer, JavaScriptSniffer, XhtmlSniffer};
pub use media::{AudioSniffer, BitmapSniffer};
pub use opds::OpdsSniffer;
pub use package::{ArchiveSniffer, EpubSniffer, LpfSniffer};
pub use webpub::{W3cWpubSniffer, WebPubManifestSniffer, WebPubPackageSniffer};

use crate::hints::Hints;
use crate::sniffer::Sniffer;

/// Every sniffer of the crate, in priority order.
pub fn default_sniffers() -> Vec<Box<dyn Sniffer>> {
    vec![
        Box::new(XhtmlSniffer),
        Box::new(HtmlSniffer),
        Box::new(CssSniffer),
        Box::new(JavaScriptSniffer),
        Box::new(OpdsSniffer),
        Box::new(LcpLicenseSniffer),
        Box::new(BitmapSniffer),
        Box::new(AudioSniffer),
        Box::new(WebPubManifestSniffer),
        Box::new(WebPubPackageSniffer),
        Box::new(W3cWpubSniffer),
        Box::new(EpubSniffer),
        Box::new(LpfSniffer),
        Box::new(ArchiveSniffer),
        Box::new(PdfSniffer),
        Box::new(RarSniffer),
        Box::new(JsonSniffer),
        Box::new(XmlSniffer),
        Box::new(ZipSniffer),
    ]
}

fn hinted(hints: &Hints, extensions: &[&str], media_types: &[&str]) -> bool {
    hints.has_file_extension(extensions) || hints.has_media_type(media_types)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let names: Vec<_> = default_sniffers().iter().map(|s| s.name()).collect();
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();

        assert!(position("xhtml") < position("html"));
        assert!(position("css") < position("json"));
        assert!(position("javascript") < position("json"));
        assert!(position("webpub-manifest") < position("webpub-package"));
        assert!(position("opds") < position("json"));
        assert!(position("lcp-license") < position("json"));
        assert_eq!(names.last(), Some(&"zip"));
    }
}
