//! ZIP-based publication packages recognized from their entries.

use std::path::Path;

use futures::future::BoxFuture;

use super::hinted;
use crate::content::ContainerContext;
use crate::error::ContentResult;
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::Sniffer;

/// EPUB publications, recognized from their `mimetype` entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubSniffer;

impl Sniffer for EpubSniffer {
    fn name(&self) -> &'static str {
        "epub"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["epub"], &["application/epub+zip"]).then_some(MediaType::EPUB)
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let is_epub = context.read("mimetype").await?.is_some_and(|mimetype| {
                mimetype.is_ascii()
                    && String::from_utf8_lossy(&mimetype).trim() == "application/epub+zip"
            });
            Ok(is_epub.then_some(MediaType::EPUB))
        })
    }
}

/// W3C Lightweight Packaging Format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpfSniffer;

impl Sniffer for LpfSniffer {
    fn name(&self) -> &'static str {
        "lpf"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        hinted(hints, &["lpf"], &["application/lpf+zip"]).then_some(MediaType::LPF)
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            if context.contains("index.html").await? {
                return Ok(Some(MediaType::LPF));
            }
            let is_lpf = context
                .read_string("publication.json")
                .await?
                .is_some_and(|manifest| {
                    manifest.contains("@context")
                        && manifest.contains("https://www.w3.org/ns/pub-context")
                });
            Ok(is_lpf.then_some(MediaType::LPF))
        })
    }
}

/// Extensions allowed in a Comic Book Archive.
const CBZ_EXTENSIONS: &[&str] = &[
    // bitmap
    "bmp", "dib", "gif", "jif", "jfi", "jfif", "jpg", "jpeg", "png", "tif", "tiff", "webp",
    // metadata
    "acbf", "xml",
];

/// Extensions allowed in a Zipped Audio Book.
const ZAB_EXTENSIONS: &[&str] = &[
    // audio
    "aac", "aiff", "alac", "flac", "m4a", "m4b", "mp3", "ogg", "oga", "mogg", "opus", "wav", "webm",
    // playlist
    "asx", "bio", "m3u", "m3u8", "pla", "pls", "smil", "vlc", "wpl", "xspf", "zpl",
];

/// Plain archives of images (CBZ, CBR) or audio files (ZAB).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveSniffer;

impl Sniffer for ArchiveSniffer {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn sniff_hints(&self, hints: &Hints) -> Option<MediaType> {
        if hinted(
            hints,
            &["cbz"],
            &["application/vnd.comicbook+zip", "application/x-cbz"],
        ) {
            return Some(MediaType::CBZ);
        }
        if hinted(
            hints,
            &["cbr"],
            &["application/vnd.comicbook-rar", "application/x-cbr"],
        ) {
            return Some(MediaType::CBR);
        }
        if hints.has_file_extension(&["zab"]) {
            return Some(MediaType::ZAB);
        }
        None
    }

    fn sniff_container<'a>(
        &'a self,
        context: &'a ContainerContext<'a>,
    ) -> BoxFuture<'a, ContentResult<Option<MediaType>>> {
        Box::pin(async move {
            let entries = context.entries().await?;
            let extensions: Vec<String> = entries
                .iter()
                .map(Path::new)
                .filter(|path| !is_ignored(path))
                .map(|path| {
                    path.extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or_default()
                        .to_lowercase()
                })
                .collect();

            if extensions.is_empty() {
                return Ok(None);
            }

            if all_allowed(&extensions, CBZ_EXTENSIONS) {
                return Ok(Some(MediaType::CBZ));
            }
            if all_allowed(&extensions, ZAB_EXTENSIONS) {
                return Ok(Some(MediaType::ZAB));
            }
            Ok(None)
        })
    }
}

fn all_allowed(extensions: &[String], allowed: &[&str]) -> bool {
    extensions
        .iter()
        .all(|extension| allowed.contains(&extension.as_str()))
}

// Hidden files and Windows thumbnail caches end up in archives made by hand.
fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| name.starts_with('.') || name == "Thumbs.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniffers::testing::sniff_entries;

    #[tokio::test]
    async fn test_epub_mimetype() {
        assert_eq!(
            sniff_entries(&EpubSniffer, &[("mimetype", "application/epub+zip\n")]).await,
            Some(MediaType::EPUB)
        );
        assert_eq!(
            sniff_entries(&EpubSniffer, &[("mimetype", "application/zip")]).await,
            None
        );
        assert_eq!(sniff_entries(&EpubSniffer, &[("content.opf", "")]).await, None);
    }

    #[tokio::test]
    async fn test_lpf() {
        assert_eq!(
            sniff_entries(&LpfSniffer, &[("index.html", "<html/>")]).await,
            Some(MediaType::LPF)
        );
        let manifest = r#"{
            "@context": ["https://schema.org", "https://www.w3.org/ns/pub-context"]
        }"#;
        assert_eq!(
            sniff_entries(&LpfSniffer, &[("publication.json", manifest)]).await,
            Some(MediaType::LPF)
        );
        assert_eq!(sniff_entries(&LpfSniffer, &[("publication.json", "{}")]).await, None);
    }

    #[tokio::test]
    async fn test_cbz_whitelist() {
        let entries = [
            ("page1.JPG", ""),
            ("chapter/page2.png", ""),
            ("ComicInfo.xml", ""),
            (".DS_Store", ""),
            ("Thumbs.db", ""),
        ];
        assert_eq!(sniff_entries(&ArchiveSniffer, &entries).await, Some(MediaType::CBZ));
    }

    #[tokio::test]
    async fn test_zab_whitelist() {
        let entries = [("track1.mp3", ""), ("track2.mp3", ""), ("playlist.m3u", "")];
        assert_eq!(sniff_entries(&ArchiveSniffer, &entries).await, Some(MediaType::ZAB));
    }

    #[tokio::test]
    async fn test_foreign_entry_is_not_recognized() {
        let entries = [("page1.jpg", ""), ("notes.txt", "")];
        assert_eq!(sniff_entries(&ArchiveSniffer, &entries).await, None);
    }

    #[tokio::test]
    async fn test_empty_archive_is_not_recognized() {
        assert_eq!(sniff_entries(&ArchiveSniffer, &[]).await, None);
        assert_eq!(sniff_entries(&ArchiveSniffer, &[(".hidden", "")]).await, None);
    }

    #[test]
    fn test_archive_hints() {
        assert_eq!(
            ArchiveSniffer.sniff_hints(&Hints::from_media_type("application/x-cbz")),
            Some(MediaType::CBZ)
        );
        assert_eq!(
            ArchiveSniffer.sniff_hints(&Hints::from_file_extension("cbr")),
            Some(MediaType::CBR)
        );
        assert_eq!(
            ArchiveSniffer.sniff_hints(&Hints::from_file_extension("zab")),
            Some(MediaType::ZAB)
        );
    }
}
