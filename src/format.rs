//! Display names and default file extensions of known formats.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::sniffer::{CompositeSniffer, Sniffer};

/// Human-facing description of a format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    pub name: String,
    /// Default extension, without its dot.
    pub file_extension: String,
}

impl Format {
    pub fn new(name: impl Into<String>, file_extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_extension: file_extension.into(),
        }
    }
}

/// Registry of known formats, keyed by canonical media type.
///
/// Lookups first canonicalize the media type through the hint sniffers, so
/// synonyms such as `application/x-cbz` find the entry registered for
/// `application/vnd.comicbook+zip`. Safe to share between threads.
pub struct FormatRegistry {
    formats: RwLock<HashMap<MediaType, Format>>,
    sniffer: Box<dyn Sniffer>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(Box::new(CompositeSniffer::default()))
    }
}

impl FormatRegistry {
    /// A registry seeded with the publication formats, canonicalizing with
    /// `sniffer`.
    pub fn new(sniffer: Box<dyn Sniffer>) -> Self {
        let formats = [
            (MediaType::ACSM, "Adobe Content Server Message", "acsm"),
            (MediaType::CBR, "Comic Book Archive (RAR)", "cbr"),
            (MediaType::CBZ, "Comic Book Archive", "cbz"),
            (MediaType::DIVINA, "Digital Visual Narratives", "divina"),
            (MediaType::DIVINA_MANIFEST, "Digital Visual Narratives", "json"),
            (MediaType::EPUB, "EPUB", "epub"),
            (MediaType::LCP_LICENSE_DOCUMENT, "LCP License", "lcpl"),
            (MediaType::LCP_PROTECTED_AUDIOBOOK, "LCP Protected Audiobook", "lcpa"),
            (MediaType::LCP_PROTECTED_PDF, "LCP Protected PDF", "lcpdf"),
            (MediaType::LPF, "Lightweight Packaging Format", "lpf"),
            (MediaType::PDF, "PDF", "pdf"),
            (MediaType::READIUM_AUDIOBOOK, "Readium Audiobook", "audiobook"),
            (MediaType::READIUM_AUDIOBOOK_MANIFEST, "Readium Audiobook", "json"),
            (MediaType::READIUM_WEBPUB, "Readium Web Publication", "webpub"),
            (MediaType::READIUM_WEBPUB_MANIFEST, "Readium Web Publication", "json"),
            (MediaType::W3C_WPUB_MANIFEST, "Web Publication", "json"),
            (MediaType::ZAB, "Zipped Audio Book", "zab"),
            (MediaType::JSON_PROBLEM_DETAILS, "HTTP Problem Details", "json"),
            (MediaType::OPDS1, "OPDS", "atom"),
            (MediaType::OPDS2, "OPDS", "json"),
        ]
        .into_iter()
        .map(|(media_type, name, extension)| (media_type, Format::new(name, extension)))
        .collect();

        Self {
            formats: RwLock::new(formats),
            sniffer,
        }
    }

    /// Registers `format` for `media_type`, replacing any previous entry.
    pub fn register(&self, media_type: MediaType, format: Format) {
        let media_type = self.canonicalize(&media_type);
        self.formats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(media_type, format);
    }

    /// The format registered for the canonical form of `media_type`.
    pub fn retrieve(&self, media_type: &MediaType) -> Option<Format> {
        let canonical = self.canonicalize(media_type);
        self.formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&canonical)
            .cloned()
    }

    pub fn name(&self, media_type: &MediaType) -> Option<String> {
        self.retrieve(media_type).map(|format| format.name)
    }

    pub fn file_extension(&self, media_type: &MediaType) -> Option<String> {
        self.retrieve(media_type).map(|format| format.file_extension)
    }

    fn canonicalize(&self, media_type: &MediaType) -> MediaType {
        let hints = Hints {
            media_types: vec![media_type.clone()],
            file_extensions: Vec::new(),
        };
        self.sniffer
            .sniff_hints(&hints)
            .unwrap_or_else(|| media_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_formats() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.file_extension(&MediaType::EPUB).as_deref(), Some("epub"));
        assert_eq!(registry.name(&MediaType::PDF).as_deref(), Some("PDF"));
        assert_eq!(registry.retrieve(&MediaType::PNG), None);
    }

    #[test]
    fn test_synonyms_are_canonicalized() {
        let registry = FormatRegistry::default();
        let cbz = MediaType::parse("application/x-cbz").unwrap();
        assert_eq!(registry.file_extension(&cbz).as_deref(), Some("cbz"));

        let epub = MediaType::parse("application/epub+zip;charset=utf-8").unwrap();
        assert_eq!(registry.file_extension(&epub).as_deref(), Some("epub"));
    }

    #[test]
    fn test_register_overwrites() {
        let registry = FormatRegistry::default();
        registry.register(MediaType::PNG, Format::new("PNG", "png"));
        registry.register(MediaType::EPUB, Format::new("Electronic Publication", "epub"));

        assert_eq!(registry.name(&MediaType::PNG).as_deref(), Some("PNG"));
        assert_eq!(
            registry.name(&MediaType::EPUB).as_deref(),
            Some("Electronic Publication")
        );
    }

    #[test]
    fn test_unknown_media_type_is_looked_up_as_is() {
        let registry = FormatRegistry::default();
        let custom = MediaType::parse("application/x-custom").unwrap();
        assert_eq!(registry.retrieve(&custom), None);
        registry.register(custom.clone(), Format::new("Custom", "cst"));
        assert_eq!(registry.file_extension(&custom).as_deref(), Some("cst"));
    }
}
