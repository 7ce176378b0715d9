//! RFC 6838 media types.
//!
//! Comparing media types is more subtle than comparing strings: parameters
//! such as `charset=utf-8` are unordered, and some formats are only told
//! apart by a parameter (`application/atom+xml;profile=opds-catalog`).
//! [`MediaType`] therefore offers two operators:
//!
//! - `==` is strict structural equality, parameters included.
//! - [`MediaType::matches`] ignores the parameters present on only one side.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::MediaTypeError;

type Parameter = (Cow<'static, str>, Cow<'static, str>);

/// A parsed media type, e.g. `application/epub+zip` or `text/html;charset=UTF-8`.
///
/// The type and subtype are always lower-cased, parameter names are
/// lower-cased and kept sorted, and the `charset` value is normalized to the
/// upper-cased canonical name of its encoding.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType {
    type_: Cow<'static, str>,
    subtype: Cow<'static, str>,
    parameters: Cow<'static, [Parameter]>,
}

impl MediaType {
    const fn known(type_: &'static str, subtype: &'static str) -> Self {
        Self {
            type_: Cow::Borrowed(type_),
            subtype: Cow::Borrowed(subtype),
            parameters: Cow::Borrowed(&[]),
        }
    }

    /// `parameters` must be sorted by name.
    const fn known_with(
        type_: &'static str,
        subtype: &'static str,
        parameters: &'static [Parameter],
    ) -> Self {
        Self {
            type_: Cow::Borrowed(type_),
            subtype: Cow::Borrowed(subtype),
            parameters: Cow::Borrowed(parameters),
        }
    }

    /// Parses a media type from its string representation.
    ///
    /// Returns `None` when the string is empty or when its first component is
    /// not made of exactly two non-empty parts around a `/`. Parameters without
    /// a `=` are silently dropped.
    pub fn parse(string: &str) -> Option<Self> {
        let mut components = string.split(';').map(str::trim);
        let (type_, subtype) = components.next()?.split_once('/')?;
        let (type_, subtype) = (type_.trim(), subtype.trim());
        if type_.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return None;
        }

        let mut parameters = BTreeMap::new();
        for component in components {
            let Some((name, value)) = component.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            parameters.insert(name, value.trim().to_string());
        }
        if let Some(charset) = parameters.get_mut("charset") {
            *charset = canonical_charset(charset);
        }

        Some(Self {
            type_: Cow::Owned(type_.to_ascii_lowercase()),
            subtype: Cow::Owned(subtype.to_ascii_lowercase()),
            parameters: Cow::Owned(
                parameters
                    .into_iter()
                    .map(|(name, value)| (Cow::Owned(name), Cow::Owned(value)))
                    .collect(),
            ),
        })
    }

    /// The type component, e.g. `application` in `application/epub+zip`.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// The subtype component, e.g. `epub+zip` in `application/epub+zip`.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The parameters, sorted by name.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_ref(), value.as_ref()))
    }

    /// Value of the parameter with the given (case-insensitive) name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_ref())
    }

    /// Structured syntax suffix, e.g. `+zip` in `application/epub+zip`.
    pub fn structured_syntax_suffix(&self) -> Option<&str> {
        self.subtype
            .rfind('+')
            .map(|index| &self.subtype[index..])
            .filter(|suffix| suffix.len() > 1)
    }

    /// Encoding declared by the `charset` parameter, if it labels a known one.
    pub fn charset(&self) -> Option<&'static Encoding> {
        self.parameter("charset")
            .and_then(|label| Encoding::for_label(label.as_bytes()))
    }

    /// Returns whether `other` is included in this media type.
    ///
    /// `text/html` contains `text/html;charset=utf-8`, but not the other way
    /// around: every parameter of `self` must be present in `other`. A `*`
    /// type or subtype on this side is a wildcard.
    pub fn contains(&self, other: &MediaType) -> bool {
        (self.type_ == "*" || self.type_ == other.type_)
            && (self.subtype == "*" || self.subtype == other.subtype)
            && self
                .parameters
                .iter()
                .all(|(name, value)| other.parameter(name) == Some(value.as_ref()))
    }

    /// Same as [`MediaType::contains`], parsing `other` first. Invalid
    /// strings are never contained.
    pub fn contains_str(&self, other: &str) -> bool {
        MediaType::parse(other).is_some_and(|other| self.contains(&other))
    }

    /// Returns whether the two media types are the same, ignoring the
    /// parameters that are not present in both of them.
    pub fn matches(&self, other: &MediaType) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Same as [`MediaType::matches`], parsing `other` first.
    pub fn matches_str(&self, other: &str) -> bool {
        MediaType::parse(other).is_some_and(|other| self.matches(&other))
    }

    /// Returns whether this media type matches any of `others`.
    pub fn matches_any(&self, others: &[MediaType]) -> bool {
        others.iter().any(|other| self.matches(other))
    }

    // -----------------------------------------------------------------------
    // Classifications
    // -----------------------------------------------------------------------

    /// Structured as a ZIP archive.
    pub fn is_zip(&self) -> bool {
        self.matches_any(&[
            Self::ZIP,
            Self::LCP_PROTECTED_AUDIOBOOK,
            Self::LCP_PROTECTED_PDF,
        ]) || self.structured_syntax_suffix() == Some("+zip")
    }

    /// Structured as a JSON document.
    pub fn is_json(&self) -> bool {
        self.matches(&Self::JSON) || self.structured_syntax_suffix() == Some("+json")
    }

    /// An OPDS feed, publication or authentication document.
    pub fn is_opds(&self) -> bool {
        self.matches_any(&[
            Self::OPDS1,
            Self::OPDS1_ENTRY,
            Self::OPDS2,
            Self::OPDS2_PUBLICATION,
            Self::OPDS_AUTHENTICATION,
        ])
    }

    pub fn is_html(&self) -> bool {
        self.matches_any(&[Self::HTML, Self::XHTML])
    }

    /// A bitmap image, so excluding vector formats.
    pub fn is_bitmap(&self) -> bool {
        self.matches_any(&[
            Self::AVIF,
            Self::BMP,
            Self::GIF,
            Self::JPEG,
            Self::JXL,
            Self::PNG,
            Self::TIFF,
            Self::WEBP,
        ])
    }

    pub fn is_audio(&self) -> bool {
        self.type_ == "audio"
    }

    pub fn is_video(&self) -> bool {
        self.type_ == "video"
    }

    /// A Readium Web Publication Manifest.
    pub fn is_rwpm(&self) -> bool {
        self.matches_any(&[
            Self::READIUM_AUDIOBOOK_MANIFEST,
            Self::DIVINA_MANIFEST,
            Self::READIUM_WEBPUB_MANIFEST,
        ])
    }

    /// A publication file, as opposed to one of its resources.
    pub fn is_publication(&self) -> bool {
        self.matches_any(&[
            Self::READIUM_AUDIOBOOK,
            Self::READIUM_AUDIOBOOK_MANIFEST,
            Self::CBR,
            Self::CBZ,
            Self::DIVINA,
            Self::DIVINA_MANIFEST,
            Self::EPUB,
            Self::LCP_PROTECTED_AUDIOBOOK,
            Self::LCP_PROTECTED_PDF,
            Self::LPF,
            Self::PDF,
            Self::W3C_WPUB_MANIFEST,
            Self::READIUM_WEBPUB,
            Self::READIUM_WEBPUB_MANIFEST,
            Self::ZAB,
        ])
    }

    // -----------------------------------------------------------------------
    // Known media types
    // -----------------------------------------------------------------------

    pub const AAC: MediaType = MediaType::known("audio", "aac");
    pub const ACSM: MediaType = MediaType::known("application", "vnd.adobe.adept+xml");
    pub const AIFF: MediaType = MediaType::known("audio", "aiff");
    pub const AVI: MediaType = MediaType::known("video", "x-msvideo");
    pub const AVIF: MediaType = MediaType::known("image", "avif");
    pub const BINARY: MediaType = MediaType::known("application", "octet-stream");
    pub const BMP: MediaType = MediaType::known("image", "bmp");
    pub const CBR: MediaType = MediaType::known("application", "vnd.comicbook-rar");
    pub const CBZ: MediaType = MediaType::known("application", "vnd.comicbook+zip");
    pub const CSS: MediaType = MediaType::known("text", "css");
    pub const DIVINA: MediaType = MediaType::known("application", "divina+zip");
    pub const DIVINA_MANIFEST: MediaType = MediaType::known("application", "divina+json");
    pub const EPUB: MediaType = MediaType::known("application", "epub+zip");
    pub const FLAC: MediaType = MediaType::known("audio", "flac");
    pub const GIF: MediaType = MediaType::known("image", "gif");
    pub const GZ: MediaType = MediaType::known("application", "gzip");
    pub const HTML: MediaType = MediaType::known("text", "html");
    pub const JAVASCRIPT: MediaType = MediaType::known("text", "javascript");
    pub const JPEG: MediaType = MediaType::known("image", "jpeg");
    pub const JSON: MediaType = MediaType::known("application", "json");
    pub const JSON_PROBLEM_DETAILS: MediaType = MediaType::known("application", "problem+json");
    pub const JXL: MediaType = MediaType::known("image", "jxl");
    pub const LCP_LICENSE_DOCUMENT: MediaType =
        MediaType::known("application", "vnd.readium.lcp.license.v1.0+json");
    pub const LCP_PROTECTED_AUDIOBOOK: MediaType = MediaType::known("application", "audiobook+lcp");
    pub const LCP_PROTECTED_PDF: MediaType = MediaType::known("application", "pdf+lcp");
    pub const LCP_STATUS_DOCUMENT: MediaType =
        MediaType::known("application", "vnd.readium.license.status.v1.0+json");
    pub const LPF: MediaType = MediaType::known("application", "lpf+zip");
    pub const MP3: MediaType = MediaType::known("audio", "mpeg");
    pub const MP4_AUDIO: MediaType = MediaType::known("audio", "mp4");
    pub const MPEG: MediaType = MediaType::known("video", "mpeg");
    pub const NCX: MediaType = MediaType::known("application", "x-dtbncx+xml");
    pub const OGG: MediaType = MediaType::known("audio", "ogg");
    pub const OGV: MediaType = MediaType::known("video", "ogg");
    pub const OPDS1: MediaType =
        MediaType::known_with("application", "atom+xml", OPDS_CATALOG_PARAMETERS);
    pub const OPDS1_ENTRY: MediaType =
        MediaType::known_with("application", "atom+xml", OPDS_ENTRY_PARAMETERS);
    pub const OPDS2: MediaType = MediaType::known("application", "opds+json");
    pub const OPDS2_PUBLICATION: MediaType =
        MediaType::known("application", "opds-publication+json");
    pub const OPDS_AUTHENTICATION: MediaType =
        MediaType::known("application", "opds-authentication+json");
    pub const OPUS: MediaType = MediaType::known("audio", "opus");
    pub const OTF: MediaType = MediaType::known("font", "otf");
    pub const PDF: MediaType = MediaType::known("application", "pdf");
    pub const PNG: MediaType = MediaType::known("image", "png");
    pub const RAR: MediaType = MediaType::known("application", "vnd.rar");
    pub const READIUM_AUDIOBOOK: MediaType = MediaType::known("application", "audiobook+zip");
    pub const READIUM_AUDIOBOOK_MANIFEST: MediaType =
        MediaType::known("application", "audiobook+json");
    pub const READIUM_WEBPUB: MediaType = MediaType::known("application", "webpub+zip");
    pub const READIUM_WEBPUB_MANIFEST: MediaType = MediaType::known("application", "webpub+json");
    pub const SMIL: MediaType = MediaType::known("application", "smil+xml");
    pub const SVG: MediaType = MediaType::known("image", "svg+xml");
    pub const TEXT: MediaType = MediaType::known("text", "plain");
    pub const TIFF: MediaType = MediaType::known("image", "tiff");
    pub const TTF: MediaType = MediaType::known("font", "ttf");
    /// Not a registered type; used internally to identify W3C manifests.
    pub const W3C_WPUB_MANIFEST: MediaType =
        MediaType::known("application", "x.readium.w3c.wpub+json");
    pub const WAV: MediaType = MediaType::known("audio", "wav");
    pub const WEBM_AUDIO: MediaType = MediaType::known("audio", "webm");
    pub const WEBM_VIDEO: MediaType = MediaType::known("video", "webm");
    pub const WEBP: MediaType = MediaType::known("image", "webp");
    pub const WOFF: MediaType = MediaType::known("font", "woff");
    pub const WOFF2: MediaType = MediaType::known("font", "woff2");
    pub const XHTML: MediaType = MediaType::known("application", "xhtml+xml");
    pub const XML: MediaType = MediaType::known("application", "xml");
    /// Zipped Audio Book. Not a registered type.
    pub const ZAB: MediaType = MediaType::known("application", "x.readium.zab+zip");
    pub const ZIP: MediaType = MediaType::known("application", "zip");
}

const OPDS_CATALOG_PARAMETERS: &[Parameter] =
    &[(Cow::Borrowed("profile"), Cow::Borrowed("opds-catalog"))];

const OPDS_ENTRY_PARAMETERS: &[Parameter] = &[
    (Cow::Borrowed("profile"), Cow::Borrowed("opds-catalog")),
    (Cow::Borrowed("type"), Cow::Borrowed("entry")),
];

/// Canonical, upper-cased name of the encoding labelled by `label`, or the
/// label itself upper-cased when it is unknown.
fn canonical_charset(label: &str) -> String {
    Encoding::for_label(label.as_bytes())
        .map(|encoding| encoding.name())
        .unwrap_or(label)
        .to_uppercase()
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in self.parameters.iter() {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaType({:?})", self.to_string())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s).ok_or_else(|| MediaTypeError::Invalid(s.to_string()))
    }
}

impl TryFrom<String> for MediaType {
    type Error = MediaTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaType> for String {
    fn from(media_type: MediaType) -> Self {
        media_type.to_string()
    }
}
