//! Media type and file extension hints.
//!
//! Hints are the unverified signals gathered before any content is read: a
//! file name, a URL, a `Content-Type` header, a type stored in a database.
//! They feed the light sniffing stages of the retriever.

use std::path::Path;

use encoding_rs::Encoding;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::content_disposition::filename_from_content_disposition;
use crate::media_type::MediaType;

/// Bundle of media type and file extension hints.
///
/// Invalid media type strings are dropped on construction. File extensions
/// are lower-cased and stored without their leading dot. Order is kept: the
/// first valid media type is the retriever's last-resort answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_types: Vec<MediaType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_extensions: Vec<String>,
}

impl Hints {
    /// Creates hints from media type and file extension strings.
    pub fn new<M, E>(media_types: M, file_extensions: E) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut hints = Self::default();
        for media_type in media_types {
            hints = hints.with_media_type(media_type.as_ref());
        }
        for extension in file_extensions {
            hints = hints.with_file_extension(extension.as_ref());
        }
        hints
    }

    /// Hints made of a single media type string.
    pub fn from_media_type(media_type: &str) -> Self {
        Self::default().with_media_type(media_type)
    }

    /// Hints made of a single file extension.
    pub fn from_file_extension(extension: &str) -> Self {
        Self::default().with_file_extension(extension)
    }

    /// Hints made of the extension of a file path, if it has one.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(extension) => Self::from_file_extension(extension),
            None => Self::default(),
        }
    }

    /// Hints made of the extension of the last URL path segment.
    pub fn from_url(url: &Url) -> Self {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(Self::from_path)
            .unwrap_or_default()
    }

    /// Hints gathered from HTTP response headers: the `Content-Type`
    /// (unless it is the meaningless `application/octet-stream`) and the
    /// extension of the `Content-Disposition` file name.
    pub fn from_http_headers(headers: &HeaderMap) -> Self {
        let mut hints = Self::default();

        if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if let Some(media_type) = MediaType::parse(content_type) {
                if !media_type.matches(&MediaType::BINARY) {
                    hints.media_types.push(media_type);
                }
            }
        }

        if let Some(filename) = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
        {
            hints = hints.merge(Self::from_path(filename));
        }

        hints
    }

    /// Returns a copy with `media_type` appended, if it is valid.
    pub fn with_media_type(mut self, media_type: &str) -> Self {
        if let Some(media_type) = MediaType::parse(media_type) {
            self.media_types.push(media_type);
        }
        self
    }

    /// Returns a copy with `extension` appended, if it is not empty.
    pub fn with_file_extension(mut self, extension: &str) -> Self {
        let extension = extension.trim().trim_start_matches('.').to_lowercase();
        if !extension.is_empty() {
            self.file_extensions.push(extension);
        }
        self
    }

    /// Concatenates two sets of hints, `self` first.
    pub fn merge(mut self, other: Hints) -> Self {
        self.media_types.extend(other.media_types);
        self.file_extensions.extend(other.file_extensions);
        self
    }

    /// A copy of these hints without the file extensions.
    pub fn only_media_types(&self) -> Self {
        Self {
            media_types: self.media_types.clone(),
            file_extensions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty() && self.file_extensions.is_empty()
    }

    /// First encoding declared in the `charset` parameter of a media type hint.
    pub fn charset(&self) -> Option<&'static Encoding> {
        self.media_types.iter().find_map(MediaType::charset)
    }

    /// Returns whether any of the given file extensions is hinted, ignoring case.
    pub fn has_file_extension(&self, extensions: &[&str]) -> bool {
        extensions.iter().any(|extension| {
            self.file_extensions
                .iter()
                .any(|hint| hint.eq_ignore_ascii_case(extension))
        })
    }

    /// Returns whether any hinted media type is contained in one of the given
    /// media types, ignoring case and extra parameters of the hint.
    pub fn has_media_type(&self, media_types: &[&str]) -> bool {
        media_types
            .iter()
            .filter_map(|s| MediaType::parse(s))
            .any(|media_type| self.media_types.iter().any(|hint| media_type.contains(hint)))
    }
}
