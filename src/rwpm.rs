//! Minimal Readium Web Publication Manifest model.
//!
//! Only what sniffing needs is kept: links with their relations and media
//! types, the reading order, and the profiles declared in `conformsTo`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::media_type::MediaType;

/// A publication profile, as used in `metadata.conformsTo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Audiobook,
    Divina,
    Epub,
    Pdf,
}

impl Profile {
    pub fn uri(&self) -> &'static str {
        match self {
            Profile::Audiobook => "https://readium.org/webpub-manifest/profiles/audiobook",
            Profile::Divina => "https://readium.org/webpub-manifest/profiles/divina",
            Profile::Epub => "https://readium.org/webpub-manifest/profiles/epub",
            Profile::Pdf => "https://readium.org/webpub-manifest/profiles/pdf",
        }
    }
}

/// A link to a resource of the publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rels: Vec<String>,
}

impl Link {
    fn from_json(json: &Value) -> Option<Self> {
        let href = json.get("href")?.as_str()?.to_string();
        let media_type = json
            .get("type")
            .and_then(Value::as_str)
            .and_then(MediaType::parse);
        Some(Self {
            href,
            media_type,
            rels: strings(json.get("rel")),
        })
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r == rel)
    }

    /// The declared media type, or the one guessed from the extension of
    /// the `href` when the link has no `type`.
    pub fn resolved_media_type(&self) -> Option<MediaType> {
        if let Some(media_type) = &self.media_type {
            return Some(media_type.clone());
        }
        let path = self.href.split(['?', '#']).next().unwrap_or_default();
        mime_guess::from_path(path)
            .first()
            .and_then(|mime| MediaType::parse(mime.as_ref()))
    }
}

/// The parts of a manifest relevant to sniffing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub conforms_to: Vec<String>,
    pub links: Vec<Link>,
    pub reading_order: Vec<Link>,
    pub resources: Vec<Link>,
}

impl Manifest {
    /// Builds a manifest from its JSON representation.
    ///
    /// Returns `None` unless the document is an object with a `metadata`
    /// object carrying a `title`. Links without an `href` are skipped. The
    /// legacy `spine` key is accepted in place of `readingOrder`.
    pub fn from_json(json: &Value) -> Option<Self> {
        let metadata = json.get("metadata")?.as_object()?;
        metadata.get("title").filter(|title| !title.is_null())?;

        let reading_order = json.get("readingOrder").or_else(|| json.get("spine"));

        Some(Self {
            conforms_to: strings(metadata.get("conformsTo")),
            links: links(json.get("links")),
            reading_order: links(reading_order),
            resources: links(json.get("resources")),
        })
    }

    /// Returns whether the publication conforms to `profile`.
    ///
    /// Audiobooks, DiViNa and PDF are recognized from the media types of the
    /// reading order. EPUB must also be declared in `conformsTo`, otherwise it
    /// could be a regular web publication. A manifest with an empty reading
    /// order conforms to nothing.
    pub fn conforms_to(&self, profile: Profile) -> bool {
        if self.reading_order.is_empty() {
            return false;
        }

        match profile {
            Profile::Audiobook => self.reading_order_all(MediaType::is_audio),
            Profile::Divina => self.reading_order_all(MediaType::is_bitmap),
            Profile::Epub => {
                self.reading_order_all(MediaType::is_html) && self.declares(profile)
            }
            Profile::Pdf => self.reading_order_all(|m| m.matches(&MediaType::PDF)),
        }
    }

    /// First link of `links` with the given relation.
    pub fn link_with_rel(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.has_rel(rel))
    }

    /// The media type of the `self` link.
    pub fn self_media_type(&self) -> Option<&MediaType> {
        self.link_with_rel("self")?.media_type.as_ref()
    }

    fn declares(&self, profile: Profile) -> bool {
        self.conforms_to.iter().any(|uri| uri == profile.uri())
    }

    fn reading_order_all(&self, predicate: impl Fn(&MediaType) -> bool) -> bool {
        self.reading_order
            .iter()
            .all(|link| link.resolved_media_type().is_some_and(|m| predicate(&m)))
    }
}

// A single string or an array of strings.
fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn links(value: Option<&Value>) -> Vec<Link> {
    value
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Link::from_json).collect())
        .unwrap_or_default()
}
