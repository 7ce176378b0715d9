//! Content accessors handed to the heavy sniffing stage.
//!
//! An asset is either a single byte blob ([`Resource`]) or a set of named
//! entries ([`Container`]). Sniffers never see the raw accessors: they get a
//! [`ResourceContext`] or a [`ContainerContext`], which add caching and the
//! decoding helpers most formats need.

use std::ops::Range;

use bytes::Bytes;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::SniffingLimits;
use crate::error::{ContentError, ContentResult};
use crate::hints::Hints;
use crate::media_type::MediaType;
use crate::rwpm::Manifest;
use crate::xml::{self, XmlRoot};

/// A single blob of bytes.
///
/// Ranges are half-open; `None` reads the whole content. Reading past the
/// end returns what is available.
pub trait Resource: Send + Sync {
    /// Length in bytes, when the source knows it without reading.
    fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>>;

    fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>>;

    /// Releases the underlying handles. Reads after closing may fail.
    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// A set of entries addressed by relative paths (`/`-separated, no leading
/// slash).
pub trait Container: Send + Sync {
    fn entries(&self) -> BoxFuture<'_, ContentResult<Vec<String>>>;

    fn contains<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<bool>> {
        Box::pin(async move { Ok(self.entries().await?.iter().any(|entry| entry == path)) })
    }

    /// Length of an entry, `None` when the entry is absent or its length unknown.
    fn entry_length<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<Option<u64>>>;

    /// Reads an entry. An absent entry is `Ok(None)`, not an error.
    fn read_entry<'a>(
        &'a self,
        path: &'a str,
        range: Option<Range<u64>>,
    ) -> BoxFuture<'a, ContentResult<Option<Bytes>>>;

    /// Media type of the archive format backing the container, if any.
    fn archive_media_type(&self) -> Option<MediaType> {
        None
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// The content of an asset, in one of its two shapes.
#[derive(Clone, Copy)]
pub enum SnifferContent<'a> {
    Resource(&'a dyn Resource),
    Container(&'a dyn Container),
}

/// A resource being sniffed, with its hints.
///
/// The whole content is read at most once and shared by every sniffer. The
/// read never goes past `max_whole_read` bytes, even when the length of the
/// resource is unknown.
pub struct ResourceContext<'a> {
    resource: &'a dyn Resource,
    hints: &'a Hints,
    limits: SniffingLimits,
    /// `None` once the resource turned out to be too big.
    content: OnceCell<Option<Bytes>>,
}

impl<'a> ResourceContext<'a> {
    pub fn new(resource: &'a dyn Resource, hints: &'a Hints, limits: SniffingLimits) -> Self {
        Self {
            resource,
            hints,
            limits,
            content: OnceCell::new(),
        }
    }

    pub fn hints(&self) -> &Hints {
        self.hints
    }

    pub fn limits(&self) -> &SniffingLimits {
        &self.limits
    }

    /// Reads a range of the resource, or all of it.
    ///
    /// A whole read is cached, and range reads are served from the cache once
    /// it is filled. Reading a resource too big to be held whole fails with
    /// `ContentError::TooBig`.
    pub async fn read(&self, range: Option<Range<u64>>) -> ContentResult<Bytes> {
        match range {
            None => self.whole().await?.ok_or(ContentError::TooBig {
                length: self.limits.max_whole_read,
                limit: self.limits.max_whole_read,
            }),
            Some(range) => match self.content.get() {
                Some(Some(content)) => Ok(slice(content, range)),
                _ => self.resource.read(Some(range)).await,
            },
        }
    }

    /// Returns whether the resource is small enough to be decoded as a whole.
    /// Resources of unknown length are read optimistically.
    pub async fn can_read_whole(&self) -> ContentResult<bool> {
        Ok(match self.resource.length().await? {
            Some(length) => length < self.limits.max_whole_read,
            None => true,
        })
    }

    /// The content decoded with the charset of the hints, or as UTF-8.
    ///
    /// Returns `None` for resources too big to be read whole, and for
    /// content that is not valid in the chosen encoding.
    pub async fn content_as_string(&self) -> ContentResult<Option<String>> {
        if !self.can_read_whole().await? {
            return Ok(None);
        }
        let Some(content) = self.whole().await? else {
            return Ok(None);
        };
        let encoding = self.hints.charset().unwrap_or(encoding_rs::UTF_8);
        Ok(encoding
            .decode_without_bom_handling_and_without_replacement(strip_bom(&content))
            .map(|text| text.into_owned()))
    }

    /// Root element of the content, if it is well-formed XML.
    pub async fn content_as_xml(&self) -> ContentResult<Option<XmlRoot>> {
        if !self.can_read_whole().await? {
            return Ok(None);
        }
        Ok(self
            .whole()
            .await?
            .and_then(|content| xml::parse_root(&content)))
    }

    /// The content parsed as a JSON document.
    pub async fn content_as_json(&self) -> ContentResult<Option<Value>> {
        Ok(self
            .content_as_string()
            .await?
            .and_then(|text| serde_json::from_str(&text).ok()))
    }

    /// The content parsed as a Readium Web Publication Manifest.
    pub async fn content_as_rwpm(&self) -> ContentResult<Option<Manifest>> {
        Ok(self
            .content_as_json()
            .await?
            .as_ref()
            .and_then(Manifest::from_json))
    }

    /// Returns whether the content is a JSON object holding all of `keys`.
    pub async fn contains_json_keys(&self, keys: &[&str]) -> ContentResult<bool> {
        Ok(match self.content_as_json().await? {
            Some(Value::Object(object)) => keys.iter().all(|key| object.contains_key(*key)),
            _ => false,
        })
    }

    async fn whole(&self) -> ContentResult<Option<Bytes>> {
        let limit = self.limits.max_whole_read;
        self.content
            .get_or_try_init(|| async {
                let content = self.resource.read(Some(0..limit)).await?;
                if content.len() as u64 >= limit {
                    tracing::debug!(limit, "resource too big to be read whole");
                    return Ok(None);
                }
                Ok::<_, ContentError>(Some(content))
            })
            .await
            .cloned()
    }
}

/// A container being sniffed, with its hints.
pub struct ContainerContext<'a> {
    container: &'a dyn Container,
    hints: &'a Hints,
    limits: SniffingLimits,
}

impl<'a> ContainerContext<'a> {
    pub fn new(container: &'a dyn Container, hints: &'a Hints, limits: SniffingLimits) -> Self {
        Self {
            container,
            hints,
            limits,
        }
    }

    pub fn hints(&self) -> &Hints {
        self.hints
    }

    pub fn limits(&self) -> &SniffingLimits {
        &self.limits
    }

    pub fn archive_media_type(&self) -> Option<MediaType> {
        self.container.archive_media_type()
    }

    pub async fn contains(&self, path: &str) -> ContentResult<bool> {
        self.container.contains(path).await
    }

    pub async fn entries(&self) -> ContentResult<Vec<String>> {
        self.container.entries().await
    }

    /// Reads a whole entry, `None` if absent or too big to be read whole.
    pub async fn read(&self, path: &str) -> ContentResult<Option<Bytes>> {
        let limit = self.limits.max_whole_read;
        if let Some(length) = self.container.entry_length(path).await? {
            if length >= limit {
                tracing::debug!(path, length, limit, "entry too big to be read whole");
                return Ok(None);
            }
        }
        match self.container.read_entry(path, None).await {
            Ok(Some(content)) if content.len() as u64 >= limit => {
                tracing::debug!(path, limit, "entry too big to be read whole");
                Ok(None)
            }
            Err(ContentError::TooBig { length, .. }) => {
                tracing::debug!(path, length, limit, "entry too big to be read whole");
                Ok(None)
            }
            other => other,
        }
    }

    /// Reads an entry as UTF-8 text. Absent entries and invalid text are `None`.
    pub async fn read_string(&self, path: &str) -> ContentResult<Option<String>> {
        Ok(self
            .read(path)
            .await?
            .and_then(|bytes| String::from_utf8(strip_bom(&bytes).to_vec()).ok()))
    }

    /// Parses an entry as a JSON document.
    pub async fn read_json(&self, path: &str) -> ContentResult<Option<Value>> {
        Ok(self
            .read_string(path)
            .await?
            .and_then(|text| serde_json::from_str(&text).ok()))
    }
}

/// Clamps a half-open range to the bounds of `content`.
pub(crate) fn slice(content: &Bytes, range: Range<u64>) -> Bytes {
    let len = content.len() as u64;
    let end = range.end.min(len);
    let start = range.start.min(end);
    content.slice(start as usize..end as usize)
}

fn strip_bom(content: &[u8]) -> &[u8] {
    content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingResource {
        data: Bytes,
        reads: AtomicUsize,
    }

    impl CountingResource {
        fn new(data: &'static [u8]) -> Self {
            Self {
                data: Bytes::from_static(data),
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl Resource for CountingResource {
        fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
            Box::pin(async { Ok(Some(self.data.len() as u64)) })
        }

        fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(match range {
                    Some(range) => slice(&self.data, range),
                    None => self.data.clone(),
                })
            })
        }
    }

    /// A resource of unknown length that records the ranges it is asked for.
    struct UnsizedResource {
        data: Bytes,
        ranges: std::sync::Mutex<Vec<Option<Range<u64>>>>,
    }

    impl Resource for UnsizedResource {
        fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
            Box::pin(async { Ok(None) })
        }

        fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
            self.ranges.lock().unwrap().push(range.clone());
            Box::pin(async move {
                Ok(match range {
                    Some(range) => slice(&self.data, range),
                    None => self.data.clone(),
                })
            })
        }
    }

    struct FailingResource;

    impl Resource for FailingResource {
        fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
            Box::pin(async { Ok(None) })
        }

        fn read(&self, _range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
            Box::pin(async { Err(ContentError::Forbidden("nope".into())) })
        }
    }

    #[tokio::test]
    async fn test_whole_content_is_read_once() {
        let resource = CountingResource::new(br#"{"id": 1}"#);
        let hints = Hints::default();
        let context = ResourceContext::new(&resource, &hints, SniffingLimits::default());

        assert!(context.content_as_json().await.unwrap().is_some());
        assert!(context.content_as_string().await.unwrap().is_some());
        assert_eq!(context.read(Some(0..2)).await.unwrap(), Bytes::from_static(b"{\""));
        assert_eq!(resource.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_too_big_resource_is_not_decoded() {
        let resource = CountingResource::new(b"<root/>");
        let hints = Hints::default();
        let limits = SniffingLimits {
            max_whole_read: 4,
            ..SniffingLimits::default()
        };
        let context = ResourceContext::new(&resource, &hints, limits);

        assert!(!context.can_read_whole().await.unwrap());
        assert!(context.content_as_xml().await.unwrap().is_none());
        assert_eq!(resource.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_length_is_read_up_to_the_limit() {
        let resource = UnsizedResource {
            data: Bytes::from(format!(r#"{{"title": "{}"}}"#, "a".repeat(100))),
            ranges: Default::default(),
        };
        let hints = Hints::default();
        let limits = SniffingLimits {
            max_whole_read: 32,
            ..SniffingLimits::default()
        };
        let context = ResourceContext::new(&resource, &hints, limits);

        assert!(context.can_read_whole().await.unwrap());
        assert_eq!(context.content_as_json().await.unwrap(), None);
        assert!(context.content_as_xml().await.unwrap().is_none());
        assert!(matches!(
            context.read(None).await,
            Err(ContentError::TooBig { limit: 32, .. })
        ));
        assert_eq!(*resource.ranges.lock().unwrap(), vec![Some(0..32)]);
    }

    #[tokio::test]
    async fn test_big_container_entry_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("manifest.json"), format!("{:64}", "{}")).unwrap();
        std::fs::write(dir.path().join("mimetype"), "application/epub+zip").unwrap();

        let container = crate::archive::DirectoryContainer::new(dir.path());
        let hints = Hints::default();
        let limits = SniffingLimits {
            max_whole_read: 32,
            ..SniffingLimits::default()
        };
        let context = ContainerContext::new(&container, &hints, limits);

        assert!(context.contains("manifest.json").await.unwrap());
        assert_eq!(context.read("manifest.json").await.unwrap(), None);
        assert_eq!(context.read_json("manifest.json").await.unwrap(), None);
        assert_eq!(
            context.read_string("mimetype").await.unwrap().as_deref(),
            Some("application/epub+zip")
        );
    }

    #[tokio::test]
    async fn test_charset_from_hints() {
        let resource = CountingResource::new(b"caf\xE9");
        let hints = Hints::from_media_type("text/plain;charset=iso-8859-1");
        let context = ResourceContext::new(&resource, &hints, SniffingLimits::default());
        assert_eq!(context.content_as_string().await.unwrap().as_deref(), Some("café"));

        let hints = Hints::default();
        let context = ResourceContext::new(&resource, &hints, SniffingLimits::default());
        assert_eq!(context.content_as_string().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_contains_json_keys() {
        let resource = CountingResource::new(br#"{"id": "1", "issued": "", "provider": ""}"#);
        let hints = Hints::default();
        let context = ResourceContext::new(&resource, &hints, SniffingLimits::default());
        assert!(context.contains_json_keys(&["id", "issued"]).await.unwrap());
        assert!(!context.contains_json_keys(&["id", "encryption"]).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_errors_propagate() {
        let hints = Hints::default();
        let context = ResourceContext::new(&FailingResource, &hints, SniffingLimits::default());
        assert!(matches!(
            context.content_as_json().await,
            Err(ContentError::Forbidden(_))
        ));
    }

    #[test]
    fn test_slice_clamps_range() {
        let content = Bytes::from_static(b"hello");
        assert_eq!(slice(&content, 1..3), Bytes::from_static(b"el"));
        assert_eq!(slice(&content, 3..100), Bytes::from_static(b"lo"));
        assert_eq!(slice(&content, 10..20), Bytes::new());
    }
}
