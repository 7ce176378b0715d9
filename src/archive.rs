//! Archive opening and concrete [`Container`] implementations.
//!
//! A ZIP-based publication reaches the retriever as a plain resource. The
//! [`ArchiveOpener`] decides whether those bytes are an archive, in which
//! case the container sniffers get to look at its entries.

use std::io::{Cursor, Read};
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::future::BoxFuture;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::config::SniffingLimits;
use crate::content::{slice, Container, Resource};
use crate::error::{ContentError, ContentResult};
use crate::media_type::MediaType;

const ZIP_LOCAL_FILE_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// Opens resources as containers.
pub trait ArchiveOpener: Send + Sync {
    /// Returns `Ok(None)` when the resource is not an archive this opener
    /// understands. Read failures are errors.
    fn open<'a>(
        &'a self,
        resource: &'a dyn Resource,
        limits: &'a SniffingLimits,
    ) -> BoxFuture<'a, ContentResult<Option<Box<dyn Container>>>>;
}

/// Opens ZIP archives, loading them in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveOpener;

impl ArchiveOpener for ZipArchiveOpener {
    fn open<'a>(
        &'a self,
        resource: &'a dyn Resource,
        limits: &'a SniffingLimits,
    ) -> BoxFuture<'a, ContentResult<Option<Box<dyn Container>>>> {
        Box::pin(async move {
            let signature = resource.read(Some(0..4)).await?;
            if signature != ZIP_LOCAL_FILE_HEADER && signature != ZIP_EMPTY_ARCHIVE {
                return Ok(None);
            }

            if let Some(length) = resource.length().await? {
                check_archive_size(length, limits)?;
            }
            // One byte past the limit tells an oversized archive of unknown length.
            let window = 0..limits.max_archive_size.saturating_add(1);
            let data = resource.read(Some(window)).await?;
            check_archive_size(data.len() as u64, limits)?;

            // The bytes are in memory, so any failure here is a malformed archive.
            match ZipArchive::new(Cursor::new(data)) {
                Ok(archive) => {
                    let container = ZipContainer {
                        archive,
                        max_entry_size: limits.max_whole_read,
                    };
                    Ok(Some(Box::new(container) as Box<dyn Container>))
                }
                Err(err) => {
                    tracing::debug!(%err, "resource has a ZIP signature but cannot be opened");
                    Ok(None)
                }
            }
        })
    }
}

fn check_archive_size(length: u64, limits: &SniffingLimits) -> ContentResult<()> {
    if length > limits.max_archive_size {
        return Err(ContentError::TooBig {
            length,
            limit: limits.max_archive_size,
        });
    }
    Ok(())
}

/// An in-memory ZIP archive.
///
/// Entries are decompressed on each read, and never beyond `max_entry_size`
/// bytes: the sizes declared in the central directory are not trusted.
#[derive(Clone)]
pub struct ZipContainer {
    archive: ZipArchive<Cursor<Bytes>>,
    max_entry_size: u64,
}

impl ZipContainer {
    pub fn new(data: Bytes) -> ContentResult<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive,
            max_entry_size: SniffingLimits::default().max_whole_read,
        })
    }

    /// Largest entry a read may decompress, `ContentError::TooBig` beyond.
    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    fn read_file(&self, path: &str, range: Option<Range<u64>>) -> ContentResult<Option<Bytes>> {
        // Entries are read through a cheap clone, the central directory is shared.
        let mut archive = self.archive.clone();
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if file.is_dir() {
            return Ok(None);
        }

        let limit = self.max_entry_size;
        let declared = file.size();
        if range.is_none() && declared > limit {
            return Err(ContentError::TooBig {
                length: declared,
                limit,
            });
        }

        let wanted = range.as_ref().map_or(u64::MAX, |range| range.end);
        let mut buf = Vec::with_capacity(declared.min(wanted).min(limit) as usize);
        (&mut file)
            .take(wanted.min(limit.saturating_add(1)))
            .read_to_end(&mut buf)?;
        if buf.len() as u64 > limit {
            return Err(ContentError::TooBig {
                length: declared.max(buf.len() as u64),
                limit,
            });
        }

        let content = Bytes::from(buf);
        Ok(Some(match range {
            Some(range) => slice(&content, range),
            None => content,
        }))
    }
}

impl Container for ZipContainer {
    fn entries(&self) -> BoxFuture<'_, ContentResult<Vec<String>>> {
        Box::pin(async {
            Ok(self
                .archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect())
        })
    }

    fn contains<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<bool>> {
        Box::pin(async move { Ok(self.archive.index_for_name(path).is_some()) })
    }

    fn entry_length<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<Option<u64>>> {
        Box::pin(async move {
            let mut archive = self.archive.clone();
            let length: ContentResult<Option<u64>> = match archive.by_name(path) {
                Ok(file) => Ok(Some(file.size())),
                Err(ZipError::FileNotFound) => Ok(None),
                Err(err) => Err(err.into()),
            };
            length
        })
    }

    fn read_entry<'a>(
        &'a self,
        path: &'a str,
        range: Option<Range<u64>>,
    ) -> BoxFuture<'a, ContentResult<Option<Bytes>>> {
        Box::pin(async move { self.read_file(path, range) })
    }

    fn archive_media_type(&self) -> Option<MediaType> {
        Some(MediaType::ZIP)
    }
}

/// An exploded archive: a directory whose files are the entries.
#[derive(Debug, Clone)]
pub struct DirectoryContainer {
    root: PathBuf,
}

impl DirectoryContainer {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem path of an entry. Paths escaping the root are rejected.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        safe.then(|| self.root.join(relative))
    }

    async fn walk(&self) -> ContentResult<Vec<String>> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let name: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect();
                    entries.push(name.join("/"));
                }
            }
        }

        entries.sort();
        Ok(entries)
    }
}

impl Container for DirectoryContainer {
    fn entries(&self) -> BoxFuture<'_, ContentResult<Vec<String>>> {
        Box::pin(self.walk())
    }

    fn contains<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<bool>> {
        Box::pin(async move {
            let Some(file) = self.resolve(path) else {
                return Ok(false);
            };
            match tokio::fs::metadata(file).await {
                Ok(metadata) => Ok(metadata.is_file()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn entry_length<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ContentResult<Option<u64>>> {
        Box::pin(async move {
            let Some(file) = self.resolve(path) else {
                return Ok(None);
            };
            match tokio::fs::metadata(file).await {
                Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
                Ok(_) => Ok(None),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn read_entry<'a>(
        &'a self,
        path: &'a str,
        range: Option<Range<u64>>,
    ) -> BoxFuture<'a, ContentResult<Option<Bytes>>> {
        Box::pin(async move {
            let Some(file) = self.resolve(path) else {
                return Ok(None);
            };
            match tokio::fs::read(file).await {
                Ok(content) => {
                    let content = Bytes::from(content);
                    Ok(Some(match range {
                        Some(range) => slice(&content, range),
                        None => content,
                    }))
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
    }
}
