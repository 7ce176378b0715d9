//! Concrete [`Resource`] implementations: in-memory bytes, local files and
//! HTTP(S) URLs.

use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::OnceCell;
use url::Url;

use crate::content::{slice, Resource};
use crate::error::{ContentError, ContentResult};
use crate::hints::Hints;

/// A resource held in memory.
#[derive(Debug, Clone)]
pub struct BytesResource {
    data: Bytes,
}

impl BytesResource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl Resource for BytesResource {
    fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
        Box::pin(async { Ok(Some(self.data.len() as u64)) })
    }

    fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
        Box::pin(async move {
            Ok(match range {
                Some(range) => slice(&self.data, range),
                None => self.data.clone(),
            })
        })
    }
}

/// A file on the local filesystem, opened on each read.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_range(&self, range: Range<u64>) -> ContentResult<Bytes> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(range.start)).await?;

        let mut buf = Vec::new();
        file.take(range.end.saturating_sub(range.start))
            .read_to_end(&mut buf)
            .await?;
        Ok(Bytes::from(buf))
    }
}

impl Resource for FileResource {
    fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
        Box::pin(async {
            let metadata = tokio::fs::metadata(&self.path).await?;
            Ok(Some(metadata.len()))
        })
    }

    fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
        Box::pin(async move {
            match range {
                Some(range) => self.read_range(range).await,
                None => Ok(Bytes::from(tokio::fs::read(&self.path).await?)),
            }
        })
    }
}

/// A remote resource fetched over HTTP(S).
///
/// The length comes from a `HEAD` request made once. Range reads use the
/// `Range` header. When a server ignores it, the body is streamed and the
/// transfer stops at the end of the range.
#[derive(Debug)]
pub struct HttpResource {
    client: reqwest::Client,
    url: Url,
    headers: OnceCell<HeaderMap>,
}

impl HttpResource {
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self {
            client,
            url,
            headers: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Response headers of a `HEAD` request. Servers refusing the method
    /// yield an empty map.
    pub async fn headers(&self) -> ContentResult<&HeaderMap> {
        self.headers
            .get_or_try_init(|| async {
                let response = self.client.head(self.url.clone()).send().await?;
                if matches!(
                    response.status(),
                    StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
                ) {
                    tracing::debug!(url = %self.url, "HEAD not supported");
                    return Ok(HeaderMap::new());
                }
                Ok::<_, ContentError>(response.error_for_status()?.headers().clone())
            })
            .await
    }

    /// Hints from the URL path and the response headers.
    pub async fn hints(&self) -> ContentResult<Hints> {
        let headers = self.headers().await?;
        Ok(Hints::from_http_headers(headers).merge(Hints::from_url(&self.url)))
    }

    async fn get(&self, range: Option<Range<u64>>) -> ContentResult<Bytes> {
        let mut request = self.client.get(self.url.clone());
        if let Some(range) = &range {
            if range.start >= range.end {
                return Ok(Bytes::new());
            }
            request = request.header(RANGE, format!("bytes={}-{}", range.start, range.end - 1));
        }

        let response = request.send().await?.error_for_status()?;
        // Bounds of the requested bytes within the body that is sent back.
        let window = match range {
            Some(range) if response.status() == StatusCode::PARTIAL_CONTENT => {
                0..range.end - range.start
            }
            Some(range) => range,
            None => 0..u64::MAX,
        };

        let mut body = BytesMut::new();
        let stream = response.bytes_stream();
        tokio::pin!(stream);
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
            if body.len() as u64 >= window.end {
                break;
            }
        }
        Ok(slice(&body.freeze(), window))
    }
}

impl Resource for HttpResource {
    fn length(&self) -> BoxFuture<'_, ContentResult<Option<u64>>> {
        Box::pin(async {
            let headers = self.headers().await?;
            Ok(headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok()))
        })
    }

    fn read(&self, range: Option<Range<u64>>) -> BoxFuture<'_, ContentResult<Bytes>> {
        Box::pin(self.get(range))
    }
}
