//! Full pipeline integration tests: local files, directories and HTTP.

use std::io::{Cursor, Write};

use bytes::Bytes;
use publication_sniffer::resource::HttpResource;
use publication_sniffer::{
    ContentError, FormatRegistry, MediaType, MediaTypeRetriever, Resource, SnifferError,
};
use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn epub() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("mimetype", options).unwrap();
    writer.write_all(b"application/epub+zip").unwrap();
    writer.start_file("OEBPS/content.opf", options).unwrap();
    writer.write_all(b"<package/>").unwrap();
    writer.finish().unwrap().into_inner()
}

/// A file without a telling extension is sniffed from its entries.
#[tokio::test]
async fn test_epub_file_without_extension() {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&epub()).unwrap();
    tmp.flush().unwrap();

    let retriever = MediaTypeRetriever::new();
    let media_type = retriever.retrieve_path(tmp.path()).await.unwrap();
    assert_eq!(media_type, MediaType::EPUB);
}

/// The extension of the file name is trusted without reading the file.
#[tokio::test]
async fn test_file_extension_hint() {
    let tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();

    let retriever = MediaTypeRetriever::new();
    let media_type = retriever.retrieve_path(tmp.path()).await.unwrap();
    assert_eq!(media_type, MediaType::PDF);
}

#[tokio::test]
async fn test_exploded_webpub_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("manifest.json"),
        r#"{
            "metadata": {"title": "Alice"},
            "links": [{"rel": "self", "href": "manifest.json", "type": "application/webpub+json"}],
            "readingOrder": [{"href": "chapter1.html", "type": "text/html"}]
        }"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("chapter1.html"), "<html></html>").unwrap();

    let retriever = MediaTypeRetriever::new();
    let media_type = retriever.retrieve_path(dir.path()).await.unwrap();
    assert_eq!(media_type, MediaType::READIUM_WEBPUB);
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = MediaTypeRetriever::new();
    let result = retriever.retrieve_path(dir.path().join("missing")).await;
    assert!(matches!(
        result,
        Err(SnifferError::Content(ContentError::NotFound(_)))
    ));
}

/// The server sends no useful header, the archive itself must be sniffed.
#[tokio::test]
async fn test_url_sniffed_from_content() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "application/octet-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(epub())
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/download", server.uri())).unwrap();
    let retriever = MediaTypeRetriever::new();
    let media_type = retriever.retrieve_url(&url).await.unwrap();
    assert_eq!(media_type, MediaType::EPUB);
}

#[tokio::test]
async fn test_url_content_disposition_hint() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "content-disposition",
            "attachment; filename=\"issue-42.cbz\"",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/files/42", server.uri())).unwrap();
    let retriever = MediaTypeRetriever::new();
    let media_type = retriever.retrieve_url(&url).await.unwrap();
    assert_eq!(media_type, MediaType::CBZ);
}

#[tokio::test]
async fn test_url_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
    let retriever = MediaTypeRetriever::new();
    let result = retriever.retrieve_url(&url).await;
    assert!(matches!(
        result,
        Err(SnifferError::Content(ContentError::NotFound(_)))
    ));
}

const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n";

/// A `206` body already is the requested range.
#[tokio::test]
async fn test_partial_content_is_not_sliced_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("range", "bytes=4-7"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(&PDF[4..8]))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/book.pdf", server.uri())).unwrap();
    let resource = HttpResource::new(url);
    assert_eq!(
        resource.read(Some(4..8)).await.unwrap(),
        Bytes::from_static(b"-1.7")
    );
}

/// A server ignoring `Range` sends the whole body, only the range is kept.
#[tokio::test]
async fn test_range_ignored_by_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/book.pdf", server.uri())).unwrap();
    let resource = HttpResource::new(url);
    assert_eq!(
        resource.read(Some(4..8)).await.unwrap(),
        Bytes::from_static(b"-1.7")
    );
    assert_eq!(resource.read(None).await.unwrap(), Bytes::from_static(PDF));
}

/// Servers refusing `HEAD` give no hints, the content is still sniffed.
#[tokio::test]
async fn test_head_not_supported() {
    for status in [405u16, 501] {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/download", server.uri())).unwrap();
        let resource = HttpResource::new(url.clone());
        assert!(resource.hints().await.unwrap().is_empty());
        assert_eq!(resource.length().await.unwrap(), None);

        let retriever = MediaTypeRetriever::new();
        let media_type = retriever.retrieve_url(&url).await.unwrap();
        assert_eq!(media_type, MediaType::PDF, "HEAD answered {status}");
    }
}

#[tokio::test]
async fn test_head_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/private.epub", server.uri())).unwrap();
    let result = MediaTypeRetriever::new().retrieve_url(&url).await;
    assert!(matches!(
        result,
        Err(SnifferError::Content(ContentError::Forbidden(_)))
    ));
}

#[tokio::test]
async fn test_get_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/download", server.uri())).unwrap();
    let result = MediaTypeRetriever::new().retrieve_url(&url).await;
    assert!(matches!(
        result,
        Err(SnifferError::Content(ContentError::Forbidden(_)))
    ));
}

/// Retrieval then format lookup, the way a bookshelf labels an import.
#[tokio::test]
async fn test_retrieve_then_describe() {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&epub()).unwrap();
    tmp.flush().unwrap();

    let retriever = MediaTypeRetriever::new();
    let registry = FormatRegistry::default();

    let media_type = retriever.retrieve_path(tmp.path()).await.unwrap();
    let format = registry.retrieve(&media_type).unwrap();
    assert_eq!(format.name, "EPUB");
    assert_eq!(format.file_extension, "epub");
}
