//! File name extraction from `Content-Disposition` headers.
//!
//! Servers often deliver publications from opaque URLs (`/download?id=42`),
//! and the only file extension available is the one of the file name they
//! suggest in this header (RFC 6266).

/// Returns the file name suggested by a `Content-Disposition` header value.
///
/// Supports forms like:
/// - `attachment; filename="book.epub"`
/// - `inline; filename=book.epub`
/// - `attachment; filename*=UTF-8''my%20book.epub` (RFC 5987)
///
/// The extended `filename*` parameter wins over `filename` when both are
/// present, whatever their order.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for (name, value) in header.split(';').skip(1).filter_map(parameter) {
        if name.eq_ignore_ascii_case("filename*") {
            extended = decode_extended_value(value);
        } else if name.eq_ignore_ascii_case("filename") {
            plain = Some(unquote(value).to_string());
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

fn parameter(fragment: &str) -> Option<(&str, &str)> {
    let (name, value) = fragment.split_once('=')?;
    Some((name.trim(), value.trim()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Decodes an RFC 5987 `charset'language'percent-encoded` value. Only the
/// UTF-8 and ISO-8859-1 charsets are required by the RFC.
fn decode_extended_value(value: &str) -> Option<String> {
    let mut parts = unquote(value).splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let bytes = percent_decode(encoded);
    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes())?;
    let (decoded, _, _) = encoding.decode(&bytes);
    Some(decoded.into_owned())
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}
