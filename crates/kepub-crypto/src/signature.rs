//! Plaintext signature check used to accept or reject a candidate key.
//!
//! A wrong key still "decrypts" to something under ECB, so the only signal
//! is whether the result looks like a book part. The markers are searched
//! anywhere inside a short leading window, which tolerates BOMs and leading
//! whitespace before the XML declaration or the `<html` tag.

/// Bytes scanned for the text markers
pub const TEXT_WINDOW: usize = 100;

/// Bytes scanned for the JPEG start-of-image marker
pub const BINARY_WINDOW: usize = 10;

const XML_DECL: &[u8] = b"<?xml";
const HTML_TAG: &[u8] = b"<html";
const JPEG_SOI: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Recognized plaintext kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Xml,
    Html,
    Jpeg,
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Jpeg => "jpeg",
        })
    }
}

/// Return the signature found at the start of `plaintext`, if any.
pub fn detect_signature(plaintext: &[u8]) -> Option<Signature> {
    let text = &plaintext[..plaintext.len().min(TEXT_WINDOW)];
    if contains(text, XML_DECL) {
        return Some(Signature::Xml);
    }
    if contains(text, HTML_TAG) {
        return Some(Signature::Html);
    }
    let binary = &plaintext[..plaintext.len().min(BINARY_WINDOW)];
    if contains(binary, JPEG_SOI) {
        return Some(Signature::Jpeg);
    }
    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_declaration() {
        assert_eq!(
            detect_signature(b"<?xml version=\"1.0\" encoding=\"utf-8\"?>"),
            Some(Signature::Xml)
        );
    }

    #[test]
    fn test_html_after_bom_and_whitespace() {
        let mut buf = vec![0xEF, 0xBB, 0xBF, b'\n', b' '];
        buf.extend_from_slice(b"<html xmlns=\"http://www.w3.org/1999/xhtml\">");
        assert_eq!(detect_signature(&buf), Some(Signature::Html));
    }

    #[test]
    fn test_jpeg_marker() {
        assert_eq!(
            detect_signature(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']),
            Some(Signature::Jpeg)
        );
    }

    #[test]
    fn test_marker_outside_window_is_ignored() {
        let mut buf = vec![b' '; TEXT_WINDOW];
        buf.extend_from_slice(b"<html>");
        assert_eq!(detect_signature(&buf), None);

        let mut jpeg = vec![0u8; BINARY_WINDOW];
        jpeg.extend_from_slice(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(detect_signature(&jpeg), None);
    }

    #[test]
    fn test_marker_straddling_window_end_is_ignored() {
        let mut buf = vec![b' '; TEXT_WINDOW - 2];
        buf.extend_from_slice(b"<?xml");
        assert_eq!(detect_signature(&buf), None);
    }

    #[test]
    fn test_garbage_and_short_input() {
        assert_eq!(detect_signature(&[0x13, 0x37, 0x00, 0x42]), None);
        assert_eq!(detect_signature(b""), None);
        assert_eq!(detect_signature(b"<ht"), None);
    }
}
