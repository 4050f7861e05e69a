//! Inline `data:,` content references.
//!
//! Ignition fetches file contents from a URL. Embedding the (percent-escaped)
//! text directly in a `data:` URL keeps the descriptor self-contained: no media
//! type, no `;base64`, just `data:,<escaped>`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};

const DATA_URL_PREFIX: &str = "data:,";

/// Path-segment escaping: unreserved characters plus the sub-delimiters that
/// are legal inside a segment stay literal. `/ ; , ?` and everything else are
/// escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

pub fn encode_data_url(contents: impl AsRef<[u8]>) -> String {
    let escaped = percent_encode(contents.as_ref(), SEGMENT);
    format!("{DATA_URL_PREFIX}{escaped}")
}

/// Inverse of [`encode_data_url`]. Returns `None` when `url` is not a bare
/// `data:,` URL, contains a malformed escape, or does not decode to UTF-8.
pub fn decode_data_url(url: &str) -> Option<String> {
    let payload = url.strip_prefix(DATA_URL_PREFIX)?;
    let bytes = payload.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
        }
    }
    percent_decode_str(payload)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(encode_data_url("abc"), "data:,abc");
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode_data_url(""), "data:,");
        assert_eq!(decode_data_url("data:,").as_deref(), Some(""));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(encode_data_url("a b"), "data:,a%20b");
        assert_eq!(encode_data_url("x\n"), "data:,x%0A");
        assert_eq!(encode_data_url("/etc/chrony.d"), "data:,%2Fetc%2Fchrony.d");
        assert_eq!(encode_data_url("a,b;c?d"), "data:,a%2Cb%3Bc%3Fd");
        assert_eq!(encode_data_url("\"q\""), "data:,%22q%22");
    }

    #[test]
    fn segment_safe_characters_stay_literal() {
        assert_eq!(encode_data_url("k=v:x@y&z+$~_-."), "data:,k=v:x@y&z+$~_-.");
    }

    #[test]
    fn multibyte_utf8_is_escaped_per_byte() {
        assert_eq!(encode_data_url("é"), "data:,%C3%A9");
    }

    #[test]
    fn round_trips_printable_ascii_and_utf8() {
        let printable: String = (0x20u8..0x7f).map(char::from).collect();
        for text in [
            printable.as_str(),
            "[Service]\nDelegate=memory pids cpu io\n",
            "unqualified-search-registries=[\"docker.io\"]\n",
            "Zürich → 東京 ✓",
            "100% done",
        ] {
            let url = encode_data_url(text);
            assert!(url.starts_with("data:,"));
            assert_eq!(decode_data_url(&url).as_deref(), Some(text), "{text:?}");
        }
    }

    #[test]
    fn decode_rejects_foreign_urls() {
        assert_eq!(decode_data_url("https://example.com/x"), None);
        assert_eq!(decode_data_url("data:text/plain;base64,YWJj"), None);
    }

    #[test]
    fn decode_rejects_malformed_escapes() {
        assert_eq!(decode_data_url("data:,abc%2"), None);
        assert_eq!(decode_data_url("data:,%zz"), None);
        assert_eq!(decode_data_url("data:,%FF"), None);
    }
}
