//! Byte-level concerns of the legacy exports: character encoding and
//! field delimiter are both undocumented and vary per file.

/// Decode raw CSV bytes. UTF-8 is tried first; anything that fails strict
/// UTF-8 validation is treated as the legacy system's Western single-byte
/// codepage.
pub fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8"),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (decoded.into_owned(), "windows-1252")
        }
    }
}

/// Pick the field delimiter by majority vote over the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        let (text, encoding) = decode_bytes("naam;prijs\u{00e9}".as_bytes());
        assert_eq!(encoding, "utf-8");
        assert!(text.ends_with('\u{00e9}'));
    }

    #[test]
    fn invalid_utf8_falls_back_to_windows_1252() {
        // 0xE9 is "é" in windows-1252 but invalid as a lone UTF-8 byte.
        let (text, encoding) = decode_bytes(&[b'c', b'a', b'f', 0xE9]);
        assert_eq!(encoding, "windows-1252");
        assert_eq!(text, "caf\u{00e9}");
    }

    #[test]
    fn delimiter_majority_wins() {
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a;b,c,d"), b',');
        assert_eq!(detect_delimiter("single"), b',');
    }
}
