//! Incremental UTF-8 decoding for chunked response bodies
//!
//! A chunk boundary can land in the middle of a multi-byte character. The
//! decoder holds the incomplete tail back until the next chunk arrives instead
//! of emitting replacement characters for both halves.

const REPLACEMENT: char = '\u{FFFD}';

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, carrying any incomplete trailing sequence over
    /// to the following call. Invalid sequences decode to U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is well-formed
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush at end of data. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"woof"), "woof");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character() {
        // "🐶" is F0 9F 90 B6
        let dog = "🐶".as_bytes();
        let mut decoder = Utf8Decoder::new();

        assert_eq!(decoder.decode(&[b'a', dog[0], dog[1]]), "a");
        assert_eq!(decoder.decode(&[dog[2], dog[3], b'b']), "🐶b");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_one_byte_at_a_time() {
        let text = "héllo wörld 🐾";
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for byte in text.as_bytes() {
            out.push_str(&decoder.decode(&[*byte]));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, text);
    }

    #[test]
    fn test_invalid_byte_is_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_dangling_tail_at_finish() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
