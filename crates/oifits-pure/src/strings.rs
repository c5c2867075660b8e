//! Fixed-width string codec for FITS character columns.
//!
//! FITS `A`-type table cells are fixed-width byte slots carrying printable
//! ASCII (0x20-0x7E). On read, a NUL byte terminates the slot content and any
//! out-of-range byte before it is replaced with a space; the surviving span
//! is trimmed of leading and trailing spaces. On write, strings are clamped
//! to the legal range, truncated to the slot width and space-padded, so the
//! write direction is lossy for non-ASCII input.

use alloc::string::String;
use alloc::vec::Vec;

/// First byte of the FITS-legal printable range (space).
const TEXT_LO: u8 = 0x20;
/// Last byte of the FITS-legal printable range (`~`).
const TEXT_HI: u8 = 0x7E;

/// Returns true if every character of `s` lies in the FITS-legal printable
/// ASCII range 0x20-0x7E inclusive.
pub fn is_fits_text(s: &str) -> bool {
    s.bytes().all(|b| (TEXT_LO..=TEXT_HI).contains(&b))
}

/// Encodes `strings` into a flat buffer of `strings.len() * width` bytes.
///
/// Each string is truncated to `width` bytes, bytes outside the printable
/// range are replaced with spaces, and the remainder of the slot is
/// space-padded.
pub fn encode_fixed<S: AsRef<str>>(strings: &[S], width: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(strings.len() * width);
    for s in strings {
        let bytes = s.as_ref().as_bytes();
        for i in 0..width {
            match bytes.get(i) {
                Some(&b) if (TEXT_LO..=TEXT_HI).contains(&b) => buf.push(b),
                Some(_) => buf.push(b' '),
                None => buf.push(b' '),
            }
        }
    }
    buf
}

/// Decodes a flat buffer of `width`-byte slots into strings.
///
/// Within each slot, the first NUL byte ends the content (bytes after it are
/// discarded), out-of-range bytes become spaces, and leading/trailing spaces
/// are trimmed. A slot that starts with NUL or holds only spaces yields the
/// empty string.
///
/// # Panics
///
/// Panics if `width == 0` or `bytes.len()` is not a multiple of `width`.
pub fn decode_fixed(bytes: &[u8], width: usize) -> Vec<String> {
    assert!(width > 0, "slot width must be non-zero");
    assert!(
        bytes.len() % width == 0,
        "buffer length must be a multiple of the slot width"
    );

    let mut out = Vec::with_capacity(bytes.len() / width);
    for slot in bytes.chunks_exact(width) {
        let content_len = slot.iter().position(|&b| b == 0).unwrap_or(width);
        let mut s = String::with_capacity(content_len);
        for &b in &slot[..content_len] {
            if (TEXT_LO..=TEXT_HI).contains(&b) {
                s.push(b as char);
            } else {
                s.push(' ');
            }
        }
        let trimmed = s.trim();
        out.push(String::from(trimmed));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    // ---- is_fits_text ----

    #[test]
    fn text_range_accepts_printable_ascii() {
        assert!(is_fits_text("HD 1234"));
        assert!(is_fits_text(" ~"));
        assert!(is_fits_text(""));
    }

    #[test]
    fn text_range_rejects_control_and_high_bytes() {
        assert!(!is_fits_text("a\tb"));
        assert!(!is_fits_text("line\n"));
        assert!(!is_fits_text("caf\u{e9}"));
        assert!(!is_fits_text("\u{7f}"));
    }

    // ---- decode_fixed ----

    #[test]
    fn decode_all_spaces_yields_empty_strings() {
        let bytes = [0x20u8, 0x20, 0x20, 0x20, 0x20, 0x20];
        assert_eq!(decode_fixed(&bytes, 2), vec!["", "", ""]);
    }

    #[test]
    fn decode_nul_terminates_each_slot() {
        let bytes = [0u8, 0, 0x20, 0, 0, 0x20, b'a', 0, 13, 10, 126, 127];
        assert_eq!(decode_fixed(&bytes, 2), vec!["", "", "", "a", "", "~"]);
    }

    #[test]
    fn decode_trims_leading_and_trailing_spaces() {
        let bytes = b"  U1  ";
        assert_eq!(decode_fixed(bytes, 6), vec!["U1"]);
    }

    #[test]
    fn decode_inner_spaces_preserved() {
        let bytes = b"HD 1234 ";
        assert_eq!(decode_fixed(bytes, 8), vec!["HD 1234"]);
    }

    #[test]
    fn decode_replaces_out_of_range_bytes_with_space() {
        // Control byte in the middle becomes a space, then trims away at
        // the edge but survives between words.
        let bytes = [b'A', 9, b'B'];
        assert_eq!(decode_fixed(&bytes, 3), vec!["A B"]);
    }

    #[test]
    fn decode_empty_buffer() {
        let bytes: [u8; 0] = [];
        assert!(decode_fixed(&bytes, 4).is_empty());
    }

    #[test]
    #[should_panic(expected = "multiple of the slot width")]
    fn decode_misaligned_buffer_panics() {
        decode_fixed(&[1, 2, 3], 2);
    }

    #[test]
    #[should_panic(expected = "slot width must be non-zero")]
    fn decode_zero_width_panics() {
        decode_fixed(&[], 0);
    }

    // ---- encode_fixed ----

    #[test]
    fn encode_pads_with_spaces() {
        let buf = encode_fixed(&["AB"], 4);
        assert_eq!(buf, b"AB  ");
    }

    #[test]
    fn encode_truncates_to_width() {
        let buf = encode_fixed(&["ABCDEF"], 4);
        assert_eq!(buf, b"ABCD");
    }

    #[test]
    fn encode_clamps_out_of_range_bytes() {
        let buf = encode_fixed(&["A\tB"], 3);
        assert_eq!(buf, b"A B");
    }

    #[test]
    fn encode_multiple_slots() {
        let buf = encode_fixed(&["S1", "S2"], 3);
        assert_eq!(buf, b"S1 S2 ");
    }

    #[test]
    fn encode_empty_string_is_all_spaces() {
        let buf = encode_fixed(&[""], 5);
        assert_eq!(buf, b"     ");
    }

    // ---- round trip ----

    #[test]
    fn encode_decode_round_trip() {
        let names = ["U1".to_string(), "A0".to_string(), "".to_string()];
        let buf = encode_fixed(&names, 16);
        assert_eq!(buf.len(), 48);
        let back = decode_fixed(&buf, 16);
        assert_eq!(back, names);
    }
}
