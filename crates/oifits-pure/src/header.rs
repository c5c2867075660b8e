//! FITS header card layer: 80-byte keyword records, header block scanning
//! and serialization.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::block::{pad_header, BLOCK_SIZE, CARD_SIZE};
use crate::error::{Error, Result};
use crate::value::{format_value, parse_value, Value};

/// A single 80-byte header card: keyword, optional value, optional comment.
///
/// Unrecognized cards are carried verbatim through load and save so a file
/// round-trips even when it contains keywords this crate knows nothing about.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Keyword name, space-padded to 8 bytes.
    pub keyword: [u8; 8],
    pub value: Option<Value>,
    pub comment: Option<String>,
}

/// Builds a space-padded 8-byte keyword from a byte-string literal.
///
/// # Panics
///
/// Panics at compile time (const context) if `name` is longer than 8 bytes.
pub const fn kw(name: &[u8]) -> [u8; 8] {
    assert!(name.len() <= 8, "keyword longer than 8 bytes");
    let mut k = [b' '; 8];
    let mut i = 0;
    while i < name.len() {
        k[i] = name[i];
        i += 1;
    }
    k
}

impl Card {
    /// Creates a card with a value and no comment.
    pub fn new(keyword: &str, value: Value) -> Self {
        Card {
            keyword: keyword_bytes(keyword),
            value: Some(value),
            comment: None,
        }
    }

    /// Creates a card with a value and an inline comment.
    pub fn with_comment(keyword: &str, value: Value, comment: &str) -> Self {
        Card {
            keyword: keyword_bytes(keyword),
            value: Some(value),
            comment: Some(String::from(comment)),
        }
    }

    /// The keyword as a trimmed string.
    pub fn keyword_str(&self) -> &str {
        // keyword bytes are validated ASCII on parse
        core::str::from_utf8(&self.keyword)
            .unwrap_or("")
            .trim_end_matches(' ')
    }

    pub fn is_end(&self) -> bool {
        self.keyword == kw(b"END")
    }

    pub fn is_blank(&self) -> bool {
        self.keyword == kw(b"") && self.value.is_none() && self.comment.is_none()
    }

    /// COMMENT and HISTORY cards carry free text, never a value.
    pub fn is_commentary(&self) -> bool {
        self.keyword == kw(b"COMMENT") || self.keyword == kw(b"HISTORY")
    }
}

/// Space-pads a keyword name into its 8-byte on-disk form (runtime variant
/// of [`kw`], truncating instead of panicking).
pub fn keyword_bytes(name: &str) -> [u8; 8] {
    let mut k = [b' '; 8];
    let bytes = name.as_bytes();
    let len = bytes.len().min(8);
    k[..len].copy_from_slice(&bytes[..len]);
    k
}

/// Parses one 80-byte card.
///
/// Keyword bytes must be ASCII uppercase, digits, `-`, `_` or space, else
/// [`Error::InvalidKeyword`]. Cards without the `= ` value indicator are
/// treated as commentary/blank cards with the raw text kept as the comment.
pub fn parse_card(bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&bytes[..8]);
    for &b in &keyword {
        let ok = b.is_ascii_uppercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b' ');
        if !ok {
            return Err(Error::InvalidKeyword);
        }
    }

    let has_value = bytes[8] == b'=' && bytes[9] == b' ';
    if !has_value {
        let text = core::str::from_utf8(&bytes[8..])
            .map_err(|_| Error::InvalidValue)?
            .trim();
        return Ok(Card {
            keyword,
            value: None,
            comment: if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            },
        });
    }

    match parse_value(&bytes[10..]) {
        Some((value, comment)) => Ok(Card {
            keyword,
            value: Some(value),
            comment: comment.map(String::from),
        }),
        None => Ok(Card {
            keyword,
            value: None,
            comment: None,
        }),
    }
}

/// Scans whole blocks from the start of `src` until the END card.
///
/// Returns the parsed cards (END excluded) and the padded byte length of the
/// header segment. Fails with [`Error::UnexpectedEof`] when the data runs out
/// before END.
pub fn parse_header(src: &[u8]) -> Result<(Vec<Card>, usize)> {
    if src.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut cards = Vec::new();
    let mut offset = 0;
    loop {
        if offset + BLOCK_SIZE > src.len() {
            return Err(Error::UnexpectedEof);
        }
        let block = &src[offset..offset + BLOCK_SIZE];
        offset += BLOCK_SIZE;

        for raw in block.chunks_exact(CARD_SIZE) {
            let mut card_bytes = [0u8; CARD_SIZE];
            card_bytes.copy_from_slice(raw);
            let card = parse_card(&card_bytes)?;
            if card.is_end() {
                return Ok((cards, offset));
            }
            if !card.is_blank() {
                cards.push(card);
            }
        }
    }
}

/// Formats one card into its 80-byte on-disk form.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..8].copy_from_slice(&card.keyword);

    match &card.value {
        Some(value) => {
            buf[8] = b'=';
            let field = format_value(value);
            buf[10..].copy_from_slice(&field);
            if let Some(comment) = &card.comment {
                append_comment(&mut buf, comment);
            }
        }
        None => {
            if let Some(comment) = &card.comment {
                let bytes = comment.as_bytes();
                let len = bytes.len().min(CARD_SIZE - 8);
                buf[8..8 + len].copy_from_slice(&bytes[..len]);
            }
        }
    }
    buf
}

/// Appends ` / comment` after the last non-space byte of the value field.
fn append_comment(buf: &mut [u8; CARD_SIZE], comment: &str) {
    let mut end = CARD_SIZE;
    while end > 10 && buf[end - 1] == b' ' {
        end -= 1;
    }
    // Need room for " / " plus at least one comment byte.
    if end + 4 > CARD_SIZE {
        return;
    }
    buf[end] = b' ';
    buf[end + 1] = b'/';
    buf[end + 2] = b' ';
    let start = end + 3;
    let avail = CARD_SIZE - start;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(avail);
    buf[start..start + len].copy_from_slice(&bytes[..len]);
}

/// Serializes cards into a complete header segment: each card, then END,
/// then space padding to the block boundary.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let mut buf = Vec::with_capacity((cards.len() + 1) * CARD_SIZE);
    for card in cards {
        buf.extend_from_slice(&format_card(card));
    }
    let mut end = [b' '; CARD_SIZE];
    end[..3].copy_from_slice(b"END");
    buf.extend_from_slice(&end);
    pad_header(&mut buf);
    buf
}

// ---- typed lookups over card slices ----

/// Finds a card by keyword name.
pub fn find_card<'a>(cards: &'a [Card], name: &str) -> Option<&'a Card> {
    let key = keyword_bytes(name);
    cards.iter().find(|c| c.keyword == key)
}

pub fn card_string(cards: &[Card], name: &str) -> Option<String> {
    match find_card(cards, name)?.value.as_ref()? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn card_integer(cards: &[Card], name: &str) -> Option<i64> {
    match find_card(cards, name)?.value.as_ref()? {
        Value::Integer(n) => Some(*n),
        _ => None,
    }
}

/// Numeric lookup accepting either float or integer storage.
pub fn card_float(cards: &[Card], name: &str) -> Option<f64> {
    match find_card(cards, name)?.value.as_ref()? {
        Value::Float(f) => Some(*f),
        Value::Integer(n) => Some(*n as f64),
        _ => None,
    }
}

pub fn card_logical(cards: &[Card], name: &str) -> Option<bool> {
    match find_card(cards, name)?.value.as_ref()? {
        Value::Logical(b) => Some(*b),
        _ => None,
    }
}


#[cfg(test)]
mod write_tests {
    use super::*;

    #[test]
    fn format_card_layout() {
        let card = Card::new("NAXIS2", Value::Integer(12));
        let buf = format_card(&card);
        assert_eq!(&buf[..8], b"NAXIS2  ");
        assert_eq!(buf[8], b'=');
        assert_eq!(buf[9], b' ');
        let text = core::str::from_utf8(&buf).unwrap();
        assert_eq!(text.trim_end(), "NAXIS2  =                   12");
    }

    #[test]
    fn format_card_with_comment() {
        let card = Card::with_comment("OI_REVN", Value::Integer(2), "table revision");
        let text_buf = format_card(&card);
        let text = core::str::from_utf8(&text_buf).unwrap();
        assert!(text.contains("/ table revision"), "{text}");
    }

    #[test]
    fn serialize_header_appends_end_and_pads() {
        let cards = [Card::new("SIMPLE", Value::Logical(true))];
        let buf = serialize_header(&cards);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert_eq!(&buf[80..83], b"END");
        assert!(buf[160..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn header_round_trip() {
        let cards = alloc::vec![
            Card::new("XTENSION", Value::String(String::from("BINTABLE"))),
            Card::new("NAXIS1", Value::Integer(42)),
            Card::with_comment("ARRNAME", Value::String(String::from("VLTI")), "array name"),
            Card::new("EQUINOX", Value::Float(2000.0)),
        ];
        let buf = serialize_header(&cards);
        let (parsed, _) = parse_header(&buf).unwrap();
        assert_eq!(parsed.len(), cards.len());
        for (a, b) in parsed.iter().zip(cards.iter()) {
            assert_eq!(a.keyword, b.keyword);
            assert_eq!(a.value, b.value);
        }
    }
}
