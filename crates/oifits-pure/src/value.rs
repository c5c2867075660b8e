use alloc::format;
use alloc::string::String;
use alloc::string::ToString;
use core::str;

/// A parsed FITS header value.
///
/// OIFits headers only ever carry logical, integer, floating-point and
/// character-string keywords, so those are the four shapes modelled here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
}

impl Value {
    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Logical(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }
}

/// Locates the ` /` comment separator in a non-string value field.
///
/// The standard writes ` / ` but files produced by IDL and friends omit the
/// trailing space, so only the leading space and slash are required.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    let len = field.len();
    for i in 0..len.saturating_sub(1) {
        if field[i] == b' ' && field[i + 1] == b'/' {
            let mut start = i + 2;
            if start < len && field[start] == b' ' {
                start += 1;
            }
            let comment = str::from_utf8(&field[start..])
                .ok()
                .map(str::trim_end)
                .filter(|s| !s.is_empty());
            return (&field[..i], comment);
        }
    }
    (field, None)
}

/// Parses a quoted string value. Doubled quotes inside the content stand for
/// a literal quote; trailing spaces inside the quotes are padding and get
/// trimmed. Unterminated strings are accepted leniently.
fn parse_string(field: &[u8]) -> Option<(Value, Option<&str>)> {
    debug_assert_eq!(field.first(), Some(&b'\''));

    let mut content = String::new();
    let mut i = 1;
    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                content.push('\'');
                i += 2;
            } else {
                i += 1;
                break;
            }
        } else {
            content.push(field[i] as char);
            i += 1;
        }
    }

    let (_, comment) = split_comment(&field[i..]);
    Some((Value::String(content.trim_end().to_string()), comment))
}

/// Parses a float, accepting the FITS `D` exponent marker.
fn parse_float_text(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse::<f64>().ok()
}

/// Parses a FITS header value from the 70-byte value portion of a card
/// (bytes 10..80). Returns the value and the optional inline comment.
pub fn parse_value(value_bytes: &[u8]) -> Option<(Value, Option<&str>)> {
    if value_bytes.is_empty() {
        return None;
    }

    if value_bytes[0] == b'\'' {
        return parse_string(value_bytes);
    }

    let (val_part, comment) = split_comment(value_bytes);
    let text = str::from_utf8(val_part).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    match text {
        "T" => return Some((Value::Logical(true), comment)),
        "F" => return Some((Value::Logical(false), comment)),
        _ => {}
    }

    let looks_integral = !text
        .bytes()
        .any(|b| matches!(b, b'.' | b'E' | b'e' | b'D' | b'd'));
    if looks_integral {
        if let Ok(n) = text.parse::<i64>() {
            return Some((Value::Integer(n), comment));
        }
    }

    parse_float_text(text).map(|f| (Value::Float(f), comment))
}

/// Serializes a [`Value`] into the 70-byte field of an 80-byte card.
///
/// Numerics and logicals are right-justified in the first 20 bytes (card
/// columns 11-30); strings open with a quote at byte 0 and pad the content
/// to at least 8 characters.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(format!("{n}").as_bytes(), &mut buf[..20]);
        }
        Value::Float(f) => {
            right_justify(format_float(*f).as_bytes(), &mut buf[..20]);
        }
        Value::String(s) => {
            write_quoted(s, &mut buf);
        }
    }

    buf
}

fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

/// Formats a float in `E` notation, shrinking the precision until it fits in
/// 20 columns.
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let mut precision = 15usize;
    loop {
        let s = format!("{f:.precision$E}");
        if s.len() <= 20 || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

fn write_quoted(s: &str, buf: &mut [u8; 70]) {
    let mut pos = 0;
    buf[pos] = b'\'';
    pos += 1;

    for b in s.bytes() {
        if b == b'\'' {
            if pos + 1 >= 69 {
                break;
            }
            buf[pos] = b'\'';
            buf[pos + 1] = b'\'';
            pos += 2;
        } else {
            if pos >= 69 {
                break;
            }
            buf[pos] = b;
            pos += 1;
        }
    }

    // Minimum 8 characters between the quotes.
    while pos < 9 {
        buf[pos] = b' ';
        pos += 1;
    }
    if pos < 70 {
        buf[pos] = b'\'';
    }
}
