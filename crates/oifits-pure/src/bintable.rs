//! FITS BINTABLE codec: TFORM declarations, column specifications and the
//! big-endian row-major cell layout.
//!
//! Only the column types OIFits tables actually use are supported: logical,
//! 16/32-bit integers, single/double floats, single-precision complex and
//! fixed-width ASCII. Complex cells are interleaved (real, imaginary) pairs
//! on disk and `[f32; 2]` pairs in memory.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::block::pad_data;
use crate::error::{Error, Result};
use crate::header::Card;
use crate::strings::{decode_fixed, encode_fixed};
use crate::value::Value;

/// Storage type of one binary table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColType {
    /// `L` — one byte per element, `T`/`F`.
    Logical,
    /// `I` — big-endian `i16`.
    Short,
    /// `J` — big-endian `i32`.
    Int,
    /// `E` — big-endian IEEE `f32`.
    Float,
    /// `D` — big-endian IEEE `f64`.
    Double,
    /// `C` — interleaved (re, im) `f32` pair per element.
    Complex,
    /// `A` — fixed-width ASCII; the repeat count is the slot width.
    Ascii,
}

impl ColType {
    /// On-disk bytes per element.
    pub fn byte_width(self) -> usize {
        match self {
            ColType::Logical | ColType::Ascii => 1,
            ColType::Short => 2,
            ColType::Int | ColType::Float => 4,
            ColType::Double | ColType::Complex => 8,
        }
    }

    /// The TFORM type code letter.
    pub fn code(self) -> char {
        match self {
            ColType::Logical => 'L',
            ColType::Short => 'I',
            ColType::Int => 'J',
            ColType::Float => 'E',
            ColType::Double => 'D',
            ColType::Complex => 'C',
            ColType::Ascii => 'A',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        match c {
            'L' => Some(ColType::Logical),
            'I' => Some(ColType::Short),
            'J' => Some(ColType::Int),
            'E' => Some(ColType::Float),
            'D' => Some(ColType::Double),
            'C' => Some(ColType::Complex),
            'A' => Some(ColType::Ascii),
            _ => None,
        }
    }
}

/// One column of a binary table as declared by TTYPE/TFORM/TUNIT.
#[derive(Debug, Clone, PartialEq)]
pub struct ColSpec {
    pub name: String,
    /// Elements per row (slot width in bytes for ASCII columns).
    pub repeat: usize,
    pub ty: ColType,
    pub unit: Option<String>,
}

impl ColSpec {
    pub fn new(name: &str, repeat: usize, ty: ColType) -> Self {
        ColSpec {
            name: String::from(name),
            repeat,
            ty,
            unit: None,
        }
    }

    pub fn with_unit(name: &str, repeat: usize, ty: ColType, unit: &str) -> Self {
        ColSpec {
            name: String::from(name),
            repeat,
            ty,
            unit: Some(String::from(unit)),
        }
    }

    /// On-disk bytes per row for this column.
    pub fn cell_len(&self) -> usize {
        self.repeat * self.ty.byte_width()
    }
}

/// Parses a TFORM declaration such as `16A`, `2I`, `D` into (repeat, type).
/// A missing repeat count means 1.
pub fn parse_tform(s: &str) -> Result<(usize, ColType)> {
    let text = s.trim();
    let split = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (digits, code) = text.split_at(split);

    let mut chars = code.chars();
    let (type_char, rest) = match chars.next() {
        Some(c) => (c, chars.as_str()),
        None => return Err(Error::InvalidTform(text.to_string())),
    };
    // Anything after the type code (additional dimension qualifiers) is not
    // supported here.
    if !rest.trim().is_empty() {
        return Err(Error::InvalidTform(text.to_string()));
    }

    let repeat = if digits.is_empty() {
        1
    } else {
        digits
            .parse::<usize>()
            .map_err(|_| Error::InvalidTform(text.to_string()))?
    };
    let ty = ColType::from_code(type_char).ok_or_else(|| Error::InvalidTform(text.to_string()))?;
    Ok((repeat, ty))
}

/// Formats a (repeat, type) pair back into its TFORM text.
pub fn format_tform(repeat: usize, ty: ColType) -> String {
    if repeat == 1 && ty != ColType::Ascii {
        ty.code().to_string()
    } else {
        format!("{}{}", repeat, ty.code())
    }
}

/// Total on-disk bytes per row (the NAXIS1 value).
pub fn row_stride(specs: &[ColSpec]) -> usize {
    specs.iter().map(ColSpec::cell_len).sum()
}

/// Typed storage for one column, flat row-major.
///
/// Numeric/logical/complex variants hold `nrows * repeat` elements; `Str`
/// holds one string per row (the slot width lives in the [`ColSpec`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Logical(Vec<bool>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Complex(Vec<[f32; 2]>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn ty(&self) -> ColType {
        match self {
            ColumnData::Logical(_) => ColType::Logical,
            ColumnData::Short(_) => ColType::Short,
            ColumnData::Int(_) => ColType::Int,
            ColumnData::Float(_) => ColType::Float,
            ColumnData::Double(_) => ColType::Double,
            ColumnData::Complex(_) => ColType::Complex,
            ColumnData::Str(_) => ColType::Ascii,
        }
    }

    /// Number of stored elements (rows for `Str`, rows × repeat otherwise).
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Logical(v) => v.len(),
            ColumnData::Short(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Complex(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements expected for `nrows` rows at the given repeat.
    pub fn expected_len(ty: ColType, nrows: usize, repeat: usize) -> usize {
        match ty {
            ColType::Ascii => nrows,
            _ => nrows * repeat,
        }
    }
}

/// Decodes all columns from a row-major data segment.
///
/// `data` must hold at least `row_stride(specs) * nrows` bytes, else
/// [`Error::UnexpectedEof`].
pub fn read_columns(data: &[u8], specs: &[ColSpec], nrows: usize) -> Result<Vec<ColumnData>> {
    let stride = row_stride(specs);
    let needed = stride
        .checked_mul(nrows)
        .ok_or(Error::UnexpectedEof)?;
    if data.len() < needed {
        return Err(Error::UnexpectedEof);
    }

    let mut columns = Vec::with_capacity(specs.len());
    let mut offset = 0usize;
    for spec in specs {
        let cell_len = spec.cell_len();
        let mut cells = Vec::with_capacity(nrows);
        for row in 0..nrows {
            let start = row * stride + offset;
            cells.push(&data[start..start + cell_len]);
        }
        columns.push(decode_column(spec, &cells));
        offset += cell_len;
    }
    Ok(columns)
}

fn decode_column(spec: &ColSpec, cells: &[&[u8]]) -> ColumnData {
    let repeat = spec.repeat;
    match spec.ty {
        ColType::Logical => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(cell.iter().map(|&b| b == b'T'));
            }
            ColumnData::Logical(v)
        }
        ColType::Short => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(
                    cell.chunks_exact(2)
                        .map(|c| i16::from_be_bytes([c[0], c[1]])),
                );
            }
            ColumnData::Short(v)
        }
        ColType::Int => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(
                    cell.chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]])),
                );
            }
            ColumnData::Int(v)
        }
        ColType::Float => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(
                    cell.chunks_exact(4)
                        .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]])),
                );
            }
            ColumnData::Float(v)
        }
        ColType::Double => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(cell.chunks_exact(8).map(|c| {
                    f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                }));
            }
            ColumnData::Double(v)
        }
        ColType::Complex => {
            let mut v = Vec::with_capacity(cells.len() * repeat);
            for cell in cells {
                v.extend(cell.chunks_exact(8).map(|c| {
                    [
                        f32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                        f32::from_be_bytes([c[4], c[5], c[6], c[7]]),
                    ]
                }));
            }
            ColumnData::Complex(v)
        }
        ColType::Ascii => {
            let mut v = Vec::with_capacity(cells.len());
            for cell in cells {
                if repeat == 0 {
                    v.push(String::new());
                } else {
                    v.append(&mut decode_fixed(cell, repeat));
                }
            }
            ColumnData::Str(v)
        }
    }
}

/// Encodes all columns into a block-padded row-major data segment.
///
/// Column types must match the specs and every column must hold exactly the
/// element count implied by `nrows` and its repeat.
pub fn write_columns(specs: &[ColSpec], columns: &[ColumnData], nrows: usize) -> Result<Vec<u8>> {
    if specs.len() != columns.len() {
        return Err(Error::ShapeMismatch {
            name: String::from("TFIELDS"),
            expected: specs.len(),
            actual: columns.len(),
        });
    }
    for (spec, col) in specs.iter().zip(columns) {
        if spec.ty != col.ty() {
            return Err(Error::TypeMismatch {
                name: spec.name.clone(),
                expected: type_label(spec.ty),
            });
        }
        let expected = ColumnData::expected_len(spec.ty, nrows, spec.repeat);
        if col.len() != expected {
            return Err(Error::ShapeMismatch {
                name: spec.name.clone(),
                expected,
                actual: col.len(),
            });
        }
    }

    let stride = row_stride(specs);
    let mut buf = vec![0u8; stride * nrows];
    let mut offset = 0usize;
    for (spec, col) in specs.iter().zip(columns) {
        encode_column(spec, col, &mut buf, stride, offset, nrows);
        offset += spec.cell_len();
    }
    pad_data(&mut buf);
    Ok(buf)
}

fn type_label(ty: ColType) -> &'static str {
    match ty {
        ColType::Logical => "logical",
        ColType::Short => "short",
        ColType::Int => "int",
        ColType::Float => "float",
        ColType::Double => "double",
        ColType::Complex => "complex",
        ColType::Ascii => "string",
    }
}

fn encode_column(
    spec: &ColSpec,
    col: &ColumnData,
    buf: &mut [u8],
    stride: usize,
    offset: usize,
    nrows: usize,
) {
    let repeat = spec.repeat;
    match col {
        ColumnData::Logical(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                for (i, &b) in v[row * repeat..(row + 1) * repeat].iter().enumerate() {
                    cell[i] = if b { b'T' } else { b'F' };
                }
            }
        }
        ColumnData::Short(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                for (i, &x) in v[row * repeat..(row + 1) * repeat].iter().enumerate() {
                    cell[i * 2..i * 2 + 2].copy_from_slice(&x.to_be_bytes());
                }
            }
        }
        ColumnData::Int(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                for (i, &x) in v[row * repeat..(row + 1) * repeat].iter().enumerate() {
                    cell[i * 4..i * 4 + 4].copy_from_slice(&x.to_be_bytes());
                }
            }
        }
        ColumnData::Float(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                for (i, &x) in v[row * repeat..(row + 1) * repeat].iter().enumerate() {
                    cell[i * 4..i * 4 + 4].copy_from_slice(&x.to_be_bytes());
                }
            }
        }
        ColumnData::Double(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                for (i, &x) in v[row * repeat..(row + 1) * repeat].iter().enumerate() {
                    cell[i * 8..i * 8 + 8].copy_from_slice(&x.to_be_bytes());
                }
            }
        }
        ColumnData::Complex(v) => {
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..];
                let pairs = &v[row * repeat..(row + 1) * repeat];
                // Flat (re, im, re, im, ...) view of the row's pairs.
                let flat: &[f32] = bytemuck::cast_slice(pairs);
                for (i, &x) in flat.iter().enumerate() {
                    cell[i * 4..i * 4 + 4].copy_from_slice(&x.to_be_bytes());
                }
            }
        }
        ColumnData::Str(v) => {
            if repeat == 0 {
                return;
            }
            for row in 0..nrows {
                let cell = &mut buf[row * stride + offset..row * stride + offset + repeat];
                let encoded = encode_fixed(&v[row..row + 1], repeat);
                cell.copy_from_slice(&encoded);
            }
        }
    }
}

/// Builds the mandatory header cards of a BINTABLE extension.
pub fn table_cards(extname: &str, specs: &[ColSpec], nrows: usize) -> Vec<Card> {
    let mut cards = Vec::with_capacity(9 + 3 * specs.len());
    cards.push(Card::new(
        "XTENSION",
        Value::String(String::from("BINTABLE")),
    ));
    cards.push(Card::new("BITPIX", Value::Integer(8)));
    cards.push(Card::new("NAXIS", Value::Integer(2)));
    cards.push(Card::new("NAXIS1", Value::Integer(row_stride(specs) as i64)));
    cards.push(Card::new("NAXIS2", Value::Integer(nrows as i64)));
    cards.push(Card::new("PCOUNT", Value::Integer(0)));
    cards.push(Card::new("GCOUNT", Value::Integer(1)));
    cards.push(Card::new("TFIELDS", Value::Integer(specs.len() as i64)));
    for (i, spec) in specs.iter().enumerate() {
        let n = i + 1;
        cards.push(Card::new(
            &format!("TFORM{n}"),
            Value::String(format_tform(spec.repeat, spec.ty)),
        ));
        cards.push(Card::new(
            &format!("TTYPE{n}"),
            Value::String(spec.name.clone()),
        ));
        if let Some(unit) = &spec.unit {
            cards.push(Card::new(
                &format!("TUNIT{n}"),
                Value::String(unit.clone()),
            ));
        }
    }
    cards.push(Card::new("EXTNAME", Value::String(String::from(extname))));
    cards
}
