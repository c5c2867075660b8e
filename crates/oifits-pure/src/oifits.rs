//! The OIFits file container: primary header plus a sequence of typed
//! binary table extensions.
//!
//! Loading accepts plain and gzip-compressed input, recognized by magic
//! bytes. Unix `compress` files are detected and rejected. Extensions with
//! an unrecognized EXTNAME are skipped; unrecognized header cards inside a
//! recognized table are preserved verbatim so a load/save cycle does not
//! lose information.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::bintable::{
    parse_tform, read_columns, row_stride, table_cards, write_columns, ColSpec,
};
use crate::block::padded_len;
use crate::error::{Error, Result};
use crate::header::{
    card_integer, card_string, find_card, parse_header, serialize_header, Card,
};
use crate::table::{OiTable, TableKind};
use crate::value::Value;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const COMPRESS_MAGIC: [u8; 2] = [0x1f, 0x9d];

/// An OIFits file in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct OiFitsFile {
    /// Source path, when the file came from disk.
    pub file_name: Option<String>,
    /// Primary header cards beyond the structural ones (SIMPLE, BITPIX,
    /// NAXIS, EXTEND), kept for round-trip.
    pub primary_cards: Vec<Card>,
    pub tables: Vec<OiTable>,
}

impl OiFitsFile {
    pub fn new() -> Self {
        OiFitsFile {
            file_name: None,
            primary_cards: Vec::new(),
            tables: Vec::new(),
        }
    }

    // ---- lookups ----

    pub fn get(&self, index: usize) -> Option<&OiTable> {
        self.tables.get(index)
    }

    pub fn tables_of_kind(&self, kind: TableKind) -> impl Iterator<Item = &OiTable> {
        self.tables.iter().filter(move |t| t.kind() == kind)
    }

    /// The observable-carrying tables (OI_VIS, OI_VIS2, OI_T3, OI_FLUX).
    pub fn data_tables(&self) -> impl Iterator<Item = &OiTable> {
        self.tables.iter().filter(|t| t.kind().is_data())
    }

    /// The first OI_TARGET table, if any.
    pub fn target_table(&self) -> Option<&OiTable> {
        self.tables.iter().find(|t| t.kind() == TableKind::Target)
    }

    /// The OI_ARRAY table whose ARRNAME matches `name`.
    pub fn array_by_name(&self, name: &str) -> Option<&OiTable> {
        self.tables_of_kind(TableKind::Array)
            .find(|t| t.arrname() == Some(name))
    }

    /// The OI_WAVELENGTH table whose INSNAME matches `name`.
    pub fn wavelength_by_name(&self, name: &str) -> Option<&OiTable> {
        self.tables_of_kind(TableKind::Wavelength)
            .find(|t| t.insname() == Some(name))
    }

    /// Display name used in listings and reports.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("[Undefined]")
    }

    // ---- decoding ----

    /// Parses a file from raw bytes, transparently inflating gzip input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_named(bytes, None)
    }

    /// Like [`from_bytes`](Self::from_bytes), with a file name used both
    /// for compression-suffix fallback and as the stored source name.
    pub fn from_bytes_named(bytes: &[u8], name: Option<&str>) -> Result<Self> {
        let plain = decompress_if_needed(bytes, name)?;
        let mut file = Self::parse(&plain)?;
        file.file_name = name.map(String::from);
        Ok(file)
    }

    fn parse(src: &[u8]) -> Result<Self> {
        let (primary, mut offset) = parse_header(src)?;
        if find_card(&primary, "SIMPLE").is_none() {
            return Err(Error::InvalidHeader);
        }

        // OIFits primary HDUs carry no data, but skip any that is present.
        let bitpix = card_integer(&primary, "BITPIX").unwrap_or(8).unsigned_abs() as usize;
        let naxis = card_integer(&primary, "NAXIS").unwrap_or(0);
        if naxis > 0 {
            let mut elems = 1usize;
            for i in 1..=naxis {
                let n = card_integer(&primary, &format!("NAXIS{i}")).unwrap_or(0);
                elems = elems.saturating_mul(n.max(0) as usize);
            }
            offset += padded_len(elems.saturating_mul(bitpix / 8));
        }

        let primary_cards = primary
            .into_iter()
            .filter(|c| !is_primary_structural(c.keyword_str()))
            .collect();

        let mut tables = Vec::new();
        while offset < src.len() {
            let (cards, header_len) = parse_header(&src[offset..])?;
            offset += header_len;

            let naxis1 = card_integer(&cards, "NAXIS1").unwrap_or(0).max(0) as usize;
            let naxis2 = card_integer(&cards, "NAXIS2").unwrap_or(0).max(0) as usize;
            let pcount = card_integer(&cards, "PCOUNT").unwrap_or(0).max(0) as usize;
            let data_len = naxis1
                .checked_mul(naxis2)
                .and_then(|n| n.checked_add(pcount))
                .ok_or(Error::InvalidHeader)?;
            let data_end = offset
                .checked_add(data_len)
                .filter(|&end| end <= src.len())
                .ok_or(Error::UnexpectedEof)?;

            let kind = card_string(&cards, "XTENSION")
                .filter(|x| x == "BINTABLE")
                .and_then(|_| card_string(&cards, "EXTNAME"))
                .and_then(|name| TableKind::from_extname(&name));
            if let Some(kind) = kind {
                let table = parse_table(kind, &cards, &src[offset..data_end], naxis2)?;
                tables.push(table);
            }
            offset += padded_len(data_len);
        }

        Ok(OiFitsFile {
            file_name: None,
            primary_cards,
            tables,
        })
    }

    // ---- encoding ----

    /// Serializes the whole file to FITS bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cards = Vec::with_capacity(4 + self.primary_cards.len());
        cards.push(Card::with_comment(
            "SIMPLE",
            Value::Logical(true),
            "file conforms to FITS standard",
        ));
        cards.push(Card::new("BITPIX", Value::Integer(8)));
        cards.push(Card::new("NAXIS", Value::Integer(0)));
        cards.push(Card::new("EXTEND", Value::Logical(true)));
        cards.extend(self.primary_cards.iter().cloned());

        let mut out = serialize_header(&cards);
        for table in &self.tables {
            write_table(&mut out, table)?;
        }
        Ok(out)
    }

    // ---- file I/O ----

    /// Reads and parses a file from disk, inflating `.gz` input.
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes_named(&bytes, path.to_str())
    }

    /// Serializes and writes the file to disk.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for OiFitsFile {
    fn default() -> Self {
        Self::new()
    }
}

fn is_primary_structural(name: &str) -> bool {
    matches!(name, "SIMPLE" | "BITPIX" | "EXTEND")
        || (name.starts_with("NAXIS")
            && name[5..].bytes().all(|b| b.is_ascii_digit()))
}

/// Structural BINTABLE cards that are regenerated on write.
fn is_table_structural(name: &str) -> bool {
    match name {
        "XTENSION" | "BITPIX" | "NAXIS" | "NAXIS1" | "NAXIS2" | "PCOUNT" | "GCOUNT"
        | "TFIELDS" | "EXTNAME" => true,
        _ => {
            for prefix in ["TFORM", "TTYPE", "TUNIT"] {
                if let Some(rest) = name.strip_prefix(prefix) {
                    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                        return true;
                    }
                }
            }
            false
        }
    }
}

fn parse_table(kind: TableKind, cards: &[Card], data: &[u8], nrows: usize) -> Result<OiTable> {
    let tfields = card_integer(cards, "TFIELDS")
        .ok_or(Error::MissingKeyword("TFIELDS"))?
        .max(0) as usize;

    let mut specs = Vec::with_capacity(tfields);
    for i in 1..=tfields {
        let tform =
            card_string(cards, &format!("TFORM{i}")).ok_or(Error::MissingKeyword("TFORM"))?;
        let name =
            card_string(cards, &format!("TTYPE{i}")).ok_or(Error::MissingKeyword("TTYPE"))?;
        let (repeat, ty) = parse_tform(&tform)?;
        let mut spec = ColSpec::new(name.trim(), repeat, ty);
        spec.unit = card_string(cards, &format!("TUNIT{i}"));
        specs.push(spec);
    }

    let naxis1 = card_integer(cards, "NAXIS1").unwrap_or(0).max(0) as usize;
    if row_stride(&specs) != naxis1 {
        return Err(Error::InvalidHeader);
    }

    let columns = read_columns(data, &specs, nrows)?;

    let mut table = OiTable::new(kind, nrows);
    if let Some(extname) = card_string(cards, "EXTNAME") {
        table.set_extname(extname.trim());
    }
    for (spec, data) in specs.iter().zip(columns) {
        table.set_column(&spec.name, spec.repeat, data)?;
    }

    for card in cards {
        let name = card.keyword_str();
        if is_table_structural(name) {
            continue;
        }
        match (&card.value, kind.keyword_def(name)) {
            (Some(value), Some(_)) => table.set_keyword(name, value.clone()),
            _ => table.extra_cards.push(card.clone()),
        }
    }
    Ok(table)
}

fn write_table(out: &mut Vec<u8>, table: &OiTable) -> Result<()> {
    let kind = table.kind();
    let mut specs = Vec::new();
    let mut columns = Vec::new();
    for (name, col) in table.columns() {
        let mut spec = ColSpec::new(name, col.repeat, col.data.ty());
        spec.unit = kind
            .column_def(name)
            .and_then(|d| d.unit)
            .map(String::from);
        specs.push(spec);
        columns.push(col.data.clone());
    }

    let mut cards = table_cards(table.extname(), &specs, table.nrows());
    for def in kind.keyword_defs() {
        if let Some(value) = table.keyword(def.name) {
            cards.push(Card::with_comment(def.name, value.clone(), def.desc));
        }
    }
    for name in table.keyword_names() {
        if kind.keyword_def(name).is_none() {
            if let Some(value) = table.keyword(name) {
                cards.push(Card::new(name, value.clone()));
            }
        }
    }
    cards.extend(table.extra_cards.iter().cloned());

    out.extend_from_slice(&serialize_header(&cards));
    let data = write_columns(&specs, &columns, table.nrows())?;
    out.extend_from_slice(&data);
    Ok(())
}

// ---- compression ----

/// Inflates compressed input, recognized by magic bytes. The file-name
/// suffix only decides when the input is too short to probe; plain input
/// passes through unchanged whatever the name says.
fn decompress_if_needed<'a>(bytes: &'a [u8], name: Option<&str>) -> Result<Cow<'a, [u8]>> {
    if bytes.len() >= 2 {
        let magic = [bytes[0], bytes[1]];
        if magic == GZIP_MAGIC {
            return Ok(Cow::Owned(gunzip(bytes)?));
        }
        if magic == COMPRESS_MAGIC {
            return Err(Error::UnsupportedCompression);
        }
        return Ok(Cow::Borrowed(bytes));
    }
    match name {
        Some(n) if n.ends_with(".gz") => Ok(Cow::Owned(gunzip(bytes)?)),
        Some(n) if n.ends_with(".Z") => Err(Error::UnsupportedCompression),
        _ => Ok(Cow::Borrowed(bytes)),
    }
}

const GZIP_FHCRC: u8 = 0x02;
const GZIP_FEXTRA: u8 = 0x04;
const GZIP_FNAME: u8 = 0x08;
const GZIP_FCOMMENT: u8 = 0x10;

/// Skips the gzip member header, returning the raw deflate stream.
fn strip_gzip_header(data: &[u8]) -> Result<&[u8]> {
    if data.len() < 10 || data[..2] != GZIP_MAGIC || data[2] != 8 {
        return Err(Error::DecompressionError);
    }
    let flg = data[3];
    let mut pos = 10usize;

    if flg & GZIP_FEXTRA != 0 {
        if pos + 2 > data.len() {
            return Err(Error::DecompressionError);
        }
        let xlen = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2 + xlen;
    }
    if flg & GZIP_FNAME != 0 {
        pos = skip_nul_terminated(data, pos)?;
    }
    if flg & GZIP_FCOMMENT != 0 {
        pos = skip_nul_terminated(data, pos)?;
    }
    if flg & GZIP_FHCRC != 0 {
        pos += 2;
    }

    data.get(pos..).ok_or(Error::DecompressionError)
}

fn skip_nul_terminated(data: &[u8], start: usize) -> Result<usize> {
    for (i, &b) in data.iter().enumerate().skip(start) {
        if b == 0 {
            return Ok(i + 1);
        }
    }
    Err(Error::DecompressionError)
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let body = strip_gzip_header(data)?;
    miniz_oxide::inflate::decompress_to_vec(body).map_err(|_| Error::DecompressionError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bintable::ColumnData;
    use alloc::vec;

    fn sample_wavelength() -> OiTable {
        let mut t = OiTable::new(TableKind::Wavelength, 3);
        t.set_keyword("OI_REVN", Value::Integer(1));
        t.set_keyword("INSNAME", Value::String("AMBER".to_string()));
        t.set_column(
            "EFF_WAVE",
            1,
            ColumnData::Float(vec![1.60e-6, 1.65e-6, 1.70e-6]),
        )
        .unwrap();
        t.set_column("EFF_BAND", 1, ColumnData::Float(vec![5.0e-8; 3]))
            .unwrap();
        t
    }

    fn sample_file() -> OiFitsFile {
        let mut f = OiFitsFile::new();
        f.tables.push(sample_wavelength());
        f
    }

    #[test]
    fn bytes_round_trip() {
        let f = sample_file();
        let bytes = f.to_bytes().unwrap();
        assert_eq!(bytes.len() % crate::block::BLOCK_SIZE, 0);

        let back = OiFitsFile::from_bytes(&bytes).unwrap();
        assert_eq!(back.tables.len(), 1);
        let t = &back.tables[0];
        assert_eq!(t.kind(), TableKind::Wavelength);
        assert_eq!(t.insname(), Some("AMBER"));
        assert_eq!(t.oi_revn(), Some(1));
        assert_eq!(t.nrows(), 3);
        assert_eq!(
            t.column_float("EFF_WAVE").unwrap().unwrap(),
            [1.60e-6, 1.65e-6, 1.70e-6]
        );
    }

    #[test]
    fn unknown_extension_skipped() {
        let mut bytes = sample_file().to_bytes().unwrap();
        // Append a BINTABLE with an extension name this crate does not know.
        let specs = [ColSpec::new("X", 1, crate::bintable::ColType::Short)];
        let cards = table_cards("OI_CORR", &specs, 1);
        bytes.extend_from_slice(&serialize_header(&cards));
        bytes.extend_from_slice(&write_columns(&specs, &[ColumnData::Short(vec![7])], 1).unwrap());

        let f = OiFitsFile::from_bytes(&bytes).unwrap();
        assert_eq!(f.tables.len(), 1);
        assert_eq!(f.tables[0].kind(), TableKind::Wavelength);
    }

    #[test]
    fn unknown_cards_preserved() {
        let mut f = sample_file();
        f.tables[0]
            .extra_cards
            .push(Card::new("OBSERVER", Value::String("A. Labeyrie".to_string())));
        let bytes = f.to_bytes().unwrap();
        let back = OiFitsFile::from_bytes(&bytes).unwrap();
        let kept = back.tables[0]
            .extra_cards
            .iter()
            .find(|c| c.keyword_str() == "OBSERVER")
            .unwrap();
        assert_eq!(kept.value, Some(Value::String("A. Labeyrie".to_string())));
    }

    #[test]
    fn missing_simple_rejected() {
        let cards = [Card::new("BITPIX", Value::Integer(8))];
        let bytes = serialize_header(&cards);
        assert!(matches!(
            OiFitsFile::from_bytes(&bytes),
            Err(Error::InvalidHeader)
        ));
    }

    #[test]
    fn truncated_extension_data_is_eof() {
        let mut bytes = sample_file().to_bytes().unwrap();
        bytes.truncate(bytes.len() - crate::block::BLOCK_SIZE);
        assert!(matches!(
            OiFitsFile::from_bytes(&bytes),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn lookups_by_name() {
        let mut f = sample_file();
        let mut arr = OiTable::new(TableKind::Array, 0);
        arr.set_keyword("ARRNAME", Value::String("VLTI".to_string()));
        f.tables.push(arr);

        assert!(f.wavelength_by_name("AMBER").is_some());
        assert!(f.wavelength_by_name("MIDI").is_none());
        assert!(f.array_by_name("VLTI").is_some());
        assert!(f.array_by_name("CHARA").is_none());
        assert!(f.target_table().is_none());
        assert_eq!(f.data_tables().count(), 0);
    }

    #[test]
    fn display_name_fallback() {
        let mut f = OiFitsFile::new();
        assert_eq!(f.display_name(), "[Undefined]");
        f.file_name = Some("obs.fits".to_string());
        assert_eq!(f.display_name(), "obs.fits");
    }

    // ---- compression ----

    fn gzip_wrap(plain: &[u8]) -> Vec<u8> {
        let body = miniz_oxide::deflate::compress_to_vec(plain, 6);
        let mut out = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 0];
        out.extend_from_slice(&body);
        // crc32 and size trailer, not verified on read
        out.extend_from_slice(&[0u8; 8]);
        out
    }

    #[test]
    fn gzip_input_inflated() {
        let f = sample_file();
        let plain = f.to_bytes().unwrap();
        let gz = gzip_wrap(&plain);

        let back = OiFitsFile::from_bytes(&gz).unwrap();
        assert_eq!(back.tables.len(), 1);
        assert_eq!(back.tables[0].insname(), Some("AMBER"));
    }

    #[test]
    fn gzip_with_name_field() {
        let plain = sample_file().to_bytes().unwrap();
        let body = miniz_oxide::deflate::compress_to_vec(&plain, 6);
        let mut gz = vec![0x1f, 0x8b, 8, GZIP_FNAME, 0, 0, 0, 0, 0, 0];
        gz.extend_from_slice(b"obs.fits\0");
        gz.extend_from_slice(&body);
        gz.extend_from_slice(&[0u8; 8]);

        let back = OiFitsFile::from_bytes(&gz).unwrap();
        assert_eq!(back.tables.len(), 1);
    }

    #[test]
    fn plain_bytes_with_gz_name_pass_through() {
        let plain = sample_file().to_bytes().unwrap();
        let f = OiFitsFile::from_bytes_named(&plain, Some("obs.fits.gz")).unwrap();
        assert_eq!(f.tables.len(), 1);
        assert_eq!(f.file_name.as_deref(), Some("obs.fits.gz"));
    }

    #[test]
    fn compress_magic_rejected() {
        let bytes = [0x1f, 0x9d, 0x90, 0x00];
        assert!(matches!(
            OiFitsFile::from_bytes(&bytes),
            Err(Error::UnsupportedCompression)
        ));
    }

    #[test]
    fn corrupt_gzip_rejected() {
        let bytes = [0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff];
        assert!(matches!(
            OiFitsFile::from_bytes(&bytes),
            Err(Error::DecompressionError)
        ));
    }
}
