//! Typed OIFits table model.
//!
//! Each OIFits extension kind is one variant of [`TableKind`]; the kind
//! carries `const` descriptor tables for its mandatory and optional keywords
//! and columns. [`OiTable`] is the shared runtime shape: keyword map, ordered
//! column storage, row count, plus any unrecognized header cards preserved
//! for round-trip.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::bintable::{ColType, ColumnData};
use crate::error::{Error, Result};
use crate::header::Card;
use crate::value::Value;

/// Declared data type of a keyword or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Char,
    Short,
    Int,
    Real,
    Dbl,
    Complex,
    Logical,
}

impl DataType {
    /// The binary table storage type this declaration maps to.
    pub fn col_type(self) -> ColType {
        match self {
            DataType::Char => ColType::Ascii,
            DataType::Short => ColType::Short,
            DataType::Int => ColType::Int,
            DataType::Real => ColType::Float,
            DataType::Dbl => ColType::Double,
            DataType::Complex => ColType::Complex,
            DataType::Logical => ColType::Logical,
        }
    }

    /// True if a header [`Value`] satisfies this declaration.
    pub fn accepts_value(self, value: &Value) -> bool {
        match self {
            DataType::Char => matches!(value, Value::String(_)),
            DataType::Short | DataType::Int => matches!(value, Value::Integer(_)),
            DataType::Real | DataType::Dbl => {
                matches!(value, Value::Float(_) | Value::Integer(_))
            }
            DataType::Logical => matches!(value, Value::Logical(_)),
            DataType::Complex => false,
        }
    }
}

/// Per-row element count declared for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// One element per row (slot width for `Char` columns).
    Fixed(usize),
    /// One element per spectral channel of the referenced OI_WAVELENGTH
    /// table; the concrete count is only known per file.
    Wave,
}

/// Immutable keyword descriptor, shared by all tables of one kind.
#[derive(Debug, Clone, Copy)]
pub struct KeywordDef {
    pub name: &'static str,
    pub dtype: DataType,
    pub optional: bool,
    /// Accepted string values; empty means unrestricted.
    pub accepted: &'static [&'static str],
    pub desc: &'static str,
}

/// Immutable column descriptor, shared by all tables of one kind.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub dtype: DataType,
    pub repeat: Repeat,
    pub optional: bool,
    /// Error/uncertainty column: cells must be non-negative or NaN.
    pub is_error: bool,
    /// Alternate on-disk name some writers use for this column.
    pub alias: Option<&'static str>,
    /// Accepted string values; empty means unrestricted.
    pub accepted: &'static [&'static str],
    pub unit: Option<&'static str>,
    pub desc: &'static str,
}

const fn keyword(name: &'static str, dtype: DataType, desc: &'static str) -> KeywordDef {
    KeywordDef {
        name,
        dtype,
        optional: false,
        accepted: &[],
        desc,
    }
}

const fn column(
    name: &'static str,
    dtype: DataType,
    repeat: Repeat,
    desc: &'static str,
) -> ColumnDef {
    ColumnDef {
        name,
        dtype,
        repeat,
        optional: false,
        is_error: false,
        alias: None,
        accepted: &[],
        unit: None,
        desc,
    }
}

const fn error_column(
    name: &'static str,
    dtype: DataType,
    repeat: Repeat,
    desc: &'static str,
) -> ColumnDef {
    ColumnDef {
        is_error: true,
        ..column(name, dtype, repeat, desc)
    }
}

const fn optional_column(
    name: &'static str,
    dtype: DataType,
    repeat: Repeat,
    desc: &'static str,
) -> ColumnDef {
    ColumnDef {
        optional: true,
        ..column(name, dtype, repeat, desc)
    }
}

/// Revision keyword shared by every OIFits extension.
pub const KEYWORD_OI_REVN: KeywordDef =
    keyword("OI_REVN", DataType::Int, "revision number of the table definition");

const ARRAY_KEYWORDS: &[KeywordDef] = &[
    KEYWORD_OI_REVN,
    keyword("ARRNAME", DataType::Char, "array name for cross-referencing"),
    KeywordDef {
        accepted: &["GEOCENTRIC"],
        ..keyword("FRAME", DataType::Char, "coordinate frame")
    },
    keyword("ARRAYX", DataType::Dbl, "[m] array center X-coordinate"),
    keyword("ARRAYY", DataType::Dbl, "[m] array center Y-coordinate"),
    keyword("ARRAYZ", DataType::Dbl, "[m] array center Z-coordinate"),
];

const ARRAY_COLUMNS: &[ColumnDef] = &[
    column("TEL_NAME", DataType::Char, Repeat::Fixed(16), "telescope name"),
    column("STA_NAME", DataType::Char, Repeat::Fixed(16), "station name"),
    column("STA_INDEX", DataType::Short, Repeat::Fixed(1), "station index"),
    ColumnDef {
        unit: Some("m"),
        is_error: true,
        ..column("DIAMETER", DataType::Real, Repeat::Fixed(1), "element diameter")
    },
    ColumnDef {
        unit: Some("m"),
        ..column(
            "STAXYZ",
            DataType::Dbl,
            Repeat::Fixed(3),
            "station coordinates relative to array center",
        )
    },
];

const TARGET_KEYWORDS: &[KeywordDef] = &[KEYWORD_OI_REVN];

const TARGET_COLUMNS: &[ColumnDef] = &[
    column("TARGET_ID", DataType::Short, Repeat::Fixed(1), "index number"),
    column("TARGET", DataType::Char, Repeat::Fixed(16), "target name"),
    column("RAEP0", DataType::Dbl, Repeat::Fixed(1), "[deg] RA at mean equinox"),
    column("DECEP0", DataType::Dbl, Repeat::Fixed(1), "[deg] DEC at mean equinox"),
    column("EQUINOX", DataType::Real, Repeat::Fixed(1), "[yr] equinox"),
    error_column("RA_ERR", DataType::Dbl, Repeat::Fixed(1), "[deg] error in RA"),
    error_column("DEC_ERR", DataType::Dbl, Repeat::Fixed(1), "[deg] error in DEC"),
    column("SYSVEL", DataType::Dbl, Repeat::Fixed(1), "[m/s] systemic radial velocity"),
    ColumnDef {
        accepted: ACCEPTED_VELTYP,
        ..column("VELTYP", DataType::Char, Repeat::Fixed(8), "reference for radial velocity")
    },
    ColumnDef {
        accepted: ACCEPTED_VELDEF,
        ..column("VELDEF", DataType::Char, Repeat::Fixed(8), "definition of radial velocity")
    },
    column("PMRA", DataType::Dbl, Repeat::Fixed(1), "[deg/yr] proper motion in RA"),
    column("PMDEC", DataType::Dbl, Repeat::Fixed(1), "[deg/yr] proper motion in DEC"),
    error_column("PMRA_ERR", DataType::Dbl, Repeat::Fixed(1), "[deg/yr] error of PMRA"),
    error_column("PMDEC_ERR", DataType::Dbl, Repeat::Fixed(1), "[deg/yr] error of PMDEC"),
    column("PARALLAX", DataType::Real, Repeat::Fixed(1), "[deg] parallax"),
    error_column("PARA_ERR", DataType::Real, Repeat::Fixed(1), "[deg] error in parallax"),
    column("SPECTYP", DataType::Char, Repeat::Fixed(16), "spectral type"),
];

/// Accepted values for the VELTYP column.
pub const ACCEPTED_VELTYP: &[&str] = &["LSR", "HELIOCEN", "BARYCENT", "GEOCENTR", "TOPOCENT"];
/// Accepted values for the VELDEF column.
pub const ACCEPTED_VELDEF: &[&str] = &["OPTICAL", "RADIO"];

const WAVELENGTH_KEYWORDS: &[KeywordDef] = &[
    KEYWORD_OI_REVN,
    keyword("INSNAME", DataType::Char, "name of detector for cross-referencing"),
];

const WAVELENGTH_COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        unit: Some("m"),
        ..column("EFF_WAVE", DataType::Real, Repeat::Fixed(1), "effective wavelength of channel")
    },
    ColumnDef {
        unit: Some("m"),
        ..column("EFF_BAND", DataType::Real, Repeat::Fixed(1), "effective bandpass of channel")
    },
];

const DATA_KEYWORDS: &[KeywordDef] = &[
    KEYWORD_OI_REVN,
    keyword("DATE-OBS", DataType::Char, "UTC start date of observations"),
    KeywordDef {
        optional: true,
        ..keyword("ARRNAME", DataType::Char, "name of corresponding OI_ARRAY table")
    },
    keyword("INSNAME", DataType::Char, "name of corresponding OI_WAVELENGTH table"),
];

const VIS_COLUMNS: &[ColumnDef] = &[
    column("TARGET_ID", DataType::Short, Repeat::Fixed(1), "target number"),
    column("TIME", DataType::Dbl, Repeat::Fixed(1), "[s] UTC time of observation"),
    column("MJD", DataType::Dbl, Repeat::Fixed(1), "[d] modified Julian day"),
    column("INT_TIME", DataType::Dbl, Repeat::Fixed(1), "[s] integration time"),
    optional_column("VISDATA", DataType::Complex, Repeat::Wave, "complex coherent flux"),
    optional_column("VISERR", DataType::Complex, Repeat::Wave, "error in complex coherent flux"),
    column("VISAMP", DataType::Dbl, Repeat::Wave, "visibility amplitude"),
    error_column("VISAMPERR", DataType::Dbl, Repeat::Wave, "error in visibility amplitude"),
    column("VISPHI", DataType::Dbl, Repeat::Wave, "[deg] visibility phase"),
    error_column("VISPHIERR", DataType::Dbl, Repeat::Wave, "[deg] error in visibility phase"),
    column("UCOORD", DataType::Dbl, Repeat::Fixed(1), "[m] U coordinate of the data"),
    column("VCOORD", DataType::Dbl, Repeat::Fixed(1), "[m] V coordinate of the data"),
    column("STA_INDEX", DataType::Short, Repeat::Fixed(2), "station numbers of the baseline"),
    column("FLAG", DataType::Logical, Repeat::Wave, "flag"),
];

const VIS2_COLUMNS: &[ColumnDef] = &[
    column("TARGET_ID", DataType::Short, Repeat::Fixed(1), "target number"),
    column("TIME", DataType::Dbl, Repeat::Fixed(1), "[s] UTC time of observation"),
    column("MJD", DataType::Dbl, Repeat::Fixed(1), "[d] modified Julian day"),
    column("INT_TIME", DataType::Dbl, Repeat::Fixed(1), "[s] integration time"),
    column("VIS2DATA", DataType::Dbl, Repeat::Wave, "squared visibility"),
    error_column("VIS2ERR", DataType::Dbl, Repeat::Wave, "error in squared visibility"),
    column("UCOORD", DataType::Dbl, Repeat::Fixed(1), "[m] U coordinate of the data"),
    column("VCOORD", DataType::Dbl, Repeat::Fixed(1), "[m] V coordinate of the data"),
    column("STA_INDEX", DataType::Short, Repeat::Fixed(2), "station numbers of the baseline"),
    column("FLAG", DataType::Logical, Repeat::Wave, "flag"),
];

const T3_COLUMNS: &[ColumnDef] = &[
    column("TARGET_ID", DataType::Short, Repeat::Fixed(1), "target number"),
    column("TIME", DataType::Dbl, Repeat::Fixed(1), "[s] UTC time of observation"),
    column("MJD", DataType::Dbl, Repeat::Fixed(1), "[d] modified Julian day"),
    column("INT_TIME", DataType::Dbl, Repeat::Fixed(1), "[s] integration time"),
    column("T3AMP", DataType::Dbl, Repeat::Wave, "triple product amplitude"),
    error_column("T3AMPERR", DataType::Dbl, Repeat::Wave, "error in triple product amplitude"),
    column("T3PHI", DataType::Dbl, Repeat::Wave, "[deg] triple product phase"),
    error_column("T3PHIERR", DataType::Dbl, Repeat::Wave, "[deg] error in triple product phase"),
    column("U1COORD", DataType::Dbl, Repeat::Fixed(1), "[m] U coordinate of baseline AB"),
    column("V1COORD", DataType::Dbl, Repeat::Fixed(1), "[m] V coordinate of baseline AB"),
    column("U2COORD", DataType::Dbl, Repeat::Fixed(1), "[m] U coordinate of baseline BC"),
    column("V2COORD", DataType::Dbl, Repeat::Fixed(1), "[m] V coordinate of baseline BC"),
    column("STA_INDEX", DataType::Short, Repeat::Fixed(3), "station numbers of the triangle"),
    column("FLAG", DataType::Logical, Repeat::Wave, "flag"),
];

const FLUX_COLUMNS: &[ColumnDef] = &[
    column("TARGET_ID", DataType::Short, Repeat::Fixed(1), "target number"),
    column("MJD", DataType::Dbl, Repeat::Fixed(1), "[d] modified Julian day"),
    column("INT_TIME", DataType::Dbl, Repeat::Fixed(1), "[s] integration time"),
    ColumnDef {
        alias: Some("FLUX"),
        ..column("FLUXDATA", DataType::Dbl, Repeat::Wave, "flux per channel")
    },
    error_column("FLUXERR", DataType::Dbl, Repeat::Wave, "error in flux"),
    optional_column("STA_INDEX", DataType::Short, Repeat::Fixed(1), "station number"),
    optional_column("FLAG", DataType::Logical, Repeat::Wave, "flag"),
];

/// The OIFits extension kinds this crate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Array,
    Target,
    Wavelength,
    Vis,
    Vis2,
    T3,
    Flux,
}

impl TableKind {
    /// Canonical extension name.
    pub fn extname(self) -> &'static str {
        match self {
            TableKind::Array => "OI_ARRAY",
            TableKind::Target => "OI_TARGET",
            TableKind::Wavelength => "OI_WAVELENGTH",
            TableKind::Vis => "OI_VIS",
            TableKind::Vis2 => "OI_VIS2",
            TableKind::T3 => "OI_T3",
            TableKind::Flux => "OI_FLUX",
        }
    }

    /// Maps an on-disk EXTNAME to a kind. `OI_SPECTRUM` is the historical
    /// alias for `OI_FLUX`.
    pub fn from_extname(name: &str) -> Option<Self> {
        match name {
            "OI_ARRAY" => Some(TableKind::Array),
            "OI_TARGET" => Some(TableKind::Target),
            "OI_WAVELENGTH" => Some(TableKind::Wavelength),
            "OI_VIS" => Some(TableKind::Vis),
            "OI_VIS2" => Some(TableKind::Vis2),
            "OI_T3" => Some(TableKind::T3),
            "OI_FLUX" | "OI_SPECTRUM" => Some(TableKind::Flux),
            _ => None,
        }
    }

    pub fn keyword_defs(self) -> &'static [KeywordDef] {
        match self {
            TableKind::Array => ARRAY_KEYWORDS,
            TableKind::Target => TARGET_KEYWORDS,
            TableKind::Wavelength => WAVELENGTH_KEYWORDS,
            TableKind::Vis | TableKind::Vis2 | TableKind::T3 | TableKind::Flux => DATA_KEYWORDS,
        }
    }

    pub fn column_defs(self) -> &'static [ColumnDef] {
        match self {
            TableKind::Array => ARRAY_COLUMNS,
            TableKind::Target => TARGET_COLUMNS,
            TableKind::Wavelength => WAVELENGTH_COLUMNS,
            TableKind::Vis => VIS_COLUMNS,
            TableKind::Vis2 => VIS2_COLUMNS,
            TableKind::T3 => T3_COLUMNS,
            TableKind::Flux => FLUX_COLUMNS,
        }
    }

    pub fn column_def(self, name: &str) -> Option<&'static ColumnDef> {
        self.column_defs()
            .iter()
            .find(|d| d.name == name || d.alias == Some(name))
    }

    pub fn keyword_def(self, name: &str) -> Option<&'static KeywordDef> {
        self.keyword_defs().iter().find(|d| d.name == name)
    }

    /// True for the observable-carrying kinds (OI_VIS, OI_VIS2, OI_T3,
    /// OI_FLUX).
    pub fn is_data(self) -> bool {
        matches!(
            self,
            TableKind::Vis | TableKind::Vis2 | TableKind::T3 | TableKind::Flux
        )
    }
}

/// One stored column: element count per row plus the typed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub repeat: usize,
    pub data: ColumnData,
}

/// One OIFits extension instance.
#[derive(Debug, Clone, PartialEq)]
pub struct OiTable {
    kind: TableKind,
    extname: String,
    nrows: usize,
    keywords: BTreeMap<String, Value>,
    columns: Vec<(String, Column)>,
    /// Header cards not covered by the keyword descriptors, kept verbatim.
    pub extra_cards: Vec<Card>,
}

impl OiTable {
    /// Creates an empty table with the given row count.
    pub fn new(kind: TableKind, nrows: usize) -> Self {
        OiTable {
            kind,
            extname: String::from(kind.extname()),
            nrows,
            keywords: BTreeMap::new(),
            columns: Vec::new(),
            extra_cards: Vec::new(),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// The on-disk extension name (`OI_SPECTRUM` files keep their alias).
    pub fn extname(&self) -> &str {
        &self.extname
    }

    pub fn set_extname(&mut self, extname: &str) {
        self.extname = String::from(extname);
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    // ---- keywords ----

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    pub fn set_keyword(&mut self, name: &str, value: Value) {
        self.keywords.insert(String::from(name), value);
    }

    pub fn remove_keyword(&mut self, name: &str) -> Option<Value> {
        self.keywords.remove(name)
    }

    /// String keyword accessor: `Ok(None)` when unset, type mismatch when
    /// the stored value is not a string.
    pub fn keyword_string(&self, name: &str) -> Result<Option<&str>> {
        match self.keywords.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "string",
            }),
        }
    }

    pub fn keyword_integer(&self, name: &str) -> Result<Option<i64>> {
        match self.keywords.get(name) {
            None => Ok(None),
            Some(Value::Integer(n)) => Ok(Some(*n)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "integer",
            }),
        }
    }

    /// Numeric keyword accessor; integer storage widens to `f64`.
    pub fn keyword_double(&self, name: &str) -> Result<Option<f64>> {
        match self.keywords.get(name) {
            None => Ok(None),
            Some(Value::Float(f)) => Ok(Some(*f)),
            Some(Value::Integer(n)) => Ok(Some(*n as f64)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "float",
            }),
        }
    }

    pub fn keyword_logical(&self, name: &str) -> Result<Option<bool>> {
        match self.keywords.get(name) {
            None => Ok(None),
            Some(Value::Logical(b)) => Ok(Some(*b)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "logical",
            }),
        }
    }

    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    // convenience getters for the cross-reference keywords

    pub fn arrname(&self) -> Option<&str> {
        match self.keywords.get("ARRNAME") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn insname(&self) -> Option<&str> {
        match self.keywords.get("INSNAME") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn oi_revn(&self) -> Option<i64> {
        match self.keywords.get("OI_REVN") {
            Some(Value::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn date_obs(&self) -> Option<&str> {
        match self.keywords.get("DATE-OBS") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    // ---- columns ----

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| &c.data)
    }

    pub fn column_repeat(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.repeat)
    }

    /// Stored column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Stored columns in file order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Inserts or replaces a column, enforcing the element count implied by
    /// the table's row count and the given repeat.
    pub fn set_column(&mut self, name: &str, repeat: usize, data: ColumnData) -> Result<()> {
        let expected = ColumnData::expected_len(data.ty(), self.nrows, repeat);
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                name: String::from(name),
                expected,
                actual: data.len(),
            });
        }
        let col = Column { repeat, data };
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = col,
            None => self.columns.push((String::from(name), col)),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    /// Stored data for a column descriptor, trying its alias name when the
    /// canonical one is absent.
    pub fn column_by_def(&self, def: &ColumnDef) -> Option<&ColumnData> {
        self.column(def.name)
            .or_else(|| def.alias.and_then(|alias| self.column(alias)))
    }

    pub fn column_repeat_by_def(&self, def: &ColumnDef) -> Option<usize> {
        self.column_repeat(def.name)
            .or_else(|| def.alias.and_then(|alias| self.column_repeat(alias)))
    }

    /// Typed column views. Absent columns are `Ok(None)`; a present column
    /// of another type is a type mismatch.
    pub fn column_double(&self, name: &str) -> Result<Option<&[f64]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Double(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "double",
            }),
        }
    }

    pub fn column_float(&self, name: &str) -> Result<Option<&[f32]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Float(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "float",
            }),
        }
    }

    pub fn column_short(&self, name: &str) -> Result<Option<&[i16]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Short(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "short",
            }),
        }
    }

    pub fn column_string(&self, name: &str) -> Result<Option<&[String]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Str(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "string",
            }),
        }
    }

    pub fn column_logical(&self, name: &str) -> Result<Option<&[bool]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Logical(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "logical",
            }),
        }
    }

    pub fn column_complex(&self, name: &str) -> Result<Option<&[[f32; 2]]>> {
        match self.column(name) {
            None => Ok(None),
            Some(ColumnData::Complex(v)) => Ok(Some(v)),
            Some(_) => Err(Error::TypeMismatch {
                name: String::from(name),
                expected: "complex",
            }),
        }
    }

    /// The per-row slice of a double column, bounds-checked.
    pub fn double_row(&self, name: &str, row: usize) -> Result<&[f64]> {
        if row >= self.nrows {
            return Err(Error::RowOutOfRange {
                row,
                nrows: self.nrows,
            });
        }
        let repeat = self
            .column_repeat(name)
            .ok_or_else(|| Error::UnknownColumn(String::from(name)))?;
        let values = self
            .column_double(name)?
            .ok_or_else(|| Error::UnknownColumn(String::from(name)))?;
        Ok(&values[row * repeat..(row + 1) * repeat])
    }

    /// The per-row slice of a short column, bounds-checked.
    pub fn short_row(&self, name: &str, row: usize) -> Result<&[i16]> {
        if row >= self.nrows {
            return Err(Error::RowOutOfRange {
                row,
                nrows: self.nrows,
            });
        }
        let repeat = self
            .column_repeat(name)
            .ok_or_else(|| Error::UnknownColumn(String::from(name)))?;
        let values = self
            .column_short(name)?
            .ok_or_else(|| Error::UnknownColumn(String::from(name)))?;
        Ok(&values[row * repeat..(row + 1) * repeat])
    }

    /// Spectral channel count: the row count for OI_WAVELENGTH, the repeat
    /// of the first channel-shaped column for data tables.
    pub fn nwave(&self) -> Option<usize> {
        match self.kind {
            TableKind::Wavelength => Some(self.nrows),
            _ => {
                for def in self.kind.column_defs() {
                    if def.repeat == Repeat::Wave {
                        if let Some(repeat) = self.column_repeat_by_def(def) {
                            return Some(repeat);
                        }
                    }
                }
                None
            }
        }
    }
}
