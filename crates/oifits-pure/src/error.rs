use alloc::string::String;

/// All errors that can occur while reading, writing or querying OIFits data.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block.
    InvalidHeader,
    /// Premature end of data while reading.
    UnexpectedEof,
    /// Malformed keyword name in a header card.
    InvalidKeyword,
    /// A header value could not be parsed correctly.
    InvalidValue,
    /// A required keyword was not found in the header.
    MissingKeyword(&'static str),
    /// A TFORM declaration could not be parsed.
    InvalidTform(String),
    /// A keyword or column was accessed with the wrong type.
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
    /// A column array length disagrees with the table's row count and repeat.
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// No column with the given name exists in the table.
    UnknownColumn(String),
    /// A row index beyond the table's row count was requested.
    RowOutOfRange { row: usize, nrows: usize },
    /// The input is compressed with a scheme this crate cannot inflate.
    UnsupportedCompression,
    /// The gzip stream could not be decompressed.
    DecompressionError,
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader => write!(f, "invalid FITS header"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::InvalidValue => write!(f, "invalid header value"),
            Error::MissingKeyword(kw) => write!(f, "missing required keyword: {kw}"),
            Error::InvalidTform(s) => write!(f, "invalid TFORM declaration: {s}"),
            Error::TypeMismatch { name, expected } => {
                write!(f, "type mismatch for '{name}': expected {expected}")
            }
            Error::ShapeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch for '{name}': expected {expected} values, got {actual}"
            ),
            Error::UnknownColumn(name) => write!(f, "unknown column: {name}"),
            Error::RowOutOfRange { row, nrows } => {
                write!(f, "row {row} out of range (table has {nrows} rows)")
            }
            Error::UnsupportedCompression => write!(f, "unsupported compression scheme"),
            Error::DecompressionError => write!(f, "gzip decompression failed"),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
