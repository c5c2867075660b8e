//! Structural validator.
//!
//! [`validate`] visits every table of a file exactly once, accumulating all
//! findings into a [`CheckReport`]; nothing stops the pass early. Structural
//! problems are report records, never `Err` values.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::bintable::ColumnData;
use crate::oifits::OiFitsFile;
use crate::table::{ColumnDef, DataType, OiTable, Repeat};
use crate::value::Value;

/// MJD of 1950-01-01, lower bound of the plausible observation window.
const MJD_1950_01_01: f64 = 33282.0;
/// MJD of 2150-01-01, upper bound of the plausible observation window.
const MJD_2150_01_01: f64 = 106332.0;

/// Known revision numbers of the table definitions.
const ACCEPTED_OI_REVN: &[i64] = &[1, 2];

/// True when an uncertainty value is usable: finite and non-negative, or NaN
/// for an unknown error.
pub fn is_error_valid(err: f64) -> bool {
    (err.is_finite() && err >= 0.0) || err.is_nan()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Information => "INFO",
            Severity::Warning => "WARNING",
            Severity::Severe => "SEVERE",
        })
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckMessage {
    pub severity: Severity,
    pub message: String,
}

/// Ordered accumulator of validation findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    records: Vec<CheckMessage>,
}

impl CheckReport {
    pub fn new() -> Self {
        CheckReport {
            records: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Information, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn severe(&mut self, message: impl Into<String>) {
        self.push(Severity::Severe, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.records.push(CheckMessage { severity, message });
    }

    pub fn records(&self) -> &[CheckMessage] {
        &self.records
    }

    pub fn warning_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    pub fn severe_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.severity == Severity::Severe)
            .count()
    }

    /// The one-line summary, e.g. `"2 warnings, 0 severe errors"`.
    pub fn status(&self) -> String {
        format!(
            "{} warnings, {} severe errors",
            self.warning_count(),
            self.severe_count()
        )
    }

    /// The full report: one `LEVEL\tmessage` line per record, then a blank
    /// line and the status.
    pub fn format_report(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&format!("{}\t{}\n", record.severity, record.message));
        }
        out.push('\n');
        out.push_str(&self.status());
        out
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Runs every structural check against every table of the file.
pub fn validate(file: &OiFitsFile) -> CheckReport {
    let mut report = CheckReport::new();
    for (index, table) in file.tables.iter().enumerate() {
        report.info(format!("Analysing table [{}#{}]", table.extname(), index));
        check_keywords(table, &mut report);
        check_columns(file, table, &mut report);
        if table.kind().is_data() {
            check_references(file, table, &mut report);
            check_target_ids(file, table, &mut report);
            check_error_columns(table, &mut report);
            check_mjd_range(table, &mut report);
        }
    }
    report
}

fn type_label(dtype: DataType) -> &'static str {
    match dtype {
        DataType::Char => "string",
        DataType::Short | DataType::Int => "integer",
        DataType::Real | DataType::Dbl => "float",
        DataType::Complex => "complex",
        DataType::Logical => "logical",
    }
}

fn check_keywords(table: &OiTable, report: &mut CheckReport) {
    for def in table.kind().keyword_defs() {
        let Some(value) = table.keyword(def.name) else {
            if !def.optional {
                report.severe(format!("Missing keyword '{}'", def.name));
            }
            continue;
        };
        if !def.dtype.accepts_value(value) {
            report.severe(format!(
                "Invalid format for keyword '{}', found '{}' should be '{}'",
                def.name,
                value.type_name(),
                type_label(def.dtype)
            ));
            continue;
        }
        if !def.accepted.is_empty() {
            if let Value::String(s) = value {
                if !def.accepted.contains(&s.as_str()) {
                    report.warning(format!(
                        "Invalid value for keyword '{}', found '{}' should be '{}'",
                        def.name,
                        s,
                        def.accepted.join("|")
                    ));
                }
            }
        }
        if def.name == "OI_REVN" {
            if let Value::Integer(revn) = value {
                if !ACCEPTED_OI_REVN.contains(revn) {
                    report.warning(format!(
                        "Invalid value for keyword 'OI_REVN', found '{revn}' should be '1|2'"
                    ));
                }
            }
        }
    }
}

/// The channel count the table's spectral columns must carry, through the
/// referenced OI_WAVELENGTH table.
fn expected_nwave(file: &OiFitsFile, table: &OiTable) -> Option<usize> {
    table
        .insname()
        .and_then(|name| file.wavelength_by_name(name))
        .map(|w| w.nrows())
}

fn check_columns(file: &OiFitsFile, table: &OiTable, report: &mut CheckReport) {
    let nwave = expected_nwave(file, table);

    for def in table.kind().column_defs() {
        let Some(data) = table.column_by_def(def) else {
            if !def.optional {
                report.severe(format!("Missing column '{}'", def.name));
            }
            continue;
        };
        let stored_repeat = table.column_repeat_by_def(def).unwrap_or(1);
        let stored_code = data.ty().code();
        let expected_code = def.dtype.col_type().code();

        if stored_code != expected_code {
            report.severe(format!(
                "Invalid format for column '{}', found '{stored_code}' should be '{expected_code}'",
                def.name
            ));
            continue;
        }

        match def.repeat {
            Repeat::Fixed(expected) => {
                // Character slots may be narrower than declared, never wider.
                let bad = if def.dtype == DataType::Char {
                    stored_repeat > expected
                } else {
                    stored_repeat != expected
                };
                if bad {
                    report.severe(format!(
                        "Invalid format for column '{}', found '{stored_repeat}{stored_code}' \
                         should be '{expected}{expected_code}'",
                        def.name
                    ));
                }
            }
            Repeat::Wave => match nwave {
                None => {
                    report.warning(format!("Can't check repeat for column '{}'", def.name));
                }
                Some(expected) if stored_repeat != expected => {
                    report.severe(format!(
                        "Invalid format for column '{}', found '{stored_repeat}{stored_code}' \
                         should be '{expected}{expected_code}'",
                        def.name
                    ));
                }
                Some(_) => {}
            },
        }

        check_accepted_strings(def, data, report);
    }
}

fn check_accepted_strings(def: &ColumnDef, data: &ColumnData, report: &mut CheckReport) {
    if def.accepted.is_empty() {
        return;
    }
    if let ColumnData::Str(values) = data {
        for (row, value) in values.iter().enumerate() {
            if !def.accepted.contains(&value.as_str()) {
                report.warning(format!(
                    "Invalid value for column '{}' line {row}, found '{value}' should be '{}'",
                    def.name,
                    def.accepted.join("|")
                ));
            }
        }
    }
}

fn check_references(file: &OiFitsFile, table: &OiTable, report: &mut CheckReport) {
    if let Some(arrname) = table.arrname() {
        if file.array_by_name(arrname).is_none() {
            report.severe(format!(
                "Missing OI_ARRAY table that describes the '{arrname}' array"
            ));
        }
    }
    if let Some(insname) = table.insname() {
        if file.wavelength_by_name(insname).is_none() {
            report.severe(format!(
                "Missing OI_WAVELENGTH table identified by INSNAME='{insname}'"
            ));
        }
    }
}

fn check_target_ids(file: &OiFitsFile, table: &OiTable, report: &mut CheckReport) {
    let Ok(Some(ids)) = table.column_short("TARGET_ID") else {
        return;
    };
    let known: Vec<i16> = file
        .target_table()
        .and_then(|t| t.column_short("TARGET_ID").ok().flatten())
        .map(|s| s.to_vec())
        .unwrap_or_default();

    let mut reported: Vec<i16> = Vec::new();
    for &id in ids {
        if !known.contains(&id) && !reported.contains(&id) {
            report.warning(format!(
                "TARGET_ID value '{id}' not found in the OI_TARGET table"
            ));
            reported.push(id);
        }
    }
}

/// Error columns must hold non-negative or NaN values in unflagged cells.
fn check_error_columns(table: &OiTable, report: &mut CheckReport) {
    let flags = table.column_logical("FLAG").ok().flatten();
    let flag_repeat = table.column_repeat("FLAG").unwrap_or(1);

    for def in table.kind().column_defs() {
        if !def.is_error {
            continue;
        }
        let Ok(Some(values)) = table.column_double(def.name) else {
            continue;
        };
        let repeat = table.column_repeat(def.name).unwrap_or(1);

        for row in 0..table.nrows() {
            for ch in 0..repeat {
                let flagged = flags
                    .filter(|_| repeat == flag_repeat)
                    .and_then(|f| f.get(row * flag_repeat + ch))
                    .copied()
                    .unwrap_or(false);
                if flagged {
                    continue;
                }
                let value = values[row * repeat + ch];
                if !is_error_valid(value) {
                    report.warning(format!(
                        "Invalid value at index {ch} for column '{}' line {row}, found \
                         '{value}' should be >= 0 or NaN or flagged out",
                        def.name
                    ));
                }
            }
        }
    }
}

fn check_mjd_range(table: &OiTable, report: &mut CheckReport) {
    let Ok(Some(mjd)) = table.column_double("MJD") else {
        return;
    };
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &m in mjd {
        if m < min {
            min = m;
        }
        if m > max {
            max = m;
        }
    }
    if mjd.is_empty() {
        return;
    }
    if max < MJD_1950_01_01 || min > MJD_2150_01_01 {
        report.warning(format!(
            "some MJD values are out of range, min/max [{min}-{max}] should probably \
             be into [{MJD_1950_01_01} - {MJD_2150_01_01}]"
        ));
    }
}
