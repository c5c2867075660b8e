//! Command line viewer: loads OIFits files, prints their table structure
//! (optionally with full column contents) and the validation report.

use std::fmt::Write as _;
use std::process::ExitCode;

use oifits_pure::bintable::ColumnData;
use oifits_pure::oifits::OiFitsFile;
use oifits_pure::table::OiTable;
use oifits_pure::validate::validate;

const USAGE: &str = "Usage: oifitsviewer [-f|-format] [-v|-verbose] [-c|-check] <file names>
  -f or -format  : formats values (less accurate but more readable)
  -v or -verbose : dumps table contents
  -c or -check   : prints the validation report only
  -h or -help    : shows this help";

#[derive(Debug, Default, Clone, Copy)]
struct Options {
    format: bool,
    verbose: bool,
    check_only: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Parses arguments and processes every file; `Err` means an argument error
/// (usage goes to stderr, exit 1). Per-file load failures are part of the
/// normal output so remaining files still get processed.
fn run(args: &[String]) -> Result<String, String> {
    let mut opts = Options::default();
    let mut files: Vec<&str> = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-f" | "-format" => opts.format = true,
            "-v" | "-verbose" => opts.verbose = true,
            "-c" | "-check" => opts.check_only = true,
            "-h" | "-help" => return Ok(String::from(USAGE)),
            other if other.starts_with('-') => {
                return Err(format!("'{other}' option not supported.\n{USAGE}"));
            }
            name => files.push(name),
        }
    }

    if files.is_empty() {
        return Err(format!("Missing file name argument.\n{USAGE}"));
    }

    let mut out = String::new();
    for name in files {
        match OiFitsFile::load(name) {
            Ok(file) => process_file(&mut out, &file, opts),
            Err(err) => {
                let _ = writeln!(out, "Error reading file '{name}': {err}");
            }
        }
    }
    Ok(out)
}

fn process_file(out: &mut String, file: &OiFitsFile, opts: Options) {
    let _ = writeln!(out, "oifits: {}", file.display_name());

    if !opts.check_only {
        for (index, table) in file.tables.iter().enumerate() {
            dump_table(out, table, index, opts);
        }
    }

    let report = validate(file);
    let _ = writeln!(out, "{}", report.format_report());
}

fn dump_table(out: &mut String, table: &OiTable, index: usize, opts: Options) {
    let _ = writeln!(
        out,
        "  {}#{}  {} row(s)",
        table.extname(),
        index,
        table.nrows()
    );

    for def in table.kind().keyword_defs() {
        if let Some(value) = table.keyword(def.name) {
            let _ = writeln!(out, "    {} = {:?}", def.name, value);
        }
    }

    for (name, col) in table.columns() {
        let unit = table
            .kind()
            .column_def(name)
            .and_then(|d| d.unit)
            .map(|u| format!(" ({u})"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "    {name} [{}{}]{unit}",
            col.repeat,
            col.data.ty().code()
        );
        if opts.verbose {
            for row in 0..table.nrows() {
                let _ = writeln!(out, "      {}", cell_text(&col.data, row, col.repeat, opts));
            }
        }
    }
}

/// One row of a column as text, elements separated by spaces.
fn cell_text(data: &ColumnData, row: usize, repeat: usize, opts: Options) -> String {
    let span = |len: usize| {
        let start = (row * repeat).min(len);
        let end = ((row + 1) * repeat).min(len);
        start..end
    };
    match data {
        ColumnData::Logical(v) => join(&v[span(v.len())], |b| String::from(if *b { "T" } else { "F" })),
        ColumnData::Short(v) => join(&v[span(v.len())], |n| n.to_string()),
        ColumnData::Int(v) => join(&v[span(v.len())], |n| n.to_string()),
        ColumnData::Float(v) => join(&v[span(v.len())], |f| fmt_double(f64::from(*f), opts)),
        ColumnData::Double(v) => join(&v[span(v.len())], |f| fmt_double(*f, opts)),
        ColumnData::Complex(v) => join(&v[span(v.len())], |c| {
            format!(
                "{}+{}i",
                fmt_double(f64::from(c[0]), opts),
                fmt_double(f64::from(c[1]), opts)
            )
        }),
        ColumnData::Str(v) => v.get(row).cloned().unwrap_or_default(),
    }
}

fn join<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
    items.iter().map(f).collect::<Vec<_>>().join(" ")
}

/// With `-f`, six significant digits and scientific notation outside a
/// readable range; full precision otherwise.
fn fmt_double(value: f64, opts: Options) -> String {
    if !opts.format {
        return format!("{value}");
    }
    if value == 0.0 {
        return String::from("0");
    }
    if !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs();
    if (1e-3..1e7).contains(&magnitude) {
        let text = format!("{value:.6}");
        let trimmed = text.trim_end_matches('0').trim_end_matches('.');
        String::from(trimmed)
    } else {
        format!("{value:.5E}")
    }
}
