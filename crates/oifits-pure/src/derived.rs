//! Derived columns computed from the stored data of an observable table:
//! station configuration labels, hour angle, projected baseline radius and
//! position angle, night identifier and spatial frequencies.
//!
//! Results are cached per table index in a [`DerivedCache`] owned by the
//! caller; mutating a file invalidates its cache entries explicitly.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::math::{cartesian_to_spherical, norm2, norm3};
use crate::oifits::OiFitsFile;
use crate::table::{OiTable, TableKind};

/// Days between the MJD origin and the J2000.0 epoch.
const MJD_2000: f64 = 51544.5;
/// Fraction of a Julian century per day.
const INV_CENTURY: f64 = 1.0 / 36525.0;

/// Label used when a station index cannot be resolved against OI_ARRAY.
pub const UNDEFINED_LABEL: &str = "[Undefined]";

/// All derived columns of one observable table.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumns {
    /// Station configuration label per row (station names joined by spaces).
    pub sta_config: Vec<String>,
    /// Hour angle per row in decimal hours, NaN when not computable.
    pub hour_angle: Vec<f64>,
    /// Projected baseline length per row in meters.
    pub radius: Vec<f64>,
    /// Position angle of the projected baseline per row in degrees.
    pub pos_angle: Vec<f64>,
    /// Rounded MJD per row.
    pub night_id: Vec<i64>,
    /// Spatial frequency per row and spectral channel.
    pub spatial_freq: Vec<Vec<f64>>,
}

/// Computes every derived column for the table at `index`.
///
/// Returns `None` when the index is out of range or the table carries no
/// observables. Quantities whose inputs are missing (unresolvable array or
/// target references, absent coordinate columns) come back as NaN or empty
/// rather than failing the whole computation.
pub fn compute(file: &OiFitsFile, index: usize) -> Option<DerivedColumns> {
    let table = file.get(index)?;
    if !table.kind().is_data() {
        return None;
    }
    let nrows = table.nrows();

    let (u, v) = baseline_coords(table, nrows);
    let radius: Vec<f64> = (0..nrows).map(|i| norm2(u[i], v[i])).collect();
    let pos_angle: Vec<f64> = (0..nrows)
        .map(|i| to_degrees(libm::atan2(u[i], v[i])))
        .collect();

    let mjd = column_or_nan(table, "MJD", nrows);
    let night_id: Vec<i64> = mjd.iter().map(|&m| libm::round(m) as i64).collect();

    Some(DerivedColumns {
        sta_config: sta_config(file, table, nrows),
        hour_angle: hour_angle(file, table, &mjd, nrows),
        radius,
        pos_angle,
        night_id,
        spatial_freq: spatial_freq(file, table, &u, &v, nrows),
    })
}

/// Caller-owned cache of derived columns, keyed by table index.
#[derive(Debug, Default)]
pub struct DerivedCache {
    entries: BTreeMap<usize, DerivedColumns>,
}

impl DerivedCache {
    pub fn new() -> Self {
        DerivedCache {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the derived columns for the table at `index`, computing them
    /// on first access.
    pub fn get(&mut self, file: &OiFitsFile, index: usize) -> Option<&DerivedColumns> {
        if !self.entries.contains_key(&index) {
            let derived = compute(file, index)?;
            self.entries.insert(index, derived);
        }
        self.entries.get(&index)
    }

    /// Drops the cached entry for one table.
    pub fn invalidate(&mut self, index: usize) {
        self.entries.remove(&index);
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / core::f64::consts::PI
}

fn to_radians(deg: f64) -> f64 {
    deg * core::f64::consts::PI / 180.0
}

fn column_or_nan(table: &OiTable, name: &str, nrows: usize) -> Vec<f64> {
    match table.column_double(name) {
        Ok(Some(values)) if values.len() == nrows => values.to_vec(),
        _ => vec![f64::NAN; nrows],
    }
}

/// The per-row baseline (u, v) in meters. OI_T3 uses the closing baseline
/// (u1+u2, v1+v2); OI_FLUX has no baseline and yields NaN.
fn baseline_coords(table: &OiTable, nrows: usize) -> (Vec<f64>, Vec<f64>) {
    match table.kind() {
        TableKind::T3 => {
            let u1 = column_or_nan(table, "U1COORD", nrows);
            let v1 = column_or_nan(table, "V1COORD", nrows);
            let u2 = column_or_nan(table, "U2COORD", nrows);
            let v2 = column_or_nan(table, "V2COORD", nrows);
            let u = (0..nrows).map(|i| u1[i] + u2[i]).collect();
            let v = (0..nrows).map(|i| v1[i] + v2[i]).collect();
            (u, v)
        }
        _ => (
            column_or_nan(table, "UCOORD", nrows),
            column_or_nan(table, "VCOORD", nrows),
        ),
    }
}

/// Station configuration labels: station names resolved through the
/// referenced OI_ARRAY, raw indices when the array cannot be resolved.
fn sta_config(file: &OiFitsFile, table: &OiTable, nrows: usize) -> Vec<String> {
    let Some(sta_index) = table.column_short("STA_INDEX").ok().flatten() else {
        return vec![String::from(UNDEFINED_LABEL); nrows];
    };
    let repeat = table.column_repeat("STA_INDEX").unwrap_or(1);

    let array = table.arrname().and_then(|name| file.array_by_name(name));
    let lookup: Option<(&[i16], &[String])> = array.and_then(|a| {
        let idx = a.column_short("STA_INDEX").ok().flatten()?;
        let names = a.column_string("STA_NAME").ok().flatten()?;
        Some((idx, names))
    });

    (0..nrows)
        .map(|row| {
            let indices = &sta_index[row * repeat..(row + 1) * repeat];
            let mut parts = Vec::with_capacity(indices.len());
            for &idx in indices {
                let name = lookup.and_then(|(ids, names)| {
                    ids.iter()
                        .position(|&s| s == idx)
                        .and_then(|i| names.get(i).cloned())
                });
                parts.push(name.unwrap_or_else(|| format!("{idx}")));
            }
            parts.join(" ")
        })
        .collect()
}

/// Longitude of the array center in degrees, from the ARRAYX/Y/Z keywords
/// of the referenced OI_ARRAY. `None` when the reference is unresolvable or
/// the coordinates are unset (zero vector).
fn array_longitude(file: &OiFitsFile, table: &OiTable) -> Option<f64> {
    let array = table.arrname().and_then(|name| file.array_by_name(name))?;
    let x = array.keyword_double("ARRAYX").ok().flatten()?;
    let y = array.keyword_double("ARRAYY").ok().flatten()?;
    let z = array.keyword_double("ARRAYZ").ok().flatten()?;
    if norm3(x, y, z) <= 1e-6 {
        return None;
    }
    let (lon, _lat, _dist) = cartesian_to_spherical([x, y, z]);
    Some(to_degrees(lon))
}

/// Target right ascension in degrees per TARGET_ID.
fn target_ra_map(file: &OiFitsFile) -> BTreeMap<i16, f64> {
    let mut map = BTreeMap::new();
    if let Some(target) = file.target_table() {
        if let (Ok(Some(ids)), Ok(Some(ra))) = (
            target.column_short("TARGET_ID"),
            target.column_double("RAEP0"),
        ) {
            for (i, &id) in ids.iter().enumerate() {
                if let Some(&r) = ra.get(i) {
                    map.entry(id).or_insert(r);
                }
            }
        }
    }
    map
}

/// Hour angle per row in decimal hours within [-12, 12].
///
/// Follows the Matlab JD2GAST formulation: Greenwich Mean Sidereal Time with
/// the polynomial correction, obliquity of the ecliptic, the four leading
/// nutation terms, then local apparent sidereal time through the array
/// longitude. Rows whose target or array cannot be resolved stay NaN.
fn hour_angle(file: &OiFitsFile, table: &OiTable, mjd: &[f64], nrows: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; nrows];

    let Some(longitude) = array_longitude(file, table) else {
        return out;
    };
    let ra_by_target = target_ra_map(file);
    if ra_by_target.is_empty() {
        return out;
    }
    let Some(target_id) = table.column_short("TARGET_ID").ok().flatten() else {
        return out;
    };

    for i in 0..nrows {
        let Some(&target_ra) = target_id.get(i).and_then(|id| ra_by_target.get(id)) else {
            continue;
        };

        let j2000 = mjd[i] - MJD_2000;
        let t = j2000 * INV_CENTURY;

        // Greenwich Mean Sidereal Time (deg)
        let gmst = ((280.46061837 + 360.98564736629 * j2000) + 0.000387933 * t * t
            - t * t * t / 38710000.0)
            % 360.0;

        // obliquity of the ecliptic (deg)
        let eps = 23.439291 - 0.0130111 * t - 1.64e-7 * t * t + 5.04e-7 * t * t * t;

        let omega = to_radians((125.04452 - 1934.136261 * t) % 360.0);
        let l = to_radians((280.4665 + 36000.7698 * t) % 360.0);
        let l1 = to_radians((218.3165 + 481267.8813 * t) % 360.0);

        // leading nutation terms (arcsec), then converted to degrees
        let d_l = (-17.2 * libm::sin(omega) - 1.32 * libm::sin(2.0 * l)
            - 0.23 * libm::sin(2.0 * l1)
            + 0.21 * libm::sin(2.0 * omega))
            / 3600.0;
        let d_e = (9.2 * libm::cos(omega) + 0.57 * libm::cos(2.0 * l)
            + 0.1 * libm::cos(2.0 * l1)
            - 0.09 * libm::cos(2.0 * omega))
            / 3600.0;

        // equation of the equinoxes (deg)
        let d_t = d_l * libm::cos(to_radians(d_e + eps));

        let gast = gmst + d_t;
        let last = gast + longitude;

        let mut ha = (last - target_ra) / 15.0;
        while ha < -12.0 {
            ha += 24.0;
        }
        while ha > 12.0 {
            ha -= 24.0;
        }
        out[i] = ha;
    }
    out
}

/// Spatial frequency per row and channel: baseline radius over the effective
/// wavelength of the referenced OI_WAVELENGTH table. Empty rows when the
/// instrument reference cannot be resolved.
fn spatial_freq(
    file: &OiFitsFile,
    table: &OiTable,
    u: &[f64],
    v: &[f64],
    nrows: usize,
) -> Vec<Vec<f64>> {
    let eff_waves: Option<Vec<f64>> = table
        .insname()
        .and_then(|name| file.wavelength_by_name(name))
        .and_then(|w| w.column_float("EFF_WAVE").ok().flatten())
        .map(|w| w.iter().map(|&x| x as f64).collect());
    let Some(eff_waves) = eff_waves else {
        return vec![Vec::new(); nrows];
    };

    (0..nrows)
        .map(|i| {
            let r = norm2(u[i], v[i]);
            eff_waves.iter().map(|&w| r / w).collect()
        })
        .collect()
}
