//! Granules: the (target, instrument mode, night) triples a file's
//! observables decompose into, plus the comparators used to order them in
//! collection views.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::oifits::OiFitsFile;
use crate::table::OiTable;

/// An observed target.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    /// [deg] right ascension at the mean equinox.
    pub ra: f64,
    /// [deg] declination at the mean equinox.
    pub dec: f64,
}

/// One backend setup, summarized from an OI_WAVELENGTH table.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentMode {
    pub ins_name: String,
    pub nb_channels: usize,
    /// [m] shortest effective wavelength.
    pub lambda_min: f32,
    /// [m] longest effective wavelength.
    pub lambda_max: f32,
    /// Mean spectral resolving power, NaN when not computable.
    pub res_power: f32,
}

/// An observing night, the rounded MJD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NightId(pub i64);

impl NightId {
    /// Calendar label of the night, `yyyy/mm/dd`.
    pub fn label(&self) -> String {
        crate::date::mjd_to_string(self.0 as f64)
    }
}

/// One granule. Components stay `None` when the file does not carry enough
/// information to resolve them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Granule {
    pub target: Option<Target>,
    pub ins_mode: Option<InstrumentMode>,
    pub night: Option<NightId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranuleField {
    Target,
    InsMode,
    Night,
}

/// Compares granules by an ordered list of fields; the first field that
/// differs decides. An unset component sorts before any defined value.
#[derive(Debug, Clone)]
pub struct GranuleComparator {
    fields: Vec<GranuleField>,
}

impl Default for GranuleComparator {
    fn default() -> Self {
        GranuleComparator {
            fields: alloc::vec![
                GranuleField::Target,
                GranuleField::InsMode,
                GranuleField::Night
            ],
        }
    }
}

impl GranuleComparator {
    pub fn new(fields: Vec<GranuleField>) -> Self {
        GranuleComparator { fields }
    }

    pub fn fields(&self) -> &[GranuleField] {
        &self.fields
    }

    pub fn compare(&self, a: &Granule, b: &Granule) -> Ordering {
        for field in &self.fields {
            let cmp = match field {
                GranuleField::Target => {
                    cmp_option(a.target.as_ref(), b.target.as_ref(), cmp_target)
                }
                GranuleField::InsMode => {
                    cmp_option(a.ins_mode.as_ref(), b.ins_mode.as_ref(), cmp_ins_mode)
                }
                GranuleField::Night => cmp_option(a.night.as_ref(), b.night.as_ref(), Ord::cmp),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

fn cmp_option<T>(a: Option<&T>, b: Option<&T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp(x, y),
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    let ai = a.chars().flat_map(char::to_lowercase);
    let bi = b.chars().flat_map(char::to_lowercase);
    ai.cmp(bi)
}

fn cmp_target(a: &Target, b: &Target) -> Ordering {
    cmp_ignore_case(&a.name, &b.name)
}

fn cmp_ins_mode(a: &InstrumentMode, b: &InstrumentMode) -> Ordering {
    cmp_ignore_case(&a.ins_name, &b.ins_name)
        .then_with(|| a.nb_channels.cmp(&b.nb_channels))
        .then_with(|| a.res_power.total_cmp(&b.res_power))
}

/// Case-insensitive file-name ordering with an `"[Undefined]"` fallback for
/// unnamed files.
pub fn compare_file_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    cmp_ignore_case(a.unwrap_or("[Undefined]"), b.unwrap_or("[Undefined]"))
}

/// Summarizes an OI_WAVELENGTH table into an [`InstrumentMode`].
pub fn instrument_mode_of(wavelength: &OiTable) -> Option<InstrumentMode> {
    let ins_name = wavelength.insname()?;
    let eff_wave = wavelength.column_float("EFF_WAVE").ok().flatten()?;
    let eff_band = wavelength.column_float("EFF_BAND").ok().flatten();

    let mut lambda_min = f32::INFINITY;
    let mut lambda_max = f32::NEG_INFINITY;
    for &w in eff_wave {
        if w < lambda_min {
            lambda_min = w;
        }
        if w > lambda_max {
            lambda_max = w;
        }
    }

    // mean resolving power over the channels where it is finite
    let mut total = 0.0f64;
    let mut n = 0usize;
    if let Some(bands) = eff_band {
        for (&w, &b) in eff_wave.iter().zip(bands) {
            let res = f64::from(w) / f64::from(b);
            if res.is_finite() {
                total += res;
                n += 1;
            }
        }
    }
    let res_power = if n > 0 {
        (total / n as f64) as f32
    } else {
        f32::NAN
    };

    Some(InstrumentMode {
        ins_name: String::from(ins_name),
        nb_channels: wavelength.nrows(),
        lambda_min,
        lambda_max,
        res_power,
    })
}

/// The distinct granules of a file, one per (target, instrument mode, night)
/// triple found in its observable rows, in default comparator order.
pub fn granules_of(file: &OiFitsFile) -> Vec<Granule> {
    let targets = target_list(file);
    let mut granules: Vec<Granule> = Vec::new();

    for table in file.data_tables() {
        let ins_mode = table
            .insname()
            .and_then(|name| file.wavelength_by_name(name))
            .and_then(instrument_mode_of);

        let target_ids = table.column_short("TARGET_ID").ok().flatten();
        let mjd = table.column_double("MJD").ok().flatten();

        for row in 0..table.nrows() {
            let target = target_ids
                .and_then(|ids| ids.get(row))
                .and_then(|id| targets.iter().find(|(tid, _)| tid == id))
                .map(|(_, t)| t.clone());
            let night = mjd
                .and_then(|m| m.get(row))
                .filter(|m| m.is_finite())
                .map(|&m| NightId(libm::round(m) as i64));

            let granule = Granule {
                target,
                ins_mode: ins_mode.clone(),
                night,
            };
            if !granules.contains(&granule) {
                granules.push(granule);
            }
        }
    }

    let comparator = GranuleComparator::default();
    granules.sort_by(|a, b| comparator.compare(a, b));
    granules
}

fn target_list(file: &OiFitsFile) -> Vec<(i16, Target)> {
    let mut out = Vec::new();
    let Some(table) = file.target_table() else {
        return out;
    };
    let (Ok(Some(ids)), Ok(Some(names)), Ok(Some(ra)), Ok(Some(dec))) = (
        table.column_short("TARGET_ID"),
        table.column_string("TARGET"),
        table.column_double("RAEP0"),
        table.column_double("DECEP0"),
    ) else {
        return out;
    };
    for (i, &id) in ids.iter().enumerate() {
        if let (Some(name), Some(&ra), Some(&dec)) = (names.get(i), ra.get(i), dec.get(i)) {
            out.push((
                id,
                Target {
                    name: name.clone(),
                    ra,
                    dec,
                },
            ));
        }
    }
    out
}
