//! End-to-end tests over a complete in-memory OIFits file: byte round trip,
//! validation, derived columns and granule extraction working together.

use oifits_pure::bintable::ColumnData;
use oifits_pure::derived::{self, DerivedCache};
use oifits_pure::granule::{granules_of, NightId};
use oifits_pure::oifits::OiFitsFile;
use oifits_pure::table::{OiTable, TableKind};
use oifits_pure::validate::{validate, Severity};
use oifits_pure::value::Value;

fn array_table() -> OiTable {
    let mut t = OiTable::new(TableKind::Array, 2);
    t.set_keyword("OI_REVN", Value::Integer(1));
    t.set_keyword("ARRNAME", Value::String("VLTI".into()));
    t.set_keyword("FRAME", Value::String("GEOCENTRIC".into()));
    t.set_keyword("ARRAYX", Value::Float(1942042.0));
    t.set_keyword("ARRAYY", Value::Float(-5455305.0));
    t.set_keyword("ARRAYZ", Value::Float(-2654677.0));
    t.set_column(
        "TEL_NAME",
        16,
        ColumnData::Str(vec!["UT1".into(), "UT2".into()]),
    )
    .unwrap();
    t.set_column(
        "STA_NAME",
        16,
        ColumnData::Str(vec!["U1".into(), "U2".into()]),
    )
    .unwrap();
    t.set_column("STA_INDEX", 1, ColumnData::Short(vec![1, 2]))
        .unwrap();
    t.set_column("DIAMETER", 1, ColumnData::Float(vec![8.2, 8.2]))
        .unwrap();
    t.set_column(
        "STAXYZ",
        3,
        ColumnData::Double(vec![-0.73, -9.92, -2.33, 20.45, 11.65, -0.6]),
    )
    .unwrap();
    t
}

fn target_table() -> OiTable {
    let mut t = OiTable::new(TableKind::Target, 1);
    t.set_keyword("OI_REVN", Value::Integer(1));
    t.set_column("TARGET_ID", 1, ColumnData::Short(vec![1])).unwrap();
    t.set_column("TARGET", 16, ColumnData::Str(vec!["HD 45677".into()]))
        .unwrap();
    t.set_column("RAEP0", 1, ColumnData::Double(vec![97.07])).unwrap();
    t.set_column("DECEP0", 1, ColumnData::Double(vec![-13.05])).unwrap();
    t.set_column("EQUINOX", 1, ColumnData::Float(vec![2000.0])).unwrap();
    t.set_column("RA_ERR", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("DEC_ERR", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("SYSVEL", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("VELTYP", 8, ColumnData::Str(vec!["LSR".into()])).unwrap();
    t.set_column("VELDEF", 8, ColumnData::Str(vec!["OPTICAL".into()]))
        .unwrap();
    t.set_column("PMRA", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("PMDEC", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("PMRA_ERR", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("PMDEC_ERR", 1, ColumnData::Double(vec![0.0])).unwrap();
    t.set_column("PARALLAX", 1, ColumnData::Float(vec![0.0])).unwrap();
    t.set_column("PARA_ERR", 1, ColumnData::Float(vec![0.0])).unwrap();
    t.set_column("SPECTYP", 16, ColumnData::Str(vec!["B2V".into()]))
        .unwrap();
    t
}

fn wavelength_table() -> OiTable {
    let mut t = OiTable::new(TableKind::Wavelength, 3);
    t.set_keyword("OI_REVN", Value::Integer(1));
    t.set_keyword("INSNAME", Value::String("MIDI".into()));
    t.set_column(
        "EFF_WAVE",
        1,
        ColumnData::Float(vec![8.5e-6, 1.05e-5, 1.25e-5]),
    )
    .unwrap();
    t.set_column("EFF_BAND", 1, ColumnData::Float(vec![2.0e-6; 3]))
        .unwrap();
    t
}

fn vis2_table() -> OiTable {
    let mut t = OiTable::new(TableKind::Vis2, 2);
    t.set_keyword("OI_REVN", Value::Integer(1));
    t.set_keyword("DATE-OBS", Value::String("2009-06-12".into()));
    t.set_keyword("ARRNAME", Value::String("VLTI".into()));
    t.set_keyword("INSNAME", Value::String("MIDI".into()));
    t.set_column("TARGET_ID", 1, ColumnData::Short(vec![1, 1])).unwrap();
    t.set_column("TIME", 1, ColumnData::Double(vec![0.0, 0.0])).unwrap();
    t.set_column("MJD", 1, ColumnData::Double(vec![54990.2, 54990.3]))
        .unwrap();
    t.set_column("INT_TIME", 1, ColumnData::Double(vec![30.0, 30.0]))
        .unwrap();
    t.set_column(
        "VIS2DATA",
        3,
        ColumnData::Double(vec![0.52, 0.48, 0.44, 0.61, 0.58, 0.55]),
    )
    .unwrap();
    t.set_column("VIS2ERR", 3, ColumnData::Double(vec![0.01; 6])).unwrap();
    t.set_column("UCOORD", 1, ColumnData::Double(vec![12.5, -40.2]))
        .unwrap();
    t.set_column("VCOORD", 1, ColumnData::Double(vec![30.1, 15.8]))
        .unwrap();
    t.set_column("STA_INDEX", 2, ColumnData::Short(vec![1, 2, 1, 2]))
        .unwrap();
    t.set_column("FLAG", 3, ColumnData::Logical(vec![false; 6])).unwrap();
    t
}

fn sample_file() -> OiFitsFile {
    let mut f = OiFitsFile::new();
    f.tables.push(array_table());
    f.tables.push(target_table());
    f.tables.push(wavelength_table());
    f.tables.push(vis2_table());
    f
}

#[test]
fn file_round_trips_through_bytes() {
    let original = sample_file();
    let bytes = original.to_bytes().unwrap();
    assert_eq!(bytes.len() % 2880, 0);

    let loaded = OiFitsFile::from_bytes(&bytes).unwrap();
    assert_eq!(loaded.tables, original.tables);
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("obs.fits");

    let original = sample_file();
    original.save(&path).unwrap();

    let loaded = OiFitsFile::load(&path).unwrap();
    assert_eq!(loaded.tables, original.tables);
    assert!(loaded.file_name.is_some());
}

#[test]
fn complete_file_validates_clean() {
    let report = validate(&sample_file());
    assert_eq!(report.severe_count(), 0, "{}", report.format_report());
    assert_eq!(report.warning_count(), 0, "{}", report.format_report());
}

#[test]
fn missing_station_column_is_the_only_severe() {
    let mut f = sample_file();
    let mut broken = array_table();
    broken.remove_column("STA_NAME");
    f.tables[0] = broken;

    let report = validate(&f);
    let severe: Vec<_> = report
        .records()
        .iter()
        .filter(|r| r.severity == Severity::Severe)
        .collect();
    assert_eq!(severe.len(), 1, "{}", report.format_report());
    assert_eq!(severe[0].message, "Missing column 'STA_NAME'");
    // the other tables were still visited
    assert!(report
        .records()
        .iter()
        .any(|r| r.message.contains("OI_VIS2#3")));
}

#[test]
fn validation_survives_byte_round_trip() {
    let bytes = sample_file().to_bytes().unwrap();
    let loaded = OiFitsFile::from_bytes(&bytes).unwrap();
    let report = validate(&loaded);
    assert_eq!(report.severe_count(), 0, "{}", report.format_report());
}

#[test]
fn derived_columns_are_idempotent() {
    let f = sample_file();
    let first = derived::compute(&f, 3).unwrap();
    let second = derived::compute(&f, 3).unwrap();
    assert_eq!(first, second);

    let mut cache = DerivedCache::new();
    let cached = cache.get(&f, 3).unwrap();
    assert_eq!(cached, &first);
}

#[test]
fn derived_columns_values() {
    let f = sample_file();
    let d = derived::compute(&f, 3).unwrap();

    assert_eq!(d.sta_config, ["U1 U2", "U1 U2"]);
    assert_eq!(d.night_id, [54990, 54990]);

    let expected_r0 = (12.5f64 * 12.5 + 30.1 * 30.1).sqrt();
    assert!((d.radius[0] - expected_r0).abs() < 1e-9);

    assert_eq!(d.spatial_freq[0].len(), 3);
    assert!((d.spatial_freq[0][0] - expected_r0 / 8.5e-6f32 as f64).abs() < 1.0);

    for &ha in &d.hour_angle {
        assert!(ha.is_finite());
        assert!((-12.0..=12.0).contains(&ha));
    }
}

#[test]
fn granules_from_file() {
    let f = sample_file();
    let granules = granules_of(&f);
    assert_eq!(granules.len(), 1);
    let g = &granules[0];
    assert_eq!(g.target.as_ref().unwrap().name, "HD 45677");
    assert_eq!(g.night, Some(NightId(54990)));
    let mode = g.ins_mode.as_ref().unwrap();
    assert_eq!(mode.ins_name, "MIDI");
    assert_eq!(mode.nb_channels, 3);
}

#[test]
fn gzip_file_loads() {
    let plain = sample_file().to_bytes().unwrap();
    let body = miniz_oxide::deflate::compress_to_vec(&plain, 6);
    let mut gz = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 0];
    gz.extend_from_slice(&body);
    gz.extend_from_slice(&[0u8; 8]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("obs.fits.gz");
    std::fs::write(&path, &gz).unwrap();

    let loaded = OiFitsFile::load(&path).unwrap();
    assert_eq!(loaded.tables.len(), 4);
    assert_eq!(loaded.tables, sample_file().tables);
}

#[test]
fn spectrum_extname_survives_round_trip() {
    let mut f = sample_file();
    let mut flux = OiTable::new(TableKind::Flux, 1);
    flux.set_keyword("OI_REVN", Value::Integer(1));
    flux.set_keyword("DATE-OBS", Value::String("2009-06-12".into()));
    flux.set_keyword("INSNAME", Value::String("MIDI".into()));
    flux.set_extname("OI_SPECTRUM");
    flux.set_column("TARGET_ID", 1, ColumnData::Short(vec![1])).unwrap();
    flux.set_column("MJD", 1, ColumnData::Double(vec![54990.2])).unwrap();
    flux.set_column("INT_TIME", 1, ColumnData::Double(vec![30.0])).unwrap();
    flux.set_column("FLUXDATA", 3, ColumnData::Double(vec![1.0, 1.1, 1.2]))
        .unwrap();
    flux.set_column("FLUXERR", 3, ColumnData::Double(vec![0.1; 3])).unwrap();
    f.tables.push(flux);

    let bytes = f.to_bytes().unwrap();
    let loaded = OiFitsFile::from_bytes(&bytes).unwrap();
    let t = loaded.tables.last().unwrap();
    assert_eq!(t.kind(), TableKind::Flux);
    assert_eq!(t.extname(), "OI_SPECTRUM");
}
