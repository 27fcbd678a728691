//! Dataset-level conformance checks over the standard fixtures.
//!
//! Each test writes the ten `arg-<type>` fixtures into its own temp
//! directory, so tests are independent of execution order.

use std::fs;
use std::path::{Path, PathBuf};

use arg_format::testdata::{fixture_name, fixture_values, write_fixtures};
use arg_format::{
    identify, sidecar_path, ArgConfig, ArgDataset, Cell, DataType, GeoTransform, MemoryRaster,
    RasterSource, LAYER_ITEM,
};
use tempfile::TempDir;

fn fixtures() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let paths = write_fixtures(dir.path()).expect("Failed to write fixtures");
    (dir, paths)
}

fn fixture_path(dir: &Path, data_type: DataType) -> PathBuf {
    dir.join(format!("{}.arg", fixture_name(data_type)))
}

#[test]
fn test_open_all_fixtures() {
    let (_dir, paths) = fixtures();
    for (path, data_type) in paths.iter().zip(DataType::ALL) {
        assert!(identify(path), "{}", path.display());
        let ds = ArgDataset::open(path).expect("Failed to open fixture");
        assert_eq!(ds.raster_count(), 1);
        assert_eq!(ds.size(), (2, 2));
        assert_eq!(ds.data_type(), data_type);
        assert_eq!(ds.layer_name(), fixture_name(data_type));
    }
}

#[test]
fn test_fixture_values_decode() {
    let (dir, _paths) = fixtures();

    let int16 = ArgDataset::open(fixture_path(dir.path(), DataType::Int16)).unwrap();
    assert_eq!(int16.values(), &fixture_values(DataType::Int16)[..]);

    let uint64 = ArgDataset::open(fixture_path(dir.path(), DataType::UInt64)).unwrap();
    assert_eq!(uint64.values(), &fixture_values(DataType::UInt64)[..]);

    let float32 = ArgDataset::open(fixture_path(dir.path(), DataType::Float32)).unwrap();
    assert_eq!(float32.values()[0], None);
    match float32.get(0, 1) {
        Some(Cell::Float(v)) => assert!((v - -20.02).abs() < 1e-4),
        other => panic!("unexpected cell {other:?}"),
    }
}

#[test]
fn test_geo_transform() {
    let (_dir, paths) = fixtures();
    for path in &paths {
        let ds = ArgDataset::open(path).unwrap();
        assert_eq!(ds.geo_transform().0, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]);
    }
}

#[test]
fn test_uneven_block_copy_size() {
    let dir = tempfile::tempdir().unwrap();
    let (cols, rows) = (20, 20);
    let values = (0..cols * rows)
        .map(|i| Some(Cell::Unsigned((i % 250) as u64)))
        .collect();
    let source = MemoryRaster::new(
        cols,
        rows,
        DataType::UInt8,
        GeoTransform::north_up(440720.0, 3751320.0, 60.0, 60.0),
        values,
    )
    .unwrap();

    for (bw, bh) in [(25, 25), (7, 3), (20, 1), (3, 20)] {
        let blocked = source.clone().with_block_size(bw, bh);
        let path = dir.path().join("utm.arg");

        let config = ArgConfig {
            copy_chunk_rows: 4,
            ..ArgConfig::default()
        };
        ArgDataset::create_copy(&path, &blocked, &config).unwrap();

        let size = fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(size, cols * rows, "block {bw}x{bh}");

        let copy = ArgDataset::open(&path).unwrap();
        assert_eq!(copy.values(), source.values(), "block {bw}x{bh}");
        assert_eq!(copy.geo_transform(), source.geo_transform());

        ArgDataset::delete(&path).unwrap();
        assert!(!path.exists());
    }
}

#[test]
fn test_layer_name_survives_copy() {
    let (dir, _paths) = fixtures();
    let mut ds = ArgDataset::open(fixture_path(dir.path(), DataType::Int16)).unwrap();

    let layer = "ARG FTW";
    ds.set_metadata_item(LAYER_ITEM, layer);
    assert_eq!(ds.metadata()[LAYER_ITEM], layer);

    let copy_path = dir.path().join("arg-int16-2.arg");
    ArgDataset::create_copy(&copy_path, &ds, &ArgConfig::default()).unwrap();

    let reopened = ArgDataset::open(&copy_path).unwrap();
    assert_eq!(reopened.metadata()[LAYER_ITEM], layer);
    assert_ne!(reopened.layer_name(), "arg-int16-2");
}

#[test]
fn test_int8_nodata_is_128() {
    let (dir, _paths) = fixtures();
    let ds = ArgDataset::open(fixture_path(dir.path(), DataType::Int8)).unwrap();
    assert_eq!(ds.nodata_value(), 128.0);

    let bytes = fs::read(ds.path()).unwrap();
    assert_eq!(bytes[0], 0x80);
    assert_eq!(ds.values()[0], None);
}

#[test]
fn test_byte_exact_round_trip_through_tiled_copy() {
    let (dir, paths) = fixtures();
    for path in &paths {
        let orig = ArgDataset::open(path).unwrap();

        // Stand-in for another container with its own tiling.
        let tiled = MemoryRaster::from_source(&orig).unwrap().with_block_size(16, 16);
        assert_eq!(tiled.block_size(), (16, 16));

        let mirror_path = dir
            .path()
            .join(format!("{}2.arg", orig.layer_name()));
        ArgDataset::create_copy(&mirror_path, &tiled, &ArgConfig::default()).unwrap();

        assert_eq!(
            fs::read(path).unwrap(),
            fs::read(&mirror_path).unwrap(),
            "{}",
            path.display()
        );
        ArgDataset::delete(&mirror_path).unwrap();
    }
}

#[test]
fn test_delete_fixtures() {
    let (_dir, paths) = fixtures();
    for path in &paths {
        ArgDataset::delete(path).unwrap();
        assert!(!path.exists());
        assert!(!sidecar_path(path).exists());
        assert!(!identify(path));
    }
}
