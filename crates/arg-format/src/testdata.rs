//! Conformance fixtures.
//!
//! Writes one small dataset per data type, named `arg-<type>.arg` with its
//! `arg-<type>.json` sidecar:
//!
//! | Family   | Values (row-major 2x2)          |
//! |----------|---------------------------------|
//! | intN     | nodata, 2, -3, -4               |
//! | uintN    | nodata, 2, 3, 4                 |
//! | floatN   | nodata, 1.1, -20.02, 300.003    |
//!
//! All grids cover `0..2` in both axes with a cell size of 1, so their
//! geotransform is `[0, 1, 0, 2, 0, -1]`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::dataset::sidecar_path;
use crate::error::Result;
use crate::metadata::GridMetadata;
use crate::types::{Cell, DataType};

/// File stem of the fixture for `data_type`.
pub fn fixture_name(data_type: DataType) -> String {
    format!("arg-{data_type}")
}

/// Metadata shared by every fixture, with the given type and layer.
pub fn fixture_metadata(data_type: DataType) -> GridMetadata {
    GridMetadata::new(
        fixture_name(data_type),
        data_type,
        0.0,
        0.0,
        2.0,
        2.0,
        1.0,
        1.0,
        2,
        2,
    )
}

/// Cell values of the fixture for `data_type`.
pub fn fixture_values(data_type: DataType) -> Vec<Option<Cell>> {
    if data_type.is_float() {
        vec![
            None,
            Some(Cell::Float(1.1)),
            Some(Cell::Float(-20.02)),
            Some(Cell::Float(300.003)),
        ]
    } else if data_type.is_signed() {
        vec![
            None,
            Some(Cell::Signed(2)),
            Some(Cell::Signed(-3)),
            Some(Cell::Signed(-4)),
        ]
    } else {
        vec![
            None,
            Some(Cell::Unsigned(2)),
            Some(Cell::Unsigned(3)),
            Some(Cell::Unsigned(4)),
        ]
    }
}

/// Write the fixture pair for `data_type` into `dir`, returning the `.arg` path.
pub fn write_fixture(dir: &Path, data_type: DataType) -> Result<PathBuf> {
    let path = dir.join(format!("{}.arg", fixture_name(data_type)));
    let payload = codec::encode(data_type, &fixture_values(data_type))?;
    fs::write(&path, &payload)?;
    fs::write(sidecar_path(&path), fixture_metadata(data_type).to_json()?)?;
    Ok(path)
}

/// Write all ten fixtures into `dir`.
pub fn write_fixtures(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    DataType::ALL
        .iter()
        .map(|&data_type| write_fixture(dir, data_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixtures(dir.path()).unwrap();
        assert_eq!(paths.len(), 10);

        for (path, data_type) in paths.iter().zip(DataType::ALL) {
            assert!(path.ends_with(format!("arg-{data_type}.arg")));
            assert_eq!(fs::metadata(path).unwrap().len() as usize, 4 * data_type.byte_width());
            assert!(sidecar_path(path).is_file());
        }
    }
}
