//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use arg_format::testdata::write_fixtures;
use arg_format::{ArgConfig, ArgDataset, Cell, LAYER_ITEM};

/// Summary printed by `info`.
#[derive(Debug, Serialize)]
struct InfoReport {
    path: String,
    layer: String,
    datatype: String,
    cols: usize,
    rows: usize,
    bands: usize,
    geotransform: [f64; 6],
    /// `null` in JSON for float types (NaN).
    nodata: f64,
    payload_bytes: usize,
}

impl InfoReport {
    fn new(ds: &ArgDataset) -> Self {
        let (cols, rows) = ds.size();
        Self {
            path: ds.path().display().to_string(),
            layer: ds.layer_name().to_string(),
            datatype: ds.data_type().to_string(),
            cols,
            rows,
            bands: ds.raster_count(),
            geotransform: ds.geo_transform().0,
            nodata: ds.nodata_value(),
            payload_bytes: ds.grid_metadata().payload_len(),
        }
    }
}

pub fn info(path: &Path, json: bool) -> Result<()> {
    let ds = open(path)?;
    let report = InfoReport::new(&ds);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Path:         {}", report.path);
    println!("Layer:        {}", report.layer);
    println!("Data type:    {}", report.datatype);
    println!("Size:         {} x {} ({} band)", report.cols, report.rows, report.bands);
    println!("GeoTransform: {:?}", report.geotransform);
    println!("NoData:       {}", report.nodata);
    println!("Payload:      {} bytes", report.payload_bytes);
    Ok(())
}

pub fn dump(path: &Path) -> Result<()> {
    let ds = open(path)?;
    let (cols, _) = ds.size();

    for row in ds.values().chunks(cols) {
        let line: Vec<String> = row.iter().map(format_cell).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

pub fn copy(src: &Path, dst: &Path, layer: Option<String>, config: &ArgConfig) -> Result<()> {
    let mut source = open(src)?;
    if let Some(layer) = layer {
        source.set_metadata_item(LAYER_ITEM, layer);
    }

    let copy = ArgDataset::create_copy(dst, &source, config)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;

    info!(
        src = %src.display(),
        dst = %dst.display(),
        layer = %copy.layer_name(),
        "Copy complete"
    );
    Ok(())
}

pub fn delete(path: &Path) -> Result<()> {
    ArgDataset::delete(path).with_context(|| format!("Failed to delete {}", path.display()))
}

pub fn fixtures(dir: &Path) -> Result<()> {
    let paths = write_fixtures(dir)
        .with_context(|| format!("Failed to write fixtures to {}", dir.display()))?;
    for path in &paths {
        println!("{}", path.display());
    }
    info!(count = paths.len(), dir = %dir.display(), "Wrote fixtures");
    Ok(())
}

fn open(path: &Path) -> Result<ArgDataset> {
    ArgDataset::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn format_cell(cell: &Option<Cell>) -> String {
    match cell {
        Some(value) => value.to_string(),
        None => "nodata".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&None), "nodata");
        assert_eq!(format_cell(&Some(Cell::Signed(-3))), "-3");
        assert_eq!(format_cell(&Some(Cell::Float(1.5))), "1.5");
    }
}
