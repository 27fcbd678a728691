//! ARG datasets on disk: an `.arg` payload next to its `.json` sidecar.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::ArgConfig;
use crate::error::{ArgError, Result};
use crate::metadata::GridMetadata;
use crate::source::{for_each_strip, RasterSource};
use crate::types::{Cell, DataType, GeoTransform};

/// Metadata item holding the layer name.
pub const LAYER_ITEM: &str = "LAYER";

/// Payload extension.
pub const ARG_EXTENSION: &str = "arg";

/// Sidecar extension.
pub const JSON_EXTENSION: &str = "json";

/// True if `path` looks like an ARG payload with a sidecar next to it.
pub fn identify(path: &Path) -> bool {
    has_arg_extension(path) && sidecar_path(path).is_file()
}

/// The `.json` sidecar belonging to an `.arg` path.
pub fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension(JSON_EXTENSION)
}

fn has_arg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARG_EXTENSION))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A single-band ARG grid loaded in memory.
#[derive(Debug, Clone)]
pub struct ArgDataset {
    path: PathBuf,
    metadata: GridMetadata,
    values: Vec<Option<Cell>>,
    items: BTreeMap<String, String>,
}

impl ArgDataset {
    /// Open a dataset, reading the sidecar first and then the payload.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !has_arg_extension(path) {
            return Err(ArgError::NotArg(path.display().to_string()));
        }

        let json_path = sidecar_path(path);
        if !json_path.is_file() {
            return Err(ArgError::NotArg(format!(
                "{}: missing sidecar {}",
                path.display(),
                json_path.display()
            )));
        }

        let mut metadata = GridMetadata::from_json(&fs::read_to_string(&json_path)?)?;
        let stem = file_stem(path);
        if metadata.layer_name.is_empty() {
            metadata.layer_name = stem;
        } else if metadata.layer_name != stem {
            debug!(layer = %metadata.layer_name, file = %stem, "Layer name differs from file name");
        }

        let payload = fs::read(path)?;
        let values = codec::decode(metadata.data_type, &payload, metadata.cell_count())?;

        debug!(
            path = %path.display(),
            datatype = %metadata.data_type,
            cols = metadata.cols,
            rows = metadata.rows,
            bytes = payload.len(),
            "Opened ARG dataset"
        );

        Ok(Self::from_parts(path.to_path_buf(), metadata, values))
    }

    /// Write `values` and `metadata` as a new dataset pair.
    pub fn create(
        path: impl AsRef<Path>,
        metadata: GridMetadata,
        values: Vec<Option<Cell>>,
        config: &ArgConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        prepare_target(path, config)?;
        metadata.validate()?;

        if values.len() != metadata.cell_count() {
            return Err(ArgError::ShapeMismatch {
                expected: metadata.cell_count(),
                actual: values.len(),
            });
        }

        let payload = codec::encode(metadata.data_type, &values)?;
        let sidecar = metadata.to_json()?;

        let written = fs::write(path, &payload).and_then(|_| fs::write(sidecar_path(path), sidecar));
        if let Err(err) = written {
            remove_pair_quietly(path);
            return Err(err.into());
        }

        info!(
            path = %path.display(),
            layer = %metadata.layer_name,
            datatype = %metadata.data_type,
            bytes = payload.len(),
            "Created ARG dataset"
        );

        Ok(Self::from_parts(path.to_path_buf(), metadata, values))
    }

    /// Copy any raster source into a new dataset, one block row at a time.
    ///
    /// The payload is exactly `rows * cols * width` bytes however the source
    /// blocks align with the raster edges. The layer name comes from the
    /// source when it has one, otherwise from the target file name.
    pub fn create_copy<S: RasterSource + ?Sized>(
        path: impl AsRef<Path>,
        source: &S,
        config: &ArgConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        config.validate().map_err(ArgError::unsupported)?;
        prepare_target(path, config)?;

        let (cols, rows) = source.size();
        let layer_name = source.layer_name().unwrap_or_else(|| file_stem(path));
        let metadata = GridMetadata::from_geo_transform(
            layer_name,
            source.data_type(),
            &source.geo_transform(),
            cols,
            rows,
        )?;
        metadata.validate()?;

        match copy_payload(path, source, &metadata, config) {
            Ok(values) => {
                let sidecar = metadata.to_json()?;
                if let Err(err) = fs::write(sidecar_path(path), sidecar) {
                    remove_pair_quietly(path);
                    return Err(err.into());
                }

                info!(
                    path = %path.display(),
                    layer = %metadata.layer_name,
                    datatype = %metadata.data_type,
                    cols,
                    rows,
                    "Copied raster into ARG dataset"
                );

                Ok(Self::from_parts(path.to_path_buf(), metadata, values))
            }
            Err(err) => {
                remove_pair_quietly(path);
                Err(err)
            }
        }
    }

    /// Remove both files of a dataset.
    pub fn delete(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !has_arg_extension(path) {
            return Err(ArgError::NotArg(path.display().to_string()));
        }

        let payload = fs::remove_file(path);
        let sidecar = fs::remove_file(sidecar_path(path));
        payload?;
        sidecar?;

        info!(path = %path.display(), "Deleted ARG dataset");
        Ok(())
    }

    fn from_parts(path: PathBuf, metadata: GridMetadata, values: Vec<Option<Cell>>) -> Self {
        Self {
            path,
            metadata,
            values,
            items: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid_metadata(&self) -> &GridMetadata {
        &self.metadata
    }

    /// ARG is single-band.
    pub fn raster_count(&self) -> usize {
        1
    }

    /// Raster size as `(cols, rows)`.
    pub fn size(&self) -> (usize, usize) {
        (self.metadata.cols, self.metadata.rows)
    }

    pub fn data_type(&self) -> DataType {
        self.metadata.data_type
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.metadata.geo_transform()
    }

    /// Nodata value as reported to readers (`128` for int8).
    pub fn nodata_value(&self) -> f64 {
        self.metadata.data_type.nodata_value()
    }

    pub fn layer_name(&self) -> &str {
        &self.metadata.layer_name
    }

    /// Row-major cells, `None` where the payload holds nodata.
    pub fn values(&self) -> &[Option<Cell>] {
        &self.values
    }

    /// Cell at `(col, row)`; `None` when absent or outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<Cell> {
        if col >= self.metadata.cols || row >= self.metadata.rows {
            return None;
        }
        self.values[row * self.metadata.cols + col]
    }

    /// Dataset metadata items, always including `LAYER`.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut items = self.items.clone();
        items.insert(LAYER_ITEM.to_string(), self.metadata.layer_name.clone());
        items
    }

    /// Set a metadata item in memory.
    ///
    /// `LAYER` renames the layer and is persisted by [`ArgDataset::flush`].
    /// The sidecar has no room for other items, so they live only as long
    /// as this value.
    pub fn set_metadata_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key == LAYER_ITEM {
            self.metadata.layer_name = value;
        } else {
            debug!(%key, "Metadata item kept in memory only");
            self.items.insert(key, value);
        }
    }

    /// Rewrite the sidecar from the in-memory metadata.
    pub fn flush(&self) -> Result<()> {
        fs::write(sidecar_path(&self.path), self.metadata.to_json()?)?;
        debug!(path = %self.path.display(), "Rewrote ARG sidecar");
        Ok(())
    }
}

impl RasterSource for ArgDataset {
    fn size(&self) -> (usize, usize) {
        ArgDataset::size(self)
    }

    fn data_type(&self) -> DataType {
        self.metadata.data_type
    }

    fn geo_transform(&self) -> GeoTransform {
        self.metadata.geo_transform()
    }

    fn layer_name(&self) -> Option<String> {
        Some(self.metadata.layer_name.clone())
    }

    /// One scanline per block.
    fn block_size(&self) -> (usize, usize) {
        (self.metadata.cols, 1)
    }

    fn read_block(&self, block_col: usize, block_row: usize) -> Result<Vec<Option<Cell>>> {
        let cols = self.metadata.cols;
        if block_col != 0 || block_row >= self.metadata.rows {
            return Err(ArgError::unsupported(format!(
                "block ({block_col}, {block_row}) is outside {}",
                self.path.display()
            )));
        }
        Ok(self.values[block_row * cols..(block_row + 1) * cols].to_vec())
    }
}

/// Check the target path and the overwrite policy.
fn prepare_target(path: &Path, config: &ArgConfig) -> Result<()> {
    if !has_arg_extension(path) {
        return Err(ArgError::NotArg(path.display().to_string()));
    }

    let exists = path.exists() || sidecar_path(path).exists();
    if exists {
        if !config.overwrite {
            return Err(ArgError::AlreadyExists(path.display().to_string()));
        }
        warn!(path = %path.display(), "Overwriting existing ARG dataset");
    }

    Ok(())
}

/// Stream the source payload to `path`, returning the cells written.
fn copy_payload<S: RasterSource + ?Sized>(
    path: &Path,
    source: &S,
    metadata: &GridMetadata,
    config: &ArgConfig,
) -> Result<Vec<Option<Cell>>> {
    let data_type = metadata.data_type;
    let cols = metadata.cols;
    let mut writer = BufWriter::new(File::create(path)?);
    let mut buf = BytesMut::new();
    let mut buffered_rows = 0;
    let mut values = Vec::with_capacity(metadata.cell_count());

    for_each_strip(source, |first_row, strip| {
        codec::encode_into(data_type, &strip, first_row * cols, &mut buf)?;
        buffered_rows += strip.len() / cols;
        values.extend(strip);

        if buffered_rows >= config.copy_chunk_rows {
            writer.write_all(&buf)?;
            buf.clear();
            buffered_rows = 0;
        }
        Ok(())
    })?;

    writer.write_all(&buf)?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        bytes = metadata.payload_len(),
        "Wrote ARG payload"
    );

    Ok(values)
}

fn remove_pair_quietly(path: &Path) {
    for file in [path.to_path_buf(), sidecar_path(path)] {
        if let Err(err) = fs::remove_file(&file) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %file.display(), error = %err, "Failed to clean up partial ARG output");
            }
        }
    }
}
