//! Block-oriented raster sources that can be copied into ARG.

use tracing::debug;

use crate::error::{ArgError, Result};
use crate::types::{Cell, DataType, GeoTransform};

/// A single-band raster read in fixed-size blocks.
///
/// Blocks are addressed by block column and block row. Blocks on the right
/// and bottom edges may overhang the raster; they are still returned at the
/// full block size and the overhanging cells are ignored by readers.
pub trait RasterSource {
    /// Raster size as `(cols, rows)`.
    fn size(&self) -> (usize, usize);

    fn data_type(&self) -> DataType;

    fn geo_transform(&self) -> GeoTransform;

    /// Layer name to carry into a copy, if the source has one.
    fn layer_name(&self) -> Option<String> {
        None
    }

    /// Natural block size as `(block_cols, block_rows)`.
    fn block_size(&self) -> (usize, usize);

    /// Read one block in row-major order, `block_cols * block_rows` cells.
    fn read_block(&self, block_col: usize, block_row: usize) -> Result<Vec<Option<Cell>>>;
}

/// Walk a source one strip of block rows at a time.
///
/// `on_strip` receives the first raster row of the strip and the strip's
/// cells (`strip_rows * cols`, overhang already cropped).
pub fn for_each_strip<S, F>(source: &S, mut on_strip: F) -> Result<()>
where
    S: RasterSource + ?Sized,
    F: FnMut(usize, Vec<Option<Cell>>) -> Result<()>,
{
    let (cols, rows) = source.size();
    let (block_cols, block_rows) = source.block_size();
    if block_cols == 0 || block_rows == 0 {
        return Err(ArgError::unsupported(format!(
            "invalid block size {block_cols}x{block_rows}"
        )));
    }

    let block_len = block_cols.checked_mul(block_rows).ok_or_else(|| {
        ArgError::unsupported(format!("block size {block_cols}x{block_rows} is too large"))
    })?;

    let blocks_x = cols.div_ceil(block_cols);
    let blocks_y = rows.div_ceil(block_rows);
    debug!(
        cols,
        rows, block_cols, block_rows, blocks_x, blocks_y, "Reading raster by blocks"
    );

    for by in 0..blocks_y {
        let first_row = by * block_rows;
        let strip_rows = block_rows.min(rows - first_row);
        let mut strip = vec![None; strip_rows * cols];

        for bx in 0..blocks_x {
            let block = source.read_block(bx, by)?;
            if block.len() != block_len {
                return Err(ArgError::ShapeMismatch {
                    expected: block_len,
                    actual: block.len(),
                });
            }

            let first_col = bx * block_cols;
            let valid_cols = block_cols.min(cols - first_col);
            for r in 0..strip_rows {
                let src = &block[r * block_cols..r * block_cols + valid_cols];
                let dst_start = r * cols + first_col;
                strip[dst_start..dst_start + valid_cols].copy_from_slice(src);
            }
        }

        on_strip(first_row, strip)?;
    }

    Ok(())
}

/// An in-memory raster with a configurable block size.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    cols: usize,
    rows: usize,
    data_type: DataType,
    geo_transform: GeoTransform,
    layer_name: Option<String>,
    block_size: (usize, usize),
    values: Vec<Option<Cell>>,
}

impl MemoryRaster {
    /// Create a raster from row-major values; blocks default to one scanline.
    pub fn new(
        cols: usize,
        rows: usize,
        data_type: DataType,
        geo_transform: GeoTransform,
        values: Vec<Option<Cell>>,
    ) -> Result<Self> {
        let expected = cols.checked_mul(rows).ok_or_else(|| {
            ArgError::unsupported(format!("raster size {cols}x{rows} is too large"))
        })?;
        if values.len() != expected {
            return Err(ArgError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }

        Ok(Self {
            cols,
            rows,
            data_type,
            geo_transform,
            layer_name: None,
            block_size: (cols, 1),
            values,
        })
    }

    /// Read a whole source into memory, keeping its block size.
    pub fn from_source<S: RasterSource + ?Sized>(source: &S) -> Result<Self> {
        let (cols, rows) = source.size();
        let mut values = Vec::with_capacity(cols * rows);
        for_each_strip(source, |_, strip| {
            values.extend(strip);
            Ok(())
        })?;

        Ok(Self {
            cols,
            rows,
            data_type: source.data_type(),
            geo_transform: source.geo_transform(),
            layer_name: source.layer_name(),
            block_size: source.block_size(),
            values,
        })
    }

    pub fn with_block_size(mut self, block_cols: usize, block_rows: usize) -> Self {
        self.block_size = (block_cols, block_rows);
        self
    }

    pub fn with_layer_name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = Some(name.into());
        self
    }

    pub fn values(&self) -> &[Option<Cell>] {
        &self.values
    }
}

impl RasterSource for MemoryRaster {
    fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn layer_name(&self) -> Option<String> {
        self.layer_name.clone()
    }

    fn block_size(&self) -> (usize, usize) {
        self.block_size
    }

    fn read_block(&self, block_col: usize, block_row: usize) -> Result<Vec<Option<Cell>>> {
        let (block_cols, block_rows) = self.block_size;
        let block_len = block_cols.checked_mul(block_rows).ok_or_else(|| {
            ArgError::unsupported(format!("block size {block_cols}x{block_rows} is too large"))
        })?;

        let first_col = block_col.checked_mul(block_cols).unwrap_or(usize::MAX);
        let first_row = block_row.checked_mul(block_rows).unwrap_or(usize::MAX);
        if first_col >= self.cols || first_row >= self.rows {
            return Err(ArgError::unsupported(format!(
                "block ({block_col}, {block_row}) is outside a {}x{} raster",
                self.cols, self.rows
            )));
        }

        // Overhanging cells stay absent.
        let mut block = vec![None; block_len];
        let valid_cols = block_cols.min(self.cols - first_col);
        let valid_rows = block_rows.min(self.rows - first_row);
        for r in 0..valid_rows {
            let src_start = (first_row + r) * self.cols + first_col;
            block[r * block_cols..r * block_cols + valid_cols]
                .copy_from_slice(&self.values[src_start..src_start + valid_cols]);
        }

        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(cols: usize, rows: usize) -> MemoryRaster {
        let values = (0..cols * rows)
            .map(|i| Some(Cell::Unsigned(i as u64)))
            .collect();
        MemoryRaster::new(
            cols,
            rows,
            DataType::UInt16,
            GeoTransform::north_up(0.0, rows as f64, 1.0, 1.0),
            values,
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch() {
        let err = MemoryRaster::new(
            2,
            2,
            DataType::UInt8,
            GeoTransform::default(),
            vec![None; 3],
        )
        .unwrap_err();
        assert!(matches!(err, ArgError::ShapeMismatch { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_edge_block_overhang() {
        let raster = numbered(5, 3).with_block_size(2, 2);
        let corner = raster.read_block(2, 1).unwrap();
        assert_eq!(corner, vec![Some(Cell::Unsigned(14)), None, None, None]);
        assert!(raster.read_block(3, 0).is_err());
    }

    #[test]
    fn test_strips_reassemble_raster() {
        let raster = numbered(7, 5);
        for (bw, bh) in [(7, 1), (3, 2), (25, 25), (1, 5), (4, 4)] {
            let blocked = raster.clone().with_block_size(bw, bh);
            let mut rows_seen = Vec::new();
            let copy = MemoryRaster::from_source(&blocked).unwrap();
            for_each_strip(&blocked, |first_row, strip| {
                rows_seen.push((first_row, strip.len() / 7));
                Ok(())
            })
            .unwrap();

            assert_eq!(copy.values(), raster.values(), "block {bw}x{bh}");
            assert_eq!(rows_seen.iter().map(|(_, n)| n).sum::<usize>(), 5);
        }
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let raster = numbered(2, 2).with_block_size(0, 1);
        assert!(for_each_strip(&raster, |_, _| Ok(())).is_err());
    }

    #[test]
    fn test_oversized_block_rejected() {
        let raster = numbered(20, 20).with_block_size(usize::MAX, 2);
        assert!(matches!(
            for_each_strip(&raster, |_, _| Ok(())),
            Err(ArgError::Unsupported(_))
        ));
        assert!(matches!(raster.read_block(0, 0), Err(ArgError::Unsupported(_))));
    }
}
