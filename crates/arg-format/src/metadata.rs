//! The JSON sidecar describing an ARG grid.
//!
//! The sidecar is a flat object:
//!
//! ```text
//! {
//!     "layer": "elevation",
//!     "type": "arg",
//!     "datatype": "int16",
//!     "xmin": 0.0, "ymin": 0.0, "xmax": 2.0, "ymax": 2.0,
//!     "cellwidth": 1.0, "cellheight": 1.0,
//!     "rows": 2, "cols": 2
//! }
//! ```
//!
//! Parsing checks presence and kind of each key and the range of each value
//! on its own. Bounds that disagree with `rows * cellheight` or
//! `cols * cellwidth` are accepted as-is.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ArgError, Result};
use crate::types::{DataType, GeoTransform};

/// Value of the `type` key.
pub const ARG_TYPE_TAG: &str = "arg";

/// Geometry and cell type of an ARG grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMetadata {
    /// Layer name (`layer`); need not match the file name.
    pub layer_name: String,
    pub data_type: DataType,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub rows: usize,
    pub cols: usize,
}

/// Sidecar as it appears on disk, before tag and range checks.
#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    layer: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    datatype: String,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    cellwidth: f64,
    cellheight: f64,
    rows: u64,
    cols: u64,
}

impl GridMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        layer_name: impl Into<String>,
        data_type: DataType,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        cell_width: f64,
        cell_height: f64,
        rows: usize,
        cols: usize,
    ) -> Self {
        Self {
            layer_name: layer_name.into(),
            data_type,
            xmin,
            ymin,
            xmax,
            ymax,
            cell_width,
            cell_height,
            rows,
            cols,
        }
    }

    /// Rebuild the descriptor of a `cols` x `rows` grid from a north-up
    /// geotransform. Bounds are derived from the origin and cell size.
    pub fn from_geo_transform(
        layer_name: impl Into<String>,
        data_type: DataType,
        gt: &GeoTransform,
        cols: usize,
        rows: usize,
    ) -> Result<Self> {
        if !gt.is_north_up() {
            return Err(ArgError::unsupported(format!(
                "ARG only stores north-up grids, got geotransform {:?}",
                gt.0
            )));
        }

        let (xmin, ymax) = gt.origin();
        let cell_width = gt.pixel_width();
        let cell_height = -gt.pixel_height();

        Ok(Self {
            layer_name: layer_name.into(),
            data_type,
            xmin,
            ymin: ymax - rows as f64 * cell_height,
            xmax: xmin + cols as f64 * cell_width,
            ymax,
            cell_width,
            cell_height,
            rows,
            cols,
        })
    }

    /// Number of cells in the grid.
    ///
    /// Saturates on overflow; `validate` and `from_json` reject such grids.
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Exact size of the `.arg` payload in bytes.
    pub fn payload_len(&self) -> usize {
        self.checked_payload_len().unwrap_or(usize::MAX)
    }

    fn checked_payload_len(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.cols)?
            .checked_mul(self.data_type.byte_width())
    }

    /// North-up transform: origin at `(xmin, ymax)`, row 0 is the northernmost.
    pub fn geo_transform(&self) -> GeoTransform {
        GeoTransform::north_up(self.xmin, self.ymax, self.cell_width, self.cell_height)
    }

    /// Reject values the sidecar cannot carry.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ArgError::malformed(format!(
                "rows and cols must be >= 1, got {}x{}",
                self.rows, self.cols
            )));
        }

        if self.checked_payload_len().is_none() {
            return Err(ArgError::malformed(format!(
                "{}x{} {} grid is too large to address",
                self.rows, self.cols, self.data_type
            )));
        }

        let numbers = [
            ("xmin", self.xmin),
            ("ymin", self.ymin),
            ("xmax", self.xmax),
            ("ymax", self.ymax),
            ("cellwidth", self.cell_width),
            ("cellheight", self.cell_height),
        ];
        for (key, value) in numbers {
            if !value.is_finite() {
                return Err(ArgError::malformed(format!("{key} must be finite, got {value}")));
            }
        }

        if self.cell_width <= 0.0 || self.cell_height <= 0.0 {
            return Err(ArgError::malformed(format!(
                "cell size must be positive, got {}x{}",
                self.cell_width, self.cell_height
            )));
        }

        Ok(())
    }

    /// Serialize to the sidecar text.
    ///
    /// Numbers are written as plain decimals, never in exponent form, and
    /// with enough digits to parse back to the same `f64`.
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;

        let layer = serde_json::to_string(&self.layer_name)?;
        Ok(format!(
            "{{\n    \"layer\": {layer},\n    \"type\": \"{ARG_TYPE_TAG}\",\n    \"datatype\": \"{}\",\n    \"xmin\": {},\n    \"ymin\": {},\n    \"xmax\": {},\n    \"ymax\": {},\n    \"cellwidth\": {},\n    \"cellheight\": {},\n    \"rows\": {},\n    \"cols\": {}\n}}\n",
            self.data_type,
            format_decimal(self.xmin),
            format_decimal(self.ymin),
            format_decimal(self.xmax),
            format_decimal(self.ymax),
            format_decimal(self.cell_width),
            format_decimal(self.cell_height),
            self.rows,
            self.cols,
        ))
    }

    /// Parse sidecar text.
    ///
    /// Each value is checked on its own (dimensions >= 1, positive finite
    /// cell size, addressable payload); fields are not cross-checked.
    /// A missing `layer` yields an empty layer name; callers that know the
    /// file name substitute its stem.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawMetadata = serde_json::from_str(text)?;

        if raw.kind != ARG_TYPE_TAG {
            return Err(ArgError::malformed(format!(
                "type must be \"{ARG_TYPE_TAG}\", got \"{}\"",
                raw.kind
            )));
        }

        let data_type: DataType = raw.datatype.parse()?;
        let rows = to_dimension("rows", raw.rows)?;
        let cols = to_dimension("cols", raw.cols)?;

        let meta = Self {
            layer_name: raw.layer.unwrap_or_default(),
            data_type,
            xmin: raw.xmin,
            ymin: raw.ymin,
            xmax: raw.xmax,
            ymax: raw.ymax,
            cell_width: raw.cellwidth,
            cell_height: raw.cellheight,
            rows,
            cols,
        };

        meta.validate()?;
        meta.warn_if_inconsistent();
        debug!(
            layer = %meta.layer_name,
            datatype = %meta.data_type,
            rows = meta.rows,
            cols = meta.cols,
            "Parsed ARG metadata"
        );

        Ok(meta)
    }

    fn warn_if_inconsistent(&self) {
        let tolerance = 1e-6;
        let width = self.cols as f64 * self.cell_width;
        let height = self.rows as f64 * self.cell_height;

        if ((self.xmax - self.xmin) - width).abs() > tolerance
            || ((self.ymax - self.ymin) - height).abs() > tolerance
        {
            warn!(
                layer = %self.layer_name,
                xmin = self.xmin,
                xmax = self.xmax,
                ymin = self.ymin,
                ymax = self.ymax,
                rows = self.rows,
                cols = self.cols,
                "ARG bounds disagree with rows/cols and cell size; using metadata as-is"
            );
        }
    }
}

fn to_dimension(key: &str, value: u64) -> Result<usize> {
    if value == 0 {
        return Err(ArgError::malformed(format!("{key} must be >= 1")));
    }
    usize::try_from(value).map_err(|_| ArgError::malformed(format!("{key} too large: {value}")))
}

/// Shortest round-trip decimal, always with a fractional part.
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
