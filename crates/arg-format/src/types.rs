//! Core types: data type tags, cell values and the geotransform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgError;

/// Cell data type of an ARG payload.
///
/// Every type is stored big-endian with a fixed width and a fixed nodata
/// sentinel: the minimum value for signed integers, the maximum value for
/// unsigned integers and NaN for floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DataType {
    /// All supported types, in tag order.
    pub const ALL: [DataType; 10] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// The tag used in the `datatype` key of the sidecar.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Size of one cell in bytes.
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// The cell value written in place of an absent cell.
    pub fn nodata_sentinel(&self) -> Cell {
        match self {
            Self::Int8 => Cell::Signed(i8::MIN as i64),
            Self::Int16 => Cell::Signed(i16::MIN as i64),
            Self::Int32 => Cell::Signed(i32::MIN as i64),
            Self::Int64 => Cell::Signed(i64::MIN),
            Self::UInt8 => Cell::Unsigned(u8::MAX as u64),
            Self::UInt16 => Cell::Unsigned(u16::MAX as u64),
            Self::UInt32 => Cell::Unsigned(u32::MAX as u64),
            Self::UInt64 => Cell::Unsigned(u64::MAX),
            Self::Float32 | Self::Float64 => Cell::Float(f64::NAN),
        }
    }

    /// The nodata value as reported to readers.
    ///
    /// int8 answers `128`: the `-128` sentinel byte read as unsigned.
    pub fn nodata_value(&self) -> f64 {
        match self {
            Self::Int8 => (i8::MIN as u8) as f64,
            _ => self.nodata_sentinel().as_f64(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| ArgError::UnsupportedType(s.to_string()))
    }
}

/// A present cell value.
///
/// Decoding yields `Signed` for intN, `Unsigned` for uintN and `Float` for
/// floatN. Encoding accepts any variant that is exactly representable in the
/// target type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Cell {
    /// Lossy conversion to `f64` (64-bit integers above 2^53 round).
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Signed(v) => v as f64,
            Self::Unsigned(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_cell_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Cell {
                fn from(v: $source) -> Self {
                    Cell::$variant(v as $target)
                }
            }
        )+
    };
}

impl_cell_from!(Signed, i64, i8, i16, i32, i64);
impl_cell_from!(Unsigned, u64, u8, u16, u32, u64);
impl_cell_from!(Float, f64, f32, f64);

/// Six-coefficient affine transform from pixel to map coordinates:
/// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Build a north-up transform from the top-left corner and cell size.
    pub fn north_up(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self([origin_x, cell_width, 0.0, origin_y, 0.0, -cell_height])
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    /// Negative for north-up rasters.
    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    /// No rotation terms and rows running north to south.
    pub fn is_north_up(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0 && self.0[1] > 0.0 && self.0[5] < 0.0
    }

    /// Map coordinates of the top-left corner of pixel `(col, row)`.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_tags() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
            assert_eq!(dt.to_string(), dt.as_str());
        }
        assert!(matches!(
            "complex64".parse::<DataType>(),
            Err(ArgError::UnsupportedType(tag)) if tag == "complex64"
        ));
        // Tags are case-sensitive.
        assert!("INT16".parse::<DataType>().is_err());
    }

    #[test]
    fn test_byte_widths() {
        assert_eq!(DataType::Int8.byte_width(), 1);
        assert_eq!(DataType::UInt16.byte_width(), 2);
        assert_eq!(DataType::Float32.byte_width(), 4);
        assert_eq!(DataType::Int64.byte_width(), 8);
        assert_eq!(DataType::Float64.byte_width(), 8);
    }

    #[test]
    fn test_nodata_values() {
        assert_eq!(DataType::Int8.nodata_sentinel(), Cell::Signed(-128));
        assert_eq!(DataType::Int8.nodata_value(), 128.0);
        assert_eq!(DataType::Int16.nodata_value(), -32768.0);
        assert_eq!(DataType::Int32.nodata_value(), -2147483648.0);
        assert_eq!(DataType::UInt8.nodata_value(), 255.0);
        assert_eq!(DataType::UInt32.nodata_value(), 4294967295.0);
        assert_eq!(DataType::UInt64.nodata_sentinel(), Cell::Unsigned(u64::MAX));
        assert!(DataType::Float32.nodata_value().is_nan());
        assert!(DataType::Float64.nodata_value().is_nan());
    }

    #[test]
    fn test_cell_from() {
        assert_eq!(Cell::from(-3i16), Cell::Signed(-3));
        assert_eq!(Cell::from(4u8), Cell::Unsigned(4));
        assert_eq!(Cell::from(1.5f32), Cell::Float(1.5));
        assert_eq!(Cell::Unsigned(7).as_f64(), 7.0);
    }

    #[test]
    fn test_geo_transform() {
        let gt = GeoTransform::north_up(0.0, 2.0, 1.0, 1.0);
        assert_eq!(gt.0, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]);
        assert!(gt.is_north_up());
        assert_eq!(gt.pixel_to_geo(1.0, 1.0), (1.0, 1.0));
        assert_eq!(gt.pixel_to_geo(2.0, 2.0), (2.0, 0.0));

        let rotated = GeoTransform([0.0, 1.0, 0.1, 2.0, 0.0, -1.0]);
        assert!(!rotated.is_north_up());
        assert!(!GeoTransform::default().is_north_up());
    }
}
