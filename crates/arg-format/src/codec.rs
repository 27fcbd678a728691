//! Big-endian cell codec for ARG payloads.
//!
//! A payload is the plain concatenation of `rows * cols` fixed-width
//! big-endian cells in row-major order, with no header or padding.
//! Absent cells are written as the type's nodata sentinel and any cell equal
//! to the sentinel reads back as absent. For float types every NaN bit
//! pattern counts as absent, not only the one written by `encode`.
//!
//! Out-of-range values are rejected rather than wrapped, so that anything
//! `encode` accepts reads back unchanged (except values equal to the
//! sentinel, which are indistinguishable from absent cells).

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ArgError, Result};
use crate::types::{Cell, DataType};

/// Encode cells into a payload of exactly `values.len() * width` bytes.
pub fn encode(data_type: DataType, values: &[Option<Cell>]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(values.len() * data_type.byte_width());
    encode_into(data_type, values, 0, &mut buf)?;
    Ok(buf.freeze())
}

/// Append encoded cells to `buf`.
///
/// `first_index` is the grid index of `values[0]`, used in error reports when
/// a grid is encoded in pieces. On error `buf` is left at its original length.
pub fn encode_into(
    data_type: DataType,
    values: &[Option<Cell>],
    first_index: usize,
    buf: &mut BytesMut,
) -> Result<()> {
    let start = buf.len();
    buf.reserve(values.len() * data_type.byte_width());

    for (offset, value) in values.iter().enumerate() {
        let cell = value.unwrap_or_else(|| data_type.nodata_sentinel());
        if put_cell(buf, data_type, cell).is_none() {
            buf.truncate(start);
            return Err(ArgError::value_range(first_index + offset, cell, data_type));
        }
    }

    Ok(())
}

macro_rules! read_cells {
    ($reader:ident, $count:expr, $get:ident, $variant:ident, |$v:ident| $is_nodata:expr) => {
        (0..$count)
            .map(|_| {
                let $v = $reader.$get();
                if $is_nodata {
                    None
                } else {
                    Some(Cell::$variant($v.into()))
                }
            })
            .collect()
    };
}

/// Decode a payload of exactly `cell_count` cells.
pub fn decode(data_type: DataType, payload: &[u8], cell_count: usize) -> Result<Vec<Option<Cell>>> {
    let expected = cell_count
        .checked_mul(data_type.byte_width())
        .unwrap_or(usize::MAX);
    if payload.len() != expected {
        return Err(ArgError::TruncatedData {
            expected,
            actual: payload.len(),
        });
    }

    let mut reader = payload;
    let cells: Vec<Option<Cell>> = match data_type {
        DataType::Int8 => read_cells!(reader, cell_count, get_i8, Signed, |v| v == i8::MIN),
        DataType::Int16 => read_cells!(reader, cell_count, get_i16, Signed, |v| v == i16::MIN),
        DataType::Int32 => read_cells!(reader, cell_count, get_i32, Signed, |v| v == i32::MIN),
        DataType::Int64 => read_cells!(reader, cell_count, get_i64, Signed, |v| v == i64::MIN),
        DataType::UInt8 => read_cells!(reader, cell_count, get_u8, Unsigned, |v| v == u8::MAX),
        DataType::UInt16 => read_cells!(reader, cell_count, get_u16, Unsigned, |v| v == u16::MAX),
        DataType::UInt32 => read_cells!(reader, cell_count, get_u32, Unsigned, |v| v == u32::MAX),
        DataType::UInt64 => read_cells!(reader, cell_count, get_u64, Unsigned, |v| v == u64::MAX),
        DataType::Float32 => read_cells!(reader, cell_count, get_f32, Float, |v| v.is_nan()),
        DataType::Float64 => read_cells!(reader, cell_count, get_f64, Float, |v| v.is_nan()),
    };

    Ok(cells)
}

/// Write one cell, or `None` if it does not fit `data_type`.
fn put_cell(buf: &mut BytesMut, data_type: DataType, cell: Cell) -> Option<()> {
    match data_type {
        DataType::Int8 => buf.put_i8(i8::try_from(as_signed(cell)?).ok()?),
        DataType::Int16 => buf.put_i16(i16::try_from(as_signed(cell)?).ok()?),
        DataType::Int32 => buf.put_i32(i32::try_from(as_signed(cell)?).ok()?),
        DataType::Int64 => buf.put_i64(as_signed(cell)?),
        DataType::UInt8 => buf.put_u8(u8::try_from(as_unsigned(cell)?).ok()?),
        DataType::UInt16 => buf.put_u16(u16::try_from(as_unsigned(cell)?).ok()?),
        DataType::UInt32 => buf.put_u32(u32::try_from(as_unsigned(cell)?).ok()?),
        DataType::UInt64 => buf.put_u64(as_unsigned(cell)?),
        DataType::Float32 => buf.put_f32(as_f32(cell)?),
        DataType::Float64 => buf.put_f64(cell.as_f64()),
    }
    Some(())
}

// 2^63 and 2^64 are exact in f64.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn as_signed(cell: Cell) -> Option<i64> {
    match cell {
        Cell::Signed(v) => Some(v),
        Cell::Unsigned(v) => i64::try_from(v).ok(),
        Cell::Float(v) if v.fract() == 0.0 && v >= -TWO_POW_63 && v < TWO_POW_63 => Some(v as i64),
        Cell::Float(_) => None,
    }
}

fn as_unsigned(cell: Cell) -> Option<u64> {
    match cell {
        Cell::Signed(v) => u64::try_from(v).ok(),
        Cell::Unsigned(v) => Some(v),
        Cell::Float(v) if v.fract() == 0.0 && v >= 0.0 && v < TWO_POW_64 => Some(v as u64),
        Cell::Float(_) => None,
    }
}

/// Finite values that round to infinity in f32 are out of range.
fn as_f32(cell: Cell) -> Option<f32> {
    let v = cell.as_f64();
    let narrowed = v as f32;
    if v.is_finite() && narrowed.is_infinite() {
        None
    } else {
        Some(narrowed)
    }
}
