//! ARG raster format support.
//!
//! An ARG dataset is a pair of files:
//!
//! - `name.arg`: `rows * cols` fixed-width big-endian cells, row-major,
//!   top row first, with no header
//! - `name.json`: the sidecar with layer name, data type, bounds, cell
//!   size and dimensions
//!
//! # Architecture
//!
//! ```text
//! .json text ──► GridMetadata::from_json ──┐
//!                                          ├──► ArgDataset (values + geotransform)
//! .arg bytes ──► codec::decode ────────────┘
//!
//! RasterSource (blocks) ──► ArgDataset::create_copy ──► codec::encode_into ──► .arg
//!                                                   └──► GridMetadata::to_json ──► .json
//! ```
//!
//! [`metadata`] and [`codec`] are pure and never touch the filesystem;
//! [`dataset`] is the thin file layer on top.
//!
//! # Example
//!
//! ```ignore
//! use arg_format::{ArgConfig, ArgDataset, Cell, DataType, GridMetadata};
//!
//! let meta = GridMetadata::new("dem", DataType::Int16, 0.0, 0.0, 2.0, 2.0, 1.0, 1.0, 2, 2);
//! let values = vec![None, Some(Cell::Signed(2)), Some(Cell::Signed(-3)), Some(Cell::Signed(-4))];
//! ArgDataset::create("dem.arg", meta, values, &ArgConfig::default())?;
//!
//! let ds = ArgDataset::open("dem.arg")?;
//! assert_eq!(ds.geo_transform().0, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]);
//! ```

pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metadata;
pub mod source;
pub mod testdata;
pub mod types;

// Re-export commonly used types at crate root
pub use codec::{decode, encode};
pub use config::ArgConfig;
pub use dataset::{identify, sidecar_path, ArgDataset, LAYER_ITEM};
pub use error::{ArgError, Result};
pub use metadata::GridMetadata;
pub use source::{MemoryRaster, RasterSource};
pub use types::{Cell, DataType, GeoTransform};
