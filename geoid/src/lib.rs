//! # Geoid - Geoid Undulation Library
//!
//! Memory-efficient library for looking up the height of the geoid above the
//! WGS84 ellipsoid from global grids stored as 16-bit PGM images (the
//! `egm84-15.pgm`, `egm96-5.pgm` and `egm2008-1.pgm` family of files).
//!
//! ## Features
//!
//! - **Bounded memory**: rows are read on demand and kept in a small LRU cache
//! - **Two schemes**: bilinear and 12-point least-squares cubic interpolation
//! - **Global**: longitudes wrap around the antimeridian, poles are clamped
//! - **Offline**: works with local grid files, no internet required
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoid::{GeoidGrid, Interpolation};
//!
//! let mut grid = GeoidGrid::open("/usr/share/GeographicLib/geoids/egm96-5.pgm")?;
//! let n = grid.height(16.775833, -3.009444, Interpolation::Cubic)?;
//! println!("Geoid height: {:.4}m", n); // 28.7068
//!
//! // Orthometric height from an ellipsoidal GPS height
//! let orthometric = 300.0 - n;
//! ```
//!
//! ## Grid Format
//!
//! Each file is a binary PGM (`P5`) image with 16-bit big-endian samples.
//! Header comments carry the calibration:
//!
//! ```text
//! P5
//! # Offset -108
//! # Scale 0.003
//! 4320 2161
//! 65535
//! ```
//!
//! The geoid height is `offset + scale * sample`. Row 0 lies on 90°N and the
//! last row on 90°S; column 0 lies on the prime meridian and columns wrap
//! around at 360°.
//!
//! ## Data Sources
//!
//! Grid files are distributed by GeographicLib:
//! - <https://geographiclib.sourceforge.io/C++/doc/geoid.html>

pub mod error;
pub mod geometry;
pub mod grid;
pub mod header;
pub mod interpolate;
pub mod row_cache;
pub mod service;

// Re-export main types at crate root for convenience
pub use error::{GeoidError, Result};
pub use grid::{GeoidGrid, GridInfo};
pub use header::{GridHeader, GridMetadata};
pub use interpolate::Interpolation;
pub use row_cache::{CacheStats, DEFAULT_CACHE_ROWS, MIN_CACHE_ROWS};
pub use service::{
    GeoidService, GeoidServiceBuilder, PreloadStats, DEFAULT_GRID_CACHE_SIZE, DEFAULT_MODEL,
};
