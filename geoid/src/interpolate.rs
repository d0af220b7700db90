//! Bilinear and cubic interpolation within a grid cell.
//!
//! Both schemes work on raw (unscaled) samples and a position `(dx, dy)`
//! inside the cell, where `dx` grows eastward and `dy` grows southward from
//! the cell's north-west node.
//!
//! The cubic scheme evaluates a least-squares cubic fitted to a 12-point
//! stencil around the cell. The fit is fixed: each stencil node carries a
//! row of ten integer coefficients over the basis
//! `[1, x, y, x², xy, y², x³, x²y, xy², y³]` and all weights share the
//! denominator 240. Because it is a fit rather than an interpolant, the
//! cubic surface reproduces any cubic polynomial exactly but does not in
//! general pass through the nodes of an arbitrary grid.

use std::fmt;
use std::str::FromStr;

/// Interpolation scheme used for height queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Four-node bilinear interpolation.
    Bilinear,
    /// Twelve-node least-squares cubic.
    #[default]
    Cubic,
}

impl Interpolation {
    /// Number of grid nodes the scheme samples.
    pub fn stencil_size(&self) -> usize {
        match self {
            Interpolation::Bilinear => BILINEAR_STENCIL.len(),
            Interpolation::Cubic => CUBIC_STENCIL.len(),
        }
    }

    /// Name used on the command line and in the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Bilinear => "bilinear",
            Interpolation::Cubic => "cubic",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bilinear" | "linear" => Ok(Interpolation::Bilinear),
            "cubic" => Ok(Interpolation::Cubic),
            other => Err(format!(
                "unknown interpolation {other:?} (expected \"cubic\" or \"bilinear\")"
            )),
        }
    }
}

/// Cell corners as (row, col) offsets: NW, NE, SW, SE.
pub const BILINEAR_STENCIL: [(isize, isize); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Cubic stencil as (row, col) offsets from the cell's north-west node.
///
/// The order matches the rows of [`CUBIC_COEFFICIENTS`].
pub const CUBIC_STENCIL: [(isize, isize); 12] = [
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (0, 2),
    (1, -1),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, 0),
    (2, 1),
];

/// Common denominator of the cubic weights.
pub const CUBIC_DENOMINATOR: i32 = 240;

/// Least-squares cubic fit over [`CUBIC_STENCIL`].
///
/// Columns follow the basis `[1, x, y, x², xy, y², x³, x²y, xy², y³]`.
#[rustfmt::skip]
pub const CUBIC_COEFFICIENTS: [[i32; 10]; 12] = [
    [  9, -18, -88,    0,  96,   90,   0,   0, -60, -20],
    [ -9,  18,   8,    0, -96,   30,   0,   0,  60, -20],
    [  9, -88, -18,   90,  96,    0, -20, -60,   0,   0],
    [186, -42, -42, -150, -96, -150,  60,  60,  60,  60],
    [ 54, 162, -78,   30, -24,  -90, -60,  60, -60,  60],
    [ -9, -32,  18,   30,  24,    0,  20, -60,   0,   0],
    [ -9,   8,  18,   30, -96,    0, -20,  60,   0,   0],
    [ 54, -78, 162,  -90, -24,   30,  60, -60,  60, -60],
    [-54,  78,  78,   90, 144,   90, -60, -60, -60, -60],
    [  9,  -8, -18,  -30, -24,    0,  20,  60,   0,   0],
    [ -9,  18, -32,    0,  24,   30,   0,   0, -60,  20],
    [  9, -18,  -8,    0, -24,  -30,   0,   0,  60,  20],
];

/// Bilinear interpolation of the corners `[nw, ne, sw, se]`.
pub fn bilinear(corners: &[f64; 4], dx: f64, dy: f64) -> f64 {
    let [nw, ne, sw, se] = *corners;
    let north = (1.0 - dx) * nw + dx * ne;
    let south = (1.0 - dx) * sw + dx * se;
    (1.0 - dy) * north + dy * south
}

/// Polynomial basis `[1, x, y, x², xy, y², x³, x²y, xy², y³]`.
fn cubic_basis(x: f64, y: f64) -> [f64; 10] {
    [
        1.0,
        x,
        y,
        x * x,
        x * y,
        y * y,
        x * x * x,
        x * x * y,
        x * y * y,
        y * y * y,
    ]
}

/// Weights of the twelve stencil nodes at `(dx, dy)`; they sum to 1.
pub fn cubic_weights(dx: f64, dy: f64) -> [f64; 12] {
    let basis = cubic_basis(dx, dy);
    let denominator = f64::from(CUBIC_DENOMINATOR);

    let mut weights = [0.0; 12];
    for (weight, coefficients) in weights.iter_mut().zip(CUBIC_COEFFICIENTS.iter()) {
        let dot: f64 = coefficients
            .iter()
            .zip(basis.iter())
            .map(|(&c, &b)| f64::from(c) * b)
            .sum();
        *weight = dot / denominator;
    }
    weights
}

/// Cubic interpolation of the twelve stencil samples, ordered as
/// [`CUBIC_STENCIL`].
pub fn cubic(samples: &[f64; 12], dx: f64, dy: f64) -> f64 {
    let basis = cubic_basis(dx, dy);

    // Sum the integer-weighted terms first and divide once
    let total: f64 = samples
        .iter()
        .zip(CUBIC_COEFFICIENTS.iter())
        .map(|(&sample, coefficients)| {
            let dot: f64 = coefficients
                .iter()
                .zip(basis.iter())
                .map(|(&c, &b)| f64::from(c) * b)
                .sum();
            sample * dot
        })
        .sum();

    total / f64::from(CUBIC_DENOMINATOR)
}
