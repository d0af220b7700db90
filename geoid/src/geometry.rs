//! Mapping between geographic coordinates and grid coordinates.
//!
//! Row 0 / column 0 is the node at 90°N, 0°E. Rows increase southward and
//! columns increase eastward; the last row lies on 90°S, while columns wrap
//! around at 360°.

/// Resolution constants derived once from the grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Degrees of latitude per row, `180 / (height - 1)`.
    pub lat_res: f64,
    /// Degrees of longitude per column, `360 / width`.
    pub lon_res: f64,
}

/// The cell containing a query point and the position inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPosition {
    /// Northern row of the cell, within `[0, height - 2]`.
    pub row: isize,
    /// Western column of the cell; the pixel accessor wraps it.
    pub col: isize,
    /// Eastward fraction within the cell.
    pub dx: f64,
    /// Southward fraction within the cell.
    pub dy: f64,
}

impl GridGeometry {
    /// Derive the resolution of a `width` × `height` global grid.
    ///
    /// `height` must be at least 2; the header parser guarantees it.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            lat_res: 180.0 / (height - 1) as f64,
            lon_res: 360.0 / width as f64,
        }
    }

    /// Locate the cell containing `(lat, lon)`.
    ///
    /// Longitude is normalized into `[0, 360)`. Latitudes beyond the poles
    /// are pinned to the pole rows. The row is clamped into `[0, height - 2]`
    /// so that the southern edge of the cell always exists; neighbours
    /// further out are clamped again by the pixel accessor.
    pub fn locate(&self, lat: f64, lon: f64) -> CellPosition {
        let lon = normalize_longitude(lon);

        let max_row = self.height as isize - 2;
        let fy = ((90.0 - lat) / self.lat_res).clamp(0.0, (max_row + 1) as f64);
        let fx = lon / self.lon_res;

        // The fraction is taken against the clamped row, so the south pole
        // resolves to dy = 1 on the last cell rather than past the grid.
        let row = (fy.floor() as isize).clamp(0, max_row);
        let col = fx.floor() as isize;

        CellPosition {
            row,
            col,
            dx: fx - col as f64,
            dy: fy - row as f64,
        }
    }
}

/// Normalize a longitude into `[0, 360)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let lon = lon % 360.0;
    if lon < 0.0 {
        // -1e-20 % 360 + 360 rounds to exactly 360
        let wrapped = lon + 360.0;
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    } else {
        lon
    }
}
