use anyhow::{Context, Result};
use geoid::{GeoidGrid, Interpolation};
use serde::Serialize;
use std::path::PathBuf;

use super::{print_grid_info, GridSource};

#[derive(Serialize)]
struct QueryResponse {
    grid: PathBuf,
    width: usize,
    height: usize,
    offset: f64,
    scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    point: Option<PointHeights>,
}

#[derive(Serialize)]
struct PointHeights {
    lat: f64,
    lon: f64,
    cubic: f64,
    bilinear: f64,
}

pub fn run(source: &GridSource, point: Option<(f64, f64)>, json: bool) -> Result<()> {
    let (path, mut grid) = source.open()?;

    let heights = point
        .map(|(lat, lon)| query_point(&mut grid, lat, lon))
        .transpose()?;

    if json {
        let info = grid.info();
        let response = QueryResponse {
            grid: path,
            width: info.width,
            height: info.height,
            offset: info.offset,
            scale: info.scale,
            point: heights,
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    print_grid_info(&path, &grid);
    if let Some(heights) = heights {
        println!();
        println!("Point: {}, {}", heights.lat, heights.lon);
        println!("Cubic:    {:.4} m", heights.cubic);
        println!("Bilinear: {:.4} m", heights.bilinear);
    }

    Ok(())
}

fn query_point(grid: &mut GeoidGrid, lat: f64, lon: f64) -> Result<PointHeights> {
    let cubic = grid
        .height(lat, lon, Interpolation::Cubic)
        .context("Failed to compute cubic geoid height")?;
    let bilinear = grid
        .height(lat, lon, Interpolation::Bilinear)
        .context("Failed to compute bilinear geoid height")?;
    Ok(PointHeights {
        lat,
        lon,
        cubic,
        bilinear,
    })
}
