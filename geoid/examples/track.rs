//! Convert ellipsoidal GPS heights along a track to orthometric heights.
//!
//! Run with: cargo run --example track -- /path/to/egm96-5.pgm

use geoid::{GeoidError, GeoidGrid, Interpolation};
use std::env;

fn main() -> Result<(), GeoidError> {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example track -- /path/to/grid.pgm");
        std::process::exit(1);
    });

    // A short track with heights above the WGS84 ellipsoid
    let track = [
        (46.5197, 6.6323, 420.0),
        (46.5300, 6.6500, 455.5),
        (46.5450, 6.6800, 512.3),
        (46.5600, 6.7100, 603.9),
    ];

    let mut grid = GeoidGrid::open_with_cache(&path, 8)?;
    let info = grid.info();
    println!(
        "Grid {}x{} ({:.4}° x {:.4}°)",
        info.width, info.height, info.lat_res, info.lon_res
    );

    println!("{:>10} {:>10} {:>10} {:>10} {:>10}", "lat", "lon", "h", "N", "H");
    for (lat, lon, h) in &track {
        let n = grid.height(*lat, *lon, Interpolation::Cubic)?;
        println!(
            "{:>10.4} {:>10.4} {:>10.2} {:>10.3} {:>10.2}",
            lat,
            lon,
            h,
            n,
            h - n
        );
    }

    let stats = grid.cache_stats();
    println!(
        "\nRow cache: {} rows, {:.1}% hit rate",
        stats.entry_count,
        stats.hit_rate() * 100.0
    );

    Ok(())
}
