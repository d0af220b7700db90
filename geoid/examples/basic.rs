//! Basic example demonstrating geoid library usage.
//!
//! Run with: cargo run --example basic -- /path/to/geoids

use geoid::{GeoidError, GeoidService, Interpolation};
use std::env;

fn main() -> Result<(), GeoidError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/geoids");
        std::process::exit(1);
    });

    let service = GeoidService::new(&data_dir, 4);

    let models = service.list_models();
    if models.is_empty() {
        println!("No .pgm grids found in {}", data_dir);
        return Ok(());
    }

    let locations = [
        ("Timbuktu, Mali", 16.775833, -3.009444),
        ("Greenwich, UK", 51.477928, -0.001545),
        ("Mount Everest, Nepal", 27.9881, 86.9250),
    ];

    for model in &models {
        println!("\n{} (cubic / bilinear):", model);
        println!("{:-<50}", "");

        for (name, lat, lon) in &locations {
            let cubic = service.height(model, *lat, *lon, Interpolation::Cubic);
            let bilinear = service.height(model, *lat, *lon, Interpolation::Bilinear);
            match (cubic, bilinear) {
                (Ok(c), Ok(b)) => println!("{}: {:.4}m / {:.4}m", name, c, b),
                (Err(e), _) | (_, Err(e)) => println!("{}: error - {}", name, e),
            }
        }
    }

    // Show cache statistics
    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Open grids: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
