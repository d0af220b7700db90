use anyhow::{bail, Context, Result};
use geoid::GeoidService;
use std::path::PathBuf;

use super::format_size;

pub fn run(data_dir: Option<PathBuf>) -> Result<()> {
    let dir = data_dir
        .context("No data directory given. Use --data-dir or set GEOID_DATA_DIR")?;

    if !dir.exists() {
        bail!("Data directory does not exist: {}", dir.display());
    }

    // Grids are only opened long enough to read their headers
    let service = GeoidService::new(&dir, 1);
    let models = service.list_models();

    if models.is_empty() {
        println!("No .pgm files found in: {}", dir.display());
        return Ok(());
    }

    println!(
        "{:<16} {:>12} {:>14} {:>12}",
        "MODEL", "SIZE", "RESOLUTION", "FILE"
    );
    println!("{}", "-".repeat(57));

    let mut total_size: u64 = 0;
    let mut unreadable = 0;

    for model in &models {
        let path = service.model_path(model)?;
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        total_size += size;

        match service.info(model) {
            Ok(info) => {
                let minutes = info.lat_res * 60.0;
                println!(
                    "{:<16} {:>12} {:>13.2}' {:>12}",
                    model,
                    format!("{}x{}", info.width, info.height),
                    minutes,
                    format_size(size)
                );
            }
            Err(e) => {
                unreadable += 1;
                println!("{:<16} {:>12} {:>14} {:>12}", model, "???", e, format_size(size));
            }
        }
        service.invalidate_model(model);
    }

    // Summary
    println!();
    println!("Summary:");
    println!("  Total models: {}", models.len());
    if unreadable > 0 {
        println!("  Unreadable: {}", unreadable);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}
