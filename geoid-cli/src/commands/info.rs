use anyhow::Result;

use super::{format_size, print_grid_info, GridSource};

pub fn run(source: &GridSource) -> Result<()> {
    let (path, grid) = source.open()?;
    let file_size = std::fs::metadata(&path)?.len();

    print_grid_info(&path, &grid);
    println!("File size: {}", format_size(file_size));
    println!("Row cache: {} rows", grid.cache_capacity());

    let metadata = grid.metadata();
    if let Some(url) = &metadata.url {
        println!("URL: {}", url);
    }
    if let Some(date_time) = &metadata.date_time {
        println!("Date: {}", date_time);
    }

    let errors = [
        ("Max bilinear error", metadata.max_bilinear_error),
        ("RMS bilinear error", metadata.rms_bilinear_error),
        ("Max cubic error", metadata.max_cubic_error),
        ("RMS cubic error", metadata.rms_cubic_error),
    ];
    if errors.iter().any(|(_, value)| value.is_some()) {
        println!();
        for (label, value) in errors {
            if let Some(value) = value {
                println!("{}: {:.3} m", label, value);
            }
        }
    }

    Ok(())
}
