use anyhow::{bail, Context, Result};
use geoid::{GeoidGrid, Interpolation};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::GridSource;

/// Column appended to every record.
const HEIGHT_COLUMN: &str = "geoid_height";

pub fn run(
    source: &GridSource,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
    bilinear: bool,
) -> Result<()> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "csv" {
        bail!("Unsupported file format: {}. Use .csv", extension);
    }

    let (_, mut grid) = source.open()?;
    let method = if bilinear {
        Interpolation::Bilinear
    } else {
        Interpolation::Cubic
    };

    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    let count = process_csv(&mut grid, &input, &output_path, lat_col, lon_col, method)?;

    println!(
        "{} rows written to: {}",
        count,
        output_path.display()
    );
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_geoid.csv", stem))
}

fn process_csv(
    grid: &mut GeoidGrid,
    input: &Path,
    output: &Path,
    lat_col: &str,
    lon_col: &str,
    method: Interpolation,
) -> Result<u64> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let total = records.len() as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let output_file = File::create(output).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push(HEIGHT_COLUMN);
    writer.write_record(&new_headers)?;

    for (line, record) in records.iter().enumerate() {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude on data row {}", line + 1))?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude on data row {}", line + 1))?;

        let height = grid
            .height(lat, lon, method)
            .with_context(|| format!("Failed to compute geoid height at {}, {}", lat, lon))?;
        let height = format!("{:.4}", height);

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&height);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    Ok(total)
}
