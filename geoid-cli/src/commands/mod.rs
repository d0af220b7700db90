pub mod batch;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{bail, Context, Result};
use geoid::GeoidGrid;
use std::path::PathBuf;

/// Where the grid comes from: an explicit file, or a model in a directory.
pub struct GridSource {
    pub grid: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub model: String,
    pub cache_rows: usize,
}

impl GridSource {
    /// Path of the grid file to open.
    pub fn path(&self) -> Result<PathBuf> {
        match (&self.grid, &self.data_dir) {
            (Some(grid), _) => Ok(grid.clone()),
            (None, Some(dir)) => Ok(dir.join(format!("{}.pgm", self.model))),
            (None, None) => bail!(
                "No geoid grid given. Use --grid <FILE>, or --data-dir with --model \
                 (GEOID_GRID / GEOID_DATA_DIR)"
            ),
        }
    }

    /// Open the grid.
    pub fn open(&self) -> Result<(PathBuf, GeoidGrid)> {
        let path = self.path()?;
        let grid = GeoidGrid::open_with_cache(&path, self.cache_rows)
            .with_context(|| format!("Failed to open geoid grid {}", path.display()))?;
        Ok((path, grid))
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Print grid geometry, calibration and header metadata.
pub fn print_grid_info(path: &std::path::Path, grid: &GeoidGrid) {
    let info = grid.info();
    let metadata = grid.metadata();

    println!("Grid: {}", path.display());
    if let Some(description) = &metadata.description {
        println!("Description: {}", description);
    }
    println!("Size: {}x{} samples", info.width, info.height);
    println!(
        "Resolution: {:.6}° lat x {:.6}° lon",
        info.lat_res, info.lon_res
    );
    println!("Offset: {}", info.offset);
    println!("Scale: {}", info.scale);
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(grid: Option<&str>, data_dir: Option<&str>) -> GridSource {
        GridSource {
            grid: grid.map(PathBuf::from),
            data_dir: data_dir.map(PathBuf::from),
            model: "egm96-5".to_string(),
            cache_rows: 16,
        }
    }

    #[test]
    fn test_grid_path_takes_precedence() {
        let source = source(Some("/tmp/custom.pgm"), Some("/data"));
        assert_eq!(source.path().unwrap(), PathBuf::from("/tmp/custom.pgm"));
    }

    #[test]
    fn test_model_in_data_dir() {
        let source = source(None, Some("/data"));
        assert_eq!(source.path().unwrap(), PathBuf::from("/data/egm96-5.pgm"));
    }

    #[test]
    fn test_missing_grid_is_error() {
        let source = source(None, None);
        let err = source.path().unwrap_err();
        assert!(err.to_string().contains("No geoid grid given"));
    }

    #[test]
    fn test_open() {
        let dir = TempDir::new().unwrap();
        test_support::create_test_grid(dir.path(), "egm96-5", 12000);

        let source = source(None, dir.path().to_str());
        let (path, grid) = source.open().unwrap();
        assert!(path.ends_with("egm96-5.pgm"));
        assert_eq!(grid.info().width, 121);
    }

    #[test]
    fn test_open_missing_file_has_context() {
        let source = source(Some("/nonexistent/egm96-5.pgm"), None);
        let err = source.open().unwrap_err();
        assert!(err.to_string().contains("Failed to open geoid grid"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(18_671_144), "17.81 MB");
    }
}
