//! Geoid model service with grid caching.
//!
//! This module provides [`GeoidService`], a high-level interface over a
//! directory of geoid grids (`egm84-15.pgm`, `egm96-5.pgm`,
//! `egm2008-1.pgm`, ...). Grids are opened on first use and kept open in a
//! bounded cache; each cached grid sits behind its own `Mutex`, so the
//! service can be shared between threads while every grid is still used by
//! one query at a time.
//!
//! ```ignore
//! use geoid::{GeoidServiceBuilder, Interpolation};
//!
//! let service = GeoidServiceBuilder::new("/usr/share/GeographicLib/geoids")
//!     .cache_size(2)
//!     .cache_rows(32)
//!     .build();
//!
//! let n = service.height("egm96-5", 16.775833, -3.009444, Interpolation::Cubic)?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use moka::sync::Cache;

use crate::error::{GeoidError, Result};
use crate::grid::{GeoidGrid, GridInfo};
use crate::header::GridMetadata;
use crate::interpolate::Interpolation;
use crate::row_cache::{CacheStats, DEFAULT_CACHE_ROWS};

/// File extension of geoid grids.
pub const GRID_EXTENSION: &str = "pgm";

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "egm96-5";

/// Default number of grids kept open.
pub const DEFAULT_GRID_CACHE_SIZE: u64 = 4;

/// A grid shared between threads.
pub type SharedGrid = Arc<Mutex<GeoidGrid>>;

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of grids opened.
    pub models_loaded: u64,
    /// Number of grids that were already open.
    pub models_already_cached: u64,
    /// Number of grids that failed to open.
    pub models_failed: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// High-level geoid service over a directory of grid files.
///
/// # Example
///
/// ```ignore
/// use geoid::{GeoidService, Interpolation};
///
/// let service = GeoidService::new("/usr/share/GeographicLib/geoids", 4);
///
/// // Grid is opened automatically
/// let n = service.height("egm96-5", 51.477928, -0.001545, Interpolation::Cubic)?;
/// println!("Geoid height: {:.3}m", n);
///
/// // Check cache statistics
/// let stats = service.cache_stats();
/// println!("Cache hit rate: {:.1}%", stats.hit_rate() * 100.0);
/// ```
pub struct GeoidService {
    /// Directory containing .pgm files.
    data_dir: PathBuf,
    /// Model used when callers do not name one.
    default_model: String,
    /// Row cache capacity of every grid opened by the service.
    cache_rows: usize,
    /// Open grids, keyed by model name.
    grid_cache: Cache<String, SharedGrid>,
    /// Number of cache hits.
    hit_count: AtomicU64,
    /// Number of cache misses.
    miss_count: AtomicU64,
}

impl GeoidService {
    /// Create a new service.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory containing `<model>.pgm` files
    /// * `cache_size` - Maximum number of grids to keep open
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        GeoidServiceBuilder::new(data_dir)
            .cache_size(cache_size)
            .build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> GeoidServiceBuilder {
        GeoidServiceBuilder::new(data_dir)
    }

    /// Geoid height of `model` at the given coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeoidError::InvalidModelName`] / [`GeoidError::ModelNotFound`]
    /// - any error from opening the grid or from [`GeoidGrid::height`]
    pub fn height(&self, model: &str, lat: f64, lon: f64, method: Interpolation) -> Result<f64> {
        let grid = self.load_grid(model)?;
        let mut grid = lock(&grid);
        grid.height(lat, lon, method)
    }

    /// Geoid heights of `model` for a batch of `(lat, lon)` pairs.
    ///
    /// The grid is locked once for the whole batch. Fails on the first
    /// error; no partial results are returned.
    pub fn heights(
        &self,
        model: &str,
        coords: &[(f64, f64)],
        method: Interpolation,
    ) -> Result<Vec<f64>> {
        let grid = self.load_grid(model)?;
        let mut grid = lock(&grid);
        grid.heights(coords, method)
    }

    /// Geometry and calibration of `model`.
    pub fn info(&self, model: &str) -> Result<GridInfo> {
        let grid = self.load_grid(model)?;
        let info = lock(&grid).info();
        Ok(info)
    }

    /// Descriptive header comments of `model`.
    pub fn metadata(&self, model: &str) -> Result<GridMetadata> {
        let grid = self.load_grid(model)?;
        let metadata = lock(&grid).metadata().clone();
        Ok(metadata)
    }

    /// Path of the grid file for `model`.
    pub fn model_path(&self, model: &str) -> Result<PathBuf> {
        validate_model_name(model)?;
        Ok(self
            .data_dir
            .join(format!("{}.{}", model, GRID_EXTENSION)))
    }

    /// Open `model` (or return the already open grid).
    pub fn load_grid(&self, model: &str) -> Result<SharedGrid> {
        validate_model_name(model)?;

        if let Some(grid) = self.grid_cache.get(model) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(grid);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let path = self.model_path(model)?;
        if !path.is_file() {
            return Err(GeoidError::ModelNotFound {
                name: model.to_string(),
                path,
            });
        }

        let grid = Arc::new(Mutex::new(GeoidGrid::open_with_cache(
            &path,
            self.cache_rows,
        )?));
        tracing::debug!(model, path = %path.display(), "Loaded geoid model");

        self.grid_cache.insert(model.to_string(), grid.clone());
        Ok(grid)
    }

    /// Scan the data directory for grid files.
    ///
    /// Returns the sorted model names (file stems), e.g. `["egm96-5"]`.
    pub fn list_models(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut models = BTreeSet::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_grid = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(GRID_EXTENSION));
            if !is_grid {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_model_name(stem).is_ok() {
                    models.insert(stem.to_string());
                }
            }
        }

        models.into_iter().collect()
    }

    /// Open grids ahead of the first query.
    ///
    /// With `None`, every model found by [`list_models`](Self::list_models)
    /// is opened.
    pub fn preload(&self, models: Option<&[String]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        let names = match models {
            Some(names) => names.to_vec(),
            None => self.list_models(),
        };

        for name in &names {
            if self.grid_cache.contains_key(name.as_str()) {
                stats.models_already_cached += 1;
                continue;
            }
            match self.load_grid(name) {
                Ok(_) => stats.models_loaded += 1,
                Err(e) => {
                    tracing::warn!(model = %name, error = %e, "Failed to preload geoid model");
                    stats.models_failed += 1;
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        stats
    }

    /// Get cache statistics for open grids.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.grid_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Model used when callers do not name one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Row cache capacity of each grid.
    pub fn cache_rows(&self) -> usize {
        self.cache_rows
    }

    /// Get the maximum number of open grids.
    pub fn cache_capacity(&self) -> u64 {
        self.grid_cache.policy().max_capacity().unwrap_or(0)
    }

    /// Close and forget a model's grid, e.g. after the file was replaced.
    pub fn invalidate_model(&self, model: &str) {
        self.grid_cache.invalidate(model);
    }

    /// Close every open grid.
    pub fn clear_cache(&self) {
        self.grid_cache.invalidate_all();
    }
}

/// Lock a grid, recovering it if another query panicked while holding it.
///
/// A query never leaves the grid half-updated: a row is either fully cached
/// or absent.
fn lock(grid: &SharedGrid) -> MutexGuard<'_, GeoidGrid> {
    grid.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Model names are plain file stems: ASCII letters, digits, `-`, `_`, `.`.
fn validate_model_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(GeoidError::InvalidModelName {
            name: name.to_string(),
        })
    }
}

/// Builder for creating [`GeoidService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use geoid::GeoidServiceBuilder;
///
/// let service = GeoidServiceBuilder::new("/usr/share/GeographicLib/geoids")
///     .cache_size(2)
///     .default_model("egm2008-1")
///     .build();
/// ```
pub struct GeoidServiceBuilder {
    data_dir: PathBuf,
    cache_size: u64,
    cache_rows: usize,
    default_model: String,
}

impl GeoidServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size: DEFAULT_GRID_CACHE_SIZE,
            cache_rows: DEFAULT_CACHE_ROWS,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOID_DATA_DIR` | Directory containing .pgm files | Required |
    /// | `GEOID_CACHE_SIZE` | Maximum open grids | 4 |
    /// | `GEOID_CACHE_ROWS` | Rows cached per grid | 16 |
    /// | `GEOID_DEFAULT_MODEL` | Model used when none is named | egm96-5 |
    ///
    /// # Errors
    ///
    /// Returns an error if `GEOID_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("GEOID_DATA_DIR").map_err(|_| {
            GeoidError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "GEOID_DATA_DIR environment variable not set",
            ))
        })?;

        let mut builder = Self::new(data_dir);
        if let Some(size) = env_parse("GEOID_CACHE_SIZE") {
            builder.cache_size = size;
        }
        if let Some(rows) = env_parse("GEOID_CACHE_ROWS") {
            builder.cache_rows = rows;
        }
        if let Ok(model) = std::env::var("GEOID_DEFAULT_MODEL") {
            builder.default_model = model;
        }
        Ok(builder)
    }

    /// Set the data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the maximum number of grids kept open.
    ///
    /// Default is 4 grids.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Set the number of rows each grid keeps in memory.
    ///
    /// Default is 16 rows; values below 4 are raised to 4.
    pub fn cache_rows(mut self, rows: usize) -> Self {
        self.cache_rows = rows;
        self
    }

    /// Set the model used when a query does not name one.
    pub fn default_model<S: Into<String>>(mut self, model: S) -> Self {
        self.default_model = model.into();
        self
    }

    /// Build the [`GeoidService`].
    pub fn build(self) -> GeoidService {
        GeoidService {
            data_dir: self.data_dir,
            default_model: self.default_model,
            cache_rows: self.cache_rows,
            grid_cache: Cache::builder().max_capacity(self.cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
