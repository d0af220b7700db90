//! Bounded LRU cache of raw grid rows.
//!
//! A global geoid grid can be hundreds of megabytes, so rows are read from
//! disk on demand and only the most recently used ones are kept in memory.

use std::io::{Read, Seek, SeekFrom};
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::{GeoidError, Result};

/// Default number of rows kept in memory per grid.
pub const DEFAULT_CACHE_ROWS: usize = 16;

/// Smallest allowed capacity: the cubic stencil spans four rows.
pub const MIN_CACHE_ROWS: usize = 4;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of rows currently in the cache.
    pub entry_count: u64,
    /// Number of row requests served from memory.
    pub hit_count: u64,
    /// Number of row requests that went to disk.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Row cache over a seekable source of raw samples.
///
/// Not synchronized: the cache and the reader's position are plain mutable
/// state owned by a single grid.
pub struct RowCache<R> {
    reader: R,
    data_offset: u64,
    row_bytes: usize,
    rows: LruCache<usize, Vec<u8>>,
    hit_count: u64,
    miss_count: u64,
}

impl<R: Read + Seek> RowCache<R> {
    /// Create a cache reading rows of `row_bytes` bytes starting at `data_offset`.
    ///
    /// `capacity` is raised to [`MIN_CACHE_ROWS`] if smaller.
    pub fn new(reader: R, data_offset: u64, row_bytes: usize, capacity: usize) -> Self {
        let capacity =
            NonZeroUsize::new(capacity.max(MIN_CACHE_ROWS)).unwrap_or(NonZeroUsize::MIN);
        Self {
            reader,
            data_offset,
            row_bytes,
            rows: LruCache::new(capacity),
            hit_count: 0,
            miss_count: 0,
        }
    }

    /// Return the raw bytes of `row`, reading it from disk on a miss.
    ///
    /// The row index is not validated here; callers clamp it first.
    ///
    /// # Errors
    ///
    /// - [`GeoidError::Io`] if seeking or reading fails
    /// - [`GeoidError::ShortRead`] if the source ends inside the row
    pub fn fetch_row(&mut self, row: usize) -> Result<&[u8]> {
        let Self {
            reader,
            data_offset,
            row_bytes,
            rows,
            hit_count,
            miss_count,
        } = self;

        let victim = if rows.contains(&row) {
            *hit_count += 1;
            None
        } else {
            *miss_count += 1;
            if rows.len() == rows.cap().get() {
                rows.peek_lru().map(|(evicted, _)| *evicted)
            } else {
                None
            }
        };

        let buf = rows.try_get_or_insert(row, || {
            let buf = read_row(reader, *data_offset, *row_bytes, row)?;
            if let Some(evicted) = victim {
                tracing::trace!(row, evicted, "Evicting least recently used row");
            }
            Ok::<_, GeoidError>(buf)
        })?;

        Ok(buf.as_slice())
    }

    /// Whether `row` is cached, without touching the recency order.
    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    /// Maximum number of rows kept in memory.
    pub fn capacity(&self) -> usize {
        self.rows.cap().get()
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.rows.len() as u64,
            hit_count: self.hit_count,
            miss_count: self.miss_count,
        }
    }

    /// Drop every cached row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

fn read_row<R: Read + Seek>(
    reader: &mut R,
    data_offset: u64,
    row_bytes: usize,
    row: usize,
) -> Result<Vec<u8>> {
    let position = (row as u64)
        .checked_mul(row_bytes as u64)
        .and_then(|start| start.checked_add(data_offset))
        .ok_or_else(|| GeoidError::Format(format!("row {row} lies beyond any file offset")))?;
    reader.seek(SeekFrom::Start(position))?;

    // Grows with the bytes actually present, not the claimed row length
    let mut buf = Vec::new();
    let got = reader
        .by_ref()
        .take(row_bytes as u64)
        .read_to_end(&mut buf)?;
    if got < row_bytes {
        return Err(GeoidError::ShortRead {
            row,
            expected: row_bytes,
            got,
        });
    }

    tracing::trace!(row, position, "Read grid row from disk");
    Ok(buf)
}
