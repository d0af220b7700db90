//! PGM header parsing for geoid grids.
//!
//! Geoid grids are distributed as binary, single-channel PGM files (`P5`)
//! with 16-bit samples. The header is plain text:
//!
//! ```text
//! P5
//! # Description WGS84 EGM96, 5-minute grid
//! # Offset -108
//! # Scale 0.003
//! 4320 2161
//! 65535
//! <raw big-endian u16 samples>
//! ```
//!
//! The `Offset` and `Scale` comments are mandatory: a raw sample `v` maps to
//! `offset + scale * v` metres. Other comments are optional metadata.

use std::io::{BufRead, Read, Seek};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{GeoidError, Result};

/// Magic token of a binary greyscale PGM file.
pub const PGM_MAGIC: &str = "P5";

/// The only supported maximum sample value (16-bit samples).
pub const MAX_SAMPLE_VALUE: u32 = 65535;

/// Longest accepted header line, terminator included.
pub const MAX_HEADER_LINE: usize = 4096;

/// Bytes per raw sample.
const SAMPLE_BYTES: usize = 2;

lazy_static! {
    // `# <Key> <value>`; the key is matched case-insensitively by the caller
    static ref TAGGED_COMMENT: Regex = Regex::new(r"^#\s*([A-Za-z]+)\s+(.*?)\s*$").unwrap();
    static ref NUMBER: Regex =
        Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap();
}

/// Optional descriptive comments found in the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridMetadata {
    /// Free-text description of the model.
    pub description: Option<String>,
    /// Where the grid was obtained from.
    pub url: Option<String>,
    /// Creation timestamp as written in the file.
    pub date_time: Option<String>,
    /// Published maximum error of bilinear interpolation (metres).
    pub max_bilinear_error: Option<f64>,
    /// Published RMS error of bilinear interpolation (metres).
    pub rms_bilinear_error: Option<f64>,
    /// Published maximum error of cubic interpolation (metres).
    pub max_cubic_error: Option<f64>,
    /// Published RMS error of cubic interpolation (metres).
    pub rms_cubic_error: Option<f64>,
}

/// A fully validated grid header.
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    /// Metres added to every scaled sample.
    pub offset: f64,
    /// Metres per raw unit.
    pub scale: f64,
    /// Number of columns (longitude samples).
    pub width: usize,
    /// Number of rows (latitude samples), at least 2.
    pub height: usize,
    /// Byte position of the first raw sample.
    pub data_offset: u64,
    /// Optional descriptive comments.
    pub metadata: GridMetadata,
}

impl GridHeader {
    /// Parse a header from a stream positioned at byte 0.
    ///
    /// On success the stream is left at the first byte of pixel data, which
    /// is also recorded in [`GridHeader::data_offset`].
    ///
    /// # Errors
    ///
    /// - [`GeoidError::Format`] for a wrong magic token, a malformed
    ///   dimension line or a header that ends early
    /// - [`GeoidError::Depth`] if the maximum value is not 65535
    /// - [`GeoidError::CalibrationMissing`] if `Offset` or `Scale` is absent
    pub fn parse<R: BufRead + Seek>(reader: &mut R) -> Result<Self> {
        let magic = next_line(reader)?;
        if magic != PGM_MAGIC {
            return Err(GeoidError::Format(format!(
                "expected magic token {PGM_MAGIC:?}, found {magic:?}"
            )));
        }

        let mut offset = None;
        let mut scale = None;
        let mut metadata = GridMetadata::default();

        let dimension_line = loop {
            let line = next_line(reader)?;
            if !line.starts_with('#') {
                break line;
            }
            apply_comment(&line, &mut offset, &mut scale, &mut metadata);
        };

        let (width, height) = parse_dimensions(reader, &dimension_line)?;

        let maxval = next_line(reader)?;
        let maxval = maxval.trim();
        if maxval.parse::<u32>().ok() != Some(MAX_SAMPLE_VALUE) {
            return Err(GeoidError::Depth {
                found: maxval.to_string(),
            });
        }

        let (offset, scale) = match (offset, scale) {
            (Some(offset), Some(scale)) => (offset, scale),
            (None, Some(_)) => return Err(GeoidError::CalibrationMissing { missing: "Offset" }),
            (Some(_), None) => return Err(GeoidError::CalibrationMissing { missing: "Scale" }),
            (None, None) => {
                return Err(GeoidError::CalibrationMissing {
                    missing: "Offset and Scale",
                })
            }
        };
        if !offset.is_finite() || !scale.is_finite() {
            return Err(GeoidError::Format(format!(
                "non-finite calibration: offset={offset}, scale={scale}"
            )));
        }

        let data_offset = reader.stream_position()?;
        let data_bytes = (width * SAMPLE_BYTES * height) as u64;
        if data_offset.checked_add(data_bytes).is_none() {
            return Err(GeoidError::Format(format!(
                "grid of {width}x{height} samples does not fit in a file"
            )));
        }

        Ok(Self {
            offset,
            scale,
            width,
            height,
            data_offset,
            metadata,
        })
    }

    /// Number of bytes in one row of raw samples.
    pub fn row_bytes(&self) -> usize {
        self.width * SAMPLE_BYTES
    }
}

/// Read one header line without its terminator.
///
/// The header is ASCII, but it is read byte-wise so that a corrupt file
/// surfaces as a format error rather than a UTF-8 decoding failure.
/// Lines are capped at [`MAX_HEADER_LINE`] bytes.
fn next_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    let got = reader
        .by_ref()
        .take(MAX_HEADER_LINE as u64)
        .read_until(b'\n', &mut buf)?;
    if got == 0 {
        return Err(GeoidError::Format("unexpected end of header".to_string()));
    }
    if got == MAX_HEADER_LINE && buf.last() != Some(&b'\n') {
        return Err(GeoidError::Format(format!(
            "header line longer than {MAX_HEADER_LINE} bytes"
        )));
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn apply_comment(
    line: &str,
    offset: &mut Option<f64>,
    scale: &mut Option<f64>,
    metadata: &mut GridMetadata,
) {
    let Some(caps) = TAGGED_COMMENT.captures(line) else {
        return;
    };
    let value = &caps[2];
    let number = || NUMBER.find(value).and_then(|m| m.as_str().parse::<f64>().ok());

    match caps[1].to_ascii_lowercase().as_str() {
        "offset" => {
            if let Some(v) = number() {
                *offset = Some(v);
            }
        }
        "scale" => {
            if let Some(v) = number() {
                *scale = Some(v);
            }
        }
        "description" => metadata.description = Some(value.to_string()),
        "url" => metadata.url = Some(value.to_string()),
        "datetime" => metadata.date_time = Some(value.to_string()),
        "maxbilinearerror" => metadata.max_bilinear_error = number(),
        "rmsbilinearerror" => metadata.rms_bilinear_error = number(),
        "maxcubicerror" => metadata.max_cubic_error = number(),
        "rmscubicerror" => metadata.rms_cubic_error = number(),
        _ => {}
    }
}

/// Parse `"<width> <height>"`, or `"<width>"` followed by a `"<height>"` line.
fn parse_dimensions<R: BufRead>(reader: &mut R, line: &str) -> Result<(usize, usize)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (width, height) = match tokens.as_slice() {
        [w, h] => (parse_positive(w, "width")?, parse_positive(h, "height")?),
        [w] => {
            let width = parse_positive(w, "width")?;
            let next = next_line(reader)?;
            match next.split_whitespace().collect::<Vec<_>>().as_slice() {
                [h] => (width, parse_positive(h, "height")?),
                _ => {
                    return Err(GeoidError::Format(format!(
                        "expected a height line, found {next:?}"
                    )))
                }
            }
        }
        _ => {
            return Err(GeoidError::Format(format!(
                "expected \"<width> <height>\", found {line:?}"
            )))
        }
    };

    if height < 2 {
        return Err(GeoidError::Format(format!(
            "grid height must be at least 2, found {height}"
        )));
    }
    // Row and grid byte sizes must be representable
    let fits = width
        .checked_mul(SAMPLE_BYTES)
        .and_then(|row_bytes| row_bytes.checked_mul(height))
        .is_some();
    if !fits {
        return Err(GeoidError::Format(format!(
            "grid dimensions {width}x{height} are too large"
        )));
    }
    Ok((width, height))
}

fn parse_positive(token: &str, what: &str) -> Result<usize> {
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(GeoidError::Format(format!("invalid grid {what}: {token:?}"))),
    }
}
