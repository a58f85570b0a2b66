//! Grid loading strategies.
//!
//! A [`FallbackGridLoader`] tries each strategy in order and fails with a
//! single [`LoadError::Exhausted`] that lists every attempt.

use rastercmp_core::domain::{CompareError, Grid};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, warn};

const MAX_DECODE_BYTES: usize = 1024 * 1024 * 1024;

pub(super) trait GridLoader {
    fn name(&self) -> &'static str;

    fn load(&self, path: &Path) -> Result<Grid, LoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LoadAttempt {
    pub(super) loader: &'static str,
    pub(super) message: String,
}

#[derive(Debug, thiserror::Error)]
pub(super) enum LoadError {
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{loader} loader could not decode '{}': {message}", path.display())]
    Decode {
        path: PathBuf,
        loader: &'static str,
        message: String,
    },
    #[error("{}", render_exhausted(path, attempts))]
    Exhausted {
        path: PathBuf,
        attempts: Vec<LoadAttempt>,
    },
}

fn render_exhausted(path: &Path, attempts: &[LoadAttempt]) -> String {
    let details = attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.loader, attempt.message))
        .collect::<Vec<_>>()
        .join("; ");
    format!("no loader could read grid '{}' ({})", path.display(), details)
}

impl From<LoadError> for CompareError {
    fn from(error: LoadError) -> Self {
        let message = error.to_string();
        match error {
            LoadError::Open { .. } | LoadError::Exhausted { .. } => {
                CompareError::io_system("IO.GRID_LOAD", message)
            }
            LoadError::Decode { .. } => CompareError::input_validation("INPUT.GRID_DECODE", message),
        }
    }
}

pub(super) struct FallbackGridLoader {
    strategies: Vec<Box<dyn GridLoader>>,
}

impl Default for FallbackGridLoader {
    fn default() -> Self {
        Self::new(vec![Box::new(TiffGridLoader), Box::new(AsciiGridLoader::default())])
    }
}

impl FallbackGridLoader {
    pub(super) fn new(strategies: Vec<Box<dyn GridLoader>>) -> Self {
        Self { strategies }
    }
}

impl GridLoader for FallbackGridLoader {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn load(&self, path: &Path) -> Result<Grid, LoadError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.load(path) {
                Ok(grid) => {
                    debug!(
                        loader = strategy.name(),
                        path = %path.display(),
                        shape = %grid.shape(),
                        "grid loaded"
                    );
                    return Ok(grid);
                }
                Err(error) => {
                    warn!(loader = strategy.name(), path = %path.display(), %error, "loader failed");
                    attempts.push(LoadAttempt {
                        loader: strategy.name(),
                        message: error.to_string(),
                    });
                }
            }
        }

        Err(LoadError::Exhausted {
            path: path.to_path_buf(),
            attempts,
        })
    }
}

/// Reads band 1 of a TIFF; pixels with several samples keep the first one.
pub(super) struct TiffGridLoader;

impl TiffGridLoader {
    fn decode_error(path: &Path, message: impl std::fmt::Display) -> LoadError {
        LoadError::Decode {
            path: path.to_path_buf(),
            loader: "tiff",
            message: message.to_string(),
        }
    }
}

impl GridLoader for TiffGridLoader {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn load(&self, path: &Path) -> Result<Grid, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut limits = Limits::default();
        limits.decoding_buffer_size = MAX_DECODE_BYTES;
        limits.ifd_value_size = MAX_DECODE_BYTES;
        limits.intermediate_buffer_size = MAX_DECODE_BYTES;

        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|error| Self::decode_error(path, error))?
            .with_limits(limits);

        let (width, height) = decoder
            .dimensions()
            .map_err(|error| Self::decode_error(path, error))?;
        let color_type = decoder
            .colortype()
            .map_err(|error| Self::decode_error(path, error))?;
        let samples = samples_per_pixel(color_type).ok_or_else(|| {
            Self::decode_error(path, format!("unsupported color type {:?}", color_type))
        })?;
        // GDAL stores the band's no-data sentinel as ASCII text
        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|raw| {
                raw.trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .parse::<f64>()
                    .ok()
            });

        let image = decoder
            .read_image()
            .map_err(|error| Self::decode_error(path, error))?;
        let mut values = match image {
            DecodingResult::U8(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::U16(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::U32(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::U64(buf) => first_band(&buf, samples, |value| value as f64),
            DecodingResult::I8(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::I16(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::I32(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::I64(buf) => first_band(&buf, samples, |value| value as f64),
            DecodingResult::F32(buf) => first_band(&buf, samples, f64::from),
            DecodingResult::F64(buf) => buf.iter().step_by(samples).copied().collect(),
            #[allow(unreachable_patterns)]
            _ => return Err(Self::decode_error(path, "unsupported sample format")),
        };

        if let Some(nodata) = nodata.filter(|value| !value.is_nan()) {
            for value in values.iter_mut().filter(|value| **value == nodata) {
                *value = f64::NAN;
            }
        }

        Grid::new(height as usize, width as usize, values)
            .map_err(|error| Self::decode_error(path, error.message()))
    }
}

fn samples_per_pixel(color_type: ColorType) -> Option<usize> {
    match color_type {
        ColorType::Gray(_) => Some(1),
        ColorType::GrayA(_) => Some(2),
        ColorType::RGB(_) => Some(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Some(4),
        _ => None,
    }
}

fn first_band<T: Copy>(buf: &[T], samples: usize, convert: impl Fn(T) -> f64) -> Vec<f64> {
    buf.iter().step_by(samples).map(|&value| convert(value)).collect()
}

/// Whitespace-separated numeric rows, one grid row per line.
pub(super) struct AsciiGridLoader {
    comment_prefixes: Vec<String>,
    fortran_exponent_markers: Vec<char>,
}

impl Default for AsciiGridLoader {
    fn default() -> Self {
        Self {
            comment_prefixes: vec!["#".to_string()],
            fortran_exponent_markers: vec!['D', 'd'],
        }
    }
}

impl AsciiGridLoader {
    fn parse_rows(&self, input: &str) -> Result<Vec<Vec<f64>>, String> {
        let mut rows = Vec::new();

        for (line_index, raw_line) in input.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || self.is_comment(line) {
                continue;
            }

            let mut row = Vec::new();
            for (token_index, token) in line.split_whitespace().enumerate() {
                let normalized = self.normalize_token(token);
                let value = normalized.parse::<f64>().map_err(|_| {
                    format!(
                        "line {}, token {} ('{}') is not a valid number",
                        line_index + 1,
                        token_index + 1,
                        token
                    )
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| line.starts_with(prefix.as_str()))
    }

    fn normalize_token(&self, token: &str) -> String {
        token
            .chars()
            .map(|c| {
                if self.fortran_exponent_markers.contains(&c) {
                    'E'
                } else {
                    c
                }
            })
            .collect()
    }
}

impl GridLoader for AsciiGridLoader {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn load(&self, path: &Path) -> Result<Grid, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decode_error = |message: String| LoadError::Decode {
            path: path.to_path_buf(),
            loader: "ascii",
            message,
        };
        let text = String::from_utf8(bytes)
            .map_err(|error| decode_error(format!("not valid UTF-8: {}", error)))?;
        let rows = self.parse_rows(&text).map_err(decode_error)?;
        Grid::from_rows(rows).map_err(|error| decode_error(error.message().to_string()))
    }
}
