//! Numeric agreement and similarity engines for pairs of raster grids.
//!
//! [`modules::agreement`] counts cells that disagree after snapping both grids
//! to a precision step. [`modules::similarity`] compares per-grid normalized
//! copies with a simplified SSIM and error statistics. Both are pure functions
//! over caller-owned [`domain::Grid`] values; loading and pairing files is the
//! caller's job.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
