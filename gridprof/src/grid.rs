//! Regular lat/lon grid of cell centers.

use crate::{error::GridError, math::linspace};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of cells a grid may hold.
pub const MAX_CELLS: usize = 10_000_000;

/// Grid ranges and steps, in degrees.
///
/// The latitude range is inclusive: a grid from 42 to 62 with a 2
/// degree step has 11 latitudes. The longitude range stops short of
/// `lon_max` unless `lon_inclusive` is set, so -120 to 20 has 70
/// longitudes ending at 18. Latitudes run north to south, longitudes
/// west to east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lat_step: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub lon_step: f64,
    #[serde(default)]
    pub lon_inclusive: bool,
}

/// One grid cell center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    /// Latitude index, 0 is the northernmost row.
    pub row: usize,
    /// Longitude index, 0 is the westernmost column.
    pub col: usize,
    pub lat: f64,
    pub lon: f64,
}

impl GridCell {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

impl GridSpec {
    /// Returns a grid with the same step along both axes.
    pub fn square(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64, step: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lat_step: step,
            lon_min,
            lon_max,
            lon_step: step,
            lon_inclusive: false,
        }
    }

    /// Includes `lon_max` itself in the longitude axis.
    pub fn with_lon_inclusive(mut self, inclusive: bool) -> Self {
        self.lon_inclusive = inclusive;
        self
    }

    pub fn validate(&self) -> Result<(), GridError> {
        let values = [
            self.lat_min,
            self.lat_max,
            self.lat_step,
            self.lon_min,
            self.lon_max,
            self.lon_step,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GridError::Grid("non-finite bound"));
        }
        if self.lat_step <= 0.0 || self.lon_step <= 0.0 {
            return Err(GridError::Grid("step must be positive"));
        }
        if self.lat_min > self.lat_max || self.lon_min > self.lon_max {
            return Err(GridError::Grid("min exceeds max"));
        }
        let rows = count(self.lat_min, self.lat_max, self.lat_step, true);
        let cols = count(self.lon_min, self.lon_max, self.lon_step, self.lon_inclusive);
        if rows * cols > MAX_CELLS as f64 {
            return Err(GridError::Grid("too many cells"));
        }
        if rows < 1.0 || cols < 1.0 {
            return Err(GridError::Grid("no cells"));
        }
        Ok(())
    }

    /// Grid latitudes, north to south.
    pub fn lats(&self) -> Vec<f64> {
        let n = steps(self.lat_min, self.lat_max, self.lat_step, true);
        let south = self.lat_max - self.lat_step * (n - 1) as f64;
        linspace(self.lat_max, south, n).collect()
    }

    /// Grid longitudes, west to east.
    pub fn lons(&self) -> Vec<f64> {
        let n = steps(self.lon_min, self.lon_max, self.lon_step, self.lon_inclusive);
        if n == 0 {
            return Vec::new();
        }
        let east = self.lon_min + self.lon_step * (n - 1) as f64;
        linspace(self.lon_min, east, n).collect()
    }

    /// Returns every cell, row-major from the northwest corner.
    pub fn cells(&self) -> Vec<GridCell> {
        let lons = self.lons();
        self.lats()
            .into_iter()
            .enumerate()
            .flat_map(|(row, lat)| {
                lons.iter()
                    .enumerate()
                    .map(move |(col, &lon)| GridCell { row, col, lat, lon })
            })
            .collect()
    }
}

/// Number of grid values from `min` up to `max`, as a float so that
/// oversized grids can be rejected before anything is allocated.
///
/// A small slack absorbs float error so that a `max` lying on the
/// step is kept when inclusive and dropped otherwise.
fn count(min: f64, max: f64, step: f64, inclusive: bool) -> f64 {
    let span = (max - min) / step;
    if inclusive {
        (span + 1e-9).floor() + 1.0
    } else {
        (span - 1e-9).ceil().max(0.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn steps(min: f64, max: f64, step: f64, inclusive: bool) -> usize {
    count(min, max, step, inclusive) as usize
}
