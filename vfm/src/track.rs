//! Along-track footprint geolocation.

use crate::{array::Array2, error::VfmError};
use geo::geometry::Coord;
use log::debug;
use std::ops::Range;

/// Coordinate axis used to window a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }

    fn value(self, coord: &Coord<f64>) -> f64 {
        match self {
            Self::Latitude => coord.y,
            Self::Longitude => coord.x,
        }
    }
}

/// Footprint locations of one granule, in along-track order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    /// `x` is longitude and `y` is latitude, in degrees.
    coords: Vec<Coord<f64>>,
}

impl Track {
    /// Returns a track pairing `latitude` with `longitude`.
    ///
    /// If the two differ in length, the longer one is truncated.
    pub fn new(latitude: &[f64], longitude: &[f64]) -> Self {
        if latitude.len() != longitude.len() {
            debug!(
                "track; latitude len {} != longitude len {}, truncating",
                latitude.len(),
                longitude.len()
            );
        }
        let coords = latitude
            .iter()
            .zip(longitude)
            .map(|(&y, &x)| Coord { x, y })
            .collect();
        Self { coords }
    }

    /// Returns a track built from the first column of geolocation
    /// fields.
    ///
    /// Level 2 products store several locations per footprint (start,
    /// center, end of the averaging interval); only the first is used.
    pub fn from_fields(latitude: &Array2<f64>, longitude: &Array2<f64>) -> Self {
        let first = |arr: &Array2<f64>| -> Vec<f64> {
            if arr.cols() == 0 {
                Vec::new()
            } else {
                arr.column(0)
            }
        };
        Self::new(&first(latitude), &first(longitude))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    pub fn get(&self, idx: usize) -> Option<Coord<f64>> {
        self.coords.get(idx).copied()
    }

    pub fn truncate(&mut self, len: usize) {
        self.coords.truncate(len);
    }

    /// Returns a copy of the footprints in `range`.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            coords: self.coords[range].to_vec(),
        }
    }

    /// Returns a copy of the footprints at `indices`.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            coords: indices.iter().map(|&idx| self.coords[idx]).collect(),
        }
    }

    /// Returns the index range spanning the first through the last
    /// footprint whose `axis` value lies in `[min, max]`.
    ///
    /// Footprints between the first and last match are included even
    /// if they fall outside the range themselves.
    pub fn window(&self, axis: Axis, min: f64, max: f64) -> Result<Range<usize>, VfmError> {
        let inside = |c: &Coord<f64>| {
            let v = axis.value(c);
            min <= v && v <= max
        };
        let first = self.coords.iter().position(inside);
        let last = self.coords.iter().rposition(inside);
        match (first, last) {
            (Some(first), Some(last)) => Ok(first..last + 1),
            _ => Err(VfmError::EmptyRange {
                axis: axis.name(),
                min,
                max,
            }),
        }
    }

    /// Returns indices of every footprint whose `axis` value lies in
    /// `[min, max]`.
    pub fn matching(&self, axis: Axis, min: f64, max: f64) -> Vec<usize> {
        self.coords
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let v = axis.value(c);
                min <= v && v <= max
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Truncates `track` and every array in `arrays` to their shortest
/// common row count, returning that count.
pub fn reconcile<T>(track: &mut Track, arrays: &mut [&mut Array2<T>]) -> usize {
    let rows = arrays
        .iter()
        .map(|arr| arr.rows())
        .fold(track.len(), usize::min);
    if rows != track.len() || arrays.iter().any(|arr| arr.rows() != rows) {
        debug!("reconcile; truncating track and fields to {rows} footprints");
    }
    track.truncate(rows);
    for arr in arrays.iter_mut() {
        arr.truncate_rows(rows);
    }
    rows
}
