//! Best-profile selection over a regular grid.

use crate::{
    derive::{Derivation, Statistic},
    grid::{GridCell, GridSpec},
    GridError,
};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use vfm::{Array2, DatasetReader, Track, SENTINEL};

/// The winning footprint of one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedProfile {
    /// Grid latitude index, 0 is the northernmost row.
    pub row: usize,

    /// Grid longitude index, 0 is the westernmost column.
    pub col: usize,

    pub grid_lat: f64,
    pub grid_lon: f64,

    /// Along-track index of the winning footprint.
    pub footprint: usize,

    /// Latitude of the winning footprint.
    pub latitude: f64,

    /// Longitude of the winning footprint.
    pub longitude: f64,

    /// Derived value of each valid bin.
    pub profile: Vec<f64>,

    /// Altitude, in km, of each value in `profile`.
    pub altitude: Vec<f64>,

    /// Ranking statistic of `profile`.
    pub statistic: f64,
}

#[derive(Debug, Clone)]
pub struct Selector<D> {
    grid: GridSpec,
    derivation: D,
    lat_tolerance: f64,
    lon_tolerance: f64,
    max_altitude_km: f64,
    sentinel: f64,
    statistic: Statistic,
}

impl<D> Selector<D> {
    pub fn builder() -> SelectorBuilder<D> {
        SelectorBuilder {
            grid: None,
            derivation: None,
            lat_tolerance: 1.0,
            lon_tolerance: 1.0,
            max_altitude_km: 10.0,
            sentinel: SENTINEL,
            statistic: Statistic::Mean,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn derivation(&self) -> &D {
        &self.derivation
    }
}

pub struct SelectorBuilder<D> {
    grid: Option<GridSpec>,

    derivation: Option<D>,

    /// Maximum latitude distance, in degrees, between a grid cell and
    /// a candidate footprint.
    lat_tolerance: f64,

    /// Maximum longitude distance, in degrees, between a grid cell and
    /// a candidate footprint.
    lon_tolerance: f64,

    /// Bins above this altitude are ignored.
    max_altitude_km: f64,

    /// Missing-value marker, compared exactly.
    sentinel: f64,

    statistic: Statistic,
}

impl<D> SelectorBuilder<D>
where
    D: Derivation,
{
    pub fn grid(mut self, grid: GridSpec) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn derivation(mut self, derivation: D) -> Self {
        self.derivation = Some(derivation);
        self
    }

    pub fn tolerance(mut self, lat_deg: f64, lon_deg: f64) -> Self {
        self.lat_tolerance = lat_deg;
        self.lon_tolerance = lon_deg;
        self
    }

    pub fn max_altitude(mut self, km: f64) -> Self {
        self.max_altitude_km = km;
        self
    }

    pub fn sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn build(self) -> Result<Selector<D>, GridError> {
        let grid = self.grid.ok_or(GridError::Builder("grid"))?;
        let derivation = self.derivation.ok_or(GridError::Builder("derivation"))?;
        grid.validate()?;
        if !(self.lat_tolerance >= 0.0 && self.lon_tolerance >= 0.0) {
            return Err(GridError::Grid("tolerance must be non-negative"));
        }
        Ok(Selector {
            grid,
            derivation,
            lat_tolerance: self.lat_tolerance,
            lon_tolerance: self.lon_tolerance,
            max_altitude_km: self.max_altitude_km,
            sentinel: self.sentinel,
            statistic: self.statistic,
        })
    }
}

impl<D> Selector<D>
where
    D: Derivation,
{
    /// Selects the best footprint of every grid cell.
    ///
    /// `science` holds one `footprints x bins` array per derivation
    /// input; `altitude` gives the altitude, in km, of each bin. The
    /// track and arrays are used up to their shortest common length.
    /// Cells without any valid candidate are omitted, and the rest
    /// are returned in grid order.
    pub fn select(
        &self,
        track: &Track,
        science: &[&Array2<f64>],
        altitude: &[f64],
    ) -> Result<Vec<SelectedProfile>, GridError> {
        let expected = self.derivation.inputs();
        if science.len() != expected {
            return Err(GridError::Inputs {
                expected,
                found: science.len(),
            });
        }
        if let Some(arr) = science.iter().find(|arr| arr.cols() != altitude.len()) {
            return Err(GridError::Bins {
                expected: altitude.len(),
                found: arr.cols(),
            });
        }

        let now = std::time::Instant::now();
        let footprints = science
            .iter()
            .map(|arr| arr.rows())
            .fold(track.len(), usize::min);
        let capped: Vec<usize> = altitude
            .iter()
            .enumerate()
            .filter(|(_, alt)| **alt <= self.max_altitude_km)
            .map(|(bin, _)| bin)
            .collect();

        let cells = self.grid.cells();
        let selected: Vec<SelectedProfile> = cells
            .par_iter()
            .filter_map(|cell| {
                self.select_cell(cell, &track.coords()[..footprints], science, altitude, &capped)
            })
            .collect();

        debug!(
            "select; footprints: {}, bins: {}, cells: {}, selected: {}, exec: {:?}",
            footprints,
            capped.len(),
            cells.len(),
            selected.len(),
            now.elapsed()
        );
        Ok(selected)
    }

    /// Reads the track, `fields` and `Lidar_Data_Altitudes` from
    /// `reader` and runs [`Selector::select`] on them.
    pub fn select_granule<R: DatasetReader>(
        &self,
        reader: &R,
        fields: &[&str],
    ) -> Result<Vec<SelectedProfile>, GridError> {
        let track = reader.track()?;
        let science = fields
            .iter()
            .map(|name| reader.science(name))
            .collect::<Result<Vec<_>, _>>()?;
        let altitude = reader.altitudes()?;
        let science: Vec<&Array2<f64>> = science.iter().collect();
        self.select(&track, &science, &altitude)
    }
}

/// Private API.
impl<D> Selector<D>
where
    D: Derivation,
{
    fn select_cell(
        &self,
        cell: &GridCell,
        coords: &[vfm::geo::Coord<f64>],
        science: &[&Array2<f64>],
        altitude: &[f64],
        capped: &[usize],
    ) -> Option<SelectedProfile> {
        let mut best: Option<(usize, Vec<f64>, Vec<f64>)> = None;
        let mut best_stat = f64::NEG_INFINITY;
        let mut bin_values = Vec::with_capacity(science.len());

        for (idx, coord) in coords.iter().enumerate() {
            if (coord.y - cell.lat).abs() > self.lat_tolerance
                || (coord.x - cell.lon).abs() > self.lon_tolerance
                || coord.x.is_nan()
                || coord.y.is_nan()
            {
                continue;
            }

            let rows: Vec<&[f64]> = science.iter().map(|arr| arr.row(idx)).collect();
            let mut profile = Vec::with_capacity(capped.len());
            let mut alts = Vec::with_capacity(capped.len());
            for &bin in capped {
                bin_values.clear();
                bin_values.extend(rows.iter().map(|row| row[bin]));
                if bin_values.iter().any(|v| *v == self.sentinel) {
                    continue;
                }
                profile.push(self.derivation.derive(&bin_values));
                alts.push(altitude[bin]);
            }

            // NaN never compares greater, so NaN statistics never win.
            match self.statistic.apply(&profile) {
                Some(stat) if stat > best_stat => {
                    best_stat = stat;
                    best = Some((idx, profile, alts));
                }
                _ => (),
            }
        }

        best.map(|(footprint, profile, altitude)| SelectedProfile {
            row: cell.row,
            col: cell.col,
            grid_lat: cell.lat,
            grid_lon: cell.lon,
            footprint,
            latitude: coords[footprint].y,
            longitude: coords[footprint].x,
            profile,
            altitude,
            statistic: best_stat,
        })
    }
}
