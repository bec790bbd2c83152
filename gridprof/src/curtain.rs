//! Along-track backscatter curtains.

use crate::{
    math::{interpolate, linspace},
    GridError,
};
use log::debug;
use serde::Serialize;
use vfm::{fields, reconcile, Array2, Axis, DatasetReader, Track, VfmError, SENTINEL};

/// A vertical slice of one science field along a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curtain {
    /// Latitude of each footprint.
    pub latitude: Vec<f64>,

    /// Longitude of each footprint.
    pub longitude: Vec<f64>,

    /// Altitude, in km, of each bin.
    pub altitude: Vec<f64>,

    /// `footprints x bins` values.
    pub values: Array2<f64>,
}

impl Curtain {
    pub fn builder() -> CurtainBuilder {
        CurtainBuilder {
            max_altitude_km: 10.0,
            window: None,
        }
    }

    pub fn footprints(&self) -> usize {
        self.values.rows()
    }

    /// Resamples every footprint onto `levels` altitudes evenly spaced
    /// from `top_km` down to `bottom_km`.
    ///
    /// Each output value is linearly interpolated between the two
    /// bracketing source bins. Sentinel and non-finite samples are
    /// ignored, and levels outside a footprint's sampled altitude
    /// span are NaN.
    pub fn regrid(
        &self,
        levels: usize,
        bottom_km: f64,
        top_km: f64,
    ) -> Result<Curtain, GridError> {
        let now = std::time::Instant::now();
        let altitude: Vec<f64> = linspace(top_km, bottom_km, levels).collect();
        let mut data = Vec::with_capacity(self.footprints() * levels);
        let mut samples: Vec<(f64, f64)> = Vec::with_capacity(self.altitude.len());

        for row in self.values.iter_rows() {
            samples.clear();
            samples.extend(
                self.altitude
                    .iter()
                    .zip(row)
                    .filter(|(alt, v)| alt.is_finite() && v.is_finite() && **v != SENTINEL)
                    .map(|(alt, v)| (*alt, *v)),
            );
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (xs, ys): (Vec<f64>, Vec<f64>) = samples.iter().copied().unzip();
            data.extend(altitude.iter().map(|&alt| interpolate(&xs, &ys, alt)));
        }

        debug!(
            "regrid; footprints: {}, levels: {}, exec: {:?}",
            self.footprints(),
            levels,
            now.elapsed()
        );

        Ok(Curtain {
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            altitude,
            values: Array2::from_vec(self.footprints(), levels, data)?,
        })
    }
}

pub struct CurtainBuilder {
    /// Bins above this altitude are dropped.
    max_altitude_km: f64,

    /// Keep only footprints inside this coordinate range.
    window: Option<(Axis, f64, f64)>,
}

impl CurtainBuilder {
    pub fn max_altitude(mut self, km: f64) -> Self {
        self.max_altitude_km = km;
        self
    }

    pub fn longitude(mut self, min: f64, max: f64) -> Self {
        self.window = Some((Axis::Longitude, min, max));
        self
    }

    pub fn latitude(mut self, min: f64, max: f64) -> Self {
        self.window = Some((Axis::Latitude, min, max));
        self
    }

    /// Cuts a curtain from `field` (`footprints x bins`) whose bins
    /// lie at `altitude` km.
    ///
    /// Track and field are first truncated to their common length.
    pub fn build(
        &self,
        track: &Track,
        field: &Array2<f64>,
        altitude: &[f64],
    ) -> Result<Curtain, GridError> {
        if field.cols() != altitude.len() {
            return Err(GridError::Bins {
                expected: altitude.len(),
                found: field.cols(),
            });
        }
        let mut track = track.clone();
        let mut field = field.clone();
        reconcile(&mut track, &mut [&mut field]);

        let keep: Vec<usize> = altitude
            .iter()
            .enumerate()
            .filter(|(_, alt)| **alt <= self.max_altitude_km)
            .map(|(bin, _)| bin)
            .collect();

        let footprints = match self.window {
            Some((axis, min, max)) => {
                let matching = track.matching(axis, min, max);
                if matching.is_empty() {
                    return Err(VfmError::EmptyRange {
                        axis: axis.name(),
                        min,
                        max,
                    }
                    .into());
                }
                matching
            }
            None => (0..track.len()).collect(),
        };

        let track = track.select(&footprints);
        let mut data = Vec::with_capacity(footprints.len() * keep.len());
        for &idx in &footprints {
            let row = field.row(idx);
            data.extend(keep.iter().map(|&bin| row[bin]));
        }

        Ok(Curtain {
            latitude: track.coords().iter().map(|c| c.y).collect(),
            longitude: track.coords().iter().map(|c| c.x).collect(),
            altitude: keep.iter().map(|&bin| altitude[bin]).collect(),
            values: Array2::from_vec(footprints.len(), keep.len(), data)?,
        })
    }

    /// Cuts a curtain of `Total_Attenuated_Backscatter_532` from a
    /// level 1 granule.
    pub fn build_granule<R: DatasetReader>(&self, reader: &R) -> Result<Curtain, GridError> {
        let track = reader.track()?;
        let field = reader.science(fields::TOTAL_ATTENUATED_BACKSCATTER_532)?;
        let altitude = reader.altitudes()?;
        self.build(&track, &field, &altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::Curtain;
    use crate::GridError;
    use approx::assert_relative_eq;
    use vfm::{fields, Array2, MemGranule, Track, VfmError};

    fn sample() -> (Track, Array2<f64>, Vec<f64>) {
        // Level 1 altitudes are stored top down.
        let altitude = vec![12.0, 8.0, 4.0, 0.0];
        let track = Track::new(&[40.0, 41.0, 42.0], &[-110.0, -100.0, -90.0]);
        let field = Array2::from_vec(
            4,
            4,
            vec![
                9.0, 0.8, 0.4, 0.0, //
                9.0, 1.6, 0.8, 0.0, //
                9.0, 2.4, 1.2, 0.0, //
                9.0, 3.2, 1.6, 0.0,
            ],
        )
        .unwrap();
        (track, field, altitude)
    }

    #[test]
    fn test_cap_window_and_reconcile() {
        let (track, field, altitude) = sample();
        let curtain = Curtain::builder()
            .longitude(-106.0, -98.0)
            .build(&track, &field, &altitude)
            .unwrap();
        assert_eq!(curtain.footprints(), 1);
        assert_eq!(curtain.latitude, vec![41.0]);
        assert_eq!(curtain.altitude, vec![8.0, 4.0, 0.0]);
        assert_eq!(curtain.values.row(0), &[1.6, 0.8, 0.0]);

        // The fourth field row has no track point.
        let whole = Curtain::builder().build(&track, &field, &altitude).unwrap();
        assert_eq!(whole.footprints(), 3);
    }

    #[test]
    fn test_empty_window_is_error() {
        let (track, field, altitude) = sample();
        assert!(matches!(
            Curtain::builder()
                .latitude(0.0, 10.0)
                .build(&track, &field, &altitude),
            Err(GridError::Vfm(VfmError::EmptyRange {
                axis: "latitude",
                ..
            }))
        ));
    }

    #[test]
    fn test_regrid() {
        let (track, field, altitude) = sample();
        let curtain = Curtain::builder().build(&track, &field, &altitude).unwrap();
        let regridded = curtain.regrid(6, 0.0, 10.0).unwrap();
        assert_eq!(regridded.altitude, vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
        let row = regridded.values.row(0);
        // 10 km lies above the highest kept bin.
        assert!(row[0].is_nan());
        assert_relative_eq!(row[1], 0.8);
        assert_relative_eq!(row[2], 0.6);
        assert_relative_eq!(row[3], 0.4);
        assert_relative_eq!(row[4], 0.2);
        assert_relative_eq!(row[5], 0.0);
    }

    #[test]
    fn test_regrid_skips_sentinels() {
        let curtain = Curtain {
            latitude: vec![0.0],
            longitude: vec![0.0],
            altitude: vec![3.0, 2.0, 1.0],
            values: Array2::from_vec(1, 3, vec![3.0, -9999.0, 1.0]).unwrap(),
        };
        let regridded = curtain.regrid(3, 1.0, 3.0).unwrap();
        assert_eq!(regridded.values.as_slice(), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_build_granule() {
        let granule = MemGranule::new("22_2_L1")
            .with(fields::LATITUDE, Array2::column_vec(vec![1.0_f32, 2.0]))
            .with(fields::LONGITUDE, Array2::column_vec(vec![3.0_f32, 4.0]))
            .with(
                fields::TOTAL_ATTENUATED_BACKSCATTER_532,
                Array2::from_vec(2, 2, vec![0.1_f32, 0.2, 0.3, 0.4]).unwrap(),
            )
            .with(
                fields::LIDAR_DATA_ALTITUDES,
                Array2::from_vec(1, 2, vec![20.0_f32, 5.0]).unwrap(),
            );
        let curtain = Curtain::builder().build_granule(&granule).unwrap();
        assert_eq!(curtain.altitude, vec![5.0]);
        assert_eq!(curtain.values.rows(), 2);
    }
}
