//! Packed VFM record decoding.
//!
//! Each row of `Feature_Classification_Flags` holds one 5 km data
//! record. Reading from the end of the row backwards, the record holds
//! the lowest zone (`15 x 290` at 30 m), then the middle zone
//! (`5 x 200` at 60 m), then the top zone (`3 x 55` at 180 m). Each
//! replicate inside a zone stores its bins from the top of the zone
//! downwards.
//!
//! Decoding keeps the first replicate of every zone, replicates coarse
//! bins onto the 30 m grid and flips the vertical order so that bin 0
//! is the lowest altitude.

use crate::{
    array::Array2,
    codes,
    error::VfmError,
    layout::ZoneLayout,
    track::{Axis, Track},
};
use log::debug;
use serde::Serialize;

/// Decoded classification flags on a uniform altitude axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// `footprints x altitude bins` flag words; bin 0 is the lowest
    /// altitude.
    pub codes: Array2<u16>,

    /// Altitude, in km, of each bin.
    pub altitude: Box<[f64]>,
}

impl Classification {
    /// Returns combined aerosol type codes (see
    /// [`codes::combined_type`]) for every bin.
    pub fn aerosol_types(&self) -> Array2<u8> {
        self.codes.map(|code| codes::combined_type(*code))
    }

    /// Returns the feature type of every bin.
    pub fn feature_types(&self) -> Array2<u8> {
        self.codes.map(|code| codes::feature_type(*code))
    }
}

/// Aerosol type curtain over a window of footprints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtypes {
    /// Latitude of each footprint.
    pub latitude: Vec<f64>,

    /// Longitude of each footprint.
    pub longitude: Vec<f64>,

    /// Altitude, in km, of each bin.
    pub altitude: Vec<f64>,

    /// `footprints x altitude bins` combined aerosol type codes.
    pub types: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoder {
    layout: ZoneLayout,
}

impl Decoder {
    /// Returns a decoder for `layout`.
    pub fn new(layout: ZoneLayout) -> Result<Self, VfmError> {
        layout.validate()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    /// Decodes every row of `raw`.
    pub fn decode(&self, raw: &Array2<u16>) -> Result<Classification, VfmError> {
        let expected = self.layout.packed_columns();
        if raw.cols() != expected {
            return Err(VfmError::FormatMismatch {
                expected,
                found: raw.cols(),
            });
        }

        let now = std::time::Instant::now();
        let bins = self.layout.altitude_bins();
        let mut codes = Vec::with_capacity(raw.rows() * bins);
        for record in raw.iter_rows() {
            self.decode_record(record, &mut codes);
        }
        debug!(
            "decode; footprints: {}, bins: {}, exec: {:?}",
            raw.rows(),
            bins,
            now.elapsed()
        );

        Ok(Classification {
            codes: Array2::from_vec(raw.rows(), bins, codes)?,
            altitude: self.layout.altitude_axis(),
        })
    }

    /// Decodes the footprints of `raw` whose `axis` coordinate lies in
    /// `[min, max]` and returns their aerosol type curtain.
    ///
    /// `track` and `raw` are reconciled to their common length first.
    pub fn decode_window(
        &self,
        raw: &Array2<u16>,
        track: &Track,
        axis: Axis,
        min: f64,
        max: f64,
    ) -> Result<Subtypes, VfmError> {
        let rows = raw.rows().min(track.len());
        let track = track.slice(0..rows);
        let range = track.window(axis, min, max)?;
        let classification = self.decode(&raw.slice_rows(range.clone()))?;
        let track = track.slice(range);
        let types = classification.aerosol_types();
        Ok(Subtypes {
            latitude: track.coords().iter().map(|c| c.y).collect(),
            longitude: track.coords().iter().map(|c| c.x).collect(),
            altitude: classification.altitude.into_vec(),
            types: types.iter_rows().map(<[u8]>::to_vec).collect(),
        })
    }
}

/// Private API.
impl Decoder {
    /// Appends the decoded bins of one packed record to `out`, lowest
    /// altitude first.
    fn decode_record(&self, record: &[u16], out: &mut Vec<u16>) {
        // Zones are packed highest-altitude first, so the lowest zone
        // ends the record.
        let mut end = record.len();
        for zone in &self.layout.zones {
            let start = end - zone.packed_columns();
            let first_replicate = &record[start..start + zone.bins];
            let factor = self.layout.factor(zone);
            for &code in first_replicate.iter().rev() {
                out.extend(std::iter::repeat(code).take(factor));
            }
            end = start;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Array2, Axis, Decoder, Track, VfmError};
    use crate::layout::{Zone, ZoneLayout};

    /// A small layout with the same shape as the real product.
    fn tiny() -> ZoneLayout {
        ZoneLayout {
            leading_columns: 2,
            zones: [
                Zone {
                    bins: 3,
                    replicates: 3,
                    step_m: 30,
                },
                Zone {
                    bins: 2,
                    replicates: 2,
                    step_m: 60,
                },
                Zone {
                    bins: 1,
                    replicates: 2,
                    step_m: 180,
                },
            ],
            base_km: -0.5,
        }
    }

    /// Packs one record for `tiny()`.
    ///
    /// `low`, `mid` and `top` are the first replicate of each zone in
    /// storage (top-down) order; other replicates are filled with
    /// `999` so that reading them is detectable.
    fn pack(low: [u16; 3], mid: [u16; 2], top: [u16; 1]) -> Vec<u16> {
        let mut rec = vec![7777, 7777];
        rec.extend(top);
        rec.extend([999]);
        rec.extend(mid);
        rec.extend([999, 999]);
        rec.extend(low);
        rec.extend([999; 6]);
        rec
    }

    #[test]
    fn test_decode_record_order_and_replication() {
        let decoder = Decoder::new(tiny()).unwrap();
        let raw = Array2::from_vec(1, 17, pack([3, 2, 1], [5, 4], [6])).unwrap();
        let decoded = decoder.decode(&raw).unwrap();
        assert_eq!(decoded.codes.cols(), 3 + 4 + 6);
        assert_eq!(
            decoded.codes.row(0),
            &[1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 6, 6]
        );
        assert_eq!(decoded.altitude.len(), 13);
    }

    #[test]
    fn test_decode_preserves_row_order() {
        let decoder = Decoder::new(tiny()).unwrap();
        let mut data = pack([1, 1, 1], [1, 1], [1]);
        data.extend(pack([2, 2, 2], [2, 2], [2]));
        let raw = Array2::from_vec(2, 17, data).unwrap();
        let decoded = decoder.decode(&raw).unwrap();
        assert!(decoded.codes.row(0).iter().all(|&c| c == 1));
        assert!(decoded.codes.row(1).iter().all(|&c| c == 2));
    }

    #[test]
    fn test_decode_rejects_wrong_width() {
        let decoder = Decoder::new(tiny()).unwrap();
        let raw = Array2::from_vec(1, 16, vec![0; 16]).unwrap();
        assert!(matches!(
            decoder.decode(&raw),
            Err(VfmError::FormatMismatch {
                expected: 17,
                found: 16
            })
        ));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn test_calipso_v4_multiplicity() {
        let layout = ZoneLayout::CALIPSO_V4;
        let decoder = Decoder::new(layout).unwrap();
        let cols = layout.packed_columns();
        // Give every packed column a distinct value.
        let record: Vec<u16> = (0..cols).map(|c| c as u16).collect();
        let raw = Array2::from_vec(1, cols, record).unwrap();
        let decoded = decoder.decode(&raw).unwrap();
        let row = decoded.codes.row(0);
        assert_eq!(row.len(), 1020);
        assert_eq!(decoded.altitude.len(), 1020);

        let count = |v: u16| row.iter().filter(|&&c| c == v).count();
        let low_start = cols - 15 * 290;
        let mid_start = low_start - 5 * 200;
        let top_start = mid_start - 3 * 55;
        for bin in 0..290 {
            assert_eq!(count((low_start + bin) as u16), 1);
        }
        for bin in 0..200 {
            assert_eq!(count((mid_start + bin) as u16), 2);
        }
        for bin in 0..55 {
            assert_eq!(count((top_start + bin) as u16), 6);
        }
        // The lowest bin is the last stored bin of the lowest zone's
        // first replicate; the highest is the first stored top bin.
        assert_eq!(row[0], (low_start + 289) as u16);
        assert_eq!(row[1019], top_start as u16);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = Decoder::new(tiny()).unwrap();
        let raw = Array2::from_vec(1, 17, pack([3, 2, 1], [5, 4], [6])).unwrap();
        assert_eq!(decoder.decode(&raw).unwrap(), decoder.decode(&raw).unwrap());
    }

    #[test]
    fn test_decode_window() {
        let decoder = Decoder::new(tiny()).unwrap();
        // Tropospheric smoke in the lowest bin of footprint 1 only.
        let smoke = 3 | (6 << 9);
        let mut data = pack([0, 0, 0], [0, 0], [0]);
        data.extend(pack([0, 0, smoke], [0, 0], [0]));
        data.extend(pack([0, 0, 0], [0, 0], [0]));
        let raw = Array2::from_vec(3, 17, data).unwrap();
        let track = Track::new(&[50.0, 51.0, 52.0], &[-130.0, -115.0, -90.0]);

        let subtypes = decoder
            .decode_window(&raw, &track, Axis::Longitude, -120.0, -109.0)
            .unwrap();
        assert_eq!(subtypes.latitude, vec![51.0]);
        assert_eq!(subtypes.types.len(), 1);
        assert_eq!(subtypes.types[0][0], 6);
        assert!(subtypes.types[0][1..].iter().all(|&t| t == 0));

        assert!(matches!(
            decoder.decode_window(&raw, &track, Axis::Longitude, 0.0, 1.0),
            Err(VfmError::EmptyRange { .. })
        ));
    }
}
