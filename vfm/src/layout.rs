//! Vertical sampling layout of a VFM product version.
//!
//! A VFM record packs three vertical resolution zones side by side.
//! Each zone stores `replicates` along-track copies of `bins` range
//! bins, so its width in the packed record is `replicates * bins`.
//!
//! # References
//!
//! 1. [CALIPSO Data Products Catalog](https://www-calipso.larc.nasa.gov/products/CALIPSO_DPC_Rev4x93.pdf)
//! 1. [VFM sampling](https://www-calipso.larc.nasa.gov/resources/calipso_users_guide/data_summaries/vfm/)

use crate::error::VfmError;
use serde::{Deserialize, Serialize};

/// One vertical resolution zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Range bins per replicate.
    pub bins: usize,
    /// Along-track replicates packed next to each other.
    pub replicates: usize,
    /// Vertical step in meters.
    pub step_m: u32,
}

impl Zone {
    /// Width of this zone in the packed record.
    pub fn packed_columns(&self) -> usize {
        self.bins * self.replicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    /// Columns preceding the packed zones.
    pub leading_columns: usize,

    /// Zones ordered from lowest to highest altitude.
    ///
    /// The lowest zone must have the finest step; every other step
    /// must be an integer multiple of it.
    pub zones: [Zone; 3],

    /// Altitude of the first (lowest) output bin, in km.
    pub base_km: f64,
}

impl ZoneLayout {
    /// CALIPSO level 2 VFM, version 4.
    ///
    /// - 290 bins @ 30 m: -0.5 km to 8.2 km
    /// - 200 bins @ 60 m: 8.2 km to 20.2 km
    /// - 55 bins @ 180 m: 20.2 km to 30.1 km
    pub const CALIPSO_V4: Self = Self {
        leading_columns: 5,
        zones: [
            Zone {
                bins: 290,
                replicates: 15,
                step_m: 30,
            },
            Zone {
                bins: 200,
                replicates: 5,
                step_m: 60,
            },
            Zone {
                bins: 55,
                replicates: 3,
                step_m: 180,
            },
        ],
        base_km: -0.5,
    };

    /// Returns `self` with a different number of leading columns.
    pub fn with_leading_columns(mut self, leading_columns: usize) -> Self {
        self.leading_columns = leading_columns;
        self
    }

    /// Checks that this layout can be decoded.
    pub fn validate(&self) -> Result<(), VfmError> {
        let finest = self.zones[0].step_m;
        if finest == 0 {
            return Err(VfmError::Layout("zero vertical step"));
        }
        for zone in &self.zones {
            if zone.bins == 0 || zone.replicates == 0 {
                return Err(VfmError::Layout("empty zone"));
            }
            if zone.step_m < finest || zone.step_m % finest != 0 {
                return Err(VfmError::Layout(
                    "zone step is not a multiple of the finest step",
                ));
            }
        }
        if !self.base_km.is_finite() {
            return Err(VfmError::Layout("non-finite base altitude"));
        }
        let mut packed = Some(self.leading_columns);
        let mut bins = Some(0_usize);
        for zone in &self.zones {
            packed = packed
                .zip(zone.bins.checked_mul(zone.replicates))
                .and_then(|(a, b)| a.checked_add(b));
            bins = bins
                .zip(zone.bins.checked_mul(self.factor(zone)))
                .and_then(|(a, b)| a.checked_add(b));
        }
        if packed.is_none() || bins.is_none() {
            return Err(VfmError::Layout("zone sizes overflow"));
        }
        Ok(())
    }

    /// Total packed record width this layout expects.
    pub fn packed_columns(&self) -> usize {
        self.leading_columns
            + self
                .zones
                .iter()
                .map(Zone::packed_columns)
                .sum::<usize>()
    }

    /// Number of bins after replicating every zone to the finest step.
    pub fn altitude_bins(&self) -> usize {
        self.zones
            .iter()
            .map(|zone| zone.bins * self.factor(zone))
            .sum()
    }

    /// Nearest-neighbor replication factor of `zone`.
    pub fn factor(&self, zone: &Zone) -> usize {
        (zone.step_m / self.zones[0].step_m) as usize
    }

    pub fn finest_step_km(&self) -> f64 {
        f64::from(self.zones[0].step_m) / 1000.0
    }

    /// Returns the altitude, in km, of every output bin, lowest first.
    #[allow(clippy::cast_precision_loss)]
    pub fn altitude_axis(&self) -> Box<[f64]> {
        let base = self.base_km;
        let step = self.finest_step_km();
        (0..self.altitude_bins())
            .map(|i| base + i as f64 * step)
            .collect()
    }
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self::CALIPSO_V4
    }
}
