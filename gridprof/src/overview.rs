//! Coverage overview of a set of granules.

use crate::{
    grid::{GridCell, GridSpec},
    GridError,
};
use serde::Serialize;
use vfm::{DatasetReader, Track};

/// Ground track of one granule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub granule: String,

    /// Orbit pass parsed from the granule name, if any.
    pub pass: Option<u32>,

    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

impl Trajectory {
    pub fn new(granule: &str, track: &Track) -> Self {
        Self {
            granule: granule.to_owned(),
            pass: pass_label(granule),
            latitude: track.coords().iter().map(|c| c.y).collect(),
            longitude: track.coords().iter().map(|c| c.x).collect(),
        }
    }

    pub fn from_granule<R: DatasetReader>(reader: &R) -> Result<Self, GridError> {
        Ok(Self::new(reader.name(), &reader.track()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub grid: Vec<GridCell>,
    pub trajectories: Vec<Trajectory>,
}

impl Overview {
    pub fn new(grid: &GridSpec, trajectories: Vec<Trajectory>) -> Result<Self, GridError> {
        grid.validate()?;
        Ok(Self {
            grid: grid.cells(),
            trajectories,
        })
    }
}

/// Parses the pass number out of names like `19_2_L1`.
///
/// The label is the first `<digits>_<digits>_<level>` run found
/// anywhere in `name`, so directory prefixes and extensions are
/// tolerated.
pub fn pass_label(name: &str) -> Option<u32> {
    let parts: Vec<&str> = name.split(|c: char| c == '_' || c == '/' || c == '\\').collect();
    parts.windows(3).find_map(|w| {
        let day = w[0].rsplit(|c: char| !c.is_ascii_digit()).next()?;
        let level = w[2];
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if is_digits(day) && is_digits(w[1]) && level.starts_with('L') {
            w[1].parse().ok()
        } else {
            None
        }
    })
}
