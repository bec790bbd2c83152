//! Grid matching and best-profile selection for CALIPSO granules.
//!
//! [`Selector`] walks a regular lat/lon grid and, for every cell,
//! picks the nearby footprint whose derived profile ranks highest.
//! The remaining modules cover along-track curtains, layer extents,
//! fire detections and parallel batch runs over many granules.

mod batch;
mod curtain;
mod derive;
mod error;
pub mod fires;
mod grid;
pub mod layers;
mod math;
mod overview;
mod selector;

pub use crate::{
    batch::{select_angstrom, select_backscatter, Batch, Report, Skipped},
    curtain::{Curtain, CurtainBuilder},
    derive::{Angstrom, Derivation, Identity, Statistic},
    error::GridError,
    fires::{FireRecord, Fires},
    grid::{GridCell, GridSpec, MAX_CELLS},
    layers::{LatitudeTable, LayerFilter, LayerSummary},
    overview::{pass_label, Overview, Trajectory},
    selector::{SelectedProfile, Selector, SelectorBuilder},
};
pub use vfm;
