//! CALIPSO vertical feature mask (VFM) decoding.
//!
//! The VFM packs three vertical resolution zones into one row per
//! along-track data record. [`Decoder`] unpacks them onto a single
//! 30 m altitude axis, and [`codes`] extracts feature types and
//! aerosol subtypes from the decoded flag words.
//!
//! # References
//!
//! 1. [CALIPSO Data User's Guide, VFM](https://www-calipso.larc.nasa.gov/resources/calipso_users_guide/data_summaries/vfm/)
//! 1. [Feature classification flags](https://www-calipso.larc.nasa.gov/resources/calipso_users_guide/data_summaries/layer/index_v420.php#feature_classification_flags)

mod array;
pub mod codes;
mod decode;
mod error;
mod layout;
pub mod reader;
mod track;

pub use crate::{
    array::Array2,
    codes::{AerosolType, FeatureType},
    decode::{Classification, Decoder, Subtypes},
    error::VfmError,
    layout::{Zone, ZoneLayout},
    reader::{fields, DatasetReader, Field, MemGranule, RawGranule, ReadMode},
    track::{reconcile, Axis, Track},
};
pub use geo;

/// Missing-value marker used by CALIPSO science fields.
pub const SENTINEL: f64 = -9999.0;
