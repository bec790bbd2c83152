//! Granule field access.
//!
//! The lidar file format itself (HDF4) is out of scope. Instead,
//! anything able to hand out named 2-D arrays implements
//! [`DatasetReader`]. Two readers ship with this crate:
//!
//! - [`MemGranule`], fields held in memory.
//! - [`RawGranule`], a directory holding one raw field file per field,
//!   as written by [`write_field`].
//!
//! # Raw field file layout
//!
//! All values little endian.
//!
//! | offset | size                | content                                   |
//! |--------|---------------------|-------------------------------------------|
//! | 0      | 4                   | magic `VFR1`                              |
//! | 4      | 1                   | dtype: 1 `u16`, 2 `i16`, 3 `f32`, 4 `f64` |
//! | 5      | 8                   | rows                                      |
//! | 13     | 8                   | cols                                      |
//! | 21     | rows * cols * width | row-major samples                         |

use crate::{array::Array2, error::VfmError, track::Track};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use log::debug;
use memmap2::Mmap;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

/// Well-known CALIPSO field names.
pub mod fields {
    pub const FEATURE_CLASSIFICATION_FLAGS: &str = "Feature_Classification_Flags";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const EXTINCTION_532: &str = "Extinction_Coefficient_532";
    pub const EXTINCTION_1064: &str = "Extinction_Coefficient_1064";
    pub const TOTAL_BACKSCATTER_532: &str = "Total_Backscatter_Coefficient_532";
    pub const TOTAL_ATTENUATED_BACKSCATTER_532: &str = "Total_Attenuated_Backscatter_532";
    pub const LIDAR_DATA_ALTITUDES: &str = "Lidar_Data_Altitudes";
    pub const LAYER_TOP_ALTITUDE: &str = "Layer_Top_Altitude";
    pub const LAYER_BASE_ALTITUDE: &str = "Layer_Base_Altitude";
}

const MAGIC: &[u8; 4] = b"VFR1";
const HEADER_LEN: u64 = 4 + 1 + 8 + 8;
const EXTENSION: &str = "vfr";

/// A typed 2-D granule field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    U16(Array2<u16>),
    I16(Array2<i16>),
    F32(Array2<f32>),
    F64(Array2<f64>),
}

impl Field {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Self::U16(arr) => arr.rows(),
            Self::I16(arr) => arr.rows(),
            Self::F32(arr) => arr.rows(),
            Self::F64(arr) => arr.rows(),
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            Self::U16(arr) => arr.cols(),
            Self::I16(arr) => arr.cols(),
            Self::F32(arr) => arr.cols(),
            Self::F64(arr) => arr.cols(),
        }
    }

    /// Returns the packed flag words of this field.
    ///
    /// `name` is only used for error reporting.
    pub fn into_u16(self, name: &str) -> Result<Array2<u16>, VfmError> {
        match self {
            Self::U16(arr) => Ok(arr),
            other => Err(VfmError::DataType {
                field: name.to_owned(),
                expected: "u16",
                found: other.type_name(),
            }),
        }
    }

    /// Returns this field widened to `f64`.
    pub fn into_f64(self) -> Array2<f64> {
        match self {
            Self::U16(arr) => arr.map(|v| f64::from(*v)),
            Self::I16(arr) => arr.map(|v| f64::from(*v)),
            Self::F32(arr) => arr.map(|v| f64::from(*v)),
            Self::F64(arr) => arr,
        }
    }

    fn dtype(&self) -> u8 {
        match self {
            Self::U16(_) => 1,
            Self::I16(_) => 2,
            Self::F32(_) => 3,
            Self::F64(_) => 4,
        }
    }
}

impl From<Array2<u16>> for Field {
    fn from(arr: Array2<u16>) -> Self {
        Self::U16(arr)
    }
}

impl From<Array2<i16>> for Field {
    fn from(arr: Array2<i16>) -> Self {
        Self::I16(arr)
    }
}

impl From<Array2<f32>> for Field {
    fn from(arr: Array2<f32>) -> Self {
        Self::F32(arr)
    }
}

impl From<Array2<f64>> for Field {
    fn from(arr: Array2<f64>) -> Self {
        Self::F64(arr)
    }
}

/// Named-field access to one granule.
pub trait DatasetReader {
    /// Granule identifier, usually the file stem.
    fn name(&self) -> &str;

    /// Returns field `name`, or [`VfmError::MissingField`].
    fn field(&self, name: &str) -> Result<Field, VfmError>;

    /// Returns packed flag field `name`.
    fn flags(&self, name: &str) -> Result<Array2<u16>, VfmError> {
        self.field(name)?.into_u16(name)
    }

    /// Returns numeric field `name` as `f64`.
    fn science(&self, name: &str) -> Result<Array2<f64>, VfmError> {
        Ok(self.field(name)?.into_f64())
    }

    /// Returns the footprint track from the first column of
    /// `Latitude` and `Longitude`.
    fn track(&self) -> Result<Track, VfmError> {
        let latitude = self.science(fields::LATITUDE)?;
        let longitude = self.science(fields::LONGITUDE)?;
        Ok(Track::from_fields(&latitude, &longitude))
    }

    /// Returns every value of `Lidar_Data_Altitudes`, in km, in
    /// storage order.
    fn altitudes(&self) -> Result<Vec<f64>, VfmError> {
        Ok(self.science(fields::LIDAR_DATA_ALTITUDES)?.into_vec())
    }
}

impl<R: DatasetReader + ?Sized> DatasetReader for &R {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn field(&self, name: &str) -> Result<Field, VfmError> {
        (**self).field(name)
    }
}

/// A granule held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemGranule {
    name: String,
    fields: HashMap<String, Field>,
}

impl MemGranule {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: HashMap::new(),
        }
    }

    /// Adds (or replaces) field `name`.
    pub fn with<S: Into<String>, F: Into<Field>>(mut self, name: S, field: F) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }
}

impl DatasetReader for MemGranule {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Result<Field, VfmError> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| VfmError::MissingField(name.to_owned()))
    }
}

/// How to read raw field files.
///
/// The trade off between reading fields into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding. Either way, file handles and maps are released as soon
/// as a field has been extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Read through a buffered file handle.
    #[default]
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// A granule stored as a directory of raw field files.
#[derive(Debug, Clone)]
pub struct RawGranule {
    /// Directory containing `<field>.vfr` files.
    dir: PathBuf,

    /// Directory file name.
    name: String,

    /// How to read field files.
    mode: ReadMode,
}

impl RawGranule {
    pub fn open(dir: PathBuf, mode: ReadMode) -> Result<Self, VfmError> {
        let mut has_fields = false;

        // Fail early if `dir` has no field files at all.
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if Some(EXTENSION) == path.extension().and_then(std::ffi::OsStr::to_str) {
                has_fields = true;
                break;
            }
        }

        if !has_fields {
            return Err(VfmError::NoFields(dir));
        }

        let name = dir
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or_default()
            .to_owned();
        Ok(Self { dir, name, mode })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn field_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }
}

impl DatasetReader for RawGranule {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Result<Field, VfmError> {
        let path = self.field_path(name);
        if !path.exists() {
            return Err(VfmError::MissingField(name.to_owned()));
        }
        debug!("reading {path:?}");
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        match self.mode {
            ReadMode::InMem => read_field(&mut BufReader::new(file), file_len, &path),
            ReadMode::MemMap => {
                // Safety: the map is private to this call and dropped
                // before returning.
                let mmap = unsafe { Mmap::map(&file)? };
                let mut bytes: &[u8] = &mmap;
                read_field(&mut bytes, file_len, &path)
            }
        }
    }
}

/// Writes `field` to `path` in raw field file layout.
pub fn write_field<P: AsRef<Path>>(path: P, field: &Field) -> Result<(), VfmError> {
    let mut wtr = BufWriter::new(File::create(path)?);
    wtr.write_all(MAGIC)?;
    wtr.write_u8(field.dtype())?;
    wtr.write_u64::<LE>(field.rows() as u64)?;
    wtr.write_u64::<LE>(field.cols() as u64)?;
    match field {
        Field::U16(arr) => {
            for v in arr.as_slice() {
                wtr.write_u16::<LE>(*v)?;
            }
        }
        Field::I16(arr) => {
            for v in arr.as_slice() {
                wtr.write_i16::<LE>(*v)?;
            }
        }
        Field::F32(arr) => {
            for v in arr.as_slice() {
                wtr.write_f32::<LE>(*v)?;
            }
        }
        Field::F64(arr) => {
            for v in arr.as_slice() {
                wtr.write_f64::<LE>(*v)?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Parses one raw field file from `rdr`.
///
/// `file_len` must equal the header plus exactly `rows * cols`
/// samples.
fn read_field<R: Read>(rdr: &mut R, file_len: u64, path: &Path) -> Result<Field, VfmError> {
    let mk_err = || VfmError::Header(path.to_owned());

    let mut magic = [0_u8; 4];
    rdr.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(mk_err());
    }
    let dtype = rdr.read_u8()?;
    let rows = rdr.read_u64::<LE>()?;
    let cols = rdr.read_u64::<LE>()?;

    let sample_size: u64 = match dtype {
        1 | 2 => 2,
        3 => 4,
        4 => 8,
        _ => return Err(mk_err()),
    };
    let n = rows.checked_mul(cols).ok_or_else(mk_err)?;
    let expected_len = n
        .checked_mul(sample_size)
        .and_then(|data_len| data_len.checked_add(HEADER_LEN));
    if expected_len != Some(file_len) {
        return Err(mk_err());
    }
    let (rows, cols, n) = (
        usize::try_from(rows).map_err(|_| mk_err())?,
        usize::try_from(cols).map_err(|_| mk_err())?,
        usize::try_from(n).map_err(|_| mk_err())?,
    );

    let field = match dtype {
        1 => {
            let mut data = vec![0_u16; n];
            rdr.read_u16_into::<LE>(&mut data)?;
            Field::U16(Array2::from_vec(rows, cols, data)?)
        }
        2 => {
            let mut data = vec![0_i16; n];
            rdr.read_i16_into::<LE>(&mut data)?;
            Field::I16(Array2::from_vec(rows, cols, data)?)
        }
        3 => {
            let mut data = vec![0_f32; n];
            rdr.read_f32_into::<LE>(&mut data)?;
            Field::F32(Array2::from_vec(rows, cols, data)?)
        }
        _ => {
            let mut data = vec![0_f64; n];
            rdr.read_f64_into::<LE>(&mut data)?;
            Field::F64(Array2::from_vec(rows, cols, data)?)
        }
    };
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::{
        fields, write_field, Array2, DatasetReader, Field, MemGranule, RawGranule, ReadMode,
        VfmError,
    };
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vfm-reader-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_fields() -> Vec<(&'static str, Field)> {
        vec![
            (
                fields::FEATURE_CLASSIFICATION_FLAGS,
                Array2::from_vec(2, 3, vec![1_u16, 2, 3, 4, 5, 0xffff])
                    .unwrap()
                    .into(),
            ),
            (
                fields::LATITUDE,
                Array2::column_vec(vec![50.25_f32, 51.5]).into(),
            ),
            (
                fields::LONGITUDE,
                Array2::column_vec(vec![-110.0_f64, -109.5]).into(),
            ),
            (
                fields::LAYER_TOP_ALTITUDE,
                Array2::from_vec(1, 2, vec![-9999_i16, 3]).unwrap().into(),
            ),
        ]
    }

    fn roundtrip(mode: ReadMode) {
        let dir = scratch_dir(&format!("{mode:?}"));
        for (name, field) in sample_fields() {
            write_field(dir.join(format!("{name}.vfr")), &field).unwrap();
        }
        let granule = RawGranule::open(dir.clone(), mode).unwrap();
        for (name, field) in sample_fields() {
            assert_eq!(granule.field(name).unwrap(), field);
        }
        let track = granule.track().unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.get(0).unwrap().y, 50.25);
        assert_eq!(track.get(1).unwrap().x, -109.5);
        assert!(matches!(
            granule.field(fields::EXTINCTION_532),
            Err(VfmError::MissingField(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_raw_granule_in_mem() {
        roundtrip(ReadMode::InMem);
    }

    #[test]
    fn test_raw_granule_mem_map() {
        roundtrip(ReadMode::MemMap);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let dir = scratch_dir("truncated");
        let path = dir.join("Latitude.vfr");
        write_field(&path, &Array2::column_vec(vec![1.0_f64, 2.0]).into()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        let granule = RawGranule::open(dir.clone(), ReadMode::InMem).unwrap();
        assert!(matches!(
            granule.field(fields::LATITUDE),
            Err(VfmError::Header(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_empty_dir_is_rejected() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            RawGranule::open(dir.clone(), ReadMode::InMem),
            Err(VfmError::NoFields(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_mem_granule() {
        let granule = MemGranule::new("19_1_VFM").with(
            fields::FEATURE_CLASSIFICATION_FLAGS,
            Array2::column_vec(vec![3_u16]),
        );
        assert_eq!(granule.name(), "19_1_VFM");
        assert_eq!(
            granule
                .flags(fields::FEATURE_CLASSIFICATION_FLAGS)
                .unwrap()
                .as_slice(),
            &[3]
        );
        assert!(matches!(
            granule.science(fields::LATITUDE),
            Err(VfmError::MissingField(_))
        ));
    }

    #[test]
    fn test_flags_reject_float_fields() {
        let granule =
            MemGranule::new("g").with(fields::LATITUDE, Array2::column_vec(vec![1.0_f32]));
        assert!(matches!(
            granule.flags(fields::LATITUDE),
            Err(VfmError::DataType {
                expected: "u16",
                found: "f32",
                ..
            })
        ));
    }
}
