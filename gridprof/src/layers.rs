//! Aerosol layer extents from level 2 layer products.

use crate::GridError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io, path::Path};
use vfm::{codes, fields, reconcile, AerosolType, Array2, DatasetReader, Track, SENTINEL};

/// Altitude and latitude extent of every layer sharing one aerosol
/// subtype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSummary {
    pub subtype: AerosolType,

    /// Highest layer top, in km.
    pub top_km: f64,

    /// Lowest layer base, in km.
    pub base_km: f64,

    pub lat_min: f64,
    pub lat_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFilter {
    /// Southern edge of the latitude window, inclusive.
    pub lat_min: f64,

    /// Northern edge of the latitude window, inclusive.
    pub lat_max: f64,

    /// Layers whose top or base lies above this altitude are skipped.
    pub max_altitude_km: f64,
}

impl LayerFilter {
    pub fn new(lat_min: f64, lat_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            max_altitude_km: 10.0,
        }
    }

    pub fn max_altitude(mut self, km: f64) -> Self {
        self.max_altitude_km = km;
        self
    }

    fn accepts(&self, top: f64, base: f64) -> bool {
        top != SENTINEL
            && base != SENTINEL
            && top <= self.max_altitude_km
            && base <= self.max_altitude_km
    }

    /// Summarizes layer slots by tropospheric aerosol subtype.
    ///
    /// `flags`, `top` and `base` are `footprints x layer slots`. A slot
    /// takes part when its footprint lies inside the latitude window
    /// and both its top and base altitudes are valid and under the
    /// cap. Non-aerosol slots are reported as
    /// [`AerosolType::NotDetermined`]. Summaries are ordered by
    /// subtype code.
    pub fn summarize(
        &self,
        track: &Track,
        flags: &Array2<u16>,
        top: &Array2<f64>,
        base: &Array2<f64>,
    ) -> Result<Vec<LayerSummary>, GridError> {
        for arr in [top, base] {
            if arr.cols() != flags.cols() {
                return Err(GridError::Bins {
                    expected: flags.cols(),
                    found: arr.cols(),
                });
            }
        }
        let footprints = [top.rows(), base.rows()]
            .into_iter()
            .fold(track.len().min(flags.rows()), usize::min);

        let mut by_code: BTreeMap<u8, LayerSummary> = BTreeMap::new();
        for (idx, coord) in track.coords()[..footprints].iter().enumerate() {
            let lat = coord.y;
            if !(self.lat_min <= lat && lat <= self.lat_max) {
                continue;
            }
            let slots = flags
                .row(idx)
                .iter()
                .zip(top.row(idx))
                .zip(base.row(idx));
            for ((&flag, &top_km), &base_km) in slots {
                if !self.accepts(top_km, base_km) {
                    continue;
                }
                let code = codes::tropospheric_subtype(flag);
                let Some(subtype) = AerosolType::from_combined(code) else {
                    continue;
                };
                by_code
                    .entry(code)
                    .and_modify(|s| {
                        s.top_km = s.top_km.max(top_km);
                        s.base_km = s.base_km.min(base_km);
                        s.lat_min = s.lat_min.min(lat);
                        s.lat_max = s.lat_max.max(lat);
                    })
                    .or_insert(LayerSummary {
                        subtype,
                        top_km,
                        base_km,
                        lat_min: lat,
                        lat_max: lat,
                    });
            }
        }
        debug!(
            "summarize; footprints: {}, subtypes: {}",
            footprints,
            by_code.len()
        );
        Ok(by_code.into_values().collect())
    }

    /// Reads flags, layer altitudes and the track from a layer granule
    /// and summarizes them.
    pub fn summarize_granule<R: DatasetReader>(
        &self,
        reader: &R,
    ) -> Result<Vec<LayerSummary>, GridError> {
        let mut track = reader.track()?;
        let mut flags = reader.flags(fields::FEATURE_CLASSIFICATION_FLAGS)?;
        let mut top = reader.science(fields::LAYER_TOP_ALTITUDE)?;
        let mut base = reader.science(fields::LAYER_BASE_ALTITUDE)?;
        reconcile(&mut track, &mut [&mut top, &mut base]);
        flags.truncate_rows(track.len());
        self.summarize(&track, &flags, &top, &base)
    }
}

/// One row of the latitude table: a profile granule and the latitude
/// window of interest in it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatitudeEntry {
    #[serde(rename = "File_Name")]
    pub file_name: String,

    #[serde(rename = "Lat_Min")]
    pub lat_min: f64,

    #[serde(rename = "Lat_Max")]
    pub lat_max: f64,
}

impl LatitudeEntry {
    /// Name of the layer granule matching this profile granule.
    pub fn layer_granule(&self) -> String {
        self.file_name.replace("_PRO", "_LAY")
    }

    pub fn filter(&self) -> LayerFilter {
        LayerFilter::new(self.lat_min, self.lat_max)
    }
}

/// Per-granule latitude windows, read from CSV with a
/// `File_Name,Lat_Min,Lat_Max` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatitudeTable {
    pub entries: Vec<LatitudeEntry>,
}

impl LatitudeTable {
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, GridError> {
        let entries = csv::Reader::from_reader(rdr)
            .deserialize()
            .collect::<Result<Vec<LatitudeEntry>, _>>()?;
        Ok(Self { entries })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let entries = csv::Reader::from_path(path)?
            .deserialize()
            .collect::<Result<Vec<LatitudeEntry>, _>>()?;
        Ok(Self { entries })
    }
}

/// One exported layer record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRow {
    #[serde(rename = "Layer_Base_Altitude")]
    pub base_km: f64,

    #[serde(rename = "Layer_Top_Altitude")]
    pub top_km: f64,

    /// Number of distinct subtypes found in the granule.
    #[serde(rename = "Number_of_Layers")]
    pub layers: usize,

    #[serde(rename = "Lat_Min")]
    pub lat_min: f64,

    #[serde(rename = "Lat_Max")]
    pub lat_max: f64,

    #[serde(rename = "Subtype")]
    pub subtype: &'static str,

    #[serde(rename = "File_Name")]
    pub file_name: String,
}

/// Flattens the summaries of one granule into export rows.
pub fn layer_rows(file_name: &str, summaries: &[LayerSummary]) -> Vec<LayerRow> {
    summaries
        .iter()
        .map(|s| LayerRow {
            base_km: s.base_km,
            top_km: s.top_km,
            layers: summaries.len(),
            lat_min: s.lat_min,
            lat_max: s.lat_max,
            subtype: s.subtype.label(),
            file_name: file_name.to_owned(),
        })
        .collect()
}

/// Writes `rows` as CSV with a header line.
pub fn write_layer_rows<W: io::Write>(wtr: W, rows: &[LayerRow]) -> Result<(), GridError> {
    let mut wtr = csv::Writer::from_writer(wtr);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{layer_rows, write_layer_rows, LatitudeTable, LayerFilter};
    use vfm::{fields, AerosolType, Array2, MemGranule, Track};

    const SMOKE: u16 = 3 | (6 << 9);
    const DUST: u16 = 3 | (2 << 9);
    const CLOUD: u16 = 2 | (6 << 9);

    fn sample() -> (Track, Array2<u16>, Array2<f64>, Array2<f64>) {
        let track = Track::new(&[40.0, 45.0, 50.0, 55.0], &[0.0; 4]);
        let flags = Array2::from_vec(4, 2, vec![SMOKE, 0, SMOKE, DUST, SMOKE, CLOUD, SMOKE, 0])
            .unwrap();
        let top = Array2::from_vec(
            4,
            2,
            vec![9.0, -9999.0, 4.0, 3.0, 6.0, 8.0, 9.9, -9999.0],
        )
        .unwrap();
        let base = Array2::from_vec(
            4,
            2,
            vec![8.0, -9999.0, 1.5, 0.5, 2.0, 7.0, 9.0, -9999.0],
        )
        .unwrap();
        (track, flags, top, base)
    }

    #[test]
    fn test_summarize() {
        let (track, flags, top, base) = sample();
        let summaries = LayerFilter::new(44.0, 51.0)
            .summarize(&track, &flags, &top, &base)
            .unwrap();
        let types: Vec<AerosolType> = summaries.iter().map(|s| s.subtype).collect();
        assert_eq!(
            types,
            vec![
                AerosolType::NotDetermined,
                AerosolType::Dust,
                AerosolType::Smoke
            ]
        );
        let smoke = summaries[2];
        assert_eq!((smoke.base_km, smoke.top_km), (1.5, 6.0));
        assert_eq!((smoke.lat_min, smoke.lat_max), (45.0, 50.0));
        // The cloud slot counts as not determined.
        assert_eq!(summaries[0].top_km, 8.0);
    }

    #[test]
    fn test_altitude_cap() {
        let (track, flags, top, base) = sample();
        let summaries = LayerFilter::new(54.0, 56.0)
            .max_altitude(9.5)
            .summarize(&track, &flags, &top, &base)
            .unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_summarize_granule() {
        let (_, flags, top, base) = sample();
        let granule = MemGranule::new("CAL_LID_L2_05kmALay")
            .with(fields::LATITUDE, Array2::column_vec(vec![40.0_f64, 45.0, 50.0]))
            .with(fields::LONGITUDE, Array2::column_vec(vec![0.0_f64; 3]))
            .with(fields::FEATURE_CLASSIFICATION_FLAGS, flags)
            .with(fields::LAYER_TOP_ALTITUDE, top)
            .with(fields::LAYER_BASE_ALTITUDE, base);
        let summaries = LayerFilter::new(30.0, 60.0)
            .summarize_granule(&granule)
            .unwrap();
        let smoke = summaries.last().unwrap();
        assert_eq!(smoke.subtype, AerosolType::Smoke);
        assert_eq!((smoke.lat_min, smoke.lat_max), (40.0, 50.0));
    }

    #[test]
    fn test_latitude_table_and_export() {
        let csv = "File_Name,Lat_Min,Lat_Max\n22_1_PRO.hdf,42.5,55\n";
        let table = LatitudeTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.entries.len(), 1);
        let entry = &table.entries[0];
        assert_eq!(entry.layer_granule(), "22_1_LAY.hdf");
        assert_eq!(entry.filter().lat_min, 42.5);

        let (track, flags, top, base) = sample();
        let summaries = entry.filter().summarize(&track, &flags, &top, &base).unwrap();
        let rows = layer_rows(&entry.file_name, &summaries);
        assert!(rows.iter().all(|r| r.layers == summaries.len()));

        let mut out = Vec::new();
        write_layer_rows(&mut out, &rows).unwrap();
        let out = String::from_utf8(out).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Layer_Base_Altitude,Layer_Top_Altitude,Number_of_Layers,Lat_Min,Lat_Max,Subtype,File_Name"
        );
        assert!(out.contains(",Smoke,22_1_PRO.hdf"));
    }

    #[test]
    fn test_pro_to_lay() {
        let table =
            LatitudeTable::from_reader("File_Name,Lat_Min,Lat_Max\n19_2_PRO.hdf,1,2\n".as_bytes())
                .unwrap();
        assert_eq!(table.entries[0].layer_granule(), "19_2_LAY.hdf");
    }
}
