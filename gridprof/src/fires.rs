//! Active fire detections (MODIS CSV exports).

use crate::{math::mean, GridError};
use chrono::{Datelike, Days, NaiveDate};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io, path::Path};

/// One fire detection. Extra CSV columns are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireRecord {
    pub latitude: f64,
    pub longitude: f64,

    /// Brightness temperature, in kelvin.
    pub brightness: f64,

    pub acq_date: NaiveDate,
}

/// Map marker radius for a detection of `brightness` kelvin.
pub fn marker_radius(brightness: f64) -> f64 {
    ((brightness - 300.0) / 10.0).max(1.0)
}

/// Detection count of one Monday-anchored week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekCount {
    /// 1-based week number.
    pub number: usize,

    /// First day (a Monday), inclusive.
    pub start: NaiveDate,

    /// Last day (a Sunday), inclusive.
    pub end: NaiveDate,

    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fires {
    pub records: Vec<FireRecord>,
}

impl Fires {
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, GridError> {
        let records = csv::Reader::from_reader(rdr)
            .deserialize()
            .collect::<Result<Vec<FireRecord>, _>>()?;
        Ok(Self { records })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let records = csv::Reader::from_path(path)?
            .deserialize()
            .collect::<Result<Vec<FireRecord>, _>>()?;
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns detections acquired from `start` through `end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filter(|r| start <= r.acq_date && r.acq_date <= end)
    }

    /// Returns detections acquired on `date`.
    pub fn on(&self, date: NaiveDate) -> Self {
        self.filter(|r| r.acq_date == date)
    }

    /// Returns the date with the most detections and its count. Ties
    /// go to the earliest date.
    pub fn busiest_day(&self) -> Option<(NaiveDate, usize)> {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.acq_date).or_default() += 1;
        }
        // `max_by_key` keeps the last maximum, so walk latest first.
        counts.into_iter().rev().max_by_key(|(_, count)| *count)
    }

    /// Mean detection location, `x` is longitude.
    pub fn centroid(&self) -> Option<Coord<f64>> {
        let lats: Vec<f64> = self.records.iter().map(|r| r.latitude).collect();
        let lons: Vec<f64> = self.records.iter().map(|r| r.longitude).collect();
        Some(Coord {
            x: mean(&lons)?,
            y: mean(&lats)?,
        })
    }

    /// Counts detections per week for every Monday from `start`
    /// through `end`.
    ///
    /// Each week runs Monday to Sunday; the last week may extend past
    /// `end`.
    pub fn weekly(&self, start: NaiveDate, end: NaiveDate) -> Vec<WeekCount> {
        let offset = (7 - start.weekday().num_days_from_monday()) % 7;
        let mut monday = start.checked_add_days(Days::new(u64::from(offset)));
        let mut weeks = Vec::new();
        while let Some(first) = monday.filter(|day| *day <= end) {
            let Some(last) = first.checked_add_days(Days::new(6)) else {
                break;
            };
            weeks.push(WeekCount {
                number: weeks.len() + 1,
                start: first,
                end: last,
                count: self.between(first, last).len(),
            });
            monday = first.checked_add_days(Days::new(7));
        }
        weeks
    }

    fn filter<F: Fn(&FireRecord) -> bool>(&self, pred: F) -> Self {
        Self {
            records: self.records.iter().filter(|r| pred(r)).copied().collect(),
        }
    }
}

/// Returns the week with the most detections, the first one on ties.
pub fn busiest_week(weeks: &[WeekCount]) -> Option<&WeekCount> {
    weeks
        .iter()
        .rev()
        .max_by_key(|week| week.count)
}
