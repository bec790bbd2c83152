use crate::{options::Fires, output};
use anyhow::Result;
use chrono::NaiveDate;
use gridprof::fires::{busiest_week, marker_radius, FireRecord, WeekCount};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Summary {
    /// Detections between the start and end dates.
    detections: usize,
    busiest_day: Option<DayCount>,
    centroid: Option<Centroid>,
    weeks: Vec<WeekCount>,
    busiest_week: Option<WeekCount>,
    markers: Vec<Marker>,
}

#[derive(Debug, Serialize)]
struct DayCount {
    date: NaiveDate,
    count: usize,
}

#[derive(Debug, Serialize)]
struct Centroid {
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct Marker {
    #[serde(flatten)]
    record: FireRecord,
    radius: f64,
}

impl Fires {
    pub fn run(&self) -> Result<()> {
        let fires = gridprof::Fires::from_path(&self.csv)?;
        let window = fires.between(self.start, self.end);
        let busiest_day = window
            .busiest_day()
            .map(|(date, count)| DayCount { date, count });

        let centroid_date = self.on.or(busiest_day.as_ref().map(|d| d.date));
        let (centroid, markers) = match centroid_date {
            Some(date) => {
                let day = window.on(date);
                let centroid = day.centroid().map(|c| Centroid {
                    date,
                    latitude: c.y,
                    longitude: c.x,
                });
                let markers = day
                    .records
                    .iter()
                    .map(|r| Marker {
                        record: *r,
                        radius: marker_radius(r.brightness),
                    })
                    .collect();
                (centroid, markers)
            }
            None => (None, Vec::new()),
        };

        let weeks = fires.weekly(self.start, self.end);
        let summary = Summary {
            detections: window.len(),
            busiest_day,
            centroid,
            busiest_week: busiest_week(&weeks).copied(),
            weeks,
            markers,
        };
        output::json(self.out.as_deref(), &summary)
    }
}
