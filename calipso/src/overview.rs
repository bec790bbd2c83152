use crate::{
    options::{MinMax, Overview},
    output, Context,
};
use anyhow::Result;
use gridprof::{Batch, FireRecord, Fires, GridSpec, Skipped, Trajectory};
use serde::Serialize;
use vfm::RawGranule;

#[derive(Debug, Serialize)]
struct Document {
    #[serde(flatten)]
    overview: gridprof::Overview,
    fires: Vec<FireRecord>,
    skipped: Vec<Skipped>,
}

impl Overview {
    pub fn run(&self, ctx: &Context) -> Result<()> {
        let MinMax(lat_min, lat_max) = self.lat;
        let MinMax(lon_min, lon_max) = self.lon;
        let grid =
            GridSpec::square(lat_min, lat_max, lon_min, lon_max, self.step).with_lon_inclusive(true);

        let mut granules: Vec<RawGranule> = Vec::with_capacity(self.input.len());
        let mut unopened = Vec::new();
        for path in &self.input {
            match ctx.open(path) {
                Ok(granule) => granules.push(granule),
                Err(e) => unopened.push((path.display().to_string(), e)),
            }
        }
        let mut report = Batch::new().run(&granules, Trajectory::from_granule);
        for (granule, err) in unopened {
            report.skip(granule, err);
        }

        let fires = match &self.fires {
            Some(path) => {
                let fires = Fires::from_path(path)?;
                match self.on {
                    Some(date) => fires.on(date).records,
                    None => fires.records,
                }
            }
            None => Vec::new(),
        };

        let trajectories = report.done.into_iter().map(|(_, t)| t).collect();
        let document = Document {
            overview: gridprof::Overview::new(&grid, trajectories)?,
            fires,
            skipped: report.skipped,
        };
        output::json(self.out.as_deref(), &document)
    }
}
