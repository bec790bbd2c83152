use crate::{
    options::{Derive, Grid, MinMax},
    output, progress, Context,
};
use anyhow::Result;
use gridprof::{
    select_angstrom, select_backscatter, Angstrom, Batch, Derivation, GridSpec, Identity,
    Selector,
};
use vfm::RawGranule;

impl Grid {
    pub fn run(&self, ctx: &Context) -> Result<()> {
        let MinMax(lat_min, lat_max) = self.lat;
        let MinMax(lon_min, lon_max) = self.lon;
        let grid = GridSpec::square(lat_min, lat_max, lon_min, lon_max, self.step);

        let mut granules: Vec<RawGranule> = Vec::with_capacity(self.input.len());
        let mut unopened = Vec::new();
        for path in &self.input {
            match ctx.open(path) {
                Ok(granule) => granules.push(granule),
                Err(e) => unopened.push((path.display().to_string(), e)),
            }
        }

        let pb = progress::bar("Selecting profiles".to_string(), granules.len() as u64);
        let batch = Batch::new().on_finish(|_| pb.inc(1));
        let mut report = match self.derive {
            Derive::Angstrom => {
                let selector = self.selector(grid, Angstrom::CALIPSO)?;
                batch.run(&granules, |g| select_angstrom(&selector, g))
            }
            Derive::Backscatter => {
                let selector = self.selector(grid, Identity)?;
                batch.run(&granules, |g| select_backscatter(&selector, g))
            }
        };
        pb.finish_and_clear();

        for (granule, err) in unopened {
            report.skip(granule, err);
        }
        output::json(self.out.as_deref(), &report)
    }

    fn selector<D: Derivation>(&self, grid: GridSpec, derivation: D) -> Result<Selector<D>> {
        Ok(Selector::builder()
            .grid(grid)
            .derivation(derivation)
            .tolerance(self.tolerance, self.tolerance)
            .max_altitude(self.max_altitude)
            .statistic(self.statistic.into())
            .build()?)
    }
}
