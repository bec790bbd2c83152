use crate::{
    options::{Curtain, MinMax},
    output, Context,
};
use anyhow::Result;
use log::info;
use vfm::DatasetReader;

impl Curtain {
    pub fn run(&self, ctx: &Context) -> Result<()> {
        let granule = ctx.open(&self.granule)?;
        let mut builder = gridprof::Curtain::builder().max_altitude(self.max_altitude);
        if let Some(MinMax(min, max)) = self.lon {
            builder = builder.longitude(min, max);
        }
        let mut curtain = builder.build_granule(&granule)?;
        info!(
            "{}: curtain of {} footprints x {} bins",
            granule.name(),
            curtain.footprints(),
            curtain.altitude.len()
        );
        if let Some(levels) = self.levels {
            curtain = curtain.regrid(levels, self.bottom, self.top)?;
        }
        output::json(self.out.as_deref(), &curtain)
    }
}
