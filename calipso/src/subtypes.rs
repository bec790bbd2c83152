use crate::{
    options::{MinMax, Subtypes},
    output, Context,
};
use anyhow::Result;
use log::info;
use vfm::{fields, DatasetReader, Decoder};

impl Subtypes {
    pub fn run(&self, ctx: &Context) -> Result<()> {
        let granule = ctx.open(&self.granule)?;
        let raw = granule.flags(fields::FEATURE_CLASSIFICATION_FLAGS)?;
        let track = granule.track()?;
        let decoder = Decoder::new(ctx.layout)?;
        let MinMax(min, max) = self.range;
        let subtypes = decoder.decode_window(&raw, &track, self.axis.into(), min, max)?;
        info!(
            "{}: {} footprints in [{min}, {max}]",
            granule.name(),
            subtypes.latitude.len()
        );
        output::json(self.out.as_deref(), &subtypes)
    }
}
