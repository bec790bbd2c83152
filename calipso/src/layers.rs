use crate::{options::Layers, output, Context};
use anyhow::Result;
use gridprof::{
    layers::{layer_rows, write_layer_rows},
    LatitudeTable,
};
use log::{info, warn};

impl Layers {
    pub fn run(&self, ctx: &Context) -> Result<()> {
        let table = LatitudeTable::from_path(&self.table)?;
        let mut rows = Vec::new();
        for entry in &table.entries {
            let name = entry.layer_granule();
            let filter = entry.filter().max_altitude(self.max_altitude);
            let summaries = ctx
                .open(&self.dir.join(&name))
                .and_then(|granule| Ok(filter.summarize_granule(&granule)?));
            match summaries {
                Ok(summaries) => {
                    info!("{name}: {} layer subtypes", summaries.len());
                    rows.extend(layer_rows(&entry.file_name, &summaries));
                }
                Err(e) => warn!("{name}: skipped, {e}"),
            }
        }
        write_layer_rows(output::writer(self.out.as_deref())?, &rows)?;
        Ok(())
    }
}
