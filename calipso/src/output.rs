use anyhow::Result;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Opens `path` for writing, or stdout if `None`.
pub fn writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// Writes `value` as pretty JSON to `path`, or stdout if `None`.
pub fn json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut wtr = writer(path)?;
    serde_json::to_writer_pretty(&mut wtr, value)?;
    writeln!(wtr)?;
    wtr.flush()?;
    Ok(())
}
