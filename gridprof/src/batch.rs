//! Parallel per-granule processing.

use crate::{
    derive::{Angstrom, Identity},
    selector::{SelectedProfile, Selector},
    GridError,
};
use dashmap::DashMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use vfm::{fields, DatasetReader};

/// A granule that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub granule: String,
    pub reason: String,
}

/// Outcome of a batch, ordered by granule name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report<T> {
    pub done: Vec<(String, T)>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Report<T> {
    fn default() -> Self {
        Self {
            done: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Report<T> {
    /// Records a granule that failed before reaching the batch, for
    /// instance one that could not be opened.
    pub fn skip<S: Into<String>, E: std::fmt::Display>(&mut self, granule: S, err: E) {
        let granule = granule.into();
        let reason = err.to_string();
        warn!("{granule}: skipped, {reason}");
        self.skipped.push(Skipped { granule, reason });
        self.skipped.sort_by(|a, b| a.granule.cmp(&b.granule));
    }
}

/// Applies one job to many granules in parallel.
///
/// A failing granule never aborts the others; its error becomes a
/// [`Skipped`] entry in the report.
#[derive(Default)]
pub struct Batch<'a> {
    on_finish: Option<Box<dyn Fn(&str) + Send + Sync + 'a>>,
}

impl<'a> Batch<'a> {
    pub fn new() -> Self {
        Self { on_finish: None }
    }

    /// Calls `f` with the granule name each time a granule finishes,
    /// successfully or not.
    pub fn on_finish<F: Fn(&str) + Send + Sync + 'a>(mut self, f: F) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    pub fn run<R, T, F>(&self, granules: &[R], job: F) -> Report<T>
    where
        R: DatasetReader + Sync,
        T: Send + Sync,
        F: Fn(&R) -> Result<T, GridError> + Sync,
    {
        let now = std::time::Instant::now();
        let results: DashMap<String, Result<T, String>> = DashMap::new();

        granules.par_iter().for_each(|granule| {
            let name = granule.name().to_owned();
            info!("{name}: processing");
            let result = job(granule).map_err(|e| e.to_string());
            if let Err(reason) = &result {
                warn!("{name}: skipped, {reason}");
            }
            if let Some(f) = &self.on_finish {
                f(&name);
            }
            if results.insert(name.clone(), result).is_some() {
                warn!("{name}: duplicate granule name, keeping the last result");
            }
        });

        let mut report = Report::default();
        let mut entries: Vec<(String, Result<T, String>)> = results.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (granule, result) in entries {
            match result {
                Ok(value) => report.done.push((granule, value)),
                Err(reason) => report.skipped.push(Skipped { granule, reason }),
            }
        }

        debug!(
            "batch; granules: {}, done: {}, skipped: {}, exec: {:?}",
            granules.len(),
            report.done.len(),
            report.skipped.len(),
            now.elapsed()
        );
        report
    }
}

/// Ångström exponent selection from 532 and 1064 nm extinction.
pub fn select_angstrom<R: DatasetReader>(
    selector: &Selector<Angstrom>,
    reader: &R,
) -> Result<Vec<SelectedProfile>, GridError> {
    selector.select_granule(reader, &[fields::EXTINCTION_532, fields::EXTINCTION_1064])
}

/// Total backscatter selection at 532 nm.
pub fn select_backscatter<R: DatasetReader>(
    selector: &Selector<Identity>,
    reader: &R,
) -> Result<Vec<SelectedProfile>, GridError> {
    selector.select_granule(reader, &[fields::TOTAL_BACKSCATTER_532])
}
