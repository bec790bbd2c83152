use anyhow::{anyhow, Error as AnyError};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gridprof::Statistic;
use std::{path::PathBuf, str::FromStr};

/// Extract aerosol profiles and curtains from CALIPSO granules.
///
/// Granules are directories of raw field files, one `<Field>.vfr` per
/// product field.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Memory map field files instead of reading them.
    #[arg(long, global = true, default_value_t = false)]
    pub mmap: bool,

    /// JSON zone layout overriding the built-in CALIPSO V4 layout.
    #[arg(long, global = true)]
    pub layout: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Decode the feature mask of one granule into aerosol subtypes.
    Subtypes(Subtypes),

    /// Select the best profile of every grid cell in many granules.
    Grid(Grid),

    /// Cut a backscatter curtain from one level 1 granule.
    Curtain(Curtain),

    /// Export aerosol layer extents for a table of granules.
    Layers(Layers),

    /// Summarize fire detections.
    Fires(Fires),

    /// Grid points, granule tracks and fire locations in one document.
    Overview(Overview),
}

#[derive(Debug, Clone, Args)]
pub struct Subtypes {
    /// Window axis.
    #[arg(long, value_enum, default_value_t = WindowAxis::Longitude)]
    pub axis: WindowAxis,

    /// Window "min,max", in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub range: MinMax,

    /// Output file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// VFM granule directory.
    pub granule: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Grid {
    /// Derived quantity to rank.
    #[arg(short, long, value_enum)]
    pub derive: Derive,

    /// Grid latitude "min,max", in degrees.
    #[arg(long, allow_hyphen_values = true, default_value = "42,62")]
    pub lat: MinMax,

    /// Grid longitude "min,max", in degrees. `max` itself is excluded.
    #[arg(long, allow_hyphen_values = true, default_value = "-120,20")]
    pub lon: MinMax,

    /// Grid step, in degrees, along both axes.
    #[arg(long, default_value_t = 2.0)]
    pub step: f64,

    /// Candidate distance, in degrees, along both axes.
    #[arg(long, default_value_t = 1.0)]
    pub tolerance: f64,

    /// Ignore bins above this altitude, in km.
    #[arg(long, default_value_t = 10.0)]
    pub max_altitude: f64,

    #[arg(long, value_enum, default_value_t = StatisticArg::Mean)]
    pub statistic: StatisticArg,

    /// Output file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Level 2 profile granule directories.
    pub input: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct Curtain {
    /// Keep footprints with longitude in "min,max".
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<MinMax>,

    /// Ignore bins above this altitude, in km.
    #[arg(long, default_value_t = 10.0)]
    pub max_altitude: f64,

    /// Resample onto this many evenly spaced altitudes.
    #[arg(long)]
    pub levels: Option<usize>,

    /// Lowest resampled altitude, in km.
    #[arg(long, default_value_t = 0.0)]
    pub bottom: f64,

    /// Highest resampled altitude, in km.
    #[arg(long, default_value_t = 10.0)]
    pub top: f64,

    /// Output file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Level 1 granule directory.
    pub granule: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Layers {
    /// CSV with `File_Name,Lat_Min,Lat_Max` columns.
    #[arg(short, long)]
    pub table: PathBuf,

    /// Ignore layers above this altitude, in km.
    #[arg(long, default_value_t = 10.0)]
    pub max_altitude: f64,

    /// Output CSV file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Directory holding the layer granule directories.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Fires {
    /// First acquisition date, inclusive.
    #[arg(long)]
    pub start: NaiveDate,

    /// Last acquisition date, inclusive.
    #[arg(long)]
    pub end: NaiveDate,

    /// Report the centroid of this date instead of the busiest one.
    #[arg(long)]
    pub on: Option<NaiveDate>,

    /// Output file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// MODIS fire detection CSV.
    pub csv: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Overview {
    /// Grid latitude "min,max", in degrees.
    #[arg(long, allow_hyphen_values = true, default_value = "42,62")]
    pub lat: MinMax,

    /// Grid longitude "min,max", in degrees.
    #[arg(long, allow_hyphen_values = true, default_value = "-120,8")]
    pub lon: MinMax,

    /// Grid step, in degrees.
    #[arg(long, default_value_t = 2.0)]
    pub step: f64,

    /// MODIS fire detection CSV.
    #[arg(long)]
    pub fires: Option<PathBuf>,

    /// Only include fires detected on this date.
    #[arg(long, requires = "fires")]
    pub on: Option<NaiveDate>,

    /// Output file, stdout if absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Granule directories.
    pub input: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowAxis {
    Latitude,
    Longitude,
}

impl From<WindowAxis> for vfm::Axis {
    fn from(axis: WindowAxis) -> Self {
        match axis {
            WindowAxis::Latitude => vfm::Axis::Latitude,
            WindowAxis::Longitude => vfm::Axis::Longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Derive {
    /// Ångström exponent of 532 and 1064 nm extinction.
    Angstrom,

    /// Total backscatter at 532 nm.
    Backscatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatisticArg {
    Mean,
    Median,
    Max,
}

impl From<StatisticArg> for Statistic {
    fn from(arg: StatisticArg) -> Self {
        match arg {
            StatisticArg::Mean => Statistic::Mean,
            StatisticArg::Median => Statistic::Median,
            StatisticArg::Max => Statistic::Max,
        }
    }
}

/// An inclusive "min,max" range. The bounds may be given in either
/// order.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct MinMax(pub f64, pub f64);

impl FromStr for MinMax {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (a_str, b_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid min,max"))?;
        let a = f64::from_str(a_str.trim())?;
        let b = f64::from_str(b_str.trim())?;
        Ok(Self(a.min(b), a.max(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, MinMax};
    use clap::Parser;

    #[test]
    fn test_min_max() {
        assert_eq!("62,42".parse::<MinMax>().unwrap(), MinMax(42.0, 62.0));
        assert_eq!("-120, 20".parse::<MinMax>().unwrap(), MinMax(-120.0, 20.0));
        assert!("62".parse::<MinMax>().is_err());
        assert!("a,b".parse::<MinMax>().is_err());
    }

    #[test]
    fn test_parse_grid() {
        let cli = Cli::parse_from([
            "calipso", "grid", "--derive", "angstrom", "--mmap", "a", "b",
        ]);
        assert!(cli.mmap);
        let Command::Grid(grid) = cli.cmd else {
            panic!("expected grid");
        };
        assert_eq!(grid.lat, MinMax(42.0, 62.0));
        assert_eq!(grid.input.len(), 2);
    }
}
