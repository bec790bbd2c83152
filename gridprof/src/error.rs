use thiserror::Error;
use vfm::VfmError;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid grid, {0}")]
    Grid(&'static str),

    #[error("derivation takes {expected} science fields, got {found}")]
    Inputs { expected: usize, found: usize },

    #[error("field has {found} bins, altitude axis has {expected}")]
    Bins { expected: usize, found: usize },

    #[error("{0}")]
    Vfm(#[from] VfmError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}
