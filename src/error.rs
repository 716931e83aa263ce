use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} must be at least 1")]
    ResourceCountZero(&'static str),
    #[error("horizon must be a positive number of minutes (got {0})")]
    InvalidHorizon(f64),
    #[error("warm-up must be >= 0 and shorter than the horizon (warm-up {warmup}, horizon {horizon})")]
    InvalidWarmup { warmup: f64, horizon: f64 },
    #[error("probability '{name}' must be within [0, 1] (got {value})")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("range '{name}' must satisfy 0 <= min < max (got {min}..{max})")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("invalid interarrival distribution: {0}")]
    InvalidInterarrival(String),
    #[error("incubation duration must be > 0 (got {0} days)")]
    InvalidIncubation(f64),
    #[error("replicas must be greater than 0")]
    ReplicasZero,
    #[error("sweep grid must not be empty")]
    EmptySweep,
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
    #[error("failed to serialize output: {0}")]
    Serialize(String),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
