use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::models::{SimConfig, MINUTES_PER_DAY};
use crate::sweep::SweepPlan;

#[derive(Parser, Debug)]
#[command(
    name = "ward-sim",
    about = "Discrete-event simulation of an obstetric emergency ward"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    /// Diagnostics written to stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogLevelArg::Warn)]
    pub log_level: LogLevelArg,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate one configuration and print its indicators and costs.
    Run(RunArgs),
    /// Replicate every scenario of a resource grid in parallel.
    Sweep(SweepArgs),
    /// Print the resolved configuration without simulating.
    ShowConfig(RunArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// TOML or JSON configuration file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub physicians: Option<u32>,
    #[arg(long)]
    pub consult_rooms: Option<u32>,
    #[arg(long)]
    pub recovery_rooms: Option<u32>,
    #[arg(long)]
    pub incubators: Option<u32>,
    #[arg(long, help = "Seed the variate stream; omit for an entropy-seeded run")]
    pub seed: Option<u64>,
    #[arg(long)]
    pub horizon_days: Option<f64>,
    #[arg(long)]
    pub warmup_days: Option<f64>,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SweepArgs {
    /// Configuration file; its `[sweep]` table defines the grid.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub replicas: Option<u32>,
    #[arg(long)]
    pub base_seed: Option<u64>,
    /// Worker threads; defaults to one per core.
    #[arg(long)]
    pub threads: Option<usize>,
    #[arg(long)]
    pub horizon_days: Option<f64>,
    #[arg(long)]
    pub warmup_days: Option<f64>,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    #[default]
    Human,
    Summary,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for tracing::Level {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => tracing::Level::ERROR,
            LogLevelArg::Warn => tracing::Level::WARN,
            LogLevelArg::Info => tracing::Level::INFO,
            LogLevelArg::Debug => tracing::Level::DEBUG,
            LogLevelArg::Trace => tracing::Level::TRACE,
        }
    }
}

pub fn parse_args() -> Result<Args> {
    parse_args_from(std::env::args_os())
}

pub fn parse_args_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(args).map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Cli(err.to_string()),
    })
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

fn base_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(SimConfig::default()),
    }
}

fn apply_horizon(config: &mut SimConfig, horizon_days: Option<f64>, warmup_days: Option<f64>) {
    if let Some(days) = horizon_days {
        config.horizon.duration_min = days * MINUTES_PER_DAY;
    }
    if let Some(days) = warmup_days {
        config.horizon.warmup_min = days * MINUTES_PER_DAY;
    }
}

/// Resolves file values and flag overrides into a validated configuration.
pub fn build_config(args: &RunArgs) -> Result<(SimConfig, FormatArg)> {
    let mut config = base_config(args.config.as_deref())?;

    let resources = &mut config.resources;
    if let Some(value) = args.physicians {
        resources.physicians = value;
    }
    if let Some(value) = args.consult_rooms {
        resources.consult_rooms = value;
    }
    if let Some(value) = args.recovery_rooms {
        resources.recovery_rooms = value;
    }
    if let Some(value) = args.incubators {
        resources.incubators = value;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    apply_horizon(&mut config, args.horizon_days, args.warmup_days);

    config.validate()?;
    Ok((config, args.format))
}

/// Resolves the base configuration and the replication plan of a sweep.
pub fn build_sweep(args: &SweepArgs) -> Result<(SimConfig, SweepPlan, FormatArg)> {
    let mut config = base_config(args.config.as_deref())?;
    apply_horizon(&mut config, args.horizon_days, args.warmup_days);

    let mut sweep = config.sweep.take().unwrap_or_default();
    if let Some(replicas) = args.replicas {
        sweep.replicas = replicas;
    }
    if let Some(base_seed) = args.base_seed {
        sweep.base_seed = base_seed;
    }
    let plan = SweepPlan::from_config(&sweep, args.threads)?;
    Ok((config, plan, args.format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceConfig;

    fn run_args(argv: &[&str]) -> RunArgs {
        let args = parse_args_from(argv.iter().copied()).expect("args should parse");
        match args.command {
            Command::Run(run) | Command::ShowConfig(run) => run,
            Command::Sweep(_) => panic!("expected a run command"),
        }
    }

    #[test]
    fn flags_override_defaults() {
        let args = run_args(&[
            "ward-sim",
            "run",
            "--physicians",
            "4",
            "--recovery-rooms",
            "30",
            "--seed",
            "5",
            "--horizon-days",
            "10",
            "--warmup-days",
            "1",
            "--format",
            "json",
        ]);
        let (config, format) = build_config(&args).expect("valid config");
        assert_eq!(config.resources, ResourceConfig::new(4, 1, 30, 15));
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.horizon.duration_min, 14_400.0);
        assert_eq!(config.horizon.warmup_min, 1_440.0);
        assert_eq!(format, FormatArg::Json);
    }

    #[test]
    fn zero_resource_flag_is_rejected() {
        let args = run_args(&["ward-sim", "run", "--incubators", "0"]);
        let err = build_config(&args).unwrap_err();
        assert_eq!(err.to_string(), "incubators must be at least 1");
    }

    #[test]
    fn unknown_flag_is_a_cli_error() {
        let err = parse_args_from(["ward-sim", "run", "--beds", "3"]).unwrap_err();
        assert!(matches!(err, Error::Cli(_)));
    }

    #[test]
    fn log_level_is_global() {
        let args = parse_args_from(["ward-sim", "run", "--log-level", "debug"]).expect("parse");
        assert_eq!(args.log_level, LogLevelArg::Debug);
        assert_eq!(tracing::Level::from(args.log_level), tracing::Level::DEBUG);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_config(Path::new("ward.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigIo(_)));

        let mut path = std::env::temp_dir();
        path.push(format!("ward-config-{}.yaml", std::process::id()));
        fs::write(&path, "resources: {}").expect("write");
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.to_string(), "unsupported config format 'yaml'");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn sweep_flags_override_grid_settings() {
        let args = parse_args_from([
            "ward-sim",
            "sweep",
            "--replicas",
            "2",
            "--base-seed",
            "8",
            "--threads",
            "1",
        ])
        .expect("parse");
        let Command::Sweep(sweep) = args.command else {
            panic!("expected sweep");
        };
        let (_, plan, format) = build_sweep(&sweep).expect("valid sweep");
        assert_eq!(plan.replicas, 2);
        assert_eq!(plan.base_seed, 8);
        assert_eq!(plan.threads, Some(1));
        assert_eq!(plan.scenarios.len(), 27);
        assert_eq!(format, FormatArg::Human);
    }

    #[test]
    fn sweep_rejects_zero_replicas() {
        let args = SweepArgs {
            replicas: Some(0),
            ..SweepArgs::default()
        };
        assert!(matches!(build_sweep(&args), Err(Error::ReplicasZero)));
    }
}
