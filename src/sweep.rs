//! Replicated runs over a grid of resource configurations.
//!
//! Every (scenario, replica) pair is an independent run on a rayon pool. Runs
//! share nothing, and each replica's seed depends only on the base seed, the
//! replica index and the scenario, so results do not depend on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::engine::run_simulation;
use crate::error::{Error, Result};
use crate::models::{ResourceConfig, SimConfig, SweepConfig};
use crate::output::ResultRecord;

/// Record fields aggregated across replicas.
pub const HEADLINE_INDICATORS: [&str; 11] = [
    "wait_consultation_min",
    "wait_natural_birth_min",
    "wait_cesarean_min",
    "wait_overall_min",
    "physician_utilization_pct",
    "theater_utilization_pct",
    "recovery_idle_pct_avg",
    "recovery_diversion_pct",
    "incubator_diversion_pct",
    "monthly_operating_cost",
    "installation_cost",
];

#[derive(Clone, Debug, PartialEq)]
pub struct SweepPlan {
    pub scenarios: Vec<ResourceConfig>,
    pub replicas: u32,
    pub base_seed: u64,
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl SweepPlan {
    pub fn from_config(sweep: &SweepConfig, threads: Option<usize>) -> Result<Self> {
        let plan = Self {
            scenarios: sweep.scenarios(),
            replicas: sweep.replicas,
            base_seed: sweep.base_seed,
            threads,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(Error::ReplicasZero);
        }
        if self.scenarios.is_empty() {
            return Err(Error::EmptySweep);
        }
        for resources in &self.scenarios {
            resources.validate()?;
        }
        Ok(())
    }

    pub fn runs(&self) -> usize {
        self.scenarios.len() * self.replicas as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IndicatorStats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub resources: ResourceConfig,
    pub replicas: u32,
    pub indicators: BTreeMap<String, IndicatorStats>,
}

/// Seed for one replica of one scenario (splitmix64 over the inputs).
pub fn replica_seed(base_seed: u64, replica: u32, resources: &ResourceConfig) -> u64 {
    let mut state = base_seed;
    for part in [
        u64::from(replica),
        u64::from(resources.physicians),
        u64::from(resources.consult_rooms),
        u64::from(resources.recovery_rooms),
        u64::from(resources.incubators),
    ] {
        state = splitmix64(state ^ part);
    }
    state
}

fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Runs the whole plan and returns one summary per scenario, in grid order.
pub fn run_sweep(base: &SimConfig, plan: &SweepPlan) -> Result<Vec<ScenarioSummary>> {
    plan.validate()?;
    SimConfig {
        resources: plan.scenarios[0],
        sweep: None,
        ..base.clone()
    }
    .validate()?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = plan.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|err| Error::WorkerPool(err.to_string()))?;

    let jobs: Vec<(usize, u32)> = (0..plan.scenarios.len())
        .flat_map(|scenario| (0..plan.replicas).map(move |replica| (scenario, replica)))
        .collect();
    info!(
        scenarios = plan.scenarios.len(),
        replicas = plan.replicas,
        runs = plan.runs(),
        "sweep started"
    );

    let records: Vec<(usize, ResultRecord)> = pool.install(|| {
        jobs.par_iter()
            .map(|&(scenario, replica)| {
                let resources = plan.scenarios[scenario];
                let config = SimConfig {
                    resources,
                    seed: Some(replica_seed(plan.base_seed, replica, &resources)),
                    sweep: None,
                    ..base.clone()
                };
                let result = run_simulation(&config)?;
                Ok((scenario, ResultRecord::from_result(&result)))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut grouped: Vec<Vec<ResultRecord>> = vec![Vec::new(); plan.scenarios.len()];
    for (scenario, record) in records {
        grouped[scenario].push(record);
    }

    let summaries: Vec<ScenarioSummary> = plan
        .scenarios
        .iter()
        .zip(grouped)
        .map(|(resources, records)| {
            let summary = summarize_scenario(*resources, &records);
            info!(
                scenario = %resources.label(),
                wait_overall_min = summary
                    .indicators
                    .get("wait_overall_min")
                    .map_or(0.0, |stats| stats.mean),
                "scenario complete"
            );
            summary
        })
        .collect();
    Ok(summaries)
}

fn summarize_scenario(resources: ResourceConfig, records: &[ResultRecord]) -> ScenarioSummary {
    let indicators = HEADLINE_INDICATORS
        .iter()
        .map(|&name| {
            let values: Vec<f64> = records.iter().filter_map(|record| record.get(name)).collect();
            (name.to_string(), summarize(&values))
        })
        .collect();
    ScenarioSummary {
        resources,
        replicas: records.len() as u32,
        indicators,
    }
}

/// Mean, sample standard deviation and 95% Student-t interval.
pub fn summarize(values: &[f64]) -> IndicatorStats {
    let n = values.len();
    if n == 0 {
        return IndicatorStats {
            mean: 0.0,
            std_dev: 0.0,
            ci_low: 0.0,
            ci_high: 0.0,
        };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return IndicatorStats {
            mean,
            std_dev: 0.0,
            ci_low: mean,
            ci_high: mean,
        };
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let std_dev = variance.sqrt();
    let half_width = t_critical_975(n - 1) * std_dev / (n as f64).sqrt();
    IndicatorStats {
        mean,
        std_dev,
        ci_low: mean - half_width,
        ci_high: mean + half_width,
    }
}

const T_975: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

/// Two-sided 95% critical value of Student's t for `df` degrees of freedom.
/// Between table rows the next smaller df is used.
pub fn t_critical_975(df: usize) -> f64 {
    match df {
        0 => f64::INFINITY,
        1..=30 => T_975[df - 1],
        31..=39 => 2.042,
        40..=59 => 2.021,
        60..=119 => 2.000,
        _ => 1.980,
    }
}
