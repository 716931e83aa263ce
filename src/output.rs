use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::costs::CostBreakdown;
use crate::error::{Error, Result};
use crate::indicators::Indicators;
use crate::models::{ResourceConfig, SimConfig, MINUTES_PER_DAY};
use crate::sweep::ScenarioSummary;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunMetadata {
    pub resources: ResourceConfig,
    pub seed: Option<u64>,
    pub horizon_min: f64,
    pub warmup_min: f64,
    /// Length of the statistics window the indicators cover.
    pub window_min: f64,
    pub final_clock_min: f64,
    pub events_processed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResult {
    pub metadata: RunMetadata,
    pub indicators: Indicators,
    pub costs: CostBreakdown,
}

/// Flat, ordered mapping of every numeric field of a run.
///
/// Keys are sorted, so two equal runs serialize to identical bytes. The seed
/// is kept as an integer beside the float fields so it reads back exactly.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(flatten)]
    values: BTreeMap<String, f64>,
}

impl ResultRecord {
    pub fn from_result(result: &SimulationResult) -> Self {
        let mut record = ResultRecord {
            seed: result.metadata.seed,
            ..ResultRecord::default()
        };
        let meta = &result.metadata;
        let ind = &result.indicators;
        let costs = &result.costs;

        record.insert("physicians", f64::from(meta.resources.physicians));
        record.insert("consult_rooms", f64::from(meta.resources.consult_rooms));
        record.insert("recovery_rooms", f64::from(meta.resources.recovery_rooms));
        record.insert("incubators", f64::from(meta.resources.incubators));
        record.insert("events_processed", meta.events_processed as f64);
        record.insert("simulated_min", meta.final_clock_min);
        record.insert("effective_min", meta.window_min);

        record.insert("wait_consultation_min", ind.wait_consultation_min);
        record.insert("wait_natural_birth_min", ind.wait_natural_birth_min);
        record.insert("wait_cesarean_min", ind.wait_cesarean_min);
        record.insert("wait_overall_min", ind.wait_overall_min);
        record.insert("physician_utilization_pct", ind.physician_utilization_pct);
        record.insert("theater_utilization_pct", ind.theater_utilization_pct);
        record.insert("recovery_idle_pct_avg", ind.recovery_idle_pct_avg);
        for (room, idle) in ind.recovery_idle_pct.iter().enumerate() {
            record.values.insert(format!("recovery_idle_pct_{:03}", room), *idle);
        }
        record.insert("recovery_diversion_pct", ind.recovery_diversion_pct);
        record.insert("incubator_diversion_pct", ind.incubator_diversion_pct);

        record.insert("arrivals", ind.arrivals as f64);
        record.insert("served", ind.served as f64);
        record.insert("consultations", ind.consultations as f64);
        record.insert("natural_births", ind.natural_births as f64);
        record.insert("cesareans", ind.cesareans as f64);
        record.insert("births", ind.births as f64);
        record.insert("recovery_diversions", ind.recovery_diversions as f64);
        record.insert("incubator_diversions", ind.incubator_diversions as f64);
        record.insert(
            "neonates_requiring_incubator",
            ind.neonates_requiring_incubator as f64,
        );

        record.insert("cost_physicians", costs.physicians);
        record.insert("cost_theater", costs.theater);
        record.insert("cost_recovery_operation", costs.recovery_operation);
        record.insert("cost_incubator_operation", costs.incubator_operation);
        record.insert("operating_cost_total", costs.operating_total);
        record.insert("monthly_operating_cost", costs.monthly_operating);
        record.insert("installation_cost", costs.installation);

        record
    }

    fn insert(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// `None` for runs seeded from OS entropy.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl From<&SimulationResult> for ResultRecord {
    fn from(result: &SimulationResult) -> Self {
        Self::from_result(result)
    }
}

pub trait Formatter {
    fn write(&self, result: &SimulationResult) -> Result<String>;
    fn write_sweep(&self, summaries: &[ScenarioSummary]) -> Result<String>;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn write(&self, result: &SimulationResult) -> Result<String> {
        let ind = &result.indicators;
        let costs = &result.costs;
        let mut out = String::new();
        write_metadata(&mut out, &result.metadata);

        out.push_str("Waits (min):\n");
        line(&mut out, "consultation", ind.wait_consultation_min);
        line(&mut out, "natural_birth", ind.wait_natural_birth_min);
        line(&mut out, "cesarean", ind.wait_cesarean_min);
        line(&mut out, "overall", ind.wait_overall_min);

        out.push_str("Utilization (%):\n");
        line(&mut out, "physicians", ind.physician_utilization_pct);
        line(&mut out, "theater", ind.theater_utilization_pct);

        out.push_str("Recovery idle (%):\n");
        for (room, idle) in ind.recovery_idle_pct.iter().enumerate() {
            let _ = writeln!(out, "room {}: {:.2}", room, idle);
        }
        line(&mut out, "average", ind.recovery_idle_pct_avg);

        out.push_str("Diversions (%):\n");
        line(&mut out, "recovery", ind.recovery_diversion_pct);
        line(&mut out, "incubator", ind.incubator_diversion_pct);

        out.push_str("Counts:\n");
        for (name, count) in [
            ("arrivals", ind.arrivals),
            ("served", ind.served),
            ("consultations", ind.consultations),
            ("natural_births", ind.natural_births),
            ("cesareans", ind.cesareans),
            ("recovery_diversions", ind.recovery_diversions),
            ("incubator_diversions", ind.incubator_diversions),
            ("neonates_requiring_incubator", ind.neonates_requiring_incubator),
        ] {
            let _ = writeln!(out, "{}: {}", name, count);
        }

        out.push_str("Costs:\n");
        line(&mut out, "physicians", costs.physicians);
        line(&mut out, "theater", costs.theater);
        line(&mut out, "recovery_operation", costs.recovery_operation);
        line(&mut out, "incubator_operation", costs.incubator_operation);
        line(&mut out, "operating_total", costs.operating_total);
        line(&mut out, "monthly_operating", costs.monthly_operating);
        line(&mut out, "installation", costs.installation);

        Ok(out)
    }

    fn write_sweep(&self, summaries: &[ScenarioSummary]) -> Result<String> {
        let mut out = String::new();
        for summary in summaries {
            let _ = writeln!(
                out,
                "Scenario {} ({} replicas):",
                summary.resources.label(),
                summary.replicas
            );
            for (name, stats) in &summary.indicators {
                let _ = writeln!(
                    out,
                    "{}: mean {:.2} (sd {:.2}, 95% CI {:.2}..{:.2})",
                    name, stats.mean, stats.std_dev, stats.ci_low, stats.ci_high
                );
            }
        }
        Ok(out)
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, result: &SimulationResult) -> Result<String> {
        let ind = &result.indicators;
        let mut out = String::new();
        write_metadata(&mut out, &result.metadata);
        out.push_str("Summary:\n");
        line(&mut out, "wait_overall_min", ind.wait_overall_min);
        line(&mut out, "physician_utilization_pct", ind.physician_utilization_pct);
        line(&mut out, "theater_utilization_pct", ind.theater_utilization_pct);
        line(&mut out, "recovery_idle_pct_avg", ind.recovery_idle_pct_avg);
        line(&mut out, "recovery_diversion_pct", ind.recovery_diversion_pct);
        line(&mut out, "incubator_diversion_pct", ind.incubator_diversion_pct);
        line(&mut out, "monthly_operating_cost", result.costs.monthly_operating);
        line(&mut out, "installation_cost", result.costs.installation);
        Ok(out)
    }

    fn write_sweep(&self, summaries: &[ScenarioSummary]) -> Result<String> {
        let mut out = String::new();
        for summary in summaries {
            let fields: Vec<String> = summary
                .indicators
                .iter()
                .map(|(name, stats)| format!("{}={:.2}", name, stats.mean))
                .collect();
            let _ = writeln!(out, "{}: {}", summary.resources.label(), fields.join(", "));
        }
        Ok(out)
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, result: &SimulationResult) -> Result<String> {
        to_json(&ResultRecord::from_result(result))
    }

    fn write_sweep(&self, summaries: &[ScenarioSummary]) -> Result<String> {
        to_json(&summaries)
    }
}

/// Human-readable echo of a resolved configuration.
pub fn describe_config(config: &SimConfig) -> String {
    let dist = &config.distributions;
    let mut out = String::new();
    let _ = writeln!(out, "Resources: {}", config.resources.label());
    match config.seed {
        Some(seed) => {
            let _ = writeln!(out, "Seed: {}", seed);
        }
        None => out.push_str("Seed: entropy\n"),
    }
    let _ = writeln!(
        out,
        "Horizon: {} days (warm-up {} days)",
        config.horizon.duration_min / MINUTES_PER_DAY,
        config.horizon.warmup_min / MINUTES_PER_DAY
    );
    let _ = writeln!(
        out,
        "Interarrival: lognormal(sigma {}, scale {} min, floor {} min)",
        dist.interarrival_sigma, dist.interarrival_scale_min, dist.interarrival_floor_min
    );
    let _ = writeln!(out, "Consultation: U[{}, {}] min", dist.consult_min, dist.consult_max);
    let _ = writeln!(out, "Birth: U[{}, {}] min", dist.birth_min, dist.birth_max);
    let _ = writeln!(
        out,
        "Recovery: U[{}, {}] h",
        dist.recovery_min_hours, dist.recovery_max_hours
    );
    let _ = writeln!(out, "Incubation: {} days", dist.incubation_days);
    let _ = writeln!(out, "P(birth): {}", dist.birth_probability);
    let _ = writeln!(out, "P(natural | birth): {}", dist.natural_probability);
    let _ = writeln!(out, "P(incubator | birth): {}", dist.incubator_probability);
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(value).map_err(|err| Error::Serialize(err.to_string()))?;
    json.push('\n');
    Ok(json)
}

fn write_metadata(out: &mut String, meta: &RunMetadata) {
    out.push_str("Metadata:\n");
    let _ = writeln!(out, "resources: {}", meta.resources.label());
    match meta.seed {
        Some(seed) => {
            let _ = writeln!(out, "seed: {}", seed);
        }
        None => out.push_str("seed: entropy\n"),
    }
    line(out, "horizon_min", meta.horizon_min);
    line(out, "warmup_min", meta.warmup_min);
    line(out, "window_min", meta.window_min);
    let _ = writeln!(out, "events_processed: {}", meta.events_processed);
}

fn line(out: &mut String, name: &str, value: f64) {
    let _ = writeln!(out, "{}: {:.2}", name, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_simulation;
    use crate::models::HorizonConfig;

    fn sample_result() -> SimulationResult {
        let config = SimConfig {
            seed: Some(11),
            horizon: HorizonConfig {
                duration_min: 3_000.0,
                warmup_min: 500.0,
            },
            ..SimConfig::with_resources(ResourceConfig::new(2, 1, 3, 2))
        };
        run_simulation(&config).expect("valid config")
    }

    #[test]
    fn record_contains_every_room_and_headline_field() {
        let record = ResultRecord::from_result(&sample_result());
        for key in [
            "wait_overall_min",
            "physician_utilization_pct",
            "recovery_idle_pct_000",
            "recovery_idle_pct_002",
            "recovery_diversion_pct",
            "incubator_diversion_pct",
            "monthly_operating_cost",
            "installation_cost",
        ] {
            assert!(record.get(key).is_some(), "missing {key}");
        }
        assert_eq!(record.seed(), Some(11));
        assert!(record.get("seed").is_none());
        assert!(record.get("recovery_idle_pct_003").is_none());
        assert_eq!(record.get("effective_min"), Some(2_500.0));
    }

    #[test]
    fn record_omits_seed_for_entropy_runs() {
        let mut result = sample_result();
        result.metadata.seed = None;
        let record = ResultRecord::from(&result);
        assert!(record.seed().is_none());
        let json = JsonFormatter.write(&result).expect("json");
        assert!(!json.contains("\"seed\""));
    }

    #[test]
    fn full_width_seed_survives_json_and_reproduces_the_run() {
        let seed = u64::MAX - 1;
        let config = SimConfig {
            seed: Some(seed),
            horizon: HorizonConfig {
                duration_min: 2_000.0,
                warmup_min: 200.0,
            },
            ..SimConfig::with_resources(ResourceConfig::new(2, 1, 3, 2))
        };
        let result = run_simulation(&config).expect("valid config");
        let json = JsonFormatter.write(&result).expect("json");

        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["seed"].as_u64(), Some(18_446_744_073_709_551_614));
        assert!(json.contains("\"seed\": 18446744073709551614,"));

        let replay = SimConfig {
            seed: value["seed"].as_u64(),
            ..config
        };
        let again = run_simulation(&replay).expect("valid config");
        assert_eq!(ResultRecord::from(&again), ResultRecord::from(&result));
    }

    #[test]
    fn json_is_stable_for_equal_results() {
        let a = JsonFormatter.write(&sample_result()).expect("json");
        let b = JsonFormatter.write(&sample_result()).expect("json");
        assert_eq!(a, b);
        assert!(a.starts_with('{'));
        assert!(a.ends_with("}\n"));
    }

    #[test]
    fn summary_lists_metadata_then_headline() {
        let out = SummaryFormatter.write(&sample_result()).expect("summary");
        assert!(out.starts_with("Metadata:\nresources: G2_SC1_SR3_I2\nseed: 11\n"));
        assert!(out.contains("Summary:\nwait_overall_min: "));
        assert!(out.contains("installation_cost: 0.00\n"));
    }

    #[test]
    fn human_lists_each_recovery_room() {
        let out = HumanFormatter.write(&sample_result()).expect("human");
        assert!(out.contains("room 0: "));
        assert!(out.contains("room 2: "));
        assert!(!out.contains("room 3: "));
        assert!(out.contains("Costs:\n"));
    }
}
