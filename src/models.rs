use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MINUTES_PER_HOUR: f64 = 60.0;
pub const MINUTES_PER_DAY: f64 = 24.0 * MINUTES_PER_HOUR;
/// Cost proration uses 30-day months.
pub const MINUTES_PER_MONTH: f64 = 30.0 * MINUTES_PER_DAY;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub horizon: HorizonConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub distributions: DistributionConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

impl SimConfig {
    pub fn with_resources(resources: ResourceConfig) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.resources.validate()?;
        self.horizon.validate()?;
        self.distributions.validate()?;
        Ok(())
    }
}

/// Staffing and equipment counts for one scenario.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct ResourceConfig {
    pub physicians: u32,
    #[serde(default = "default_consult_rooms")]
    pub consult_rooms: u32,
    pub recovery_rooms: u32,
    pub incubators: u32,
}

impl ResourceConfig {
    pub fn new(physicians: u32, consult_rooms: u32, recovery_rooms: u32, incubators: u32) -> Self {
        Self {
            physicians,
            consult_rooms,
            recovery_rooms,
            incubators,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.physicians == 0 {
            return Err(Error::ResourceCountZero("physicians"));
        }
        if self.consult_rooms == 0 {
            return Err(Error::ResourceCountZero("consult_rooms"));
        }
        if self.recovery_rooms == 0 {
            return Err(Error::ResourceCountZero("recovery_rooms"));
        }
        if self.incubators == 0 {
            return Err(Error::ResourceCountZero("incubators"));
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        format!(
            "G{}_SC{}_SR{}_I{}",
            self.physicians, self.consult_rooms, self.recovery_rooms, self.incubators
        )
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            physicians: 3,
            consult_rooms: default_consult_rooms(),
            recovery_rooms: 24,
            incubators: 15,
        }
    }
}

fn default_consult_rooms() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HorizonConfig {
    /// Total simulated minutes, warm-up included.
    pub duration_min: f64,
    /// Leading minutes whose statistics are discarded.
    pub warmup_min: f64,
}

impl HorizonConfig {
    pub fn from_days(duration_days: f64, warmup_days: f64) -> Self {
        Self {
            duration_min: duration_days * MINUTES_PER_DAY,
            warmup_min: warmup_days * MINUTES_PER_DAY,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.duration_min.is_finite() || self.duration_min <= 0.0 {
            return Err(Error::InvalidHorizon(self.duration_min));
        }
        if !self.warmup_min.is_finite()
            || self.warmup_min < 0.0
            || self.warmup_min >= self.duration_min
        {
            return Err(Error::InvalidWarmup {
                warmup: self.warmup_min,
                horizon: self.duration_min,
            });
        }
        Ok(())
    }
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self::from_days(365.0, 30.0)
    }
}

/// Parameters of every stochastic quantity in the model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DistributionConfig {
    /// Lognormal shape (sigma of the underlying normal).
    pub interarrival_sigma: f64,
    /// Lognormal scale in minutes; the underlying normal has mu = ln(scale).
    pub interarrival_scale_min: f64,
    /// Lower clamp applied to every drawn interarrival interval.
    pub interarrival_floor_min: f64,
    pub consult_min: f64,
    pub consult_max: f64,
    pub birth_min: f64,
    pub birth_max: f64,
    pub recovery_min_hours: f64,
    pub recovery_max_hours: f64,
    pub incubation_days: f64,
    pub birth_probability: f64,
    /// Probability that a birth is natural rather than cesarean.
    pub natural_probability: f64,
    pub incubator_probability: f64,
}

impl DistributionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.interarrival_sigma.is_finite() && self.interarrival_sigma > 0.0) {
            return Err(Error::InvalidInterarrival(format!(
                "sigma must be > 0 (got {})",
                self.interarrival_sigma
            )));
        }
        if !(self.interarrival_scale_min.is_finite() && self.interarrival_scale_min > 0.0) {
            return Err(Error::InvalidInterarrival(format!(
                "scale must be > 0 (got {})",
                self.interarrival_scale_min
            )));
        }
        if !(self.interarrival_floor_min.is_finite() && self.interarrival_floor_min > 0.0) {
            return Err(Error::InvalidInterarrival(format!(
                "floor must be > 0 (got {})",
                self.interarrival_floor_min
            )));
        }
        check_range("consult", self.consult_min, self.consult_max)?;
        check_range("birth", self.birth_min, self.birth_max)?;
        check_range(
            "recovery_hours",
            self.recovery_min_hours,
            self.recovery_max_hours,
        )?;
        if !(self.incubation_days.is_finite() && self.incubation_days > 0.0) {
            return Err(Error::InvalidIncubation(self.incubation_days));
        }
        check_probability("birth_probability", self.birth_probability)?;
        check_probability("natural_probability", self.natural_probability)?;
        check_probability("incubator_probability", self.incubator_probability)?;
        Ok(())
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            interarrival_sigma: 1.362189,
            interarrival_scale_min: 23.268083,
            interarrival_floor_min: 0.1,
            consult_min: 5.0,
            consult_max: 23.0,
            birth_min: 50.0,
            birth_max: 70.0,
            recovery_min_hours: 24.0,
            recovery_max_hours: 36.0,
            incubation_days: 4.0,
            birth_probability: 0.30,
            natural_probability: 0.57,
            incubator_probability: 0.10,
        }
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min >= max {
        return Err(Error::InvalidRange { name, min, max });
    }
    Ok(())
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidProbability { name, value });
    }
    Ok(())
}

/// Cost rates in currency units.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    pub recovery_room_per_hour: f64,
    pub recovery_room_install: f64,
    pub theater_per_birth: f64,
    pub incubator_per_day: f64,
    pub incubator_install: f64,
    pub physician_monthly_salary: f64,
    pub physician_bonus: f64,
    /// Births per physician bonus.
    pub births_per_bonus: u64,
    /// Recovery rooms already installed; only rooms above this count cost installation.
    pub base_recovery_rooms: u32,
    pub base_incubators: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            recovery_room_per_hour: 3_000.0,
            recovery_room_install: 7_000_000.0,
            theater_per_birth: 95_000.0,
            incubator_per_day: 25_000.0,
            incubator_install: 1_200_000.0,
            physician_monthly_salary: 2_000_000.0,
            physician_bonus: 57_000.0,
            births_per_bonus: 31,
            base_recovery_rooms: 24,
            base_incubators: 15,
        }
    }
}

/// Resource grid and replication settings for an experiment sweep.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub physicians: Vec<u32>,
    pub consult_rooms: Vec<u32>,
    pub recovery_rooms: Vec<u32>,
    pub incubators: Vec<u32>,
    pub replicas: u32,
    pub base_seed: u64,
}

impl SweepConfig {
    /// Cartesian product of the grid, physicians varying slowest.
    pub fn scenarios(&self) -> Vec<ResourceConfig> {
        let mut scenarios = Vec::new();
        for &physicians in &self.physicians {
            for &consult_rooms in &self.consult_rooms {
                for &recovery_rooms in &self.recovery_rooms {
                    for &incubators in &self.incubators {
                        scenarios.push(ResourceConfig::new(
                            physicians,
                            consult_rooms,
                            recovery_rooms,
                            incubators,
                        ));
                    }
                }
            }
        }
        scenarios
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            physicians: vec![2, 3, 4],
            consult_rooms: vec![1],
            recovery_rooms: vec![20, 24, 30],
            incubators: vec![11, 15, 21],
            replicas: 5,
            base_seed: 42,
        }
    }
}
