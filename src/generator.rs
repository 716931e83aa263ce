use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Uniform};

use crate::error::{Error, Result};
use crate::models::{DistributionConfig, MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::state::PatientKind;

/// Every stochastic draw of one run comes from this generator's own stream.
#[derive(Debug, Clone)]
pub struct VariateGenerator {
    rng: StdRng,
    interarrival: LogNormal<f64>,
    interarrival_floor: f64,
    consult: Uniform<f64>,
    birth: Uniform<f64>,
    recovery: Uniform<f64>,
    incubation_min: f64,
    birth_probability: f64,
    natural_probability: f64,
    incubator_probability: f64,
}

impl VariateGenerator {
    /// `seed: None` draws the stream from OS entropy.
    pub fn new(params: &DistributionConfig, seed: Option<u64>) -> Result<Self> {
        params.validate()?;
        let interarrival = LogNormal::new(
            params.interarrival_scale_min.ln(),
            params.interarrival_sigma,
        )
        .map_err(|err| Error::InvalidInterarrival(err.to_string()))?;

        Ok(Self {
            rng: build_rng(seed),
            interarrival,
            interarrival_floor: params.interarrival_floor_min,
            consult: Uniform::new(params.consult_min, params.consult_max),
            birth: Uniform::new(params.birth_min, params.birth_max),
            recovery: Uniform::new(
                params.recovery_min_hours * MINUTES_PER_HOUR,
                params.recovery_max_hours * MINUTES_PER_HOUR,
            ),
            incubation_min: params.incubation_days * MINUTES_PER_DAY,
            birth_probability: params.birth_probability,
            natural_probability: params.natural_probability,
            incubator_probability: params.incubator_probability,
        })
    }

    /// Replaces the stream entirely; nothing from the previous stream survives.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn interarrival(&mut self) -> f64 {
        let interval = self.interarrival.sample(&mut self.rng);
        if interval.is_finite() {
            interval.max(self.interarrival_floor)
        } else {
            self.interarrival_floor
        }
    }

    pub fn consult_duration(&mut self) -> f64 {
        self.consult.sample(&mut self.rng)
    }

    pub fn birth_duration(&mut self) -> f64 {
        self.birth.sample(&mut self.rng)
    }

    pub fn recovery_duration(&mut self) -> f64 {
        self.recovery.sample(&mut self.rng)
    }

    pub fn incubation_duration(&self) -> f64 {
        self.incubation_min
    }

    /// Birth vs. consultation first; births then split natural vs. cesarean.
    pub fn patient_kind(&mut self) -> PatientKind {
        if self.rng.gen::<f64>() < self.birth_probability {
            if self.rng.gen::<f64>() < self.natural_probability {
                PatientKind::NaturalBirth
            } else {
                PatientKind::Cesarean
            }
        } else {
            PatientKind::Consultation
        }
    }

    pub fn requires_incubator(&mut self) -> bool {
        self.rng.gen::<f64>() < self.incubator_probability
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> VariateGenerator {
        VariateGenerator::new(&DistributionConfig::default(), Some(seed))
            .expect("default parameters should build")
    }

    #[test]
    fn durations_stay_within_ranges() {
        let mut generator = seeded(1);
        for _ in 0..1_000 {
            let consult = generator.consult_duration();
            assert!((5.0..23.0).contains(&consult));
            let birth = generator.birth_duration();
            assert!((50.0..70.0).contains(&birth));
            let recovery = generator.recovery_duration();
            assert!((24.0 * 60.0..36.0 * 60.0).contains(&recovery));
        }
        assert_eq!(generator.incubation_duration(), 4.0 * 24.0 * 60.0);
    }

    #[test]
    fn interarrival_never_below_floor() {
        let mut params = DistributionConfig::default();
        params.interarrival_floor_min = 5.0;
        let mut generator = VariateGenerator::new(&params, Some(3)).expect("valid params");
        for _ in 0..5_000 {
            assert!(generator.interarrival() >= 5.0);
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = seeded(99);
        let mut b = seeded(99);
        for _ in 0..100 {
            assert_eq!(a.interarrival(), b.interarrival());
            assert_eq!(a.patient_kind(), b.patient_kind());
        }
    }

    #[test]
    fn reseed_discards_previous_state() {
        let mut used = seeded(5);
        for _ in 0..37 {
            used.interarrival();
            used.requires_incubator();
        }
        used.reseed(11);

        let mut fresh = seeded(11);
        for _ in 0..50 {
            assert_eq!(used.interarrival(), fresh.interarrival());
            assert_eq!(used.consult_duration(), fresh.consult_duration());
        }
    }

    #[test]
    fn zero_birth_probability_only_yields_consultations() {
        let mut params = DistributionConfig::default();
        params.birth_probability = 0.0;
        let mut generator = VariateGenerator::new(&params, Some(8)).expect("valid params");
        for _ in 0..1_000 {
            assert_eq!(generator.patient_kind(), PatientKind::Consultation);
        }
    }

    #[test]
    fn certain_births_split_by_natural_probability() {
        let mut params = DistributionConfig::default();
        params.birth_probability = 1.0;
        params.natural_probability = 1.0;
        let mut generator = VariateGenerator::new(&params, Some(8)).expect("valid params");
        for _ in 0..200 {
            assert_eq!(generator.patient_kind(), PatientKind::NaturalBirth);
        }
    }

    #[test]
    fn patient_mix_roughly_matches_probabilities() {
        let mut generator = seeded(2024);
        let draws = 20_000;
        let births = (0..draws)
            .filter(|_| generator.patient_kind().is_birth())
            .count();
        let share = births as f64 / draws as f64;
        assert!((share - 0.30).abs() < 0.02, "birth share {share}");
    }

    #[test]
    fn invalid_parameters_rejected() {
        let mut params = DistributionConfig::default();
        params.interarrival_sigma = 0.0;
        assert!(matches!(
            VariateGenerator::new(&params, Some(1)),
            Err(Error::InvalidInterarrival(_))
        ));
    }
}
