use serde::Serialize;

use crate::state::SystemState;

/// Performance indicators over the statistics window of a settled state.
///
/// Every resource counts a service still running at the horizon as busy up
/// to the horizon.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Indicators {
    pub wait_consultation_min: f64,
    pub wait_natural_birth_min: f64,
    pub wait_cesarean_min: f64,
    pub wait_overall_min: f64,
    pub physician_utilization_pct: f64,
    pub theater_utilization_pct: f64,
    /// Idle share of the window for each recovery room, by room id.
    pub recovery_idle_pct: Vec<f64>,
    pub recovery_idle_pct_avg: f64,
    pub recovery_diversion_pct: f64,
    pub incubator_diversion_pct: f64,
    pub arrivals: u64,
    pub served: u64,
    pub consultations: u64,
    pub natural_births: u64,
    pub cesareans: u64,
    pub births: u64,
    pub recovery_diversions: u64,
    pub incubator_diversions: u64,
    pub neonates_requiring_incubator: u64,
}

pub fn compute(state: &SystemState) -> Indicators {
    let counters = &state.counters;
    let window = state.elapsed_window();
    let births = counters.births();

    let recovery_idle_pct: Vec<f64> = state
        .recovery_rooms
        .idle_times()
        .into_iter()
        .map(|idle| percent(idle, window))
        .collect();
    let recovery_idle_pct_avg = mean(&recovery_idle_pct);

    let starts = counters.consult_starts + counters.natural_starts + counters.cesarean_starts;
    let wait_total =
        counters.consult_wait_total + counters.natural_wait_total + counters.cesarean_wait_total;

    Indicators {
        wait_consultation_min: ratio(counters.consult_wait_total, counters.consult_starts),
        wait_natural_birth_min: ratio(counters.natural_wait_total, counters.natural_starts),
        wait_cesarean_min: ratio(counters.cesarean_wait_total, counters.cesarean_starts),
        wait_overall_min: ratio(wait_total, starts),
        physician_utilization_pct: percent(
            counters.physician_busy_time,
            window * f64::from(state.resources.physicians),
        ),
        theater_utilization_pct: percent(counters.theater_busy_time, window),
        recovery_idle_pct,
        recovery_idle_pct_avg,
        recovery_diversion_pct: percent(counters.recovery_diversions as f64, births as f64),
        incubator_diversion_pct: percent(
            counters.incubator_diversions as f64,
            counters.neonates_requiring_incubator as f64,
        ),
        arrivals: counters.arrivals,
        served: counters.served,
        consultations: counters.consultations,
        natural_births: counters.natural_births,
        cesareans: counters.cesareans,
        births,
        recovery_diversions: counters.recovery_diversions,
        incubator_diversions: counters.incubator_diversions,
        neonates_requiring_incubator: counters.neonates_requiring_incubator,
    }
}

fn ratio(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
