use serde::Serialize;

use crate::models::{CostConfig, MINUTES_PER_DAY, MINUTES_PER_HOUR, MINUTES_PER_MONTH};
use crate::state::SystemState;

/// Operating costs accrued over the statistics window, plus the one-time
/// installation cost of the configured capacity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Salaries prorated over the window plus birth bonuses.
    pub physicians: f64,
    pub theater: f64,
    pub recovery_operation: f64,
    pub incubator_operation: f64,
    pub operating_total: f64,
    pub monthly_operating: f64,
    pub installation: f64,
}

pub fn compute(state: &SystemState, rates: &CostConfig) -> CostBreakdown {
    let physicians = f64::from(state.resources.physicians);
    let months = state.elapsed_window() / MINUTES_PER_MONTH;
    let births = state.counters.births();

    let bonuses = births.checked_div(rates.births_per_bonus).unwrap_or(0);
    let physician_cost = physicians * rates.physician_monthly_salary * months
        + physicians * bonuses as f64 * rates.physician_bonus;
    let theater = births as f64 * rates.theater_per_birth;
    let recovery_operation =
        state.recovery_rooms.total_busy_time() / MINUTES_PER_HOUR * rates.recovery_room_per_hour;
    let incubator_operation =
        state.incubators.total_busy_time() / MINUTES_PER_DAY * rates.incubator_per_day;

    let operating_total = physician_cost + theater + recovery_operation + incubator_operation;
    let monthly_operating = if months > 0.0 {
        operating_total / months
    } else {
        0.0
    };

    CostBreakdown {
        physicians: physician_cost,
        theater,
        recovery_operation,
        incubator_operation,
        operating_total,
        monthly_operating,
        installation: installation_cost(state, rates),
    }
}

fn installation_cost(state: &SystemState, rates: &CostConfig) -> f64 {
    let extra_rooms = state
        .resources
        .recovery_rooms
        .saturating_sub(rates.base_recovery_rooms);
    let extra_incubators = state.resources.incubators.saturating_sub(rates.base_incubators);
    f64::from(extra_rooms) * rates.recovery_room_install
        + f64::from(extra_incubators) * rates.incubator_install
}
