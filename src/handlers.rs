use tracing::debug;

use crate::allocation::allocate;
use crate::events::{EventKind, FutureEventList};
use crate::generator::VariateGenerator;
use crate::state::{BirthKind, Patient, SystemState};

/// Everything a handler may touch while processing one event.
pub struct HandlerContext<'a> {
    pub state: &'a mut SystemState,
    pub fel: &'a mut FutureEventList,
    pub generator: &'a mut VariateGenerator,
}

pub fn dispatch(kind: EventKind, ctx: &mut HandlerContext) {
    match kind {
        EventKind::Arrival => on_arrival(ctx),
        EventKind::ConsultStart { patient, room } => on_consult_start(ctx, patient, room),
        EventKind::ConsultEnd { patient, room } => on_consult_end(ctx, patient, room),
        EventKind::BirthStart { patient, birth } => on_birth_start(ctx, patient, birth),
        EventKind::BirthEnd { patient, birth } => on_birth_end(ctx, patient, birth),
        EventKind::RecoveryEnd { patient_id, room } => on_recovery_end(ctx, patient_id, room),
        EventKind::IncubationEnd {
            patient_id,
            incubator,
        } => on_incubation_end(ctx, patient_id, incubator),
    }
}

pub fn on_arrival(ctx: &mut HandlerContext) {
    let kind = ctx.generator.patient_kind();
    let patient = ctx.state.admit_arrival(kind);
    ctx.state.enqueue(patient);
    allocate(ctx.state, ctx.fel);

    let interval = ctx.generator.interarrival();
    ctx.fel.insert(ctx.state.now + interval, EventKind::Arrival);
}

pub fn on_consult_start(ctx: &mut HandlerContext, mut patient: Patient, room: usize) {
    let now = ctx.state.now;
    patient.service_start_time = Some(now);
    let counters = &mut ctx.state.counters;
    counters.consult_wait_total += patient.wait_time(now);
    counters.consult_starts += 1;

    let duration = ctx.generator.consult_duration();
    ctx.fel
        .insert(now + duration, EventKind::ConsultEnd { patient, room });
}

pub fn on_consult_end(ctx: &mut HandlerContext, patient: Patient, room: usize) {
    let span = ctx.state.window_span(service_start(&patient));
    let state = &mut *ctx.state;

    state.return_physician();
    let released = state.release_consult_room(room);
    debug_assert!(released.is_some(), "consult room {room} was not held");
    state.consults_in_service = state.consults_in_service.saturating_sub(1);

    state.counters.physician_busy_time += span;
    state.counters.consultations += 1;
    state.counters.served += 1;

    allocate(ctx.state, ctx.fel);
}

pub fn on_birth_start(ctx: &mut HandlerContext, mut patient: Patient, birth: BirthKind) {
    let now = ctx.state.now;
    patient.service_start_time = Some(now);
    let wait = patient.wait_time(now);
    let counters = &mut ctx.state.counters;
    match birth {
        BirthKind::Natural => {
            counters.natural_wait_total += wait;
            counters.natural_starts += 1;
        }
        BirthKind::Cesarean => {
            counters.cesarean_wait_total += wait;
            counters.cesarean_starts += 1;
        }
    }

    let duration = ctx.generator.birth_duration();
    ctx.fel
        .insert(now + duration, EventKind::BirthEnd { patient, birth });
}

/// Frees the physician and theater, then places mother and neonate
/// independently. A shortage diverts that party out of the model.
pub fn on_birth_end(ctx: &mut HandlerContext, mut patient: Patient, birth: BirthKind) {
    let span = ctx.state.window_span(service_start(&patient));
    let now = ctx.state.now;
    let state = &mut *ctx.state;

    state.return_physician();
    state.theater_free = true;
    state.births_in_service = state.births_in_service.saturating_sub(1);
    state.counters.theater_busy_time += span;
    state.counters.physician_busy_time += span;
    match birth {
        BirthKind::Natural => state.counters.natural_births += 1,
        BirthKind::Cesarean => state.counters.cesareans += 1,
    }
    state.counters.served += 1;

    match state.assign_recovery_room() {
        Some(room) => {
            patient.recovery_room = Some(room);
            let stay = ctx.generator.recovery_duration();
            ctx.fel.insert(
                now + stay,
                EventKind::RecoveryEnd {
                    patient_id: patient.id,
                    room,
                },
            );
        }
        None => {
            state.counters.recovery_diversions += 1;
            debug!(patient = patient.id, time = now, "mother diverted: no recovery room");
        }
    }

    patient.requires_incubator = ctx.generator.requires_incubator();
    if patient.requires_incubator {
        state.counters.neonates_requiring_incubator += 1;
        match state.assign_incubator() {
            Some(incubator) => {
                patient.incubator = Some(incubator);
                ctx.fel.insert(
                    now + ctx.generator.incubation_duration(),
                    EventKind::IncubationEnd {
                        patient_id: patient.id,
                        incubator,
                    },
                );
            }
            None => {
                state.counters.incubator_diversions += 1;
                debug!(patient = patient.id, time = now, "neonate diverted: no incubator");
            }
        }
    }

    allocate(ctx.state, ctx.fel);
}

pub fn on_recovery_end(ctx: &mut HandlerContext, patient_id: u64, room: usize) {
    let released = ctx.state.release_recovery_room(room);
    debug_assert!(
        released.is_some(),
        "recovery room {room} not held by patient {patient_id}"
    );
}

pub fn on_incubation_end(ctx: &mut HandlerContext, patient_id: u64, incubator: usize) {
    let released = ctx.state.release_incubator(incubator);
    debug_assert!(
        released.is_some(),
        "incubator {incubator} not held by patient {patient_id}"
    );
}

/// Charges physicians and the theater for services still running when the
/// run stops at `state.now`, clipped to the statistics window.
pub fn accrue_open_services(state: &mut SystemState, fel: &FutureEventList) {
    for event in fel.iter() {
        match &event.kind {
            EventKind::ConsultEnd { patient, .. } => {
                let span = state.window_span(service_start(patient));
                state.counters.physician_busy_time += span;
            }
            EventKind::BirthEnd { patient, .. } => {
                let span = state.window_span(service_start(patient));
                state.counters.physician_busy_time += span;
                state.counters.theater_busy_time += span;
            }
            EventKind::Arrival
            | EventKind::ConsultStart { .. }
            | EventKind::BirthStart { .. }
            | EventKind::RecoveryEnd { .. }
            | EventKind::IncubationEnd { .. } => {}
        }
    }
}

fn service_start(patient: &Patient) -> f64 {
    patient.service_start_time.unwrap_or(patient.arrival_time)
}
