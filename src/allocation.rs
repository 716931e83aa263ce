//! Admission of queued patients to free resources.
//!
//! Priority is strict: natural births, then cesareans, then consultations.
//! Consultations are only considered while both birth queues are empty. Every
//! admission restarts the scan from the top, and the loop runs until a full
//! pass admits nobody, so one release can admit several patients.

use tracing::trace;

use crate::events::{EventKind, FutureEventList};
use crate::state::{BirthKind, SystemState};

/// Admits every patient the current resources allow and schedules their
/// service-start events at `state.now`. Returns how many were admitted.
pub fn allocate(state: &mut SystemState, fel: &mut FutureEventList) -> usize {
    let mut admitted = 0;
    while admit_next(state, fel) {
        admitted += 1;
    }
    admitted
}

fn admit_next(state: &mut SystemState, fel: &mut FutureEventList) -> bool {
    for birth in BirthKind::PRIORITY {
        if admit_birth(state, fel, birth) {
            return true;
        }
    }
    admit_consultation(state, fel)
}

fn admit_birth(state: &mut SystemState, fel: &mut FutureEventList, birth: BirthKind) -> bool {
    let kind = birth.patient_kind();
    if state.queue_len(kind) == 0 || !state.theater_free || state.physicians_free == 0 {
        return false;
    }
    let Some(patient) = state.queue_mut(kind).pop_front() else {
        return false;
    };
    state.take_physician();
    state.theater_free = false;
    state.births_in_service += 1;
    trace!(patient = patient.id, kind = kind.as_str(), time = state.now, "admitted birth");
    fel.insert(state.now, EventKind::BirthStart { patient, birth });
    true
}

fn admit_consultation(state: &mut SystemState, fel: &mut FutureEventList) -> bool {
    if state.births_waiting()
        || state.consult_queue.is_empty()
        || state.physicians_free == 0
        || state.consult_rooms.free() == 0
    {
        return false;
    }
    let Some(room) = state.assign_consult_room() else {
        return false;
    };
    let Some(patient) = state.consult_queue.pop_front() else {
        state.release_consult_room(room);
        return false;
    };
    state.take_physician();
    state.consults_in_service += 1;
    trace!(patient = patient.id, room, time = state.now, "admitted consultation");
    fel.insert(state.now, EventKind::ConsultStart { patient, room });
    true
}
