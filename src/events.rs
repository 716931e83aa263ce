use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::state::{BirthKind, Patient};

/// What happens at a scheduled instant, with the data its handler needs.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Arrival,
    ConsultStart { patient: Patient, room: usize },
    ConsultEnd { patient: Patient, room: usize },
    BirthStart { patient: Patient, birth: BirthKind },
    BirthEnd { patient: Patient, birth: BirthKind },
    RecoveryEnd { patient_id: u64, room: usize },
    IncubationEnd { patient_id: u64, incubator: usize },
}

/// Fieldless discriminant of [`EventKind`], used for tallies and logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Arrival,
    ConsultStart,
    ConsultEnd,
    BirthStart,
    BirthEnd,
    RecoveryEnd,
    IncubationEnd,
}

impl EventType {
    pub const COUNT: usize = 7;

    pub const ALL: [EventType; Self::COUNT] = [
        EventType::Arrival,
        EventType::ConsultStart,
        EventType::ConsultEnd,
        EventType::BirthStart,
        EventType::BirthEnd,
        EventType::RecoveryEnd,
        EventType::IncubationEnd,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Arrival => "arrival",
            EventType::ConsultStart => "consult-start",
            EventType::ConsultEnd => "consult-end",
            EventType::BirthStart => "birth-start",
            EventType::BirthEnd => "birth-end",
            EventType::RecoveryEnd => "recovery-end",
            EventType::IncubationEnd => "incubation-end",
        }
    }
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Arrival => EventType::Arrival,
            EventKind::ConsultStart { .. } => EventType::ConsultStart,
            EventKind::ConsultEnd { .. } => EventType::ConsultEnd,
            EventKind::BirthStart { .. } => EventType::BirthStart,
            EventKind::BirthEnd { .. } => EventType::BirthEnd,
            EventKind::RecoveryEnd { .. } => EventType::RecoveryEnd,
            EventKind::IncubationEnd { .. } => EventType::IncubationEnd,
        }
    }

    pub fn patient_id(&self) -> Option<u64> {
        match self {
            EventKind::Arrival => None,
            EventKind::ConsultStart { patient, .. }
            | EventKind::ConsultEnd { patient, .. }
            | EventKind::BirthStart { patient, .. }
            | EventKind::BirthEnd { patient, .. } => Some(patient.id),
            EventKind::RecoveryEnd { patient_id, .. }
            | EventKind::IncubationEnd { patient_id, .. } => Some(*patient_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledEvent {
    pub time: f64,
    pub seq: u64,
    pub kind: EventKind,
}

impl Eq for ScheduledEvent {}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending events ordered by `(time, insertion sequence)`.
///
/// Equal timestamps pop in the order they were inserted, which keeps a seeded
/// run fully reproducible.
#[derive(Debug, Default)]
pub struct FutureEventList {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl FutureEventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, time: f64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, kind }));
    }

    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub fn peek_earliest(&self) -> Option<&ScheduledEvent> {
        self.heap.peek().map(|Reverse(event)| event)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Total insertions since creation or the last [`clear`](Self::clear).
    pub fn inserted(&self) -> u64 {
        self.next_seq
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.heap.iter().map(|Reverse(event)| event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery_end(patient_id: u64) -> EventKind {
        EventKind::RecoveryEnd {
            patient_id,
            room: 0,
        }
    }

    #[test]
    fn pops_in_time_order() {
        let mut fel = FutureEventList::new();
        fel.insert(10.0, recovery_end(1));
        fel.insert(5.0, recovery_end(2));
        fel.insert(20.0, recovery_end(3));

        let times: Vec<f64> = std::iter::from_fn(|| fel.pop_earliest())
            .map(|event| event.time)
            .collect();
        assert_eq!(times, vec![5.0, 10.0, 20.0]);
    }

    #[test]
    fn equal_times_pop_in_insertion_order() {
        let mut fel = FutureEventList::new();
        for id in [7, 3, 9, 1] {
            fel.insert(42.0, recovery_end(id));
        }
        fel.insert(1.0, EventKind::Arrival);

        let first = fel.pop_earliest().expect("arrival");
        assert_eq!(first.kind, EventKind::Arrival);

        let ids: Vec<u64> = std::iter::from_fn(|| fel.pop_earliest())
            .filter_map(|event| event.kind.patient_id())
            .collect();
        assert_eq!(ids, vec![7, 3, 9, 1]);
    }

    #[test]
    fn empty_list_yields_none() {
        let mut fel = FutureEventList::new();
        assert!(fel.is_empty());
        assert!(fel.peek_earliest().is_none());
        assert!(fel.pop_earliest().is_none());
        assert_eq!(fel.len(), 0);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut fel = FutureEventList::new();
        fel.insert(3.0, EventKind::Arrival);
        fel.insert(1.0, recovery_end(4));

        assert_eq!(fel.peek_earliest().map(|event| event.time), Some(1.0));
        assert_eq!(fel.len(), 2);
        assert_eq!(fel.pop_earliest().map(|event| event.time), Some(1.0));
        assert_eq!(fel.len(), 1);
    }

    #[test]
    fn clear_resets_sequence() {
        let mut fel = FutureEventList::new();
        fel.insert(1.0, EventKind::Arrival);
        fel.insert(2.0, EventKind::Arrival);
        assert_eq!(fel.inserted(), 2);

        fel.clear();
        assert!(fel.is_empty());
        assert_eq!(fel.inserted(), 0);

        fel.insert(5.0, EventKind::Arrival);
        assert_eq!(fel.pop_earliest().map(|event| event.seq), Some(0));
    }

    #[test]
    fn event_type_names_are_kebab_case() {
        let names: Vec<&str> = EventType::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "arrival",
                "consult-start",
                "consult-end",
                "birth-start",
                "birth-end",
                "recovery-end",
                "incubation-end"
            ]
        );
    }
}
