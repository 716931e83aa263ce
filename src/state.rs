use std::collections::VecDeque;

use crate::models::ResourceConfig;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PatientKind {
    Consultation,
    NaturalBirth,
    Cesarean,
}

impl PatientKind {
    pub fn is_birth(self) -> bool {
        matches!(self, PatientKind::NaturalBirth | PatientKind::Cesarean)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatientKind::Consultation => "consultation",
            PatientKind::NaturalBirth => "natural-birth",
            PatientKind::Cesarean => "cesarean",
        }
    }
}

/// The two kinds of patient the theater serves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BirthKind {
    Natural,
    Cesarean,
}

impl BirthKind {
    /// Admission order: natural births before cesareans.
    pub const PRIORITY: [BirthKind; 2] = [BirthKind::Natural, BirthKind::Cesarean];

    pub fn patient_kind(self) -> PatientKind {
        match self {
            BirthKind::Natural => PatientKind::NaturalBirth,
            BirthKind::Cesarean => PatientKind::Cesarean,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Patient {
    pub id: u64,
    pub kind: PatientKind,
    pub arrival_time: f64,
    pub service_start_time: Option<f64>,
    pub requires_incubator: bool,
    pub recovery_room: Option<usize>,
    pub incubator: Option<usize>,
}

impl Patient {
    pub fn new(id: u64, kind: PatientKind, arrival_time: f64) -> Self {
        Self {
            id,
            kind,
            arrival_time,
            service_start_time: None,
            requires_incubator: false,
            recovery_room: None,
            incubator: None,
        }
    }

    /// Time spent queued; `now` is used while the patient is still waiting.
    pub fn wait_time(&self, now: f64) -> f64 {
        self.service_start_time.unwrap_or(now) - self.arrival_time
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unit {
    busy: bool,
    last_transition: f64,
    busy_time: f64,
    idle_time: f64,
}

/// A pool of individually tracked rooms or incubators.
///
/// Each unit accrues the span since its last transition into either its idle
/// or its busy total on every assign, release, settle and window reset, so
/// `idle_time + busy_time` always equals the time elapsed since the window
/// opened once the pool is settled.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitPool {
    units: Vec<Unit>,
    free: u32,
}

impl UnitPool {
    pub fn new(size: u32) -> Self {
        Self {
            units: vec![Unit::default(); size as usize],
            free: size,
        }
    }

    pub fn size(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn free(&self) -> u32 {
        self.free
    }

    pub fn busy(&self) -> u32 {
        self.size() - self.free
    }

    /// Takes the lowest-numbered free unit, or `None` when all are occupied.
    pub fn assign(&mut self, now: f64) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        let id = self.units.iter().position(|unit| !unit.busy)?;
        let unit = &mut self.units[id];
        unit.idle_time += now - unit.last_transition;
        unit.last_transition = now;
        unit.busy = true;
        self.free -= 1;
        Some(id)
    }

    /// Frees `id` and returns the busy span accrued by this release.
    ///
    /// Returns `None` for an unknown or already-free unit.
    pub fn release(&mut self, id: usize, now: f64) -> Option<f64> {
        let unit = self.units.get_mut(id).filter(|unit| unit.busy)?;
        let span = now - unit.last_transition;
        unit.busy_time += span;
        unit.last_transition = now;
        unit.busy = false;
        self.free += 1;
        Some(span)
    }

    /// Accrues every open interval up to `now` without changing occupancy.
    pub fn settle(&mut self, now: f64) {
        for unit in &mut self.units {
            let span = now - unit.last_transition;
            if unit.busy {
                unit.busy_time += span;
            } else {
                unit.idle_time += span;
            }
            unit.last_transition = now;
        }
    }

    /// Zeroes the accumulators and starts a new accounting window at `now`.
    /// Occupancy is state, not statistics, and is left untouched.
    pub fn reset_window(&mut self, now: f64) {
        for unit in &mut self.units {
            unit.busy_time = 0.0;
            unit.idle_time = 0.0;
            unit.last_transition = now;
        }
    }

    pub fn busy_time(&self, id: usize) -> f64 {
        self.units.get(id).map_or(0.0, |unit| unit.busy_time)
    }

    pub fn idle_time(&self, id: usize) -> f64 {
        self.units.get(id).map_or(0.0, |unit| unit.idle_time)
    }

    pub fn total_busy_time(&self) -> f64 {
        self.units.iter().map(|unit| unit.busy_time).sum()
    }

    pub fn idle_times(&self) -> Vec<f64> {
        self.units.iter().map(|unit| unit.idle_time).collect()
    }

    fn busy_flags(&self) -> u32 {
        self.units.iter().filter(|unit| unit.busy).count() as u32
    }
}

/// Flow statistics. Everything except `arrivals` is zeroed at the warm-up boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Counters {
    pub arrivals: u64,
    pub served: u64,
    pub consultations: u64,
    pub natural_births: u64,
    pub cesareans: u64,
    pub recovery_diversions: u64,
    pub incubator_diversions: u64,
    pub neonates_requiring_incubator: u64,
    pub consult_starts: u64,
    pub natural_starts: u64,
    pub cesarean_starts: u64,
    pub consult_wait_total: f64,
    pub natural_wait_total: f64,
    pub cesarean_wait_total: f64,
    pub physician_busy_time: f64,
    pub theater_busy_time: f64,
}

impl Counters {
    pub fn births(&self) -> u64 {
        self.natural_births + self.cesareans
    }

    fn reset_flow(&mut self) {
        *self = Counters {
            arrivals: self.arrivals,
            ..Counters::default()
        };
    }
}

#[derive(Clone, Debug)]
pub struct SystemState {
    pub resources: ResourceConfig,
    pub now: f64,
    /// Start of the statistics window: 0 until the warm-up reset.
    pub stats_since: f64,
    pub consult_queue: VecDeque<Patient>,
    pub natural_queue: VecDeque<Patient>,
    pub cesarean_queue: VecDeque<Patient>,
    pub physicians_free: u32,
    pub physicians_busy: u32,
    pub theater_free: bool,
    pub consults_in_service: u32,
    pub births_in_service: u32,
    pub consult_rooms: UnitPool,
    pub recovery_rooms: UnitPool,
    pub incubators: UnitPool,
    pub counters: Counters,
    next_patient_id: u64,
}

impl SystemState {
    pub fn new(resources: ResourceConfig) -> Self {
        Self {
            resources,
            now: 0.0,
            stats_since: 0.0,
            consult_queue: VecDeque::new(),
            natural_queue: VecDeque::new(),
            cesarean_queue: VecDeque::new(),
            physicians_free: resources.physicians,
            physicians_busy: 0,
            theater_free: true,
            consults_in_service: 0,
            births_in_service: 0,
            consult_rooms: UnitPool::new(resources.consult_rooms),
            recovery_rooms: UnitPool::new(resources.recovery_rooms),
            incubators: UnitPool::new(resources.incubators),
            counters: Counters::default(),
            next_patient_id: 0,
        }
    }

    /// Creates the next patient arriving now and counts the arrival.
    pub fn admit_arrival(&mut self, kind: PatientKind) -> Patient {
        let patient = Patient::new(self.next_patient_id, kind, self.now);
        self.next_patient_id += 1;
        self.counters.arrivals += 1;
        patient
    }

    pub fn enqueue(&mut self, patient: Patient) {
        self.queue_mut(patient.kind).push_back(patient);
    }

    pub fn queue_len(&self, kind: PatientKind) -> usize {
        match kind {
            PatientKind::Consultation => self.consult_queue.len(),
            PatientKind::NaturalBirth => self.natural_queue.len(),
            PatientKind::Cesarean => self.cesarean_queue.len(),
        }
    }

    pub fn births_waiting(&self) -> bool {
        !self.natural_queue.is_empty() || !self.cesarean_queue.is_empty()
    }

    pub fn queue_mut(&mut self, kind: PatientKind) -> &mut VecDeque<Patient> {
        match kind {
            PatientKind::Consultation => &mut self.consult_queue,
            PatientKind::NaturalBirth => &mut self.natural_queue,
            PatientKind::Cesarean => &mut self.cesarean_queue,
        }
    }

    pub fn take_physician(&mut self) -> bool {
        if self.physicians_free == 0 {
            return false;
        }
        self.physicians_free -= 1;
        self.physicians_busy += 1;
        true
    }

    pub fn return_physician(&mut self) {
        debug_assert!(self.physicians_busy > 0, "physician released twice");
        self.physicians_busy = self.physicians_busy.saturating_sub(1);
        self.physicians_free = self.resources.physicians - self.physicians_busy;
    }

    pub fn assign_consult_room(&mut self) -> Option<usize> {
        self.consult_rooms.assign(self.now)
    }

    pub fn release_consult_room(&mut self, id: usize) -> Option<f64> {
        self.consult_rooms.release(id, self.now)
    }

    pub fn assign_recovery_room(&mut self) -> Option<usize> {
        self.recovery_rooms.assign(self.now)
    }

    pub fn release_recovery_room(&mut self, id: usize) -> Option<f64> {
        self.recovery_rooms.release(id, self.now)
    }

    pub fn assign_incubator(&mut self) -> Option<usize> {
        self.incubators.assign(self.now)
    }

    pub fn release_incubator(&mut self, id: usize) -> Option<f64> {
        self.incubators.release(id, self.now)
    }

    /// Part of `[start, now]` that falls inside the statistics window.
    pub fn window_span(&self, start: f64) -> f64 {
        (self.now - start.max(self.stats_since)).max(0.0)
    }

    pub fn elapsed_window(&self) -> f64 {
        self.now - self.stats_since
    }

    /// Opens a fresh statistics window at `now`. Queues, occupancy and arrival
    /// counts carry over.
    pub fn reset_statistics(&mut self) {
        self.counters.reset_flow();
        self.consult_rooms.reset_window(self.now);
        self.recovery_rooms.reset_window(self.now);
        self.incubators.reset_window(self.now);
        self.stats_since = self.now;
    }

    pub fn settle(&mut self) {
        let now = self.now;
        self.consult_rooms.settle(now);
        self.recovery_rooms.settle(now);
        self.incubators.settle(now);
    }

    /// Checks every conservation rule; returns the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let g = self.resources.physicians;
        if self.physicians_free + self.physicians_busy != g {
            return Err(format!(
                "physicians: free {} + busy {} != {}",
                self.physicians_free, self.physicians_busy, g
            ));
        }
        if self.physicians_busy != self.consults_in_service + self.births_in_service {
            return Err(format!(
                "physicians busy {} != consults {} + births {}",
                self.physicians_busy, self.consults_in_service, self.births_in_service
            ));
        }
        if self.births_in_service > 1 {
            return Err(format!(
                "theater held by {} births",
                self.births_in_service
            ));
        }
        if self.theater_free != (self.births_in_service == 0) {
            return Err(format!(
                "theater_free {} with {} births in service",
                self.theater_free, self.births_in_service
            ));
        }
        if self.consult_rooms.busy() != self.consults_in_service {
            return Err(format!(
                "consult rooms busy {} != consults in service {}",
                self.consult_rooms.busy(),
                self.consults_in_service
            ));
        }
        for (name, pool, size) in [
            ("consult rooms", &self.consult_rooms, self.resources.consult_rooms),
            ("recovery rooms", &self.recovery_rooms, self.resources.recovery_rooms),
            ("incubators", &self.incubators, self.resources.incubators),
        ] {
            if pool.size() != size || pool.free() + pool.busy_flags() != size {
                return Err(format!(
                    "{}: free {} + busy {} != {}",
                    name,
                    pool.free(),
                    pool.busy_flags(),
                    size
                ));
            }
        }
        if self.counters.recovery_diversions > self.counters.births() {
            return Err("recovery diversions exceed births".to_string());
        }
        if self.counters.incubator_diversions > self.counters.neonates_requiring_incubator {
            return Err("incubator diversions exceed neonates requiring one".to_string());
        }
        Ok(())
    }
}
