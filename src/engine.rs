use tracing::{info, trace};

use crate::costs;
use crate::error::Result;
use crate::events::{EventKind, EventType, FutureEventList};
use crate::generator::VariateGenerator;
use crate::handlers::{accrue_open_services, dispatch, HandlerContext};
use crate::indicators;
use crate::models::SimConfig;
use crate::output::{RunMetadata, SimulationResult};
use crate::state::SystemState;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    NotStarted,
    WarmUp,
    SteadyState,
    Terminated,
}

/// What one call to [`SimulationEngine::step`] processed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessedEvent {
    pub time: f64,
    pub event_type: EventType,
    pub patient_id: Option<u64>,
}

pub struct SimulationEngine {
    config: SimConfig,
    state: SystemState,
    fel: FutureEventList,
    generator: VariateGenerator,
    phase: Phase,
    tally: [u64; EventType::COUNT],
}

impl SimulationEngine {
    /// Validates the configuration; nothing is simulated on failure.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let generator = VariateGenerator::new(&config.distributions, config.seed)?;
        let state = SystemState::new(config.resources);

        Ok(Self {
            config,
            state,
            fel: FutureEventList::new(),
            generator,
            phase: Phase::NotStarted,
            tally: [0; EventType::COUNT],
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn event_list(&self) -> &FutureEventList {
        &self.fel
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn processed(&self, event_type: EventType) -> u64 {
        self.tally[event_type.index()]
    }

    pub fn events_processed(&self) -> u64 {
        self.tally.iter().sum()
    }

    fn start(&mut self) {
        let first = self.generator.interarrival();
        self.fel.insert(first, EventKind::Arrival);
        self.phase = if self.config.horizon.warmup_min > 0.0 {
            Phase::WarmUp
        } else {
            Phase::SteadyState
        };
        info!(
            resources = %self.config.resources.label(),
            seed = ?self.config.seed,
            horizon_min = self.config.horizon.duration_min,
            warmup_min = self.config.horizon.warmup_min,
            "simulation started"
        );
    }

    /// Processes the next event before the horizon.
    ///
    /// Returns `None` once the run has terminated; the first `None` closes the
    /// statistics window at the horizon.
    pub fn step(&mut self) -> Option<ProcessedEvent> {
        match self.phase {
            Phase::Terminated => return None,
            Phase::NotStarted => self.start(),
            Phase::WarmUp | Phase::SteadyState => {}
        }

        let horizon = self.config.horizon.duration_min;
        let due = self
            .fel
            .peek_earliest()
            .is_some_and(|event| event.time < horizon);
        if !due {
            self.finish();
            return None;
        }
        let event = self.fel.pop_earliest()?;

        if self.phase == Phase::WarmUp && event.time >= self.config.horizon.warmup_min {
            self.end_warmup();
        }

        self.state.now = event.time;
        let processed = ProcessedEvent {
            time: event.time,
            event_type: event.kind.event_type(),
            patient_id: event.kind.patient_id(),
        };
        trace!(
            time = event.time,
            event = processed.event_type.as_str(),
            patient = ?processed.patient_id,
            "dispatch"
        );

        let mut ctx = HandlerContext {
            state: &mut self.state,
            fel: &mut self.fel,
            generator: &mut self.generator,
        };
        dispatch(event.kind, &mut ctx);
        self.tally[processed.event_type.index()] += 1;

        Some(processed)
    }

    /// Runs to the horizon and returns the result record.
    pub fn run(&mut self) -> SimulationResult {
        while self.step().is_some() {}
        self.result()
    }

    /// Discards warm-up statistics exactly at the boundary. No event happens
    /// between the previous event and the boundary, so accruing idle and busy
    /// spans from the boundary onwards is exact.
    fn end_warmup(&mut self) {
        self.state.now = self.config.horizon.warmup_min;
        self.state.reset_statistics();
        self.phase = Phase::SteadyState;
        info!(
            time = self.state.now,
            arrivals = self.state.counters.arrivals,
            "warm-up complete, statistics reset"
        );
    }

    fn finish(&mut self) {
        if self.phase == Phase::WarmUp {
            self.end_warmup();
        }
        let horizon = self.config.horizon.duration_min;
        if self.state.now < horizon {
            self.state.now = horizon;
        }
        accrue_open_services(&mut self.state, &self.fel);
        self.state.settle();
        self.phase = Phase::Terminated;
        info!(
            events = self.events_processed(),
            arrivals = self.state.counters.arrivals,
            served = self.state.counters.served,
            pending = self.fel.len(),
            "simulation finished"
        );
    }

    pub fn result(&self) -> SimulationResult {
        SimulationResult {
            metadata: RunMetadata {
                resources: self.config.resources,
                seed: self.config.seed,
                horizon_min: self.config.horizon.duration_min,
                warmup_min: self.config.horizon.warmup_min,
                window_min: self.state.elapsed_window(),
                final_clock_min: self.state.now,
                events_processed: self.events_processed(),
            },
            indicators: indicators::compute(&self.state),
            costs: costs::compute(&self.state, &self.config.costs),
        }
    }
}

pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    let mut engine = SimulationEngine::new(config.clone())?;
    Ok(engine.run())
}
