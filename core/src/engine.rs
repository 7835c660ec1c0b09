//! The simulation engine — the clock driver.
//!
//! STEP ORDER (fixed, documented, never reordered):
//!   1. Advance the clock by one step at the configured speed.
//!   2. Planner rolls life events for the new date and schedules them.
//!   3. Scheduler drains and dispatches everything due at the new date.
//!
//! RULES:
//!   - The population is only mutated by processors, during step 3.
//!   - All randomness flows through the RngBank.
//!   - A processing failure stops the step; the events still queued are kept
//!     for the next step.

use crate::{
    census_processor::CensusProcessor,
    clock::{SharedClock, SimClock},
    config::SimConfig,
    error::SimResult,
    event::{Event, EventKind},
    lifecycle_processor::{BirthProcessor, DeathProcessor},
    planner::{LifeEventPlanner, PlanSummary},
    population::{Census, Population},
    processor::EventProcessor,
    relationship_processor::{
        AdoptionProcessor, PartnershipDissolutionProcessor, PartnershipFormationProcessor,
    },
    rng::RngBank,
    scheduler::{EventScheduler, TickReport},
    seeder::PopulationSeeder,
    status_processor::{HealthChangeProcessor, PersonalityShiftProcessor, WealthChangeProcessor},
    types::SimTime,
};
use std::sync::Arc;

/// Census events run after everything else on their date.
const CENSUS_PRIORITY: i32 = -100;

pub struct SimEngine {
    pub config:     SimConfig,
    pub clock:      SharedClock,
    pub rng_bank:   RngBank,
    pub scheduler:  EventScheduler,
    pub population: Population,
    planner:        LifeEventPlanner,
    census:         Arc<CensusProcessor>,
    step:           u64,
}

impl SimEngine {
    /// Wire an engine around an existing population, with every default
    /// processor registered. No census is booked.
    pub fn new(config: SimConfig, population: Population) -> Self {
        let mut clock = SimClock::new(config.start_date);
        clock.set_speed(config.speed);
        let clock = SharedClock::new(clock);
        let scheduler = EventScheduler::new(clock.clone());
        let census = Arc::new(CensusProcessor::new(config.census_interval_days));
        register_default_processors(&scheduler, Arc::clone(&census));

        Self {
            rng_bank: RngBank::new(config.seed),
            planner: LifeEventPlanner::new(config.rates.clone()),
            clock,
            scheduler,
            population,
            census,
            step: 0,
            config,
        }
    }

    /// Build a fully wired engine with a seeded population and the first
    /// census booked for the start date.
    pub fn build(config: SimConfig) -> SimResult<Self> {
        let rngs = RngBank::new(config.seed);
        let population = PopulationSeeder::new(&config, &rngs).seed()?;
        let engine = Self::new(config, population);
        if engine.config.census_interval_days > 0 {
            engine.scheduler.schedule(
                Event::new(EventKind::Census, engine.config.start_date).with_priority(CENSUS_PRIORITY),
            )?;
        }
        Ok(engine)
    }

    /// Test engine: default test config with the given seed.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let mut config = SimConfig::default_test();
        config.seed = seed;
        Self::build(config)
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn steps_run(&self) -> u64 {
        self.step
    }

    /// Advance one step. This is the core simulation loop body.
    pub fn step(&mut self) -> SimResult<(PlanSummary, TickReport)> {
        let days = self.config.speed.days_per_step();
        let now = self.clock.advance()?;
        self.step += 1;

        let plan = self.planner.plan(
            self.step,
            now,
            days,
            &self.population,
            &self.rng_bank,
            &self.scheduler,
        )?;
        let report = self.scheduler.process_due(now, &mut self.population)?;
        log::trace!(
            "tick={} date={now} dispatched={} skipped={} dead={}",
            self.step,
            report.dispatched.len(),
            report.skipped,
            report.dead_lettered
        );
        Ok((plan, report))
    }

    /// Run n steps in a loop. Used for testing and fast-forward.
    pub fn run_steps(&mut self, n: u64) -> SimResult<()> {
        self.clock.resume();
        let result = (0..n).try_for_each(|_| self.step().map(|_| ()));
        self.clock.pause();
        result
    }

    pub fn census(&self) -> Census {
        self.population.census(self.now())
    }

    /// Every census taken by the census processor so far.
    pub fn census_history(&self) -> Vec<Census> {
        self.census.history()
    }
}

/// Register one processor per event kind.
pub fn register_default_processors(scheduler: &EventScheduler, census: Arc<CensusProcessor>) {
    let processors: Vec<Arc<dyn EventProcessor>> = vec![
        Arc::new(BirthProcessor),
        Arc::new(DeathProcessor),
        Arc::new(PartnershipFormationProcessor),
        Arc::new(PartnershipDissolutionProcessor),
        Arc::new(AdoptionProcessor),
        Arc::new(HealthChangeProcessor),
        Arc::new(WealthChangeProcessor),
        Arc::new(PersonalityShiftProcessor),
        census,
    ];
    for processor in processors {
        scheduler.register_processor(processor);
    }
}
