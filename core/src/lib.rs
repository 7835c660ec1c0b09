//! Lifesim core: a synthetic population driven entirely by scheduled events.
//!
//! LAYERS (leaves first):
//!   clock      — logical time, the only source of "now"
//!   event      — kinds, payloads, processed/cancelled flags
//!   person     — one member of the population
//!   population — the aggregate that owns every person and the
//!                relationship invariants
//!   processor  — one handler per event kind
//!   scheduler  — queue, registry, tick dispatch
//!   engine     — the clock driver wiring it all together

pub mod census_processor;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod lifecycle_processor;
pub mod name_generator;
pub mod person;
pub mod planner;
pub mod population;
pub mod processor;
pub mod relationship_processor;
pub mod rng;
pub mod scheduler;
pub mod seeder;
pub mod status_processor;
pub mod types;
