//! Processor trait.
//!
//! RULE: Every processor serves exactly one `EventKind`.
//! The scheduler looks processors up by kind; the last registration for a
//! kind wins. A processor touches the population only through the
//! `ProcessContext` it is handed for a single event.

use crate::{
    error::{SimError, SimResult},
    event::{Event, EventKind},
    population::Population,
    scheduler::EventScheduler,
    types::{PersonId, SimTime},
};

/// Everything a processor may use while applying one event.
pub struct ProcessContext<'a> {
    /// The tick time `process_due` was called with.
    pub now:        SimTime,
    pub population: &'a mut Population,
    /// The dispatching scheduler. Safe to call `schedule`/`cancel` on:
    /// dispatch runs outside the queue lock.
    pub scheduler:  &'a EventScheduler,
}

/// The contract every processor must fulfill.
pub trait EventProcessor: Send + Sync {
    /// Unique stable name for this processor.
    fn name(&self) -> &'static str;

    /// The one kind this processor serves.
    fn kind(&self) -> EventKind;

    /// Informational; registration is last-wins regardless of priority.
    fn priority(&self) -> i32 {
        0
    }

    /// Apply `event`. Called at most once per event. Returning `Ok` lets the
    /// scheduler mark the event processed; returning `Err` halts the tick.
    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()>;
}

/// The event's target person, or a `MissingParticipant` error.
pub fn require_target(event: &Event) -> SimResult<PersonId> {
    event.target().ok_or(SimError::MissingParticipant {
        event_id: event.id(),
        role:     "target",
    })
}

/// The event's source person, or a `MissingParticipant` error.
pub fn require_source(event: &Event) -> SimResult<PersonId> {
    event.source().ok_or(SimError::MissingParticipant {
        event_id: event.id(),
        role:     "source",
    })
}

/// Decode a required payload field.
pub fn require_payload<T: serde::de::DeserializeOwned>(
    event: &Event,
    field: &'static str,
) -> SimResult<T> {
    event.payload_as(field).ok_or(SimError::InvalidPayload {
        event_id: event.id(),
        field,
    })
}
