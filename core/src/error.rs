use crate::{
    event::EventKind,
    person::LifeStage,
    types::{EventId, PersonId, SimTime},
};
use thiserror::Error;

/// A partnership or parenthood rule was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("Person {0} cannot form a relationship with themselves")]
    SelfReference(PersonId),

    #[error("Person {0} not found in population")]
    UnknownPerson(PersonId),

    #[error("Person {0} already has an active partner")]
    AlreadyPartnered(PersonId),

    #[error("Person {id} is not an adult (life stage {stage:?})")]
    NotAdult { id: PersonId, stage: LifeStage },

    #[error("Person {0} is deceased")]
    Deceased(PersonId),

    #[error("Persons {a} and {b} are direct family")]
    DirectFamily { a: PersonId, b: PersonId },

    #[error("Parent {parent} is only {gap_years} years older than child {child} (minimum {min})")]
    AgeGapTooSmall {
        parent:    PersonId,
        child:     PersonId,
        gap_years: i64,
        min:       i64,
    },

    #[error("Person {parent} is {age} years old, too young to become a parent")]
    TooYoungToParent { parent: PersonId, age: u32 },

    #[error("Child {child} was born before parent {parent}")]
    ChildOlderThanParent { parent: PersonId, child: PersonId },

    #[error("Person {0} already has two parents")]
    TooManyParents(PersonId),

    #[error("Person {parent} is already a parent of {child}")]
    AlreadyParent { parent: PersonId, child: PersonId },

    #[error("Linking {child} to parent {parent} would make {child} direct family of their partner {partner}")]
    PartnerBecomesFamily {
        parent:  PersonId,
        child:   PersonId,
        partner: PersonId,
    },
}

/// A life-status change was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Person {0} not found in population")]
    UnknownPerson(PersonId),

    #[error("Person {0} is already deceased")]
    AlreadyDeceased(PersonId),

    #[error("Death date {date} is before birth date {birth}")]
    DeathBeforeBirth { date: SimTime, birth: SimTime },

    #[error("Death date {date} is after current time {now}")]
    DeathInFuture { date: SimTime, now: SimTime },

    #[error("Age at death {age} exceeds maximum of {max}")]
    AgeAtDeathExceeded { age: u32, max: u32 },

    #[error("Trait intensity {0} outside 1..=10")]
    TraitIntensityOutOfRange(u8),

    #[error("Person {0} already exists in population")]
    DuplicatePerson(PersonId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Event {0} is cancelled and cannot be scheduled")]
    Cancelled(EventId),

    #[error("Event {0} has already been processed")]
    AlreadyProcessed(EventId),

    #[error("Event {0} is already scheduled")]
    DuplicateId(EventId),

    #[error("Negative delay: {0} days")]
    NegativeDelay(i64),

    #[error("Invalid time range: {start} is after {end}")]
    InvalidRange { start: SimTime, end: SimTime },
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Relationship(#[from] RelationshipError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Processing {kind:?} event {event_id} failed: {source}")]
    Processing {
        event_id: EventId,
        kind:     EventKind,
        #[source]
        source:   Box<SimError>,
    },

    #[error("Event {event_id} is missing its {role} person")]
    MissingParticipant { event_id: EventId, role: &'static str },

    #[error("Event {event_id} payload field '{field}' is missing or invalid")]
    InvalidPayload { event_id: EventId, field: &'static str },

    #[error("Clock is paused")]
    ClockPaused,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
