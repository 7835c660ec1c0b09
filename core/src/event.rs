//! Events — every population state change flows through one of these.
//!
//! RULE: Processors never mutate the population except in response to an
//! Event delivered by the scheduler. Anything that wants a change to happen
//! builds an Event and schedules it.

use crate::types::{EventId, PersonId, SimTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Closed set of event kinds. The kind is the only dispatch key.
/// Variants are appended — never removed or reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // ── Lifecycle ──────────────────────────────────
    Birth,
    Death,

    // ── Relationship ───────────────────────────────
    PartnershipFormation,
    PartnershipDissolution,
    Adoption,

    // ── Entity property ────────────────────────────
    HealthChange,
    WealthChange,
    PersonalityShift,

    // ── System ─────────────────────────────────────
    Census,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Lifecycle,
    Relationship,
    EntityProperty,
    System,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Birth,
        EventKind::Death,
        EventKind::PartnershipFormation,
        EventKind::PartnershipDissolution,
        EventKind::Adoption,
        EventKind::HealthChange,
        EventKind::WealthChange,
        EventKind::PersonalityShift,
        EventKind::Census,
    ];

    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::Birth | EventKind::Death => EventCategory::Lifecycle,
            EventKind::PartnershipFormation
            | EventKind::PartnershipDissolution
            | EventKind::Adoption => EventCategory::Relationship,
            EventKind::HealthChange
            | EventKind::WealthChange
            | EventKind::PersonalityShift => EventCategory::EntityProperty,
            EventKind::Census => EventCategory::System,
        }
    }

    /// Stable string name, used in log lines and dead-letter records.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Birth                  => "birth",
            EventKind::Death                  => "death",
            EventKind::PartnershipFormation   => "partnership_formation",
            EventKind::PartnershipDissolution => "partnership_dissolution",
            EventKind::Adoption               => "adoption",
            EventKind::HealthChange           => "health_change",
            EventKind::WealthChange           => "wealth_change",
            EventKind::PersonalityShift       => "personality_shift",
            EventKind::Census                 => "census",
        }
    }
}

/// A scheduled state change.
///
/// Everything except the two flags is fixed at construction. The flags are
/// atomic so that a holder of a shared handle can cancel the event while the
/// scheduler owns it.
#[derive(Debug)]
pub struct Event {
    id:             EventId,
    kind:           EventKind,
    scheduled_time: SimTime,
    priority:       i32,
    source:         Option<PersonId>,
    target:         Option<PersonId>,
    payload:        BTreeMap<String, Value>,
    processed:      AtomicBool,
    cancelled:      AtomicBool,
}

impl Event {
    pub fn new(kind: EventKind, scheduled_time: SimTime) -> Self {
        Self {
            id: EventId::new(),
            kind,
            scheduled_time,
            priority: 0,
            source: None,
            target: None,
            payload: BTreeMap::new(),
            processed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_source(mut self, source: PersonId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target(mut self, target: PersonId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> EventId { self.id }
    pub fn kind(&self) -> EventKind { self.kind }
    pub fn scheduled_time(&self) -> SimTime { self.scheduled_time }
    pub fn priority(&self) -> i32 { self.priority }
    pub fn source(&self) -> Option<PersonId> { self.source }
    pub fn target(&self) -> Option<PersonId> { self.target }

    /// Snapshot of the payload. Mutating the returned map has no effect on the event.
    pub fn payload(&self) -> BTreeMap<String, Value> {
        self.payload.clone()
    }

    pub fn payload_value(&self, key: &str) -> Option<Value> {
        self.payload.get(key).cloned()
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn payload_u64(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }

    /// Decode a payload field into a typed value.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.payload
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_processed(&self) -> bool {
        self.processed.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Has no effect once the event has been processed.
    /// Returns true if this call flipped the flag.
    pub fn cancel(&self) -> bool {
        if self.is_processed() {
            return false;
        }
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Set once by the scheduler after a successful dispatch.
    pub(crate) fn mark_processed(&self) -> bool {
        !self.processed.swap(true, Ordering::AcqRel)
    }

    /// Copy of this event at a different time. Identity, kind, priority,
    /// participants and payload carry over; the flags start clear, so callers
    /// check the original's flags first (see `EventScheduler::schedule_with_delay`).
    pub fn rescheduled(&self, scheduled_time: SimTime) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            scheduled_time,
            priority: self.priority,
            source: self.source,
            target: self.target,
            payload: self.payload.clone(),
            processed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }
}
