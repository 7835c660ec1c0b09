//! The event scheduler — queue, processor registry, and the tick dispatch loop.
//!
//! ORDERING: `scheduled_time` ascending, then priority descending, then
//! insertion order. The sequence number makes the order total, so events
//! inserted concurrently at the same (time, priority) still come out FIFO.
//!
//! LOCKING:
//!   - Queue + id index share one `RwLock`. `schedule`, `cancel` and the
//!     drain phase of `process_due` take it exclusively; queries share it.
//!   - The processor table has its own `RwLock`.
//!   - Dispatch happens with neither lock held, so a processor may call back
//!     into `schedule` or `cancel` on the same scheduler.
//!
//! FAILURE POLICY:
//!   - No processor for a kind: the event goes to the dead-letter log.
//!   - A processor returns `Err`: that event goes to the dead-letter log,
//!     the untouched rest of the batch is put back in the queue, and the
//!     error is returned to the tick driver.

use crate::{
    clock::SharedClock,
    error::{SchedulingError, SimError, SimResult},
    event::{Event, EventKind},
    population::Population,
    processor::{EventProcessor, ProcessContext},
    types::{Days, EventId, SimTime},
};
use chrono::Duration;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Position of an event in the queue.
type QueueKey = (SimTime, Reverse<i32>, u64);

#[derive(Default)]
struct EventQueue {
    ordered:  BTreeMap<QueueKey, Arc<Event>>,
    /// Every live event, including ones drained for the current tick but not
    /// yet dispatched. Those stay cancellable until dispatch.
    index:    HashMap<EventId, (QueueKey, Arc<Event>)>,
    next_seq: u64,
}

impl EventQueue {
    fn insert(&mut self, event: Arc<Event>) {
        let key = (event.scheduled_time(), Reverse(event.priority()), self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.ordered.insert(key, Arc::clone(&event));
        self.index.insert(event.id(), (key, event));
    }

    fn forget(&mut self, id: EventId) {
        if let Some((key, _)) = self.index.remove(&id) {
            self.ordered.remove(&key);
        }
    }

    fn live(&self) -> impl Iterator<Item = &Arc<Event>> {
        self.ordered
            .values()
            .filter(|e| !e.is_cancelled() && !e.is_processed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadLetterReason {
    NoProcessor,
    ProcessorFailed(String),
}

/// A drained event that was not applied.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub event_id:       EventId,
    pub kind:           EventKind,
    pub scheduled_time: SimTime,
    pub tick:           SimTime,
    pub reason:         DeadLetterReason,
}

/// What one `process_due` call did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    /// Dispatched successfully, in dispatch order.
    pub dispatched:     Vec<(EventId, EventKind)>,
    /// Drained but cancelled before dispatch.
    pub skipped:        usize,
    pub dead_lettered:  usize,
}

pub struct EventScheduler {
    clock:        SharedClock,
    queue:        RwLock<EventQueue>,
    processors:   RwLock<HashMap<EventKind, Arc<dyn EventProcessor>>>,
    dead_letters: Mutex<Vec<DeadLetter>>,
}

impl EventScheduler {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            queue: RwLock::new(EventQueue::default()),
            processors: RwLock::new(HashMap::new()),
            dead_letters: Mutex::new(Vec::new()),
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    fn read_queue(&self) -> RwLockReadGuard<'_, EventQueue> {
        self.queue.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_queue(&self) -> RwLockWriteGuard<'_, EventQueue> {
        self.queue.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Registry ───────────────────────────────────

    /// Register a processor for its kind, replacing any earlier one.
    pub fn register_processor(&self, processor: Arc<dyn EventProcessor>) {
        let kind = processor.kind();
        let previous = self
            .processors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, processor);
        if let Some(old) = previous {
            log::debug!("processor '{}' replaced for {}", old.name(), kind.name());
        }
    }

    pub fn unregister_processor(&self, kind: EventKind) -> Option<Arc<dyn EventProcessor>> {
        self.processors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind)
    }

    pub fn processor_for(&self, kind: EventKind) -> Option<Arc<dyn EventProcessor>> {
        self.processors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    pub fn registered_kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<_> = self
            .processors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        kinds.sort();
        kinds
    }

    // ── Scheduling ─────────────────────────────────

    /// Queue an event. Returns a shared handle; holders may cancel through it.
    pub fn schedule(&self, event: Event) -> SimResult<Arc<Event>> {
        if event.is_cancelled() {
            return Err(SchedulingError::Cancelled(event.id()).into());
        }
        if event.is_processed() {
            return Err(SchedulingError::AlreadyProcessed(event.id()).into());
        }
        let event = Arc::new(event);
        let mut queue = self.write_queue();
        if queue.index.contains_key(&event.id()) {
            return Err(SchedulingError::DuplicateId(event.id()).into());
        }
        queue.insert(Arc::clone(&event));
        log::trace!(
            "scheduled {} {} at {} (queue={})",
            event.kind().name(),
            event.id(),
            event.scheduled_time(),
            queue.ordered.len()
        );
        Ok(event)
    }

    /// Queue a copy of `event` at `clock.now() + days`. The copy starts with
    /// clear flags, so the original's flags are checked here.
    pub fn schedule_with_delay(&self, event: &Event, days: Days) -> SimResult<Arc<Event>> {
        if event.is_cancelled() {
            return Err(SchedulingError::Cancelled(event.id()).into());
        }
        if event.is_processed() {
            return Err(SchedulingError::AlreadyProcessed(event.id()).into());
        }
        if days < 0 {
            return Err(SchedulingError::NegativeDelay(days).into());
        }
        let at = self.clock.now() + Duration::days(days);
        self.schedule(event.rescheduled(at))
    }

    /// Cancel a live event. False if it is unknown or already processed.
    ///
    /// A cancel that lands while the event's processor is running still
    /// returns true, but the event is applied and then marked processed.
    pub fn cancel(&self, id: EventId) -> bool {
        let mut queue = self.write_queue();
        let Some(event) = queue.index.get(&id).map(|(_, e)| Arc::clone(e)) else {
            return false;
        };
        if event.is_processed() {
            return false;
        }
        let flipped = event.cancel();
        queue.forget(id);
        flipped
    }

    // ── Tick ───────────────────────────────────────

    /// Drain every event due at or before `now` and dispatch each to its
    /// processor. See the module docs for the failure policy.
    pub fn process_due(&self, now: SimTime, population: &mut Population) -> SimResult<TickReport> {
        let batch = self.drain_due(now);
        let mut report = TickReport::default();
        if batch.is_empty() {
            return Ok(report);
        }
        log::debug!("date={now} dispatching {} due events", batch.len());

        for (pos, (_, event)) in batch.iter().enumerate() {
            // Cancellation may land between drain and dispatch.
            if event.is_cancelled() {
                self.write_queue().index.remove(&event.id());
                report.skipped += 1;
                continue;
            }

            let Some(processor) = self.processor_for(event.kind()) else {
                log::warn!(
                    "date={now} no processor for {} event {}; dead-lettered",
                    event.kind().name(),
                    event.id()
                );
                self.dead_letter(event, now, DeadLetterReason::NoProcessor);
                report.dead_lettered += 1;
                continue;
            };

            let mut ctx = ProcessContext { now, population: &mut *population, scheduler: self };
            match processor.process(event, &mut ctx) {
                Ok(()) => {
                    event.mark_processed();
                    self.write_queue().index.remove(&event.id());
                    report.dispatched.push((event.id(), event.kind()));
                }
                Err(err) => {
                    log::warn!(
                        "date={now} processor '{}' failed on {}: {err}",
                        processor.name(),
                        event.id()
                    );
                    self.dead_letter(event, now, DeadLetterReason::ProcessorFailed(err.to_string()));
                    let requeued = self.requeue(&batch[pos + 1..]);
                    if requeued > 0 {
                        log::info!("date={now} {requeued} undispatched events returned to the queue");
                    }
                    return Err(SimError::Processing {
                        event_id: event.id(),
                        kind:     event.kind(),
                        source:   Box::new(err),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Pop due events under the exclusive lock. Cancelled or processed events
    /// met on the way are purged from the index.
    fn drain_due(&self, now: SimTime) -> Vec<(QueueKey, Arc<Event>)> {
        let mut queue = self.write_queue();
        let mut batch = Vec::new();
        while let Some(entry) = queue.ordered.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let (key, event) = entry.remove_entry();
            if event.is_cancelled() || event.is_processed() {
                queue.index.remove(&event.id());
                continue;
            }
            batch.push((key, event));
        }
        batch
    }

    /// Put undispatched events back at their original queue positions.
    fn requeue(&self, rest: &[(QueueKey, Arc<Event>)]) -> usize {
        let mut queue = self.write_queue();
        let mut count = 0;
        for (key, event) in rest {
            if event.is_cancelled() || !queue.index.contains_key(&event.id()) {
                queue.index.remove(&event.id());
                continue;
            }
            queue.ordered.insert(*key, Arc::clone(event));
            count += 1;
        }
        count
    }

    fn dead_letter(&self, event: &Event, tick: SimTime, reason: DeadLetterReason) {
        self.write_queue().index.remove(&event.id());
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DeadLetter {
                event_id: event.id(),
                kind: event.kind(),
                scheduled_time: event.scheduled_time(),
                tick,
                reason,
            });
    }

    // ── Queries ────────────────────────────────────

    pub fn events_at(&self, time: SimTime) -> Vec<Arc<Event>> {
        self.read_queue()
            .live()
            .filter(|e| e.scheduled_time() == time)
            .cloned()
            .collect()
    }

    /// Live events with `start <= scheduled_time <= end`, in queue order.
    pub fn events_between(&self, start: SimTime, end: SimTime) -> SimResult<Vec<Arc<Event>>> {
        if start > end {
            return Err(SchedulingError::InvalidRange { start, end }.into());
        }
        let from: QueueKey = (start, Reverse(i32::MAX), 0);
        let queue = self.read_queue();
        Ok(queue
            .ordered
            .range(from..)
            .map(|(_, e)| e)
            .take_while(|e| e.scheduled_time() <= end)
            .filter(|e| !e.is_cancelled() && !e.is_processed())
            .cloned()
            .collect())
    }

    pub fn next_event(&self) -> Option<Arc<Event>> {
        self.read_queue().live().next().cloned()
    }

    pub fn get(&self, id: EventId) -> Option<Arc<Event>> {
        self.read_queue().index.get(&id).map(|(_, e)| Arc::clone(e))
    }

    /// Number of live (queued, uncancelled) events.
    pub fn len(&self) -> usize {
        self.read_queue().live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued event. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut queue = self.write_queue();
        let removed = queue.ordered.len();
        let ordered = std::mem::take(&mut queue.ordered);
        for event in ordered.values() {
            queue.index.remove(&event.id());
        }
        removed
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
