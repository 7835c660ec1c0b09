use crate::{
    error::SimResult,
    event::{Event, EventKind},
    population::Census,
    processor::{EventProcessor, ProcessContext},
    types::Days,
};
use std::sync::{Mutex, PoisonError};

/// Takes a census, keeps it, and books the next one `interval_days` later.
pub struct CensusProcessor {
    interval_days: Days,
    history:       Mutex<Vec<Census>>,
}

impl CensusProcessor {
    pub fn new(interval_days: Days) -> Self {
        Self {
            interval_days,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<Census> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventProcessor for CensusProcessor {
    fn name(&self) -> &'static str { "census" }

    fn kind(&self) -> EventKind { EventKind::Census }

    fn priority(&self) -> i32 { -100 }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let census = ctx.population.census(ctx.now);
        log::info!(
            "date={} census: living={} deceased={} partnered={} stages={:?}",
            ctx.now,
            census.living,
            census.deceased,
            census.partnered,
            census.by_stage
        );
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(census);

        if self.interval_days > 0 {
            let next = Event::new(EventKind::Census, ctx.now).with_priority(event.priority());
            ctx.scheduler.schedule_with_delay(&next, self.interval_days)?;
        }
        Ok(())
    }
}
