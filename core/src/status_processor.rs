//! Single-person property changes: health, wealth, personality.

use crate::{
    error::{LifecycleError, SimResult},
    event::{Event, EventKind},
    person::{HealthStatus, PersonalityTrait, WealthClass},
    processor::{require_payload, require_target, EventProcessor, ProcessContext},
};

/// Payload: `health`.
pub struct HealthChangeProcessor;

impl EventProcessor for HealthChangeProcessor {
    fn name(&self) -> &'static str { "health_change" }

    fn kind(&self) -> EventKind { EventKind::HealthChange }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let id = require_target(event)?;
        let health: HealthStatus = require_payload(event, "health")?;
        let person = ctx
            .population
            .get_mut(id)
            .ok_or(LifecycleError::UnknownPerson(id))?;
        let before = person.health();
        person.set_health(health)?;
        log::trace!("date={} {id} health {before:?} -> {health:?}", ctx.now);
        Ok(())
    }
}

/// Payload: `wealth`.
pub struct WealthChangeProcessor;

impl EventProcessor for WealthChangeProcessor {
    fn name(&self) -> &'static str { "wealth_change" }

    fn kind(&self) -> EventKind { EventKind::WealthChange }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let id = require_target(event)?;
        let wealth: WealthClass = require_payload(event, "wealth")?;
        ctx.population
            .get_mut(id)
            .ok_or(LifecycleError::UnknownPerson(id))?
            .set_wealth(wealth)?;
        Ok(())
    }
}

/// Payload: `trait`, `intensity` (1–10).
pub struct PersonalityShiftProcessor;

impl EventProcessor for PersonalityShiftProcessor {
    fn name(&self) -> &'static str { "personality_shift" }

    fn kind(&self) -> EventKind { EventKind::PersonalityShift }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let id = require_target(event)?;
        let t: PersonalityTrait = require_payload(event, "trait")?;
        let intensity: u8 = require_payload(event, "intensity")?;
        ctx.population
            .get_mut(id)
            .ok_or(LifecycleError::UnknownPerson(id))?
            .set_trait(t, intensity)?;
        Ok(())
    }
}
