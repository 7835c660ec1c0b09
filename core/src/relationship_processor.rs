use crate::{
    error::SimResult,
    event::{Event, EventKind},
    processor::{require_source, require_target, EventProcessor, ProcessContext},
};

/// source + target become partners.
pub struct PartnershipFormationProcessor;

impl EventProcessor for PartnershipFormationProcessor {
    fn name(&self) -> &'static str { "partnership_formation" }

    fn kind(&self) -> EventKind { EventKind::PartnershipFormation }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let a = require_source(event)?;
        let b = require_target(event)?;
        ctx.population.form_partnership(a, b, ctx.now)?;
        Ok(())
    }
}

/// The target's partnership ends. Already single is fine: a death may have
/// dissolved it before this event arrived. When the event names a source, it
/// only ends a partnership with that source; a newer partnership is left alone.
pub struct PartnershipDissolutionProcessor;

impl EventProcessor for PartnershipDissolutionProcessor {
    fn name(&self) -> &'static str { "partnership_dissolution" }

    fn kind(&self) -> EventKind { EventKind::PartnershipDissolution }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let id = require_target(event)?;
        let reason = event.payload_str("reason").unwrap_or("separation");
        let current = ctx.population.get(id).and_then(|p| p.partner());
        if let (Some(named), Some(current)) = (event.source(), current) {
            if named != current {
                log::trace!("date={} {id} is now partnered with {current}; stale {reason} ignored", ctx.now);
                return Ok(());
            }
        }
        match ctx.population.dissolve_partnership(id) {
            Some(former) => log::debug!("date={} {id} and {former} separated ({reason})", ctx.now),
            None => log::trace!("date={} {id} has no partnership to dissolve ({reason})", ctx.now),
        }
        Ok(())
    }
}

/// source adopts target.
pub struct AdoptionProcessor;

impl EventProcessor for AdoptionProcessor {
    fn name(&self) -> &'static str { "adoption" }

    fn kind(&self) -> EventKind { EventKind::Adoption }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let parent = require_source(event)?;
        let child = require_target(event)?;
        let linked = ctx.population.add_child(parent, child)?;
        log::debug!("date={} {child} adopted by {linked:?}", ctx.now);
        Ok(())
    }
}
