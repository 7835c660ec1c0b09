//! Birth and death.
//!
//! Birth:  target = birth mother (required), source = second parent (optional).
//!         Payload: `sex` (required), `name` (optional).
//! Death:  target = the deceased. Payload: `cause` (optional, defaults to
//!         unexplained; an unrecognised cause is rejected). A widowed partner
//!         gets a follow-on `PartnershipDissolution` event for the record.

use crate::{
    error::{RelationshipError, SimResult},
    event::{Event, EventKind},
    person::{years_between, DeathCause, Person, Sex},
    population::MIN_PARENT_AGE_GAP,
    processor::{require_payload, require_target, EventProcessor, ProcessContext},
};

pub struct BirthProcessor;

impl EventProcessor for BirthProcessor {
    fn name(&self) -> &'static str { "birth" }

    fn kind(&self) -> EventKind { EventKind::Birth }

    fn priority(&self) -> i32 { 10 }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let mother = require_target(event)?;
        let sex: Sex = require_payload(event, "sex")?;
        let born = event.scheduled_time();

        // Validate the mother before the child exists, so a rejected birth
        // leaves no orphan behind.
        let m = ctx
            .population
            .get(mother)
            .ok_or(RelationshipError::UnknownPerson(mother))?;
        if !m.is_alive() {
            return Err(RelationshipError::Deceased(mother).into());
        }
        let age = years_between(m.birth_date(), born);
        if (age as i64) < MIN_PARENT_AGE_GAP {
            return Err(RelationshipError::TooYoungToParent { parent: mother, age }.into());
        }

        let name = event.payload_str("name").unwrap_or("Unnamed").to_string();
        let child = ctx.population.insert(Person::new(name, sex, born))?;
        let linked = ctx.population.add_child(mother, child)?;

        if let Some(other) = event.source() {
            if !linked.contains(&other) {
                if let Err(reason) = ctx.population.add_child(other, child) {
                    log::warn!("date={} birth {child}: second parent {other} not linked: {reason}", ctx.now);
                }
            }
        }

        log::debug!("date={} born: {child} to {mother}", ctx.now);
        Ok(())
    }
}

pub struct DeathProcessor;

impl EventProcessor for DeathProcessor {
    fn name(&self) -> &'static str { "death" }

    fn kind(&self) -> EventKind { EventKind::Death }

    fn priority(&self) -> i32 { 100 }

    fn process(&self, event: &Event, ctx: &mut ProcessContext<'_>) -> SimResult<()> {
        let id = require_target(event)?;
        let cause: Option<DeathCause> = match event.payload_value("cause") {
            None => None,
            Some(_) => Some(require_payload(event, "cause")?),
        };
        let widowed = ctx
            .population
            .mark_deceased(id, event.scheduled_time(), cause, ctx.now)?;

        if let Some(partner) = widowed {
            let follow_on = Event::new(EventKind::PartnershipDissolution, ctx.now)
                .with_source(id)
                .with_target(partner)
                .with_payload("reason", "bereavement");
            ctx.scheduler.schedule(follow_on)?;
        }
        Ok(())
    }
}
