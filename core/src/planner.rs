//! Life-event planner — decides what happens to whom each step.
//!
//! The planner never touches the population. It rolls dice against the
//! configured annual rates (scaled to the step length) and schedules events
//! for the current date; the processors apply them.
//!
//! RULE: at most one planned event per person per step. Every participant of
//! a planned event is claimed, so two events in one batch can never race on
//! the same person (e.g. a death and a birth for the same couple).

use crate::{
    config::RatesConfig,
    error::SimResult,
    event::{Event, EventKind},
    name_generator::NameGenerator,
    person::{DeathCause, HealthStatus, LifeStage, Person, Sex},
    population::Population,
    rng::{RngBank, RngSlot},
    scheduler::EventScheduler,
    types::{Days, PersonId, SimTime},
};
use std::collections::HashSet;

/// Event priorities for planned events at the same date.
const DEATH_PRIORITY: i32 = 3;
const DISSOLUTION_PRIORITY: i32 = 2;
const FORMATION_PRIORITY: i32 = 1;

pub struct LifeEventPlanner {
    rates: RatesConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub deaths:        usize,
    pub partnerships:  usize,
    pub dissolutions:  usize,
    pub births:        usize,
    pub status:        usize,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.deaths + self.partnerships + self.dissolutions + self.births + self.status
    }
}

impl LifeEventPlanner {
    pub fn new(rates: RatesConfig) -> Self {
        Self { rates }
    }

    /// Scale an annual probability to a step of `days`.
    fn per_step(annual: f64, days: Days) -> f64 {
        (annual * days as f64 / 365.0).clamp(0.0, 1.0)
    }

    pub fn plan(
        &self,
        step: u64,
        now: SimTime,
        days: Days,
        population: &Population,
        rngs: &RngBank,
        scheduler: &EventScheduler,
    ) -> SimResult<PlanSummary> {
        let mut mortality = rngs.for_slot_at_step(RngSlot::Mortality, step);
        let mut romance = rngs.for_slot_at_step(RngSlot::Partnership, step);
        let mut fertility = rngs.for_slot_at_step(RngSlot::Fertility, step);
        let mut health = rngs.for_slot_at_step(RngSlot::Health, step);
        let mut wealth = rngs.for_slot_at_step(RngSlot::Wealth, step);
        let mut names = rngs.for_slot_at_step(RngSlot::Names, step);

        let mut claimed: HashSet<PersonId> = HashSet::new();
        let mut summary = PlanSummary::default();

        let living: Vec<&Person> = population
            .ids()
            .iter()
            .filter_map(|id| population.get(*id))
            .filter(|p| p.is_alive())
            .collect();
        let singles: Vec<PersonId> = living
            .iter()
            .filter(|p| p.partner().is_none() && p.life_stage(now).is_adult())
            .map(|p| p.id())
            .collect();

        for person in &living {
            let id = person.id();
            if claimed.contains(&id) {
                continue;
            }
            let stage = person.life_stage(now);
            let partner = person.partner();
            let partner_free = partner.map_or(true, |p| !claimed.contains(&p));

            // Death
            let mut p_death = self.rates.mortality.get(&stage).copied().unwrap_or(0.0);
            if person.health() >= HealthStatus::Poor {
                p_death *= self.rates.frailty_multiplier;
            }
            if mortality.chance(Self::per_step(p_death, days)) {
                let cause = death_cause(stage, person.health(), mortality.next_f64());
                let event = Event::new(EventKind::Death, now)
                    .with_target(id)
                    .with_priority(DEATH_PRIORITY)
                    .with_payload("cause", serde_json::to_value(cause)?);
                scheduler.schedule(event)?;
                claimed.insert(id);
                claimed.extend(partner);
                summary.deaths += 1;
                continue;
            }

            if let Some(partner_id) = partner.filter(|_| partner_free) {
                // Separation
                if romance.chance(Self::per_step(self.rates.dissolution, days)) {
                    let event = Event::new(EventKind::PartnershipDissolution, now)
                        .with_target(id)
                        .with_source(partner_id)
                        .with_priority(DISSOLUTION_PRIORITY)
                        .with_payload("reason", "separation");
                    scheduler.schedule(event)?;
                    claimed.extend([id, partner_id]);
                    summary.dissolutions += 1;
                    continue;
                }

                // Birth
                if let Some(father) = population.get(partner_id) {
                    let (lo, hi) = self.rates.fertile_ages;
                    let age = person.age(now);
                    if person.sex() == Sex::Female
                        && (lo..=hi).contains(&age)
                        && fertility.chance(Self::per_step(self.rates.fertility, days))
                    {
                        let sex = if fertility.chance(0.5) { Sex::Female } else { Sex::Male };
                        let family = NameGenerator::family_name(father.name());
                        let name = NameGenerator::generate_child_name(sex, family, &mut names);
                        let event = Event::new(EventKind::Birth, now)
                            .with_target(id)
                            .with_source(partner_id)
                            .with_payload("sex", serde_json::to_value(sex)?)
                            .with_payload("name", name);
                        scheduler.schedule(event)?;
                        claimed.extend([id, partner_id]);
                        summary.births += 1;
                        continue;
                    }
                }
            } else if partner.is_none()
                && stage.is_adult()
                && romance.chance(Self::per_step(self.rates.partnership, days))
            {
                // Partnership: first eligible single from a random offset.
                let offset = romance.next_u64_below(singles.len() as u64) as usize;
                let candidate = singles
                    .iter()
                    .cycle()
                    .skip(offset)
                    .take(singles.len())
                    .copied()
                    .find(|other| {
                        !claimed.contains(other)
                            && population.can_form_partnership(id, *other, now).is_ok()
                    });
                if let Some(other) = candidate {
                    let event = Event::new(EventKind::PartnershipFormation, now)
                        .with_source(id)
                        .with_target(other)
                        .with_priority(FORMATION_PRIORITY);
                    scheduler.schedule(event)?;
                    claimed.extend([id, other]);
                    summary.partnerships += 1;
                    continue;
                }
            }

            // Health decline
            if person.health() != HealthStatus::Critical
                && health.chance(Self::per_step(self.rates.health_decline, days))
            {
                let event = Event::new(EventKind::HealthChange, now)
                    .with_target(id)
                    .with_payload("health", serde_json::to_value(person.health().declined())?);
                scheduler.schedule(event)?;
                claimed.insert(id);
                summary.status += 1;
                continue;
            }

            // Wealth drift
            if stage.is_adult() && wealth.chance(Self::per_step(self.rates.wealth_drift, days)) {
                let steps = if wealth.chance(0.5) { 1 } else { -1 };
                let next = person.wealth().shifted(steps);
                if next != person.wealth() {
                    let event = Event::new(EventKind::WealthChange, now)
                        .with_target(id)
                        .with_payload("wealth", serde_json::to_value(next)?);
                    scheduler.schedule(event)?;
                    claimed.insert(id);
                    summary.status += 1;
                }
            }
        }

        if summary.total() > 0 {
            log::debug!(
                "tick={step} date={now} planner: deaths={} partnerships={} dissolutions={} births={} status={}",
                summary.deaths,
                summary.partnerships,
                summary.dissolutions,
                summary.births,
                summary.status
            );
        }
        Ok(summary)
    }
}

fn death_cause(stage: LifeStage, health: HealthStatus, roll: f64) -> DeathCause {
    if stage >= LifeStage::Senior && roll < 0.7 {
        DeathCause::NaturalCauses
    } else if health >= HealthStatus::Poor && roll < 0.8 {
        DeathCause::Illness
    } else if roll < 0.9 {
        DeathCause::Accident
    } else if roll < 0.95 {
        DeathCause::Violence
    } else {
        DeathCause::Unexplained
    }
}
