//! Initial population bootstrap.
//!
//! Seeded people are unrelated, alive at the start date, and placed directly
//! into the population. Everything that happens to them afterwards goes
//! through the scheduler.

use crate::{
    config::SimConfig,
    error::SimResult,
    name_generator::NameGenerator,
    person::{HealthStatus, Person, PersonalityTrait, Sex, WealthClass},
    population::Population,
    rng::{RngBank, RngSlot, SlotRng},
    types::{PersonId, SimTime},
};
use chrono::{Duration, Months};

pub struct PopulationSeeder<'a> {
    config: &'a SimConfig,
    rngs:   &'a RngBank,
}

impl<'a> PopulationSeeder<'a> {
    pub fn new(config: &'a SimConfig, rngs: &'a RngBank) -> Self {
        Self { config, rngs }
    }

    pub fn seed(&self) -> SimResult<Population> {
        let mut rng = self.rngs.for_slot(RngSlot::Seeding);
        let mut names = self.rngs.for_slot(RngSlot::Names);
        let mut traits = self.rngs.for_slot(RngSlot::Personality);
        let start = self.config.start_date;
        let (lo, hi) = self.config.seeding.age_range;

        let mut population = Population::new();
        let mut order = Vec::with_capacity(self.config.seeding.initial_population);
        for _ in 0..self.config.seeding.initial_population {
            let sex = if rng.chance(0.5) { Sex::Female } else { Sex::Male };
            let age = rng.range_inclusive(lo as u64, hi as u64) as u32;
            let birth = birth_date_for_age(start, age, &mut rng);

            let mut person = Person::new(NameGenerator::generate_full_name(sex, &mut names), sex, birth)
                .with_health(initial_health(age, &mut rng))
                .with_wealth(*rng.pick(&WealthClass::ALL).unwrap_or(&WealthClass::Middle));
            for t in PersonalityTrait::ALL {
                person = person.with_trait(t, traits.range_inclusive(1, 10) as u8);
            }
            order.push(population.insert(person)?);
        }

        let partnered = self.pair_up(&mut population, &order, &mut rng);
        log::info!(
            "date={start} seeder: {} people, {partnered} partnerships",
            population.len()
        );
        Ok(population)
    }

    /// Walk the seeded order and pair consecutive eligible singles.
    fn pair_up(&self, population: &mut Population, order: &[PersonId], rng: &mut SlotRng) -> usize {
        let share = self.config.seeding.partnered_share;
        let start = self.config.start_date;
        let mut waiting = None;
        let mut formed = 0;
        for &id in order {
            if !rng.chance(share) {
                continue;
            }
            match waiting.take() {
                None => waiting = Some(id),
                Some(other) => match population.form_partnership(other, id, start) {
                    Ok(()) => formed += 1,
                    Err(reason) => {
                        log::trace!("seeder: skipped pairing {other} + {id}: {reason}");
                        waiting = Some(id);
                    }
                },
            }
        }
        formed
    }
}

/// A birth date that makes the person exactly `age` at `start`.
fn birth_date_for_age(start: SimTime, age: u32, rng: &mut SlotRng) -> SimTime {
    let anniversary = start
        .checked_sub_months(Months::new(age * 12))
        .unwrap_or(start);
    let previous = anniversary
        .checked_sub_months(Months::new(12))
        .unwrap_or(anniversary);
    // Born after `previous`, so the next birthday falls after `start`.
    let span = (anniversary - previous).num_days().max(1) as u64;
    anniversary - Duration::days(rng.next_u64_below(span) as i64)
}

fn initial_health(age: u32, rng: &mut SlotRng) -> HealthStatus {
    let roll = rng.next_f64() + age as f64 / 200.0;
    match roll {
        r if r < 0.3 => HealthStatus::Excellent,
        r if r < 0.7 => HealthStatus::Good,
        r if r < 0.95 => HealthStatus::Fair,
        _ => HealthStatus::Poor,
    }
}
